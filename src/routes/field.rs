use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, patch, post, put},
};
use uuid::Uuid;

use crate::{
    dao::models::GameMatch,
    dto::common::OkResponse,
    dto::field::{
        MergeMatchesRequest, SwitchMatchTeamsRequest, UpdateMatchBriefRequest,
        UpdateMatchParticipantRequest, UpdateMatchTeamsRequest, UpdateScoresheetRequest,
    },
    error::AppError,
    services::field_service,
    state::SharedState,
};

/// Routes handling the robot-game side of a division.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/divisions/{division_id}/matches", get(list_matches))
        .route(
            "/divisions/{division_id}/matches/{match_id}/load",
            post(load_match),
        )
        .route(
            "/divisions/{division_id}/matches/{match_id}/start",
            post(start_match),
        )
        .route(
            "/divisions/{division_id}/test-match/start",
            post(start_test_match),
        )
        .route(
            "/divisions/{division_id}/matches/{match_id}/abort",
            post(abort_match),
        )
        .route(
            "/divisions/{division_id}/matches/{match_id}/teams",
            put(update_match_teams),
        )
        .route("/divisions/{division_id}/matches/switch", post(switch_match_teams))
        .route("/divisions/{division_id}/matches/merge", post(merge_matches))
        .route(
            "/divisions/{division_id}/matches/{match_id}",
            patch(update_match_brief),
        )
        .route(
            "/divisions/{division_id}/matches/{match_id}/participant",
            put(update_match_participant),
        )
        .route(
            "/divisions/{division_id}/scoresheets/{scoresheet_id}",
            patch(update_scoresheet),
        )
}

/// List a division's matches.
#[utoipa::path(
    get,
    path = "/divisions/{division_id}/matches",
    tag = "field",
    params(("division_id" = Uuid, Path, description = "Division identifier")),
    responses((status = 200, description = "Matches in schedule order", body = [GameMatch]))
)]
pub async fn list_matches(
    State(state): State<SharedState>,
    Path(division_id): Path<Uuid>,
) -> Result<Json<Vec<GameMatch>>, AppError> {
    let matches = field_service::list_matches(&state, division_id).await?;
    Ok(Json(matches))
}

/// Load a match onto the field displays.
#[utoipa::path(
    post,
    path = "/divisions/{division_id}/matches/{match_id}/load",
    tag = "field",
    params(
        ("division_id" = Uuid, Path, description = "Division identifier"),
        ("match_id" = Uuid, Path, description = "Match identifier")
    ),
    responses(
        (status = 200, description = "Match loaded", body = OkResponse),
        (status = 404, description = "Match not found")
    )
)]
pub async fn load_match(
    State(state): State<SharedState>,
    Path((division_id, match_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<OkResponse>, AppError> {
    field_service::load_match(&state, division_id, match_id).await?;
    Ok(Json(OkResponse::ok()))
}

/// Start a match on the field.
#[utoipa::path(
    post,
    path = "/divisions/{division_id}/matches/{match_id}/start",
    tag = "field",
    params(
        ("division_id" = Uuid, Path, description = "Division identifier"),
        ("match_id" = Uuid, Path, description = "Match identifier")
    ),
    responses(
        (status = 200, description = "Match started", body = OkResponse),
        (status = 404, description = "Match not found"),
        (status = 409, description = "Match already started or division busy")
    )
)]
pub async fn start_match(
    State(state): State<SharedState>,
    Path((division_id, match_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<OkResponse>, AppError> {
    field_service::start_match(&state, division_id, match_id).await?;
    Ok(Json(OkResponse::ok()))
}

/// Start the division's test match.
#[utoipa::path(
    post,
    path = "/divisions/{division_id}/test-match/start",
    tag = "field",
    params(("division_id" = Uuid, Path, description = "Division identifier")),
    responses(
        (status = 200, description = "Test match started", body = OkResponse),
        (status = 404, description = "No test match in the division"),
        (status = 409, description = "Division busy")
    )
)]
pub async fn start_test_match(
    State(state): State<SharedState>,
    Path(division_id): Path<Uuid>,
) -> Result<Json<OkResponse>, AppError> {
    field_service::start_test_match(&state, division_id).await?;
    Ok(Json(OkResponse::ok()))
}

/// Abort the running match.
#[utoipa::path(
    post,
    path = "/divisions/{division_id}/matches/{match_id}/abort",
    tag = "field",
    params(
        ("division_id" = Uuid, Path, description = "Division identifier"),
        ("match_id" = Uuid, Path, description = "Match identifier")
    ),
    responses(
        (status = 200, description = "Match aborted", body = OkResponse),
        (status = 409, description = "Match is not the running one")
    )
)]
pub async fn abort_match(
    State(state): State<SharedState>,
    Path((division_id, match_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<OkResponse>, AppError> {
    field_service::abort_match(&state, division_id, match_id).await?;
    Ok(Json(OkResponse::ok()))
}

/// Overwrite team assignments per table.
#[utoipa::path(
    put,
    path = "/divisions/{division_id}/matches/{match_id}/teams",
    tag = "field",
    params(
        ("division_id" = Uuid, Path, description = "Division identifier"),
        ("match_id" = Uuid, Path, description = "Match identifier")
    ),
    request_body = UpdateMatchTeamsRequest,
    responses(
        (status = 200, description = "Teams updated", body = OkResponse),
        (status = 409, description = "Match already started")
    )
)]
pub async fn update_match_teams(
    State(state): State<SharedState>,
    Path((division_id, match_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateMatchTeamsRequest>,
) -> Result<Json<OkResponse>, AppError> {
    field_service::update_match_teams(&state, division_id, match_id, payload).await?;
    Ok(Json(OkResponse::ok()))
}

/// Swap one positional slot between two matches.
#[utoipa::path(
    post,
    path = "/divisions/{division_id}/matches/switch",
    tag = "field",
    params(("division_id" = Uuid, Path, description = "Division identifier")),
    request_body = SwitchMatchTeamsRequest,
    responses(
        (status = 200, description = "Teams switched", body = OkResponse),
        (status = 409, description = "A match already started")
    )
)]
pub async fn switch_match_teams(
    State(state): State<SharedState>,
    Path(division_id): Path<Uuid>,
    Json(payload): Json<SwitchMatchTeamsRequest>,
) -> Result<Json<OkResponse>, AppError> {
    field_service::switch_match_teams(&state, division_id, payload).await?;
    Ok(Json(OkResponse::ok()))
}

/// Fold one match's teams into another.
#[utoipa::path(
    post,
    path = "/divisions/{division_id}/matches/merge",
    tag = "field",
    params(("division_id" = Uuid, Path, description = "Division identifier")),
    request_body = MergeMatchesRequest,
    responses(
        (status = 200, description = "Matches merged", body = OkResponse),
        (status = 409, description = "A match already started")
    )
)]
pub async fn merge_matches(
    State(state): State<SharedState>,
    Path(division_id): Path<Uuid>,
    Json(payload): Json<MergeMatchesRequest>,
) -> Result<Json<OkResponse>, AppError> {
    field_service::merge_matches(&state, division_id, payload).await?;
    Ok(Json(OkResponse::ok()))
}

/// Patch a match's brief fields.
#[utoipa::path(
    patch,
    path = "/divisions/{division_id}/matches/{match_id}",
    tag = "field",
    params(
        ("division_id" = Uuid, Path, description = "Division identifier"),
        ("match_id" = Uuid, Path, description = "Match identifier")
    ),
    request_body = UpdateMatchBriefRequest,
    responses(
        (status = 200, description = "Match updated", body = OkResponse),
        (status = 404, description = "Match not found")
    )
)]
pub async fn update_match_brief(
    State(state): State<SharedState>,
    Path((division_id, match_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateMatchBriefRequest>,
) -> Result<Json<OkResponse>, AppError> {
    field_service::update_match_brief(&state, division_id, match_id, payload).await?;
    Ok(Json(OkResponse::ok()))
}

/// Patch one team's prestart flags.
#[utoipa::path(
    put,
    path = "/divisions/{division_id}/matches/{match_id}/participant",
    tag = "field",
    params(
        ("division_id" = Uuid, Path, description = "Division identifier"),
        ("match_id" = Uuid, Path, description = "Match identifier")
    ),
    request_body = UpdateMatchParticipantRequest,
    responses(
        (status = 200, description = "Participant updated", body = OkResponse),
        (status = 404, description = "Team is not playing in the match")
    )
)]
pub async fn update_match_participant(
    State(state): State<SharedState>,
    Path((division_id, match_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateMatchParticipantRequest>,
) -> Result<Json<OkResponse>, AppError> {
    field_service::update_match_participant(&state, division_id, match_id, payload).await?;
    Ok(Json(OkResponse::ok()))
}

/// Patch a scoresheet record.
#[utoipa::path(
    patch,
    path = "/divisions/{division_id}/scoresheets/{scoresheet_id}",
    tag = "field",
    params(
        ("division_id" = Uuid, Path, description = "Division identifier"),
        ("scoresheet_id" = Uuid, Path, description = "Scoresheet identifier")
    ),
    request_body = UpdateScoresheetRequest,
    responses(
        (status = 200, description = "Scoresheet updated", body = OkResponse),
        (status = 404, description = "Scoresheet not found")
    )
)]
pub async fn update_scoresheet(
    State(state): State<SharedState>,
    Path((division_id, scoresheet_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateScoresheetRequest>,
) -> Result<Json<OkResponse>, AppError> {
    field_service::update_scoresheet(&state, division_id, scoresheet_id, payload).await?;
    Ok(Json(OkResponse::ok()))
}
