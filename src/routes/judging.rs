use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, patch, post, put},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::{CvForm, JudgingSession},
    dto::common::OkResponse,
    dto::judging::{
        AdvanceTeamsRequest, CvFormRequest, DisqualifyTeamRequest, UpdateAwardWinnersRequest,
        UpdateDeliberationRequest, UpdateSessionRequest, UpdateSessionTeamRequest,
    },
    error::AppError,
    services::{deliberation_service, judging_service},
    state::SharedState,
};

/// Routes handling the judging side of a division.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/divisions/{division_id}/sessions", get(list_sessions))
        .route(
            "/divisions/{division_id}/rooms/{room_id}/sessions/{session_id}/start",
            post(start_session),
        )
        .route(
            "/divisions/{division_id}/sessions/{session_id}/abort",
            post(abort_session),
        )
        .route(
            "/divisions/{division_id}/sessions/{session_id}/team",
            put(update_session_team),
        )
        .route(
            "/divisions/{division_id}/sessions/{session_id}",
            patch(update_session),
        )
        .route(
            "/divisions/{division_id}/deliberations/{deliberation_id}/start",
            post(start_deliberation),
        )
        .route(
            "/divisions/{division_id}/deliberations/{deliberation_id}",
            patch(update_deliberation),
        )
        .route(
            "/divisions/{division_id}/deliberations/{deliberation_id}/complete",
            post(complete_deliberation),
        )
        .route(
            "/divisions/{division_id}/disqualifications",
            post(disqualify_team),
        )
        .route(
            "/divisions/{division_id}/awards/winners",
            put(update_award_winners),
        )
        .route("/divisions/{division_id}/awards/advance", post(advance_teams))
        .route("/divisions/{division_id}/cv-forms", post(create_cv_form))
        .route(
            "/divisions/{division_id}/cv-forms/{form_id}",
            put(update_cv_form),
        )
        .route(
            "/divisions/{division_id}/rooms/{room_id}/call-lead-judge",
            post(call_lead_judge),
        )
}

/// List a division's judging sessions.
#[utoipa::path(
    get,
    path = "/divisions/{division_id}/sessions",
    tag = "judging",
    params(("division_id" = Uuid, Path, description = "Division identifier")),
    responses((status = 200, description = "Sessions in schedule order", body = [JudgingSession]))
)]
pub async fn list_sessions(
    State(state): State<SharedState>,
    Path(division_id): Path<Uuid>,
) -> Result<Json<Vec<JudgingSession>>, AppError> {
    let sessions = judging_service::list_sessions(&state, division_id).await?;
    Ok(Json(sessions))
}

/// Start a judging session in its room.
#[utoipa::path(
    post,
    path = "/divisions/{division_id}/rooms/{room_id}/sessions/{session_id}/start",
    tag = "judging",
    params(
        ("division_id" = Uuid, Path, description = "Division identifier"),
        ("room_id" = Uuid, Path, description = "Room identifier"),
        ("session_id" = Uuid, Path, description = "Session identifier")
    ),
    responses(
        (status = 200, description = "Session started", body = OkResponse),
        (status = 404, description = "Session not found"),
        (status = 409, description = "Session already started or room busy")
    )
)]
pub async fn start_session(
    State(state): State<SharedState>,
    Path((division_id, room_id, session_id)): Path<(Uuid, Uuid, Uuid)>,
) -> Result<Json<OkResponse>, AppError> {
    judging_service::start_session(&state, division_id, room_id, session_id).await?;
    Ok(Json(OkResponse::ok()))
}

/// Abort a running session.
#[utoipa::path(
    post,
    path = "/divisions/{division_id}/sessions/{session_id}/abort",
    tag = "judging",
    params(
        ("division_id" = Uuid, Path, description = "Division identifier"),
        ("session_id" = Uuid, Path, description = "Session identifier")
    ),
    responses(
        (status = 200, description = "Session aborted", body = OkResponse),
        (status = 409, description = "Session is not in progress")
    )
)]
pub async fn abort_session(
    State(state): State<SharedState>,
    Path((division_id, session_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<OkResponse>, AppError> {
    judging_service::abort_session(&state, division_id, session_id).await?;
    Ok(Json(OkResponse::ok()))
}

/// Reassign the team of a not-started session.
#[utoipa::path(
    put,
    path = "/divisions/{division_id}/sessions/{session_id}/team",
    tag = "judging",
    params(
        ("division_id" = Uuid, Path, description = "Division identifier"),
        ("session_id" = Uuid, Path, description = "Session identifier")
    ),
    request_body = UpdateSessionTeamRequest,
    responses(
        (status = 200, description = "Session team updated", body = OkResponse),
        (status = 409, description = "Session already started")
    )
)]
pub async fn update_session_team(
    State(state): State<SharedState>,
    Path((division_id, session_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateSessionTeamRequest>,
) -> Result<Json<OkResponse>, AppError> {
    judging_service::update_session_team(&state, division_id, session_id, payload).await?;
    Ok(Json(OkResponse::ok()))
}

/// Patch a not-started session's queueing fields.
#[utoipa::path(
    patch,
    path = "/divisions/{division_id}/sessions/{session_id}",
    tag = "judging",
    params(
        ("division_id" = Uuid, Path, description = "Division identifier"),
        ("session_id" = Uuid, Path, description = "Session identifier")
    ),
    request_body = UpdateSessionRequest,
    responses(
        (status = 200, description = "Session updated", body = OkResponse),
        (status = 409, description = "Session already started")
    )
)]
pub async fn update_session(
    State(state): State<SharedState>,
    Path((division_id, session_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateSessionRequest>,
) -> Result<Json<OkResponse>, AppError> {
    judging_service::update_session(&state, division_id, session_id, payload).await?;
    Ok(Json(OkResponse::ok()))
}

/// Start a deliberation.
#[utoipa::path(
    post,
    path = "/divisions/{division_id}/deliberations/{deliberation_id}/start",
    tag = "judging",
    params(
        ("division_id" = Uuid, Path, description = "Division identifier"),
        ("deliberation_id" = Uuid, Path, description = "Deliberation identifier")
    ),
    responses(
        (status = 200, description = "Deliberation started", body = OkResponse),
        (status = 409, description = "Deliberation already started")
    )
)]
pub async fn start_deliberation(
    State(state): State<SharedState>,
    Path((division_id, deliberation_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<OkResponse>, AppError> {
    deliberation_service::start_deliberation(&state, division_id, deliberation_id).await?;
    Ok(Json(OkResponse::ok()))
}

/// Patch a non-completed deliberation.
#[utoipa::path(
    patch,
    path = "/divisions/{division_id}/deliberations/{deliberation_id}",
    tag = "judging",
    params(
        ("division_id" = Uuid, Path, description = "Division identifier"),
        ("deliberation_id" = Uuid, Path, description = "Deliberation identifier")
    ),
    request_body = UpdateDeliberationRequest,
    responses(
        (status = 200, description = "Deliberation updated", body = OkResponse),
        (status = 409, description = "Deliberation is completed")
    )
)]
pub async fn update_deliberation(
    State(state): State<SharedState>,
    Path((division_id, deliberation_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateDeliberationRequest>,
) -> Result<Json<OkResponse>, AppError> {
    deliberation_service::update_deliberation(&state, division_id, deliberation_id, payload)
        .await?;
    Ok(Json(OkResponse::ok()))
}

/// Complete a deliberation, optionally with one last content patch.
#[utoipa::path(
    post,
    path = "/divisions/{division_id}/deliberations/{deliberation_id}/complete",
    tag = "judging",
    params(
        ("division_id" = Uuid, Path, description = "Division identifier"),
        ("deliberation_id" = Uuid, Path, description = "Deliberation identifier")
    ),
    request_body = UpdateDeliberationRequest,
    responses(
        (status = 200, description = "Deliberation completed", body = OkResponse),
        (status = 409, description = "Deliberation is already completed")
    )
)]
pub async fn complete_deliberation(
    State(state): State<SharedState>,
    Path((division_id, deliberation_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateDeliberationRequest>,
) -> Result<Json<OkResponse>, AppError> {
    deliberation_service::complete_deliberation(&state, division_id, deliberation_id, payload)
        .await?;
    Ok(Json(OkResponse::ok()))
}

/// Disqualify a team across every open deliberation.
#[utoipa::path(
    post,
    path = "/divisions/{division_id}/disqualifications",
    tag = "judging",
    params(("division_id" = Uuid, Path, description = "Division identifier")),
    request_body = DisqualifyTeamRequest,
    responses(
        (status = 200, description = "Team disqualified", body = OkResponse),
        (status = 409, description = "Cascade interrupted; retry")
    )
)]
pub async fn disqualify_team(
    State(state): State<SharedState>,
    Path(division_id): Path<Uuid>,
    Json(payload): Json<DisqualifyTeamRequest>,
) -> Result<Json<OkResponse>, AppError> {
    deliberation_service::disqualify_team(&state, division_id, payload).await?;
    Ok(Json(OkResponse::ok()))
}

/// Assign winners to the division's award place-rows.
#[utoipa::path(
    put,
    path = "/divisions/{division_id}/awards/winners",
    tag = "judging",
    params(("division_id" = Uuid, Path, description = "Division identifier")),
    request_body = UpdateAwardWinnersRequest,
    responses(
        (status = 200, description = "Winners assigned", body = OkResponse),
        (status = 400, description = "Unknown award or mismatched winner count")
    )
)]
pub async fn update_award_winners(
    State(state): State<SharedState>,
    Path(division_id): Path<Uuid>,
    Json(payload): Json<UpdateAwardWinnersRequest>,
) -> Result<Json<OkResponse>, AppError> {
    deliberation_service::update_award_winners(&state, division_id, payload).await?;
    Ok(Json(OkResponse::ok()))
}

/// Replace the division's advancement rows.
#[utoipa::path(
    post,
    path = "/divisions/{division_id}/awards/advance",
    tag = "judging",
    params(("division_id" = Uuid, Path, description = "Division identifier")),
    request_body = AdvanceTeamsRequest,
    responses(
        (status = 200, description = "Advancement regenerated", body = OkResponse),
        (status = 400, description = "Empty team list")
    )
)]
pub async fn advance_teams(
    State(state): State<SharedState>,
    Path(division_id): Path<Uuid>,
    Json(payload): Json<AdvanceTeamsRequest>,
) -> Result<Json<OkResponse>, AppError> {
    payload.validate()?;
    deliberation_service::advance_teams(&state, division_id, payload).await?;
    Ok(Json(OkResponse::ok()))
}

/// File a new Core Values form.
#[utoipa::path(
    post,
    path = "/divisions/{division_id}/cv-forms",
    tag = "judging",
    params(("division_id" = Uuid, Path, description = "Division identifier")),
    request_body = CvFormRequest,
    responses(
        (status = 200, description = "Form created", body = CvForm),
        (status = 400, description = "Invalid form content")
    )
)]
pub async fn create_cv_form(
    State(state): State<SharedState>,
    Path(division_id): Path<Uuid>,
    Json(payload): Json<CvFormRequest>,
) -> Result<Json<CvForm>, AppError> {
    payload.validate()?;
    let form = judging_service::create_cv_form(&state, division_id, payload).await?;
    Ok(Json(form))
}

/// Replace the content of a Core Values form.
#[utoipa::path(
    put,
    path = "/divisions/{division_id}/cv-forms/{form_id}",
    tag = "judging",
    params(
        ("division_id" = Uuid, Path, description = "Division identifier"),
        ("form_id" = Uuid, Path, description = "Form identifier")
    ),
    request_body = CvFormRequest,
    responses(
        (status = 200, description = "Form updated", body = OkResponse),
        (status = 404, description = "Form not found")
    )
)]
pub async fn update_cv_form(
    State(state): State<SharedState>,
    Path((division_id, form_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<CvFormRequest>,
) -> Result<Json<OkResponse>, AppError> {
    payload.validate()?;
    judging_service::update_cv_form(&state, division_id, form_id, payload).await?;
    Ok(Json(OkResponse::ok()))
}

/// Call the lead judge to a room.
#[utoipa::path(
    post,
    path = "/divisions/{division_id}/rooms/{room_id}/call-lead-judge",
    tag = "judging",
    params(
        ("division_id" = Uuid, Path, description = "Division identifier"),
        ("room_id" = Uuid, Path, description = "Room identifier")
    ),
    responses(
        (status = 200, description = "Lead judge notified", body = OkResponse),
        (status = 404, description = "Room not found")
    )
)]
pub async fn call_lead_judge(
    State(state): State<SharedState>,
    Path((division_id, room_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<OkResponse>, AppError> {
    judging_service::call_lead_judge(&state, division_id, room_id).await?;
    Ok(Json(OkResponse::ok()))
}
