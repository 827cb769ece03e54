use axum::{
    Json, Router,
    extract::{Path, State},
    routing::patch,
};
use uuid::Uuid;

use crate::{
    dto::common::OkResponse, dto::team::UpdateTeamArrivalRequest, error::AppError,
    services::team_service, state::SharedState,
};

/// Routes handling live team roster flags.
pub fn router() -> Router<SharedState> {
    Router::new().route(
        "/divisions/{division_id}/teams/{team_id}/arrival",
        patch(update_team_arrival),
    )
}

/// Flip a team's on-site arrival flag.
#[utoipa::path(
    patch,
    path = "/divisions/{division_id}/teams/{team_id}/arrival",
    tag = "team",
    params(
        ("division_id" = Uuid, Path, description = "Division identifier"),
        ("team_id" = Uuid, Path, description = "Team identifier")
    ),
    request_body = UpdateTeamArrivalRequest,
    responses(
        (status = 200, description = "Arrival flag updated", body = OkResponse),
        (status = 404, description = "Team not found")
    )
)]
pub async fn update_team_arrival(
    State(state): State<SharedState>,
    Path((division_id, team_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateTeamArrivalRequest>,
) -> Result<Json<OkResponse>, AppError> {
    team_service::update_team_arrival(&state, division_id, team_id, payload).await?;
    Ok(Json(OkResponse::ok()))
}
