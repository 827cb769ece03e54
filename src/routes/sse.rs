use std::convert::Infallible;

use axum::{
    Router,
    extract::{Path, State},
    response::sse::Sse,
    routing::get,
};
use futures::Stream;
use tracing::info;
use uuid::Uuid;

use crate::{services::sse_service, state::SharedState};

/// Configure the SSE endpoints.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new()
        .route("/sse/field", get(field_stream))
        .route("/sse/judging", get(judging_stream))
        .route(
            "/sse/divisions/{division_id}/team-arrivals",
            get(team_arrival_stream),
        )
}

#[utoipa::path(
    get,
    path = "/sse/field",
    tag = "sse",
    responses((status = 200, description = "Field room SSE stream", content_type = "text/event-stream", body = String))
)]
/// Stream field-side events (match lifecycle, scoresheets) to dashboards.
pub async fn field_stream(
    State(state): State<SharedState>,
) -> Sse<impl Stream<Item = Result<axum::response::sse::Event, Infallible>>> {
    let receiver = sse_service::subscribe_field(&state);
    info!("New field SSE connection");
    sse_service::to_sse_stream(receiver, "field")
}

#[utoipa::path(
    get,
    path = "/sse/judging",
    tag = "sse",
    responses((status = 200, description = "Judging room SSE stream", content_type = "text/event-stream", body = String))
)]
/// Stream judging-side events (sessions, deliberations, awards) to dashboards.
pub async fn judging_stream(
    State(state): State<SharedState>,
) -> Sse<impl Stream<Item = Result<axum::response::sse::Event, Infallible>>> {
    let receiver = sse_service::subscribe_judging(&state);
    info!("New judging SSE connection");
    sse_service::to_sse_stream(receiver, "judging")
}

#[utoipa::path(
    get,
    path = "/sse/divisions/{division_id}/team-arrivals",
    tag = "sse",
    params(("division_id" = Uuid, Path, description = "Division identifier")),
    responses((status = 200, description = "Per-division team arrival SSE stream", content_type = "text/event-stream", body = String))
)]
/// Stream one division's team-arrival updates.
pub async fn team_arrival_stream(
    State(state): State<SharedState>,
    Path(division_id): Path<Uuid>,
) -> Sse<impl Stream<Item = Result<axum::response::sse::Event, Infallible>>> {
    let receiver = sse_service::subscribe_team_arrivals(&state, division_id);
    info!(%division_id, "New team arrival SSE connection");
    sse_service::to_sse_stream(receiver, "team-arrivals")
}
