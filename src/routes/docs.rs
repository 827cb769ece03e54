use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{services::documentation::ApiDoc, state::SharedState};

/// Interactive API browser for the orchestration endpoints.
///
/// Mounts the Swagger UI at `/docs` and the raw OpenAPI document at
/// `/api-doc/openapi.json` so tournament tooling can consume it directly.
pub fn router(state: SharedState) -> Router<SharedState> {
    Router::from(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .with_state(state)
}
