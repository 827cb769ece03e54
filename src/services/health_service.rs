use crate::dto::health::HealthResponse;

/// Respond with a static health payload.
pub fn health_status() -> HealthResponse {
    HealthResponse { status: "ok" }
}
