use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
/// Body returned by the health endpoint.
pub struct HealthResponse {
    /// Static `"ok"` marker.
    pub status: &'static str,
}
