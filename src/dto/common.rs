use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
/// Acknowledgement body returned by mutating operations with no payload.
pub struct OkResponse {
    /// Always `true`; failures are reported through the error body instead.
    pub ok: bool,
}

impl OkResponse {
    /// The canonical success acknowledgement.
    pub fn ok() -> Self {
        Self { ok: true }
    }
}
