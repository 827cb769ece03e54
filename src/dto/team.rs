use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
/// Flip a team's on-site arrival flag.
pub struct UpdateTeamArrivalRequest {
    pub arrived: bool,
}
