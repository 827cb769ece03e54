use indexmap::IndexMap;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::dao::models::Status;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
/// Team reassignment for a not-started session.
pub struct UpdateSessionTeamRequest {
    /// New team for the session; `null` empties the slot.
    pub team_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema)]
/// Patch of a not-started session's queueing fields.
pub struct UpdateSessionRequest {
    pub called: Option<bool>,
    pub queued: Option<bool>,
}

#[derive(Debug, Deserialize, ToSchema)]
/// Patch of a deliberation's editable fields.
///
/// `status` may move the deliberation forward; the orchestrator emits a
/// dedicated status-changed event when it does.
pub struct UpdateDeliberationRequest {
    pub status: Option<Status>,
    /// Full replacement of the award picklists.
    #[schema(value_type = Object)]
    pub awards: Option<IndexMap<String, Vec<Uuid>>>,
    /// Full replacement of the disqualification list.
    pub disqualifications: Option<Vec<Uuid>>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
/// Disqualify a team across every open deliberation of the division.
pub struct DisqualifyTeamRequest {
    pub team_id: Uuid,
}

#[derive(Debug, Deserialize, ToSchema)]
/// Winner assignment per award name; each list must have exactly one entry
/// per place-row of that award.
pub struct UpdateAwardWinnersRequest {
    #[schema(value_type = Object)]
    pub winners: IndexMap<String, Vec<Uuid>>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
/// Replace the division's advancement awards with this ordered team list.
pub struct AdvanceTeamsRequest {
    #[validate(length(min = 1, message = "at least one team must advance"))]
    pub teams: Vec<Uuid>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
/// Core Values form content for create and update.
pub struct CvFormRequest {
    #[validate(length(min = 1, message = "at least one observer is required"))]
    pub observers: Vec<String>,
    pub demonstrates_severity: String,
    #[validate(length(min = 1, message = "details must not be empty"))]
    pub details: String,
    pub completed_by: String,
    pub action_taken: Option<String>,
}
