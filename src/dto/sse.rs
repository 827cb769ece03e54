use serde::Serialize;
use time::OffsetDateTime;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::dao::models::{
    Award, CvForm, DivisionState, GameMatch, JudgingDeliberation, JudgingSession, Room, Scoresheet,
};

#[derive(Clone, Debug)]
/// Dispatched payload carried across SSE channels.
pub struct ServerEvent {
    pub event: Option<String>,
    pub data: String,
}

impl ServerEvent {
    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }

    /// Build a plain-text event without a JSON body.
    pub fn new(event: Option<String>, data: String) -> Self {
        Self { event, data }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
/// Match lifecycle event that also reflects the division's pointer set.
pub struct MatchStateEvent {
    /// The match after the committed write.
    #[serde(rename = "match")]
    pub game_match: GameMatch,
    /// Division state after the committed write.
    pub division_state: DivisionState,
}

#[derive(Debug, Serialize, ToSchema)]
/// Match event carrying only the match record (edits, endgame warning).
pub struct MatchEvent {
    /// The match after the committed write.
    #[serde(rename = "match")]
    pub game_match: GameMatch,
}

#[derive(Debug, Serialize, ToSchema)]
/// Scoresheet change notification.
pub struct ScoresheetEvent {
    pub scoresheet: Scoresheet,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
/// Session lifecycle event that also reflects the division's pointer set.
pub struct SessionStateEvent {
    pub session: JudgingSession,
    pub division_state: DivisionState,
}

#[derive(Debug, Serialize, ToSchema)]
/// Session event carrying only the session record.
pub struct SessionEvent {
    pub session: JudgingSession,
}

#[derive(Debug, Serialize, ToSchema)]
/// Deliberation change notification.
pub struct DeliberationEvent {
    pub deliberation: JudgingDeliberation,
}

#[derive(Debug, Serialize, ToSchema)]
/// Core Values form notification.
pub struct CvFormEvent {
    pub form: CvForm,
}

#[derive(Debug, Serialize, ToSchema)]
/// Notification that the lead judge was called to a room.
pub struct LeadJudgeCalledEvent {
    pub room: Room,
}

#[derive(Debug, Serialize, ToSchema)]
/// Full refreshed award list of a division.
pub struct AwardsUpdatedEvent {
    pub awards: Vec<Award>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
/// Fine-grained per-division event published when a team's arrival flag flips.
pub struct TeamArrivalEvent {
    pub team_id: Uuid,
    pub division_id: Uuid,
    pub arrived: bool,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub updated_at: OffsetDateTime,
}
