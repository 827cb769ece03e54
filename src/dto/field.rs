use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
/// One table-slot reassignment inside [`UpdateMatchTeamsRequest`].
pub struct TeamAssignment {
    /// Table whose slot is being reassigned.
    pub table_id: Uuid,
    /// New team for the slot; `null` empties it.
    pub team_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema)]
/// Per-table team reassignment for a not-started match.
pub struct UpdateMatchTeamsRequest {
    /// Slots to overwrite, keyed by table.
    pub teams: Vec<TeamAssignment>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
/// Swap the team at one positional slot between two not-started matches.
pub struct SwitchMatchTeamsRequest {
    pub from_match_id: Uuid,
    pub to_match_id: Uuid,
    /// Positional slot index; tables are fixed per index.
    pub participant_index: usize,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
/// Fold one not-started match's teams into another.
pub struct MergeMatchesRequest {
    pub from_match_id: Uuid,
    pub to_match_id: Uuid,
}

#[derive(Debug, Deserialize, ToSchema)]
/// Unconditional patch of a match's brief fields.
pub struct UpdateMatchBriefRequest {
    /// Teams have been called to the staging area.
    pub called: Option<bool>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
/// Prestart flag patch for one team's slot in a match.
pub struct UpdateMatchParticipantRequest {
    /// Team whose slot is being patched.
    pub team_id: Uuid,
    pub present: Option<bool>,
    pub ready: Option<bool>,
    pub queued: Option<bool>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
/// Patch of a scoresheet record.
pub struct UpdateScoresheetRequest {
    /// Team the scoresheet is expected to belong to; part of the lookup.
    pub team_id: Option<Uuid>,
    pub status: Option<String>,
    pub escalated: Option<bool>,
    /// Mission scoring payload, opaque to the orchestrator.
    #[schema(value_type = Object)]
    pub data: Option<serde_json::Value>,
}
