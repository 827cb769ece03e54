//! Persistent entities managed by the orchestration core.
//!
//! Records are created by the offline schedule importer; the live core only
//! transitions their `status` and a small set of mutable fields. Field names
//! follow the wire format consumed by the dashboards (camelCase).

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use utoipa::ToSchema;
use uuid::Uuid;

/// Lifecycle status shared by matches, judging sessions and deliberations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    /// Scheduled but not yet run.
    NotStarted,
    /// Currently running on a table or in a room.
    InProgress,
    /// Finished (or folded into another match by a merge).
    Completed,
}

/// Robot-game stage a match belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MatchStage {
    /// Non-scoring warm-up rounds.
    Practice,
    /// Scored rounds that feed the rankings.
    Ranking,
    /// The single free-form test match of a division.
    Test,
}

/// One table slot inside a match. The table is fixed per slot index; only
/// the team assignment and the prestart flags are mutable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MatchParticipant {
    /// Table this slot is played on.
    pub table_id: Uuid,
    /// Display name of the table.
    pub table_name: String,
    /// Assigned team, if any.
    pub team_id: Option<Uuid>,
    /// Team has checked in at the table.
    pub present: bool,
    /// Referee marked the table ready.
    pub ready: bool,
    /// Team has been queued by the field queuers.
    pub queued: bool,
}

/// A robot-game match. Immutable in `stage`/`round`/`number` after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GameMatch {
    /// Record identifier.
    pub id: Uuid,
    /// Division this match belongs to.
    pub division_id: Uuid,
    /// Stage the match is scheduled in.
    pub stage: MatchStage,
    /// Round number within the stage.
    pub round: u32,
    /// Sequential match number within the division.
    pub number: u32,
    /// Planned start instant from the offline schedule.
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub scheduled_time: OffsetDateTime,
    /// Lifecycle status.
    pub status: Status,
    /// Instant the match actually started, set on start and cleared on abort.
    #[serde(with = "time::serde::rfc3339::option")]
    #[schema(value_type = Option<String>, format = DateTime)]
    pub start_time: Option<OffsetDateTime>,
    /// Teams have been called to the staging area.
    pub called: bool,
    /// Table slots, one per table, in fixed positional order.
    pub participants: Vec<MatchParticipant>,
}

/// A judging session hosted by a room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JudgingSession {
    /// Record identifier.
    pub id: Uuid,
    /// Division this session belongs to.
    pub division_id: Uuid,
    /// Room hosting the session.
    pub room_id: Uuid,
    /// Sequential session number within the division.
    pub number: u32,
    /// Planned start instant from the offline schedule.
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub scheduled_time: OffsetDateTime,
    /// Lifecycle status.
    pub status: Status,
    /// Instant the session actually started.
    #[serde(with = "time::serde::rfc3339::option")]
    #[schema(value_type = Option<String>, format = DateTime)]
    pub start_time: Option<OffsetDateTime>,
    /// Team being judged; mutable only while not started.
    pub team_id: Option<Uuid>,
    /// Team has been called to the room.
    pub called: bool,
    /// Team has been queued by the judging queuers.
    pub queued: bool,
}

/// A judging deliberation maintaining award picklists for a division.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JudgingDeliberation {
    /// Record identifier.
    pub id: Uuid,
    /// Division this deliberation belongs to.
    pub division_id: Uuid,
    /// Award category for category deliberations; absent for final ones.
    pub category: Option<String>,
    /// Deliberation stage name (e.g. `champions`, `core-awards`, `review`).
    pub stage: String,
    /// Whether this is the division's final deliberation.
    pub is_final_deliberation: bool,
    /// Lifecycle status; monotonic, there is no abort.
    pub status: Status,
    /// Instant the deliberation was started.
    #[serde(with = "time::serde::rfc3339::option")]
    #[schema(value_type = Option<String>, format = DateTime)]
    pub start_time: Option<OffsetDateTime>,
    /// Instant the deliberation was completed.
    #[serde(with = "time::serde::rfc3339::option")]
    #[schema(value_type = Option<String>, format = DateTime)]
    pub completion_time: Option<OffsetDateTime>,
    /// Ordered candidate picklists keyed by award name.
    #[schema(value_type = Object)]
    pub awards: IndexMap<String, Vec<Uuid>>,
    /// Teams disqualified from this deliberation's awards.
    pub disqualifications: Vec<Uuid>,
}

/// Singleton per-division pointer set naming what is on deck and running.
///
/// Match and session records never self-report as "the current one"; this
/// record is the single source of truth both orchestrators read and patch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DivisionState {
    /// Record identifier.
    pub id: Uuid,
    /// Division this state belongs to.
    pub division_id: Uuid,
    /// Match loaded on the field displays, if any.
    pub loaded_match: Option<Uuid>,
    /// Match currently running; at most one per division.
    pub active_match: Option<Uuid>,
    /// Stage the field is currently running.
    pub current_stage: MatchStage,
    /// Highest round started so far in the current stage.
    pub current_round: u32,
    /// Highest judging-session number started so far.
    pub current_session: Option<u32>,
}

/// One place-row of an award. Winners are assigned post-hoc during the final
/// deliberation; `advancement` rows are regenerated wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Award {
    /// Record identifier.
    pub id: Uuid,
    /// Division this award belongs to.
    pub division_id: Uuid,
    /// Award name (e.g. `champions`, `robot-performance`, `advancement`).
    pub name: String,
    /// Place within the award, 1 being first.
    pub place: u32,
    /// Ceremony ordering index across all of the division's awards.
    pub index: u32,
    /// Winning team, once assigned.
    pub winner: Option<Uuid>,
}

/// A referee scoresheet for one team in one match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Scoresheet {
    /// Record identifier.
    pub id: Uuid,
    /// Division this scoresheet belongs to.
    pub division_id: Uuid,
    /// Team being scored, if the slot was filled.
    pub team_id: Option<Uuid>,
    /// Match this scoresheet covers.
    pub match_id: Uuid,
    /// Review status reported by the referee workflow.
    pub status: String,
    /// Escalated to the head referee.
    pub escalated: bool,
    /// Mission-by-mission scoring payload, opaque to the orchestrator.
    #[schema(value_type = Object)]
    pub data: serde_json::Value,
}

/// A Core Values observation form filed by a judge or referee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CvForm {
    /// Record identifier.
    pub id: Uuid,
    /// Division the observation was made in.
    pub division_id: Uuid,
    /// Team or teams observed.
    pub observers: Vec<String>,
    /// Severity bucket the observed behavior demonstrates.
    pub demonstrates_severity: String,
    /// Free-text description of the observation.
    pub details: String,
    /// Role of the volunteer who filed the form.
    pub completed_by: String,
    /// Action taken on the spot, if any.
    pub action_taken: Option<String>,
}

/// A physical judging room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    /// Record identifier.
    pub id: Uuid,
    /// Division the room belongs to.
    pub division_id: Uuid,
    /// Display name of the room.
    pub name: String,
}

/// A registered (or expected) team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    /// Record identifier.
    pub id: Uuid,
    /// Division the team competes in.
    pub division_id: Uuid,
    /// Official team number.
    pub number: u32,
    /// Team name.
    pub name: String,
    /// Team completed event registration.
    pub registered: bool,
    /// Team has arrived on site.
    pub arrived: bool,
}
