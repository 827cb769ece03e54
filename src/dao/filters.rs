//! Typed filter and patch shapes consumed by the entity store.
//!
//! A filter is a conjunction of equality checks: every populated field must
//! match the record. Conditional transitions pass the full identity they
//! captured (`id` + `status` + `start_time`) so a racing writer that already
//! moved the record simply stops the filter from matching.
//!
//! Patches use `Option` for "leave untouched" and, for nullable record
//! fields, a nested `Option<Option<T>>` where `Some(None)` clears the field.

use indexmap::IndexMap;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::dao::models::{
    Award, CvForm, DivisionState, GameMatch, JudgingDeliberation, JudgingSession,
    MatchParticipant, MatchStage, Room, Scoresheet, Status, Team,
};

/// Filter over [`GameMatch`] records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchFilter {
    pub id: Option<Uuid>,
    pub division_id: Option<Uuid>,
    pub stage: Option<MatchStage>,
    pub status: Option<Status>,
    /// Matches the exact `start_time` value, including `Some(None)` for
    /// "never started".
    pub start_time: Option<Option<OffsetDateTime>>,
}

impl MatchFilter {
    /// Filter selecting a single match by id.
    pub fn by_id(id: Uuid) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    /// Whether `record` satisfies every populated field.
    pub fn matches(&self, record: &GameMatch) -> bool {
        self.id.is_none_or(|id| record.id == id)
            && self.division_id.is_none_or(|d| record.division_id == d)
            && self.stage.is_none_or(|s| record.stage == s)
            && self.status.is_none_or(|s| record.status == s)
            && self
                .start_time
                .as_ref()
                .is_none_or(|t| record.start_time == *t)
    }
}

/// Patch over [`GameMatch`] records.
#[derive(Debug, Clone, Default)]
pub struct MatchPatch {
    pub status: Option<Status>,
    pub start_time: Option<Option<OffsetDateTime>>,
    pub called: Option<bool>,
    /// Full replacement of the participant slots.
    pub participants: Option<Vec<MatchParticipant>>,
    /// Sets every participant's `ready` flag to this value.
    pub participants_ready: Option<bool>,
}

impl MatchPatch {
    /// Apply the populated fields to `record`.
    pub fn apply(&self, record: &mut GameMatch) {
        if let Some(status) = self.status {
            record.status = status;
        }
        if let Some(start_time) = self.start_time {
            record.start_time = start_time;
        }
        if let Some(called) = self.called {
            record.called = called;
        }
        if let Some(participants) = &self.participants {
            record.participants = participants.clone();
        }
        if let Some(ready) = self.participants_ready {
            for participant in &mut record.participants {
                participant.ready = ready;
            }
        }
    }
}

/// Filter over [`JudgingSession`] records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionFilter {
    pub id: Option<Uuid>,
    pub division_id: Option<Uuid>,
    pub room_id: Option<Uuid>,
    pub status: Option<Status>,
    pub start_time: Option<Option<OffsetDateTime>>,
}

impl SessionFilter {
    /// Filter selecting a single session by id.
    pub fn by_id(id: Uuid) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    /// Whether `record` satisfies every populated field.
    pub fn matches(&self, record: &JudgingSession) -> bool {
        self.id.is_none_or(|id| record.id == id)
            && self.division_id.is_none_or(|d| record.division_id == d)
            && self.room_id.is_none_or(|r| record.room_id == r)
            && self.status.is_none_or(|s| record.status == s)
            && self
                .start_time
                .as_ref()
                .is_none_or(|t| record.start_time == *t)
    }
}

/// Patch over [`JudgingSession`] records.
#[derive(Debug, Clone, Default)]
pub struct SessionPatch {
    pub status: Option<Status>,
    pub start_time: Option<Option<OffsetDateTime>>,
    pub team_id: Option<Option<Uuid>>,
    pub called: Option<bool>,
    pub queued: Option<bool>,
}

impl SessionPatch {
    /// Apply the populated fields to `record`.
    pub fn apply(&self, record: &mut JudgingSession) {
        if let Some(status) = self.status {
            record.status = status;
        }
        if let Some(start_time) = self.start_time {
            record.start_time = start_time;
        }
        if let Some(team_id) = self.team_id {
            record.team_id = team_id;
        }
        if let Some(called) = self.called {
            record.called = called;
        }
        if let Some(queued) = self.queued {
            record.queued = queued;
        }
    }
}

/// Filter over [`JudgingDeliberation`] records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeliberationFilter {
    pub id: Option<Uuid>,
    pub division_id: Option<Uuid>,
    pub status: Option<Status>,
    /// Excludes records in the given status; used by the disqualification
    /// cascade to skip completed deliberations server-side.
    pub status_not: Option<Status>,
}

impl DeliberationFilter {
    /// Filter selecting a single deliberation by id.
    pub fn by_id(id: Uuid) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    /// Whether `record` satisfies every populated field.
    pub fn matches(&self, record: &JudgingDeliberation) -> bool {
        self.id.is_none_or(|id| record.id == id)
            && self.division_id.is_none_or(|d| record.division_id == d)
            && self.status.is_none_or(|s| record.status == s)
            && self.status_not.is_none_or(|s| record.status != s)
    }
}

/// Patch over [`JudgingDeliberation`] records.
#[derive(Debug, Clone, Default)]
pub struct DeliberationPatch {
    pub status: Option<Status>,
    pub start_time: Option<Option<OffsetDateTime>>,
    pub completion_time: Option<Option<OffsetDateTime>>,
    pub awards: Option<IndexMap<String, Vec<Uuid>>>,
    pub disqualifications: Option<Vec<Uuid>>,
}

impl DeliberationPatch {
    /// Apply the populated fields to `record`.
    pub fn apply(&self, record: &mut JudgingDeliberation) {
        if let Some(status) = self.status {
            record.status = status;
        }
        if let Some(start_time) = self.start_time {
            record.start_time = start_time;
        }
        if let Some(completion_time) = self.completion_time {
            record.completion_time = completion_time;
        }
        if let Some(awards) = &self.awards {
            record.awards = awards.clone();
        }
        if let Some(disqualifications) = &self.disqualifications {
            record.disqualifications = disqualifications.clone();
        }
    }

    /// Whether applying this patch to `record` would change its status.
    pub fn changes_status_of(&self, record: &JudgingDeliberation) -> bool {
        self.status.is_some_and(|status| status != record.status)
    }
}

/// Filter over [`DivisionState`] records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DivisionStateFilter {
    pub division_id: Option<Uuid>,
    /// Matches the exact `active_match` value; `Some(None)` selects divisions
    /// with no running match, which is how the start claim enforces the
    /// one-active-match invariant inside the write itself.
    pub active_match: Option<Option<Uuid>>,
}

impl DivisionStateFilter {
    /// Filter selecting the state record of one division.
    pub fn for_division(division_id: Uuid) -> Self {
        Self {
            division_id: Some(division_id),
            ..Self::default()
        }
    }

    /// Whether `record` satisfies every populated field.
    pub fn matches(&self, record: &DivisionState) -> bool {
        self.division_id.is_none_or(|d| record.division_id == d)
            && self
                .active_match
                .as_ref()
                .is_none_or(|m| record.active_match == *m)
    }
}

/// Patch over [`DivisionState`] records.
#[derive(Debug, Clone, Default)]
pub struct DivisionStatePatch {
    pub loaded_match: Option<Option<Uuid>>,
    pub active_match: Option<Option<Uuid>>,
    pub current_stage: Option<MatchStage>,
    pub current_round: Option<u32>,
    pub current_session: Option<u32>,
}

impl DivisionStatePatch {
    /// Apply the populated fields to `record`.
    pub fn apply(&self, record: &mut DivisionState) {
        if let Some(loaded_match) = self.loaded_match {
            record.loaded_match = loaded_match;
        }
        if let Some(active_match) = self.active_match {
            record.active_match = active_match;
        }
        if let Some(current_stage) = self.current_stage {
            record.current_stage = current_stage;
        }
        if let Some(current_round) = self.current_round {
            record.current_round = current_round;
        }
        if let Some(current_session) = self.current_session {
            record.current_session = Some(current_session);
        }
    }
}

/// Filter over [`Award`] records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AwardFilter {
    pub id: Option<Uuid>,
    pub division_id: Option<Uuid>,
    pub name: Option<String>,
}

impl AwardFilter {
    /// Filter selecting every award of one division.
    pub fn for_division(division_id: Uuid) -> Self {
        Self {
            division_id: Some(division_id),
            ..Self::default()
        }
    }

    /// Whether `record` satisfies every populated field.
    pub fn matches(&self, record: &Award) -> bool {
        self.id.is_none_or(|id| record.id == id)
            && self.division_id.is_none_or(|d| record.division_id == d)
            && self.name.as_ref().is_none_or(|n| record.name == *n)
    }
}

/// Patch over [`Award`] records.
#[derive(Debug, Clone, Default)]
pub struct AwardPatch {
    pub winner: Option<Option<Uuid>>,
}

impl AwardPatch {
    /// Apply the populated fields to `record`.
    pub fn apply(&self, record: &mut Award) {
        if let Some(winner) = self.winner {
            record.winner = winner;
        }
    }
}

/// Filter over [`Scoresheet`] records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoresheetFilter {
    pub id: Option<Uuid>,
    pub division_id: Option<Uuid>,
    pub team_id: Option<Option<Uuid>>,
}

impl ScoresheetFilter {
    /// Whether `record` satisfies every populated field.
    pub fn matches(&self, record: &Scoresheet) -> bool {
        self.id.is_none_or(|id| record.id == id)
            && self.division_id.is_none_or(|d| record.division_id == d)
            && self.team_id.as_ref().is_none_or(|t| record.team_id == *t)
    }
}

/// Patch over [`Scoresheet`] records.
#[derive(Debug, Clone, Default)]
pub struct ScoresheetPatch {
    pub status: Option<String>,
    pub escalated: Option<bool>,
    pub data: Option<serde_json::Value>,
}

impl ScoresheetPatch {
    /// Apply the populated fields to `record`.
    pub fn apply(&self, record: &mut Scoresheet) {
        if let Some(status) = &self.status {
            record.status = status.clone();
        }
        if let Some(escalated) = self.escalated {
            record.escalated = escalated;
        }
        if let Some(data) = &self.data {
            record.data = data.clone();
        }
    }
}

/// Filter over [`CvForm`] records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CvFormFilter {
    pub id: Option<Uuid>,
    pub division_id: Option<Uuid>,
}

impl CvFormFilter {
    /// Whether `record` satisfies every populated field.
    pub fn matches(&self, record: &CvForm) -> bool {
        self.id.is_none_or(|id| record.id == id)
            && self.division_id.is_none_or(|d| record.division_id == d)
    }
}

/// Patch over [`CvForm`] records (full content replacement).
#[derive(Debug, Clone, Default)]
pub struct CvFormPatch {
    pub observers: Option<Vec<String>>,
    pub demonstrates_severity: Option<String>,
    pub details: Option<String>,
    pub completed_by: Option<String>,
    pub action_taken: Option<Option<String>>,
}

impl CvFormPatch {
    /// Apply the populated fields to `record`.
    pub fn apply(&self, record: &mut CvForm) {
        if let Some(observers) = &self.observers {
            record.observers = observers.clone();
        }
        if let Some(severity) = &self.demonstrates_severity {
            record.demonstrates_severity = severity.clone();
        }
        if let Some(details) = &self.details {
            record.details = details.clone();
        }
        if let Some(completed_by) = &self.completed_by {
            record.completed_by = completed_by.clone();
        }
        if let Some(action_taken) = &self.action_taken {
            record.action_taken = action_taken.clone();
        }
    }
}

/// Filter over [`Team`] records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TeamFilter {
    pub id: Option<Uuid>,
    pub division_id: Option<Uuid>,
    pub registered: Option<bool>,
}

impl TeamFilter {
    /// Filter selecting a single team by id.
    pub fn by_id(id: Uuid) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    /// Whether `record` satisfies every populated field.
    pub fn matches(&self, record: &Team) -> bool {
        self.id.is_none_or(|id| record.id == id)
            && self.division_id.is_none_or(|d| record.division_id == d)
            && self.registered.is_none_or(|r| record.registered == r)
    }
}

/// Patch over [`Team`] records.
#[derive(Debug, Clone, Default)]
pub struct TeamPatch {
    pub registered: Option<bool>,
    pub arrived: Option<bool>,
}

impl TeamPatch {
    /// Apply the populated fields to `record`.
    pub fn apply(&self, record: &mut Team) {
        if let Some(registered) = self.registered {
            record.registered = registered;
        }
        if let Some(arrived) = self.arrived {
            record.arrived = arrived;
        }
    }
}

/// Filter over [`Room`] records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoomFilter {
    pub id: Option<Uuid>,
    pub division_id: Option<Uuid>,
}

impl RoomFilter {
    /// Filter selecting a single room by id.
    pub fn by_id(id: Uuid) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    /// Whether `record` satisfies every populated field.
    pub fn matches(&self, record: &Room) -> bool {
        self.id.is_none_or(|id| record.id == id)
            && self.division_id.is_none_or(|d| record.division_id == d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn sample_match() -> GameMatch {
        GameMatch {
            id: Uuid::new_v4(),
            division_id: Uuid::new_v4(),
            stage: MatchStage::Ranking,
            round: 1,
            number: 4,
            scheduled_time: datetime!(2026-03-14 09:30 UTC),
            status: Status::InProgress,
            start_time: Some(datetime!(2026-03-14 09:31 UTC)),
            called: false,
            participants: vec![],
        }
    }

    #[test]
    fn filter_requires_exact_start_time() {
        let record = sample_match();
        let mut filter = MatchFilter {
            id: Some(record.id),
            status: Some(Status::InProgress),
            start_time: Some(record.start_time),
            ..MatchFilter::default()
        };
        assert!(filter.matches(&record));

        filter.start_time = Some(Some(datetime!(2026-03-14 09:32 UTC)));
        assert!(!filter.matches(&record));

        filter.start_time = Some(None);
        assert!(!filter.matches(&record));
    }

    #[test]
    fn patch_clears_nullable_fields_with_some_none() {
        let mut record = sample_match();
        MatchPatch {
            status: Some(Status::NotStarted),
            start_time: Some(None),
            ..MatchPatch::default()
        }
        .apply(&mut record);

        assert_eq!(record.status, Status::NotStarted);
        assert_eq!(record.start_time, None);
    }

    #[test]
    fn division_state_filter_distinguishes_idle_from_any() {
        let state = DivisionState {
            id: Uuid::new_v4(),
            division_id: Uuid::new_v4(),
            loaded_match: None,
            active_match: Some(Uuid::new_v4()),
            current_stage: MatchStage::Practice,
            current_round: 1,
            current_session: None,
        };

        let any = DivisionStateFilter::for_division(state.division_id);
        assert!(any.matches(&state));

        let idle_only = DivisionStateFilter {
            division_id: Some(state.division_id),
            active_match: Some(None),
        };
        assert!(!idle_only.matches(&state));
    }

    #[test]
    fn deliberation_status_not_excludes_completed() {
        let mut record = JudgingDeliberation {
            id: Uuid::new_v4(),
            division_id: Uuid::new_v4(),
            category: None,
            stage: "champions".into(),
            is_final_deliberation: true,
            status: Status::InProgress,
            start_time: None,
            completion_time: None,
            awards: IndexMap::new(),
            disqualifications: vec![],
        };

        let filter = DeliberationFilter {
            division_id: Some(record.division_id),
            status_not: Some(Status::Completed),
            ..DeliberationFilter::default()
        };
        assert!(filter.matches(&record));

        record.status = Status::Completed;
        assert!(!filter.matches(&record));
    }
}
