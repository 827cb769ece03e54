pub mod memory;

use futures::future::BoxFuture;

use crate::dao::filters::{
    AwardFilter, AwardPatch, CvFormFilter, CvFormPatch, DeliberationFilter, DeliberationPatch,
    DivisionStateFilter, DivisionStatePatch, MatchFilter, MatchPatch, RoomFilter, ScoresheetFilter,
    ScoresheetPatch, SessionFilter, SessionPatch, TeamFilter, TeamPatch,
};
use crate::dao::models::{
    Award, CvForm, DivisionState, GameMatch, JudgingDeliberation, JudgingSession, Room, Scoresheet,
    Team,
};
use crate::dao::storage::{InsertOutcome, StorageResult, WriteOutcome};

/// Abstraction over the persistence layer for tournament records.
///
/// Every verb is one of four shapes: point read (`get_*`), filtered read
/// (`list_*`), conditional update (`update_*_where`, reporting the matched
/// count), or delete/insert. The orchestrators never issue anything richer,
/// and all concurrency control is carried by the filters of the conditional
/// updates.
pub trait EntityStore: Send + Sync {
    fn get_match(&self, filter: MatchFilter)
    -> BoxFuture<'static, StorageResult<Option<GameMatch>>>;
    fn list_matches(&self, filter: MatchFilter)
    -> BoxFuture<'static, StorageResult<Vec<GameMatch>>>;
    fn update_matches_where(
        &self,
        filter: MatchFilter,
        patch: MatchPatch,
    ) -> BoxFuture<'static, StorageResult<WriteOutcome>>;

    fn get_session(
        &self,
        filter: SessionFilter,
    ) -> BoxFuture<'static, StorageResult<Option<JudgingSession>>>;
    fn list_sessions(
        &self,
        filter: SessionFilter,
    ) -> BoxFuture<'static, StorageResult<Vec<JudgingSession>>>;
    fn update_sessions_where(
        &self,
        filter: SessionFilter,
        patch: SessionPatch,
    ) -> BoxFuture<'static, StorageResult<WriteOutcome>>;

    fn get_deliberation(
        &self,
        filter: DeliberationFilter,
    ) -> BoxFuture<'static, StorageResult<Option<JudgingDeliberation>>>;
    fn list_deliberations(
        &self,
        filter: DeliberationFilter,
    ) -> BoxFuture<'static, StorageResult<Vec<JudgingDeliberation>>>;
    fn update_deliberations_where(
        &self,
        filter: DeliberationFilter,
        patch: DeliberationPatch,
    ) -> BoxFuture<'static, StorageResult<WriteOutcome>>;

    fn get_division_state(
        &self,
        filter: DivisionStateFilter,
    ) -> BoxFuture<'static, StorageResult<Option<DivisionState>>>;
    fn update_division_states_where(
        &self,
        filter: DivisionStateFilter,
        patch: DivisionStatePatch,
    ) -> BoxFuture<'static, StorageResult<WriteOutcome>>;

    fn list_awards(&self, filter: AwardFilter) -> BoxFuture<'static, StorageResult<Vec<Award>>>;
    fn update_awards_where(
        &self,
        filter: AwardFilter,
        patch: AwardPatch,
    ) -> BoxFuture<'static, StorageResult<WriteOutcome>>;
    fn delete_awards_where(
        &self,
        filter: AwardFilter,
    ) -> BoxFuture<'static, StorageResult<WriteOutcome>>;
    fn insert_awards(&self, records: Vec<Award>)
    -> BoxFuture<'static, StorageResult<InsertOutcome>>;

    fn get_scoresheet(
        &self,
        filter: ScoresheetFilter,
    ) -> BoxFuture<'static, StorageResult<Option<Scoresheet>>>;
    fn update_scoresheets_where(
        &self,
        filter: ScoresheetFilter,
        patch: ScoresheetPatch,
    ) -> BoxFuture<'static, StorageResult<WriteOutcome>>;

    fn get_cv_form(&self, filter: CvFormFilter)
    -> BoxFuture<'static, StorageResult<Option<CvForm>>>;
    fn insert_cv_forms(
        &self,
        records: Vec<CvForm>,
    ) -> BoxFuture<'static, StorageResult<InsertOutcome>>;
    fn update_cv_forms_where(
        &self,
        filter: CvFormFilter,
        patch: CvFormPatch,
    ) -> BoxFuture<'static, StorageResult<WriteOutcome>>;

    fn get_team(&self, filter: TeamFilter) -> BoxFuture<'static, StorageResult<Option<Team>>>;
    fn update_teams_where(
        &self,
        filter: TeamFilter,
        patch: TeamPatch,
    ) -> BoxFuture<'static, StorageResult<WriteOutcome>>;

    fn get_room(&self, filter: RoomFilter) -> BoxFuture<'static, StorageResult<Option<Room>>>;
}
