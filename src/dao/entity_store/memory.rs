//! In-memory entity store backend.
//!
//! Collections are `DashMap`s keyed by record id. A conditional update holds
//! the record's shard lock across the check-then-apply, so each record-level
//! write is atomic with respect to racing writers, which is the property the
//! orchestrators' compare-and-swap filters depend on.

use dashmap::DashMap;
use futures::FutureExt;
use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dao::entity_store::EntityStore;
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

/// Entity store backend holding every collection in process memory.
#[derive(Default)]
pub struct MemoryStore {
    matches: DashMap<Uuid, GameMatch>,
    sessions: DashMap<Uuid, JudgingSession>,
    deliberations: DashMap<Uuid, JudgingDeliberation>,
    division_states: DashMap<Uuid, DivisionState>,
    awards: DashMap<Uuid, Award>,
    scoresheets: DashMap<Uuid, Scoresheet>,
    cv_forms: DashMap<Uuid, CvForm>,
    teams: DashMap<Uuid, Team>,
    rooms: DashMap<Uuid, Room>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Upsert a match record (schedule import seam).
    pub fn put_match(&self, record: GameMatch) {
        self.matches.insert(record.id, record);
    }

    /// Upsert a judging session record.
    pub fn put_session(&self, record: JudgingSession) {
        self.sessions.insert(record.id, record);
    }

    /// Upsert a deliberation record.
    pub fn put_deliberation(&self, record: JudgingDeliberation) {
        self.deliberations.insert(record.id, record);
    }

    /// Upsert a division state record.
    pub fn put_division_state(&self, record: DivisionState) {
        self.division_states.insert(record.id, record);
    }

    /// Upsert an award record.
    pub fn put_award(&self, record: Award) {
        self.awards.insert(record.id, record);
    }

    /// Upsert a scoresheet record.
    pub fn put_scoresheet(&self, record: Scoresheet) {
        self.scoresheets.insert(record.id, record);
    }

    /// Upsert a team record.
    pub fn put_team(&self, record: Team) {
        self.teams.insert(record.id, record);
    }

    /// Upsert a room record.
    pub fn put_room(&self, record: Room) {
        self.rooms.insert(record.id, record);
    }
}

fn get_one<T, F>(collection: &DashMap<Uuid, T>, matches: F) -> Option<T>
where
    T: Clone,
    F: Fn(&T) -> bool,
{
    collection
        .iter()
        .find(|entry| matches(entry.value()))
        .map(|entry| entry.value().clone())
}

fn list_sorted<T, F, K, O>(collection: &DashMap<Uuid, T>, matches: F, key: K) -> Vec<T>
where
    T: Clone,
    F: Fn(&T) -> bool,
    K: Fn(&T) -> O,
    O: Ord,
{
    let mut records: Vec<T> = collection
        .iter()
        .filter(|entry| matches(entry.value()))
        .map(|entry| entry.value().clone())
        .collect();
    records.sort_by_key(|record| key(record));
    records
}

fn update_where<T, F, P>(collection: &DashMap<Uuid, T>, matches: F, patch: P) -> WriteOutcome
where
    F: Fn(&T) -> bool,
    P: Fn(&mut T),
{
    let mut matched = 0;
    for mut entry in collection.iter_mut() {
        if matches(entry.value()) {
            patch(entry.value_mut());
            matched += 1;
        }
    }
    WriteOutcome { matched }
}

impl EntityStore for MemoryStore {
    fn get_match(
        &self,
        filter: MatchFilter,
    ) -> BoxFuture<'static, StorageResult<Option<GameMatch>>> {
        let record = get_one(&self.matches, |m| filter.matches(m));
        async move { Ok(record) }.boxed()
    }

    fn list_matches(
        &self,
        filter: MatchFilter,
    ) -> BoxFuture<'static, StorageResult<Vec<GameMatch>>> {
        let records = list_sorted(&self.matches, |m| filter.matches(m), |m| m.number);
        async move { Ok(records) }.boxed()
    }

    fn update_matches_where(
        &self,
        filter: MatchFilter,
        patch: MatchPatch,
    ) -> BoxFuture<'static, StorageResult<WriteOutcome>> {
        let outcome = update_where(&self.matches, |m| filter.matches(m), |m| patch.apply(m));
        async move { Ok(outcome) }.boxed()
    }

    fn get_session(
        &self,
        filter: SessionFilter,
    ) -> BoxFuture<'static, StorageResult<Option<JudgingSession>>> {
        let record = get_one(&self.sessions, |s| filter.matches(s));
        async move { Ok(record) }.boxed()
    }

    fn list_sessions(
        &self,
        filter: SessionFilter,
    ) -> BoxFuture<'static, StorageResult<Vec<JudgingSession>>> {
        let records = list_sorted(&self.sessions, |s| filter.matches(s), |s| s.number);
        async move { Ok(records) }.boxed()
    }

    fn update_sessions_where(
        &self,
        filter: SessionFilter,
        patch: SessionPatch,
    ) -> BoxFuture<'static, StorageResult<WriteOutcome>> {
        let outcome = update_where(&self.sessions, |s| filter.matches(s), |s| patch.apply(s));
        async move { Ok(outcome) }.boxed()
    }

    fn get_deliberation(
        &self,
        filter: DeliberationFilter,
    ) -> BoxFuture<'static, StorageResult<Option<JudgingDeliberation>>> {
        let record = get_one(&self.deliberations, |d| filter.matches(d));
        async move { Ok(record) }.boxed()
    }

    fn list_deliberations(
        &self,
        filter: DeliberationFilter,
    ) -> BoxFuture<'static, StorageResult<Vec<JudgingDeliberation>>> {
        let records = list_sorted(&self.deliberations, |d| filter.matches(d), |d| d.id);
        async move { Ok(records) }.boxed()
    }

    fn update_deliberations_where(
        &self,
        filter: DeliberationFilter,
        patch: DeliberationPatch,
    ) -> BoxFuture<'static, StorageResult<WriteOutcome>> {
        let outcome = update_where(
            &self.deliberations,
            |d| filter.matches(d),
            |d| patch.apply(d),
        );
        async move { Ok(outcome) }.boxed()
    }

    fn get_division_state(
        &self,
        filter: DivisionStateFilter,
    ) -> BoxFuture<'static, StorageResult<Option<DivisionState>>> {
        let record = get_one(&self.division_states, |s| filter.matches(s));
        async move { Ok(record) }.boxed()
    }

    fn update_division_states_where(
        &self,
        filter: DivisionStateFilter,
        patch: DivisionStatePatch,
    ) -> BoxFuture<'static, StorageResult<WriteOutcome>> {
        let outcome = update_where(
            &self.division_states,
            |s| filter.matches(s),
            |s| patch.apply(s),
        );
        async move { Ok(outcome) }.boxed()
    }

    fn list_awards(&self, filter: AwardFilter) -> BoxFuture<'static, StorageResult<Vec<Award>>> {
        let records = list_sorted(&self.awards, |a| filter.matches(a), |a| (a.index, a.place));
        async move { Ok(records) }.boxed()
    }

    fn update_awards_where(
        &self,
        filter: AwardFilter,
        patch: AwardPatch,
    ) -> BoxFuture<'static, StorageResult<WriteOutcome>> {
        let outcome = update_where(&self.awards, |a| filter.matches(a), |a| patch.apply(a));
        async move { Ok(outcome) }.boxed()
    }

    fn delete_awards_where(
        &self,
        filter: AwardFilter,
    ) -> BoxFuture<'static, StorageResult<WriteOutcome>> {
        let before = self.awards.len();
        self.awards.retain(|_, record| !filter.matches(record));
        let outcome = WriteOutcome {
            matched: before - self.awards.len(),
        };
        async move { Ok(outcome) }.boxed()
    }

    fn insert_awards(
        &self,
        records: Vec<Award>,
    ) -> BoxFuture<'static, StorageResult<InsertOutcome>> {
        let mut inserted_ids = Vec::with_capacity(records.len());
        for record in records {
            inserted_ids.push(record.id);
            self.awards.insert(record.id, record);
        }
        async move { Ok(InsertOutcome { inserted_ids }) }.boxed()
    }

    fn get_scoresheet(
        &self,
        filter: ScoresheetFilter,
    ) -> BoxFuture<'static, StorageResult<Option<Scoresheet>>> {
        let record = get_one(&self.scoresheets, |s| filter.matches(s));
        async move { Ok(record) }.boxed()
    }

    fn update_scoresheets_where(
        &self,
        filter: ScoresheetFilter,
        patch: ScoresheetPatch,
    ) -> BoxFuture<'static, StorageResult<WriteOutcome>> {
        let outcome = update_where(&self.scoresheets, |s| filter.matches(s), |s| patch.apply(s));
        async move { Ok(outcome) }.boxed()
    }

    fn get_cv_form(
        &self,
        filter: CvFormFilter,
    ) -> BoxFuture<'static, StorageResult<Option<CvForm>>> {
        let record = get_one(&self.cv_forms, |f| filter.matches(f));
        async move { Ok(record) }.boxed()
    }

    fn insert_cv_forms(
        &self,
        records: Vec<CvForm>,
    ) -> BoxFuture<'static, StorageResult<InsertOutcome>> {
        let mut inserted_ids = Vec::with_capacity(records.len());
        for record in records {
            inserted_ids.push(record.id);
            self.cv_forms.insert(record.id, record);
        }
        async move { Ok(InsertOutcome { inserted_ids }) }.boxed()
    }

    fn update_cv_forms_where(
        &self,
        filter: CvFormFilter,
        patch: CvFormPatch,
    ) -> BoxFuture<'static, StorageResult<WriteOutcome>> {
        let outcome = update_where(&self.cv_forms, |f| filter.matches(f), |f| patch.apply(f));
        async move { Ok(outcome) }.boxed()
    }

    fn get_team(&self, filter: TeamFilter) -> BoxFuture<'static, StorageResult<Option<Team>>> {
        let record = get_one(&self.teams, |t| filter.matches(t));
        async move { Ok(record) }.boxed()
    }

    fn update_teams_where(
        &self,
        filter: TeamFilter,
        patch: TeamPatch,
    ) -> BoxFuture<'static, StorageResult<WriteOutcome>> {
        let outcome = update_where(&self.teams, |t| filter.matches(t), |t| patch.apply(t));
        async move { Ok(outcome) }.boxed()
    }

    fn get_room(&self, filter: RoomFilter) -> BoxFuture<'static, StorageResult<Option<Room>>> {
        let record = get_one(&self.rooms, |r| filter.matches(r));
        async move { Ok(record) }.boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::models::{MatchStage, Status};
    use time::macros::datetime;

    fn match_record(division_id: Uuid, number: u32, status: Status) -> GameMatch {
        GameMatch {
            id: Uuid::new_v4(),
            division_id,
            stage: MatchStage::Ranking,
            round: 1,
            number,
            scheduled_time: datetime!(2026-03-14 10:00 UTC),
            status,
            start_time: None,
            called: false,
            participants: vec![],
        }
    }

    #[tokio::test]
    async fn conditional_update_reports_zero_on_mismatch() {
        let store = MemoryStore::new();
        let division_id = Uuid::new_v4();
        let record = match_record(division_id, 1, Status::NotStarted);
        let id = record.id;
        store.put_match(record);

        let outcome = store
            .update_matches_where(
                MatchFilter {
                    id: Some(id),
                    status: Some(Status::InProgress),
                    ..MatchFilter::default()
                },
                MatchPatch {
                    status: Some(Status::Completed),
                    ..MatchPatch::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(outcome.matched, 0);

        let unchanged = store.get_match(MatchFilter::by_id(id)).await.unwrap();
        assert_eq!(unchanged.unwrap().status, Status::NotStarted);
    }

    #[tokio::test]
    async fn conditional_update_applies_when_filter_matches() {
        let store = MemoryStore::new();
        let division_id = Uuid::new_v4();
        let record = match_record(division_id, 1, Status::NotStarted);
        let id = record.id;
        store.put_match(record);

        let start = datetime!(2026-03-14 10:01 UTC);
        let outcome = store
            .update_matches_where(
                MatchFilter {
                    id: Some(id),
                    status: Some(Status::NotStarted),
                    ..MatchFilter::default()
                },
                MatchPatch {
                    status: Some(Status::InProgress),
                    start_time: Some(Some(start)),
                    ..MatchPatch::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(outcome.matched, 1);

        let updated = store
            .get_match(MatchFilter::by_id(id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.status, Status::InProgress);
        assert_eq!(updated.start_time, Some(start));
    }

    #[tokio::test]
    async fn list_matches_is_ordered_by_number() {
        let store = MemoryStore::new();
        let division_id = Uuid::new_v4();
        for number in [3, 1, 2] {
            store.put_match(match_record(division_id, number, Status::NotStarted));
        }

        let listed = store
            .list_matches(MatchFilter {
                division_id: Some(division_id),
                ..MatchFilter::default()
            })
            .await
            .unwrap();
        let numbers: Vec<u32> = listed.iter().map(|m| m.number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn delete_and_insert_awards_round_trip() {
        let store = MemoryStore::new();
        let division_id = Uuid::new_v4();
        for place in 1..=3 {
            store.put_award(Award {
                id: Uuid::new_v4(),
                division_id,
                name: "advancement".into(),
                place,
                index: 100,
                winner: Some(Uuid::new_v4()),
            });
        }

        let deleted = store
            .delete_awards_where(AwardFilter {
                division_id: Some(division_id),
                name: Some("advancement".into()),
                ..AwardFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(deleted.matched, 3);

        let inserted = store
            .insert_awards(vec![Award {
                id: Uuid::new_v4(),
                division_id,
                name: "advancement".into(),
                place: 1,
                index: 100,
                winner: Some(Uuid::new_v4()),
            }])
            .await
            .unwrap();
        assert_eq!(inserted.inserted_ids.len(), 1);

        let remaining = store
            .list_awards(AwardFilter::for_division(division_id))
            .await
            .unwrap();
        assert_eq!(remaining.len(), 1);
    }
}
