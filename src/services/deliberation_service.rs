//! Deliberation orchestrator: picklist editing, the disqualification cascade,
//! and award-winner assignment.
//!
//! Deliberations move monotonically through `not-started → in-progress →
//! completed`; there is no abort. Multi-record operations (disqualification,
//! winner assignment) are fail-fast without compensation: each underlying
//! write is an absolute patch, so retrying the whole call is idempotent.

use indexmap::IndexMap;
use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

use crate::{
    dao::filters::{AwardFilter, AwardPatch, DeliberationFilter, DeliberationPatch},
    dao::models::{Award, JudgingDeliberation, Status},
    dto::judging::{
        AdvanceTeamsRequest, DisqualifyTeamRequest, UpdateAwardWinnersRequest,
        UpdateDeliberationRequest,
    },
    error::ServiceError,
    services::sse_events,
    state::SharedState,
};

/// Name of the award whose rows are regenerated by team advancement.
const ADVANCEMENT_AWARD: &str = "advancement";

async fn require_deliberation(
    state: &SharedState,
    division_id: Uuid,
    deliberation_id: Uuid,
) -> Result<JudgingDeliberation, ServiceError> {
    state
        .store()
        .get_deliberation(DeliberationFilter {
            id: Some(deliberation_id),
            division_id: Some(division_id),
            ..DeliberationFilter::default()
        })
        .await?
        .ok_or_else(|| {
            ServiceError::NotFound(format!(
                "could not find deliberation {deliberation_id} in division {division_id}"
            ))
        })
}

/// Start a deliberation.
pub async fn start_deliberation(
    state: &SharedState,
    division_id: Uuid,
    deliberation_id: Uuid,
) -> Result<(), ServiceError> {
    let record = require_deliberation(state, division_id, deliberation_id).await?;
    if record.status != Status::NotStarted {
        return Err(ServiceError::PreconditionFailed(format!(
            "deliberation {deliberation_id} has already started"
        )));
    }

    let outcome = state
        .store()
        .update_deliberations_where(
            DeliberationFilter {
                id: Some(deliberation_id),
                status: Some(Status::NotStarted),
                ..DeliberationFilter::default()
            },
            DeliberationPatch {
                status: Some(Status::InProgress),
                start_time: Some(Some(OffsetDateTime::now_utc())),
                ..DeliberationPatch::default()
            },
        )
        .await?;
    if !outcome.any() {
        return Err(ServiceError::PreconditionFailed(format!(
            "deliberation {deliberation_id} has already started"
        )));
    }

    info!(%deliberation_id, %division_id, "deliberation started");

    let started = require_deliberation(state, division_id, deliberation_id).await?;
    sse_events::broadcast_deliberation_started(state, started);
    Ok(())
}

async fn apply_deliberation_patch(
    state: &SharedState,
    division_id: Uuid,
    deliberation_id: Uuid,
    patch: DeliberationPatch,
) -> Result<(), ServiceError> {
    let record = require_deliberation(state, division_id, deliberation_id).await?;
    if record.status == Status::Completed {
        return Err(ServiceError::PreconditionFailed(format!(
            "deliberation {deliberation_id} is completed and no longer editable"
        )));
    }
    let status_changed = patch.changes_status_of(&record);

    let outcome = state
        .store()
        .update_deliberations_where(
            DeliberationFilter {
                id: Some(deliberation_id),
                status_not: Some(Status::Completed),
                ..DeliberationFilter::default()
            },
            patch,
        )
        .await?;
    if !outcome.any() {
        return Err(ServiceError::PreconditionFailed(format!(
            "deliberation {deliberation_id} is completed and no longer editable"
        )));
    }

    info!(%deliberation_id, %division_id, status_changed, "deliberation updated");

    let updated = require_deliberation(state, division_id, deliberation_id).await?;
    sse_events::broadcast_deliberation_updated(state, updated.clone());
    if status_changed {
        sse_events::broadcast_deliberation_status_changed(state, updated);
    }
    Ok(())
}

/// Patch a non-completed deliberation's picklists, disqualifications or
/// status.
pub async fn update_deliberation(
    state: &SharedState,
    division_id: Uuid,
    deliberation_id: Uuid,
    request: UpdateDeliberationRequest,
) -> Result<(), ServiceError> {
    apply_deliberation_patch(
        state,
        division_id,
        deliberation_id,
        DeliberationPatch {
            status: request.status,
            awards: request.awards,
            disqualifications: request.disqualifications,
            ..DeliberationPatch::default()
        },
    )
    .await
}

/// Complete a deliberation, optionally carrying one last content patch.
pub async fn complete_deliberation(
    state: &SharedState,
    division_id: Uuid,
    deliberation_id: Uuid,
    request: UpdateDeliberationRequest,
) -> Result<(), ServiceError> {
    apply_deliberation_patch(
        state,
        division_id,
        deliberation_id,
        DeliberationPatch {
            status: Some(Status::Completed),
            completion_time: Some(Some(OffsetDateTime::now_utc())),
            awards: request.awards,
            disqualifications: request.disqualifications,
            ..DeliberationPatch::default()
        },
    )
    .await
}

/// Disqualify a team across every non-completed deliberation of the division.
///
/// The team is appended to each record's disqualification list and removed,
/// order-preserving, from every picklist referencing it. Fail-fast: a failing
/// write aborts the call, but earlier writes stay committed and the call is
/// safe to retry.
pub async fn disqualify_team(
    state: &SharedState,
    division_id: Uuid,
    request: DisqualifyTeamRequest,
) -> Result<(), ServiceError> {
    let team_id = request.team_id;
    let open = state
        .store()
        .list_deliberations(DeliberationFilter {
            division_id: Some(division_id),
            status_not: Some(Status::Completed),
            ..DeliberationFilter::default()
        })
        .await?;

    for record in open {
        let mut disqualifications = record.disqualifications.clone();
        if !disqualifications.contains(&team_id) {
            disqualifications.push(team_id);
        }
        let awards: IndexMap<String, Vec<Uuid>> = record
            .awards
            .iter()
            .map(|(name, picklist)| {
                let filtered: Vec<Uuid> = picklist
                    .iter()
                    .copied()
                    .filter(|candidate| *candidate != team_id)
                    .collect();
                (name.clone(), filtered)
            })
            .collect();

        let outcome = state
            .store()
            .update_deliberations_where(
                DeliberationFilter {
                    id: Some(record.id),
                    status_not: Some(Status::Completed),
                    ..DeliberationFilter::default()
                },
                DeliberationPatch {
                    awards: Some(awards),
                    disqualifications: Some(disqualifications),
                    ..DeliberationPatch::default()
                },
            )
            .await?;
        if !outcome.any() {
            return Err(ServiceError::PreconditionFailed(format!(
                "deliberation {} completed mid-cascade; retry the disqualification",
                record.id
            )));
        }

        let updated = require_deliberation(state, division_id, record.id).await?;
        sse_events::broadcast_deliberation_updated(state, updated);
    }

    info!(%team_id, %division_id, "team disqualified across open deliberations");
    Ok(())
}

/// Assign winners to the division's award place-rows.
///
/// Validation covers the whole request before any write: every award name
/// must exist and each winner list must match that award's place-row count
/// exactly, otherwise nothing is written.
pub async fn update_award_winners(
    state: &SharedState,
    division_id: Uuid,
    request: UpdateAwardWinnersRequest,
) -> Result<(), ServiceError> {
    let awards = state
        .store()
        .list_awards(AwardFilter::for_division(division_id))
        .await?;

    let mut planned: Vec<(Uuid, Uuid)> = Vec::new();
    for (name, winners) in &request.winners {
        let mut rows: Vec<&Award> = awards.iter().filter(|award| award.name == *name).collect();
        if rows.is_empty() {
            return Err(ServiceError::InvalidInput(format!(
                "division {division_id} has no award named {name}"
            )));
        }
        if rows.len() != winners.len() {
            return Err(ServiceError::InvalidInput(format!(
                "award {name} has {} places but {} winners were given",
                rows.len(),
                winners.len()
            )));
        }
        rows.sort_by_key(|award| award.place);
        for (row, winner) in rows.iter().zip(winners) {
            planned.push((row.id, *winner));
        }
    }

    for (award_id, winner) in planned {
        let outcome = state
            .store()
            .update_awards_where(
                AwardFilter {
                    id: Some(award_id),
                    ..AwardFilter::default()
                },
                AwardPatch {
                    winner: Some(Some(winner)),
                },
            )
            .await?;
        if !outcome.any() {
            return Err(ServiceError::PreconditionFailed(format!(
                "award {award_id} disappeared mid-assignment; retry the winner update"
            )));
        }
    }

    info!(%division_id, awards = request.winners.len(), "award winners updated");

    let refreshed = state
        .store()
        .list_awards(AwardFilter::for_division(division_id))
        .await?;
    sse_events::broadcast_awards_updated(state, refreshed);
    Ok(())
}

/// Replace the division's advancement rows with this ordered team list.
pub async fn advance_teams(
    state: &SharedState,
    division_id: Uuid,
    request: AdvanceTeamsRequest,
) -> Result<(), ServiceError> {
    state
        .store()
        .delete_awards_where(AwardFilter {
            division_id: Some(division_id),
            name: Some(ADVANCEMENT_AWARD.to_string()),
            ..AwardFilter::default()
        })
        .await?;

    let rows: Vec<Award> = request
        .teams
        .iter()
        .enumerate()
        .map(|(position, team_id)| Award {
            id: Uuid::new_v4(),
            division_id,
            name: ADVANCEMENT_AWARD.to_string(),
            place: position as u32 + 1,
            index: 0,
            winner: Some(*team_id),
        })
        .collect();
    state.store().insert_awards(rows).await?;

    info!(%division_id, advancing = request.teams.len(), "advancement awards regenerated");

    let refreshed = state
        .store()
        .list_awards(AwardFilter::for_division(division_id))
        .await?;
    sse_events::broadcast_awards_updated(state, refreshed);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use futures::FutureExt;
    use futures::future::BoxFuture;

    use crate::config::AppConfig;
    use crate::dao::entity_store::EntityStore;
    use crate::dao::entity_store::memory::MemoryStore;
    use crate::dao::filters::{
        CvFormFilter, CvFormPatch, DivisionStatePatch, DivisionStateFilter, MatchFilter,
        MatchPatch, RoomFilter, ScoresheetFilter, ScoresheetPatch, SessionFilter, SessionPatch,
        TeamFilter, TeamPatch,
    };
    use crate::dao::models::{
        CvForm, DivisionState, GameMatch, JudgingSession, Room, Scoresheet, Team,
    };
    use crate::dao::storage::{InsertOutcome, StorageResult, WriteOutcome};
    use crate::services::scheduler::TokioScheduler;
    use crate::state::AppState;

    struct Fixture {
        state: SharedState,
        store: Arc<MemoryStore>,
        division_id: Uuid,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let state = AppState::new(
            AppConfig::default(),
            store.clone(),
            Arc::new(TokioScheduler),
        );
        Fixture {
            state,
            store,
            division_id: Uuid::new_v4(),
        }
    }

    fn seed_deliberation(
        fixture: &Fixture,
        status: Status,
        awards: IndexMap<String, Vec<Uuid>>,
    ) -> Uuid {
        let id = Uuid::new_v4();
        fixture.store.put_deliberation(JudgingDeliberation {
            id,
            division_id: fixture.division_id,
            category: None,
            stage: "champions".into(),
            is_final_deliberation: false,
            status,
            start_time: None,
            completion_time: None,
            awards,
            disqualifications: vec![],
        });
        id
    }

    fn seed_award(fixture: &Fixture, name: &str, place: u32) -> Uuid {
        let id = Uuid::new_v4();
        fixture.store.put_award(Award {
            id,
            division_id: fixture.division_id,
            name: name.into(),
            place,
            index: place,
            winner: None,
        });
        id
    }

    async fn stored_deliberation(fixture: &Fixture, id: Uuid) -> JudgingDeliberation {
        fixture
            .store
            .get_deliberation(DeliberationFilter::by_id(id))
            .await
            .unwrap()
            .unwrap()
    }

    async fn stored_awards(fixture: &Fixture) -> Vec<Award> {
        fixture
            .store
            .list_awards(AwardFilter::for_division(fixture.division_id))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn start_is_rejected_once_in_progress() {
        let fx = fixture();
        let id = seed_deliberation(&fx, Status::NotStarted, IndexMap::new());

        start_deliberation(&fx.state, fx.division_id, id).await.unwrap();
        let record = stored_deliberation(&fx, id).await;
        assert_eq!(record.status, Status::InProgress);
        assert!(record.start_time.is_some());

        let err = start_deliberation(&fx.state, fx.division_id, id)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::PreconditionFailed(_)));
    }

    #[tokio::test]
    async fn status_changed_event_fires_only_when_status_moves() {
        let fx = fixture();
        let id = seed_deliberation(&fx, Status::InProgress, IndexMap::new());
        let mut judging = fx.state.judging().subscribe();

        update_deliberation(
            &fx.state,
            fx.division_id,
            id,
            UpdateDeliberationRequest {
                status: None,
                awards: Some(IndexMap::from([(
                    "champions".to_string(),
                    vec![Uuid::new_v4()],
                )])),
                disqualifications: None,
            },
        )
        .await
        .unwrap();

        assert_eq!(
            judging.recv().await.unwrap().event.as_deref(),
            Some("judgingDeliberationUpdated")
        );
        assert!(judging.try_recv().is_err());

        complete_deliberation(
            &fx.state,
            fx.division_id,
            id,
            UpdateDeliberationRequest {
                status: None,
                awards: None,
                disqualifications: None,
            },
        )
        .await
        .unwrap();

        assert_eq!(
            judging.recv().await.unwrap().event.as_deref(),
            Some("judgingDeliberationUpdated")
        );
        assert_eq!(
            judging.recv().await.unwrap().event.as_deref(),
            Some("judgingDeliberationStatusChanged")
        );

        let record = stored_deliberation(&fx, id).await;
        assert_eq!(record.status, Status::Completed);
        assert!(record.completion_time.is_some());
    }

    #[tokio::test]
    async fn completed_deliberations_are_immutable() {
        let fx = fixture();
        let id = seed_deliberation(&fx, Status::Completed, IndexMap::new());

        let err = update_deliberation(
            &fx.state,
            fx.division_id,
            id,
            UpdateDeliberationRequest {
                status: None,
                awards: None,
                disqualifications: Some(vec![Uuid::new_v4()]),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::PreconditionFailed(_)));
    }

    #[tokio::test]
    async fn disqualification_cascades_across_open_deliberations_only() {
        let fx = fixture();
        let dq_team = Uuid::new_v4();
        let other_team = Uuid::new_v4();

        let picklists = IndexMap::from([
            ("champions".to_string(), vec![other_team, dq_team]),
            ("innovation".to_string(), vec![dq_team]),
        ]);
        let open = seed_deliberation(&fx, Status::InProgress, picklists.clone());
        let pending = seed_deliberation(&fx, Status::NotStarted, picklists.clone());
        let closed = seed_deliberation(&fx, Status::Completed, picklists);

        disqualify_team(
            &fx.state,
            fx.division_id,
            DisqualifyTeamRequest { team_id: dq_team },
        )
        .await
        .unwrap();

        for id in [open, pending] {
            let record = stored_deliberation(&fx, id).await;
            assert!(record.disqualifications.contains(&dq_team));
            assert_eq!(record.awards["champions"], vec![other_team]);
            assert!(record.awards["innovation"].is_empty());
        }

        let untouched = stored_deliberation(&fx, closed).await;
        assert!(untouched.disqualifications.is_empty());
        assert_eq!(untouched.awards["champions"], vec![other_team, dq_team]);
    }

    #[tokio::test]
    async fn disqualification_is_idempotent() {
        let fx = fixture();
        let dq_team = Uuid::new_v4();
        let id = seed_deliberation(
            &fx,
            Status::InProgress,
            IndexMap::from([("champions".to_string(), vec![dq_team])]),
        );

        for _ in 0..2 {
            disqualify_team(
                &fx.state,
                fx.division_id,
                DisqualifyTeamRequest { team_id: dq_team },
            )
            .await
            .unwrap();
        }

        let record = stored_deliberation(&fx, id).await;
        assert_eq!(record.disqualifications, vec![dq_team]);
    }

    #[tokio::test]
    async fn mismatched_winner_count_writes_nothing() {
        let fx = fixture();
        seed_award(&fx, "champions", 1);
        seed_award(&fx, "champions", 2);

        let err = update_award_winners(
            &fx.state,
            fx.division_id,
            UpdateAwardWinnersRequest {
                winners: IndexMap::from([("champions".to_string(), vec![Uuid::new_v4()])]),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));

        assert!(stored_awards(&fx).await.iter().all(|a| a.winner.is_none()));
    }

    /// Store whose award writes never match, as if the rows were deleted
    /// between the validation read and the per-row write.
    struct VanishingAwardStore {
        inner: MemoryStore,
    }

    impl EntityStore for VanishingAwardStore {
        fn get_match(
            &self,
            _filter: MatchFilter,
        ) -> BoxFuture<'static, StorageResult<Option<GameMatch>>> {
            unimplemented!()
        }

        fn list_matches(
            &self,
            _filter: MatchFilter,
        ) -> BoxFuture<'static, StorageResult<Vec<GameMatch>>> {
            unimplemented!()
        }

        fn update_matches_where(
            &self,
            _filter: MatchFilter,
            _patch: MatchPatch,
        ) -> BoxFuture<'static, StorageResult<WriteOutcome>> {
            unimplemented!()
        }

        fn get_session(
            &self,
            _filter: SessionFilter,
        ) -> BoxFuture<'static, StorageResult<Option<JudgingSession>>> {
            unimplemented!()
        }

        fn list_sessions(
            &self,
            _filter: SessionFilter,
        ) -> BoxFuture<'static, StorageResult<Vec<JudgingSession>>> {
            unimplemented!()
        }

        fn update_sessions_where(
            &self,
            _filter: SessionFilter,
            _patch: SessionPatch,
        ) -> BoxFuture<'static, StorageResult<WriteOutcome>> {
            unimplemented!()
        }

        fn get_deliberation(
            &self,
            _filter: DeliberationFilter,
        ) -> BoxFuture<'static, StorageResult<Option<JudgingDeliberation>>> {
            unimplemented!()
        }

        fn list_deliberations(
            &self,
            _filter: DeliberationFilter,
        ) -> BoxFuture<'static, StorageResult<Vec<JudgingDeliberation>>> {
            unimplemented!()
        }

        fn update_deliberations_where(
            &self,
            _filter: DeliberationFilter,
            _patch: DeliberationPatch,
        ) -> BoxFuture<'static, StorageResult<WriteOutcome>> {
            unimplemented!()
        }

        fn get_division_state(
            &self,
            _filter: DivisionStateFilter,
        ) -> BoxFuture<'static, StorageResult<Option<DivisionState>>> {
            unimplemented!()
        }

        fn update_division_states_where(
            &self,
            _filter: DivisionStateFilter,
            _patch: DivisionStatePatch,
        ) -> BoxFuture<'static, StorageResult<WriteOutcome>> {
            unimplemented!()
        }

        fn list_awards(
            &self,
            filter: AwardFilter,
        ) -> BoxFuture<'static, StorageResult<Vec<Award>>> {
            self.inner.list_awards(filter)
        }

        fn update_awards_where(
            &self,
            _filter: AwardFilter,
            _patch: AwardPatch,
        ) -> BoxFuture<'static, StorageResult<WriteOutcome>> {
            async move { Ok(WriteOutcome { matched: 0 }) }.boxed()
        }

        fn delete_awards_where(
            &self,
            _filter: AwardFilter,
        ) -> BoxFuture<'static, StorageResult<WriteOutcome>> {
            unimplemented!()
        }

        fn insert_awards(
            &self,
            _records: Vec<Award>,
        ) -> BoxFuture<'static, StorageResult<InsertOutcome>> {
            unimplemented!()
        }

        fn get_scoresheet(
            &self,
            _filter: ScoresheetFilter,
        ) -> BoxFuture<'static, StorageResult<Option<Scoresheet>>> {
            unimplemented!()
        }

        fn update_scoresheets_where(
            &self,
            _filter: ScoresheetFilter,
            _patch: ScoresheetPatch,
        ) -> BoxFuture<'static, StorageResult<WriteOutcome>> {
            unimplemented!()
        }

        fn get_cv_form(
            &self,
            _filter: CvFormFilter,
        ) -> BoxFuture<'static, StorageResult<Option<CvForm>>> {
            unimplemented!()
        }

        fn insert_cv_forms(
            &self,
            _records: Vec<CvForm>,
        ) -> BoxFuture<'static, StorageResult<InsertOutcome>> {
            unimplemented!()
        }

        fn update_cv_forms_where(
            &self,
            _filter: CvFormFilter,
            _patch: CvFormPatch,
        ) -> BoxFuture<'static, StorageResult<WriteOutcome>> {
            unimplemented!()
        }

        fn get_team(
            &self,
            _filter: TeamFilter,
        ) -> BoxFuture<'static, StorageResult<Option<Team>>> {
            unimplemented!()
        }

        fn update_teams_where(
            &self,
            _filter: TeamFilter,
            _patch: TeamPatch,
        ) -> BoxFuture<'static, StorageResult<WriteOutcome>> {
            unimplemented!()
        }

        fn get_room(
            &self,
            _filter: RoomFilter,
        ) -> BoxFuture<'static, StorageResult<Option<Room>>> {
            unimplemented!()
        }
    }

    #[tokio::test]
    async fn winner_write_that_matches_nothing_fails_without_broadcast() {
        let store = Arc::new(VanishingAwardStore {
            inner: MemoryStore::new(),
        });
        let division_id = Uuid::new_v4();
        store.inner.put_award(Award {
            id: Uuid::new_v4(),
            division_id,
            name: "champions".into(),
            place: 1,
            index: 1,
            winner: None,
        });
        let state = AppState::new(
            AppConfig::default(),
            store.clone(),
            Arc::new(TokioScheduler),
        );
        let mut judging = state.judging().subscribe();

        let err = update_award_winners(
            &state,
            division_id,
            UpdateAwardWinnersRequest {
                winners: IndexMap::from([("champions".to_string(), vec![Uuid::new_v4()])]),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::PreconditionFailed(_)));

        assert!(judging.try_recv().is_err());
    }

    #[tokio::test]
    async fn winners_are_assigned_by_ascending_place() {
        let fx = fixture();
        seed_award(&fx, "champions", 2);
        seed_award(&fx, "champions", 1);
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();

        update_award_winners(
            &fx.state,
            fx.division_id,
            UpdateAwardWinnersRequest {
                winners: IndexMap::from([("champions".to_string(), vec![first, second])]),
            },
        )
        .await
        .unwrap();

        let awards = stored_awards(&fx).await;
        let by_place = |place: u32| {
            awards
                .iter()
                .find(|a| a.place == place)
                .and_then(|a| a.winner)
        };
        assert_eq!(by_place(1), Some(first));
        assert_eq!(by_place(2), Some(second));
    }

    #[tokio::test]
    async fn advancing_teams_regenerates_the_rows() {
        let fx = fixture();
        fx.store.put_award(Award {
            id: Uuid::new_v4(),
            division_id: fx.division_id,
            name: ADVANCEMENT_AWARD.into(),
            place: 1,
            index: 0,
            winner: Some(Uuid::new_v4()),
        });
        seed_award(&fx, "champions", 1);

        let advancing = vec![Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()];
        advance_teams(
            &fx.state,
            fx.division_id,
            AdvanceTeamsRequest {
                teams: advancing.clone(),
            },
        )
        .await
        .unwrap();

        let rows: Vec<Award> = stored_awards(&fx)
            .await
            .into_iter()
            .filter(|a| a.name == ADVANCEMENT_AWARD)
            .collect();
        assert_eq!(rows.len(), 3);
        for (position, team_id) in advancing.iter().enumerate() {
            let row = rows
                .iter()
                .find(|a| a.place == position as u32 + 1)
                .unwrap();
            assert_eq!(row.winner, Some(*team_id));
        }
    }
}
