//! Judging-side orchestrator: session lifecycle, Core Values forms, and the
//! lead-judge call.
//!
//! Sessions mirror the match lifecycle with the room taking the division's
//! role: at most one session per room is in progress at a time, and the
//! completion timer re-validates the session's identity before committing.

use time::OffsetDateTime;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    dao::filters::{
        CvFormFilter, CvFormPatch, DivisionStateFilter, DivisionStatePatch, RoomFilter,
        SessionFilter, SessionPatch,
    },
    dao::models::{CvForm, JudgingSession, Status},
    dto::judging::{CvFormRequest, UpdateSessionRequest, UpdateSessionTeamRequest},
    error::ServiceError,
    services::sse_events,
    state::SharedState,
};

async fn require_session(
    state: &SharedState,
    division_id: Uuid,
    session_id: Uuid,
) -> Result<JudgingSession, ServiceError> {
    state
        .store()
        .get_session(SessionFilter {
            id: Some(session_id),
            division_id: Some(division_id),
            ..SessionFilter::default()
        })
        .await?
        .ok_or_else(|| {
            ServiceError::NotFound(format!(
                "could not find session {session_id} in division {division_id}"
            ))
        })
}

/// List a division's sessions in schedule order.
pub async fn list_sessions(
    state: &SharedState,
    division_id: Uuid,
) -> Result<Vec<JudgingSession>, ServiceError> {
    let records = state
        .store()
        .list_sessions(SessionFilter {
            division_id: Some(division_id),
            ..SessionFilter::default()
        })
        .await?;
    Ok(records)
}

/// Start a judging session in its room.
///
/// The room-level invariant is a pre-scan for another in-progress session in
/// the same room, followed by a conditional transition of this session.
pub async fn start_session(
    state: &SharedState,
    division_id: Uuid,
    room_id: Uuid,
    session_id: Uuid,
) -> Result<(), ServiceError> {
    let session = require_session(state, division_id, session_id).await?;
    if session.room_id != room_id {
        return Err(ServiceError::InvalidInput(format!(
            "session {session_id} is not scheduled in room {room_id}"
        )));
    }
    if session.status != Status::NotStarted {
        return Err(ServiceError::PreconditionFailed(format!(
            "session {session_id} has already started"
        )));
    }

    let busy = state
        .store()
        .get_session(SessionFilter {
            room_id: Some(room_id),
            status: Some(Status::InProgress),
            ..SessionFilter::default()
        })
        .await?;
    if let Some(running) = busy {
        return Err(ServiceError::PreconditionFailed(format!(
            "room {room_id} already has session {} in progress",
            running.id
        )));
    }

    let start_time = OffsetDateTime::now_utc();
    let outcome = state
        .store()
        .update_sessions_where(
            SessionFilter {
                id: Some(session_id),
                status: Some(Status::NotStarted),
                ..SessionFilter::default()
            },
            SessionPatch {
                status: Some(Status::InProgress),
                start_time: Some(Some(start_time)),
                ..SessionPatch::default()
            },
        )
        .await?;
    if !outcome.any() {
        return Err(ServiceError::PreconditionFailed(format!(
            "session {session_id} has already started"
        )));
    }

    let division = state
        .store()
        .get_division_state(DivisionStateFilter::for_division(division_id))
        .await?
        .ok_or_else(|| {
            ServiceError::NotFound(format!("could not find state for division {division_id}"))
        })?;
    if division
        .current_session
        .is_none_or(|current| session.number > current)
    {
        state
            .store()
            .update_division_states_where(
                DivisionStateFilter::for_division(division_id),
                DivisionStatePatch {
                    current_session: Some(session.number),
                    ..DivisionStatePatch::default()
                },
            )
            .await?;
    }

    let completion_state = state.clone();
    state.scheduler().schedule_at(
        start_time + state.config().session_length,
        Box::pin(async move {
            complete_session_due(completion_state, session_id, start_time).await;
        }),
    );

    info!(%session_id, %room_id, %division_id, "judging session started");

    let started = require_session(state, division_id, session_id).await?;
    let division = state
        .store()
        .get_division_state(DivisionStateFilter::for_division(division_id))
        .await?
        .ok_or_else(|| {
            ServiceError::NotFound(format!("could not find state for division {division_id}"))
        })?;
    sse_events::broadcast_session_started(state, started, division);
    Ok(())
}

/// Timer callback completing a session, conditional on the identity captured
/// when the timer was scheduled.
pub async fn complete_session_due(
    state: SharedState,
    session_id: Uuid,
    start_time: OffsetDateTime,
) {
    let result = async {
        let outcome = state
            .store()
            .update_sessions_where(
                SessionFilter {
                    id: Some(session_id),
                    status: Some(Status::InProgress),
                    start_time: Some(Some(start_time)),
                    ..SessionFilter::default()
                },
                SessionPatch {
                    status: Some(Status::Completed),
                    ..SessionPatch::default()
                },
            )
            .await?;
        if !outcome.any() {
            debug!(%session_id, "stale session timer; nothing to do");
            return Ok(());
        }

        info!(%session_id, "judging session completed");

        let completed = state
            .store()
            .get_session(SessionFilter::by_id(session_id))
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("session {session_id} disappeared after update"))
            })?;
        sse_events::broadcast_session_completed(&state, completed);
        Ok::<(), ServiceError>(())
    }
    .await;

    if let Err(err) = result {
        warn!(%session_id, error = %err, "session completion timer failed");
    }
}

/// Abort a running session, resetting it to not-started.
pub async fn abort_session(
    state: &SharedState,
    division_id: Uuid,
    session_id: Uuid,
) -> Result<(), ServiceError> {
    let _ = require_session(state, division_id, session_id).await?;

    let outcome = state
        .store()
        .update_sessions_where(
            SessionFilter {
                id: Some(session_id),
                status: Some(Status::InProgress),
                ..SessionFilter::default()
            },
            SessionPatch {
                status: Some(Status::NotStarted),
                start_time: Some(None),
                ..SessionPatch::default()
            },
        )
        .await?;
    if !outcome.any() {
        return Err(ServiceError::PreconditionFailed(format!(
            "session {session_id} is not in progress"
        )));
    }

    info!(%session_id, %division_id, "judging session aborted");

    let aborted = require_session(state, division_id, session_id).await?;
    sse_events::broadcast_session_aborted(state, aborted);
    Ok(())
}

/// Reassign the team of a not-started session.
pub async fn update_session_team(
    state: &SharedState,
    division_id: Uuid,
    session_id: Uuid,
    request: UpdateSessionTeamRequest,
) -> Result<(), ServiceError> {
    let _ = require_session(state, division_id, session_id).await?;

    let outcome = state
        .store()
        .update_sessions_where(
            SessionFilter {
                id: Some(session_id),
                status: Some(Status::NotStarted),
                ..SessionFilter::default()
            },
            SessionPatch {
                team_id: Some(request.team_id),
                ..SessionPatch::default()
            },
        )
        .await?;
    if !outcome.any() {
        return Err(ServiceError::PreconditionFailed(format!(
            "session {session_id} is not editable"
        )));
    }

    info!(%session_id, %division_id, "session team updated");

    let updated = require_session(state, division_id, session_id).await?;
    sse_events::broadcast_session_updated(state, updated);
    Ok(())
}

/// Patch a not-started session's queueing fields.
pub async fn update_session(
    state: &SharedState,
    division_id: Uuid,
    session_id: Uuid,
    request: UpdateSessionRequest,
) -> Result<(), ServiceError> {
    let _ = require_session(state, division_id, session_id).await?;

    let outcome = state
        .store()
        .update_sessions_where(
            SessionFilter {
                id: Some(session_id),
                status: Some(Status::NotStarted),
                ..SessionFilter::default()
            },
            SessionPatch {
                called: request.called,
                queued: request.queued,
                ..SessionPatch::default()
            },
        )
        .await?;
    if !outcome.any() {
        return Err(ServiceError::PreconditionFailed(format!(
            "session {session_id} is not editable"
        )));
    }

    info!(%session_id, %division_id, "session updated");

    let updated = require_session(state, division_id, session_id).await?;
    sse_events::broadcast_session_updated(state, updated);
    Ok(())
}

/// Create a new Core Values form.
pub async fn create_cv_form(
    state: &SharedState,
    division_id: Uuid,
    request: CvFormRequest,
) -> Result<CvForm, ServiceError> {
    let form = CvForm {
        id: Uuid::new_v4(),
        division_id,
        observers: request.observers,
        demonstrates_severity: request.demonstrates_severity,
        details: request.details,
        completed_by: request.completed_by,
        action_taken: request.action_taken,
    };

    state.store().insert_cv_forms(vec![form.clone()]).await?;

    info!(form_id = %form.id, %division_id, "cv form created");

    sse_events::broadcast_cv_form_created(state, form.clone());
    Ok(form)
}

/// Replace the content of an existing Core Values form.
pub async fn update_cv_form(
    state: &SharedState,
    division_id: Uuid,
    form_id: Uuid,
    request: CvFormRequest,
) -> Result<(), ServiceError> {
    let existing = state
        .store()
        .get_cv_form(CvFormFilter {
            id: Some(form_id),
            division_id: Some(division_id),
        })
        .await?;
    if existing.is_none() {
        return Err(ServiceError::NotFound(format!(
            "could not find cv form {form_id} in division {division_id}"
        )));
    }

    state
        .store()
        .update_cv_forms_where(
            CvFormFilter {
                id: Some(form_id),
                ..CvFormFilter::default()
            },
            CvFormPatch {
                observers: Some(request.observers),
                demonstrates_severity: Some(request.demonstrates_severity),
                details: Some(request.details),
                completed_by: Some(request.completed_by),
                action_taken: Some(request.action_taken),
            },
        )
        .await?;

    info!(%form_id, %division_id, "cv form updated");

    let updated = state
        .store()
        .get_cv_form(CvFormFilter {
            id: Some(form_id),
            ..CvFormFilter::default()
        })
        .await?
        .ok_or_else(|| {
            ServiceError::NotFound(format!("cv form {form_id} disappeared after update"))
        })?;
    sse_events::broadcast_cv_form_updated(state, updated);
    Ok(())
}

/// Stateless notification that a room needs the lead judge.
pub async fn call_lead_judge(
    state: &SharedState,
    division_id: Uuid,
    room_id: Uuid,
) -> Result<(), ServiceError> {
    let room = state
        .store()
        .get_room(RoomFilter {
            id: Some(room_id),
            division_id: Some(division_id),
        })
        .await?
        .ok_or_else(|| {
            ServiceError::NotFound(format!(
                "could not find room {room_id} in division {division_id}"
            ))
        })?;

    info!(%room_id, %division_id, "lead judge called");

    sse_events::broadcast_lead_judge_called(state, room);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use time::macros::datetime;

    use crate::config::AppConfig;
    use crate::dao::entity_store::EntityStore;
    use crate::dao::entity_store::memory::MemoryStore;
    use crate::dao::models::{DivisionState, MatchStage, Room};
    use crate::services::scheduler::TokioScheduler;
    use crate::state::AppState;

    struct Fixture {
        state: SharedState,
        store: Arc<MemoryStore>,
        division_id: Uuid,
        room_id: Uuid,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let state = AppState::new(
            AppConfig::default(),
            store.clone(),
            Arc::new(TokioScheduler),
        );
        let division_id = Uuid::new_v4();
        let room_id = Uuid::new_v4();
        store.put_division_state(DivisionState {
            id: Uuid::new_v4(),
            division_id,
            loaded_match: None,
            active_match: None,
            current_stage: MatchStage::Practice,
            current_round: 1,
            current_session: None,
        });
        store.put_room(Room {
            id: room_id,
            division_id,
            name: "Room 1".into(),
        });
        Fixture {
            state,
            store,
            division_id,
            room_id,
        }
    }

    fn seed_session(fixture: &Fixture, room_id: Uuid, number: u32) -> Uuid {
        let id = Uuid::new_v4();
        fixture.store.put_session(JudgingSession {
            id,
            division_id: fixture.division_id,
            room_id,
            number,
            scheduled_time: datetime!(2026-03-14 11:00 UTC),
            status: Status::NotStarted,
            start_time: None,
            team_id: Some(Uuid::new_v4()),
            called: false,
            queued: false,
        });
        id
    }

    async fn stored_session(fixture: &Fixture, session_id: Uuid) -> JudgingSession {
        fixture
            .store
            .get_session(SessionFilter::by_id(session_id))
            .await
            .unwrap()
            .unwrap()
    }

    #[tokio::test]
    async fn start_transitions_session_and_tracks_current_number() {
        let fx = fixture();
        let session_id = seed_session(&fx, fx.room_id, 3);

        start_session(&fx.state, fx.division_id, fx.room_id, session_id)
            .await
            .unwrap();

        let session = stored_session(&fx, session_id).await;
        assert_eq!(session.status, Status::InProgress);
        assert!(session.start_time.is_some());

        let division = fx
            .store
            .get_division_state(DivisionStateFilter::for_division(fx.division_id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(division.current_session, Some(3));
    }

    #[tokio::test]
    async fn second_session_in_the_same_room_is_rejected() {
        let fx = fixture();
        let first = seed_session(&fx, fx.room_id, 1);
        let second = seed_session(&fx, fx.room_id, 2);

        start_session(&fx.state, fx.division_id, fx.room_id, first)
            .await
            .unwrap();
        let err = start_session(&fx.state, fx.division_id, fx.room_id, second)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::PreconditionFailed(_)));

        assert_eq!(stored_session(&fx, second).await.status, Status::NotStarted);
    }

    #[tokio::test]
    async fn other_rooms_are_unaffected_by_a_running_session() {
        let fx = fixture();
        let other_room = Uuid::new_v4();
        let first = seed_session(&fx, fx.room_id, 1);
        let elsewhere = seed_session(&fx, other_room, 1);

        start_session(&fx.state, fx.division_id, fx.room_id, first)
            .await
            .unwrap();
        start_session(&fx.state, fx.division_id, other_room, elsewhere)
            .await
            .unwrap();

        assert_eq!(
            stored_session(&fx, elsewhere).await.status,
            Status::InProgress
        );
    }

    #[tokio::test]
    async fn abort_resets_session_and_frees_the_room() {
        let fx = fixture();
        let first = seed_session(&fx, fx.room_id, 1);
        let second = seed_session(&fx, fx.room_id, 2);

        start_session(&fx.state, fx.division_id, fx.room_id, first)
            .await
            .unwrap();
        abort_session(&fx.state, fx.division_id, first).await.unwrap();

        let session = stored_session(&fx, first).await;
        assert_eq!(session.status, Status::NotStarted);
        assert_eq!(session.start_time, None);

        start_session(&fx.state, fx.division_id, fx.room_id, second)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn stale_session_timer_after_abort_is_a_no_op() {
        let fx = fixture();
        let session_id = seed_session(&fx, fx.room_id, 1);

        start_session(&fx.state, fx.division_id, fx.room_id, session_id)
            .await
            .unwrap();
        let captured_start = stored_session(&fx, session_id).await.start_time.unwrap();
        abort_session(&fx.state, fx.division_id, session_id)
            .await
            .unwrap();

        complete_session_due(fx.state.clone(), session_id, captured_start).await;

        assert_eq!(
            stored_session(&fx, session_id).await.status,
            Status::NotStarted
        );
    }

    #[tokio::test]
    async fn session_timer_with_matching_identity_completes() {
        let fx = fixture();
        let session_id = seed_session(&fx, fx.room_id, 1);

        start_session(&fx.state, fx.division_id, fx.room_id, session_id)
            .await
            .unwrap();
        let captured_start = stored_session(&fx, session_id).await.start_time.unwrap();

        let mut judging = fx.state.judging().subscribe();
        complete_session_due(fx.state.clone(), session_id, captured_start).await;

        assert_eq!(
            stored_session(&fx, session_id).await.status,
            Status::Completed
        );
        assert_eq!(
            judging.recv().await.unwrap().event.as_deref(),
            Some("judgingSessionCompleted")
        );
    }

    #[tokio::test]
    async fn team_reassignment_is_rejected_once_started() {
        let fx = fixture();
        let session_id = seed_session(&fx, fx.room_id, 1);

        start_session(&fx.state, fx.division_id, fx.room_id, session_id)
            .await
            .unwrap();

        let err = update_session_team(
            &fx.state,
            fx.division_id,
            session_id,
            UpdateSessionTeamRequest {
                team_id: Some(Uuid::new_v4()),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::PreconditionFailed(_)));
    }

    #[tokio::test]
    async fn cv_form_create_then_update_round_trips() {
        let fx = fixture();

        let form = create_cv_form(
            &fx.state,
            fx.division_id,
            CvFormRequest {
                observers: vec!["judge".into()],
                demonstrates_severity: "standsOut".into(),
                details: "exceptional gracious professionalism".into(),
                completed_by: "Room 1 judge".into(),
                action_taken: None,
            },
        )
        .await
        .unwrap();

        update_cv_form(
            &fx.state,
            fx.division_id,
            form.id,
            CvFormRequest {
                observers: vec!["judge".into(), "advisor".into()],
                demonstrates_severity: "standsOut".into(),
                details: "exceptional gracious professionalism".into(),
                completed_by: "Room 1 judge".into(),
                action_taken: Some("shared with award deliberation".into()),
            },
        )
        .await
        .unwrap();

        let stored = fx
            .store
            .get_cv_form(CvFormFilter {
                id: Some(form.id),
                ..CvFormFilter::default()
            })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.observers.len(), 2);
        assert!(stored.action_taken.is_some());
    }

    #[tokio::test]
    async fn lead_judge_call_requires_a_known_room() {
        let fx = fixture();

        let err = call_lead_judge(&fx.state, fx.division_id, Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));

        call_lead_judge(&fx.state, fx.division_id, fx.room_id)
            .await
            .unwrap();
    }
}
