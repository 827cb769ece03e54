//! Broadcast helpers emitting the orchestration events onto the room hubs.
//!
//! Broadcasts are only ever sent after the corresponding write has committed,
//! so subscribers always observe payloads reflecting persisted state.

use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::{
    dao::models::{
        Award, CvForm, DivisionState, GameMatch, JudgingDeliberation, JudgingSession, Room,
        Scoresheet,
    },
    dto::sse::{
        AwardsUpdatedEvent, CvFormEvent, DeliberationEvent, LeadJudgeCalledEvent, MatchEvent,
        MatchStateEvent, ScoresheetEvent, ServerEvent, SessionEvent, SessionStateEvent,
        TeamArrivalEvent,
    },
    state::{AppState, SseHub},
};

const EVENT_MATCH_LOADED: &str = "matchLoaded";
const EVENT_MATCH_STARTED: &str = "matchStarted";
const EVENT_MATCH_ENDGAME: &str = "matchEndgame";
const EVENT_MATCH_COMPLETED: &str = "matchCompleted";
const EVENT_MATCH_ABORTED: &str = "matchAborted";
const EVENT_MATCH_UPDATED: &str = "matchUpdated";
const EVENT_SCORESHEET_UPDATED: &str = "scoresheetUpdated";
const EVENT_SCORESHEET_ESCALATED: &str = "scoresheetEscalated";
const EVENT_SESSION_STARTED: &str = "judgingSessionStarted";
const EVENT_SESSION_ABORTED: &str = "judgingSessionAborted";
const EVENT_SESSION_COMPLETED: &str = "judgingSessionCompleted";
const EVENT_SESSION_UPDATED: &str = "judgingSessionUpdated";
const EVENT_DELIBERATION_STARTED: &str = "judgingDeliberationStarted";
const EVENT_DELIBERATION_UPDATED: &str = "judgingDeliberationUpdated";
const EVENT_DELIBERATION_STATUS_CHANGED: &str = "judgingDeliberationStatusChanged";
const EVENT_CV_FORM_CREATED: &str = "cvFormCreated";
const EVENT_CV_FORM_UPDATED: &str = "cvFormUpdated";
const EVENT_LEAD_JUDGE_CALLED: &str = "leadJudgeCalled";
const EVENT_AWARDS_UPDATED: &str = "awardsUpdated";
const EVENT_TEAM_ARRIVAL_UPDATED: &str = "teamArrivalUpdated";

fn send_room_event<T: Serialize>(hub: &SseHub, name: &str, payload: &T) {
    match ServerEvent::json(name.to_string(), payload) {
        Ok(event) => hub.broadcast(event),
        Err(err) => warn!(event = name, error = %err, "failed to serialise broadcast payload"),
    }
}

/// Broadcast that a match was loaded onto the field displays.
pub fn broadcast_match_loaded(state: &AppState, game_match: GameMatch, division: DivisionState) {
    let payload = MatchStateEvent {
        game_match,
        division_state: division,
    };
    send_room_event(state.field(), EVENT_MATCH_LOADED, &payload);
}

/// Broadcast that a match started.
pub fn broadcast_match_started(state: &AppState, game_match: GameMatch, division: DivisionState) {
    let payload = MatchStateEvent {
        game_match,
        division_state: division,
    };
    send_room_event(state.field(), EVENT_MATCH_STARTED, &payload);
}

/// Broadcast the endgame warning for a running match.
pub fn broadcast_match_endgame(state: &AppState, game_match: GameMatch) {
    let payload = MatchEvent { game_match };
    send_room_event(state.field(), EVENT_MATCH_ENDGAME, &payload);
}

/// Broadcast that a match ran to completion.
pub fn broadcast_match_completed(state: &AppState, game_match: GameMatch, division: DivisionState) {
    let payload = MatchStateEvent {
        game_match,
        division_state: division,
    };
    send_room_event(state.field(), EVENT_MATCH_COMPLETED, &payload);
}

/// Broadcast that a running match was aborted.
pub fn broadcast_match_aborted(state: &AppState, game_match: GameMatch, division: DivisionState) {
    let payload = MatchStateEvent {
        game_match,
        division_state: division,
    };
    send_room_event(state.field(), EVENT_MATCH_ABORTED, &payload);
}

/// Broadcast a match record edit (teams, brief, prestart flags).
pub fn broadcast_match_updated(state: &AppState, game_match: GameMatch) {
    let payload = MatchEvent { game_match };
    send_room_event(state.field(), EVENT_MATCH_UPDATED, &payload);
}

/// Broadcast a scoresheet edit.
pub fn broadcast_scoresheet_updated(state: &AppState, scoresheet: Scoresheet) {
    let payload = ScoresheetEvent { scoresheet };
    send_room_event(state.field(), EVENT_SCORESHEET_UPDATED, &payload);
}

/// Broadcast a scoresheet escalation to the head referee.
pub fn broadcast_scoresheet_escalated(state: &AppState, scoresheet: Scoresheet) {
    let payload = ScoresheetEvent { scoresheet };
    send_room_event(state.field(), EVENT_SCORESHEET_ESCALATED, &payload);
}

/// Broadcast that a judging session started.
pub fn broadcast_session_started(
    state: &AppState,
    session: JudgingSession,
    division: DivisionState,
) {
    let payload = SessionStateEvent {
        session,
        division_state: division,
    };
    send_room_event(state.judging(), EVENT_SESSION_STARTED, &payload);
}

/// Broadcast that a running judging session was aborted.
pub fn broadcast_session_aborted(state: &AppState, session: JudgingSession) {
    let payload = SessionEvent { session };
    send_room_event(state.judging(), EVENT_SESSION_ABORTED, &payload);
}

/// Broadcast that a judging session ran to completion.
pub fn broadcast_session_completed(state: &AppState, session: JudgingSession) {
    let payload = SessionEvent { session };
    send_room_event(state.judging(), EVENT_SESSION_COMPLETED, &payload);
}

/// Broadcast a session record edit.
pub fn broadcast_session_updated(state: &AppState, session: JudgingSession) {
    let payload = SessionEvent { session };
    send_room_event(state.judging(), EVENT_SESSION_UPDATED, &payload);
}

/// Broadcast that a deliberation started.
pub fn broadcast_deliberation_started(state: &AppState, deliberation: JudgingDeliberation) {
    let payload = DeliberationEvent { deliberation };
    send_room_event(state.judging(), EVENT_DELIBERATION_STARTED, &payload);
}

/// Broadcast a deliberation edit.
pub fn broadcast_deliberation_updated(state: &AppState, deliberation: JudgingDeliberation) {
    let payload = DeliberationEvent { deliberation };
    send_room_event(state.judging(), EVENT_DELIBERATION_UPDATED, &payload);
}

/// Broadcast that a deliberation's status moved forward.
pub fn broadcast_deliberation_status_changed(state: &AppState, deliberation: JudgingDeliberation) {
    let payload = DeliberationEvent { deliberation };
    send_room_event(state.judging(), EVENT_DELIBERATION_STATUS_CHANGED, &payload);
}

/// Broadcast a newly created Core Values form.
pub fn broadcast_cv_form_created(state: &AppState, form: CvForm) {
    let payload = CvFormEvent { form };
    send_room_event(state.judging(), EVENT_CV_FORM_CREATED, &payload);
}

/// Broadcast an updated Core Values form.
pub fn broadcast_cv_form_updated(state: &AppState, form: CvForm) {
    let payload = CvFormEvent { form };
    send_room_event(state.judging(), EVENT_CV_FORM_UPDATED, &payload);
}

/// Broadcast that the lead judge was called to a room.
pub fn broadcast_lead_judge_called(state: &AppState, room: Room) {
    let payload = LeadJudgeCalledEvent { room };
    send_room_event(state.judging(), EVENT_LEAD_JUDGE_CALLED, &payload);
}

/// Broadcast the full refreshed award list of a division.
pub fn broadcast_awards_updated(state: &AppState, awards: Vec<Award>) {
    let payload = AwardsUpdatedEvent { awards };
    send_room_event(state.judging(), EVENT_AWARDS_UPDATED, &payload);
}

/// Channel name carrying one division's team-arrival updates.
pub fn team_arrival_channel(division_id: Uuid) -> String {
    format!("division:{division_id}:{EVENT_TEAM_ARRIVAL_UPDATED}")
}

/// Publish a team-arrival update on the division's fine-grained channel.
pub fn publish_team_arrival(state: &AppState, event: &TeamArrivalEvent) {
    match ServerEvent::json(EVENT_TEAM_ARRIVAL_UPDATED.to_string(), event) {
        Ok(payload) => state
            .channels()
            .publish(&team_arrival_channel(event.division_id), payload),
        Err(err) => warn!(error = %err, "failed to serialise team arrival payload"),
    }
}
