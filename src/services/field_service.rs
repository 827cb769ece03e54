//! Match orchestrator: the robot-game lifecycle, table-participant edits,
//! merges/swaps, and the scoresheet flow.
//!
//! Lifecycle is `not-started → in-progress → completed`, with
//! `in-progress → not-started` via abort and `not-started → completed` via
//! merge. There is no lock around any of it: the one-active-match-per-division
//! invariant is enforced by claiming `DivisionState.active_match` with a
//! conditional write, and every timer-driven transition re-checks the full
//! identity (`id` + `status` + `start_time`) it captured at schedule time, so
//! an abort racing a completion timer converges on whichever write lands
//! first.

use std::collections::VecDeque;

use time::OffsetDateTime;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    dao::filters::{
        DivisionStateFilter, DivisionStatePatch, MatchFilter, MatchPatch, ScoresheetFilter,
        ScoresheetPatch, TeamFilter,
    },
    dao::models::{DivisionState, GameMatch, MatchStage, Scoresheet, Status},
    dto::field::{
        MergeMatchesRequest, SwitchMatchTeamsRequest, UpdateMatchBriefRequest,
        UpdateMatchParticipantRequest, UpdateMatchTeamsRequest, UpdateScoresheetRequest,
    },
    error::ServiceError,
    services::sse_events,
    state::SharedState,
};

async fn require_match(
    state: &SharedState,
    division_id: Uuid,
    match_id: Uuid,
) -> Result<GameMatch, ServiceError> {
    state
        .store()
        .get_match(MatchFilter {
            id: Some(match_id),
            division_id: Some(division_id),
            ..MatchFilter::default()
        })
        .await?
        .ok_or_else(|| {
            ServiceError::NotFound(format!(
                "could not find match {match_id} in division {division_id}"
            ))
        })
}

async fn require_division_state(
    state: &SharedState,
    division_id: Uuid,
) -> Result<DivisionState, ServiceError> {
    state
        .store()
        .get_division_state(DivisionStateFilter::for_division(division_id))
        .await?
        .ok_or_else(|| {
            ServiceError::NotFound(format!("could not find state for division {division_id}"))
        })
}

/// Hand back the division's active slot if this match still holds it.
///
/// Called on the failure paths of [`start_match`] after the claim succeeded.
/// A failed release is logged rather than propagated so it cannot mask the
/// error that triggered it; the slot then needs an abort to clear.
async fn release_active_claim(state: &SharedState, division_id: Uuid, match_id: Uuid) {
    let released = state
        .store()
        .update_division_states_where(
            DivisionStateFilter {
                division_id: Some(division_id),
                active_match: Some(Some(match_id)),
            },
            DivisionStatePatch {
                active_match: Some(None),
                ..DivisionStatePatch::default()
            },
        )
        .await;
    if let Err(err) = released {
        warn!(%match_id, %division_id, error = %err, "failed to release active match claim");
    }
}

fn require_editable(record: &GameMatch) -> Result<(), ServiceError> {
    if record.status != Status::NotStarted {
        return Err(ServiceError::PreconditionFailed(format!(
            "match {} is not editable",
            record.id
        )));
    }
    Ok(())
}

/// List a division's matches in schedule order.
pub async fn list_matches(
    state: &SharedState,
    division_id: Uuid,
) -> Result<Vec<GameMatch>, ServiceError> {
    let records = state
        .store()
        .list_matches(MatchFilter {
            division_id: Some(division_id),
            ..MatchFilter::default()
        })
        .await?;
    Ok(records)
}

/// Load a match onto the field displays. No status change.
pub async fn load_match(
    state: &SharedState,
    division_id: Uuid,
    match_id: Uuid,
) -> Result<(), ServiceError> {
    let _ = require_match(state, division_id, match_id).await?;

    state
        .store()
        .update_division_states_where(
            DivisionStateFilter::for_division(division_id),
            DivisionStatePatch {
                loaded_match: Some(Some(match_id)),
                ..DivisionStatePatch::default()
            },
        )
        .await?;

    info!(%match_id, %division_id, "match loaded");

    let loaded = require_match(state, division_id, match_id).await?;
    let division = require_division_state(state, division_id).await?;
    sse_events::broadcast_match_loaded(state, loaded, division);
    Ok(())
}

/// Start a match, claiming the division's single active slot.
///
/// The claim is a conditional write on `DivisionState.active_match`, so two
/// racing starts cannot both pass: the second one's filter no longer matches.
pub async fn start_match(
    state: &SharedState,
    division_id: Uuid,
    match_id: Uuid,
) -> Result<(), ServiceError> {
    let record = require_match(state, division_id, match_id).await?;
    if record.status != Status::NotStarted {
        return Err(ServiceError::PreconditionFailed(format!(
            "match {match_id} has already started"
        )));
    }

    let claim = state
        .store()
        .update_division_states_where(
            DivisionStateFilter {
                division_id: Some(division_id),
                active_match: Some(None),
            },
            DivisionStatePatch {
                active_match: Some(Some(match_id)),
                ..DivisionStatePatch::default()
            },
        )
        .await?;
    if !claim.any() {
        return Err(ServiceError::PreconditionFailed(format!(
            "division {division_id} already has a running match"
        )));
    }

    let start_time = OffsetDateTime::now_utc();
    let transitioned = state
        .store()
        .update_matches_where(
            MatchFilter {
                id: Some(match_id),
                status: Some(Status::NotStarted),
                ..MatchFilter::default()
            },
            MatchPatch {
                status: Some(Status::InProgress),
                start_time: Some(Some(start_time)),
                ..MatchPatch::default()
            },
        )
        .await;
    let transitioned = match transitioned {
        Ok(outcome) => outcome,
        Err(err) => {
            release_active_claim(state, division_id, match_id).await;
            return Err(err.into());
        }
    };
    if !transitioned.any() {
        // Someone else moved the match between our read and write; release
        // the claim and report the conflict.
        release_active_claim(state, division_id, match_id).await;
        return Err(ServiceError::PreconditionFailed(format!(
            "match {match_id} has already started"
        )));
    }

    let division = require_division_state(state, division_id).await?;
    let stage_switch =
        record.stage == MatchStage::Ranking && division.current_stage == MatchStage::Practice;
    let mut patch = DivisionStatePatch::default();
    if record.stage != MatchStage::Test {
        patch.loaded_match = Some(None);
    }
    if stage_switch {
        patch.current_stage = Some(MatchStage::Ranking);
    }
    if stage_switch || record.round > division.current_round {
        patch.current_round = Some(division.current_round.max(record.round));
    }
    state
        .store()
        .update_division_states_where(DivisionStateFilter::for_division(division_id), patch)
        .await?;

    schedule_match_timers(state, division_id, match_id, start_time);

    info!(%match_id, %division_id, stage = ?record.stage, "match started");

    let started = require_match(state, division_id, match_id).await?;
    let division = require_division_state(state, division_id).await?;
    sse_events::broadcast_match_started(state, started, division);
    Ok(())
}

/// Look up the division's single test match and start it.
pub async fn start_test_match(state: &SharedState, division_id: Uuid) -> Result<(), ServiceError> {
    let test_match = state
        .store()
        .get_match(MatchFilter {
            division_id: Some(division_id),
            stage: Some(MatchStage::Test),
            ..MatchFilter::default()
        })
        .await?
        .ok_or_else(|| {
            ServiceError::NotFound(format!(
                "could not find a test match in division {division_id}"
            ))
        })?;

    start_match(state, division_id, test_match.id).await
}

fn schedule_match_timers(
    state: &SharedState,
    division_id: Uuid,
    match_id: Uuid,
    start_time: OffsetDateTime,
) {
    let config = state.config();
    let endgame_at = start_time + config.match_length.saturating_sub(config.endgame_offset);
    let completion_at = start_time + config.match_length;

    let endgame_state = state.clone();
    state.scheduler().schedule_at(
        endgame_at,
        Box::pin(async move {
            endgame_due(endgame_state, match_id, start_time).await;
        }),
    );

    let completion_state = state.clone();
    state.scheduler().schedule_at(
        completion_at,
        Box::pin(async move {
            complete_match_due(completion_state, division_id, match_id, start_time).await;
        }),
    );
}

/// Timer callback broadcasting the endgame warning, if the match it was
/// scheduled for is still the one running.
pub async fn endgame_due(state: SharedState, match_id: Uuid, start_time: OffsetDateTime) {
    let lookup = state
        .store()
        .get_match(MatchFilter {
            id: Some(match_id),
            status: Some(Status::InProgress),
            start_time: Some(Some(start_time)),
            ..MatchFilter::default()
        })
        .await;

    match lookup {
        Ok(Some(record)) => {
            debug!(%match_id, "endgame warning");
            sse_events::broadcast_match_endgame(&state, record);
        }
        Ok(None) => debug!(%match_id, "stale endgame timer; nothing to do"),
        Err(err) => warn!(%match_id, error = %err, "endgame timer failed to read match"),
    }
}

/// Timer callback completing a match, conditional on the exact identity
/// captured when the timer was scheduled.
///
/// A match aborted (and possibly restarted) in the meantime no longer matches
/// the filter, so the stale timer drops out silently.
pub async fn complete_match_due(
    state: SharedState,
    division_id: Uuid,
    match_id: Uuid,
    start_time: OffsetDateTime,
) {
    let result = async {
        let outcome = state
            .store()
            .update_matches_where(
                MatchFilter {
                    id: Some(match_id),
                    status: Some(Status::InProgress),
                    start_time: Some(Some(start_time)),
                    ..MatchFilter::default()
                },
                MatchPatch {
                    status: Some(Status::Completed),
                    ..MatchPatch::default()
                },
            )
            .await?;
        if !outcome.any() {
            debug!(%match_id, "stale completion timer; nothing to do");
            return Ok(());
        }

        state
            .store()
            .update_division_states_where(
                DivisionStateFilter {
                    division_id: Some(division_id),
                    active_match: Some(Some(match_id)),
                },
                DivisionStatePatch {
                    active_match: Some(None),
                    ..DivisionStatePatch::default()
                },
            )
            .await?;

        info!(%match_id, %division_id, "match completed");

        let completed = require_match(&state, division_id, match_id).await?;
        let division = require_division_state(&state, division_id).await?;
        sse_events::broadcast_match_completed(&state, completed, division);
        Ok::<(), ServiceError>(())
    }
    .await;

    if let Err(err) = result {
        warn!(%match_id, error = %err, "completion timer failed");
    }
}

/// Abort the division's running match, resetting it to not-started.
pub async fn abort_match(
    state: &SharedState,
    division_id: Uuid,
    match_id: Uuid,
) -> Result<(), ServiceError> {
    let division = require_division_state(state, division_id).await?;
    if division.active_match != Some(match_id) {
        return Err(ServiceError::PreconditionFailed(format!(
            "match {match_id} is not the division's active match"
        )));
    }
    let record = require_match(state, division_id, match_id).await?;

    let outcome = state
        .store()
        .update_matches_where(
            MatchFilter {
                id: Some(match_id),
                status: Some(Status::InProgress),
                ..MatchFilter::default()
            },
            MatchPatch {
                status: Some(Status::NotStarted),
                start_time: Some(None),
                participants_ready: Some(false),
                ..MatchPatch::default()
            },
        )
        .await?;
    if !outcome.any() {
        // The completion timer landed first.
        return Err(ServiceError::PreconditionFailed(format!(
            "match {match_id} is no longer in progress"
        )));
    }

    let mut patch = DivisionStatePatch {
        active_match: Some(None),
        ..DivisionStatePatch::default()
    };
    if record.stage != MatchStage::Test {
        patch.loaded_match = Some(Some(match_id));
    }
    state
        .store()
        .update_division_states_where(
            DivisionStateFilter {
                division_id: Some(division_id),
                active_match: Some(Some(match_id)),
            },
            patch,
        )
        .await?;

    info!(%match_id, %division_id, "match aborted");

    let aborted = require_match(state, division_id, match_id).await?;
    let division = require_division_state(state, division_id).await?;
    sse_events::broadcast_match_aborted(state, aborted.clone(), division.clone());
    if record.stage != MatchStage::Test {
        sse_events::broadcast_match_loaded(state, aborted, division);
    }
    Ok(())
}

/// Overwrite team assignments per table for a not-started match.
pub async fn update_match_teams(
    state: &SharedState,
    division_id: Uuid,
    match_id: Uuid,
    request: UpdateMatchTeamsRequest,
) -> Result<(), ServiceError> {
    let record = require_match(state, division_id, match_id).await?;
    require_editable(&record)?;

    let mut participants = record.participants.clone();
    for assignment in &request.teams {
        let slot = participants
            .iter_mut()
            .find(|participant| participant.table_id == assignment.table_id)
            .ok_or_else(|| {
                ServiceError::InvalidInput(format!(
                    "match {match_id} has no slot for table {}",
                    assignment.table_id
                ))
            })?;
        slot.team_id = assignment.team_id;
    }

    let outcome = state
        .store()
        .update_matches_where(
            MatchFilter {
                id: Some(match_id),
                status: Some(Status::NotStarted),
                ..MatchFilter::default()
            },
            MatchPatch {
                participants: Some(participants),
                ..MatchPatch::default()
            },
        )
        .await?;
    if !outcome.any() {
        return Err(ServiceError::PreconditionFailed(format!(
            "match {match_id} is not editable"
        )));
    }

    info!(%match_id, %division_id, "match teams updated");

    let updated = require_match(state, division_id, match_id).await?;
    sse_events::broadcast_match_updated(state, updated);
    Ok(())
}

/// Swap the team at one positional slot between two not-started matches.
pub async fn switch_match_teams(
    state: &SharedState,
    division_id: Uuid,
    request: SwitchMatchTeamsRequest,
) -> Result<(), ServiceError> {
    let from = require_match(state, division_id, request.from_match_id).await?;
    let to = require_match(state, division_id, request.to_match_id).await?;
    require_editable(&from)?;
    require_editable(&to)?;

    let index = request.participant_index;
    if index >= from.participants.len() || index >= to.participants.len() {
        return Err(ServiceError::InvalidInput(format!(
            "participant index {index} is out of range"
        )));
    }

    let mut from_participants = from.participants.clone();
    let mut to_participants = to.participants.clone();
    std::mem::swap(
        &mut from_participants[index].team_id,
        &mut to_participants[index].team_id,
    );

    for (match_id, participants) in [
        (from.id, from_participants),
        (to.id, to_participants),
    ] {
        let outcome = state
            .store()
            .update_matches_where(
                MatchFilter {
                    id: Some(match_id),
                    status: Some(Status::NotStarted),
                    ..MatchFilter::default()
                },
                MatchPatch {
                    participants: Some(participants),
                    ..MatchPatch::default()
                },
            )
            .await?;
        if !outcome.any() {
            return Err(ServiceError::PreconditionFailed(format!(
                "match {match_id} is not editable"
            )));
        }
    }

    info!(
        from = %from.id,
        to = %to.id,
        index,
        %division_id,
        "switched match teams"
    );

    for match_id in [from.id, to.id] {
        let updated = require_match(state, division_id, match_id).await?;
        sse_events::broadcast_match_updated(state, updated);
    }
    Ok(())
}

async fn is_registered(state: &SharedState, team_id: Uuid) -> Result<bool, ServiceError> {
    let team = state.store().get_team(TeamFilter::by_id(team_id)).await?;
    Ok(team.is_some_and(|team| team.registered))
}

/// Fold one not-started match's teams into another.
///
/// Registered teams of the source fill the destination's empty or
/// unregistered slots in order; the source is emptied and marked completed
/// without ever running.
pub async fn merge_matches(
    state: &SharedState,
    division_id: Uuid,
    request: MergeMatchesRequest,
) -> Result<(), ServiceError> {
    let from = require_match(state, division_id, request.from_match_id).await?;
    let to = require_match(state, division_id, request.to_match_id).await?;
    require_editable(&from)?;
    require_editable(&to)?;

    let mut movable = VecDeque::new();
    for participant in &from.participants {
        let Some(team_id) = participant.team_id else {
            continue;
        };
        if is_registered(state, team_id).await? {
            movable.push_back(team_id);
        }
    }

    let mut from_participants = from.participants.clone();
    for participant in &mut from_participants {
        participant.team_id = None;
    }

    let mut to_participants = to.participants.clone();
    for participant in &mut to_participants {
        let occupied = match participant.team_id {
            Some(team_id) => is_registered(state, team_id).await?,
            None => false,
        };
        if !occupied {
            participant.team_id = movable.pop_front();
        }
    }

    let source = state
        .store()
        .update_matches_where(
            MatchFilter {
                id: Some(from.id),
                status: Some(Status::NotStarted),
                ..MatchFilter::default()
            },
            MatchPatch {
                status: Some(Status::Completed),
                start_time: Some(Some(OffsetDateTime::now_utc())),
                participants: Some(from_participants),
                ..MatchPatch::default()
            },
        )
        .await?;
    if !source.any() {
        return Err(ServiceError::PreconditionFailed(format!(
            "match {} is not editable",
            from.id
        )));
    }

    let destination = state
        .store()
        .update_matches_where(
            MatchFilter {
                id: Some(to.id),
                status: Some(Status::NotStarted),
                ..MatchFilter::default()
            },
            MatchPatch {
                participants: Some(to_participants),
                ..MatchPatch::default()
            },
        )
        .await?;
    if !destination.any() {
        return Err(ServiceError::PreconditionFailed(format!(
            "match {} is not editable",
            to.id
        )));
    }

    info!(from = %from.id, to = %to.id, %division_id, "merged matches");

    for match_id in [from.id, to.id] {
        let updated = require_match(state, division_id, match_id).await?;
        sse_events::broadcast_match_updated(state, updated);
    }
    Ok(())
}

/// Unconditional patch of a match's brief fields.
pub async fn update_match_brief(
    state: &SharedState,
    division_id: Uuid,
    match_id: Uuid,
    request: UpdateMatchBriefRequest,
) -> Result<(), ServiceError> {
    let _ = require_match(state, division_id, match_id).await?;

    state
        .store()
        .update_matches_where(
            MatchFilter::by_id(match_id),
            MatchPatch {
                called: request.called,
                ..MatchPatch::default()
            },
        )
        .await?;

    info!(%match_id, %division_id, "match brief updated");

    let updated = require_match(state, division_id, match_id).await?;
    sse_events::broadcast_match_updated(state, updated);
    Ok(())
}

/// Patch one team's prestart flags in a match.
pub async fn update_match_participant(
    state: &SharedState,
    division_id: Uuid,
    match_id: Uuid,
    request: UpdateMatchParticipantRequest,
) -> Result<(), ServiceError> {
    let record = require_match(state, division_id, match_id).await?;

    let mut participants = record.participants.clone();
    let slot = participants
        .iter_mut()
        .find(|participant| participant.team_id == Some(request.team_id))
        .ok_or_else(|| {
            ServiceError::NotFound(format!(
                "team {} is not playing in match {match_id}",
                request.team_id
            ))
        })?;
    if let Some(present) = request.present {
        slot.present = present;
    }
    if let Some(ready) = request.ready {
        slot.ready = ready;
    }
    if let Some(queued) = request.queued {
        slot.queued = queued;
    }

    state
        .store()
        .update_matches_where(
            MatchFilter::by_id(match_id),
            MatchPatch {
                participants: Some(participants),
                ..MatchPatch::default()
            },
        )
        .await?;

    info!(team_id = %request.team_id, %match_id, %division_id, "participant prestart updated");

    let updated = require_match(state, division_id, match_id).await?;
    sse_events::broadcast_match_updated(state, updated);
    Ok(())
}

/// Patch a scoresheet record, escalating it to the head referee when the
/// escalation flag flips from false to true.
pub async fn update_scoresheet(
    state: &SharedState,
    division_id: Uuid,
    scoresheet_id: Uuid,
    request: UpdateScoresheetRequest,
) -> Result<(), ServiceError> {
    let previous: Scoresheet = state
        .store()
        .get_scoresheet(ScoresheetFilter {
            id: Some(scoresheet_id),
            division_id: Some(division_id),
            team_id: Some(request.team_id),
        })
        .await?
        .ok_or_else(|| {
            ServiceError::NotFound(format!(
                "could not find scoresheet {scoresheet_id} in division {division_id}"
            ))
        })?;

    state
        .store()
        .update_scoresheets_where(
            ScoresheetFilter {
                id: Some(scoresheet_id),
                ..ScoresheetFilter::default()
            },
            ScoresheetPatch {
                status: request.status.clone(),
                escalated: request.escalated,
                data: request.data.clone(),
            },
        )
        .await?;

    info!(%scoresheet_id, %division_id, "scoresheet updated");

    let updated = state
        .store()
        .get_scoresheet(ScoresheetFilter {
            id: Some(scoresheet_id),
            ..ScoresheetFilter::default()
        })
        .await?
        .ok_or_else(|| {
            ServiceError::NotFound(format!("scoresheet {scoresheet_id} disappeared after update"))
        })?;

    sse_events::broadcast_scoresheet_updated(state, updated.clone());
    if request.escalated == Some(true) && !previous.escalated {
        sse_events::broadcast_scoresheet_escalated(state, updated);
    }
    Ok(())
}
