//! Team roster flags maintained live during the event.

use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

use crate::{
    dao::filters::{TeamFilter, TeamPatch},
    dto::sse::TeamArrivalEvent,
    dto::team::UpdateTeamArrivalRequest,
    error::ServiceError,
    services::sse_events,
    state::SharedState,
};

/// Flip a team's arrival flag and publish it on the division's fine-grained
/// arrival channel.
pub async fn update_team_arrival(
    state: &SharedState,
    division_id: Uuid,
    team_id: Uuid,
    request: UpdateTeamArrivalRequest,
) -> Result<(), ServiceError> {
    let outcome = state
        .store()
        .update_teams_where(
            TeamFilter {
                id: Some(team_id),
                division_id: Some(division_id),
                ..TeamFilter::default()
            },
            TeamPatch {
                arrived: Some(request.arrived),
                ..TeamPatch::default()
            },
        )
        .await?;
    if !outcome.any() {
        return Err(ServiceError::NotFound(format!(
            "could not find team {team_id} in division {division_id}"
        )));
    }

    info!(%team_id, %division_id, arrived = request.arrived, "team arrival updated");

    sse_events::publish_team_arrival(
        state,
        &TeamArrivalEvent {
            team_id,
            division_id,
            arrived: request.arrived,
            updated_at: OffsetDateTime::now_utc(),
        },
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::config::AppConfig;
    use crate::dao::entity_store::EntityStore;
    use crate::dao::entity_store::memory::MemoryStore;
    use crate::dao::models::Team;
    use crate::services::scheduler::TokioScheduler;
    use crate::services::sse_events::team_arrival_channel;
    use crate::state::AppState;

    #[tokio::test]
    async fn arrival_update_persists_and_publishes() {
        let store = Arc::new(MemoryStore::new());
        let state = AppState::new(
            AppConfig::default(),
            store.clone(),
            Arc::new(TokioScheduler),
        );
        let division_id = Uuid::new_v4();
        let team_id = Uuid::new_v4();
        store.put_team(Team {
            id: team_id,
            division_id,
            number: 4711,
            name: "Team".into(),
            registered: true,
            arrived: false,
        });

        let mut arrivals = state.channels().subscribe(&team_arrival_channel(division_id));

        update_team_arrival(
            &state,
            division_id,
            team_id,
            UpdateTeamArrivalRequest { arrived: true },
        )
        .await
        .unwrap();

        let stored = store
            .get_team(TeamFilter::by_id(team_id))
            .await
            .unwrap()
            .unwrap();
        assert!(stored.arrived);

        let event = arrivals.recv().await.unwrap();
        assert_eq!(event.event.as_deref(), Some("teamArrivalUpdated"));
        assert!(event.data.contains(&team_id.to_string()));
    }

    #[tokio::test]
    async fn unknown_team_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        let state = AppState::new(
            AppConfig::default(),
            store.clone(),
            Arc::new(TokioScheduler),
        );

        let err = update_team_arrival(
            &state,
            Uuid::new_v4(),
            Uuid::new_v4(),
            UpdateTeamArrivalRequest { arrived: true },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }
}
