mod sse;

use std::sync::Arc;

use crate::config::AppConfig;
use crate::dao::entity_store::EntityStore;
use crate::services::scheduler::Scheduler;

pub use self::sse::{ChannelRegistry, RoomHubs, SseHub};

/// Shared handle to the application state; cloning bumps the inner `Arc`.
pub type SharedState = Arc<AppState>;

/// Channel capacity for the room hubs and fine-grained channels.
const BROADCAST_CAPACITY: usize = 32;

/// Central application state: the entity store, the timer scheduler, and the
/// broadcast surfaces. The orchestrators own no other shared mutable state;
/// everything contended lives behind the store's conditional writes.
pub struct AppState {
    store: Arc<dyn EntityStore>,
    scheduler: Arc<dyn Scheduler>,
    rooms: RoomHubs,
    channels: ChannelRegistry,
    config: AppConfig,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    pub fn new(
        config: AppConfig,
        store: Arc<dyn EntityStore>,
        scheduler: Arc<dyn Scheduler>,
    ) -> SharedState {
        Arc::new(Self {
            store,
            scheduler,
            rooms: RoomHubs::new(BROADCAST_CAPACITY),
            channels: ChannelRegistry::new(BROADCAST_CAPACITY),
            config,
        })
    }

    /// Handle to the entity store.
    pub fn store(&self) -> &Arc<dyn EntityStore> {
        &self.store
    }

    /// Handle to the timer scheduler.
    pub fn scheduler(&self) -> &Arc<dyn Scheduler> {
        &self.scheduler
    }

    /// Broadcast hub for the `field` room.
    pub fn field(&self) -> &SseHub {
        self.rooms.field()
    }

    /// Broadcast hub for the `judging` room.
    pub fn judging(&self) -> &SseHub {
        self.rooms.judging()
    }

    /// Registry of fine-grained per-entity channels.
    pub fn channels(&self) -> &ChannelRegistry {
        &self.channels
    }

    /// Immutable runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}
