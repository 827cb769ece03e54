use dashmap::DashMap;
use tokio::sync::broadcast;

use crate::dto::sse::ServerEvent;

/// Simple broadcast hub wrapper used by the SSE services.
///
/// Delivery is best-effort per subscriber: a lagging or dropped receiver
/// never prevents the other subscribers from seeing the event.
pub struct SseHub {
    sender: broadcast::Sender<ServerEvent>,
}

impl SseHub {
    /// Construct a new hub backed by a Tokio broadcast channel with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Register a new subscriber that will receive subsequent events.
    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.sender.subscribe()
    }

    /// Send an event to all current subscribers, ignoring delivery errors.
    pub fn broadcast(&self, event: ServerEvent) {
        let _ = self.sender.send(event);
    }
}

/// The two logical rooms the orchestrators broadcast into.
pub struct RoomHubs {
    field: SseHub,
    judging: SseHub,
}

impl RoomHubs {
    /// Build both room hubs with per-room channel capacities.
    pub fn new(capacity: usize) -> Self {
        Self {
            field: SseHub::new(capacity),
            judging: SseHub::new(capacity),
        }
    }

    /// Hub for field-side subscribers (scorekeepers, referees, queuers).
    pub fn field(&self) -> &SseHub {
        &self.field
    }

    /// Hub for judging-side subscribers (judges, advisors, queuers).
    pub fn judging(&self) -> &SseHub {
        &self.judging
    }
}

/// Registry of fine-grained channels keyed by logical channel name
/// (e.g. `division:{id}:teamArrivalUpdated`).
///
/// Subscribing creates the channel on demand; publishing into a channel whose
/// subscribers have all disconnected prunes the entry.
pub struct ChannelRegistry {
    capacity: usize,
    channels: DashMap<String, broadcast::Sender<ServerEvent>>,
}

impl ChannelRegistry {
    /// Create an empty registry with the given per-channel capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            channels: DashMap::new(),
        }
    }

    /// Subscribe to a channel, creating it if it does not exist yet.
    /// Dropping the returned receiver unsubscribes.
    pub fn subscribe(&self, channel: &str) -> broadcast::Receiver<ServerEvent> {
        self.channels
            .entry(channel.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    /// Publish an event to every current subscriber of `channel`.
    ///
    /// A channel with no live subscribers is removed so the registry does not
    /// accumulate entries for long-gone single-entity subscriptions.
    pub fn publish(&self, channel: &str, event: ServerEvent) {
        let Some(sender) = self.channels.get(channel) else {
            return;
        };
        let delivered = sender.send(event).is_ok();
        drop(sender);

        if !delivered {
            self.channels
                .remove_if(channel, |_, sender| sender.receiver_count() == 0);
        }
    }

    /// Number of currently registered channels.
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// Whether no channels are currently registered.
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(data: &str) -> ServerEvent {
        ServerEvent::new(None, data.to_string())
    }

    #[tokio::test]
    async fn publish_reaches_every_subscriber() {
        let registry = ChannelRegistry::new(8);
        let mut first = registry.subscribe("division:1:teamArrivalUpdated");
        let mut second = registry.subscribe("division:1:teamArrivalUpdated");

        registry.publish("division:1:teamArrivalUpdated", event("arrived"));

        assert_eq!(first.recv().await.unwrap().data, "arrived");
        assert_eq!(second.recv().await.unwrap().data, "arrived");
    }

    #[tokio::test]
    async fn channels_are_isolated() {
        let registry = ChannelRegistry::new(8);
        let mut one = registry.subscribe("division:1:teamArrivalUpdated");
        let _two = registry.subscribe("division:2:teamArrivalUpdated");

        registry.publish("division:2:teamArrivalUpdated", event("other"));

        assert!(one.try_recv().is_err());
    }

    #[tokio::test]
    async fn empty_channel_is_pruned_on_publish() {
        let registry = ChannelRegistry::new(8);
        {
            let _receiver = registry.subscribe("division:1:teamArrivalUpdated");
        }
        assert_eq!(registry.len(), 1);

        registry.publish("division:1:teamArrivalUpdated", event("dropped"));
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn publish_to_unknown_channel_is_a_no_op() {
        let registry = ChannelRegistry::new(8);
        registry.publish("division:9:teamArrivalUpdated", event("nobody"));
        assert!(registry.is_empty());
    }
}
