use serde::Serialize;
use serde_json::Value;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Broadcast publisher for lifecycle events
#[derive(Debug, Clone)]
pub struct EventPublisher {
    sender: broadcast::Sender<LifecycleEvent>,
}

/// Event that has been published
#[derive(Debug, Clone, Serialize)]
pub struct LifecycleEvent {
    pub name: String,
    /// Activation cycle the event belongs to, if any
    pub activation_id: Option<Uuid>,
    pub context: Value,
    pub published_at: chrono::DateTime<chrono::Utc>,
}

impl EventPublisher {
    /// Create a new event publisher with the specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish an event, returning how many subscribers received it.
    ///
    /// Publishing with no subscribers is not an error.
    pub fn publish(
        &self,
        event_name: impl Into<String>,
        activation_id: Option<Uuid>,
        context: Value,
    ) -> usize {
        let event = LifecycleEvent {
            name: event_name.into(),
            activation_id,
            context,
            published_at: chrono::Utc::now(),
        };

        self.sender.send(event).unwrap_or(0)
    }

    /// Subscribe to events published from now on
    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new(crate::constants::DEFAULT_EVENT_CHANNEL_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_publish_without_subscribers() {
        let publisher = EventPublisher::default();
        assert_eq!(publisher.subscriber_count(), 0);
        assert_eq!(publisher.publish("activation.started", None, json!({})), 0);
    }

    #[tokio::test]
    async fn test_subscriber_receives_events_in_order() {
        let publisher = EventPublisher::new(8);
        let mut receiver = publisher.subscribe();
        let activation_id = Uuid::new_v4();

        publisher.publish("activation.started", Some(activation_id), json!({"n": 1}));
        publisher.publish("activation.ready", Some(activation_id), json!({"n": 2}));

        let first = receiver.recv().await.unwrap();
        let second = receiver.recv().await.unwrap();
        assert_eq!(first.name, "activation.started");
        assert_eq!(second.name, "activation.ready");
        assert_eq!(second.activation_id, Some(activation_id));
        assert_eq!(second.context["n"], json!(2));
    }
}
