//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! Two topics exist. `new-message` carries the full message record;
//! `notification` carries nothing and only tells subscribers to re-query.
//! Delivery is fire-and-forget and at-most-once to whoever is subscribed
//! at publish time.

use std::fmt;

use chrono::{DateTime, Utc};
use messenger_core::types::DbId;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// Topic
// ---------------------------------------------------------------------------

pub const TOPIC_NEW_MESSAGE: &str = "new-message";
pub const TOPIC_NOTIFICATION: &str = "notification";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Topic {
    #[serde(rename = "new-message")]
    NewMessage,
    #[serde(rename = "notification")]
    Notification,
}

impl Topic {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NewMessage => TOPIC_NEW_MESSAGE,
            Self::Notification => TOPIC_NOTIFICATION,
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// MessengerEvent
// ---------------------------------------------------------------------------

/// An event published on the bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessengerEvent {
    pub topic: Topic,

    /// Customer the event concerns, used to route live pushes.
    pub customer_id: Option<DbId>,

    /// Record carried by the event; `null` for `notification`.
    pub payload: serde_json::Value,

    /// When the event was created (UTC).
    pub timestamp: DateTime<Utc>,
}

impl MessengerEvent {
    pub fn new(topic: Topic) -> Self {
        Self {
            topic,
            customer_id: None,
            payload: serde_json::Value::Null,
            timestamp: Utc::now(),
        }
    }

    /// A `new-message` event carrying `message`.
    pub fn new_message<T: Serialize>(message: &T) -> Self {
        Self::new(Topic::NewMessage).with_payload(
            serde_json::to_value(message).unwrap_or(serde_json::Value::Null),
        )
    }

    /// A payload-less `notification` event.
    pub fn notification() -> Self {
        Self::new(Topic::Notification)
    }

    pub fn with_customer(mut self, customer_id: DbId) -> Self {
        self.customer_id = Some(customer_id);
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

// ---------------------------------------------------------------------------
// EventPublisher
// ---------------------------------------------------------------------------

/// Capability to publish events.
///
/// Publishing never fails from the caller's point of view.
pub trait EventPublisher: Send + Sync {
    fn publish(&self, event: MessengerEvent);
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// Wraps a [`broadcast::Sender`] so that any number of subscribers can
/// independently receive every published [`MessengerEvent`].
///
/// ```rust
/// use messenger_events::bus::{EventBus, EventPublisher, MessengerEvent};
///
/// let bus = EventBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.publish(MessengerEvent::notification());
/// ```
pub struct EventBus {
    sender: broadcast::Sender<MessengerEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed messages are dropped
    /// and slow receivers will observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to all events published on this bus.
    pub fn subscribe(&self) -> broadcast::Receiver<MessengerEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl EventPublisher for EventBus {
    fn publish(&self, event: MessengerEvent) {
        tracing::trace!(topic = %event.topic, customer_id = ?event.customer_id, "Publishing event");
        // Ignore the SendError, it only means there are zero receivers.
        let _ = self.sender.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_and_receive_single_subscriber() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        let event = MessengerEvent::new_message(&serde_json::json!({"id": 9, "content": "hi"}))
            .with_customer(42);
        bus.publish(event);

        let received = rx.recv().await.expect("should receive the event");
        assert_eq!(received.topic, Topic::NewMessage);
        assert_eq!(received.customer_id, Some(42));
        assert_eq!(received.payload["content"], "hi");
    }

    #[tokio::test]
    async fn multiple_subscribers_receive_same_event() {
        let bus = EventBus::default();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.publish(MessengerEvent::notification());

        let e1 = rx1.recv().await.expect("subscriber 1 should receive");
        let e2 = rx2.recv().await.expect("subscriber 2 should receive");

        assert_eq!(e1.topic, Topic::Notification);
        assert_eq!(e2.topic, Topic::Notification);
    }

    #[test]
    fn publish_with_no_subscribers_does_not_panic() {
        let bus = EventBus::default();
        bus.publish(MessengerEvent::notification());
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn notification_has_no_payload() {
        let event = MessengerEvent::notification();
        assert!(event.payload.is_null());
        assert!(event.customer_id.is_none());
    }

    #[test]
    fn topics_serialize_with_wire_names() {
        assert_eq!(
            serde_json::to_string(&Topic::NewMessage).unwrap(),
            "\"new-message\""
        );
        assert_eq!(Topic::Notification.to_string(), "notification");
    }
}
