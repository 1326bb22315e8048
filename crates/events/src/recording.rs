//! Publisher that keeps every event in memory.

use std::sync::Mutex;

use messenger_core::types::DbId;

use crate::bus::{EventPublisher, MessengerEvent, Topic};

/// [`EventPublisher`] that records events instead of delivering them.
#[derive(Debug, Default)]
pub struct RecordingPublisher {
    events: Mutex<Vec<MessengerEvent>>,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every event published so far, oldest first.
    pub fn events(&self) -> Vec<MessengerEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn count(&self, topic: Topic) -> usize {
        self.events().iter().filter(|e| e.topic == topic).count()
    }

    /// `new-message` payloads addressed to `customer_id`.
    pub fn messages_for(&self, customer_id: DbId) -> Vec<serde_json::Value> {
        self.events()
            .into_iter()
            .filter(|e| e.topic == Topic::NewMessage && e.customer_id == Some(customer_id))
            .map(|e| e.payload)
            .collect()
    }

    pub fn clear(&self) {
        match self.events.lock() {
            Ok(mut events) => events.clear(),
            Err(poisoned) => poisoned.into_inner().clear(),
        }
    }
}

impl EventPublisher for RecordingPublisher {
    fn publish(&self, event: MessengerEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_in_order_and_filters_by_customer() {
        let publisher = RecordingPublisher::new();
        publisher.publish(MessengerEvent::new_message(&serde_json::json!({"id": 1})).with_customer(5));
        publisher.publish(MessengerEvent::notification());
        publisher.publish(MessengerEvent::new_message(&serde_json::json!({"id": 2})).with_customer(6));

        assert_eq!(publisher.count(Topic::NewMessage), 2);
        assert_eq!(publisher.count(Topic::Notification), 1);
        assert_eq!(publisher.messages_for(5), vec![serde_json::json!({"id": 1})]);

        publisher.clear();
        assert!(publisher.events().is_empty());
    }
}
