//! Message persistence and change notification.
//!
//! Every stored customer message is followed by two events: `new-message`
//! carrying the full record, routed to the customer, and a bare
//! `notification` telling every listener to re-query. Steps after the
//! message is stored are best effort: a failure there is logged and the
//! stored message is still returned.

use std::sync::Arc;

use chrono::Utc;
use messenger_core::types::DbId;
use messenger_db::models::conversation::Conversation;
use messenger_db::models::message::{CreateMessage, Message};
use messenger_events::{EventPublisher, MessengerEvent};

use crate::dto::InsertMessageRequest;
use crate::error::WidgetResult;
use crate::lifecycle::{ConversationLifecycle, ConversationTarget};
use crate::store::WidgetStore;

#[derive(Clone)]
pub struct MessageIngestion {
    store: Arc<dyn WidgetStore>,
    lifecycle: ConversationLifecycle,
    publisher: Arc<dyn EventPublisher>,
}

impl MessageIngestion {
    pub fn new(
        store: Arc<dyn WidgetStore>,
        lifecycle: ConversationLifecycle,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            store,
            lifecycle,
            publisher,
        }
    }

    /// Persist a message stamped with the current time.
    pub async fn create_message(&self, input: &CreateMessage) -> WidgetResult<Message> {
        let message = self.store.create_message(input, Utc::now()).await?;
        tracing::debug!(
            message_id = message.id,
            conversation_id = message.conversation_id,
            "Message stored"
        );
        Ok(message)
    }

    /// Store a customer message, reopening or creating its conversation,
    /// and publish it.
    pub async fn insert_message(&self, request: &InsertMessageRequest) -> WidgetResult<Message> {
        let conversation_id = self
            .lifecycle
            .get_or_create(&ConversationTarget {
                conversation_id: request.conversation_id,
                integration_id: request.integration_id,
                customer_id: request.customer_id,
                message: request.message.clone(),
            })
            .await?;

        let message = self
            .create_message(&CreateMessage {
                conversation_id,
                customer_id: Some(request.customer_id),
                content: request.message.clone(),
                attachments: request.attachments.clone(),
                ..Default::default()
            })
            .await?;

        if let Err(e) = self.lifecycle.reopen(conversation_id).await {
            tracing::error!(conversation_id, error = %e, "Failed to reopen conversation after message");
        }

        self.publish_message(&message, request.customer_id);
        Ok(message)
    }

    /// Mark the conversation's staff messages as read by the customer.
    ///
    /// Publishes one `notification` per call, even when nothing changed.
    pub async fn read_conversation_messages(&self, conversation_id: DbId) -> WidgetResult<Vec<DbId>> {
        let updated = self.store.mark_customer_read(conversation_id).await?;
        tracing::debug!(conversation_id, updated = updated.len(), "Messages marked read");
        self.notify();
        Ok(updated)
    }

    /// Create a conversation together with its first customer message.
    pub async fn create_conversation_with_message(
        &self,
        integration_id: DbId,
        customer_id: DbId,
        content: &str,
    ) -> WidgetResult<(Conversation, Message)> {
        let conversation = self
            .lifecycle
            .create(customer_id, integration_id, Some(content.to_string()))
            .await?;
        let message = self
            .create_message(&CreateMessage {
                conversation_id: conversation.id,
                customer_id: Some(customer_id),
                content: content.to_string(),
                ..Default::default()
            })
            .await?;
        self.publish_message(&message, customer_id);
        Ok((conversation, message))
    }

    /// Publish a stored message again. `None` when the message is unknown.
    pub async fn republish(&self, message_id: DbId) -> WidgetResult<Option<Message>> {
        let Some(message) = self.store.find_message(message_id).await? else {
            return Ok(None);
        };
        let customer_id = match message.customer_id {
            Some(id) => Some(id),
            None => self
                .store
                .find_conversation(message.conversation_id)
                .await?
                .map(|c| c.customer_id),
        };
        match customer_id {
            Some(customer_id) => self.publish_message(&message, customer_id),
            None => {
                self.publisher.publish(MessengerEvent::new_message(&message));
                self.notify();
            }
        }
        Ok(Some(message))
    }

    /// Publish a bare `notification`.
    pub fn notify(&self) {
        self.publisher.publish(MessengerEvent::notification());
    }

    /// `new-message` routed to `customer_id`, then `notification`.
    pub fn publish_message(&self, message: &Message, customer_id: DbId) {
        self.publisher
            .publish(MessengerEvent::new_message(message).with_customer(customer_id));
        self.notify();
    }
}
