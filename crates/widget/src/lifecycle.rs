//! Conversation creation, numbering and reopening.

use std::sync::Arc;

use chrono::Utc;
use messenger_core::error::CoreError;
use messenger_core::types::DbId;
use messenger_db::models::conversation::{Conversation, CreateConversation};

use crate::error::WidgetResult;
use crate::store::WidgetStore;
use crate::tasks::BackgroundTasks;

/// Input of [`ConversationLifecycle::get_or_create`].
#[derive(Debug, Clone)]
pub struct ConversationTarget {
    /// Existing conversation the message continues, if any.
    pub conversation_id: Option<DbId>,
    pub integration_id: DbId,
    pub customer_id: DbId,
    /// Text that starts the conversation when one is created.
    pub message: String,
}

#[derive(Clone)]
pub struct ConversationLifecycle {
    store: Arc<dyn WidgetStore>,
    tasks: BackgroundTasks,
}

impl ConversationLifecycle {
    pub fn new(store: Arc<dyn WidgetStore>, tasks: BackgroundTasks) -> Self {
        Self { store, tasks }
    }

    /// Return the conversation a message belongs to.
    ///
    /// An existing conversation is reopened in the background and its id
    /// returned at once. Otherwise a new conversation is created.
    pub async fn get_or_create(&self, target: &ConversationTarget) -> WidgetResult<DbId> {
        if let Some(id) = target.conversation_id {
            let store = Arc::clone(&self.store);
            self.tasks.spawn("conversation_reopen", async move {
                if !store.reopen_conversation(id).await? {
                    tracing::warn!(conversation_id = id, "Reopen of unknown conversation");
                }
                Ok::<(), crate::error::WidgetError>(())
            });
            return Ok(id);
        }

        let conversation = self
            .create(target.customer_id, target.integration_id, Some(target.message.clone()))
            .await?;
        Ok(conversation.id)
    }

    /// Create a conversation with the next number for its customer.
    pub async fn create(
        &self,
        customer_id: DbId,
        integration_id: DbId,
        content: Option<String>,
    ) -> WidgetResult<Conversation> {
        let conversation = self
            .store
            .create_conversation(
                &CreateConversation {
                    customer_id,
                    integration_id,
                    content,
                },
                Utc::now(),
            )
            .await?;
        tracing::info!(
            conversation_id = conversation.id,
            customer_id,
            number = conversation.number,
            "Conversation created"
        );
        Ok(conversation)
    }

    /// Set status `open` and clear `read_user_ids`. Idempotent.
    pub async fn reopen(&self, conversation_id: DbId) -> WidgetResult<()> {
        if self.store.reopen_conversation(conversation_id).await? {
            Ok(())
        } else {
            Err(CoreError::NotFound {
                entity: "conversation",
                id: conversation_id,
            }
            .into())
        }
    }
}
