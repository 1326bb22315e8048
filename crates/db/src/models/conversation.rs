//! Conversation entity model and DTOs.

use messenger_core::conversation::ConversationStatus;
use messenger_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `conversations` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Conversation {
    pub id: DbId,
    pub customer_id: DbId,
    pub integration_id: DbId,
    /// Text of the message that started the conversation.
    pub content: Option<String>,
    #[sqlx(try_from = "String")]
    pub status: ConversationStatus,
    /// Per (customer, integration) sequence number, starting at 1.
    pub number: i32,
    pub message_count: i32,
    /// Staff members who have seen the latest customer message.
    pub read_user_ids: Vec<DbId>,
    pub created_at: Timestamp,
}

/// DTO for creating a conversation. The number is assigned by the store.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateConversation {
    pub customer_id: DbId,
    pub integration_id: DbId,
    pub content: Option<String>,
}
