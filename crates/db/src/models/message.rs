//! Message entity model and DTOs.

use messenger_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `messages` table.
///
/// Customer messages carry `customer_id`, staff messages `user_id`.
/// Engage messages carry both: the sending staff persona and the
/// recipient visitor.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Message {
    pub id: DbId,
    pub conversation_id: DbId,
    pub customer_id: Option<DbId>,
    pub user_id: Option<DbId>,
    pub content: String,
    pub attachments: Option<serde_json::Value>,
    pub engage_data: Option<serde_json::Value>,
    pub internal: bool,
    pub is_customer_read: Option<bool>,
    pub created_at: Timestamp,
}

impl Message {
    pub fn is_staff_authored(&self) -> bool {
        self.user_id.is_some()
    }

    /// Staff message the customer has not seen yet.
    pub fn is_unread_by_customer(&self) -> bool {
        self.is_staff_authored() && !self.internal && self.is_customer_read != Some(true)
    }
}

/// DTO for inserting a message.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateMessage {
    pub conversation_id: DbId,
    pub customer_id: Option<DbId>,
    pub user_id: Option<DbId>,
    pub content: String,
    pub attachments: Option<serde_json::Value>,
    pub engage_data: Option<serde_json::Value>,
    #[serde(default)]
    pub internal: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(user_id: Option<DbId>, internal: bool, read: Option<bool>) -> Message {
        Message {
            id: 1,
            conversation_id: 1,
            customer_id: None,
            user_id,
            content: "hi".to_string(),
            attachments: None,
            engage_data: None,
            internal,
            is_customer_read: read,
            created_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn only_visible_unseen_staff_messages_are_unread() {
        assert!(message(Some(2), false, None).is_unread_by_customer());
        assert!(message(Some(2), false, Some(false)).is_unread_by_customer());
        assert!(!message(Some(2), false, Some(true)).is_unread_by_customer());
        assert!(!message(Some(2), true, None).is_unread_by_customer());
        assert!(!message(None, false, None).is_unread_by_customer());
    }
}
