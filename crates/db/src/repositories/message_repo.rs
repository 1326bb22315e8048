//! Repository for the `messages` table.

use messenger_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::message::{CreateMessage, Message};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, conversation_id, customer_id, user_id, content, attachments, \
                       engage_data, internal, is_customer_read, created_at";

/// Staff-authored, customer-visible, not yet read by the customer.
const UNREAD_BY_CUSTOMER: &str =
    "user_id IS NOT NULL AND internal = false AND is_customer_read IS NOT TRUE";

/// Provides CRUD and read-state operations for messages.
pub struct MessageRepo;

impl MessageRepo {
    /// Insert a message, returning the stored row.
    pub async fn create(
        pool: &PgPool,
        input: &CreateMessage,
        now: Timestamp,
    ) -> Result<Message, sqlx::Error> {
        let query = format!(
            "INSERT INTO messages \
                (conversation_id, customer_id, user_id, content, attachments, engage_data, \
                 internal, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Message>(&query)
            .bind(input.conversation_id)
            .bind(input.customer_id)
            .bind(input.user_id)
            .bind(&input.content)
            .bind(&input.attachments)
            .bind(&input.engage_data)
            .bind(input.internal)
            .bind(now)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Message>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM messages WHERE id = $1");
        sqlx::query_as::<_, Message>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Customer-visible messages of a conversation, oldest first.
    pub async fn list_for_conversation(
        pool: &PgPool,
        conversation_id: DbId,
    ) -> Result<Vec<Message>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM messages \
             WHERE conversation_id = $1 AND internal = false \
             ORDER BY created_at ASC, id ASC"
        );
        sqlx::query_as::<_, Message>(&query)
            .bind(conversation_id)
            .fetch_all(pool)
            .await
    }

    /// Mark every unread staff message of a conversation as read by the
    /// customer. Returns the ids of the messages that changed.
    pub async fn mark_customer_read(
        pool: &PgPool,
        conversation_id: DbId,
    ) -> Result<Vec<DbId>, sqlx::Error> {
        let query = format!(
            "UPDATE messages SET is_customer_read = true \
             WHERE conversation_id = $1 AND {UNREAD_BY_CUSTOMER} \
             RETURNING id"
        );
        sqlx::query_scalar(&query)
            .bind(conversation_id)
            .fetch_all(pool)
            .await
    }

    /// Number of staff messages in a conversation the customer has not read.
    pub async fn unread_count(pool: &PgPool, conversation_id: DbId) -> Result<i64, sqlx::Error> {
        let query = format!(
            "SELECT COUNT(*) FROM messages WHERE conversation_id = $1 AND {UNREAD_BY_CUSTOMER}"
        );
        let count: Option<i64> = sqlx::query_scalar(&query)
            .bind(conversation_id)
            .fetch_one(pool)
            .await?;
        Ok(count.unwrap_or(0))
    }

    /// Unread staff messages across all of a customer's conversations.
    pub async fn unread_count_for_customer(
        pool: &PgPool,
        integration_id: DbId,
        customer_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        let query = format!(
            "SELECT COUNT(*) FROM messages \
             WHERE conversation_id IN ( \
                 SELECT id FROM conversations WHERE integration_id = $1 AND customer_id = $2 \
             ) AND {UNREAD_BY_CUSTOMER}"
        );
        let count: Option<i64> = sqlx::query_scalar(&query)
            .bind(integration_id)
            .bind(customer_id)
            .fetch_one(pool)
            .await?;
        Ok(count.unwrap_or(0))
    }

    /// Oldest unread staff message across a customer's conversations.
    pub async fn first_unread_for_customer(
        pool: &PgPool,
        integration_id: DbId,
        customer_id: DbId,
    ) -> Result<Option<Message>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM messages \
             WHERE conversation_id IN ( \
                 SELECT id FROM conversations WHERE integration_id = $1 AND customer_id = $2 \
             ) AND {UNREAD_BY_CUSTOMER} \
             ORDER BY created_at ASC, id ASC \
             LIMIT 1"
        );
        sqlx::query_as::<_, Message>(&query)
            .bind(integration_id)
            .bind(customer_id)
            .fetch_optional(pool)
            .await
    }

    /// Id of the most recent staff member who wrote in a conversation.
    pub async fn last_staff_user_id(
        pool: &PgPool,
        conversation_id: DbId,
    ) -> Result<Option<DbId>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT user_id FROM messages \
             WHERE conversation_id = $1 AND user_id IS NOT NULL \
             ORDER BY created_at DESC, id DESC \
             LIMIT 1",
        )
        .bind(conversation_id)
        .fetch_optional(pool)
        .await
    }
}
