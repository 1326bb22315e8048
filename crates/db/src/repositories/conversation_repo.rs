//! Repository for the `conversations` table.

use messenger_core::conversation::ConversationStatus;
use messenger_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::conversation::{Conversation, CreateConversation};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, customer_id, integration_id, content, status, number, \
                       message_count, read_user_ids, created_at";

/// Provides lifecycle operations for conversations.
pub struct ConversationRepo;

impl ConversationRepo {
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Conversation>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM conversations WHERE id = $1");
        sqlx::query_as::<_, Conversation>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Create a conversation with the next sequence number.
    ///
    /// The number comes from an upsert on `conversation_counters`, which
    /// serializes concurrent creates for the same (customer, integration).
    /// A missing counter row is seeded from the existing conversation count.
    pub async fn create(
        pool: &PgPool,
        input: &CreateConversation,
        now: Timestamp,
    ) -> Result<Conversation, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let number: i32 = sqlx::query_scalar(
            "INSERT INTO conversation_counters (customer_id, integration_id, last_number) \
             VALUES ($1, $2, ( \
                 SELECT COUNT(*) FROM conversations \
                 WHERE customer_id = $1 AND integration_id = $2 \
             )::int + 1) \
             ON CONFLICT (customer_id, integration_id) \
             DO UPDATE SET last_number = conversation_counters.last_number + 1 \
             RETURNING last_number",
        )
        .bind(input.customer_id)
        .bind(input.integration_id)
        .fetch_one(&mut *tx)
        .await?;

        let query = format!(
            "INSERT INTO conversations \
                (customer_id, integration_id, content, status, number, message_count, created_at) \
             VALUES ($1, $2, $3, $4, $5, 0, $6) \
             RETURNING {COLUMNS}"
        );
        let conversation = sqlx::query_as::<_, Conversation>(&query)
            .bind(input.customer_id)
            .bind(input.integration_id)
            .bind(&input.content)
            .bind(ConversationStatus::New.as_str())
            .bind(number)
            .bind(now)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(conversation)
    }

    /// Reopen a conversation and mark it unread for every staff member.
    ///
    /// Idempotent. Returns `true` if the conversation exists.
    pub async fn reopen(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE conversations SET status = $2, read_user_ids = '{}' WHERE id = $1",
        )
        .bind(id)
        .bind(ConversationStatus::Open.as_str())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// A customer's conversations on an integration, newest first.
    pub async fn list_for_customer(
        pool: &PgPool,
        integration_id: DbId,
        customer_id: DbId,
    ) -> Result<Vec<Conversation>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM conversations \
             WHERE integration_id = $1 AND customer_id = $2 \
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, Conversation>(&query)
            .bind(integration_id)
            .bind(customer_id)
            .fetch_all(pool)
            .await
    }
}
