//! Repository for the `engage_messages` table.

use messenger_core::engage::{KIND_VISITOR_AUTO, METHOD_MESSENGER};
use messenger_core::types::DbId;
use sqlx::PgPool;

use crate::models::engage_message::EngageMessage;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, brand_id, kind, method, is_live, from_user_id, title, content, \
                       rules, customer_ids, created_at";

/// Provides campaign lookups and dedup-ledger updates.
pub struct EngageMessageRepo;

impl EngageMessageRepo {
    /// Live visitor-auto messenger campaigns of a brand that have not been
    /// evaluated for `customer_id` yet.
    pub async fn list_visitor_auto_candidates(
        pool: &PgPool,
        brand_id: DbId,
        customer_id: DbId,
    ) -> Result<Vec<EngageMessage>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM engage_messages \
             WHERE brand_id = $1 AND kind = $2 AND method = $3 AND is_live = true \
               AND NOT ($4 = ANY(customer_ids)) \
             ORDER BY id"
        );
        sqlx::query_as::<_, EngageMessage>(&query)
            .bind(brand_id)
            .bind(KIND_VISITOR_AUTO)
            .bind(METHOD_MESSENGER)
            .bind(customer_id)
            .fetch_all(pool)
            .await
    }

    /// Add a customer to a campaign's dedup ledger.
    ///
    /// A single conditional update: returns `true` only for the caller that
    /// actually added the id, `false` if it was already present or the
    /// campaign does not exist.
    pub async fn add_customer(
        pool: &PgPool,
        id: DbId,
        customer_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE engage_messages \
             SET customer_ids = array_append(customer_ids, $2) \
             WHERE id = $1 AND NOT ($2 = ANY(customer_ids))",
        )
        .bind(id)
        .bind(customer_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
