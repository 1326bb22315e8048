//! Repository for the `integrations` table.

use messenger_core::types::DbId;
use sqlx::PgPool;

use crate::models::integration::Integration;

/// Column list for `integrations` queries, qualified for joins.
const COLUMNS: &str = "i.id, i.brand_id, i.name, i.kind, i.messenger_data, i.ui_options, i.created_at";

/// Provides lookups for integrations.
pub struct IntegrationRepo;

impl IntegrationRepo {
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Integration>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM integrations i WHERE i.id = $1");
        sqlx::query_as::<_, Integration>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find the integration of the given kind for the brand with `brand_code`.
    ///
    /// Returns `None` when either the brand or the integration is missing.
    pub async fn find_by_brand_code(
        pool: &PgPool,
        brand_code: &str,
        kind: &str,
    ) -> Result<Option<Integration>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM integrations i \
             JOIN brands b ON b.id = i.brand_id \
             WHERE b.code = $1 AND i.kind = $2 \
             ORDER BY i.id \
             LIMIT 1"
        );
        sqlx::query_as::<_, Integration>(&query)
            .bind(brand_code)
            .bind(kind)
            .fetch_optional(pool)
            .await
    }
}
