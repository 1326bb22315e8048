//! Repository for the `brands` table.

use sqlx::PgPool;

use crate::models::brand::Brand;

const COLUMNS: &str = "id, code, name, created_at";

/// Provides lookups for brands.
pub struct BrandRepo;

impl BrandRepo {
    /// Find a brand by its public code.
    pub async fn find_by_code(pool: &PgPool, code: &str) -> Result<Option<Brand>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM brands WHERE code = $1");
        sqlx::query_as::<_, Brand>(&query)
            .bind(code)
            .fetch_optional(pool)
            .await
    }
}
