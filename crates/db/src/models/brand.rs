//! Brand entity model.

use messenger_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `brands` table.
///
/// Widgets identify themselves by the human-readable `code`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Brand {
    pub id: DbId,
    pub code: String,
    pub name: Option<String>,
    pub created_at: Timestamp,
}
