//! Integration entity model.

use messenger_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `integrations` table.
///
/// One integration exists per (brand, channel kind). `messenger_data`
/// (availability method, online flag, online hours) and `ui_options` are
/// opaque to the backend and handed to the widget unchanged.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Integration {
    pub id: DbId,
    pub brand_id: DbId,
    pub name: Option<String>,
    pub kind: String,
    pub messenger_data: serde_json::Value,
    pub ui_options: serde_json::Value,
    pub created_at: Timestamp,
}
