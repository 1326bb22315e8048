//! Engage campaign model.

use messenger_core::engage::{parse_rules, EngageRule};
use messenger_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `engage_messages` table.
///
/// `customer_ids` is the campaign's dedup ledger: every visitor the
/// campaign has been evaluated for.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct EngageMessage {
    pub id: DbId,
    pub brand_id: DbId,
    pub kind: String,
    pub method: String,
    pub is_live: bool,
    pub from_user_id: Option<DbId>,
    pub title: Option<String>,
    /// Message template, see `messenger_core::template`.
    pub content: String,
    pub rules: serde_json::Value,
    pub customer_ids: Vec<DbId>,
    pub created_at: Timestamp,
}

impl EngageMessage {
    /// Decode the stored targeting rules.
    pub fn parsed_rules(&self) -> Result<Vec<EngageRule>, serde_json::Error> {
        parse_rules(&self.rules)
    }

    /// Snapshot attached to every message this campaign sends.
    pub fn engage_data(&self) -> serde_json::Value {
        serde_json::json!({
            "engage_message_id": self.id,
            "brand_id": self.brand_id,
            "from_user_id": self.from_user_id,
            "kind": self.kind,
            "content": self.content,
            "rules": self.rules,
        })
    }
}
