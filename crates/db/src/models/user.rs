//! Staff user model.

use messenger_core::types::DbId;
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `users` table. Only the fields the widget shows.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: DbId,
    pub full_name: Option<String>,
    pub position: Option<String>,
    pub email: Option<String>,
}
