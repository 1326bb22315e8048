//! Customer entity model and DTOs.

use messenger_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `customers` table.
///
/// A customer without an email is an anonymous visitor.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Customer {
    pub id: DbId,
    pub integration_id: DbId,
    pub email: Option<String>,
    pub is_user: bool,
    pub name: Option<String>,
    pub last_seen_at: Timestamp,
    pub is_active: bool,
    pub session_count: i32,
    pub custom_data: serde_json::Value,
    pub created_at: Timestamp,
}

impl Customer {
    pub fn is_anonymous(&self) -> bool {
        self.email.is_none()
    }
}

/// DTO for creating a customer on first connect.
///
/// Session fields are not part of the DTO: a new customer always starts
/// active, seen now, with one session.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCustomer {
    pub integration_id: DbId,
    pub email: Option<String>,
    pub is_user: bool,
    pub name: Option<String>,
    pub custom_data: serde_json::Value,
}

/// Session refresh applied on every reconnect of a known customer.
#[derive(Debug, Clone)]
pub struct TouchSession {
    pub name: Option<String>,
    pub is_user: bool,
    pub now: Timestamp,
}
