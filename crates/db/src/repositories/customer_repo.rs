//! Repository for the `customers` table.

use messenger_core::session::{session_cutoff, INITIAL_SESSION_COUNT};
use messenger_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::customer::{CreateCustomer, Customer, TouchSession};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, integration_id, email, is_user, name, last_seen_at, is_active, \
                       session_count, custom_data, created_at";

/// Provides identity and session operations for widget customers.
pub struct CustomerRepo;

impl CustomerRepo {
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Customer>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM customers WHERE id = $1");
        sqlx::query_as::<_, Customer>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a customer by email within one integration.
    pub async fn find_by_email(
        pool: &PgPool,
        email: &str,
        integration_id: DbId,
    ) -> Result<Option<Customer>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM customers \
             WHERE email = $1 AND integration_id = $2 \
             ORDER BY id \
             LIMIT 1"
        );
        sqlx::query_as::<_, Customer>(&query)
            .bind(email)
            .bind(integration_id)
            .fetch_optional(pool)
            .await
    }

    /// Insert a new customer with a fresh, active session.
    pub async fn create(
        pool: &PgPool,
        input: &CreateCustomer,
        now: Timestamp,
    ) -> Result<Customer, sqlx::Error> {
        let query = format!(
            "INSERT INTO customers \
                (integration_id, email, is_user, name, last_seen_at, is_active, \
                 session_count, custom_data, created_at) \
             VALUES ($1, $2, $3, $4, $5, true, $6, $7, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Customer>(&query)
            .bind(input.integration_id)
            .bind(&input.email)
            .bind(input.is_user)
            .bind(&input.name)
            .bind(now)
            .bind(INITIAL_SESSION_COUNT)
            .bind(&input.custom_data)
            .fetch_one(pool)
            .await
    }

    /// Refresh the session of a reconnecting customer in one statement.
    ///
    /// Sets `last_seen_at`, `is_active`, `name` and `is_user`, and bumps
    /// `session_count` when the previous `last_seen_at` is older than the
    /// session cutoff for `input.now`. The comparison reads the pre-update row,
    /// so concurrent reconnects cannot both observe the old gap.
    pub async fn touch_session(
        pool: &PgPool,
        id: DbId,
        input: &TouchSession,
    ) -> Result<Option<Customer>, sqlx::Error> {
        let query = format!(
            "UPDATE customers SET \
                session_count = session_count + \
                    CASE WHEN last_seen_at < $2 THEN 1 ELSE 0 END, \
                last_seen_at = $3, \
                is_active = true, \
                name = $4, \
                is_user = $5 \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Customer>(&query)
            .bind(id)
            .bind(session_cutoff(input.now))
            .bind(input.now)
            .bind(&input.name)
            .bind(input.is_user)
            .fetch_optional(pool)
            .await
    }

    /// Mark a customer as disconnected. Returns `true` if the row exists.
    pub async fn mark_inactive(
        pool: &PgPool,
        id: DbId,
        now: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE customers SET is_active = false, last_seen_at = $2 WHERE id = $1",
        )
        .bind(id)
        .bind(now)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Attach an email to a customer. Returns `true` if the row exists.
    pub async fn set_email(pool: &PgPool, id: DbId, email: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE customers SET email = $2 WHERE id = $1")
            .bind(id)
            .bind(email)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
