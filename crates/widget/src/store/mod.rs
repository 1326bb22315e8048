//! Persistence seam for the widget services.
//!
//! [`WidgetStore`] lists exactly the reads and writes the services need.
//! Every write that must be race-free is a single store operation:
//! session refresh, conversation number reservation and campaign
//! registration are never read-modify-write in application memory.
//!
//! - [`PgStore`] runs against PostgreSQL through the `messenger-db`
//!   repositories.
//! - [`MemoryStore`] keeps everything in process, for tests and local demos.

use async_trait::async_trait;
use messenger_core::types::{DbId, Timestamp};
use messenger_db::models::brand::Brand;
use messenger_db::models::conversation::{Conversation, CreateConversation};
use messenger_db::models::customer::{CreateCustomer, Customer, TouchSession};
use messenger_db::models::engage_message::EngageMessage;
use messenger_db::models::integration::Integration;
use messenger_db::models::message::{CreateMessage, Message};
use messenger_db::models::user::User;

use crate::error::WidgetResult;

mod memory;
mod postgres;

pub use memory::{MemoryStore, NewCampaign};
pub use postgres::PgStore;

#[async_trait]
pub trait WidgetStore: Send + Sync {
    /// Cheap liveness probe.
    async fn ping(&self) -> WidgetResult<()>;

    // --- Brands, integrations, staff ---

    async fn find_brand_by_code(&self, code: &str) -> WidgetResult<Option<Brand>>;

    async fn find_integration(&self, id: DbId) -> WidgetResult<Option<Integration>>;

    async fn find_integration_by_brand_code(
        &self,
        brand_code: &str,
        kind: &str,
    ) -> WidgetResult<Option<Integration>>;

    async fn find_user(&self, id: DbId) -> WidgetResult<Option<User>>;

    // --- Customers ---

    async fn find_customer(&self, id: DbId) -> WidgetResult<Option<Customer>>;

    async fn find_customer_by_email(
        &self,
        email: &str,
        integration_id: DbId,
    ) -> WidgetResult<Option<Customer>>;

    async fn create_customer(&self, input: &CreateCustomer, now: Timestamp)
        -> WidgetResult<Customer>;

    /// Atomically refresh a reconnecting customer's session.
    async fn touch_customer_session(
        &self,
        id: DbId,
        input: &TouchSession,
    ) -> WidgetResult<Option<Customer>>;

    async fn mark_customer_inactive(&self, id: DbId, now: Timestamp) -> WidgetResult<bool>;

    async fn set_customer_email(&self, id: DbId, email: &str) -> WidgetResult<bool>;

    // --- Conversations ---

    async fn find_conversation(&self, id: DbId) -> WidgetResult<Option<Conversation>>;

    /// Insert a conversation, reserving its number atomically.
    async fn create_conversation(
        &self,
        input: &CreateConversation,
        now: Timestamp,
    ) -> WidgetResult<Conversation>;

    /// Set status to open and clear `read_user_ids`. Idempotent.
    async fn reopen_conversation(&self, id: DbId) -> WidgetResult<bool>;

    async fn list_conversations(
        &self,
        integration_id: DbId,
        customer_id: DbId,
    ) -> WidgetResult<Vec<Conversation>>;

    // --- Messages ---

    async fn create_message(&self, input: &CreateMessage, now: Timestamp) -> WidgetResult<Message>;

    async fn find_message(&self, id: DbId) -> WidgetResult<Option<Message>>;

    async fn list_messages(&self, conversation_id: DbId) -> WidgetResult<Vec<Message>>;

    /// Mark unread staff messages as read by the customer, returning the
    /// ids that changed.
    async fn mark_customer_read(&self, conversation_id: DbId) -> WidgetResult<Vec<DbId>>;

    async fn unread_count(&self, conversation_id: DbId) -> WidgetResult<i64>;

    async fn unread_count_for_customer(
        &self,
        integration_id: DbId,
        customer_id: DbId,
    ) -> WidgetResult<i64>;

    async fn first_unread_for_customer(
        &self,
        integration_id: DbId,
        customer_id: DbId,
    ) -> WidgetResult<Option<Message>>;

    async fn last_staff_user_id(&self, conversation_id: DbId) -> WidgetResult<Option<DbId>>;

    // --- Engage campaigns ---

    /// Live visitor-auto messenger campaigns of `brand_id` whose ledger does
    /// not contain `customer_id`.
    async fn list_engage_candidates(
        &self,
        brand_id: DbId,
        customer_id: DbId,
    ) -> WidgetResult<Vec<EngageMessage>>;

    /// Atomic set-add into the campaign's ledger. `true` only for the caller
    /// that added the id.
    async fn register_engage_customer(
        &self,
        campaign_id: DbId,
        customer_id: DbId,
    ) -> WidgetResult<bool>;
}
