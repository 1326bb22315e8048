use async_trait::async_trait;
use messenger_core::types::{DbId, Timestamp};
use messenger_db::models::brand::Brand;
use messenger_db::models::conversation::{Conversation, CreateConversation};
use messenger_db::models::customer::{CreateCustomer, Customer, TouchSession};
use messenger_db::models::engage_message::EngageMessage;
use messenger_db::models::integration::Integration;
use messenger_db::models::message::{CreateMessage, Message};
use messenger_db::models::user::User;
use messenger_db::repositories::{
    BrandRepo, ConversationRepo, CustomerRepo, EngageMessageRepo, IntegrationRepo, MessageRepo,
    UserRepo,
};
use messenger_db::DbPool;

use super::WidgetStore;
use crate::error::WidgetResult;

/// [`WidgetStore`] backed by PostgreSQL.
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl WidgetStore for PgStore {
    async fn ping(&self) -> WidgetResult<()> {
        Ok(messenger_db::health_check(&self.pool).await?)
    }

    async fn find_brand_by_code(&self, code: &str) -> WidgetResult<Option<Brand>> {
        Ok(BrandRepo::find_by_code(&self.pool, code).await?)
    }

    async fn find_integration(&self, id: DbId) -> WidgetResult<Option<Integration>> {
        Ok(IntegrationRepo::find_by_id(&self.pool, id).await?)
    }

    async fn find_integration_by_brand_code(
        &self,
        brand_code: &str,
        kind: &str,
    ) -> WidgetResult<Option<Integration>> {
        Ok(IntegrationRepo::find_by_brand_code(&self.pool, brand_code, kind).await?)
    }

    async fn find_user(&self, id: DbId) -> WidgetResult<Option<User>> {
        Ok(UserRepo::find_by_id(&self.pool, id).await?)
    }

    async fn find_customer(&self, id: DbId) -> WidgetResult<Option<Customer>> {
        Ok(CustomerRepo::find_by_id(&self.pool, id).await?)
    }

    async fn find_customer_by_email(
        &self,
        email: &str,
        integration_id: DbId,
    ) -> WidgetResult<Option<Customer>> {
        Ok(CustomerRepo::find_by_email(&self.pool, email, integration_id).await?)
    }

    async fn create_customer(
        &self,
        input: &CreateCustomer,
        now: Timestamp,
    ) -> WidgetResult<Customer> {
        Ok(CustomerRepo::create(&self.pool, input, now).await?)
    }

    async fn touch_customer_session(
        &self,
        id: DbId,
        input: &TouchSession,
    ) -> WidgetResult<Option<Customer>> {
        Ok(CustomerRepo::touch_session(&self.pool, id, input).await?)
    }

    async fn mark_customer_inactive(&self, id: DbId, now: Timestamp) -> WidgetResult<bool> {
        Ok(CustomerRepo::mark_inactive(&self.pool, id, now).await?)
    }

    async fn set_customer_email(&self, id: DbId, email: &str) -> WidgetResult<bool> {
        Ok(CustomerRepo::set_email(&self.pool, id, email).await?)
    }

    async fn find_conversation(&self, id: DbId) -> WidgetResult<Option<Conversation>> {
        Ok(ConversationRepo::find_by_id(&self.pool, id).await?)
    }

    async fn create_conversation(
        &self,
        input: &CreateConversation,
        now: Timestamp,
    ) -> WidgetResult<Conversation> {
        Ok(ConversationRepo::create(&self.pool, input, now).await?)
    }

    async fn reopen_conversation(&self, id: DbId) -> WidgetResult<bool> {
        Ok(ConversationRepo::reopen(&self.pool, id).await?)
    }

    async fn list_conversations(
        &self,
        integration_id: DbId,
        customer_id: DbId,
    ) -> WidgetResult<Vec<Conversation>> {
        Ok(ConversationRepo::list_for_customer(&self.pool, integration_id, customer_id).await?)
    }

    async fn create_message(&self, input: &CreateMessage, now: Timestamp) -> WidgetResult<Message> {
        Ok(MessageRepo::create(&self.pool, input, now).await?)
    }

    async fn find_message(&self, id: DbId) -> WidgetResult<Option<Message>> {
        Ok(MessageRepo::find_by_id(&self.pool, id).await?)
    }

    async fn list_messages(&self, conversation_id: DbId) -> WidgetResult<Vec<Message>> {
        Ok(MessageRepo::list_for_conversation(&self.pool, conversation_id).await?)
    }

    async fn mark_customer_read(&self, conversation_id: DbId) -> WidgetResult<Vec<DbId>> {
        Ok(MessageRepo::mark_customer_read(&self.pool, conversation_id).await?)
    }

    async fn unread_count(&self, conversation_id: DbId) -> WidgetResult<i64> {
        Ok(MessageRepo::unread_count(&self.pool, conversation_id).await?)
    }

    async fn unread_count_for_customer(
        &self,
        integration_id: DbId,
        customer_id: DbId,
    ) -> WidgetResult<i64> {
        Ok(MessageRepo::unread_count_for_customer(&self.pool, integration_id, customer_id).await?)
    }

    async fn first_unread_for_customer(
        &self,
        integration_id: DbId,
        customer_id: DbId,
    ) -> WidgetResult<Option<Message>> {
        Ok(MessageRepo::first_unread_for_customer(&self.pool, integration_id, customer_id).await?)
    }

    async fn last_staff_user_id(&self, conversation_id: DbId) -> WidgetResult<Option<DbId>> {
        Ok(MessageRepo::last_staff_user_id(&self.pool, conversation_id).await?)
    }

    async fn list_engage_candidates(
        &self,
        brand_id: DbId,
        customer_id: DbId,
    ) -> WidgetResult<Vec<EngageMessage>> {
        Ok(EngageMessageRepo::list_visitor_auto_candidates(&self.pool, brand_id, customer_id).await?)
    }

    async fn register_engage_customer(
        &self,
        campaign_id: DbId,
        customer_id: DbId,
    ) -> WidgetResult<bool> {
        Ok(EngageMessageRepo::add_customer(&self.pool, campaign_id, customer_id).await?)
    }
}
