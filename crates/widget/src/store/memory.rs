//! In-process [`WidgetStore`].
//!
//! All state sits behind one `tokio::sync::Mutex`, so every store operation
//! is atomic the same way a single SQL statement is. Foreign keys are
//! checked on insert and surface as `CoreError::NotFound`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use messenger_core::conversation::{next_conversation_number, ConversationStatus};
use messenger_core::engage::{KIND_VISITOR_AUTO, METHOD_MESSENGER};
use messenger_core::error::CoreError;
use messenger_core::session::{starts_new_session, INITIAL_SESSION_COUNT};
use messenger_core::types::{DbId, Timestamp};
use messenger_db::models::brand::Brand;
use messenger_db::models::conversation::{Conversation, CreateConversation};
use messenger_db::models::customer::{CreateCustomer, Customer, TouchSession};
use messenger_db::models::engage_message::EngageMessage;
use messenger_db::models::integration::Integration;
use messenger_db::models::message::{CreateMessage, Message};
use messenger_db::models::user::User;
use tokio::sync::Mutex;

use super::WidgetStore;
use crate::error::WidgetResult;

#[derive(Default)]
struct State {
    next_id: DbId,
    brands: HashMap<DbId, Brand>,
    integrations: HashMap<DbId, Integration>,
    users: HashMap<DbId, User>,
    customers: HashMap<DbId, Customer>,
    conversations: HashMap<DbId, Conversation>,
    counters: HashMap<(DbId, DbId), i32>,
    messages: HashMap<DbId, Message>,
    campaigns: HashMap<DbId, EngageMessage>,
}

impl State {
    fn allocate_id(&mut self) -> DbId {
        self.next_id += 1;
        self.next_id
    }

    fn conversations_of(&self, integration_id: DbId, customer_id: DbId) -> Vec<DbId> {
        self.conversations
            .values()
            .filter(|c| c.integration_id == integration_id && c.customer_id == customer_id)
            .map(|c| c.id)
            .collect()
    }

    /// Messages sorted by (created_at, id), matching the SQL ordering.
    fn sorted_messages<'a>(&'a self, filter: impl Fn(&Message) -> bool) -> Vec<&'a Message> {
        let mut messages: Vec<&Message> = self.messages.values().filter(|m| filter(m)).collect();
        messages.sort_by_key(|m| (m.created_at, m.id));
        messages
    }
}

/// Fields of a seeded campaign. The ledger starts empty.
#[derive(Debug, Clone)]
pub struct NewCampaign {
    pub brand_id: DbId,
    pub from_user_id: Option<DbId>,
    pub content: String,
    pub rules: serde_json::Value,
    pub kind: String,
    pub method: String,
    pub is_live: bool,
}

impl NewCampaign {
    /// A live visitor-auto messenger campaign.
    pub fn visitor_auto(brand_id: DbId, from_user_id: DbId, content: &str) -> Self {
        Self {
            brand_id,
            from_user_id: Some(from_user_id),
            content: content.to_string(),
            rules: serde_json::Value::Array(Vec::new()),
            kind: KIND_VISITOR_AUTO.to_string(),
            method: METHOD_MESSENGER.to_string(),
            is_live: true,
        }
    }

    pub fn with_rules(mut self, rules: serde_json::Value) -> Self {
        self.rules = rules;
        self
    }
}

/// In-memory store for tests and local runs without PostgreSQL.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// While set, every operation fails as if the database were down.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> WidgetResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(CoreError::Internal("store unavailable".to_string()).into());
        }
        Ok(())
    }

    // --- Seeding ---

    pub async fn insert_brand(&self, code: &str) -> Brand {
        let mut state = self.state.lock().await;
        let brand = Brand {
            id: state.allocate_id(),
            code: code.to_string(),
            name: None,
            created_at: Utc::now(),
        };
        state.brands.insert(brand.id, brand.clone());
        brand
    }

    pub async fn insert_integration(&self, brand_id: DbId, kind: &str) -> Integration {
        let mut state = self.state.lock().await;
        let integration = Integration {
            id: state.allocate_id(),
            brand_id,
            name: None,
            kind: kind.to_string(),
            messenger_data: serde_json::json!({ "isOnline": true }),
            ui_options: serde_json::json!({ "color": "#04A9F5" }),
            created_at: Utc::now(),
        };
        state.integrations.insert(integration.id, integration.clone());
        integration
    }

    /// Replace an integration's `messenger_data`.
    pub async fn set_messenger_data(
        &self,
        integration_id: DbId,
        messenger_data: serde_json::Value,
    ) {
        let mut state = self.state.lock().await;
        if let Some(integration) = state.integrations.get_mut(&integration_id) {
            integration.messenger_data = messenger_data;
        }
    }

    pub async fn insert_user(
        &self,
        full_name: Option<&str>,
        position: Option<&str>,
        email: Option<&str>,
    ) -> User {
        let mut state = self.state.lock().await;
        let user = User {
            id: state.allocate_id(),
            full_name: full_name.map(str::to_string),
            position: position.map(str::to_string),
            email: email.map(str::to_string),
        };
        state.users.insert(user.id, user.clone());
        user
    }

    pub async fn insert_campaign(&self, campaign: NewCampaign) -> EngageMessage {
        let mut state = self.state.lock().await;
        let engage = EngageMessage {
            id: state.allocate_id(),
            brand_id: campaign.brand_id,
            kind: campaign.kind,
            method: campaign.method,
            is_live: campaign.is_live,
            from_user_id: campaign.from_user_id,
            title: None,
            content: campaign.content,
            rules: campaign.rules,
            customer_ids: Vec::new(),
            created_at: Utc::now(),
        };
        state.campaigns.insert(engage.id, engage.clone());
        engage
    }

    /// Backdate a customer's `last_seen_at`.
    pub async fn set_customer_last_seen(&self, id: DbId, last_seen_at: Timestamp) {
        let mut state = self.state.lock().await;
        if let Some(customer) = state.customers.get_mut(&id) {
            customer.last_seen_at = last_seen_at;
        }
    }

    /// Overwrite a conversation's status, e.g. to simulate staff closing it.
    pub async fn set_conversation_status(
        &self,
        id: DbId,
        status: ConversationStatus,
        read_user_ids: Vec<DbId>,
    ) {
        let mut state = self.state.lock().await;
        if let Some(conversation) = state.conversations.get_mut(&id) {
            conversation.status = status;
            conversation.read_user_ids = read_user_ids;
        }
    }

    // --- Snapshots ---

    pub async fn campaign(&self, id: DbId) -> Option<EngageMessage> {
        self.state.lock().await.campaigns.get(&id).cloned()
    }

    pub async fn customers(&self) -> Vec<Customer> {
        let state = self.state.lock().await;
        let mut customers: Vec<Customer> = state.customers.values().cloned().collect();
        customers.sort_by_key(|c| c.id);
        customers
    }

    pub async fn all_conversations(&self) -> Vec<Conversation> {
        let state = self.state.lock().await;
        let mut conversations: Vec<Conversation> =
            state.conversations.values().cloned().collect();
        conversations.sort_by_key(|c| c.id);
        conversations
    }

    /// Every message including internal notes, in insertion order.
    pub async fn all_messages(&self) -> Vec<Message> {
        let state = self.state.lock().await;
        let mut messages: Vec<Message> = state.messages.values().cloned().collect();
        messages.sort_by_key(|m| m.id);
        messages
    }
}

#[async_trait]
impl WidgetStore for MemoryStore {
    async fn ping(&self) -> WidgetResult<()> {
        self.check_available()
    }

    async fn find_brand_by_code(&self, code: &str) -> WidgetResult<Option<Brand>> {
        self.check_available()?;
        let state = self.state.lock().await;
        Ok(state.brands.values().find(|b| b.code == code).cloned())
    }

    async fn find_integration(&self, id: DbId) -> WidgetResult<Option<Integration>> {
        self.check_available()?;
        Ok(self.state.lock().await.integrations.get(&id).cloned())
    }

    async fn find_integration_by_brand_code(
        &self,
        brand_code: &str,
        kind: &str,
    ) -> WidgetResult<Option<Integration>> {
        self.check_available()?;
        let state = self.state.lock().await;
        let Some(brand) = state.brands.values().find(|b| b.code == brand_code) else {
            return Ok(None);
        };
        let mut matches: Vec<&Integration> = state
            .integrations
            .values()
            .filter(|i| i.brand_id == brand.id && i.kind == kind)
            .collect();
        matches.sort_by_key(|i| i.id);
        Ok(matches.first().map(|i| (*i).clone()))
    }

    async fn find_user(&self, id: DbId) -> WidgetResult<Option<User>> {
        self.check_available()?;
        Ok(self.state.lock().await.users.get(&id).cloned())
    }

    async fn find_customer(&self, id: DbId) -> WidgetResult<Option<Customer>> {
        self.check_available()?;
        Ok(self.state.lock().await.customers.get(&id).cloned())
    }

    async fn find_customer_by_email(
        &self,
        email: &str,
        integration_id: DbId,
    ) -> WidgetResult<Option<Customer>> {
        self.check_available()?;
        let state = self.state.lock().await;
        Ok(state
            .customers
            .values()
            .filter(|c| c.integration_id == integration_id && c.email.as_deref() == Some(email))
            .min_by_key(|c| c.id)
            .cloned())
    }

    async fn create_customer(
        &self,
        input: &CreateCustomer,
        now: Timestamp,
    ) -> WidgetResult<Customer> {
        self.check_available()?;
        let mut state = self.state.lock().await;
        if !state.integrations.contains_key(&input.integration_id) {
            return Err(CoreError::NotFound {
                entity: "integration",
                id: input.integration_id,
            }
            .into());
        }
        let customer = Customer {
            id: state.allocate_id(),
            integration_id: input.integration_id,
            email: input.email.clone(),
            is_user: input.is_user,
            name: input.name.clone(),
            last_seen_at: now,
            is_active: true,
            session_count: INITIAL_SESSION_COUNT,
            custom_data: input.custom_data.clone(),
            created_at: now,
        };
        state.customers.insert(customer.id, customer.clone());
        Ok(customer)
    }

    async fn touch_customer_session(
        &self,
        id: DbId,
        input: &TouchSession,
    ) -> WidgetResult<Option<Customer>> {
        self.check_available()?;
        let mut state = self.state.lock().await;
        let Some(customer) = state.customers.get_mut(&id) else {
            return Ok(None);
        };
        if starts_new_session(customer.last_seen_at, input.now) {
            customer.session_count += 1;
        }
        customer.last_seen_at = input.now;
        customer.is_active = true;
        customer.name = input.name.clone();
        customer.is_user = input.is_user;
        Ok(Some(customer.clone()))
    }

    async fn mark_customer_inactive(&self, id: DbId, now: Timestamp) -> WidgetResult<bool> {
        self.check_available()?;
        let mut state = self.state.lock().await;
        Ok(match state.customers.get_mut(&id) {
            Some(customer) => {
                customer.is_active = false;
                customer.last_seen_at = now;
                true
            }
            None => false,
        })
    }

    async fn set_customer_email(&self, id: DbId, email: &str) -> WidgetResult<bool> {
        self.check_available()?;
        let mut state = self.state.lock().await;
        Ok(match state.customers.get_mut(&id) {
            Some(customer) => {
                customer.email = Some(email.to_string());
                true
            }
            None => false,
        })
    }

    async fn find_conversation(&self, id: DbId) -> WidgetResult<Option<Conversation>> {
        self.check_available()?;
        Ok(self.state.lock().await.conversations.get(&id).cloned())
    }

    async fn create_conversation(
        &self,
        input: &CreateConversation,
        now: Timestamp,
    ) -> WidgetResult<Conversation> {
        self.check_available()?;
        let mut state = self.state.lock().await;
        if !state.customers.contains_key(&input.customer_id) {
            return Err(CoreError::NotFound {
                entity: "customer",
                id: input.customer_id,
            }
            .into());
        }
        if !state.integrations.contains_key(&input.integration_id) {
            return Err(CoreError::NotFound {
                entity: "integration",
                id: input.integration_id,
            }
            .into());
        }

        let key = (input.customer_id, input.integration_id);
        let number = match state.counters.get(&key) {
            Some(last) => last + 1,
            None => next_conversation_number(
                state
                    .conversations_of(input.integration_id, input.customer_id)
                    .len() as i64,
            ),
        };
        state.counters.insert(key, number);

        let conversation = Conversation {
            id: state.allocate_id(),
            customer_id: input.customer_id,
            integration_id: input.integration_id,
            content: input.content.clone(),
            status: ConversationStatus::New,
            number,
            message_count: 0,
            read_user_ids: Vec::new(),
            created_at: now,
        };
        state.conversations.insert(conversation.id, conversation.clone());
        Ok(conversation)
    }

    async fn reopen_conversation(&self, id: DbId) -> WidgetResult<bool> {
        self.check_available()?;
        let mut state = self.state.lock().await;
        Ok(match state.conversations.get_mut(&id) {
            Some(conversation) => {
                conversation.status = ConversationStatus::Open;
                conversation.read_user_ids.clear();
                true
            }
            None => false,
        })
    }

    async fn list_conversations(
        &self,
        integration_id: DbId,
        customer_id: DbId,
    ) -> WidgetResult<Vec<Conversation>> {
        self.check_available()?;
        let state = self.state.lock().await;
        let mut conversations: Vec<Conversation> = state
            .conversations
            .values()
            .filter(|c| c.integration_id == integration_id && c.customer_id == customer_id)
            .cloned()
            .collect();
        conversations.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(conversations)
    }

    async fn create_message(&self, input: &CreateMessage, now: Timestamp) -> WidgetResult<Message> {
        self.check_available()?;
        let mut state = self.state.lock().await;
        if !state.conversations.contains_key(&input.conversation_id) {
            return Err(CoreError::NotFound {
                entity: "conversation",
                id: input.conversation_id,
            }
            .into());
        }
        let message = Message {
            id: state.allocate_id(),
            conversation_id: input.conversation_id,
            customer_id: input.customer_id,
            user_id: input.user_id,
            content: input.content.clone(),
            attachments: input.attachments.clone(),
            engage_data: input.engage_data.clone(),
            internal: input.internal,
            is_customer_read: None,
            created_at: now,
        };
        if let Some(conversation) = state.conversations.get_mut(&input.conversation_id) {
            conversation.message_count += 1;
        }
        state.messages.insert(message.id, message.clone());
        Ok(message)
    }

    async fn find_message(&self, id: DbId) -> WidgetResult<Option<Message>> {
        self.check_available()?;
        Ok(self.state.lock().await.messages.get(&id).cloned())
    }

    async fn list_messages(&self, conversation_id: DbId) -> WidgetResult<Vec<Message>> {
        self.check_available()?;
        let state = self.state.lock().await;
        Ok(state
            .sorted_messages(|m| m.conversation_id == conversation_id && !m.internal)
            .into_iter()
            .cloned()
            .collect())
    }

    async fn mark_customer_read(&self, conversation_id: DbId) -> WidgetResult<Vec<DbId>> {
        self.check_available()?;
        let mut state = self.state.lock().await;
        let mut changed = Vec::new();
        for message in state.messages.values_mut() {
            if message.conversation_id == conversation_id && message.is_unread_by_customer() {
                message.is_customer_read = Some(true);
                changed.push(message.id);
            }
        }
        changed.sort_unstable();
        Ok(changed)
    }

    async fn unread_count(&self, conversation_id: DbId) -> WidgetResult<i64> {
        self.check_available()?;
        let state = self.state.lock().await;
        Ok(state
            .messages
            .values()
            .filter(|m| m.conversation_id == conversation_id && m.is_unread_by_customer())
            .count() as i64)
    }

    async fn unread_count_for_customer(
        &self,
        integration_id: DbId,
        customer_id: DbId,
    ) -> WidgetResult<i64> {
        self.check_available()?;
        let state = self.state.lock().await;
        let conversation_ids = state.conversations_of(integration_id, customer_id);
        Ok(state
            .messages
            .values()
            .filter(|m| conversation_ids.contains(&m.conversation_id) && m.is_unread_by_customer())
            .count() as i64)
    }

    async fn first_unread_for_customer(
        &self,
        integration_id: DbId,
        customer_id: DbId,
    ) -> WidgetResult<Option<Message>> {
        self.check_available()?;
        let state = self.state.lock().await;
        let conversation_ids = state.conversations_of(integration_id, customer_id);
        Ok(state
            .sorted_messages(|m| {
                conversation_ids.contains(&m.conversation_id) && m.is_unread_by_customer()
            })
            .first()
            .map(|m| (*m).clone()))
    }

    async fn last_staff_user_id(&self, conversation_id: DbId) -> WidgetResult<Option<DbId>> {
        self.check_available()?;
        let state = self.state.lock().await;
        Ok(state
            .sorted_messages(|m| m.conversation_id == conversation_id && m.user_id.is_some())
            .last()
            .and_then(|m| m.user_id))
    }

    async fn list_engage_candidates(
        &self,
        brand_id: DbId,
        customer_id: DbId,
    ) -> WidgetResult<Vec<EngageMessage>> {
        self.check_available()?;
        let state = self.state.lock().await;
        let mut candidates: Vec<EngageMessage> = state
            .campaigns
            .values()
            .filter(|c| {
                c.brand_id == brand_id
                    && c.kind == KIND_VISITOR_AUTO
                    && c.method == METHOD_MESSENGER
                    && c.is_live
                    && !c.customer_ids.contains(&customer_id)
            })
            .cloned()
            .collect();
        candidates.sort_by_key(|c| c.id);
        Ok(candidates)
    }

    async fn register_engage_customer(
        &self,
        campaign_id: DbId,
        customer_id: DbId,
    ) -> WidgetResult<bool> {
        self.check_available()?;
        let mut state = self.state.lock().await;
        Ok(match state.campaigns.get_mut(&campaign_id) {
            Some(campaign) if !campaign.customer_ids.contains(&customer_id) => {
                campaign.customer_ids.push(customer_id);
                true
            }
            _ => false,
        })
    }
}
