//! The widget's operation surface.
//!
//! Mutations (connect, insert message, mark read, ...) are the error
//! boundary: a failure is logged and turned into "no result" so the widget
//! never sees a storage error. Read queries return [`WidgetResult`] and
//! leave the decision to the caller.

use std::sync::Arc;

use chrono::Utc;
use messenger_core::availability::MessengerAvailability;
use messenger_core::types::{DbId, Timestamp};
use messenger_db::models::conversation::Conversation;
use messenger_db::models::customer::CreateCustomer;
use messenger_db::models::integration::Integration;
use messenger_db::models::message::Message;
use messenger_db::models::user::User;
use messenger_events::EventPublisher;

use crate::dto::{ConnectRequest, ConnectResponse, EndConversationRequest, InsertMessageRequest};
use crate::engage::{EngageEngine, VisitorContext};
use crate::error::WidgetResult;
use crate::geo::LocationResolver;
use crate::ingestion::MessageIngestion;
use crate::lifecycle::ConversationLifecycle;
use crate::session::SessionManager;
use crate::store::WidgetStore;
use crate::tasks::BackgroundTasks;

pub struct Messenger {
    store: Arc<dyn WidgetStore>,
    tasks: BackgroundTasks,
    sessions: SessionManager,
    ingestion: MessageIngestion,
    engage: EngageEngine,
}

impl Messenger {
    pub fn new(
        store: Arc<dyn WidgetStore>,
        publisher: Arc<dyn EventPublisher>,
        resolver: Arc<dyn LocationResolver>,
        tasks: BackgroundTasks,
    ) -> Self {
        let sessions = SessionManager::new(Arc::clone(&store));
        let lifecycle = ConversationLifecycle::new(Arc::clone(&store), tasks.clone());
        let ingestion = MessageIngestion::new(Arc::clone(&store), lifecycle.clone(), publisher);
        let engage = EngageEngine::new(
            Arc::clone(&store),
            lifecycle,
            ingestion.clone(),
            resolver,
        );
        Self {
            store,
            tasks,
            sessions,
            ingestion,
            engage,
        }
    }

    pub fn tasks(&self) -> &BackgroundTasks {
        &self.tasks
    }

    pub fn engage(&self) -> &EngageEngine {
        &self.engage
    }

    pub async fn ping(&self) -> WidgetResult<()> {
        self.store.ping().await
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Identify the visitor behind a widget connect.
    ///
    /// Anonymous visitors additionally get an engage run in the background;
    /// its outcome never affects the response.
    pub async fn connect(
        &self,
        request: &ConnectRequest,
        remote_address: Option<String>,
    ) -> Option<ConnectResponse> {
        let connected = match self.sessions.connect(request).await {
            Ok(connected) => connected?,
            Err(e) => {
                tracing::error!(brand_code = %request.brand_code, error = %e, "Connect failed");
                return None;
            }
        };

        let response = ConnectResponse {
            integration_id: connected.integration.id,
            ui_options: connected.integration.ui_options.clone(),
            messenger_data: connected.integration.messenger_data.clone(),
            customer_id: connected.customer.id,
        };

        if connected.customer.is_anonymous() {
            let engine = self.engage.clone();
            let visitor = VisitorContext {
                brand_code: request.brand_code.clone(),
                customer: connected.customer,
                integration: connected.integration,
                browser_info: request.browser_info.clone(),
                remote_address,
            };
            self.tasks.spawn("engage_run", async move {
                engine.run(&visitor).await.map(|_| ())
            });
        }

        Some(response)
    }

    pub async fn insert_message(&self, request: &InsertMessageRequest) -> Option<Message> {
        match self.ingestion.insert_message(request).await {
            Ok(message) => Some(message),
            Err(e) => {
                tracing::error!(
                    customer_id = request.customer_id,
                    conversation_id = ?request.conversation_id,
                    error = %e,
                    "Insert message failed"
                );
                None
            }
        }
    }

    /// Mark staff messages read; the ids that changed.
    pub async fn read_conversation_messages(&self, conversation_id: DbId) -> Option<Vec<DbId>> {
        match self.ingestion.read_conversation_messages(conversation_id).await {
            Ok(ids) => Some(ids),
            Err(e) => {
                tracing::error!(conversation_id, error = %e, "Mark read failed");
                None
            }
        }
    }

    /// Open a new conversation whose first message is `content`.
    pub async fn start_conversation(
        &self,
        integration_id: DbId,
        customer_id: DbId,
        content: &str,
    ) -> Option<(Conversation, Message)> {
        self.ingestion
            .create_conversation_with_message(integration_id, customer_id, content)
            .await
            .map_err(|e| {
                tracing::error!(customer_id, error = %e, "Start conversation failed");
            })
            .ok()
    }

    /// Start over with a fresh customer on the brand's messenger
    /// integration. Returns the new customer id.
    pub async fn end_conversation(&self, request: &EndConversationRequest) -> Option<DbId> {
        self.start_over(request).await.unwrap_or_else(|e| {
            tracing::error!(brand_code = %request.brand_code, error = %e, "End conversation failed");
            None
        })
    }

    async fn start_over(&self, request: &EndConversationRequest) -> WidgetResult<Option<DbId>> {
        let Some(integration) = self.sessions.resolve_integration(&request.brand_code).await? else {
            return Ok(None);
        };
        let custom_data = match &request.data {
            serde_json::Value::Null => serde_json::json!({}),
            other => other.clone(),
        };
        let customer = self
            .store
            .create_customer(
                &CreateCustomer {
                    integration_id: integration.id,
                    email: None,
                    is_user: false,
                    name: None,
                    custom_data,
                },
                Utc::now(),
            )
            .await?;
        tracing::info!(customer_id = customer.id, "Customer started over");
        Ok(Some(customer.id))
    }

    /// Attach an email to a customer. `false` when nothing was updated.
    pub async fn save_customer_email(&self, customer_id: DbId, email: &str) -> bool {
        self.sessions
            .save_email(customer_id, email)
            .await
            .unwrap_or_else(|e| {
                tracing::error!(customer_id, error = %e, "Save customer email failed");
                false
            })
    }

    /// Mark a customer inactive after the widget went away.
    pub async fn disconnect(&self, customer_id: DbId) -> bool {
        self.sessions.disconnect(customer_id).await.unwrap_or_else(|e| {
            tracing::error!(customer_id, error = %e, "Disconnect failed");
            false
        })
    }

    /// Publish an existing message again, as if it was just inserted.
    pub async fn simulate_insert_message(&self, message_id: DbId) -> Option<Message> {
        match self.ingestion.republish(message_id).await {
            Ok(message) => message,
            Err(e) => {
                tracing::error!(message_id, error = %e, "Simulate insert message failed");
                None
            }
        }
    }

    pub fn notify(&self) {
        self.ingestion.notify();
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub async fn messenger_integration(&self, brand_code: &str) -> WidgetResult<Option<Integration>> {
        self.sessions.resolve_integration(brand_code).await
    }

    /// Whether the integration's staff are online now. `None` for an
    /// unknown integration.
    pub async fn is_messenger_online(&self, integration_id: DbId) -> WidgetResult<Option<bool>> {
        self.is_messenger_online_at(integration_id, Utc::now()).await
    }

    pub async fn is_messenger_online_at(
        &self,
        integration_id: DbId,
        now: Timestamp,
    ) -> WidgetResult<Option<bool>> {
        let Some(integration) = self.store.find_integration(integration_id).await? else {
            return Ok(None);
        };
        let online = match MessengerAvailability::from_messenger_data(&integration.messenger_data) {
            Ok(availability) => availability.is_online_at(now),
            Err(e) => {
                tracing::warn!(
                    integration_id,
                    error = %e,
                    "Unreadable availability settings, reporting offline"
                );
                false
            }
        };
        Ok(Some(online))
    }

    /// A customer's conversations, newest first.
    pub async fn conversations(
        &self,
        integration_id: DbId,
        customer_id: DbId,
    ) -> WidgetResult<Vec<Conversation>> {
        self.store.list_conversations(integration_id, customer_id).await
    }

    pub async fn conversation(&self, conversation_id: DbId) -> WidgetResult<Option<Conversation>> {
        self.store.find_conversation(conversation_id).await
    }

    /// Non-internal messages, oldest first.
    pub async fn messages(&self, conversation_id: DbId) -> WidgetResult<Vec<Message>> {
        self.store.list_messages(conversation_id).await
    }

    pub async fn unread_count(&self, conversation_id: DbId) -> WidgetResult<i64> {
        self.store.unread_count(conversation_id).await
    }

    pub async fn total_unread_count(
        &self,
        integration_id: DbId,
        customer_id: DbId,
    ) -> WidgetResult<i64> {
        self.store
            .unread_count_for_customer(integration_id, customer_id)
            .await
    }

    pub async fn last_unread_message(
        &self,
        integration_id: DbId,
        customer_id: DbId,
    ) -> WidgetResult<Option<Message>> {
        self.store
            .first_unread_for_customer(integration_id, customer_id)
            .await
    }

    /// The staff member who last wrote in the conversation.
    pub async fn conversation_last_staff(&self, conversation_id: DbId) -> WidgetResult<Option<User>> {
        match self.store.last_staff_user_id(conversation_id).await? {
            Some(user_id) => self.store.find_user(user_id).await,
            None => Ok(None),
        }
    }
}
