#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use messenger_core::conversation::MESSENGER_KIND;
use messenger_core::engage::{BrowserInfo, Location};
use messenger_core::types::DbId;
use messenger_db::models::brand::Brand;
use messenger_db::models::customer::{CreateCustomer, Customer};
use messenger_db::models::integration::Integration;
use messenger_db::models::user::User;
use messenger_events::RecordingPublisher;
use messenger_widget::engage::VisitorContext;
use messenger_widget::geo::{GeoError, LocationResolver};
use messenger_widget::store::{MemoryStore, WidgetStore};
use messenger_widget::{BackgroundTasks, Messenger};

/// Resolver returning a fixed location, or failing when `location` is
/// `None`. Counts calls.
pub struct StubResolver {
    location: Option<Location>,
    calls: AtomicUsize,
}

impl StubResolver {
    pub fn at(city: &str, country: &str) -> Self {
        Self {
            location: Some(Location {
                city: Some(city.to_string()),
                country: Some(country.to_string()),
            }),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            location: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LocationResolver for StubResolver {
    async fn resolve(&self, _remote_address: Option<&str>) -> Result<Location, GeoError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.location.clone().ok_or(GeoError::MissingAddress)
    }
}

pub struct TestWidget {
    pub store: Arc<MemoryStore>,
    pub publisher: Arc<RecordingPublisher>,
    pub resolver: Arc<StubResolver>,
    pub messenger: Messenger,
    pub brand: Brand,
    pub integration: Integration,
    pub sender: User,
}

impl TestWidget {
    pub async fn new() -> Self {
        Self::with_resolver(StubResolver::at("Ulaanbaatar", "MN")).await
    }

    pub async fn with_resolver(resolver: StubResolver) -> Self {
        let store = Arc::new(MemoryStore::new());
        let brand = store.insert_brand("acme").await;
        let integration = store.insert_integration(brand.id, MESSENGER_KIND).await;
        let sender = store
            .insert_user(Some("Bo"), Some("Support lead"), Some("bo@acme.test"))
            .await;
        let publisher = Arc::new(RecordingPublisher::new());
        let resolver = Arc::new(resolver);
        let messenger = Messenger::new(
            store.clone(),
            publisher.clone(),
            resolver.clone(),
            BackgroundTasks::new(),
        );
        Self {
            store,
            publisher,
            resolver,
            messenger,
            brand,
            integration,
            sender,
        }
    }

    pub async fn anonymous_customer(&self, name: Option<&str>) -> Customer {
        self.store
            .create_customer(
                &CreateCustomer {
                    integration_id: self.integration.id,
                    email: None,
                    is_user: false,
                    name: name.map(str::to_string),
                    custom_data: serde_json::json!({}),
                },
                Utc::now(),
            )
            .await
            .expect("customer")
    }

    pub fn visitor(&self, customer: &Customer, language: Option<&str>) -> VisitorContext {
        VisitorContext {
            brand_code: self.brand.code.clone(),
            customer: customer.clone(),
            integration: self.integration.clone(),
            browser_info: BrowserInfo {
                browser_language: language.map(str::to_string),
                ..Default::default()
            },
            remote_address: Some("203.0.113.9".to_string()),
        }
    }

    pub async fn conversations_of(&self, customer_id: DbId) -> usize {
        self.store
            .list_conversations(self.integration.id, customer_id)
            .await
            .expect("conversations")
            .len()
    }
}
