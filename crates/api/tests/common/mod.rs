#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use messenger_core::conversation::MESSENGER_KIND;
use messenger_core::engage::Location;
use messenger_db::models::integration::Integration;
use messenger_db::models::user::User;
use messenger_events::EventBus;
use messenger_widget::geo::{GeoError, LocationResolver};
use messenger_widget::store::MemoryStore;
use messenger_widget::{BackgroundTasks, Messenger};
use tower::ServiceExt;

use messenger_api::config::ServerConfig;
use messenger_api::router::build_app_router;
use messenger_api::state::AppState;
use messenger_api::ws::WsManager;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        trust_proxy: false,
    }
}

/// Resolver that never touches the network.
pub struct FixedResolver;

#[async_trait]
impl LocationResolver for FixedResolver {
    async fn resolve(&self, _remote_address: Option<&str>) -> Result<Location, GeoError> {
        Ok(Location {
            city: Some("Ulaanbaatar".to_string()),
            country: Some("MN".to_string()),
        })
    }
}

/// An app over an in-memory store seeded with brand `acme`, its messenger
/// integration and one staff user.
pub struct TestApp {
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    pub integration: Integration,
    pub staff: User,
}

impl TestApp {
    pub async fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let brand = store.insert_brand("acme").await;
        let integration = store.insert_integration(brand.id, MESSENGER_KIND).await;
        let staff = store
            .insert_user(Some("Bo"), Some("Support lead"), Some("bo@acme.test"))
            .await;

        let event_bus = Arc::new(EventBus::default());
        let messenger = Arc::new(Messenger::new(
            store.clone(),
            event_bus.clone(),
            Arc::new(FixedResolver),
            BackgroundTasks::new(),
        ));

        let state = AppState {
            messenger,
            config: Arc::new(test_config()),
            ws_manager: Arc::new(WsManager::new()),
            event_bus,
            mailer: None,
        };

        Self {
            state,
            store,
            integration,
            staff,
        }
    }

    /// Build the full application router with all middleware layers.
    pub fn router(&self) -> Router {
        build_app_router(self.state.clone(), &test_config())
    }
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_empty(app: Router, uri: &str) -> Response {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}
