use std::sync::Arc;

use axum::extract::FromRef;
use messenger_events::{EventBus, Mailer};
use messenger_widget::Messenger;

use crate::config::ServerConfig;
use crate::ws::WsManager;

/// Shared application state available to all handlers via `State<AppState>`.
///
/// Cheap to clone: everything inside is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Widget operations over the configured store.
    pub messenger: Arc<Messenger>,
    pub config: Arc<ServerConfig>,
    /// WebSocket connection registry.
    pub ws_manager: Arc<WsManager>,
    /// Bus the messenger publishes on; the notification router subscribes.
    pub event_bus: Arc<EventBus>,
    /// Outbound email, absent when `MAIL_SERVICE` is not configured.
    pub mailer: Option<Arc<Mailer>>,
}

/// Whether forwarding headers may be believed for the visitor address.
#[derive(Debug, Clone, Copy)]
pub struct TrustProxy(pub bool);

impl FromRef<AppState> for TrustProxy {
    fn from_ref(state: &AppState) -> Self {
        Self(state.config.trust_proxy)
    }
}
