use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::ws::Message;
use messenger_core::types::{DbId, Timestamp};
use tokio::sync::{mpsc, RwLock};

/// Channel sender half for pushing messages to a WebSocket connection.
pub type WsSender = mpsc::UnboundedSender<Message>;

pub struct WsConnection {
    /// Widget customer bound to this socket; `None` for staff clients.
    pub customer_id: Option<DbId>,
    pub sender: WsSender,
    pub connected_at: Timestamp,
}

/// Registry of live WebSocket connections.
///
/// Wrapped in `Arc` and shared between the upgrade handler, the
/// notification router and the heartbeat.
pub struct WsManager {
    connections: RwLock<HashMap<String, WsConnection>>,
}

impl WsManager {
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
        }
    }

    /// Register a connection and return the receiver the socket writer
    /// drains.
    pub async fn add(
        &self,
        conn_id: String,
        customer_id: Option<DbId>,
    ) -> mpsc::UnboundedReceiver<Message> {
        let (tx, rx) = mpsc::unbounded_channel();
        let conn = WsConnection {
            customer_id,
            sender: tx,
            connected_at: chrono::Utc::now(),
        };
        self.connections.write().await.insert(conn_id, conn);
        rx
    }

    /// Remove a connection, returning the customer it was bound to.
    pub async fn remove(&self, conn_id: &str) -> Option<DbId> {
        self.connections
            .write()
            .await
            .remove(conn_id)
            .and_then(|conn| conn.customer_id)
    }

    /// Whether the customer still has another open socket (several tabs).
    pub async fn is_customer_connected(&self, customer_id: DbId) -> bool {
        self.connections
            .read()
            .await
            .values()
            .any(|conn| conn.customer_id == Some(customer_id))
    }

    /// Send to every connection. Closed channels are skipped; their sockets
    /// clean up on their own.
    pub async fn broadcast(&self, message: Message) {
        let conns = self.connections.read().await;
        for conn in conns.values() {
            let _ = conn.sender.send(message.clone());
        }
    }

    /// Send to every socket bound to `customer_id`. Returns how many.
    pub async fn send_to_customer(&self, customer_id: DbId, message: Message) -> usize {
        self.send_where(|conn| conn.customer_id == Some(customer_id), message)
            .await
    }

    /// Send to every connection not bound to a customer.
    pub async fn send_to_staff(&self, message: Message) -> usize {
        self.send_where(|conn| conn.customer_id.is_none(), message)
            .await
    }

    async fn send_where(&self, filter: impl Fn(&WsConnection) -> bool, message: Message) -> usize {
        let conns = self.connections.read().await;
        let mut count = 0;
        for conn in conns.values().filter(|conn| filter(conn)) {
            if conn.sender.send(message.clone()).is_ok() {
                count += 1;
            }
        }
        count
    }

    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Send a Close frame to every connection, then clear the map.
    pub async fn shutdown_all(&self) {
        let mut conns = self.connections.write().await;
        let count = conns.len();
        for conn in conns.values() {
            let _ = conn.sender.send(Message::Close(None));
        }
        conns.clear();
        tracing::info!(count, "Closed all WebSocket connections");
    }

    /// Send a Ping frame to every connection.
    pub async fn ping_all(&self) {
        let conns = self.connections.read().await;
        for conn in conns.values() {
            let _ = conn.sender.send(Message::Ping(Bytes::new()));
        }
    }
}

impl Default for WsManager {
    fn default() -> Self {
        Self::new()
    }
}
