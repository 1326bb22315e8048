//! Event-to-socket routing.
//!
//! [`NotificationRouter`] subscribes to the [`EventBus`](messenger_events::EventBus)
//! and pushes each event to the WebSockets that care about it:
//!
//! - `new-message` goes to the sockets of the message's customer and to
//!   every staff socket.
//! - `notification` goes to everyone.

use std::sync::Arc;

use axum::extract::ws::Message;
use messenger_events::{MessengerEvent, Topic};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::ws::WsManager;

pub struct NotificationRouter {
    ws_manager: Arc<WsManager>,
}

impl NotificationRouter {
    pub fn new(ws_manager: Arc<WsManager>) -> Self {
        Self { ws_manager }
    }

    /// Route events until the bus closes or `cancel` fires.
    pub async fn run(
        self,
        mut receiver: broadcast::Receiver<MessengerEvent>,
        cancel: CancellationToken,
    ) {
        loop {
            let received = tokio::select! {
                () = cancel.cancelled() => {
                    tracing::info!("Notification router cancelled");
                    break;
                }
                received = receiver.recv() => received,
            };
            match received {
                Ok(event) => {
                    self.route_event(&event).await;
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Notification router lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, notification router shutting down");
                    break;
                }
            }
        }
    }

    /// Push one event. Returns the number of sockets it was sent to.
    pub async fn route_event(&self, event: &MessengerEvent) -> usize {
        let text = match serde_json::to_string(event) {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(error = %e, topic = %event.topic, "Failed to serialize event");
                return 0;
            }
        };
        let message = Message::Text(text.into());

        match event.topic {
            Topic::NewMessage => {
                let mut sent = self.ws_manager.send_to_staff(message.clone()).await;
                if let Some(customer_id) = event.customer_id {
                    sent += self
                        .ws_manager
                        .send_to_customer(customer_id, message)
                        .await;
                }
                sent
            }
            Topic::Notification => {
                let count = self.ws_manager.connection_count().await;
                self.ws_manager.broadcast(message).await;
                count
            }
        }
    }
}
