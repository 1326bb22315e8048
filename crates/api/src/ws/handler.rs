use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use messenger_core::types::DbId;
use serde::Deserialize;

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct WsParams {
    /// Widget customer this socket belongs to.
    pub customer_id: Option<DbId>,
}

/// GET /api/v1/ws -- upgrade to a live push connection.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsParams>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state, params.customer_id))
}

/// Drive one connection: a writer task forwards pushes from the manager
/// channel while this task reads until the client goes away.
async fn handle_socket(socket: WebSocket, state: AppState, customer_id: Option<DbId>) {
    let conn_id = uuid::Uuid::new_v4().to_string();
    tracing::info!(conn_id = %conn_id, customer_id = ?customer_id, "WebSocket connected");

    let mut rx = state.ws_manager.add(conn_id.clone(), customer_id).await;
    let (mut sink, mut stream) = socket.split();

    let sender_conn_id = conn_id.clone();
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sink.send(msg).await.is_err() {
                tracing::debug!(conn_id = %sender_conn_id, "WebSocket sink closed");
                break;
            }
        }
    });

    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Close(_)) => break,
            Ok(Message::Pong(_)) => {
                tracing::trace!(conn_id = %conn_id, "Pong received");
            }
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(conn_id = %conn_id, error = %e, "WebSocket receive error");
                break;
            }
        }
    }

    send_task.abort();
    if let Some(customer_id) = state.ws_manager.remove(&conn_id).await {
        // Another tab may still hold the widget open.
        if !state.ws_manager.is_customer_connected(customer_id).await {
            state.messenger.disconnect(customer_id).await;
        }
    }
    tracing::info!(conn_id = %conn_id, "WebSocket disconnected");
}
