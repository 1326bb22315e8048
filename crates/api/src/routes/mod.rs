pub mod health;
pub mod messenger;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;
use crate::ws;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /ws                 WebSocket push (?customer_id for widget sockets)
/// /messenger/...      widget operations, see [`messenger::router`]
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/ws", get(ws::ws_handler))
        .nest("/messenger", messenger::router())
}
