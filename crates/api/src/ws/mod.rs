//! WebSocket live push.
//!
//! The widget opens `/api/v1/ws?customer_id=...`; staff dashboards connect
//! without a customer id. Connections are receive-only from the server's
//! point of view: inbound frames other than Close are ignored.

mod handler;
mod heartbeat;
pub mod manager;

pub use handler::ws_handler;
pub use heartbeat::start_heartbeat;
pub use manager::WsManager;
