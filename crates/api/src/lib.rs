//! Messenger widget HTTP and WebSocket server.
//!
//! Exposes the building blocks (config, state, error handling, routes,
//! WebSocket push) so integration tests and the binary entrypoint share
//! them.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod notifications;
pub mod response;
pub mod router;
pub mod routes;
pub mod state;
pub mod ws;
