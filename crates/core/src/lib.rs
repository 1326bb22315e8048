//! Domain logic for the messenger widget backend.
//!
//! Everything in this crate is pure: no I/O, no database, no network.
//! Storage and transport live in `messenger-db`, `messenger-events` and
//! `messenger-widget`.

pub mod availability;
pub mod conversation;
pub mod engage;
pub mod error;
pub mod session;
pub mod template;
pub mod types;
