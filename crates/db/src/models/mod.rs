//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - `Deserialize` DTOs for inserts and partial updates where needed

pub mod brand;
pub mod conversation;
pub mod customer;
pub mod engage_message;
pub mod integration;
pub mod message;
pub mod user;
