//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async query methods
//! that accept `&PgPool` as the first argument.

pub mod brand_repo;
pub mod conversation_repo;
pub mod customer_repo;
pub mod engage_message_repo;
pub mod integration_repo;
pub mod message_repo;
pub mod user_repo;

pub use brand_repo::BrandRepo;
pub use conversation_repo::ConversationRepo;
pub use customer_repo::CustomerRepo;
pub use engage_message_repo::EngageMessageRepo;
pub use integration_repo::IntegrationRepo;
pub use message_repo::MessageRepo;
pub use user_repo::UserRepo;
