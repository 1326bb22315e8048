//! Messenger widget services.
//!
//! The widget talks to four cooperating components:
//!
//! - [`session::SessionManager`] reconciles a widget connect with a stored
//!   customer.
//! - [`lifecycle::ConversationLifecycle`] creates, numbers and reopens
//!   conversations.
//! - [`ingestion::MessageIngestion`] stores messages and publishes change
//!   events.
//! - [`engage::EngageEngine`] auto-starts conversations with anonymous
//!   visitors who match a live campaign.
//!
//! [`Messenger`] ties them together behind the operations the HTTP layer
//! exposes. All persistence goes through [`store::WidgetStore`].

pub mod config;
pub mod dto;
pub mod engage;
pub mod error;
pub mod geo;
pub mod ingestion;
pub mod lifecycle;
pub mod messenger;
pub mod session;
pub mod store;
pub mod tasks;

pub use config::{DeployMode, WidgetConfig};
pub use error::{WidgetError, WidgetResult};
pub use messenger::Messenger;
pub use tasks::BackgroundTasks;
