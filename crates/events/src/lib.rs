//! Messenger event bus and outbound delivery.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`MessengerEvent`]: envelope published on one of two [`Topic`]s.
//! - [`EventPublisher`]: the publishing capability handed to services, so
//!   tests can swap in a recording double.
//! - [`RecordingPublisher`]: keeps events in memory for tests and demos.
//! - [`delivery`]: outbound email.

pub mod bus;
pub mod delivery;
pub mod recording;

pub use bus::{EventBus, EventPublisher, MessengerEvent, Topic};
pub use delivery::email::{EmailConfig, Mailer, OutboundEmail};
pub use recording::RecordingPublisher;
