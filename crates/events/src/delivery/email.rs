//! Outbound email via SMTP.
//!
//! [`Mailer`] wraps the `lettre` async SMTP transport. Each recipient gets
//! a separate plain-text message; a failed recipient is logged and skipped,
//! never retried. Configuration is loaded from environment variables; if
//! `MAIL_SERVICE` is not set, [`EmailConfig::from_env`] returns `None` and
//! no mailer should be constructed.

use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for email delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    /// SMTP transport-level failure (authentication, connection, etc.).
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    /// The recipient or sender address could not be parsed.
    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// The MIME message could not be assembled.
    #[error("Email build error: {0}")]
    Build(String),
}

// ---------------------------------------------------------------------------
// EmailConfig
// ---------------------------------------------------------------------------

/// Default sender address when `MAIL_FROM` is not set.
const DEFAULT_FROM_ADDRESS: &str = "noreply@messenger.local";

/// Configuration for the SMTP mailer.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    /// SMTP relay host of the mail service.
    pub service: String,
    /// Optional SMTP username.
    pub user: Option<String>,
    /// Optional SMTP password.
    pub pass: Option<String>,
    /// Sender used when a message does not name one.
    pub default_from: String,
}

impl EmailConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable       | Required | Default                    |
    /// |----------------|----------|----------------------------|
    /// | `MAIL_SERVICE` | yes      | none                       |
    /// | `MAIL_USER`    | no       | none                       |
    /// | `MAIL_PASS`    | no       | none                       |
    /// | `MAIL_FROM`    | no       | `noreply@messenger.local`  |
    pub fn from_env() -> Option<Self> {
        let service = std::env::var("MAIL_SERVICE").ok()?;
        Some(Self {
            service,
            user: std::env::var("MAIL_USER").ok(),
            pass: std::env::var("MAIL_PASS").ok(),
            default_from: std::env::var("MAIL_FROM")
                .unwrap_or_else(|_| DEFAULT_FROM_ADDRESS.to_string()),
        })
    }
}

// ---------------------------------------------------------------------------
// Mailer
// ---------------------------------------------------------------------------

/// A plain-text email addressed to several recipients.
#[derive(Debug, Clone)]
pub struct OutboundEmail {
    pub to_emails: Vec<String>,
    pub from_email: Option<String>,
    pub title: String,
    pub content: String,
}

/// Sends plain-text emails via SMTP.
pub struct Mailer {
    config: EmailConfig,
}

impl Mailer {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    /// Build the message for a single recipient.
    pub fn build_message(&self, email: &OutboundEmail, to_email: &str) -> Result<Message, EmailError> {
        let from = email
            .from_email
            .as_deref()
            .unwrap_or(&self.config.default_from);

        Message::builder()
            .from(from.parse()?)
            .to(to_email.parse()?)
            .subject(email.title.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(email.content.clone())
            .map_err(|e| EmailError::Build(e.to_string()))
    }

    fn transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>, EmailError> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(&self.config.service)?;
        if let (Some(user), Some(pass)) = (&self.config.user, &self.config.pass) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }
        Ok(builder.build())
    }

    /// Send `email` to each recipient.
    ///
    /// Returns how many recipients were accepted by the server. Failures are
    /// logged per recipient.
    pub async fn send(&self, email: &OutboundEmail) -> usize {
        let transport = match self.transport() {
            Ok(t) => t,
            Err(e) => {
                tracing::error!(error = %e, service = %self.config.service, "Failed to build SMTP transport");
                return 0;
            }
        };

        let mut delivered = 0;
        for to_email in &email.to_emails {
            let result = match self.build_message(email, to_email) {
                Ok(message) => transport.send(message).await.map_err(EmailError::from),
                Err(e) => Err(e),
            };
            match result {
                Ok(_) => {
                    delivered += 1;
                    tracing::info!(to = %to_email, title = %email.title, "Email sent");
                }
                Err(e) => {
                    tracing::error!(to = %to_email, error = %e, "Email delivery failed");
                }
            }
        }
        delivered
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
