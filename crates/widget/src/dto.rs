//! Request and response shapes of the widget operations.

use messenger_core::engage::BrowserInfo;
use messenger_core::types::DbId;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Widget connect payload.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ConnectRequest {
    #[validate(length(min = 1, message = "brand_code must not be empty"))]
    pub brand_code: String,
    #[validate(email(message = "email is not a valid address"))]
    pub email: Option<String>,
    #[serde(default)]
    pub is_user: bool,
    pub name: Option<String>,
    /// Arbitrary customer data; `null` or missing is stored as `{}`.
    #[serde(default)]
    pub data: serde_json::Value,
    #[serde(default)]
    pub browser_info: BrowserInfo,
    /// Customer id the widget remembered from a previous visit.
    pub cached_customer_id: Option<DbId>,
}

impl ConnectRequest {
    /// `data` with `null` replaced by an empty object.
    pub fn custom_data(&self) -> serde_json::Value {
        match &self.data {
            serde_json::Value::Null => serde_json::Value::Object(Default::default()),
            other => other.clone(),
        }
    }
}

/// Widget connect result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectResponse {
    pub integration_id: DbId,
    pub ui_options: serde_json::Value,
    pub messenger_data: serde_json::Value,
    pub customer_id: DbId,
}

/// A customer message sent from the widget.
///
/// Either the text or the attachments may be empty, not both.
#[derive(Debug, Clone, Deserialize, Validate)]
#[validate(schema(function = "validate_message_content"))]
pub struct InsertMessageRequest {
    pub integration_id: DbId,
    pub customer_id: DbId,
    /// Absent for the first message of a new conversation.
    pub conversation_id: Option<DbId>,
    #[serde(default)]
    pub message: String,
    pub attachments: Option<serde_json::Value>,
}

impl InsertMessageRequest {
    pub fn has_attachments(&self) -> bool {
        match &self.attachments {
            None | Some(serde_json::Value::Null) => false,
            Some(serde_json::Value::Array(items)) => !items.is_empty(),
            Some(serde_json::Value::Object(fields)) => !fields.is_empty(),
            Some(_) => true,
        }
    }
}

fn validate_message_content(req: &InsertMessageRequest) -> Result<(), ValidationError> {
    if req.message.trim().is_empty() && !req.has_attachments() {
        let mut error = ValidationError::new("empty_message");
        error.message = Some("message or attachments must not be empty".into());
        return Err(error);
    }
    Ok(())
}

/// A customer opening a conversation explicitly with its first message.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct StartConversationRequest {
    pub integration_id: DbId,
    pub customer_id: DbId,
    #[validate(length(min = 1, message = "message must not be empty"))]
    pub message: String,
}

/// "Start over": a fresh customer on the brand's messenger integration.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct EndConversationRequest {
    #[validate(length(min = 1, message = "brand_code must not be empty"))]
    pub brand_code: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SaveEmailRequest {
    pub customer_id: DbId,
    #[validate(email(message = "email is not a valid address"))]
    pub email: String,
}
