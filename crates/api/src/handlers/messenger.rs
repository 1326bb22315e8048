//! Handlers for the `/messenger` resource used by the embedded widget.
//!
//! Mutations answer `{ "data": null }` when the operation degraded to no
//! result (unknown brand, storage failure); the widget treats that as
//! "try again later". Malformed bodies are rejected with 400.

use axum::extract::{Path, Query, State};
use axum::Json;
use messenger_core::error::CoreError;
use messenger_core::types::DbId;
use messenger_db::models::conversation::Conversation;
use messenger_db::models::integration::Integration;
use messenger_db::models::message::Message;
use messenger_db::models::user::User;
use messenger_events::OutboundEmail;
use messenger_widget::dto::{
    ConnectRequest, ConnectResponse, EndConversationRequest, InsertMessageRequest,
    SaveEmailRequest, StartConversationRequest,
};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidateEmail};

use crate::error::{AppError, AppResult};
use crate::middleware::remote_addr::RemoteAddress;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Query / response types
// ---------------------------------------------------------------------------

/// Identifies one customer on one integration.
#[derive(Debug, Deserialize)]
pub struct CustomerQuery {
    pub integration_id: DbId,
    pub customer_id: DbId,
}

#[derive(Debug, Serialize)]
pub struct MarkReadResponse {
    pub updated_ids: Vec<DbId>,
}

#[derive(Debug, Serialize)]
pub struct UnreadCountResponse {
    pub count: i64,
}

/// Unread state across all of a customer's conversations.
#[derive(Debug, Serialize)]
pub struct UnreadSummary {
    pub total: i64,
    pub last_message: Option<Message>,
}

#[derive(Debug, Serialize)]
pub struct StartedConversation {
    pub conversation: Conversation,
    pub message: Message,
}

#[derive(Debug, Serialize)]
pub struct UpdatedResponse {
    pub updated: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SendEmailRequest {
    #[validate(length(min = 1, message = "at least one recipient is required"))]
    pub to_emails: Vec<String>,
    #[validate(email(message = "from_email is not a valid address"))]
    pub from_email: Option<String>,
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub title: String,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct QueuedResponse {
    pub recipients: usize,
}

// ---------------------------------------------------------------------------
// Mutations
// ---------------------------------------------------------------------------

/// POST /api/v1/messenger/connect
pub async fn connect(
    State(state): State<AppState>,
    RemoteAddress(remote_address): RemoteAddress,
    Json(input): Json<ConnectRequest>,
) -> AppResult<Json<DataResponse<Option<ConnectResponse>>>> {
    input.validate()?;
    let data = state.messenger.connect(&input, remote_address).await;
    Ok(Json(DataResponse { data }))
}

/// POST /api/v1/messenger/messages
pub async fn insert_message(
    State(state): State<AppState>,
    Json(input): Json<InsertMessageRequest>,
) -> AppResult<Json<DataResponse<Option<Message>>>> {
    input.validate()?;
    let data = state.messenger.insert_message(&input).await;
    Ok(Json(DataResponse { data }))
}

/// POST /api/v1/messenger/conversations
pub async fn start_conversation(
    State(state): State<AppState>,
    Json(input): Json<StartConversationRequest>,
) -> AppResult<Json<DataResponse<Option<StartedConversation>>>> {
    input.validate()?;
    let data = state
        .messenger
        .start_conversation(input.integration_id, input.customer_id, &input.message)
        .await
        .map(|(conversation, message)| StartedConversation {
            conversation,
            message,
        });
    Ok(Json(DataResponse { data }))
}

/// POST /api/v1/messenger/conversations/{id}/read
pub async fn read_conversation_messages(
    State(state): State<AppState>,
    Path(conversation_id): Path<DbId>,
) -> Json<DataResponse<Option<MarkReadResponse>>> {
    let data = state
        .messenger
        .read_conversation_messages(conversation_id)
        .await
        .map(|updated_ids| MarkReadResponse { updated_ids });
    Json(DataResponse { data })
}

/// POST /api/v1/messenger/end-conversation
///
/// Returns the id of the fresh customer.
pub async fn end_conversation(
    State(state): State<AppState>,
    Json(input): Json<EndConversationRequest>,
) -> AppResult<Json<DataResponse<Option<DbId>>>> {
    input.validate()?;
    let data = state.messenger.end_conversation(&input).await;
    Ok(Json(DataResponse { data }))
}

/// POST /api/v1/messenger/customers/email
pub async fn save_customer_email(
    State(state): State<AppState>,
    Json(input): Json<SaveEmailRequest>,
) -> AppResult<Json<DataResponse<UpdatedResponse>>> {
    input.validate()?;
    let updated = state
        .messenger
        .save_customer_email(input.customer_id, &input.email)
        .await;
    Ok(Json(DataResponse {
        data: UpdatedResponse { updated },
    }))
}

/// POST /api/v1/messenger/customers/{id}/disconnect
pub async fn disconnect(
    State(state): State<AppState>,
    Path(customer_id): Path<DbId>,
) -> Json<DataResponse<UpdatedResponse>> {
    let updated = state.messenger.disconnect(customer_id).await;
    Json(DataResponse {
        data: UpdatedResponse { updated },
    })
}

/// POST /api/v1/messenger/messages/{id}/simulate
pub async fn simulate_insert_message(
    State(state): State<AppState>,
    Path(message_id): Path<DbId>,
) -> Json<DataResponse<Option<Message>>> {
    let data = state.messenger.simulate_insert_message(message_id).await;
    Json(DataResponse { data })
}

/// POST /api/v1/messenger/notify
pub async fn notify(State(state): State<AppState>) -> Json<DataResponse<bool>> {
    state.messenger.notify();
    Json(DataResponse { data: true })
}

/// POST /api/v1/messenger/email
///
/// Queues a plain-text email; delivery happens in the background and
/// failures are only logged.
pub async fn send_email(
    State(state): State<AppState>,
    Json(input): Json<SendEmailRequest>,
) -> AppResult<Json<DataResponse<QueuedResponse>>> {
    input.validate()?;
    if let Some(bad) = input.to_emails.iter().find(|to| !to.validate_email()) {
        return Err(AppError::BadRequest(format!("'{bad}' is not a valid address")));
    }
    let mailer = state
        .mailer
        .clone()
        .ok_or_else(|| AppError::Unavailable("email is not configured".to_string()))?;

    let email = OutboundEmail {
        to_emails: input.to_emails,
        from_email: input.from_email,
        title: input.title,
        content: input.content,
    };
    let recipients = email.to_emails.len();
    state.messenger.tasks().spawn("send_email", async move {
        mailer.send(&email).await;
        Ok::<(), std::convert::Infallible>(())
    });

    Ok(Json(DataResponse {
        data: QueuedResponse { recipients },
    }))
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// GET /api/v1/messenger/integrations/{brand_code}
pub async fn get_integration(
    State(state): State<AppState>,
    Path(brand_code): Path<String>,
) -> AppResult<Json<DataResponse<Integration>>> {
    let integration = state
        .messenger
        .messenger_integration(&brand_code)
        .await?
        .ok_or(CoreError::UnknownCode {
            entity: "brand",
            code: brand_code,
        })?;
    Ok(Json(DataResponse { data: integration }))
}

/// GET /api/v1/messenger/integrations/{id}/online
pub async fn is_messenger_online(
    State(state): State<AppState>,
    Path(integration_id): Path<DbId>,
) -> AppResult<Json<DataResponse<bool>>> {
    let online = state
        .messenger
        .is_messenger_online(integration_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "integration",
            id: integration_id,
        })?;
    Ok(Json(DataResponse { data: online }))
}

/// GET /api/v1/messenger/conversations?integration_id=&customer_id=
pub async fn list_conversations(
    State(state): State<AppState>,
    Query(params): Query<CustomerQuery>,
) -> AppResult<Json<DataResponse<Vec<Conversation>>>> {
    let data = state
        .messenger
        .conversations(params.integration_id, params.customer_id)
        .await?;
    Ok(Json(DataResponse { data }))
}

/// GET /api/v1/messenger/conversations/{id}
pub async fn get_conversation(
    State(state): State<AppState>,
    Path(conversation_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Conversation>>> {
    let conversation = state
        .messenger
        .conversation(conversation_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "conversation",
            id: conversation_id,
        })?;
    Ok(Json(DataResponse { data: conversation }))
}

/// GET /api/v1/messenger/conversations/{id}/messages
pub async fn list_messages(
    State(state): State<AppState>,
    Path(conversation_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<Message>>>> {
    let data = state.messenger.messages(conversation_id).await?;
    Ok(Json(DataResponse { data }))
}

/// GET /api/v1/messenger/conversations/{id}/unread-count
pub async fn unread_count(
    State(state): State<AppState>,
    Path(conversation_id): Path<DbId>,
) -> AppResult<Json<DataResponse<UnreadCountResponse>>> {
    let count = state.messenger.unread_count(conversation_id).await?;
    Ok(Json(DataResponse {
        data: UnreadCountResponse { count },
    }))
}

/// GET /api/v1/messenger/conversations/{id}/last-staff
pub async fn conversation_last_staff(
    State(state): State<AppState>,
    Path(conversation_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Option<User>>>> {
    let data = state
        .messenger
        .conversation_last_staff(conversation_id)
        .await?;
    Ok(Json(DataResponse { data }))
}

/// GET /api/v1/messenger/unread?integration_id=&customer_id=
pub async fn unread_summary(
    State(state): State<AppState>,
    Query(params): Query<CustomerQuery>,
) -> AppResult<Json<DataResponse<UnreadSummary>>> {
    let total = state
        .messenger
        .total_unread_count(params.integration_id, params.customer_id)
        .await?;
    let last_message = state
        .messenger
        .last_unread_message(params.integration_id, params.customer_id)
        .await?;
    Ok(Json(DataResponse {
        data: UnreadSummary {
            total,
            last_message,
        },
    }))
}
