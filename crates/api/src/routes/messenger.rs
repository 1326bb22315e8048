use axum::routing::{get, post};
use axum::Router;

use crate::handlers::messenger;
use crate::state::AppState;

/// Routes mounted at `/messenger`.
///
/// ```text
/// POST   /connect                          connect a widget visitor
/// POST   /messages                         customer sends a message
/// POST   /messages/{id}/simulate           re-publish a stored message
/// GET    /conversations                    list (?integration_id&customer_id)
/// POST   /conversations                    open one with a first message
/// GET    /conversations/{id}               get one
/// GET    /conversations/{id}/messages      message history
/// POST   /conversations/{id}/read          mark staff messages read
/// GET    /conversations/{id}/unread-count  unread staff messages
/// GET    /conversations/{id}/last-staff    last staff participant
/// GET    /unread                           total + latest unread
/// POST   /end-conversation                 start over as a new customer
/// POST   /customers/email                  save visitor email
/// POST   /customers/{id}/disconnect        mark inactive
/// POST   /notify                           broadcast a notification
/// GET    /integrations/{brand_code}        messenger integration of a brand
/// GET    /integrations/{id}/online         whether staff are online
/// POST   /email                            queue an outbound email
/// ```
///
/// Both `/integrations` routes share one parameter name in the router; the
/// first segment is a brand code, the second an integration id.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/connect", post(messenger::connect))
        .route("/messages", post(messenger::insert_message))
        .route(
            "/messages/{id}/simulate",
            post(messenger::simulate_insert_message),
        )
        .route(
            "/conversations",
            get(messenger::list_conversations).post(messenger::start_conversation),
        )
        .route("/conversations/{id}", get(messenger::get_conversation))
        .route("/conversations/{id}/messages", get(messenger::list_messages))
        .route(
            "/conversations/{id}/read",
            post(messenger::read_conversation_messages),
        )
        .route(
            "/conversations/{id}/unread-count",
            get(messenger::unread_count),
        )
        .route(
            "/conversations/{id}/last-staff",
            get(messenger::conversation_last_staff),
        )
        .route("/unread", get(messenger::unread_summary))
        .route("/end-conversation", post(messenger::end_conversation))
        .route("/customers/email", post(messenger::save_customer_email))
        .route("/customers/{id}/disconnect", post(messenger::disconnect))
        .route("/notify", post(messenger::notify))
        .route("/integrations/{integration}", get(messenger::get_integration))
        .route(
            "/integrations/{integration}/online",
            get(messenger::is_messenger_online),
        )
        .route("/email", post(messenger::send_email))
}
