//! HTTP surface of the widget operations over an in-memory store.

mod common;

use axum::http::StatusCode;
use chrono::Utc;
use common::{body_json, get, post_empty, post_json, TestApp};
use messenger_db::models::message::CreateMessage;
use messenger_events::{MessengerEvent, Topic};
use messenger_widget::store::WidgetStore;
use serde_json::json;

async fn connect(app: &TestApp, body: serde_json::Value) -> serde_json::Value {
    let response = post_json(app.router(), "/api/v1/messenger/connect", body).await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await
}

#[tokio::test]
async fn connect_returns_integration_settings_and_customer() {
    let app = TestApp::new().await;

    let json = connect(
        &app,
        json!({ "brand_code": "acme", "email": "ann@example.com", "name": "Ann" }),
    )
    .await;

    let data = &json["data"];
    assert_eq!(data["integration_id"], app.integration.id);
    assert_eq!(data["ui_options"]["color"], "#04A9F5");
    assert_eq!(data["messenger_data"]["isOnline"], true);

    let customer_id = data["customer_id"].as_i64().unwrap();
    let customer = app.store.find_customer(customer_id).await.unwrap().unwrap();
    assert_eq!(customer.email.as_deref(), Some("ann@example.com"));
    assert_eq!(customer.session_count, 1);
}

#[tokio::test]
async fn connect_with_unknown_brand_answers_null_data() {
    let app = TestApp::new().await;

    let json = connect(&app, json!({ "brand_code": "nope" })).await;

    assert!(json["data"].is_null());
    assert!(app.store.customers().await.is_empty());
}

#[tokio::test]
async fn connect_rejects_invalid_email() {
    let app = TestApp::new().await;

    let response = post_json(
        app.router(),
        "/api/v1/messenger/connect",
        json!({ "brand_code": "acme", "email": "not-an-email" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn first_message_opens_conversation_and_publishes() {
    let app = TestApp::new().await;
    let mut events = app.state.event_bus.subscribe();
    let connected = connect(&app, json!({ "brand_code": "acme", "email": "ann@example.com" })).await;
    let customer_id = connected["data"]["customer_id"].as_i64().unwrap();

    let response = post_json(
        app.router(),
        "/api/v1/messenger/messages",
        json!({
            "integration_id": app.integration.id,
            "customer_id": customer_id,
            "message": "Hello",
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let message = body_json(response).await["data"].clone();
    assert_eq!(message["content"], "Hello");
    let conversation_id = message["conversation_id"].as_i64().unwrap();

    let first: MessengerEvent = events.recv().await.unwrap();
    assert_eq!(first.topic, Topic::NewMessage);
    assert_eq!(first.customer_id, Some(customer_id));
    assert_eq!(events.recv().await.unwrap().topic, Topic::Notification);

    let uri = format!(
        "/api/v1/messenger/conversations?integration_id={}&customer_id={customer_id}",
        app.integration.id
    );
    let conversations = body_json(get(app.router(), &uri).await).await;
    assert_eq!(conversations["data"].as_array().unwrap().len(), 1);
    assert_eq!(conversations["data"][0]["number"], 1);

    let history = body_json(
        get(
            app.router(),
            &format!("/api/v1/messenger/conversations/{conversation_id}/messages"),
        )
        .await,
    )
    .await;
    assert_eq!(history["data"][0]["content"], "Hello");
}

#[tokio::test]
async fn empty_message_is_rejected() {
    let app = TestApp::new().await;

    let response = post_json(
        app.router(),
        "/api/v1/messenger/messages",
        json!({ "integration_id": app.integration.id, "customer_id": 1, "message": "" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn attachment_only_message_is_stored() {
    let app = TestApp::new().await;
    let connected = connect(&app, json!({ "brand_code": "acme" })).await;
    let customer_id = connected["data"]["customer_id"].as_i64().unwrap();
    let attachments = json!([{ "url": "https://cdn.example.com/a.png", "type": "image/png" }]);

    let response = post_json(
        app.router(),
        "/api/v1/messenger/messages",
        json!({
            "integration_id": app.integration.id,
            "customer_id": customer_id,
            "message": "",
            "attachments": attachments,
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let message = body_json(response).await["data"].clone();
    assert_eq!(message["content"], "");
    assert_eq!(message["attachments"], attachments);
}

#[tokio::test]
async fn missing_conversation_is_404() {
    let app = TestApp::new().await;

    let response = get(app.router(), "/api/v1/messenger/conversations/999").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["code"], "NOT_FOUND");
    assert_eq!(json["error"], "conversation with id 999 not found");
}

#[tokio::test]
async fn unread_flow_and_mark_read() {
    let app = TestApp::new().await;
    let connected = connect(&app, json!({ "brand_code": "acme" })).await;
    let customer_id = connected["data"]["customer_id"].as_i64().unwrap();
    let sent = body_json(
        post_json(
            app.router(),
            "/api/v1/messenger/messages",
            json!({
                "integration_id": app.integration.id,
                "customer_id": customer_id,
                "message": "help",
            }),
        )
        .await,
    )
    .await;
    let conversation_id = sent["data"]["conversation_id"].as_i64().unwrap();

    app.store
        .create_message(
            &CreateMessage {
                conversation_id,
                user_id: Some(app.staff.id),
                content: "On it".to_string(),
                ..Default::default()
            },
            Utc::now(),
        )
        .await
        .unwrap();

    let count = body_json(
        get(
            app.router(),
            &format!("/api/v1/messenger/conversations/{conversation_id}/unread-count"),
        )
        .await,
    )
    .await;
    assert_eq!(count["data"]["count"], 1);

    let summary = body_json(
        get(
            app.router(),
            &format!(
                "/api/v1/messenger/unread?integration_id={}&customer_id={customer_id}",
                app.integration.id
            ),
        )
        .await,
    )
    .await;
    assert_eq!(summary["data"]["total"], 1);
    assert_eq!(summary["data"]["last_message"]["content"], "On it");

    let staff = body_json(
        get(
            app.router(),
            &format!("/api/v1/messenger/conversations/{conversation_id}/last-staff"),
        )
        .await,
    )
    .await;
    assert_eq!(staff["data"]["id"], app.staff.id);

    let read = body_json(
        post_empty(
            app.router(),
            &format!("/api/v1/messenger/conversations/{conversation_id}/read"),
        )
        .await,
    )
    .await;
    assert_eq!(read["data"]["updated_ids"].as_array().unwrap().len(), 1);

    let count = body_json(
        get(
            app.router(),
            &format!("/api/v1/messenger/conversations/{conversation_id}/unread-count"),
        )
        .await,
    )
    .await;
    assert_eq!(count["data"]["count"], 0);
}

#[tokio::test]
async fn save_email_and_disconnect() {
    let app = TestApp::new().await;
    let connected = connect(&app, json!({ "brand_code": "acme" })).await;
    let customer_id = connected["data"]["customer_id"].as_i64().unwrap();

    let saved = body_json(
        post_json(
            app.router(),
            "/api/v1/messenger/customers/email",
            json!({ "customer_id": customer_id, "email": "ann@example.com" }),
        )
        .await,
    )
    .await;
    assert_eq!(saved["data"]["updated"], true);

    let disconnected = body_json(
        post_empty(
            app.router(),
            &format!("/api/v1/messenger/customers/{customer_id}/disconnect"),
        )
        .await,
    )
    .await;
    assert_eq!(disconnected["data"]["updated"], true);

    let customer = app.store.find_customer(customer_id).await.unwrap().unwrap();
    assert_eq!(customer.email.as_deref(), Some("ann@example.com"));
    assert!(!customer.is_active);
}

#[tokio::test]
async fn end_conversation_returns_new_customer_id() {
    let app = TestApp::new().await;

    let json = body_json(
        post_json(
            app.router(),
            "/api/v1/messenger/end-conversation",
            json!({ "brand_code": "acme", "data": { "source": "restart" } }),
        )
        .await,
    )
    .await;

    let customer_id = json["data"].as_i64().unwrap();
    let customer = app.store.find_customer(customer_id).await.unwrap().unwrap();
    assert_eq!(customer.custom_data, json!({ "source": "restart" }));
}

#[tokio::test]
async fn integration_lookup_by_brand_code() {
    let app = TestApp::new().await;

    let found = get(app.router(), "/api/v1/messenger/integrations/acme").await;
    assert_eq!(found.status(), StatusCode::OK);
    assert_eq!(body_json(found).await["data"]["id"], app.integration.id);

    let missing = get(app.router(), "/api/v1/messenger/integrations/nope").await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn online_check_uses_manual_flag() {
    let app = TestApp::new().await;
    let uri = format!("/api/v1/messenger/integrations/{}/online", app.integration.id);

    app.store
        .set_messenger_data(
            app.integration.id,
            json!({ "availabilityMethod": "manual", "isOnline": true }),
        )
        .await;
    let online = get(app.router(), &uri).await;
    assert_eq!(online.status(), StatusCode::OK);
    assert_eq!(body_json(online).await["data"], true);

    app.store
        .set_messenger_data(
            app.integration.id,
            json!({ "availabilityMethod": "manual", "isOnline": false }),
        )
        .await;
    assert_eq!(body_json(get(app.router(), &uri).await).await["data"], false);

    let missing = get(app.router(), "/api/v1/messenger/integrations/999/online").await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn notify_broadcasts_notification() {
    let app = TestApp::new().await;
    let mut events = app.state.event_bus.subscribe();

    let response = post_empty(app.router(), "/api/v1/messenger/notify").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(events.recv().await.unwrap().topic, Topic::Notification);
}

#[tokio::test]
async fn email_without_mail_service_is_unavailable() {
    let app = TestApp::new().await;

    let response = post_json(
        app.router(),
        "/api/v1/messenger/email",
        json!({ "to_emails": ["ann@example.com"], "title": "Hi", "content": "Welcome" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body_json(response).await["code"], "UNAVAILABLE");
}

#[tokio::test]
async fn storage_outage_degrades_mutations_to_null() {
    let app = TestApp::new().await;
    app.store.set_unavailable(true);

    let json = connect(&app, json!({ "brand_code": "acme" })).await;
    assert!(json["data"].is_null());

    let response = get(app.router(), "/api/v1/messenger/conversations/1").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn start_conversation_creates_numbered_conversation_with_message() {
    let app = TestApp::new().await;
    let connected = connect(&app, json!({ "brand_code": "acme" })).await;
    let customer_id = connected["data"]["customer_id"].as_i64().unwrap();

    for expected in [1, 2] {
        let json = body_json(
            post_json(
                app.router(),
                "/api/v1/messenger/conversations",
                json!({
                    "integration_id": app.integration.id,
                    "customer_id": customer_id,
                    "message": "Pricing question",
                }),
            )
            .await,
        )
        .await;
        assert_eq!(json["data"]["conversation"]["number"], expected);
        assert_eq!(json["data"]["message"]["content"], "Pricing question");
        assert_eq!(json["data"]["message"]["customer_id"], customer_id);
    }
}

#[tokio::test]
async fn email_rejects_invalid_recipient() {
    let app = TestApp::new().await;

    let response = post_json(
        app.router(),
        "/api/v1/messenger/email",
        json!({ "to_emails": ["nobody"], "title": "Hi", "content": "Welcome" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "BAD_REQUEST");
}
