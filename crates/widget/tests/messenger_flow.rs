mod common;

use messenger_core::conversation::ConversationStatus;
use messenger_db::models::message::CreateMessage;
use messenger_events::Topic;
use messenger_widget::dto::{ConnectRequest, EndConversationRequest, InsertMessageRequest};
use messenger_widget::store::{NewCampaign, WidgetStore};
use serde_json::json;

use common::{StubResolver, TestWidget};

fn connect_request(email: Option<&str>) -> ConnectRequest {
    ConnectRequest {
        brand_code: "acme".to_string(),
        email: email.map(str::to_string),
        name: Some("Ann".to_string()),
        data: json!({ "plan": "pro" }),
        ..Default::default()
    }
}

fn message_request(
    integration_id: i64,
    customer_id: i64,
    conversation_id: Option<i64>,
    text: &str,
) -> InsertMessageRequest {
    InsertMessageRequest {
        integration_id,
        customer_id,
        conversation_id,
        message: text.to_string(),
        attachments: None,
    }
}

#[tokio::test]
async fn connect_then_first_message_end_to_end() {
    let w = TestWidget::new().await;

    let connected = w
        .messenger
        .connect(&connect_request(Some("ann@example.com")), None)
        .await
        .expect("connected");
    assert_eq!(connected.integration_id, w.integration.id);
    assert_eq!(connected.ui_options, w.integration.ui_options);
    assert_eq!(connected.messenger_data, w.integration.messenger_data);

    let customer = w
        .store
        .find_customer(connected.customer_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(customer.session_count, 1);
    assert!(customer.is_active);
    assert_eq!(customer.custom_data, json!({ "plan": "pro" }));

    let message = w
        .messenger
        .insert_message(&message_request(
            w.integration.id,
            connected.customer_id,
            None,
            "Hello there",
        ))
        .await
        .expect("message stored");

    let conversations = w
        .messenger
        .conversations(w.integration.id, connected.customer_id)
        .await
        .unwrap();
    assert_eq!(conversations.len(), 1);
    assert_eq!(conversations[0].number, 1);
    assert_eq!(conversations[0].status, ConversationStatus::Open);

    let messages = w.messenger.messages(message.conversation_id).await.unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].content, "Hello there");

    let topics: Vec<Topic> = w.publisher.events().iter().map(|e| e.topic).collect();
    assert_eq!(topics, vec![Topic::NewMessage, Topic::Notification]);
}

#[tokio::test]
async fn anonymous_connect_runs_engage_in_background() {
    let w = TestWidget::new().await;
    w.store
        .insert_campaign(NewCampaign::visitor_auto(
            w.brand.id,
            w.sender.id,
            "Hi {{customer.name}}, {{ USER.POSITION }} here",
        ))
        .await;

    let connected = w
        .messenger
        .connect(&connect_request(None), Some("198.51.100.4".to_string()))
        .await
        .expect("connected");
    w.messenger.tasks().wait_idle().await;

    let message = w
        .messenger
        .last_unread_message(w.integration.id, connected.customer_id)
        .await
        .unwrap()
        .expect("engage message");
    assert_eq!(message.content, "Hi Ann, Support lead here");
    assert_eq!(
        w.messenger
            .total_unread_count(w.integration.id, connected.customer_id)
            .await
            .unwrap(),
        1
    );

    let staff = w
        .messenger
        .conversation_last_staff(message.conversation_id)
        .await
        .unwrap()
        .expect("sender");
    assert_eq!(staff.id, w.sender.id);
}

#[tokio::test]
async fn identified_connect_does_not_run_engage() {
    let w = TestWidget::new().await;
    w.store
        .insert_campaign(NewCampaign::visitor_auto(w.brand.id, w.sender.id, "hello"))
        .await;

    let connected = w
        .messenger
        .connect(&connect_request(Some("ann@example.com")), None)
        .await
        .expect("connected");
    w.messenger.tasks().wait_idle().await;

    assert_eq!(w.resolver.calls(), 0);
    assert_eq!(w.conversations_of(connected.customer_id).await, 0);
}

#[tokio::test]
async fn engage_failure_never_reaches_connect() {
    let w = TestWidget::with_resolver(StubResolver::failing()).await;
    w.store
        .insert_campaign(NewCampaign::visitor_auto(w.brand.id, w.sender.id, "hello"))
        .await;

    let connected = w.messenger.connect(&connect_request(None), None).await;
    w.messenger.tasks().wait_idle().await;

    let connected = connected.expect("connect succeeds");
    assert_eq!(w.resolver.calls(), 1);
    assert_eq!(w.conversations_of(connected.customer_id).await, 0);
}

#[tokio::test]
async fn storage_failure_degrades_to_no_result() {
    let w = TestWidget::new().await;
    let customer = w.anonymous_customer(None).await;
    w.store.set_unavailable(true);

    assert!(w.messenger.connect(&connect_request(None), None).await.is_none());
    assert!(w
        .messenger
        .insert_message(&message_request(w.integration.id, customer.id, None, "hi"))
        .await
        .is_none());
    assert!(w.messenger.read_conversation_messages(1).await.is_none());
    assert!(!w.messenger.disconnect(customer.id).await);
    assert!(w.messenger.ping().await.is_err());
    assert!(w.publisher.events().is_empty());
}

#[tokio::test]
async fn unknown_brand_connects_to_nothing() {
    let w = TestWidget::new().await;
    let mut request = connect_request(None);
    request.brand_code = "nope".to_string();

    assert!(w.messenger.connect(&request, None).await.is_none());
    assert!(w.store.customers().await.is_empty());
}

#[tokio::test]
async fn mark_read_clears_unread_staff_messages() {
    let w = TestWidget::new().await;
    let customer = w.anonymous_customer(None).await;
    let first = w
        .messenger
        .insert_message(&message_request(w.integration.id, customer.id, None, "help"))
        .await
        .unwrap();

    for text in ["one", "two"] {
        w.store
            .create_message(
                &CreateMessage {
                    conversation_id: first.conversation_id,
                    user_id: Some(w.sender.id),
                    content: text.to_string(),
                    ..Default::default()
                },
                chrono::Utc::now(),
            )
            .await
            .unwrap();
    }
    assert_eq!(w.messenger.unread_count(first.conversation_id).await.unwrap(), 2);

    let updated = w
        .messenger
        .read_conversation_messages(first.conversation_id)
        .await
        .unwrap();

    assert_eq!(updated.len(), 2);
    assert_eq!(w.messenger.unread_count(first.conversation_id).await.unwrap(), 0);
    assert!(w
        .messenger
        .last_unread_message(w.integration.id, customer.id)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn end_conversation_starts_a_fresh_customer() {
    let w = TestWidget::new().await;
    let first = w.anonymous_customer(None).await;

    let new_id = w
        .messenger
        .end_conversation(&EndConversationRequest {
            brand_code: "acme".to_string(),
            data: json!({ "source": "restart" }),
        })
        .await
        .expect("new customer");

    assert_ne!(new_id, first.id);
    let customer = w.store.find_customer(new_id).await.unwrap().unwrap();
    assert_eq!(customer.integration_id, w.integration.id);
    assert_eq!(customer.custom_data, json!({ "source": "restart" }));

    assert!(w
        .messenger
        .end_conversation(&EndConversationRequest {
            brand_code: "nope".to_string(),
            data: serde_json::Value::Null,
        })
        .await
        .is_none());
}

#[tokio::test]
async fn save_email_and_disconnect() {
    let w = TestWidget::new().await;
    let customer = w.anonymous_customer(None).await;

    assert!(w.messenger.save_customer_email(customer.id, "ann@example.com").await);
    assert!(!w.messenger.save_customer_email(4040, "x@example.com").await);
    assert!(w.messenger.disconnect(customer.id).await);

    let stored = w.store.find_customer(customer.id).await.unwrap().unwrap();
    assert_eq!(stored.email.as_deref(), Some("ann@example.com"));
    assert!(!stored.is_active);
}

#[tokio::test]
async fn simulate_insert_republishes_existing_message() {
    let w = TestWidget::new().await;
    let customer = w.anonymous_customer(None).await;
    let message = w
        .messenger
        .insert_message(&message_request(w.integration.id, customer.id, None, "hi"))
        .await
        .unwrap();
    w.publisher.clear();

    let republished = w.messenger.simulate_insert_message(message.id).await;
    assert_eq!(republished.map(|m| m.id), Some(message.id));
    assert_eq!(w.publisher.messages_for(customer.id).len(), 1);
    assert_eq!(w.publisher.count(Topic::Notification), 1);

    w.messenger.notify();
    assert_eq!(w.publisher.count(Topic::Notification), 2);
}

#[tokio::test]
async fn reconnect_with_cached_id_keeps_identity() {
    let w = TestWidget::new().await;
    let first = w
        .messenger
        .connect(&connect_request(None), None)
        .await
        .unwrap();

    let mut again = connect_request(None);
    again.cached_customer_id = Some(first.customer_id);
    let second = w.messenger.connect(&again, None).await.unwrap();

    assert_eq!(second.customer_id, first.customer_id);
    assert_eq!(w.store.customers().await.len(), 1);
}

#[tokio::test]
async fn online_check_follows_integration_hours() {
    use chrono::{TimeZone, Utc};

    let w = TestWidget::new().await;
    w.store
        .set_messenger_data(
            w.integration.id,
            json!({
                "availabilityMethod": "auto",
                "onlineHours": [{ "day": "weekdays", "from": "09:00", "to": "17:00" }],
            }),
        )
        .await;

    // Monday noon and Saturday noon.
    let monday = Utc.with_ymd_and_hms(2024, 3, 4, 12, 0, 0).unwrap();
    let saturday = Utc.with_ymd_and_hms(2024, 3, 9, 12, 0, 0).unwrap();
    let id = w.integration.id;

    assert_eq!(w.messenger.is_messenger_online_at(id, monday).await.unwrap(), Some(true));
    assert_eq!(w.messenger.is_messenger_online_at(id, saturday).await.unwrap(), Some(false));
    assert_eq!(w.messenger.is_messenger_online(9_999).await.unwrap(), None);
}

#[tokio::test]
async fn unreadable_availability_settings_report_offline() {
    let w = TestWidget::new().await;
    w.store
        .set_messenger_data(w.integration.id, json!({ "onlineHours": "always" }))
        .await;

    let online = w.messenger.is_messenger_online(w.integration.id).await.unwrap();

    assert_eq!(online, Some(false));
}
