//! Customer identity and session reconciliation on widget connect.

use std::sync::Arc;

use chrono::Utc;
use messenger_core::conversation::MESSENGER_KIND;
use messenger_core::types::{DbId, Timestamp};
use messenger_db::models::customer::{CreateCustomer, Customer, TouchSession};
use messenger_db::models::integration::Integration;

use crate::dto::ConnectRequest;
use crate::error::WidgetResult;
use crate::store::WidgetStore;

/// Result of a successful connect.
#[derive(Debug, Clone)]
pub struct ConnectedCustomer {
    pub customer: Customer,
    pub integration: Integration,
}

#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn WidgetStore>,
}

impl SessionManager {
    pub fn new(store: Arc<dyn WidgetStore>) -> Self {
        Self { store }
    }

    /// The messenger integration of a brand.
    pub async fn resolve_integration(&self, brand_code: &str) -> WidgetResult<Option<Integration>> {
        self.store
            .find_integration_by_brand_code(brand_code, MESSENGER_KIND)
            .await
    }

    /// Look up the stored customer behind a connect.
    ///
    /// Email takes precedence; the cached id is only consulted when no
    /// email was given.
    pub async fn find_customer(
        &self,
        integration_id: DbId,
        email: Option<&str>,
        cached_customer_id: Option<DbId>,
    ) -> WidgetResult<Option<Customer>> {
        if let Some(email) = email {
            return self.store.find_customer_by_email(email, integration_id).await;
        }
        if let Some(id) = cached_customer_id {
            return self.store.find_customer(id).await;
        }
        Ok(None)
    }

    /// Reconcile a widget connect with a stored customer, creating one when
    /// nothing matches.
    pub async fn connect(&self, request: &ConnectRequest) -> WidgetResult<Option<ConnectedCustomer>> {
        let Some(integration) = self.resolve_integration(&request.brand_code).await? else {
            tracing::warn!(brand_code = %request.brand_code, "Connect for unknown brand");
            return Ok(None);
        };

        let customer = self.connect_customer(&integration, request, Utc::now()).await?;
        Ok(Some(ConnectedCustomer {
            customer,
            integration,
        }))
    }

    /// Session half of [`connect`](Self::connect), with the clock injected.
    pub async fn connect_customer(
        &self,
        integration: &Integration,
        request: &ConnectRequest,
        now: Timestamp,
    ) -> WidgetResult<Customer> {
        let existing = self
            .find_customer(
                integration.id,
                request.email.as_deref(),
                request.cached_customer_id,
            )
            .await?;

        if let Some(existing) = existing {
            let touch = TouchSession {
                name: request.name.clone(),
                is_user: request.is_user,
                now,
            };
            // The row can vanish between the lookup and the update.
            if let Some(customer) = self.store.touch_customer_session(existing.id, &touch).await? {
                tracing::debug!(
                    customer_id = customer.id,
                    session_count = customer.session_count,
                    "Customer reconnected"
                );
                return Ok(customer);
            }
        }

        let customer = self
            .store
            .create_customer(
                &CreateCustomer {
                    integration_id: integration.id,
                    email: request.email.clone(),
                    is_user: request.is_user,
                    name: request.name.clone(),
                    custom_data: request.custom_data(),
                },
                now,
            )
            .await?;
        tracing::info!(
            customer_id = customer.id,
            integration_id = integration.id,
            anonymous = customer.is_anonymous(),
            "Customer created"
        );
        Ok(customer)
    }

    /// Mark a customer as gone. Returns `false` for an unknown id.
    pub async fn disconnect(&self, customer_id: DbId) -> WidgetResult<bool> {
        self.store
            .mark_customer_inactive(customer_id, Utc::now())
            .await
    }

    pub async fn save_email(&self, customer_id: DbId, email: &str) -> WidgetResult<bool> {
        self.store.set_customer_email(customer_id, email).await
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use serde_json::json;

    use super::*;
    use crate::store::MemoryStore;

    async fn setup() -> (Arc<MemoryStore>, SessionManager, Integration) {
        let store = Arc::new(MemoryStore::new());
        let brand = store.insert_brand("acme").await;
        let integration = store.insert_integration(brand.id, MESSENGER_KIND).await;
        let manager = SessionManager::new(store.clone());
        (store, manager, integration)
    }

    fn request(email: Option<&str>) -> ConnectRequest {
        ConnectRequest {
            brand_code: "acme".to_string(),
            email: email.map(str::to_string),
            name: Some("Ann".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn new_email_creates_active_customer_with_one_session() {
        let (_, manager, integration) = setup().await;
        let now = Utc::now();

        let customer = manager
            .connect_customer(&integration, &request(Some("ann@example.com")), now)
            .await
            .unwrap();

        assert_eq!(customer.session_count, 1);
        assert!(customer.is_active);
        assert_eq!(customer.last_seen_at, now);
        assert_eq!(customer.custom_data, json!({}));
    }

    #[tokio::test]
    async fn reconnect_inside_window_keeps_session_count() {
        let (_, manager, integration) = setup().await;
        let t0 = Utc::now();
        let req = request(Some("ann@example.com"));

        let first = manager.connect_customer(&integration, &req, t0).await.unwrap();
        let second = manager
            .connect_customer(&integration, &req, t0 + Duration::minutes(10))
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.session_count, 1);
        assert_eq!(second.last_seen_at, t0 + Duration::minutes(10));
    }

    #[tokio::test]
    async fn reconnect_after_gap_opens_new_session() {
        let (store, manager, integration) = setup().await;
        let t0 = Utc::now();
        let req = request(Some("ann@example.com"));

        let first = manager.connect_customer(&integration, &req, t0).await.unwrap();
        store.set_customer_last_seen(first.id, t0).await;
        let later = t0 + Duration::minutes(31);
        let second = manager.connect_customer(&integration, &req, later).await.unwrap();

        assert_eq!(second.session_count, 2);
        assert!(second.is_active);
    }

    #[tokio::test]
    async fn exactly_thirty_minutes_is_same_session() {
        let (_, manager, integration) = setup().await;
        let t0 = Utc::now();
        let req = request(Some("ann@example.com"));

        manager.connect_customer(&integration, &req, t0).await.unwrap();
        let again = manager
            .connect_customer(&integration, &req, t0 + Duration::minutes(30))
            .await
            .unwrap();
        assert_eq!(again.session_count, 1);
    }

    #[tokio::test]
    async fn cached_id_matches_anonymous_visitor() {
        let (_, manager, integration) = setup().await;
        let first = manager
            .connect_customer(&integration, &request(None), Utc::now())
            .await
            .unwrap();

        let mut req = request(None);
        req.cached_customer_id = Some(first.id);
        req.name = Some("Renamed".to_string());
        req.is_user = true;
        let second = manager
            .connect_customer(&integration, &req, Utc::now())
            .await
            .unwrap();

        assert_eq!(second.id, first.id);
        assert_eq!(second.name.as_deref(), Some("Renamed"));
        assert!(second.is_user);
    }

    #[tokio::test]
    async fn email_takes_precedence_over_cached_id() {
        let (_, manager, integration) = setup().await;
        let anon = manager
            .connect_customer(&integration, &request(None), Utc::now())
            .await
            .unwrap();

        let mut req = request(Some("new@example.com"));
        req.cached_customer_id = Some(anon.id);
        let customer = manager
            .connect_customer(&integration, &req, Utc::now())
            .await
            .unwrap();

        assert_ne!(customer.id, anon.id);
        assert_eq!(customer.email.as_deref(), Some("new@example.com"));
    }

    #[tokio::test]
    async fn stale_cached_id_creates_customer() {
        let (store, manager, integration) = setup().await;
        let mut req = request(None);
        req.cached_customer_id = Some(4242);

        let customer = manager
            .connect_customer(&integration, &req, Utc::now())
            .await
            .unwrap();
        assert_ne!(customer.id, 4242);
        assert_eq!(store.customers().await.len(), 1);
    }

    #[tokio::test]
    async fn unknown_brand_connects_to_nothing() {
        let (_, manager, _) = setup().await;
        let mut req = request(None);
        req.brand_code = "nope".to_string();
        assert!(manager.connect(&req).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn disconnect_marks_inactive() {
        let (store, manager, integration) = setup().await;
        let customer = manager
            .connect_customer(&integration, &request(None), Utc::now())
            .await
            .unwrap();

        assert!(manager.disconnect(customer.id).await.unwrap());
        assert!(!manager.disconnect(9999).await.unwrap());
        let stored = store.find_customer(customer.id).await.unwrap().unwrap();
        assert!(!stored.is_active);
    }
}
