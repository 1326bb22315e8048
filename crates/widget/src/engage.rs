//! Auto-messaging of anonymous visitors.
//!
//! [`EngageEngine::run`] evaluates every live visitor-auto campaign of the
//! visitor's brand. Campaigns are processed concurrently and independently:
//! one failing campaign is logged and does not stop the others.
//!
//! A campaign is claimed for the visitor *before* anything else happens, by
//! an atomic add to its customer ledger. Whoever loses that race skips the
//! campaign, so a visitor receives each campaign at most once even when
//! several connects run the engine at the same time. The claim is kept when
//! the rules fail, so a campaign is evaluated once per visitor.

use std::sync::Arc;

use futures::future::join_all;
use messenger_core::engage::{passes_all_rules, BrowserInfo};
use messenger_core::template::{render, TemplateContext};
use messenger_core::types::DbId;
use messenger_db::models::customer::Customer;
use messenger_db::models::engage_message::EngageMessage;
use messenger_db::models::integration::Integration;
use messenger_db::models::message::CreateMessage;

use crate::error::WidgetResult;
use crate::geo::LocationResolver;
use crate::ingestion::MessageIngestion;
use crate::lifecycle::ConversationLifecycle;
use crate::store::WidgetStore;

/// Everything the engine needs to know about a connecting visitor.
#[derive(Debug, Clone)]
pub struct VisitorContext {
    pub brand_code: String,
    pub customer: Customer,
    pub integration: Integration,
    pub browser_info: BrowserInfo,
    /// Address of the connecting socket, used for geolocation in live mode.
    pub remote_address: Option<String>,
}

/// What happened to one campaign during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CampaignOutcome {
    Sent {
        conversation_id: DbId,
        message_id: DbId,
    },
    /// The visitor was already in the campaign's ledger.
    AlreadyTargeted,
    /// The campaign's sender no longer exists.
    MissingSender,
    RulesNotMet,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CampaignResult {
    pub campaign_id: DbId,
    pub outcome: CampaignOutcome,
}

#[derive(Debug, Clone, Default)]
pub struct EngageReport {
    pub results: Vec<CampaignResult>,
}

impl EngageReport {
    pub fn sent(&self) -> usize {
        self.results
            .iter()
            .filter(|r| matches!(r.outcome, CampaignOutcome::Sent { .. }))
            .count()
    }

    pub fn outcome(&self, campaign_id: DbId) -> Option<&CampaignOutcome> {
        self.results
            .iter()
            .find(|r| r.campaign_id == campaign_id)
            .map(|r| &r.outcome)
    }
}

#[derive(Clone)]
pub struct EngageEngine {
    store: Arc<dyn WidgetStore>,
    lifecycle: ConversationLifecycle,
    ingestion: MessageIngestion,
    resolver: Arc<dyn LocationResolver>,
}

impl EngageEngine {
    pub fn new(
        store: Arc<dyn WidgetStore>,
        lifecycle: ConversationLifecycle,
        ingestion: MessageIngestion,
        resolver: Arc<dyn LocationResolver>,
    ) -> Self {
        Self {
            store,
            lifecycle,
            ingestion,
            resolver,
        }
    }

    /// Evaluate all candidate campaigns for the visitor.
    ///
    /// Only brand and candidate lookup errors are returned; per-campaign
    /// errors end up in the report as [`CampaignOutcome::Failed`].
    pub async fn run(&self, visitor: &VisitorContext) -> WidgetResult<EngageReport> {
        let Some(brand) = self.store.find_brand_by_code(&visitor.brand_code).await? else {
            tracing::debug!(brand_code = %visitor.brand_code, "Engage run for unknown brand");
            return Ok(EngageReport::default());
        };

        let candidates = self
            .store
            .list_engage_candidates(brand.id, visitor.customer.id)
            .await?;
        if candidates.is_empty() {
            return Ok(EngageReport::default());
        }

        let runs = candidates.iter().map(|campaign| async move {
            let outcome = match self.process(campaign, visitor).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::error!(
                        campaign_id = campaign.id,
                        customer_id = visitor.customer.id,
                        error = %e,
                        "Engage campaign failed"
                    );
                    CampaignOutcome::Failed(e.to_string())
                }
            };
            CampaignResult {
                campaign_id: campaign.id,
                outcome,
            }
        });
        let report = EngageReport {
            results: join_all(runs).await,
        };

        tracing::info!(
            customer_id = visitor.customer.id,
            candidates = report.results.len(),
            sent = report.sent(),
            "Engage run finished"
        );
        Ok(report)
    }

    async fn process(
        &self,
        campaign: &EngageMessage,
        visitor: &VisitorContext,
    ) -> WidgetResult<CampaignOutcome> {
        let customer = &visitor.customer;

        if !self
            .store
            .register_engage_customer(campaign.id, customer.id)
            .await?
        {
            return Ok(CampaignOutcome::AlreadyTargeted);
        }

        let sender = match campaign.from_user_id {
            Some(user_id) => self.store.find_user(user_id).await?,
            None => None,
        };
        let Some(sender) = sender else {
            tracing::warn!(campaign_id = campaign.id, "Engage campaign has no sender");
            return Ok(CampaignOutcome::MissingSender);
        };

        let location = self
            .resolver
            .resolve(visitor.remote_address.as_deref())
            .await?;
        let rules = campaign.parsed_rules()?;
        if !passes_all_rules(&rules, &visitor.browser_info, &location) {
            return Ok(CampaignOutcome::RulesNotMet);
        }

        let content = render(
            &campaign.content,
            &TemplateContext {
                customer_name: customer.name.as_deref(),
                customer_email: customer.email.as_deref(),
                user_full_name: sender.full_name.as_deref(),
                user_position: sender.position.as_deref(),
                user_email: sender.email.as_deref(),
            },
        );

        let conversation = self
            .lifecycle
            .create(customer.id, visitor.integration.id, Some(content.clone()))
            .await?;
        let message = self
            .ingestion
            .create_message(&CreateMessage {
                conversation_id: conversation.id,
                customer_id: Some(customer.id),
                user_id: Some(sender.id),
                content,
                engage_data: Some(campaign.engage_data()),
                ..Default::default()
            })
            .await?;
        self.ingestion.publish_message(&message, customer.id);

        tracing::info!(
            campaign_id = campaign.id,
            customer_id = customer.id,
            conversation_id = conversation.id,
            "Engage message sent"
        );
        Ok(CampaignOutcome::Sent {
            conversation_id: conversation.id,
            message_id: message.id,
        })
    }
}
