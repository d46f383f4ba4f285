//! One dispatch run: for each active campaign, apply the window and rate
//! gates, claim a bounded FIFO batch, send, and record the outcome of
//! every email transactionally. A failure inside one campaign never
//! blocks the others in the same run.

use chrono::{DateTime, Utc};
use outreach_core::limits;
use outreach_core::types::*;
use outreach_core::OutreachResult;
use outreach_store::{OutreachStore, SenderIdentity};
use outreach_transport::{EmailTransport, OutboundEmail};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Per-campaign outcome of a single run.
#[derive(Debug, Clone, Serialize)]
pub struct CampaignRunResult {
    pub campaign_id: Uuid,
    pub campaign_name: String,
    pub processed: usize,
    pub sent: usize,
    pub failed: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DispatchReport {
    pub campaigns: Vec<CampaignRunResult>,
    pub completed: Vec<Uuid>,
}

impl DispatchReport {
    pub fn total_sent(&self) -> usize {
        self.campaigns.iter().map(|c| c.sent).sum()
    }
}

pub struct CampaignDispatcher {
    store: Arc<OutreachStore>,
    transport: Arc<dyn EmailTransport>,
    sender: SenderIdentity,
    send_timeout: Duration,
}

impl CampaignDispatcher {
    pub fn new(
        store: Arc<OutreachStore>,
        transport: Arc<dyn EmailTransport>,
        sender: SenderIdentity,
        send_timeout: Duration,
    ) -> Self {
        Self {
            store,
            transport,
            sender,
            send_timeout,
        }
    }

    /// Process every active campaign once. `now` is the single clock
    /// reading used for all window, rate, and timestamp decisions in
    /// this run.
    pub async fn run_once(&self, now: DateTime<Utc>) -> DispatchReport {
        let mut report = DispatchReport::default();

        let activated = self.store.activate_due_scheduled(now);
        if !activated.is_empty() {
            info!(count = activated.len(), "scheduled campaigns activated");
        }

        let campaigns = self.store.active_campaigns();
        info!(count = campaigns.len(), "dispatch run started");

        for campaign in campaigns {
            match self.process_campaign(&campaign, now, &mut report.completed).await {
                Ok(Some(result)) => report.campaigns.push(result),
                Ok(None) => {}
                Err(e) => {
                    // One failing campaign must not block the rest.
                    error!(campaign_id = %campaign.id, error = %e, "campaign processing failed");
                }
            }
        }

        info!(
            campaigns = report.campaigns.len(),
            sent = report.total_sent(),
            completed = report.completed.len(),
            "dispatch run finished"
        );
        report
    }

    /// Returns `Ok(None)` when the campaign was gated out of this run
    /// without touching any email.
    async fn process_campaign(
        &self,
        campaign: &Campaign,
        now: DateTime<Utc>,
        completed: &mut Vec<Uuid>,
    ) -> OutreachResult<Option<CampaignRunResult>> {
        if !limits::can_send_now(
            now,
            campaign.send_window_start,
            campaign.send_window_end,
            campaign.send_weekdays_only,
        ) {
            info!(campaign_id = %campaign.id, "outside send window, skipping");
            return Ok(None);
        }

        let sent_last_hour = self
            .store
            .count_sent_since(campaign.id, limits::hour_window_start(now));
        let sent_today = self
            .store
            .count_sent_since(campaign.id, limits::day_window_start(now));
        let available = limits::available_to_send(
            campaign.emails_per_hour,
            campaign.emails_per_day,
            sent_last_hour,
            sent_today,
        );

        if available == 0 {
            info!(
                campaign_id = %campaign.id,
                sent_last_hour,
                sent_today,
                "rate limit reached, skipping"
            );
            return Ok(None);
        }

        let batch = self.store.claim_queued(campaign.id, available as usize);
        if batch.is_empty() {
            if !self.store.has_pending(campaign.id) {
                self.store.complete_campaign(campaign.id, now)?;
                completed.push(campaign.id);
            }
            return Ok(None);
        }

        let mut result = CampaignRunResult {
            campaign_id: campaign.id,
            campaign_name: campaign.name.clone(),
            processed: 0,
            sent: 0,
            failed: 0,
            skipped: 0,
        };

        for email in batch {
            result.processed += 1;
            match self.send_one(campaign, &email, now).await {
                SendOutcome::Sent => result.sent += 1,
                SendOutcome::Failed => result.failed += 1,
                SendOutcome::Suppressed => result.skipped += 1,
            }
        }

        if !self.store.has_pending(campaign.id) {
            self.store.complete_campaign(campaign.id, now)?;
            completed.push(campaign.id);
        }

        Ok(Some(result))
    }

    async fn send_one(&self, campaign: &Campaign, email: &Email, now: DateTime<Utc>) -> SendOutcome {
        let lead = match self.store.get_lead(email.lead_id) {
            Some(lead) => lead,
            None => {
                // Lead deleted after launch; nothing to send to.
                let _ = self.store.record_send_failure(email.id, "Lead no longer exists");
                return SendOutcome::Failed;
            }
        };

        if self.store.is_unsubscribed(&lead.email) {
            info!(email_id = %email.id, to = %lead.email, "recipient unsubscribed, suppressing");
            if let Err(e) = self.store.record_unsubscribed_skip(email.id) {
                error!(email_id = %email.id, error = %e, "failed to record suppression");
            }
            metrics::counter!("dispatch.emails_suppressed").increment(1);
            return SendOutcome::Suppressed;
        }

        let message = OutboundEmail {
            from_email: self.sender.email.clone(),
            from_name: self.sender.name.clone(),
            to: lead.email.clone(),
            subject: email.subject.clone(),
            html: email.body_html.clone(),
            text: email.body_text.clone(),
            reply_to: Some(self.sender.email.clone()),
            tags: vec![
                ("campaign_id".to_string(), campaign.id.to_string()),
                ("variation_id".to_string(), email.variation_id.to_string()),
                ("email_id".to_string(), email.id.to_string()),
            ],
        };

        let outcome = tokio::time::timeout(self.send_timeout, self.transport.send(&message)).await;

        match outcome {
            Ok(Ok(receipt)) => {
                if let Err(e) = self
                    .store
                    .record_send_success(email.id, &receipt.message_id, now)
                {
                    error!(email_id = %email.id, error = %e, "failed to record send");
                    return SendOutcome::Failed;
                }
                metrics::counter!("dispatch.emails_sent").increment(1);
                SendOutcome::Sent
            }
            Ok(Err(e)) => self.record_failure(email.id, &e.to_string()),
            Err(_) => self.record_failure(email.id, "Send timed out"),
        }
    }

    fn record_failure(&self, email_id: Uuid, reason: &str) -> SendOutcome {
        warn!(email_id = %email_id, reason, "send failed");
        metrics::counter!("dispatch.emails_failed").increment(1);
        if let Err(e) = self.store.record_send_failure(email_id, reason) {
            error!(email_id = %email_id, error = %e, "failed to record send failure");
        }
        SendOutcome::Failed
    }
}

enum SendOutcome {
    Sent,
    Failed,
    Suppressed,
}
