//! Scheduler-facing operations: rate-limit counts from persisted
//! timestamps, atomic batch claiming, and the transactional send-result
//! records.

use crate::store::OutreachStore;
use chrono::{DateTime, Utc};
use outreach_core::types::*;
use outreach_core::{OutreachError, OutreachResult};
use tracing::info;
use uuid::Uuid;

/// Total send attempts per email, including the first.
pub const MAX_SEND_ATTEMPTS: u32 = 3;

impl OutreachStore {
    /// Count emails already sent for this campaign with `sent_at` at or
    /// after `since`. Derived from persisted rows so the limiter is
    /// correct across restarts and multiple scheduler instances.
    pub fn count_sent_since(&self, campaign_id: Uuid, since: DateTime<Utc>) -> u64 {
        self.emails
            .iter()
            .filter(|r| {
                let e = r.value();
                e.campaign_id == campaign_id
                    && e.status.counts_as_sent()
                    && e.sent_at.map(|at| at >= since).unwrap_or(false)
            })
            .count() as u64
    }

    /// Atomically claim up to `limit` queued emails in FIFO creation
    /// order, transitioning Queued -> Sending. An overlapping dispatch
    /// run sees the claim and cannot dequeue the same rows.
    pub fn claim_queued(&self, campaign_id: Uuid, limit: usize) -> Vec<Email> {
        if limit == 0 {
            return Vec::new();
        }
        let _tx = self.begin();

        let mut queued: Vec<(u64, Uuid)> = self
            .emails
            .iter()
            .filter(|r| {
                r.value().campaign_id == campaign_id && r.value().status == EmailStatus::Queued
            })
            .map(|r| (r.value().queue_seq, *r.key()))
            .collect();
        queued.sort_unstable();

        let mut claimed = Vec::new();
        for (_, id) in queued.into_iter().take(limit) {
            if let Some(mut entry) = self.emails.get_mut(&id) {
                let e = entry.value_mut();
                e.status = EmailStatus::Sending;
                claimed.push(e.clone());
            }
        }
        claimed
    }

    /// Whether the campaign still has undelivered work (queued or
    /// claimed-but-unresolved emails).
    pub fn has_pending(&self, campaign_id: Uuid) -> bool {
        self.emails.iter().any(|r| {
            let e = r.value();
            e.campaign_id == campaign_id
                && matches!(e.status, EmailStatus::Queued | EmailStatus::Sending)
        })
    }

    pub fn complete_campaign(&self, id: Uuid, now: DateTime<Utc>) -> OutreachResult<()> {
        let mut entry = self
            .campaigns
            .get_mut(&id)
            .ok_or_else(|| OutreachError::NotFound("Campaign not found".to_string()))?;
        let c = entry.value_mut();
        if c.status == CampaignStatus::Active {
            c.status = CampaignStatus::Completed;
            c.completed_at = Some(now);
            c.updated_at = now;
            info!(campaign_id = %id, "campaign completed");
        }
        Ok(())
    }

    /// Transport accepted the message. One transaction: email ->
    /// Sent with provider id, variation and campaign counters bumped,
    /// lead advanced to Contacted on first touch.
    pub fn record_send_success(
        &self,
        email_id: Uuid,
        provider_id: &str,
        now: DateTime<Utc>,
    ) -> OutreachResult<()> {
        let _tx = self.begin();

        let (variation_id, campaign_id, lead_id) = {
            let mut entry = self
                .emails
                .get_mut(&email_id)
                .ok_or_else(|| OutreachError::NotFound("Email not found".to_string()))?;
            let e = entry.value_mut();
            e.status = EmailStatus::Sent;
            e.sent_at = Some(now);
            e.provider_id = Some(provider_id.to_string());
            (e.variation_id, e.campaign_id, e.lead_id)
        };
        self.provider_index.insert(provider_id.to_string(), email_id);

        if let Some(mut v) = self.variations.get_mut(&variation_id) {
            v.value_mut().times_sent += 1;
        }
        if let Some(mut c) = self.campaigns.get_mut(&campaign_id) {
            c.value_mut().emails_sent += 1;
        }
        if let Some(mut lead) = self.leads.get_mut(&lead_id) {
            let l = lead.value_mut();
            if l.status == LeadStatus::New {
                l.status = LeadStatus::Contacted;
                l.updated_at = now;
            }
        }
        Ok(())
    }

    /// Transport failed. Under the attempt cap the email goes back to
    /// Queued for a later run; at the cap it is permanently Failed with
    /// the error preserved for operator inspection.
    pub fn record_send_failure(&self, email_id: Uuid, error: &str) -> OutreachResult<EmailStatus> {
        let _tx = self.begin();
        let mut entry = self
            .emails
            .get_mut(&email_id)
            .ok_or_else(|| OutreachError::NotFound("Email not found".to_string()))?;
        let e = entry.value_mut();
        e.retry_count += 1;
        e.error_message = Some(error.to_string());
        e.status = if e.retry_count < MAX_SEND_ATTEMPTS {
            EmailStatus::Queued
        } else {
            EmailStatus::Failed
        };
        Ok(e.status)
    }

    /// Recipient is on the unsubscribe list: terminal Unsubscribed
    /// status, no transport call, no effect on sent totals.
    pub fn record_unsubscribed_skip(&self, email_id: Uuid) -> OutreachResult<()> {
        let mut entry = self
            .emails
            .get_mut(&email_id)
            .ok_or_else(|| OutreachError::NotFound("Email not found".to_string()))?;
        entry.value_mut().status = EmailStatus::Unsubscribed;
        Ok(())
    }
}
