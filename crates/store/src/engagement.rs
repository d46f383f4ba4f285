//! Transactional updates driven by provider events and the user-invoked
//! reply marking. Each operation spans email + variation + campaign (and
//! lead/unsubscribe where applicable) under one write lock.
//!
//! Counters reflect unique recipients: open/click increments happen only
//! on the first occurrence per email. Status and timestamps, by
//! contrast, present the latest known state and are overwritten freely.

use crate::store::OutreachStore;
use chrono::{DateTime, Utc};
use outreach_core::types::*;
use outreach_core::{OutreachError, OutreachResult};
use uuid::Uuid;

impl OutreachStore {
    pub fn record_delivered(&self, email_id: Uuid, at: DateTime<Utc>) -> OutreachResult<()> {
        let mut entry = self
            .emails
            .get_mut(&email_id)
            .ok_or_else(|| OutreachError::NotFound("Email not found".to_string()))?;
        let e = entry.value_mut();
        e.status = EmailStatus::Delivered;
        e.delivered_at = Some(at);
        Ok(())
    }

    pub fn record_bounced(&self, email_id: Uuid, at: DateTime<Utc>) -> OutreachResult<()> {
        let _tx = self.begin();
        let campaign_id = {
            let mut entry = self
                .emails
                .get_mut(&email_id)
                .ok_or_else(|| OutreachError::NotFound("Email not found".to_string()))?;
            let e = entry.value_mut();
            e.status = EmailStatus::Bounced;
            e.bounced_at = Some(at);
            e.campaign_id
        };
        if let Some(mut c) = self.campaigns.get_mut(&campaign_id) {
            c.value_mut().emails_bounced += 1;
        }
        Ok(())
    }

    /// First open only: a redelivered webhook or a recipient opening the
    /// message again must not inflate unique-open counters.
    pub fn record_opened(&self, email_id: Uuid, at: DateTime<Utc>) -> OutreachResult<()> {
        let _tx = self.begin();
        let (variation_id, campaign_id) = {
            let mut entry = self
                .emails
                .get_mut(&email_id)
                .ok_or_else(|| OutreachError::NotFound("Email not found".to_string()))?;
            let e = entry.value_mut();
            if e.opened_at.is_some() {
                return Ok(());
            }
            e.status = EmailStatus::Opened;
            e.opened_at = Some(at);
            (e.variation_id, e.campaign_id)
        };
        if let Some(mut v) = self.variations.get_mut(&variation_id) {
            v.value_mut().times_opened += 1;
        }
        if let Some(mut c) = self.campaigns.get_mut(&campaign_id) {
            c.value_mut().emails_opened += 1;
        }
        Ok(())
    }

    /// Status and timestamp always move to the latest click; counters
    /// only on the first.
    pub fn record_clicked(&self, email_id: Uuid, at: DateTime<Utc>) -> OutreachResult<()> {
        let _tx = self.begin();
        let first_click;
        let (variation_id, campaign_id) = {
            let mut entry = self
                .emails
                .get_mut(&email_id)
                .ok_or_else(|| OutreachError::NotFound("Email not found".to_string()))?;
            let e = entry.value_mut();
            first_click = e.clicked_at.is_none();
            e.status = EmailStatus::Clicked;
            e.clicked_at = Some(at);
            (e.variation_id, e.campaign_id)
        };
        if first_click {
            if let Some(mut v) = self.variations.get_mut(&variation_id) {
                v.value_mut().times_clicked += 1;
            }
            if let Some(mut c) = self.campaigns.get_mut(&campaign_id) {
                c.value_mut().emails_clicked += 1;
            }
        }
        Ok(())
    }

    /// Spam complaint: terminal negative (bounce semantics) plus a
    /// permanent entry on the global unsubscribe list.
    pub fn record_complaint(&self, email_id: Uuid, at: DateTime<Utc>) -> OutreachResult<()> {
        let _tx = self.begin();
        let lead_id = {
            let mut entry = self
                .emails
                .get_mut(&email_id)
                .ok_or_else(|| OutreachError::NotFound("Email not found".to_string()))?;
            let e = entry.value_mut();
            e.status = EmailStatus::Bounced;
            e.bounced_at = Some(at);
            e.error_message = Some("Spam complaint".to_string());
            e.lead_id
        };
        if let Some(lead) = self.get_lead(lead_id) {
            self.upsert_unsubscribe(&lead.email, Some("Spam complaint".to_string()), at);
        }
        Ok(())
    }

    /// User-triggered: a reply was observed. Allowed only once the
    /// message actually went out (Sent/Delivered/Opened/Clicked).
    pub fn mark_replied(&self, email_id: Uuid, now: DateTime<Utc>) -> OutreachResult<Email> {
        let _tx = self.begin();
        let (variation_id, campaign_id, lead_id, updated) = {
            let mut entry = self
                .emails
                .get_mut(&email_id)
                .ok_or_else(|| OutreachError::NotFound("Email not found".to_string()))?;
            let e = entry.value_mut();
            if !matches!(
                e.status,
                EmailStatus::Sent
                    | EmailStatus::Delivered
                    | EmailStatus::Opened
                    | EmailStatus::Clicked
            ) {
                return Err(OutreachError::InvalidTransition(format!(
                    "Cannot mark as replied: email status is {:?}",
                    e.status
                )));
            }
            e.status = EmailStatus::Replied;
            e.replied_at = Some(now);
            (e.variation_id, e.campaign_id, e.lead_id, e.clone())
        };

        if let Some(mut v) = self.variations.get_mut(&variation_id) {
            v.value_mut().times_replied += 1;
        }
        if let Some(mut c) = self.campaigns.get_mut(&campaign_id) {
            c.value_mut().emails_replied += 1;
        }
        if let Some(mut lead) = self.leads.get_mut(&lead_id) {
            let l = lead.value_mut();
            l.status = LeadStatus::Responded;
            l.updated_at = now;
        }
        Ok(updated)
    }
}
