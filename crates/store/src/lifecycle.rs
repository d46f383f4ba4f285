//! Campaign lifecycle: creation, launch (email materialization),
//! pause/resume/cancel/delete, and scheduled activation.
//!
//! Launch renders every email up front and binds each to a variation;
//! the dispatch loop only ever sends stored content.

use crate::store::OutreachStore;
use chrono::{DateTime, Utc};
use outreach_core::render::{render_email, RenderInput};
use outreach_core::types::*;
use outreach_core::{OutreachError, OutreachResult};
use std::collections::HashMap;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct NewCampaign {
    pub user_id: Uuid,
    pub template_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub strategy: SendingStrategy,
    pub emails_per_hour: u32,
    pub emails_per_day: u32,
    pub send_window_start: u32,
    pub send_window_end: u32,
    pub send_weekdays_only: bool,
    pub scheduled_for: Option<DateTime<Utc>>,
    pub lead_ids: Vec<Uuid>,
}

/// Sender identity used for rendering footers and personalization
/// variables. Passed in per call; the store holds no sender state.
#[derive(Debug, Clone)]
pub struct SenderIdentity {
    pub name: String,
    pub email: String,
    pub public_url: String,
}

impl OutreachStore {
    // ─── Creation ──────────────────────────────────────────────────────

    pub fn create_campaign(&self, req: NewCampaign) -> OutreachResult<Campaign> {
        if req.send_window_start > 23 || req.send_window_end > 24 {
            return Err(OutreachError::Validation(
                "Send window hours must be on a 0-23 scale".to_string(),
            ));
        }
        if req.send_window_end <= req.send_window_start {
            return Err(OutreachError::Validation(
                "Send window end must be after send window start".to_string(),
            ));
        }
        if req.emails_per_hour == 0 || req.emails_per_day == 0 {
            return Err(OutreachError::Validation(
                "Rate limits must be at least 1 email".to_string(),
            ));
        }
        if req.lead_ids.is_empty() {
            return Err(OutreachError::Validation(
                "Campaign needs at least one lead".to_string(),
            ));
        }

        let template = self
            .get_template(req.template_id)
            .ok_or_else(|| OutreachError::NotFound("Template not found".to_string()))?;
        if template.user_id != req.user_id {
            return Err(OutreachError::NotFound("Template not found".to_string()));
        }

        for lead_id in &req.lead_ids {
            match self.get_lead(*lead_id) {
                Some(lead) if lead.user_id == req.user_id => {}
                _ => {
                    return Err(OutreachError::Validation(
                        "Some selected leads were not found".to_string(),
                    ))
                }
            }
        }

        let _tx = self.begin();
        let now = Utc::now();
        let campaign = Campaign {
            id: Uuid::new_v4(),
            user_id: req.user_id,
            template_id: req.template_id,
            name: req.name,
            description: req.description,
            status: CampaignStatus::Draft,
            strategy: req.strategy,
            emails_per_hour: req.emails_per_hour,
            emails_per_day: req.emails_per_day,
            send_window_start: req.send_window_start,
            send_window_end: req.send_window_end,
            send_weekdays_only: req.send_weekdays_only,
            scheduled_for: req.scheduled_for,
            emails_sent: 0,
            emails_opened: 0,
            emails_clicked: 0,
            emails_replied: 0,
            emails_bounced: 0,
            total_leads: req.lead_ids.len() as u64,
            started_at: None,
            completed_at: None,
            created_at: now,
            updated_at: now,
        };
        self.campaigns.insert(campaign.id, campaign.clone());
        self.campaign_leads.insert(campaign.id, req.lead_ids);
        info!(campaign_id = %campaign.id, name = %campaign.name, "campaign created");
        Ok(campaign)
    }

    // ─── Launch ────────────────────────────────────────────────────────

    /// Materialize one email per lead and move the campaign out of
    /// Draft. Variation assignment: balanced campaigns round-robin over
    /// active variations; winner-focused campaigns send the current
    /// winner to every lead when one exists, falling back to round-robin
    /// until performance data produces a winner.
    pub fn launch_campaign(
        &self,
        campaign_id: Uuid,
        start_immediately: bool,
        sender: &SenderIdentity,
    ) -> OutreachResult<Campaign> {
        let campaign = self
            .get_campaign(campaign_id)
            .ok_or_else(|| OutreachError::NotFound("Campaign not found".to_string()))?;
        if campaign.status != CampaignStatus::Draft {
            return Err(OutreachError::InvalidTransition(format!(
                "Campaign is not in draft status (currently {:?})",
                campaign.status
            )));
        }

        let variations = self.active_variations(campaign.template_id);
        if variations.is_empty() {
            return Err(OutreachError::Validation(
                "Template has no active variations. Generate variations first.".to_string(),
            ));
        }

        let lead_ids = self
            .campaign_leads
            .get(&campaign_id)
            .map(|r| r.value().clone())
            .unwrap_or_default();
        if lead_ids.is_empty() {
            return Err(OutreachError::Validation(
                "No leads selected for this campaign".to_string(),
            ));
        }

        let winner = match campaign.strategy {
            SendingStrategy::WinnerFocused => variations.iter().find(|v| v.is_winner).cloned(),
            SendingStrategy::Balanced => None,
        };

        let _tx = self.begin();
        let now = Utc::now();
        for (index, lead_id) in lead_ids.iter().enumerate() {
            let lead = self
                .get_lead(*lead_id)
                .ok_or_else(|| OutreachError::NotFound("Lead not found".to_string()))?;

            let variation = winner
                .clone()
                .unwrap_or_else(|| variations[index % variations.len()].clone());

            let mut variables = HashMap::new();
            variables.insert("businessName".to_string(), lead.business_name.clone());
            variables.insert(
                "contactName".to_string(),
                lead.contact_name
                    .clone()
                    .unwrap_or_else(|| lead.business_name.clone()),
            );
            variables.insert("yourName".to_string(), sender.name.clone());

            let rendered = render_email(&RenderInput {
                subject: &variation.subject,
                body_html: &variation.body_html,
                body_text: &variation.body_text,
                variables: &variables,
                include_footer: true,
                sender_name: &sender.name,
                sender_email: &sender.email,
                lead_email: &lead.email,
                public_url: &sender.public_url,
            });

            let email = Email {
                id: Uuid::new_v4(),
                campaign_id,
                lead_id: *lead_id,
                variation_id: variation.id,
                subject: rendered.subject,
                body_html: rendered.body_html,
                body_text: rendered.body_text,
                status: EmailStatus::Queued,
                queue_seq: self.next_seq(),
                sent_at: None,
                delivered_at: None,
                opened_at: None,
                clicked_at: None,
                replied_at: None,
                bounced_at: None,
                provider_id: None,
                error_message: None,
                retry_count: 0,
                created_at: now,
            };
            self.emails.insert(email.id, email);
        }

        let updated = {
            let mut entry = self
                .campaigns
                .get_mut(&campaign_id)
                .ok_or_else(|| OutreachError::NotFound("Campaign not found".to_string()))?;
            let c = entry.value_mut();
            c.status = if start_immediately {
                CampaignStatus::Active
            } else {
                CampaignStatus::Scheduled
            };
            c.started_at = start_immediately.then_some(now);
            c.updated_at = now;
            c.clone()
        };

        info!(
            campaign_id = %campaign_id,
            emails = lead_ids.len(),
            status = ?updated.status,
            "campaign launched"
        );
        Ok(updated)
    }

    /// Promote Scheduled campaigns whose start time has passed. Called
    /// at the top of every dispatch run.
    pub fn activate_due_scheduled(&self, now: DateTime<Utc>) -> Vec<Uuid> {
        let mut activated = Vec::new();
        for mut entry in self.campaigns.iter_mut() {
            let c = entry.value_mut();
            let due = c.scheduled_for.map(|at| at <= now).unwrap_or(true);
            if c.status == CampaignStatus::Scheduled && due {
                c.status = CampaignStatus::Active;
                c.started_at = Some(now);
                c.updated_at = now;
                activated.push(c.id);
            }
        }
        for id in &activated {
            info!(campaign_id = %id, "scheduled campaign activated");
        }
        activated
    }

    // ─── Pause / resume / cancel / delete ──────────────────────────────

    /// Takes effect on the next dispatch observation; in-flight sends
    /// from a run already in progress are not aborted.
    pub fn pause_campaign(&self, id: Uuid) -> OutreachResult<Campaign> {
        let mut entry = self
            .campaigns
            .get_mut(&id)
            .ok_or_else(|| OutreachError::NotFound("Campaign not found".to_string()))?;
        let c = entry.value_mut();
        if c.status != CampaignStatus::Active {
            return Err(OutreachError::InvalidTransition(
                "Only active campaigns can be paused".to_string(),
            ));
        }
        c.status = CampaignStatus::Paused;
        c.updated_at = Utc::now();
        Ok(c.clone())
    }

    pub fn resume_campaign(&self, id: Uuid) -> OutreachResult<Campaign> {
        let mut entry = self
            .campaigns
            .get_mut(&id)
            .ok_or_else(|| OutreachError::NotFound("Campaign not found".to_string()))?;
        let c = entry.value_mut();
        if c.status != CampaignStatus::Paused {
            return Err(OutreachError::InvalidTransition(
                "Only paused campaigns can be resumed".to_string(),
            ));
        }
        c.status = CampaignStatus::Active;
        c.updated_at = Utc::now();
        Ok(c.clone())
    }

    /// Cancel stops all future sends: remaining queued emails are marked
    /// Failed with an explanatory message.
    pub fn cancel_campaign(&self, id: Uuid) -> OutreachResult<Campaign> {
        let _tx = self.begin();
        let updated = {
            let mut entry = self
                .campaigns
                .get_mut(&id)
                .ok_or_else(|| OutreachError::NotFound("Campaign not found".to_string()))?;
            let c = entry.value_mut();
            if !matches!(
                c.status,
                CampaignStatus::Active | CampaignStatus::Scheduled | CampaignStatus::Paused
            ) {
                return Err(OutreachError::InvalidTransition(
                    "Campaign cannot be cancelled in its current state".to_string(),
                ));
            }
            c.status = CampaignStatus::Cancelled;
            c.updated_at = Utc::now();
            c.clone()
        };

        for mut email in self.emails.iter_mut() {
            let e = email.value_mut();
            if e.campaign_id == id && e.status == EmailStatus::Queued {
                e.status = EmailStatus::Failed;
                e.error_message = Some("Campaign cancelled".to_string());
            }
        }

        info!(campaign_id = %id, "campaign cancelled");
        Ok(updated)
    }

    /// Deleting is allowed only for campaigns that are no longer (or
    /// never were) sending; emails and the lead snapshot cascade.
    pub fn delete_campaign(&self, id: Uuid) -> OutreachResult<()> {
        {
            let campaign = self
                .get_campaign(id)
                .ok_or_else(|| OutreachError::NotFound("Campaign not found".to_string()))?;
            if !matches!(
                campaign.status,
                CampaignStatus::Draft | CampaignStatus::Completed | CampaignStatus::Cancelled
            ) {
                return Err(OutreachError::InvalidTransition(
                    "Cannot delete an active or scheduled campaign. Stop it first.".to_string(),
                ));
            }
        }

        let _tx = self.begin();
        self.campaigns.remove(&id);
        self.campaign_leads.remove(&id);
        let email_ids: Vec<Uuid> = self
            .emails
            .iter()
            .filter(|r| r.value().campaign_id == id)
            .map(|r| *r.key())
            .collect();
        for email_id in email_ids {
            if let Some((_, email)) = self.emails.remove(&email_id) {
                if let Some(provider_id) = email.provider_id {
                    self.provider_index.remove(&provider_id);
                }
            }
        }
        info!(campaign_id = %id, "campaign deleted");
        Ok(())
    }
}
