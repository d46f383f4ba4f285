//! Store struct plus lead, template, variation, and unsubscribe
//! operations. Campaign lifecycle lives in `lifecycle`, scheduler
//! support in `dispatch_ops`, webhook-driven updates in `engagement`.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use outreach_core::types::*;
use outreach_core::{OutreachError, OutreachResult};
use parking_lot::{Mutex, MutexGuard};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;
use uuid::Uuid;

/// Thread-safe in-memory store for leads, templates, variations,
/// campaigns, emails, and the global unsubscribe list.
pub struct OutreachStore {
    pub(crate) leads: DashMap<Uuid, Lead>,
    pub(crate) templates: DashMap<Uuid, Template>,
    pub(crate) variations: DashMap<Uuid, EmailVariation>,
    pub(crate) campaigns: DashMap<Uuid, Campaign>,
    /// Campaign membership snapshot, in selection order.
    pub(crate) campaign_leads: DashMap<Uuid, Vec<Uuid>>,
    pub(crate) emails: DashMap<Uuid, Email>,
    /// Lowercased address -> suppression record.
    pub(crate) unsubscribes: DashMap<String, Unsubscribe>,
    /// Provider message id -> email id; unique once set.
    pub(crate) provider_index: DashMap<String, Uuid>,
    /// FIFO sequence for email creation order.
    pub(crate) queue_seq: AtomicU64,
    /// Serializes multi-row writes (the store's transaction boundary).
    tx: Mutex<()>,
}

#[derive(Debug, Clone)]
pub struct NewLead {
    pub user_id: Uuid,
    pub business_name: String,
    pub contact_name: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub industry: Option<String>,
    pub tags: Vec<String>,
    pub notes: Option<String>,
    pub source: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewTemplate {
    pub user_id: Uuid,
    pub name: String,
    pub subject: String,
    pub body: String,
    pub tone: String,
    pub target_industry: Option<String>,
}

/// Variation content to persist, already normalized by the AI layer.
#[derive(Debug, Clone)]
pub struct NewVariation {
    pub name: String,
    pub subject: String,
    pub body_html: String,
    pub body_text: String,
    pub framework: String,
}

/// Field-level lead update. `None` leaves the field as it was.
#[derive(Debug, Clone, Default)]
pub struct LeadUpdate {
    pub business_name: Option<String>,
    pub contact_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub industry: Option<String>,
    pub tags: Option<Vec<String>>,
    pub status: Option<LeadStatus>,
    pub notes: Option<String>,
}

/// Field-level template update. `None` leaves the field as it was.
#[derive(Debug, Clone, Default)]
pub struct TemplateUpdate {
    pub name: Option<String>,
    pub subject: Option<String>,
    pub body: Option<String>,
    pub tone: Option<String>,
    pub target_industry: Option<String>,
}

/// One parsed CSV row for bulk lead import.
#[derive(Debug, Clone)]
pub struct LeadImportRow {
    pub business_name: String,
    pub contact_name: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub industry: Option<String>,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct ImportReport {
    pub imported: usize,
    pub skipped: usize,
}

impl OutreachStore {
    pub fn new() -> Self {
        info!("Outreach store initialized (in-memory, development mode)");
        Self {
            leads: DashMap::new(),
            templates: DashMap::new(),
            variations: DashMap::new(),
            campaigns: DashMap::new(),
            campaign_leads: DashMap::new(),
            emails: DashMap::new(),
            unsubscribes: DashMap::new(),
            provider_index: DashMap::new(),
            queue_seq: AtomicU64::new(0),
            tx: Mutex::new(()),
        }
    }

    /// Take the multi-row write lock. Held for the duration of any
    /// mutation that touches more than one row.
    pub(crate) fn begin(&self) -> MutexGuard<'_, ()> {
        self.tx.lock()
    }

    pub(crate) fn next_seq(&self) -> u64 {
        self.queue_seq.fetch_add(1, Ordering::SeqCst)
    }

    // ─── Leads ─────────────────────────────────────────────────────────

    pub fn create_lead(&self, req: NewLead) -> OutreachResult<Lead> {
        let _tx = self.begin();
        let email = req.email.trim().to_lowercase();
        if self.lead_email_taken(req.user_id, &email) {
            return Err(OutreachError::Validation(format!(
                "A lead with email {email} already exists"
            )));
        }

        let now = Utc::now();
        let lead = Lead {
            id: Uuid::new_v4(),
            user_id: req.user_id,
            business_name: req.business_name,
            contact_name: req.contact_name,
            email,
            phone: req.phone,
            address: req.address,
            industry: req.industry,
            tags: req.tags,
            status: LeadStatus::New,
            notes: req.notes,
            source: req.source,
            created_at: now,
            updated_at: now,
        };
        self.leads.insert(lead.id, lead.clone());
        Ok(lead)
    }

    fn lead_email_taken(&self, user_id: Uuid, email: &str) -> bool {
        self.leads
            .iter()
            .any(|r| r.value().user_id == user_id && r.value().email == email)
    }

    pub fn update_lead(&self, id: Uuid, changes: LeadUpdate) -> OutreachResult<Lead> {
        let _tx = self.begin();
        let current = self
            .get_lead(id)
            .ok_or_else(|| OutreachError::NotFound(format!("Lead {id} not found")))?;

        // Uniqueness is checked before the row lock is taken; iterating
        // the map while holding a shard guard would deadlock.
        let new_email = match changes.email {
            Some(email) => {
                let email = email.trim().to_lowercase();
                if email != current.email && self.lead_email_taken(current.user_id, &email) {
                    return Err(OutreachError::Validation(format!(
                        "A lead with email {email} already exists"
                    )));
                }
                Some(email)
            }
            None => None,
        };

        let mut entry = self
            .leads
            .get_mut(&id)
            .ok_or_else(|| OutreachError::NotFound(format!("Lead {id} not found")))?;
        let lead = entry.value_mut();
        if let Some(v) = changes.business_name {
            lead.business_name = v;
        }
        if let Some(v) = changes.contact_name {
            lead.contact_name = Some(v);
        }
        if let Some(v) = new_email {
            lead.email = v;
        }
        if let Some(v) = changes.phone {
            lead.phone = Some(v);
        }
        if let Some(v) = changes.address {
            lead.address = Some(v);
        }
        if let Some(v) = changes.industry {
            lead.industry = Some(v);
        }
        if let Some(v) = changes.tags {
            lead.tags = v;
        }
        if let Some(v) = changes.status {
            lead.status = v;
        }
        if let Some(v) = changes.notes {
            lead.notes = Some(v);
        }
        lead.updated_at = Utc::now();
        Ok(lead.clone())
    }

    /// Bulk import of parsed CSV rows. Rows whose address already exists
    /// for this owner are skipped, not treated as errors.
    pub fn import_leads(&self, user_id: Uuid, rows: Vec<LeadImportRow>) -> ImportReport {
        let mut report = ImportReport::default();
        for row in rows {
            let req = NewLead {
                user_id,
                business_name: row.business_name,
                contact_name: row.contact_name,
                email: row.email,
                phone: row.phone,
                address: row.address,
                industry: row.industry,
                tags: row.tags,
                notes: None,
                source: Some("CSV Import".to_string()),
            };
            match self.create_lead(req) {
                Ok(_) => report.imported += 1,
                Err(_) => report.skipped += 1,
            }
        }
        info!(
            imported = report.imported,
            skipped = report.skipped,
            "lead import completed"
        );
        report
    }

    pub fn get_lead(&self, id: Uuid) -> Option<Lead> {
        self.leads.get(&id).map(|r| r.value().clone())
    }

    pub fn list_leads(&self, user_id: Uuid) -> Vec<Lead> {
        let mut leads: Vec<Lead> = self
            .leads
            .iter()
            .filter(|r| r.value().user_id == user_id)
            .map(|r| r.value().clone())
            .collect();
        leads.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        leads
    }

    pub fn delete_lead(&self, id: Uuid) -> bool {
        self.leads.remove(&id).is_some()
    }

    // ─── Templates & variations ────────────────────────────────────────

    pub fn create_template(&self, req: NewTemplate) -> Template {
        let now = Utc::now();
        let template = Template {
            id: Uuid::new_v4(),
            user_id: req.user_id,
            name: req.name,
            subject: req.subject,
            body: req.body,
            tone: req.tone,
            target_industry: req.target_industry,
            created_at: now,
            updated_at: now,
        };
        self.templates.insert(template.id, template.clone());
        template
    }

    pub fn get_template(&self, id: Uuid) -> Option<Template> {
        self.templates.get(&id).map(|r| r.value().clone())
    }

    pub fn update_template(&self, id: Uuid, changes: TemplateUpdate) -> OutreachResult<Template> {
        let mut entry = self
            .templates
            .get_mut(&id)
            .ok_or_else(|| OutreachError::NotFound(format!("Template {id} not found")))?;
        let template = entry.value_mut();
        if let Some(v) = changes.name {
            template.name = v;
        }
        if let Some(v) = changes.subject {
            template.subject = v;
        }
        if let Some(v) = changes.body {
            template.body = v;
        }
        if let Some(v) = changes.tone {
            template.tone = v;
        }
        if let Some(v) = changes.target_industry {
            template.target_industry = Some(v);
        }
        template.updated_at = Utc::now();
        Ok(template.clone())
    }

    /// Deleting a template cascades to its variations. Refused while any
    /// campaign that could still send references it; already-rendered
    /// emails of finished campaigns are self-contained and unaffected.
    pub fn delete_template(&self, id: Uuid) -> OutreachResult<()> {
        if !self.templates.contains_key(&id) {
            return Err(OutreachError::NotFound(format!("Template {id} not found")));
        }
        let in_use = self.campaigns.iter().any(|r| {
            r.value().template_id == id
                && matches!(
                    r.value().status,
                    CampaignStatus::Active | CampaignStatus::Scheduled | CampaignStatus::Paused
                )
        });
        if in_use {
            return Err(OutreachError::InvalidTransition(
                "Template is in use by an active or scheduled campaign. Stop it first.".to_string(),
            ));
        }

        let _tx = self.begin();
        self.templates.remove(&id);
        let variation_ids: Vec<Uuid> = self
            .variations
            .iter()
            .filter(|r| r.value().template_id == id)
            .map(|r| *r.key())
            .collect();
        for variation_id in variation_ids {
            self.variations.remove(&variation_id);
        }
        info!(template_id = %id, "template deleted");
        Ok(())
    }

    pub fn list_templates(&self, user_id: Uuid) -> Vec<Template> {
        let mut templates: Vec<Template> = self
            .templates
            .iter()
            .filter(|r| r.value().user_id == user_id)
            .map(|r| r.value().clone())
            .collect();
        templates.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        templates
    }

    /// Persist generated variations under a template. They arrive active
    /// and unmarked; performance evaluation decides winners later.
    pub fn add_variations(
        &self,
        template_id: Uuid,
        drafts: Vec<NewVariation>,
    ) -> OutreachResult<Vec<EmailVariation>> {
        if !self.templates.contains_key(&template_id) {
            return Err(OutreachError::NotFound(format!(
                "Template {template_id} not found"
            )));
        }

        let now = Utc::now();
        let mut created = Vec::with_capacity(drafts.len());
        for draft in drafts {
            let variation = EmailVariation {
                id: Uuid::new_v4(),
                template_id,
                name: draft.name,
                subject: draft.subject,
                body_html: draft.body_html,
                body_text: draft.body_text,
                framework: draft.framework,
                times_sent: 0,
                times_opened: 0,
                times_clicked: 0,
                times_replied: 0,
                open_rate: None,
                click_rate: None,
                reply_rate: None,
                is_active: true,
                is_winner: false,
                created_at: now,
            };
            self.variations.insert(variation.id, variation.clone());
            created.push(variation);
        }
        info!(
            template_id = %template_id,
            count = created.len(),
            "variations persisted"
        );
        Ok(created)
    }

    pub fn get_variation(&self, id: Uuid) -> Option<EmailVariation> {
        self.variations.get(&id).map(|r| r.value().clone())
    }

    /// Variations of a template in creation order.
    pub fn variations_for_template(&self, template_id: Uuid) -> Vec<EmailVariation> {
        let mut variations: Vec<EmailVariation> = self
            .variations
            .iter()
            .filter(|r| r.value().template_id == template_id)
            .map(|r| r.value().clone())
            .collect();
        variations.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        variations
    }

    pub fn active_variations(&self, template_id: Uuid) -> Vec<EmailVariation> {
        self.variations_for_template(template_id)
            .into_iter()
            .filter(|v| v.is_active)
            .collect()
    }

    pub fn set_variation_active(&self, id: Uuid, active: bool) -> OutreachResult<EmailVariation> {
        let mut entry = self
            .variations
            .get_mut(&id)
            .ok_or_else(|| OutreachError::NotFound(format!("Variation {id} not found")))?;
        entry.value_mut().is_active = active;
        Ok(entry.value().clone())
    }

    // ─── Performance evaluator support ─────────────────────────────────

    /// Every variation with at least one send, across all templates.
    pub fn variations_with_sends(&self) -> Vec<EmailVariation> {
        self.variations
            .iter()
            .filter(|r| r.value().times_sent > 0)
            .map(|r| r.value().clone())
            .collect()
    }

    pub fn update_variation_rates(
        &self,
        id: Uuid,
        open_rate: f64,
        click_rate: f64,
        reply_rate: f64,
    ) {
        if let Some(mut entry) = self.variations.get_mut(&id) {
            let v = entry.value_mut();
            v.open_rate = Some(open_rate);
            v.click_rate = Some(click_rate);
            v.reply_rate = Some(reply_rate);
        }
    }

    pub fn set_winner(&self, id: Uuid, is_winner: bool) {
        if let Some(mut entry) = self.variations.get_mut(&id) {
            entry.value_mut().is_winner = is_winner;
        }
    }

    // ─── Unsubscribe list ──────────────────────────────────────────────

    /// Upsert: re-adding an address refreshes reason and timestamp.
    pub fn upsert_unsubscribe(&self, email: &str, reason: Option<String>, at: DateTime<Utc>) {
        let key = email.trim().to_lowercase();
        self.unsubscribes.insert(
            key.clone(),
            Unsubscribe {
                email: key.clone(),
                reason,
                unsubscribed_at: at,
            },
        );
        info!(email = %key, "address added to unsubscribe list");
    }

    pub fn is_unsubscribed(&self, email: &str) -> bool {
        self.unsubscribes
            .contains_key(&email.trim().to_lowercase())
    }

    pub fn remove_unsubscribe(&self, email: &str) -> bool {
        self.unsubscribes
            .remove(&email.trim().to_lowercase())
            .is_some()
    }

    pub fn list_unsubscribes(&self) -> Vec<Unsubscribe> {
        let mut entries: Vec<Unsubscribe> = self
            .unsubscribes
            .iter()
            .map(|r| r.value().clone())
            .collect();
        entries.sort_by(|a, b| b.unsubscribed_at.cmp(&a.unsubscribed_at));
        entries
    }

    // ─── Emails ────────────────────────────────────────────────────────

    pub fn get_email(&self, id: Uuid) -> Option<Email> {
        self.emails.get(&id).map(|r| r.value().clone())
    }

    pub fn find_email_by_provider_id(&self, provider_id: &str) -> Option<Email> {
        let email_id = self.provider_index.get(provider_id)?;
        self.get_email(*email_id)
    }

    pub fn emails_for_campaign(&self, campaign_id: Uuid) -> Vec<Email> {
        let mut emails: Vec<Email> = self
            .emails
            .iter()
            .filter(|r| r.value().campaign_id == campaign_id)
            .map(|r| r.value().clone())
            .collect();
        emails.sort_by_key(|e| e.queue_seq);
        emails
    }

    // ─── Campaigns (reads) ─────────────────────────────────────────────

    pub fn get_campaign(&self, id: Uuid) -> Option<Campaign> {
        self.campaigns.get(&id).map(|r| r.value().clone())
    }

    pub fn list_campaigns(&self, user_id: Uuid) -> Vec<Campaign> {
        let mut campaigns: Vec<Campaign> = self
            .campaigns
            .iter()
            .filter(|r| r.value().user_id == user_id)
            .map(|r| r.value().clone())
            .collect();
        campaigns.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        campaigns
    }

    pub fn active_campaigns(&self) -> Vec<Campaign> {
        let mut campaigns: Vec<Campaign> = self
            .campaigns
            .iter()
            .filter(|r| r.value().status == CampaignStatus::Active)
            .map(|r| r.value().clone())
            .collect();
        campaigns.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        campaigns
    }
}

impl Default for OutreachStore {
    fn default() -> Self {
        Self::new()
    }
}
