//! Webhook event processing. The provider retries deliveries it thinks
//! failed, so every path here must be safe to replay, and the caller is
//! expected to acknowledge regardless of the disposition we return.

use chrono::{DateTime, Utc};
use outreach_core::types::Email;
use outreach_core::OutreachResult;
use outreach_store::OutreachStore;
use outreach_transport::{ProviderEvent, ProviderEventType};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// What happened to an inbound event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventDisposition {
    /// The event matched an email and its transition was applied.
    Applied,
    /// No stored email carries this provider id. Events can arrive for
    /// messages sent outside this system or already deleted; they are
    /// acknowledged and dropped.
    Unmatched,
}

pub struct EngagementProcessor {
    store: Arc<OutreachStore>,
}

impl EngagementProcessor {
    pub fn new(store: Arc<OutreachStore>) -> Self {
        Self { store }
    }

    /// Apply one provider event. Errors here mean the event matched an
    /// email but the transition failed; unmatched events are not errors.
    pub fn handle_event(&self, event: &ProviderEvent) -> OutreachResult<EventDisposition> {
        let email = match self.store.find_email_by_provider_id(&event.data.email_id) {
            Some(email) => email,
            None => {
                info!(
                    provider_id = %event.data.email_id,
                    event = ?event.event_type,
                    "event does not match any email, dropping"
                );
                metrics::counter!("tracking.events_unmatched").increment(1);
                return Ok(EventDisposition::Unmatched);
            }
        };

        let at = event.created_at;
        match event.event_type {
            ProviderEventType::Delivered => self.store.record_delivered(email.id, at)?,
            ProviderEventType::Bounced => {
                warn!(email_id = %email.id, "email bounced");
                self.store.record_bounced(email.id, at)?;
            }
            ProviderEventType::Opened => self.store.record_opened(email.id, at)?,
            ProviderEventType::Clicked => self.store.record_clicked(email.id, at)?,
            ProviderEventType::Complained => {
                warn!(email_id = %email.id, "spam complaint received");
                self.store.record_complaint(email.id, at)?;
            }
        }

        metrics::counter!("tracking.events_applied").increment(1);
        Ok(EventDisposition::Applied)
    }

    /// Reply detection is manual (the user saw a reply in their inbox),
    /// so it arrives by email id rather than provider id.
    pub fn mark_replied(&self, email_id: Uuid, now: DateTime<Utc>) -> OutreachResult<Email> {
        let email = self.store.mark_replied(email_id, now)?;
        metrics::counter!("tracking.replies_recorded").increment(1);
        Ok(email)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use outreach_core::types::*;
    use outreach_store::{NewCampaign, NewLead, NewTemplate, NewVariation, SenderIdentity};

    fn event(event_type: ProviderEventType, provider_id: &str) -> ProviderEvent {
        serde_json::from_value(serde_json::json!({
            "type": match event_type {
                ProviderEventType::Delivered => "email.delivered",
                ProviderEventType::Bounced => "email.bounced",
                ProviderEventType::Opened => "email.opened",
                ProviderEventType::Clicked => "email.clicked",
                ProviderEventType::Complained => "email.complained",
            },
            "created_at": "2026-08-20T10:15:00Z",
            "data": { "email_id": provider_id }
        }))
        .unwrap()
    }

    /// One launched campaign with a single sent email, provider id "re_1".
    fn sent_email(store: &OutreachStore) -> Email {
        let user = Uuid::new_v4();
        let template = store.create_template(NewTemplate {
            user_id: user,
            name: "t".to_string(),
            subject: "s".to_string(),
            body: "b".to_string(),
            tone: "neutral".to_string(),
            target_industry: None,
        });
        store
            .add_variations(
                template.id,
                vec![NewVariation {
                    name: "v".to_string(),
                    subject: "subject".to_string(),
                    body_html: "<p>hi</p>".to_string(),
                    body_text: "hi".to_string(),
                    framework: "Direct".to_string(),
                }],
            )
            .unwrap();
        let lead = store
            .create_lead(NewLead {
                user_id: user,
                business_name: "B".to_string(),
                contact_name: None,
                email: "owner@b.com".to_string(),
                phone: None,
                address: None,
                industry: None,
                tags: vec![],
                notes: None,
                source: None,
            })
            .unwrap();
        let campaign = store
            .create_campaign(NewCampaign {
                user_id: user,
                template_id: template.id,
                name: "c".to_string(),
                description: None,
                strategy: SendingStrategy::Balanced,
                emails_per_hour: 10,
                emails_per_day: 100,
                send_window_start: 0,
                send_window_end: 24,
                send_weekdays_only: false,
                scheduled_for: None,
                lead_ids: vec![lead.id],
            })
            .unwrap();
        store
            .launch_campaign(
                campaign.id,
                true,
                &SenderIdentity {
                    name: "n".to_string(),
                    email: "n@x.com".to_string(),
                    public_url: "http://localhost".to_string(),
                },
            )
            .unwrap();
        let email = store.claim_queued(campaign.id, 1).remove(0);
        store
            .record_send_success(email.id, "re_1", Utc::now())
            .unwrap();
        store.get_email(email.id).unwrap()
    }

    #[test]
    fn test_applies_event_to_matched_email() {
        let store = Arc::new(OutreachStore::new());
        let email = sent_email(&store);
        let processor = EngagementProcessor::new(store.clone());

        let disposition = processor
            .handle_event(&event(ProviderEventType::Opened, "re_1"))
            .unwrap();
        assert_eq!(disposition, EventDisposition::Applied);
        assert_eq!(
            store.get_email(email.id).unwrap().status,
            EmailStatus::Opened
        );
    }

    #[test]
    fn test_unknown_provider_id_is_acknowledged_noop() {
        let store = Arc::new(OutreachStore::new());
        sent_email(&store);
        let processor = EngagementProcessor::new(store);

        let disposition = processor
            .handle_event(&event(ProviderEventType::Clicked, "re_nobody"))
            .unwrap();
        assert_eq!(disposition, EventDisposition::Unmatched);
    }

    #[test]
    fn test_replayed_open_stays_applied() {
        let store = Arc::new(OutreachStore::new());
        let email = sent_email(&store);
        let processor = EngagementProcessor::new(store.clone());
        let open = event(ProviderEventType::Opened, "re_1");

        processor.handle_event(&open).unwrap();
        let disposition = processor.handle_event(&open).unwrap();

        // The replay is applied-and-ignored, never an error.
        assert_eq!(disposition, EventDisposition::Applied);
        assert_eq!(
            store.get_variation(email.variation_id).unwrap().times_opened,
            1
        );
    }

    #[test]
    fn test_complaint_unsubscribes_recipient() {
        let store = Arc::new(OutreachStore::new());
        sent_email(&store);
        let processor = EngagementProcessor::new(store.clone());

        processor
            .handle_event(&event(ProviderEventType::Complained, "re_1"))
            .unwrap();
        assert!(store.is_unsubscribed("owner@b.com"));
    }

    #[test]
    fn test_mark_replied_flows_through() {
        let store = Arc::new(OutreachStore::new());
        let email = sent_email(&store);
        let processor = EngagementProcessor::new(store.clone());

        let updated = processor.mark_replied(email.id, Utc::now()).unwrap();
        assert_eq!(updated.status, EmailStatus::Replied);
        assert_eq!(
            store.get_lead(email.lead_id).unwrap().status,
            LeadStatus::Responded
        );
    }
}
