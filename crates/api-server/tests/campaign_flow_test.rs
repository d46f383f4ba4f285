//! Integration test for the full campaign flow: variation generation,
//! launch, dispatch, engagement webhooks, and winner evaluation.

use chrono::{TimeZone, Utc};
use outreach_ai::{ClaudeConfig, ClaudeGenerator, VariationGenerator, VariationRequest};
use outreach_core::types::*;
use outreach_dispatch::CampaignDispatcher;
use outreach_performance::PerformanceEvaluator;
use outreach_store::{
    NewCampaign, NewLead, NewTemplate, NewVariation, OutreachStore, SenderIdentity,
};
use outreach_tracking::{EngagementProcessor, EventDisposition};
use outreach_transport::{ProviderEvent, ResendConfig, ResendTransport};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

fn sender() -> SenderIdentity {
    SenderIdentity {
        name: "Joe Pocock".to_string(),
        email: "joe@example.com".to_string(),
        public_url: "http://localhost:8080".to_string(),
    }
}

fn provider_event(event_type: &str, provider_id: &str) -> ProviderEvent {
    serde_json::from_value(serde_json::json!({
        "type": event_type,
        "created_at": "2026-09-01T11:00:00Z",
        "data": { "email_id": provider_id }
    }))
    .unwrap()
}

#[tokio::test]
async fn test_full_campaign_flow() {
    let store = Arc::new(OutreachStore::new());
    let user = Uuid::new_v4();

    // Template plus AI-generated variations, persisted the way the API
    // layer does it.
    let template = store.create_template(NewTemplate {
        user_id: user,
        name: "Local business outreach".to_string(),
        subject: "Quick question about {{businessName}}".to_string(),
        body: "I noticed {{businessName}} has no website yet.".to_string(),
        tone: "friendly".to_string(),
        target_industry: Some("restaurant".to_string()),
    });
    let generator = ClaudeGenerator::new(ClaudeConfig::default());
    let drafts = generator
        .generate(&VariationRequest {
            master_subject: template.subject.clone(),
            master_body: template.body.clone(),
            tone: template.tone.clone(),
            target_industry: template.target_industry.clone(),
            sender_name: "Joe".to_string(),
            sender_business: "Pocock Web".to_string(),
            portfolio_url: None,
        })
        .await
        .unwrap();
    assert_eq!(drafts.len(), 5);
    store
        .add_variations(
            template.id,
            drafts
                .into_iter()
                .map(|d| NewVariation {
                    name: d.name,
                    subject: d.subject,
                    body_html: d.body_html,
                    body_text: d.body_text,
                    framework: d.framework,
                })
                .collect(),
        )
        .unwrap();

    // Ten leads, one campaign, launched immediately.
    let lead_ids: Vec<Uuid> = (0..10)
        .map(|i| {
            store
                .create_lead(NewLead {
                    user_id: user,
                    business_name: format!("Business {i}"),
                    contact_name: Some(format!("Owner {i}")),
                    email: format!("owner{i}@business.test"),
                    phone: None,
                    address: None,
                    industry: Some("restaurant".to_string()),
                    tags: vec![],
                    notes: None,
                    source: Some("integration".to_string()),
                })
                .unwrap()
                .id
        })
        .collect();
    let campaign = store
        .create_campaign(NewCampaign {
            user_id: user,
            template_id: template.id,
            name: "Cardiff restaurants".to_string(),
            description: None,
            strategy: SendingStrategy::Balanced,
            emails_per_hour: 100,
            emails_per_day: 500,
            send_window_start: 0,
            send_window_end: 24,
            send_weekdays_only: false,
            scheduled_for: None,
            lead_ids,
        })
        .unwrap();
    store.launch_campaign(campaign.id, true, &sender()).unwrap();

    // Rendering happened at launch: placeholders resolved, footer present.
    let queued = store.emails_for_campaign(campaign.id);
    assert_eq!(queued.len(), 10);
    assert!(queued.iter().all(|e| e.status == EmailStatus::Queued));
    assert!(queued[0].subject.contains("Business"));
    assert!(!queued[0].subject.contains("{{"));
    assert!(queued[0].body_html.contains("/unsubscribe?email="));

    // One dispatch run sends everything and completes the campaign.
    let transport = Arc::new(ResendTransport::new(ResendConfig {
        api_key: "re_test".to_string(),
    }));
    let dispatcher = CampaignDispatcher::new(
        store.clone(),
        transport,
        sender(),
        Duration::from_secs(5),
    );
    let now = Utc.with_ymd_and_hms(2026, 9, 1, 10, 0, 0).unwrap();
    let report = dispatcher.run_once(now).await;
    assert_eq!(report.total_sent(), 10);
    assert_eq!(report.completed, vec![campaign.id]);

    let campaign_after = store.get_campaign(campaign.id).unwrap();
    assert_eq!(campaign_after.status, CampaignStatus::Completed);
    assert_eq!(campaign_after.emails_sent, 10);

    // Engagement events arrive via webhook, keyed by provider id.
    let emails = store.emails_for_campaign(campaign.id);
    let first = &emails[0];
    let provider_id = first.provider_id.clone().unwrap();
    let processor = EngagementProcessor::new(store.clone());

    for event_type in ["email.delivered", "email.opened", "email.clicked"] {
        let disposition = processor
            .handle_event(&provider_event(event_type, &provider_id))
            .unwrap();
        assert_eq!(disposition, EventDisposition::Applied);
    }
    // A replayed open does not double-count.
    processor
        .handle_event(&provider_event("email.opened", &provider_id))
        .unwrap();

    let tracked = store.get_email(first.id).unwrap();
    assert_eq!(tracked.status, EmailStatus::Clicked);
    assert!(tracked.opened_at.is_some());
    processor.mark_replied(first.id, Utc::now()).unwrap();

    let campaign_after = store.get_campaign(campaign.id).unwrap();
    assert_eq!(campaign_after.emails_opened, 1);
    assert_eq!(campaign_after.emails_clicked, 1);
    assert_eq!(campaign_after.emails_replied, 1);
    assert_eq!(
        store.get_lead(first.lead_id).unwrap().status,
        LeadStatus::Responded
    );

    // Evaluation recomputes rates; nothing wins at this volume.
    let evaluation = PerformanceEvaluator::new(store.clone()).run_once();
    assert_eq!(evaluation.variations_updated, 5);
    assert_eq!(evaluation.winners_marked, 0);
    let variation = store.get_variation(first.variation_id).unwrap();
    assert_eq!(variation.open_rate, Some(0.5));
    assert!(!variation.is_winner);
}

#[tokio::test]
async fn test_cancelled_campaign_fails_queued_and_blocks_resume() {
    let store = Arc::new(OutreachStore::new());
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
                subject: "s".to_string(),
                body_html: "<p>h</p>".to_string(),
                body_text: "h".to_string(),
                framework: "Direct".to_string(),
            }],
        )
        .unwrap();
    let lead = store
        .create_lead(NewLead {
            user_id: user,
            business_name: "B".to_string(),
            contact_name: None,
            email: "b@x.test".to_string(),
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
    store.launch_campaign(campaign.id, true, &sender()).unwrap();

    store.cancel_campaign(campaign.id).unwrap();
    let emails = store.emails_for_campaign(campaign.id);
    assert_eq!(emails[0].status, EmailStatus::Failed);
    assert_eq!(emails[0].error_message.as_deref(), Some("Campaign cancelled"));

    // A cancelled campaign is out of every lifecycle path except delete.
    assert!(store.resume_campaign(campaign.id).is_err());
    assert!(store.pause_campaign(campaign.id).is_err());
    store.delete_campaign(campaign.id).unwrap();
    assert!(store.get_campaign(campaign.id).is_none());
    assert!(store.emails_for_campaign(campaign.id).is_empty());
}
