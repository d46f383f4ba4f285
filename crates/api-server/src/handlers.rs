//! Axum REST handlers.
//!
//! Every mutation returns a success value or an `{error, message}` body;
//! nothing here panics on bad input. The webhook handler is the one
//! deliberate exception to error propagation: it acknowledges with 200
//! no matter what, so a processing bug cannot trigger a provider retry
//! storm.

use crate::models::*;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use outreach_ai::{VariationGenerator, VariationRequest};
use outreach_core::types::*;
use outreach_dispatch::{CampaignDispatcher, DispatchReport};
use outreach_performance::{EvaluationReport, PerformanceEvaluator};
use outreach_store::{
    ImportReport, LeadImportRow, LeadUpdate, NewCampaign, NewLead, NewTemplate, NewVariation,
    OutreachStore, SenderIdentity, TemplateUpdate,
};
use outreach_tracking::{EngagementProcessor, EventDisposition};
use outreach_transport::ProviderEvent;
use std::sync::Arc;
use tracing::{error, warn};
use uuid::Uuid;

/// Shared API state. All collaborators are passed in explicitly at
/// construction; handlers hold no globals.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<OutreachStore>,
    pub dispatcher: Arc<CampaignDispatcher>,
    pub evaluator: Arc<PerformanceEvaluator>,
    pub processor: Arc<EngagementProcessor>,
    pub generator: Arc<dyn VariationGenerator>,
    pub sender: SenderIdentity,
}

// ─── Leads ─────────────────────────────────────────────────────────────────

pub async fn list_leads(
    State(state): State<AppState>,
    Query(query): Query<OwnerQuery>,
) -> Json<Vec<Lead>> {
    Json(state.store.list_leads(query.user_id))
}

pub async fn create_lead(
    State(state): State<AppState>,
    Json(req): Json<CreateLeadRequest>,
) -> Result<(StatusCode, Json<Lead>), ApiError> {
    let lead = state
        .store
        .create_lead(NewLead {
            user_id: req.user_id,
            business_name: req.business_name,
            contact_name: req.contact_name,
            email: req.email,
            phone: req.phone,
            address: req.address,
            industry: req.industry,
            tags: req.tags,
            notes: req.notes,
            source: req.source,
        })
        .map_err(error_response)?;
    metrics::counter!("api.leads_created").increment(1);
    Ok((StatusCode::CREATED, Json(lead)))
}

pub async fn get_lead(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Lead>, StatusCode> {
    state.store.get_lead(id).map(Json).ok_or(StatusCode::NOT_FOUND)
}

pub async fn update_lead(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateLeadRequest>,
) -> Result<Json<Lead>, ApiError> {
    state
        .store
        .update_lead(
            id,
            LeadUpdate {
                business_name: req.business_name,
                contact_name: req.contact_name,
                email: req.email,
                phone: req.phone,
                address: req.address,
                industry: req.industry,
                tags: req.tags,
                status: req.status,
                notes: req.notes,
            },
        )
        .map(Json)
        .map_err(error_response)
}

pub async fn delete_lead(State(state): State<AppState>, Path(id): Path<Uuid>) -> StatusCode {
    if state.store.delete_lead(id) {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

pub async fn import_leads(
    State(state): State<AppState>,
    Json(req): Json<ImportLeadsRequest>,
) -> Json<ImportReport> {
    let rows = req
        .leads
        .into_iter()
        .map(|r| LeadImportRow {
            business_name: r.business_name,
            contact_name: r.contact_name,
            email: r.email,
            phone: r.phone,
            address: r.address,
            industry: r.industry,
            tags: r.tags,
        })
        .collect();
    let report = state.store.import_leads(req.user_id, rows);
    metrics::counter!("api.leads_imported").increment(report.imported as u64);
    Json(report)
}

// ─── Templates & variations ────────────────────────────────────────────────

pub async fn list_templates(
    State(state): State<AppState>,
    Query(query): Query<OwnerQuery>,
) -> Json<Vec<Template>> {
    Json(state.store.list_templates(query.user_id))
}

pub async fn create_template(
    State(state): State<AppState>,
    Json(req): Json<CreateTemplateRequest>,
) -> (StatusCode, Json<Template>) {
    let template = state.store.create_template(NewTemplate {
        user_id: req.user_id,
        name: req.name,
        subject: req.subject,
        body: req.body,
        tone: req.tone,
        target_industry: req.target_industry,
    });
    (StatusCode::CREATED, Json(template))
}

pub async fn get_template(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Template>, StatusCode> {
    state
        .store
        .get_template(id)
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

pub async fn update_template(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTemplateRequest>,
) -> Result<Json<Template>, ApiError> {
    state
        .store
        .update_template(
            id,
            TemplateUpdate {
                name: req.name,
                subject: req.subject,
                body: req.body,
                tone: req.tone,
                target_industry: req.target_industry,
            },
        )
        .map(Json)
        .map_err(error_response)
}

pub async fn delete_template(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.store.delete_template(id).map_err(error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_variations(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Json<Vec<EmailVariation>> {
    Json(state.store.variations_for_template(id))
}

/// Generates variations for a template and persists them in one step.
pub async fn generate_variations(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<Vec<EmailVariation>>), ApiError> {
    let template = state
        .store
        .get_template(id)
        .ok_or_else(|| {
            error_response(outreach_core::OutreachError::NotFound(format!(
                "Template {id} not found"
            )))
        })?;

    let request = VariationRequest {
        master_subject: template.subject.clone(),
        master_body: template.body.clone(),
        tone: template.tone.clone(),
        target_industry: template.target_industry.clone(),
        sender_name: state.sender.name.clone(),
        sender_business: state.sender.name.clone(),
        portfolio_url: Some(state.sender.public_url.clone()),
    };
    let drafts = state
        .generator
        .generate(&request)
        .await
        .map_err(error_response)?;

    let variations = state
        .store
        .add_variations(
            id,
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
        .map_err(error_response)?;
    metrics::counter!("api.variations_generated").increment(variations.len() as u64);
    Ok((StatusCode::CREATED, Json(variations)))
}

pub async fn set_variation_active(
    State(state): State<AppState>,
    Path((_, variation_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<SetVariationActiveRequest>,
) -> Result<Json<EmailVariation>, ApiError> {
    state
        .store
        .set_variation_active(variation_id, req.is_active)
        .map(Json)
        .map_err(error_response)
}

// ─── Campaigns ─────────────────────────────────────────────────────────────

pub async fn list_campaigns(
    State(state): State<AppState>,
    Query(query): Query<OwnerQuery>,
) -> Json<Vec<Campaign>> {
    Json(state.store.list_campaigns(query.user_id))
}

pub async fn create_campaign(
    State(state): State<AppState>,
    Json(req): Json<CreateCampaignRequest>,
) -> Result<(StatusCode, Json<Campaign>), ApiError> {
    let campaign = state
        .store
        .create_campaign(NewCampaign {
            user_id: req.user_id,
            template_id: req.template_id,
            name: req.name,
            description: req.description,
            strategy: req.strategy,
            emails_per_hour: req.emails_per_hour,
            emails_per_day: req.emails_per_day,
            send_window_start: req.send_window_start,
            send_window_end: req.send_window_end,
            send_weekdays_only: req.send_weekdays_only,
            scheduled_for: req.scheduled_for,
            lead_ids: req.lead_ids,
        })
        .map_err(error_response)?;
    metrics::counter!("api.campaigns_created").increment(1);
    Ok((StatusCode::CREATED, Json(campaign)))
}

pub async fn get_campaign(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Campaign>, StatusCode> {
    state
        .store
        .get_campaign(id)
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

pub async fn delete_campaign(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.store.delete_campaign(id).map_err(error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn launch_campaign(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<LaunchRequest>,
) -> Result<Json<Campaign>, ApiError> {
    let campaign = state
        .store
        .launch_campaign(id, req.start_immediately, &state.sender)
        .map_err(error_response)?;
    metrics::counter!("api.campaigns_launched").increment(1);
    Ok(Json(campaign))
}

pub async fn pause_campaign(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Campaign>, ApiError> {
    state.store.pause_campaign(id).map(Json).map_err(error_response)
}

pub async fn resume_campaign(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Campaign>, ApiError> {
    state.store.resume_campaign(id).map(Json).map_err(error_response)
}

pub async fn cancel_campaign(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Campaign>, ApiError> {
    state.store.cancel_campaign(id).map(Json).map_err(error_response)
}

pub async fn campaign_emails(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Json<Vec<Email>> {
    Json(state.store.emails_for_campaign(id))
}

// ─── Emails ────────────────────────────────────────────────────────────────

pub async fn mark_replied(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Email>, ApiError> {
    state
        .processor
        .mark_replied(id, Utc::now())
        .map(Json)
        .map_err(error_response)
}

// ─── Unsubscribes ──────────────────────────────────────────────────────────

pub async fn list_unsubscribes(State(state): State<AppState>) -> Json<Vec<Unsubscribe>> {
    Json(state.store.list_unsubscribes())
}

pub async fn create_unsubscribe(
    State(state): State<AppState>,
    Json(req): Json<UnsubscribeRequest>,
) -> StatusCode {
    state.store.upsert_unsubscribe(&req.email, req.reason, Utc::now());
    StatusCode::CREATED
}

pub async fn delete_unsubscribe(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> StatusCode {
    if state.store.remove_unsubscribe(&email) {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

// ─── Webhook ───────────────────────────────────────────────────────────────

/// Provider endpoint verification probe.
pub async fn webhook_status() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "active" }))
}

/// Always HTTP 200. The body is taken raw and parsed by hand so that
/// malformed JSON (or a missing content-type) still gets an
/// acknowledgment; an extractor rejection here would put the provider
/// into a retry loop.
pub async fn handle_webhook(
    State(state): State<AppState>,
    body: Bytes,
) -> Json<WebhookAck> {
    let event: ProviderEvent = match serde_json::from_slice(&body) {
        Ok(event) => event,
        Err(e) => {
            warn!(error = %e, "unrecognized webhook payload, acknowledging anyway");
            return Json(WebhookAck {
                status: "ok",
                disposition: "ignored",
            });
        }
    };

    let disposition = match state.processor.handle_event(&event) {
        Ok(EventDisposition::Applied) => "applied",
        Ok(EventDisposition::Unmatched) => "unmatched",
        Err(e) => {
            error!(error = %e, "webhook event processing failed");
            "failed"
        }
    };
    Json(WebhookAck {
        status: "ok",
        disposition,
    })
}

// ─── Operational ───────────────────────────────────────────────────────────

pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "healthy" }))
}

// ─── Cron triggers ─────────────────────────────────────────────────────────

pub async fn trigger_dispatch(State(state): State<AppState>) -> Json<DispatchReport> {
    Json(state.dispatcher.run_once(Utc::now()).await)
}

pub async fn trigger_performance(State(state): State<AppState>) -> Json<EvaluationReport> {
    Json(state.evaluator.run_once())
}

#[cfg(test)]
mod tests {
    use super::*;
    use outreach_ai::{ClaudeConfig, ClaudeGenerator};
    use outreach_transport::{ResendConfig, ResendTransport};
    use std::time::Duration;

    fn test_state() -> AppState {
        let store = Arc::new(OutreachStore::new());
        let sender = SenderIdentity {
            name: "Joe Pocock".to_string(),
            email: "joe@example.com".to_string(),
            public_url: "http://localhost:8080".to_string(),
        };
        let transport = Arc::new(ResendTransport::new(ResendConfig {
            api_key: "re_test".to_string(),
        }));
        AppState {
            dispatcher: Arc::new(CampaignDispatcher::new(
                store.clone(),
                transport,
                sender.clone(),
                Duration::from_secs(5),
            )),
            evaluator: Arc::new(PerformanceEvaluator::new(store.clone())),
            processor: Arc::new(EngagementProcessor::new(store.clone())),
            generator: Arc::new(ClaudeGenerator::new(ClaudeConfig::default())),
            store,
            sender,
        }
    }

    #[tokio::test]
    async fn test_webhook_acks_garbage_payload() {
        let state = test_state();
        let body = serde_json::json!({ "type": "email.sent", "weird": true }).to_string();
        let ack = handle_webhook(State(state), Bytes::from(body)).await;
        assert_eq!(ack.status, "ok");
        assert_eq!(ack.disposition, "ignored");
    }

    #[tokio::test]
    async fn test_webhook_acks_non_json_body() {
        let state = test_state();
        let ack = handle_webhook(State(state), Bytes::from_static(b"this is not json {")).await;
        assert_eq!(ack.status, "ok");
        assert_eq!(ack.disposition, "ignored");
    }

    #[tokio::test]
    async fn test_webhook_acks_unknown_provider_id() {
        let state = test_state();
        let body = serde_json::json!({
            "type": "email.opened",
            "created_at": "2026-08-20T10:15:00Z",
            "data": { "email_id": "re_unknown" }
        })
        .to_string();
        let ack = handle_webhook(State(state), Bytes::from(body)).await;
        assert_eq!(ack.status, "ok");
        assert_eq!(ack.disposition, "unmatched");
    }

    #[tokio::test]
    async fn test_generate_variations_persists_drafts() {
        let state = test_state();
        let template = state.store.create_template(NewTemplate {
            user_id: Uuid::new_v4(),
            name: "t".to_string(),
            subject: "Quick question".to_string(),
            body: "I build websites.".to_string(),
            tone: "friendly".to_string(),
            target_industry: None,
        });

        let (status, Json(variations)) =
            generate_variations(State(state.clone()), Path(template.id))
                .await
                .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(variations.len(), 5);
        assert_eq!(state.store.variations_for_template(template.id).len(), 5);
    }

    #[tokio::test]
    async fn test_lifecycle_rejections_map_to_conflict() {
        let state = test_state();
        let template = state.store.create_template(NewTemplate {
            user_id: Uuid::new_v4(),
            name: "t".to_string(),
            subject: "s".to_string(),
            body: "b".to_string(),
            tone: "neutral".to_string(),
            target_industry: None,
        });
        let lead = state
            .store
            .create_lead(NewLead {
                user_id: template.user_id,
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
        let campaign = state
            .store
            .create_campaign(NewCampaign {
                user_id: template.user_id,
                template_id: template.id,
                name: "c".to_string(),
                description: None,
                strategy: SendingStrategy::Balanced,
                emails_per_hour: 10,
                emails_per_day: 100,
                send_window_start: 9,
                send_window_end: 17,
                send_weekdays_only: false,
                scheduled_for: None,
                lead_ids: vec![lead.id],
            })
            .unwrap();

        // Pausing a Draft campaign is an invalid transition → 409.
        let err = pause_campaign(State(state), Path(campaign.id))
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_update_lead_applies_partial_changes() {
        let state = test_state();
        let lead = state
            .store
            .create_lead(NewLead {
                user_id: Uuid::new_v4(),
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

        let Json(updated) = update_lead(
            State(state.clone()),
            Path(lead.id),
            Json(UpdateLeadRequest {
                status: Some(LeadStatus::Contacted),
                notes: Some("Left a voicemail".to_string()),
                ..Default::default()
            }),
        )
        .await
        .unwrap();
        assert_eq!(updated.status, LeadStatus::Contacted);
        assert_eq!(updated.email, "b@x.test");

        let err = update_lead(
            State(state),
            Path(Uuid::new_v4()),
            Json(UpdateLeadRequest::default()),
        )
        .await
        .unwrap_err();
        assert_eq!(err.0, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_template_update_and_delete() {
        let state = test_state();
        let template = state.store.create_template(NewTemplate {
            user_id: Uuid::new_v4(),
            name: "t".to_string(),
            subject: "s".to_string(),
            body: "b".to_string(),
            tone: "neutral".to_string(),
            target_industry: None,
        });

        let Json(updated) = update_template(
            State(state.clone()),
            Path(template.id),
            Json(UpdateTemplateRequest {
                subject: Some("Better subject".to_string()),
                ..Default::default()
            }),
        )
        .await
        .unwrap();
        assert_eq!(updated.subject, "Better subject");
        assert_eq!(updated.body, "b");

        let status = delete_template(State(state.clone()), Path(template.id))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(state.store.get_template(template.id).is_none());
    }

    #[tokio::test]
    async fn test_set_variation_active_requires_explicit_flag() {
        let state = test_state();
        let template = state.store.create_template(NewTemplate {
            user_id: Uuid::new_v4(),
            name: "t".to_string(),
            subject: "s".to_string(),
            body: "b".to_string(),
            tone: "neutral".to_string(),
            target_industry: None,
        });
        let variations = state
            .store
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

        let Json(toggled) = set_variation_active(
            State(state.clone()),
            Path((template.id, variations[0].id)),
            Json(SetVariationActiveRequest { is_active: false }),
        )
        .await
        .unwrap();
        assert!(!toggled.is_active);
    }

    #[tokio::test]
    async fn test_duplicate_lead_maps_to_bad_request() {
        let state = test_state();
        let user = Uuid::new_v4();
        let req = || CreateLeadRequest {
            user_id: user,
            business_name: "B".to_string(),
            contact_name: None,
            email: "dup@x.test".to_string(),
            phone: None,
            address: None,
            industry: None,
            tags: vec![],
            notes: None,
            source: None,
        };

        create_lead(State(state.clone()), Json(req())).await.unwrap();
        let err = create_lead(State(state.clone()), Json(req()))
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);
    }
}
