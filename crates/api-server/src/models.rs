//! Request/response bodies and the error-to-status mapping.

use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use outreach_core::types::{LeadStatus, SendingStrategy};
use outreach_core::OutreachError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

/// Maps domain errors onto HTTP statuses. Everything user-correctable is
/// a 4xx; provider trouble is a 502; the rest is a 500 with the detail
/// kept out of the body.
pub fn error_response(err: OutreachError) -> ApiError {
    let (status, code) = match &err {
        OutreachError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
        OutreachError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_failed"),
        OutreachError::InvalidTransition(_) => (StatusCode::CONFLICT, "invalid_transition"),
        OutreachError::Serialization(_) => (StatusCode::BAD_REQUEST, "malformed_payload"),
        OutreachError::Transport(_) => (StatusCode::BAD_GATEWAY, "transport_error"),
        OutreachError::Generation(_) => (StatusCode::BAD_GATEWAY, "generation_failed"),
        OutreachError::Config(_) | OutreachError::Io(_) | OutreachError::Internal(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
        }
    };
    (
        status,
        Json(ErrorResponse {
            error: code.to_string(),
            message: err.to_string(),
        }),
    )
}

/// Ownership scope for list endpoints; stands in for an auth layer.
#[derive(Debug, Deserialize)]
pub struct OwnerQuery {
    pub user_id: Uuid,
}

// ─── Leads ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateLeadRequest {
    pub user_id: Uuid,
    pub business_name: String,
    pub contact_name: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub industry: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub notes: Option<String>,
    pub source: Option<String>,
}

/// Partial update; absent fields are left untouched.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateLeadRequest {
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

#[derive(Debug, Deserialize)]
pub struct ImportLeadsRequest {
    pub user_id: Uuid,
    pub leads: Vec<ImportLeadRow>,
}

#[derive(Debug, Deserialize)]
pub struct ImportLeadRow {
    pub business_name: String,
    pub contact_name: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub industry: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

// ─── Templates & variations ────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateTemplateRequest {
    pub user_id: Uuid,
    pub name: String,
    pub subject: String,
    pub body: String,
    pub tone: String,
    pub target_industry: Option<String>,
}

/// Partial update; absent fields are left untouched.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateTemplateRequest {
    pub name: Option<String>,
    pub subject: Option<String>,
    pub body: Option<String>,
    pub tone: Option<String>,
    pub target_industry: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SetVariationActiveRequest {
    pub is_active: bool,
}

// ─── Campaigns ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateCampaignRequest {
    pub user_id: Uuid,
    pub template_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub strategy: SendingStrategy,
    pub emails_per_hour: u32,
    pub emails_per_day: u32,
    pub send_window_start: u32,
    pub send_window_end: u32,
    #[serde(default)]
    pub send_weekdays_only: bool,
    pub scheduled_for: Option<DateTime<Utc>>,
    pub lead_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct LaunchRequest {
    #[serde(default = "default_true")]
    pub start_immediately: bool,
}

fn default_true() -> bool {
    true
}

// ─── Unsubscribes ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct UnsubscribeRequest {
    pub email: String,
    pub reason: Option<String>,
}

// ─── Webhook ───────────────────────────────────────────────────────────────

/// Always returned with HTTP 200; the provider must never see a failure
/// status for this endpoint.
#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub status: &'static str,
    pub disposition: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_facing_errors_are_4xx() {
        let (status, _) = error_response(OutreachError::NotFound("x".to_string()));
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = error_response(OutreachError::Validation("x".to_string()));
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) =
            error_response(OutreachError::InvalidTransition("already paused".to_string()));
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body.error, "invalid_transition");
        assert!(body.message.contains("already paused"));
    }

    #[test]
    fn test_provider_errors_are_502() {
        let (status, _) = error_response(OutreachError::Transport("down".to_string()));
        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }
}
