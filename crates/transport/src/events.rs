//! Inbound webhook event payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Event kinds the provider delivers asynchronously. Accepts both the
/// bare form (`delivered`) and the provider's dotted form
/// (`email.delivered`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProviderEventType {
    #[serde(rename = "delivered", alias = "email.delivered")]
    Delivered,
    #[serde(rename = "bounced", alias = "email.bounced")]
    Bounced,
    #[serde(rename = "opened", alias = "email.opened")]
    Opened,
    #[serde(rename = "clicked", alias = "email.clicked")]
    Clicked,
    #[serde(rename = "complained", alias = "email.complained")]
    Complained,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderEventData {
    /// Provider message id the event refers to.
    pub email_id: String,
}

/// Webhook callback body: `{type, created_at, data: {email_id}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderEvent {
    #[serde(rename = "type")]
    pub event_type: ProviderEventType,
    pub created_at: DateTime<Utc>,
    pub data: ProviderEventData,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_dotted_event_type() {
        let payload = r#"{
            "type": "email.opened",
            "created_at": "2026-08-20T10:15:00Z",
            "data": { "email_id": "re_abc123" }
        }"#;
        let event: ProviderEvent = serde_json::from_str(payload).unwrap();
        assert_eq!(event.event_type, ProviderEventType::Opened);
        assert_eq!(event.data.email_id, "re_abc123");
    }

    #[test]
    fn test_parses_bare_event_type() {
        let payload = r#"{
            "type": "bounced",
            "created_at": "2026-08-20T10:15:00Z",
            "data": { "email_id": "re_xyz" }
        }"#;
        let event: ProviderEvent = serde_json::from_str(payload).unwrap();
        assert_eq!(event.event_type, ProviderEventType::Bounced);
    }

    #[test]
    fn test_unknown_event_type_rejected() {
        let payload = r#"{
            "type": "email.sent",
            "created_at": "2026-08-20T10:15:00Z",
            "data": { "email_id": "re_xyz" }
        }"#;
        assert!(serde_json::from_str::<ProviderEvent>(payload).is_err());
    }
}
