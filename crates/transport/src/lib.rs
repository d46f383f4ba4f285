//! Email transport boundary: the outbound send contract and the inbound
//! webhook event shapes the provider echoes back for correlation.

pub mod events;
pub mod resend;

use async_trait::async_trait;
use outreach_core::OutreachResult;

/// A fully rendered message handed to the provider. Tags are opaque
/// key/value pairs echoed back in later webhook events.
#[derive(Debug, Clone)]
pub struct OutboundEmail {
    pub from_email: String,
    pub from_name: String,
    pub to: String,
    pub subject: String,
    pub html: String,
    pub text: String,
    pub reply_to: Option<String>,
    pub tags: Vec<(String, String)>,
}

/// Provider acknowledgment of an accepted message.
#[derive(Debug, Clone)]
pub struct ProviderReceipt {
    /// Provider message id, the join key for asynchronous events.
    pub message_id: String,
}

/// Outbound email transport. Implementations are passed in explicitly so
/// tasks can take a test double; no module-level client instance exists.
#[async_trait]
pub trait EmailTransport: Send + Sync {
    async fn send(&self, message: &OutboundEmail) -> OutreachResult<ProviderReceipt>;
}

pub use events::{ProviderEvent, ProviderEventData, ProviderEventType};
pub use resend::{ResendConfig, ResendTransport};
