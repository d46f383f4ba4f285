//! Model-output parsing. The provider is asked for a bare JSON array but
//! routinely wraps it in a markdown code fence and omits fields, so
//! parsing strips fences and backfills every field from the request
//! rather than failing the whole generation.

use crate::generator::VariationRequest;
use outreach_core::render::html_to_plain_text;
use outreach_core::{OutreachError, OutreachResult};
use serde::{Deserialize, Serialize};

/// One normalized variation ready for persistence. All fields are
/// guaranteed non-empty apart from `tone_analysis`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariationDraft {
    pub name: String,
    pub subject: String,
    pub body_html: String,
    pub body_text: String,
    pub framework: String,
    pub estimated_length: u32,
    pub tone_analysis: String,
}

/// Raw model output, camelCase with every field optional.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawVariation {
    variation_name: Option<String>,
    subject: Option<String>,
    body_html: Option<String>,
    body_text: Option<String>,
    copywriting_framework: Option<String>,
    estimated_length: Option<u32>,
    tone_analysis: Option<String>,
}

/// Drops ```json / ``` fence lines the model may wrap the array in.
fn strip_code_fences(raw: &str) -> String {
    raw.trim()
        .replace("```json\n", "")
        .replace("```json", "")
        .replace("```\n", "")
        .replace("```", "")
        .trim()
        .to_string()
}

/// Parses the model response into normalized drafts. An empty array is a
/// generation failure: the caller asked for five variations and can do
/// nothing with zero.
pub fn parse_variations(
    raw: &str,
    request: &VariationRequest,
) -> OutreachResult<Vec<VariationDraft>> {
    let clean = strip_code_fences(raw);
    let parsed: Vec<RawVariation> = serde_json::from_str(&clean)
        .map_err(|e| OutreachError::Generation(format!("Unparseable model response: {e}")))?;

    if parsed.is_empty() {
        return Err(OutreachError::Generation(
            "Model returned no variations".to_string(),
        ));
    }

    Ok(parsed.into_iter().map(|v| normalize(v, request)).collect())
}

fn normalize(raw: RawVariation, request: &VariationRequest) -> VariationDraft {
    let body_text = match raw.body_text {
        Some(text) if !text.is_empty() => text,
        _ => raw
            .body_html
            .as_deref()
            .map(html_to_plain_text)
            .unwrap_or_default(),
    };
    let body_html = match raw.body_html {
        Some(html) if !html.is_empty() => html,
        _ => format!("<p>{body_text}</p>"),
    };
    let estimated_length = raw
        .estimated_length
        .unwrap_or_else(|| body_text.split_whitespace().count().max(1) as u32);

    VariationDraft {
        name: raw
            .variation_name
            .unwrap_or_else(|| "Unnamed Variation".to_string()),
        subject: raw
            .subject
            .unwrap_or_else(|| request.master_subject.clone()),
        body_html,
        body_text,
        framework: raw
            .copywriting_framework
            .unwrap_or_else(|| "Direct".to_string()),
        estimated_length,
        tone_analysis: raw.tone_analysis.unwrap_or_else(|| request.tone.clone()),
    }
}
