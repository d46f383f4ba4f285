//! Prompt construction for variation generation.

use crate::generator::VariationRequest;

/// The copywriting frameworks every generation request asks for, with
/// the one-line brief the model is given for each.
pub const FRAMEWORKS: [(&str, &str); 5] = [
    (
        "PAS",
        "Problem-Agitate-Solution - Start with the problem, amplify the pain, offer solution",
    ),
    (
        "AIDA",
        "Attention-Interest-Desire-Action - Grab attention, build interest, create desire, call to action",
    ),
    (
        "BAB",
        "Before-After-Bridge - Paint the current state, show the future, bridge with your solution",
    ),
    (
        "FAB",
        "Feature-Advantage-Benefit - State feature, explain advantage, describe benefit",
    ),
    (
        "Direct",
        "Straightforward value proposition - Get right to the point with clear value",
    ),
];

/// Builds the full generation prompt. The model is told to return a bare
/// JSON array; `parse::parse_variations` tolerates a fenced one anyway.
pub fn build_variation_prompt(request: &VariationRequest) -> String {
    let mut framework_list = String::new();
    for (i, (name, brief)) in FRAMEWORKS.iter().enumerate() {
        framework_list.push_str(&format!("{}. {} ({})\n", i + 1, name, brief));
    }

    format!(
        "You are an expert email copywriter. Generate {count} cold email variations \
for outreach to local businesses.

MASTER TEMPLATE:
Subject: {subject}
Body: {body}

BUSINESS CONTEXT:
- Sender: {sender_name} from {sender_business}
- Portfolio: {portfolio}
- Target: {industry} businesses
- Desired tone: {tone}

REQUIREMENTS:
Create {count} variations using these frameworks:
{frameworks}
Each variation must:
- Keep subject under 50 characters
- Body between 80-150 words
- Include clear CTA (call to action)
- Feel human and authentic (not salesy)
- Use {{{{businessName}}}} and {{{{contactName}}}} variables for personalization
- Maintain the core message but vary structure and approach

Return as JSON array with this exact format:
[
  {{
    \"variationName\": \"PAS Format\",
    \"subject\": \"the email subject\",
    \"bodyText\": \"plain text email body\",
    \"bodyHtml\": \"HTML formatted email body with <p> tags\",
    \"copywritingFramework\": \"PAS\",
    \"estimatedLength\": 120,
    \"toneAnalysis\": \"professional with empathy\"
  }}
]

Return ONLY the JSON array, no other text.",
        count = FRAMEWORKS.len(),
        subject = request.master_subject,
        body = request.master_body,
        sender_name = request.sender_name,
        sender_business = request.sender_business,
        portfolio = request.portfolio_url.as_deref().unwrap_or("[portfolio URL]"),
        industry = request.target_industry.as_deref().unwrap_or("local"),
        tone = request.tone,
        frameworks = framework_list,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> VariationRequest {
        VariationRequest {
            master_subject: "Quick question about your storefront".to_string(),
            master_body: "I build websites for local shops.".to_string(),
            tone: "friendly".to_string(),
            target_industry: Some("cafe".to_string()),
            sender_name: "Joe".to_string(),
            sender_business: "Pocock Web".to_string(),
            portfolio_url: None,
        }
    }

    #[test]
    fn test_prompt_includes_all_frameworks() {
        let prompt = build_variation_prompt(&request());
        for (name, _) in FRAMEWORKS {
            assert!(prompt.contains(name), "missing framework {name}");
        }
    }

    #[test]
    fn test_prompt_keeps_placeholder_syntax_literal() {
        let prompt = build_variation_prompt(&request());
        // Personalization variables must reach the model verbatim.
        assert!(prompt.contains("{{businessName}}"));
        assert!(prompt.contains("{{contactName}}"));
        assert!(prompt.contains("Subject: Quick question about your storefront"));
    }

    #[test]
    fn test_prompt_defaults_for_missing_optionals() {
        let mut req = request();
        req.target_industry = None;
        let prompt = build_variation_prompt(&req);
        assert!(prompt.contains("Target: local businesses"));
        assert!(prompt.contains("Portfolio: [portfolio URL]"));
    }
}
