//! Email rendering: `{{key}}` substitution plus the mandatory compliance
//! footer. Rendering happens once, at email-row creation time; the
//! dispatch loop sends the stored content verbatim.

use std::collections::HashMap;

/// Input to a single render: the variation content, the per-lead
/// variable map, and the sender identity for the footer.
#[derive(Debug, Clone)]
pub struct RenderInput<'a> {
    pub subject: &'a str,
    pub body_html: &'a str,
    pub body_text: &'a str,
    pub variables: &'a HashMap<String, String>,
    pub include_footer: bool,
    pub sender_name: &'a str,
    pub sender_email: &'a str,
    pub lead_email: &'a str,
    /// Base URL the unsubscribe link is built from.
    pub public_url: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub subject: String,
    pub body_html: String,
    pub body_text: String,
}

/// Replace every `{{key}}` placeholder with its mapped value. Unmatched
/// placeholders are deleted, not left literal, so template syntax never
/// leaks to a recipient.
pub fn substitute(text: &str, variables: &HashMap<String, String>) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(open) = rest.find("{{") {
        out.push_str(&rest[..open]);
        let after = &rest[open + 2..];
        match after.find("}}") {
            Some(close) => {
                let key = after[..close].trim();
                if let Some(value) = variables.get(key) {
                    out.push_str(value);
                }
                rest = &after[close + 2..];
            }
            None => {
                // Unterminated placeholder: keep the raw text.
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

pub fn unsubscribe_url(public_url: &str, lead_email: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(lead_email.as_bytes()).collect();
    format!("{}/unsubscribe?email={}", public_url.trim_end_matches('/'), encoded)
}

fn html_footer(sender_name: &str, sender_email: &str, unsubscribe: &str) -> String {
    format!(
        "<br><br>\
         <hr style=\"border: none; border-top: 1px solid #e5e7eb; margin: 20px 0;\">\
         <p style=\"font-size: 12px; color: #6b7280; line-height: 1.5;\">\
         {sender_name}<br>{sender_email}<br>\
         <a href=\"{unsubscribe}\" style=\"color: #6b7280;\">Unsubscribe</a></p>"
    )
}

fn text_footer(sender_name: &str, sender_email: &str, unsubscribe: &str) -> String {
    format!("\n\n---\n{sender_name}\n{sender_email}\nUnsubscribe: {unsubscribe}")
}

/// Render subject and both bodies, appending the compliance footer.
pub fn render_email(input: &RenderInput<'_>) -> RenderedEmail {
    let subject = substitute(input.subject, input.variables);
    let mut body_html = substitute(input.body_html, input.variables);
    let mut body_text = substitute(input.body_text, input.variables);

    if input.include_footer {
        let unsubscribe = unsubscribe_url(input.public_url, input.lead_email);
        body_html.push_str(&html_footer(
            input.sender_name,
            input.sender_email,
            &unsubscribe,
        ));
        body_text.push_str(&text_footer(
            input.sender_name,
            input.sender_email,
            &unsubscribe,
        ));
    }

    RenderedEmail {
        subject,
        body_html,
        body_text,
    }
}

/// Best-effort HTML to plain text conversion for variations generated
/// without a text body.
pub fn html_to_plain_text(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut chars = html.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '<' {
            let mut tag = String::new();
            for t in chars.by_ref() {
                if t == '>' {
                    break;
                }
                tag.push(t);
            }
            let tag = tag.trim().to_ascii_lowercase();
            if tag.starts_with("br") {
                out.push('\n');
            } else if tag == "/p" {
                out.push_str("\n\n");
            }
        } else {
            out.push(c);
        }
    }

    let decoded = out
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"");

    // Collapse runs of 3+ newlines down to a blank line.
    let mut collapsed = String::with_capacity(decoded.len());
    let mut newlines = 0;
    for c in decoded.chars() {
        if c == '\n' {
            newlines += 1;
            if newlines <= 2 {
                collapsed.push(c);
            }
        } else {
            newlines = 0;
            collapsed.push(c);
        }
    }
    collapsed.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_substitute_round_trip() {
        let variables = vars(&[("businessName", "Acme"), ("contactName", "Jo")]);
        let result = substitute("Hi {{contactName}} at {{businessName}}", &variables);
        assert_eq!(result, "Hi Jo at Acme");
    }

    #[test]
    fn test_unmatched_placeholder_removed() {
        let variables = vars(&[("contactName", "Jo")]);
        let result = substitute("Hi {{contactName}}, about {{unknownVar}} today", &variables);
        assert_eq!(result, "Hi Jo, about  today");
        assert!(!result.contains("{{"));
    }

    #[test]
    fn test_unterminated_placeholder_kept_literal() {
        let variables = vars(&[]);
        assert_eq!(substitute("broken {{tail", &variables), "broken {{tail");
    }

    #[test]
    fn test_footer_appended_with_encoded_address() {
        let variables = vars(&[]);
        let input = RenderInput {
            subject: "Hello",
            body_html: "<p>Hi</p>",
            body_text: "Hi",
            variables: &variables,
            include_footer: true,
            sender_name: "Joe Pocock",
            sender_email: "joe@example.com",
            lead_email: "sarah+leads@thepotbistro.co.uk",
            public_url: "https://outreach.example.com/",
        };
        let rendered = render_email(&input);

        assert!(rendered
            .body_html
            .contains("https://outreach.example.com/unsubscribe?email=sarah%2Bleads%40thepotbistro.co.uk"));
        assert!(rendered.body_text.ends_with(
            "Unsubscribe: https://outreach.example.com/unsubscribe?email=sarah%2Bleads%40thepotbistro.co.uk"
        ));
        assert!(rendered.body_html.contains("Joe Pocock"));
        assert_eq!(rendered.subject, "Hello");
    }

    #[test]
    fn test_no_footer_when_disabled() {
        let variables = vars(&[]);
        let input = RenderInput {
            subject: "s",
            body_html: "<p>b</p>",
            body_text: "b",
            variables: &variables,
            include_footer: false,
            sender_name: "n",
            sender_email: "e@x.com",
            lead_email: "l@x.com",
            public_url: "http://localhost",
        };
        let rendered = render_email(&input);
        assert_eq!(rendered.body_html, "<p>b</p>");
        assert_eq!(rendered.body_text, "b");
    }

    #[test]
    fn test_html_to_plain_text() {
        let html = "<p>Hello&nbsp;there</p><p>Fish &amp; chips<br>tonight</p>";
        assert_eq!(
            html_to_plain_text(html),
            "Hello there\n\nFish & chips\ntonight"
        );
    }
}
