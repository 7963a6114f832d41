//! The confirmation email body

use askama::Template;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static BLOCK_END: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<br\s*/?>|</(p|div|h1)>").expect("Invalid block end regex pattern")
});

static TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]+>").expect("Invalid tag regex pattern"));

static GAP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n[ \t]*(\n[ \t]*)+").expect("Invalid gap regex pattern"));

/// Who the email says it is from, shown in the body and subject
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branding {
    pub app_name: String,
    pub app_url: String,
    #[serde(default)]
    pub logo_url: Option<String>,
}

impl Default for Branding {
    fn default() -> Self {
        Self {
            app_name: "CDL Help".to_string(),
            app_url: "https://cdlhelp.com".to_string(),
            logo_url: None,
        }
    }
}

#[derive(Template)]
#[template(
    source = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{{ branding.app_name }}: confirm your email</title>
</head>
<body style="margin: 0; padding: 24px; background: #f4f4f4; font-family: Arial, sans-serif; color: #333;">
    <div style="max-width: 560px; margin: 0 auto; padding: 24px; background: #fff; border-radius: 6px;">
        {% match branding.logo_url %}{% when Some with (logo) %}<img src="{{ logo }}" alt="{{ branding.app_name }}" width="143" height="57" style="display: block; margin: 0 auto 16px;">{% when None %}{% endmatch %}
        <h1 style="font-size: 22px;">One more step</h1>
        <p style="line-height: 1.5;">Thanks for signing up for news from {{ branding.app_name }}. Press the button below to confirm this address. The link works once and expires in {{ expires_in_minutes }} minutes.</p>
        <div style="margin: 24px 0;"><a href="{{ confirm_link }}" style="display: block; padding: 14px 0; background: #1a73e8; color: #fff; text-align: center; text-decoration: none; border-radius: 6px;">Confirm my email</a></div>
        <p>If the button does not work, open this address in your browser:</p>
        <p style="word-break: break-all; font-family: monospace; background: #f6f8fa; padding: 8px;">{{ confirm_link }}</p>
        <p style="color: #777;">Did not sign up? Ignore this message and nothing will happen.</p>
        <div style="text-align: center; font-size: 12px;"><a href="{{ branding.app_url }}">{{ branding.app_name }}</a></div>
    </div>
</body>
</html>
"#,
    ext = "html"
)]
pub struct ConfirmationTemplate<'a> {
    pub branding: &'a Branding,
    pub confirm_link: &'a str,
    pub expires_in_minutes: i64,
}

impl ConfirmationTemplate<'_> {
    /// Render both the HTML part and its plain text alternative
    pub fn render_parts(&self) -> Result<(String, String), askama::Error> {
        let html = self.render()?;
        let text = plain_text(&html);
        Ok((html, text))
    }
}

/// Reduce rendered HTML to readable text: block ends become paragraph
/// breaks, tags and the `<head>` are dropped, escaped characters restored.
pub fn plain_text(html: &str) -> String {
    let body = match html.split_once("<body") {
        Some((_, rest)) => rest.split_once('>').map_or(rest, |(_, inner)| inner),
        None => html,
    };
    let body = body.split("</body>").next().unwrap_or(body);

    let text = BLOCK_END.replace_all(body, "\n\n");
    let text = TAG.replace_all(&text, "");
    let text = GAP.replace_all(&text, "\n\n");

    text.lines()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n")
        .replace("&#x2f;", "/")
        .replace("&#x27;", "'")
        .replace("&quot;", "\"")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINK: &str = "https://cdlhelp.com/confirm?code=5f0c7a0e-8b1e-4c1a-9d57-1f2a3b4c5d6e";

    #[test]
    fn test_html_carries_link_and_expiry() {
        let branding = Branding::default();
        let template = ConfirmationTemplate {
            branding: &branding,
            confirm_link: LINK,
            expires_in_minutes: 60,
        };

        let (html, _) = template.render_parts().unwrap();

        assert!(html.contains("5f0c7a0e-8b1e-4c1a-9d57-1f2a3b4c5d6e"));
        assert!(html.contains("expires in 60 minutes"));
        assert!(html.contains("CDL Help"));
        assert!(!html.contains("<img"));
    }

    #[test]
    fn test_logo_is_optional() {
        let branding = Branding {
            logo_url: Some("https://cdlhelp.com/logo.png".to_string()),
            ..Branding::default()
        };
        let template = ConfirmationTemplate {
            branding: &branding,
            confirm_link: LINK,
            expires_in_minutes: 60,
        };

        assert!(template.render().unwrap().contains("<img"));
    }

    #[test]
    fn test_text_part_is_readable() {
        let branding = Branding::default();
        let template = ConfirmationTemplate {
            branding: &branding,
            confirm_link: LINK,
            expires_in_minutes: 45,
        };

        let (_, text) = template.render_parts().unwrap();

        assert!(!text.contains('<'));
        assert!(!text.contains("confirm your email"), "title leaked: {text}");
        assert!(text.contains(LINK));
        assert!(text.starts_with("One more step"));
    }

    #[test]
    fn test_plain_text_collapses_blank_lines() {
        let text = plain_text("<body><p>a</p>\n\n\n<p>b &amp; c</p></body>");
        assert_eq!(text, "a\n\nb & c");
    }
}
