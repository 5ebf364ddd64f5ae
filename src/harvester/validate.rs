//! Content validation for decoded sitemap documents
//!
//! A document is accepted only if it is well-formed XML and not an error
//! page in disguise (JSON error envelopes, HTML pages, forbidden notices
//! served with a success status).

use quick_xml::events::Event;
use quick_xml::Reader;
use serde_json::Value;
use thiserror::Error;

/// Root elements of sitemap protocol documents
const SITEMAP_ROOTS: &[&str] = &["urlset", "sitemapindex"];

/// Marker servers put in access-denied bodies
const FORBIDDEN_MARKER: &str = "forbidden";

/// Why a document was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("empty document")]
    Empty,

    #[error("error envelope: {0}")]
    ErrorEnvelope(String),

    #[error("forbidden response")]
    Forbidden,

    #[error("HTML page instead of a sitemap")]
    HtmlPage,

    #[error("malformed XML: {0}")]
    MalformedXml(String),
}

/// Validates decoded text as a sitemap document
///
/// # Checks
///
/// 1. Non-empty after trimming
/// 2. Not a JSON object carrying an `error` member
/// 3. Well-formed XML with exactly one root element
/// 4. Root is not `<html>`, and a non-sitemap root does not mention "forbidden"
///
/// # Returns
///
/// * `Ok(())` - The document can be classified
/// * `Err(ValidationError)` - The document must be skipped
pub fn validate(text: &str) -> Result<(), ValidationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty);
    }

    if let Some(message) = json_error_message(trimmed) {
        return Err(if message.to_lowercase().contains(FORBIDDEN_MARKER) {
            ValidationError::Forbidden
        } else {
            ValidationError::ErrorEnvelope(message)
        });
    }

    let root = root_element(trimmed)?;

    if root == "html" {
        return Err(if trimmed.to_lowercase().contains(FORBIDDEN_MARKER) {
            ValidationError::Forbidden
        } else {
            ValidationError::HtmlPage
        });
    }

    if !SITEMAP_ROOTS.contains(&root.as_str()) && trimmed.to_lowercase().contains(FORBIDDEN_MARKER)
    {
        return Err(ValidationError::Forbidden);
    }

    Ok(())
}

/// Extracts the message of a JSON error envelope
///
/// Recognizes `{"error": {"message": "..."}}`, `{"error": "..."}` and any
/// other object with an `error` member.
fn json_error_message(text: &str) -> Option<String> {
    if !text.starts_with('{') {
        return None;
    }

    let value: Value = serde_json::from_str(text).ok()?;
    let error = value.get("error")?;

    let message = match error {
        Value::String(message) => message.clone(),
        Value::Object(fields) => fields
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string()),
        other => other.to_string(),
    };

    Some(message)
}

/// Checks well-formedness and returns the lowercase local name of the root element
fn root_element(text: &str) -> Result<String, ValidationError> {
    let mut reader = Reader::from_str(text);
    reader.trim_text(true);
    reader.check_end_names(true);

    let mut open = 0usize;
    let mut root: Option<String> = None;

    loop {
        let event = reader.read_event().map_err(|e| {
            ValidationError::MalformedXml(format!("at byte {}: {}", reader.buffer_position(), e))
        })?;

        match event {
            Event::Start(e) => {
                if open == 0 {
                    set_root(&mut root, e.local_name().as_ref())?;
                }
                open += 1;
            }
            Event::Empty(e) => {
                if open == 0 {
                    set_root(&mut root, e.local_name().as_ref())?;
                }
            }
            Event::End(_) => {
                open = open.checked_sub(1).ok_or_else(|| {
                    ValidationError::MalformedXml("unexpected closing tag".to_string())
                })?;
            }
            Event::Text(e) => {
                if open == 0 && !String::from_utf8_lossy(&e).trim().is_empty() {
                    return Err(ValidationError::MalformedXml(
                        "text outside the root element".to_string(),
                    ));
                }
            }
            Event::CData(_) => {
                if open == 0 {
                    return Err(ValidationError::MalformedXml(
                        "CDATA outside the root element".to_string(),
                    ));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if open > 0 {
        return Err(ValidationError::MalformedXml(format!(
            "{} unclosed element(s)",
            open
        )));
    }

    root.ok_or_else(|| ValidationError::MalformedXml("no root element".to_string()))
}

fn set_root(root: &mut Option<String>, name: &[u8]) -> Result<(), ValidationError> {
    if root.is_some() {
        return Err(ValidationError::MalformedXml(
            "more than one root element".to_string(),
        ));
    }
    *root = Some(String::from_utf8_lossy(name).to_ascii_lowercase());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_urlset() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
        <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
          <url><loc>https://x.test/a</loc><priority>0.8</priority></url>
        </urlset>"#;
        assert_eq!(validate(xml), Ok(()));
    }

    #[test]
    fn test_valid_index() {
        let xml = r#"<sitemapindex><sitemap><loc>https://x.test/s1.xml</loc></sitemap></sitemapindex>"#;
        assert_eq!(validate(xml), Ok(()));
    }

    #[test]
    fn test_sitemap_mentioning_forbidden_is_accepted() {
        let xml = r#"<urlset><url><loc>https://x.test/forbidden-city</loc></url></urlset>"#;
        assert_eq!(validate(xml), Ok(()));
    }

    #[test]
    fn test_empty() {
        assert_eq!(validate("   \n"), Err(ValidationError::Empty));
    }

    #[test]
    fn test_json_forbidden_envelope() {
        let body = r#"{"error": {"code": 403, "message": "Forbidden: access denied"}}"#;
        assert_eq!(validate(body), Err(ValidationError::Forbidden));
    }

    #[test]
    fn test_json_error_envelope() {
        let body = r#"{"error": "rate limit exceeded"}"#;
        assert_eq!(
            validate(body),
            Err(ValidationError::ErrorEnvelope("rate limit exceeded".to_string()))
        );
    }

    #[test]
    fn test_plain_json_is_not_xml() {
        assert!(matches!(
            validate(r#"{"items": []}"#),
            Err(ValidationError::MalformedXml(_))
        ));
    }

    #[test]
    fn test_plain_text_rejected() {
        assert!(matches!(
            validate("https://x.test/a\nhttps://x.test/b"),
            Err(ValidationError::MalformedXml(_))
        ));
    }

    #[test]
    fn test_mismatched_tags() {
        assert!(matches!(
            validate("<urlset><url><loc>https://x.test/a</url></loc></urlset>"),
            Err(ValidationError::MalformedXml(_))
        ));
    }

    #[test]
    fn test_unclosed_root() {
        assert!(matches!(
            validate("<urlset><url><loc>https://x.test/a</loc></url>"),
            Err(ValidationError::MalformedXml(_))
        ));
    }

    #[test]
    fn test_two_roots() {
        assert!(matches!(
            validate("<urlset></urlset><urlset></urlset>"),
            Err(ValidationError::MalformedXml(_))
        ));
    }

    #[test]
    fn test_xhtml_page_rejected() {
        let page = "<html><head><title>Not found</title></head><body>Nope</body></html>";
        assert_eq!(validate(page), Err(ValidationError::HtmlPage));
    }

    #[test]
    fn test_forbidden_xml_notice() {
        let body = "<Error><Code>AccessDenied</Code><Message>Forbidden</Message></Error>";
        assert_eq!(validate(body), Err(ValidationError::Forbidden));
    }

    #[test]
    fn test_html_with_void_elements_is_malformed() {
        let page = "<html><head><meta charset=\"utf-8\"></head><body>403 Forbidden</body></html>";
        assert!(validate(page).is_err());
    }
}
