//! Field validation shared by the content services.
//!
//! Every rule rejects before any store mutation happens; messages are
//! field-scoped so the error envelope can echo them back per input.

use serde_json::Value;
use url::Url;

use alexpetro_api_types::{FieldError, NewsBlock, ProjectDetail};

pub const CONTACT_NAME_MAX: usize = 100;
pub const CONTACT_MESSAGE_MIN: usize = 10;
pub const CONTACT_MESSAGE_MAX: usize = 1000;
pub const TITLE_MAX: usize = 255;
pub const TICKER_MESSAGE_MAX: usize = 500;

fn err(field: &'static str, message: impl Into<String>) -> FieldError {
    FieldError {
        field: field.to_string(),
        message: message.into(),
    }
}

/// Trimmed, non-empty text bounded by `max` characters.
pub fn require_text(field: &'static str, value: &str, max: usize) -> Result<String, FieldError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(err(field, format!("{field} is required")));
    }
    if trimmed.chars().count() > max {
        return Err(err(field, format!("{field} must be at most {max} characters")));
    }
    Ok(trimmed.to_string())
}

/// Trimmed optional text; empty input collapses to `None`.
pub fn optional_text(
    field: &'static str,
    value: Option<String>,
    max: usize,
) -> Result<Option<String>, FieldError> {
    match value {
        None => Ok(None),
        Some(raw) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            if trimmed.chars().count() > max {
                return Err(err(field, format!("{field} must be at most {max} characters")));
            }
            Ok(Some(trimmed.to_string()))
        }
    }
}

pub fn percentage(value: f64) -> Result<f64, FieldError> {
    if !value.is_finite() || !(0.0..=100.0).contains(&value) {
        return Err(err("percentage", "percentage must be between 0 and 100"));
    }
    Ok(value)
}

/// Letters, spaces, hyphens, apostrophes, and periods only.
pub fn contact_name(value: &str) -> Result<String, FieldError> {
    let name = require_text("name", value, CONTACT_NAME_MAX)?;
    let allowed = name
        .chars()
        .all(|ch| ch.is_ascii_alphabetic() || ch.is_whitespace() || matches!(ch, '-' | '\'' | '.'));
    if !allowed {
        return Err(err(
            "name",
            "Name can only contain letters, spaces, hyphens, apostrophes, and periods",
        ));
    }
    Ok(name)
}

/// Shape check equivalent to `^[^\s@]+@[^\s@]+\.[^\s@]+$`, lowercased.
pub fn email_address(value: &str) -> Result<String, FieldError> {
    let email = require_text("email", value, TITLE_MAX)?.to_lowercase();

    let invalid = || err("email", "Please enter a valid email address");
    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.is_empty() {
        return Err(invalid());
    }
    if email.chars().filter(|ch| *ch == '@').count() != 1 {
        return Err(invalid());
    }
    if email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let (host, tld) = domain.rsplit_once('.').ok_or_else(invalid)?;
    if host.is_empty() || tld.is_empty() {
        return Err(invalid());
    }
    Ok(email)
}

pub fn contact_message(value: &str) -> Result<String, FieldError> {
    let message = value.trim();
    let length = message.chars().count();
    if !(CONTACT_MESSAGE_MIN..=CONTACT_MESSAGE_MAX).contains(&length) {
        return Err(err(
            "message",
            format!(
                "Message is required and must be between {CONTACT_MESSAGE_MIN} and {CONTACT_MESSAGE_MAX} characters"
            ),
        ));
    }
    Ok(message.to_string())
}

/// Caller-supplied image URL: absolute http(s) or a site-relative path.
pub fn image_url(field: &'static str, value: &str) -> Result<String, FieldError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(err(field, "image url must not be empty"));
    }
    if trimmed.starts_with('/') {
        return Ok(trimmed.to_string());
    }
    match Url::parse(trimmed) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(trimmed.to_string()),
        _ => Err(err(field, "image url must be http(s) or site-relative")),
    }
}

/// `descriptionJson` for news: ordered paragraph/list blocks.
pub fn news_blocks(raw: &str) -> Result<Vec<NewsBlock>, FieldError> {
    serde_json::from_str(raw)
        .map_err(|_| err("descriptionJson", "descriptionJson must be an array of blocks"))
}

/// `descriptionJson` for projects: any JSON array of sections.
pub fn project_description(raw: &str) -> Result<Value, FieldError> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|_| err("descriptionJson", "descriptionJson must be valid JSON"))?;
    if !value.is_array() {
        return Err(err("descriptionJson", "descriptionJson must be an array"));
    }
    Ok(value)
}

/// `detailsJson`: ordered key/value rows.
pub fn project_details(raw: &str) -> Result<Vec<(String, String)>, FieldError> {
    let details: Vec<ProjectDetail> = serde_json::from_str(raw)
        .map_err(|_| err("detailsJson", "detailsJson must be an array of {key, value}"))?;

    let mut rows = Vec::with_capacity(details.len());
    for detail in details {
        let key = detail.key.trim();
        if key.is_empty() {
            return Err(err("detailsJson", "detail keys must not be empty"));
        }
        rows.push((key.to_string(), detail.value.trim().to_string()));
    }
    Ok(rows)
}

/// `existingImageUrlsJson`: the keep-set for update reconciliation.
pub fn keep_set(raw: &str) -> Result<Vec<String>, FieldError> {
    serde_json::from_str(raw).map_err(|_| {
        err(
            "existingImageUrlsJson",
            "existingImageUrlsJson must be an array of strings",
        )
    })
}

pub fn boolish(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentage_bounds_are_inclusive() {
        assert!(percentage(0.0).is_ok());
        assert!(percentage(100.0).is_ok());
        assert!(percentage(100.1).is_err());
        assert!(percentage(-0.5).is_err());
        assert!(percentage(f64::NAN).is_err());
    }

    #[test]
    fn contact_name_charset() {
        assert!(contact_name("Mary-Jane O'Neil Jr.").is_ok());
        assert!(contact_name("DROP TABLE;").is_err());
        assert!(contact_name("x1").is_err());
        assert!(contact_name("").is_err());
    }

    #[test]
    fn email_shape() {
        assert_eq!(
            email_address("Info@ALX-pc.com").unwrap(),
            "info@alx-pc.com"
        );
        assert!(email_address("no-at-sign").is_err());
        assert!(email_address("two@@ats.com").is_err());
        assert!(email_address("user@nodot").is_err());
        assert!(email_address("user@dot.").is_err());
    }

    #[test]
    fn contact_message_length_window() {
        assert!(contact_message("too short").is_err());
        assert!(contact_message("exactly ten").is_ok());
        assert!(contact_message(&"x".repeat(1001)).is_err());
    }

    #[test]
    fn image_url_accepts_relative_and_http() {
        assert!(image_url("imageUrls", "/uploads/2025/01/01/x.png").is_ok());
        assert!(image_url("imageUrls", "https://cdn.example.com/a.jpg").is_ok());
        assert!(image_url("imageUrls", "ftp://x/a.jpg").is_err());
        assert!(image_url("imageUrls", "   ").is_err());
    }

    #[test]
    fn details_json_rejects_blank_keys() {
        assert!(project_details(r#"[{"key":"Status","value":"Done"}]"#).is_ok());
        assert!(project_details(r#"[{"key":"  ","value":"x"}]"#).is_err());
        assert!(project_details("not json").is_err());
    }

    #[test]
    fn optional_text_collapses_empty_to_none() {
        assert_eq!(
            optional_text("subtitle", Some("  ".to_string()), 255).unwrap(),
            None
        );
        assert_eq!(
            optional_text("subtitle", Some(" hi ".to_string()), 255).unwrap(),
            Some("hi".to_string())
        );
    }
}
