//! Request validation
//!
//! [`Validator`] accumulates per-field messages so a single response can report
//! every problem with a submission at once. Request types implement
//! [`Validate`] by running their rules through a validator.

use crate::error::ValidationErrors;
use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}$")
        .expect("Invalid email regex")
});

static SLUG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9]+(-[a-z0-9]+)*$").expect("Invalid slug regex"));

static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[0-9 ()\-.]{7,20}$").expect("Invalid phone regex"));

const MAX_EMAIL_LEN: usize = 254;
const MAX_SLUG_LEN: usize = 100;

/// Types that can check their own field constraints.
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationErrors>;
}

/// Update requests whose serialized form lists only the supplied fields.
///
/// Implementors mark every field `skip_serializing_if = "Option::is_none"`,
/// which makes the serialized object a column patch.
pub trait HasUpdates: serde::Serialize {
    fn to_patch(&self) -> serde_json::Map<String, serde_json::Value> {
        serialize_patch(self)
    }

    fn has_any_updates(&self) -> bool {
        !self.to_patch().is_empty()
    }
}

/// Serialize a value into a column map; non-objects yield an empty map.
pub fn serialize_patch<T: serde::Serialize + ?Sized>(value: &T) -> serde_json::Map<String, serde_json::Value> {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::Object(map)) => map,
        _ => serde_json::Map::new(),
    }
}

pub fn is_valid_email(value: &str) -> bool {
    let value = value.trim();
    value.len() <= MAX_EMAIL_LEN
        && EMAIL_RE.is_match(value)
}

pub fn is_valid_slug(value: &str) -> bool {
    value.len() <= MAX_SLUG_LEN && SLUG_RE.is_match(value)
}

pub fn is_valid_url(value: &str) -> bool {
    let value = value.trim();
    let rest = value
        .strip_prefix("https://")
        .or_else(|| value.strip_prefix("http://"));
    match rest {
        Some(rest) => {
            let host = rest.split(['/', '?', '#']).next().unwrap_or_default();
            !host.is_empty() && !host.contains(char::is_whitespace) && !value.contains(' ')
        }
        None => false,
    }
}

/// Build a URL slug from free text: lowercase ASCII alphanumerics separated
/// by single hyphens.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;
    for ch in input.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
        if slug.len() >= MAX_SLUG_LEN {
            break;
        }
    }
    slug.truncate(MAX_SLUG_LEN);
    slug.trim_end_matches('-').to_string()
}

/// Accumulates field errors.
#[derive(Debug, Default)]
pub struct Validator {
    errors: ValidationErrors,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `message` against `field` unless `ok` holds.
    pub fn check(&mut self, ok: bool, field: &str, message: impl Into<String>) -> &mut Self {
        if !ok {
            self.errors.add(field, message);
        }
        self
    }

    pub fn required(&mut self, field: &str, label: &str, value: &str) -> &mut Self {
        self.check(!value.trim().is_empty(), field, format!("{} is required", label))
    }

    /// Required text whose trimmed length (in characters) lies in `min..=max`.
    pub fn text(&mut self, field: &str, label: &str, value: &str, min: usize, max: usize) -> &mut Self {
        let len = value.trim().chars().count();
        if len == 0 {
            return self.required(field, label, value);
        }
        if len < min {
            self.errors
                .add(field, format!("{} must be at least {} characters", label, min));
        } else if len > max {
            self.errors
                .add(field, format!("{} must be at most {} characters", label, max));
        }
        self
    }

    /// Optional text; only the upper bound applies.
    pub fn optional_text(&mut self, field: &str, label: &str, value: Option<&str>, max: usize) -> &mut Self {
        if let Some(value) = value {
            if value.trim().chars().count() > max {
                self.errors
                    .add(field, format!("{} must be at most {} characters", label, max));
            }
        }
        self
    }

    pub fn email(&mut self, field: &str, value: &str) -> &mut Self {
        if value.trim().is_empty() {
            return self.required(field, "Email", value);
        }
        self.check(is_valid_email(value), field, "Invalid email address")
    }

    pub fn optional_email(&mut self, field: &str, value: Option<&str>) -> &mut Self {
        match value {
            Some(value) => self.email(field, value),
            None => self,
        }
    }

    pub fn url(&mut self, field: &str, label: &str, value: &str) -> &mut Self {
        if value.trim().is_empty() {
            return self.required(field, label, value);
        }
        self.check(is_valid_url(value), field, format!("{} must be a valid http(s) URL", label))
    }

    pub fn optional_url(&mut self, field: &str, label: &str, value: Option<&str>) -> &mut Self {
        match value {
            Some(value) if !value.trim().is_empty() => self.url(field, label, value),
            _ => self,
        }
    }

    pub fn optional_phone(&mut self, field: &str, value: Option<&str>) -> &mut Self {
        match value {
            Some(value) if !value.trim().is_empty() => self.check(
                PHONE_RE.is_match(value.trim()),
                field,
                "Invalid phone number",
            ),
            _ => self,
        }
    }

    pub fn optional_slug(&mut self, field: &str, value: Option<&str>) -> &mut Self {
        match value {
            Some(value) => self.check(
                is_valid_slug(value),
                field,
                "Slug may only contain lowercase letters, digits and single hyphens",
            ),
            None => self,
        }
    }

    pub fn range(&mut self, field: &str, label: &str, value: i64, min: i64, max: i64) -> &mut Self {
        self.check(
            (min..=max).contains(&value),
            field,
            format!("{} must be between {} and {}", label, min, max),
        )
    }

    /// Every element must be non-blank.
    pub fn each_non_empty(&mut self, field: &str, label: &str, values: &[String]) -> &mut Self {
        self.check(
            values.iter().all(|v| !v.trim().is_empty()),
            field,
            format!("{} entries must not be empty", label),
        )
    }

    pub fn finish(&mut self) -> Result<(), ValidationErrors> {
        std::mem::take(&mut self.errors).into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("jane@example.com"));
        assert!(is_valid_email("jane.doe+news@mail.example.co.uk"));
        assert!(!is_valid_email("bad"));
        assert!(!is_valid_email("jane@"));
        assert!(!is_valid_email("jane@example"));
        assert!(!is_valid_email("ja ne@example.com"));
    }

    #[test]
    fn test_url_validation() {
        assert!(is_valid_url("https://example.com/cv.pdf"));
        assert!(is_valid_url("http://localhost:3000"));
        assert!(!is_valid_url("ftp://example.com"));
        assert!(!is_valid_url("https://"));
        assert!(!is_valid_url("example.com"));
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Web Design & Development"), "web-design-development");
        assert_eq!(slugify("  --Hello,   World!--  "), "hello-world");
        assert_eq!(slugify("Rust 2024"), "rust-2024");
        assert_eq!(slugify("!!!"), "");
        assert!(is_valid_slug(&slugify("Any Title At All")));
    }

    #[test]
    fn test_validator_collects_all_fields() {
        let mut v = Validator::new();
        v.text("name", "Name", "A", 1, 100)
            .email("email", "bad")
            .text("message", "Message", "short", 10, 5000);
        let errors = v.finish().err().unwrap_or_default();

        assert!(!errors.contains("name"));
        assert_eq!(errors.messages("email"), ["Invalid email address"]);
        assert_eq!(
            errors.messages("message"),
            ["Message must be at least 10 characters"]
        );
    }

    #[test]
    fn test_required_blank_string() {
        let mut v = Validator::new();
        v.text("name", "Name", "   ", 1, 100);
        let errors = v.finish().err().unwrap_or_default();
        assert_eq!(errors.messages("name"), ["Name is required"]);
    }

    #[test]
    fn test_optional_rules_skip_missing_values() {
        let mut v = Validator::new();
        v.optional_email("email", None)
            .optional_url("site", "Website", None)
            .optional_phone("phone", Some(""))
            .optional_text("company", "Company", None, 10);
        assert!(v.finish().is_ok());
    }

    #[test]
    fn test_phone_and_range() {
        let mut v = Validator::new();
        v.optional_phone("phone", Some("+1 (555) 010-9999"))
            .range("rating", "Rating", 5, 1, 5);
        assert!(v.finish().is_ok());

        let mut v = Validator::new();
        v.optional_phone("phone", Some("call me"))
            .range("rating", "Rating", 6, 1, 5);
        let errors = v.finish().err().unwrap_or_default();
        assert!(errors.contains("phone"));
        assert!(errors.contains("rating"));
    }
}
