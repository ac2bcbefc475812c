//! Slug-or-id row addressing

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use uuid::Uuid;

// UUID pattern: 8-4-4-4-12 hex chars
static UUID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
        .expect("Invalid UUID regex")
});

/// How a single row is addressed by a route path segment.
///
/// A segment in hyphenated UUID form always addresses the primary key, even
/// when some row happens to carry that exact text as its slug.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RowKey {
    Id(Uuid),
    Slug(String),
}

impl RowKey {
    pub fn parse(segment: &str) -> Self {
        let segment = segment.trim();
        if UUID_RE.is_match(segment) {
            if let Ok(id) = Uuid::parse_str(segment) {
                return RowKey::Id(id);
            }
        }
        RowKey::Slug(segment.to_string())
    }

    /// Column the key is matched against.
    pub fn column(&self) -> &'static str {
        match self {
            RowKey::Id(_) => "id",
            RowKey::Slug(_) => "slug",
        }
    }

    pub fn as_id(&self) -> Option<Uuid> {
        match self {
            RowKey::Id(id) => Some(*id),
            RowKey::Slug(_) => None,
        }
    }
}

impl From<Uuid> for RowKey {
    fn from(id: Uuid) -> Self {
        RowKey::Id(id)
    }
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowKey::Id(id) => write!(f, "{}", id),
            RowKey::Slug(slug) => f.write_str(slug),
        }
    }
}
