//! Per-page SEO settings and media library metadata

use crate::content::trimmed;
use crate::error::ValidationErrors;
use crate::query::{FilterField, ListConfig, SortOrder};
use crate::table::{Record, Table};
use crate::validation::{Validate, Validator};
use crate::{new_entity_id, EntityId, Timestamp};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SeoSetting {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub id: EntityId,
    pub page_path: String,
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    pub og_image: Option<String>,
    pub canonical_url: Option<String>,
    pub no_index: bool,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub updated_at: Timestamp,
}

impl Record for SeoSetting {
    const TABLE: Table = Table::SeoSettings;
    const ENTITY_NAME: &'static str = "SEO setting";
}

/// Body of `PUT /api/admin/seo`; creates or replaces the row for `page_path`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UpsertSeoRequest {
    pub page_path: String,
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    pub og_image: Option<String>,
    pub canonical_url: Option<String>,
    #[serde(default)]
    pub no_index: bool,
}

impl Validate for UpsertSeoRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut v = Validator::new();
        v.text("page_path", "Page path", &self.page_path, 1, 2_048)
            .check(
                self.page_path.trim().starts_with('/'),
                "page_path",
                "Page path must start with '/'",
            )
            .text("title", "Title", &self.title, 1, 70)
            .optional_text("description", "Description", self.description.as_deref(), 160)
            .each_non_empty("keywords", "Keyword", &self.keywords)
            .optional_url("og_image", "Open Graph image", self.og_image.as_deref())
            .optional_url("canonical_url", "Canonical URL", self.canonical_url.as_deref());
        v.finish()
    }
}

impl SeoSetting {
    /// Build the stored row, keeping identity and creation time of `existing`.
    pub fn upsert(req: UpsertSeoRequest, existing: Option<&SeoSetting>, now: Timestamp) -> Self {
        Self {
            id: existing.map(|e| e.id).unwrap_or_else(new_entity_id),
            page_path: normalize_page_path(&req.page_path),
            title: req.title.trim().to_string(),
            description: trimmed(req.description),
            keywords: req.keywords.iter().map(|k| k.trim().to_string()).collect(),
            og_image: trimmed(req.og_image),
            canonical_url: trimmed(req.canonical_url),
            no_index: req.no_index,
            created_at: existing.map(|e| e.created_at).unwrap_or(now),
            updated_at: now,
        }
    }
}

/// `/about/` and `/about` address the same page.
pub fn normalize_page_path(path: &str) -> String {
    let path = path.trim();
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct MediaItem {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub id: EntityId,
    pub file_name: String,
    pub url: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub alt_text: Option<String>,
    pub folder: Option<String>,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub updated_at: Timestamp,
}

impl Record for MediaItem {
    const TABLE: Table = Table::MediaItems;
    const ENTITY_NAME: &'static str = "Media item";
}

impl MediaItem {
    pub const ADMIN_LIST: ListConfig = ListConfig {
        sortable: &["created_at", "file_name", "size_bytes"],
        filters: &[
            FilterField::text("folder", "folder"),
            FilterField::text("mime_type", "mime_type"),
        ],
        searchable: &["file_name", "alt_text"],
        paginate: true,
        default_sort: "created_at",
        default_order: SortOrder::Desc,
    };

    pub fn from_request(req: CreateMediaRequest, now: Timestamp) -> Self {
        Self {
            id: new_entity_id(),
            file_name: req.file_name.trim().to_string(),
            url: req.url.trim().to_string(),
            mime_type: req.mime_type.trim().to_lowercase(),
            size_bytes: req.size_bytes,
            alt_text: trimmed(req.alt_text),
            folder: trimmed(req.folder),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Metadata for a file already uploaded to object storage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateMediaRequest {
    pub file_name: String,
    pub url: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub alt_text: Option<String>,
    pub folder: Option<String>,
}

impl Validate for CreateMediaRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut v = Validator::new();
        v.text("file_name", "File name", &self.file_name, 1, 255)
            .url("url", "URL", &self.url)
            .check(
                self.mime_type.split('/').filter(|p| !p.trim().is_empty()).count() == 2,
                "mime_type",
                "MIME type must look like type/subtype",
            )
            .check(self.size_bytes >= 0, "size_bytes", "Size must not be negative")
            .optional_text("alt_text", "Alt text", self.alt_text.as_deref(), 300);
        v.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_page_path() {
        assert_eq!(normalize_page_path("/about/"), "/about");
        assert_eq!(normalize_page_path("/"), "/");
        assert_eq!(normalize_page_path(" /blog "), "/blog");
    }

    #[test]
    fn test_upsert_keeps_identity() {
        let now = crate::now();
        let req = UpsertSeoRequest {
            page_path: "/services/".to_string(),
            title: "Services".to_string(),
            ..Default::default()
        };
        let first = SeoSetting::upsert(req.clone(), None, now);
        assert_eq!(first.page_path, "/services");

        let later = now + chrono::Duration::minutes(5);
        let second = SeoSetting::upsert(req, Some(&first), later);
        assert_eq!(second.id, first.id);
        assert_eq!(second.created_at, first.created_at);
        assert_eq!(second.updated_at, later);
    }

    #[test]
    fn test_media_mime_type_shape() {
        let req = CreateMediaRequest {
            file_name: "hero.png".to_string(),
            url: "https://cdn.example.com/hero.png".to_string(),
            mime_type: "png".to_string(),
            size_bytes: 1_024,
            ..Default::default()
        };
        assert!(req.validate().err().unwrap_or_default().contains("mime_type"));
    }
}
