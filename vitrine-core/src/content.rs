//! Marketing content: services, case studies, testimonials and team members

use crate::enums::PublishStatus;
use crate::error::ValidationErrors;
use crate::query::{FilterField, ListConfig, SortOrder};
use crate::table::{Record, Table};
use crate::validation::{slugify, HasUpdates, Validate, Validator};
use crate::{new_entity_id, EntityId, Timestamp};
use serde::{Deserialize, Serialize};

/// Slug from an explicit value or derived from a title.
pub(crate) fn resolve_slug(explicit: Option<&str>, source: &str) -> String {
    match explicit.map(str::trim) {
        Some(slug) if !slug.is_empty() => slug.to_string(),
        _ => slugify(source),
    }
}

pub(crate) fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// ============================================================================
// SERVICE
// ============================================================================

/// An offering listed on the services page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Service {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub id: EntityId,
    pub slug: String,
    pub title: String,
    pub short_description: Option<String>,
    pub description: String,
    pub icon: Option<String>,
    #[serde(default)]
    pub features: Vec<String>,
    pub price_from: Option<f64>,
    pub category: Option<String>,
    pub featured: bool,
    pub status: PublishStatus,
    pub display_order: i32,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub updated_at: Timestamp,
}

impl Record for Service {
    const TABLE: Table = Table::Services;
    const ENTITY_NAME: &'static str = "Service";
}

impl Service {
    pub const LIST: ListConfig = ListConfig {
        sortable: &["display_order", "title", "created_at", "price_from"],
        filters: &[
            FilterField::bool("featured", "featured"),
            FilterField::text("category", "category"),
        ],
        searchable: &["title", "short_description", "description"],
        paginate: true,
        default_sort: "display_order",
        default_order: SortOrder::Asc,
    };

    pub const ADMIN_LIST: ListConfig = ListConfig {
        filters: &[
            FilterField::bool("featured", "featured"),
            FilterField::text("category", "category"),
            FilterField::text("status", "status"),
        ],
        ..Self::LIST
    };

    pub fn from_request(req: CreateServiceRequest, now: Timestamp) -> Self {
        Self {
            id: new_entity_id(),
            slug: resolve_slug(req.slug.as_deref(), &req.title),
            title: req.title.trim().to_string(),
            short_description: trimmed(req.short_description),
            description: req.description.trim().to_string(),
            icon: trimmed(req.icon),
            features: req.features,
            price_from: req.price_from,
            category: trimmed(req.category),
            featured: req.featured,
            status: req.status.unwrap_or_default(),
            display_order: req.display_order.unwrap_or(0),
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateServiceRequest {
    pub slug: Option<String>,
    pub title: String,
    pub short_description: Option<String>,
    pub description: String,
    pub icon: Option<String>,
    #[serde(default)]
    pub features: Vec<String>,
    pub price_from: Option<f64>,
    pub category: Option<String>,
    #[serde(default)]
    pub featured: bool,
    pub status: Option<PublishStatus>,
    pub display_order: Option<i32>,
}

impl Validate for CreateServiceRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut v = Validator::new();
        v.text("title", "Title", &self.title, 2, 200)
            .text("description", "Description", &self.description, 1, 20_000)
            .optional_slug("slug", self.slug.as_deref())
            .check(
                !resolve_slug(self.slug.as_deref(), &self.title).is_empty(),
                "slug",
                "Slug could not be derived from the title",
            )
            .optional_text("short_description", "Short description", self.short_description.as_deref(), 500)
            .each_non_empty("features", "Feature", &self.features)
            .check(
                self.price_from.map_or(true, |p| p >= 0.0),
                "price_from",
                "Price must not be negative",
            );
        v.finish()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UpdateServiceRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub features: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_from: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<PublishStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_order: Option<i32>,
}

impl HasUpdates for UpdateServiceRequest {}

impl Validate for UpdateServiceRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut v = Validator::new();
        if let Some(title) = &self.title {
            v.text("title", "Title", title, 2, 200);
        }
        if let Some(description) = &self.description {
            v.text("description", "Description", description, 1, 20_000);
        }
        if let Some(features) = &self.features {
            v.each_non_empty("features", "Feature", features);
        }
        v.optional_slug("slug", self.slug.as_deref())
            .optional_text("short_description", "Short description", self.short_description.as_deref(), 500)
            .check(
                self.price_from.map_or(true, |p| p >= 0.0),
                "price_from",
                "Price must not be negative",
            );
        v.finish()
    }
}

// ============================================================================
// CASE STUDY
// ============================================================================

/// A portfolio entry describing client work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CaseStudy {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub id: EntityId,
    pub slug: String,
    pub title: String,
    pub client_name: String,
    pub industry: Option<String>,
    pub summary: String,
    pub challenge: Option<String>,
    pub solution: Option<String>,
    #[serde(default)]
    pub results: Vec<String>,
    #[serde(default)]
    pub technologies: Vec<String>,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "uuid"))]
    pub service_id: Option<EntityId>,
    pub cover_image: Option<String>,
    pub featured: bool,
    pub status: PublishStatus,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "date-time"))]
    pub published_at: Option<Timestamp>,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub updated_at: Timestamp,
}

impl Record for CaseStudy {
    const TABLE: Table = Table::CaseStudies;
    const ENTITY_NAME: &'static str = "Case study";
}

impl CaseStudy {
    pub const LIST: ListConfig = ListConfig {
        sortable: &["published_at", "created_at", "title"],
        filters: &[
            FilterField::bool("featured", "featured"),
            FilterField::text("industry", "industry"),
            FilterField::uuid("service", "service_id"),
        ],
        searchable: &["title", "client_name", "summary"],
        paginate: true,
        default_sort: "published_at",
        default_order: SortOrder::Desc,
    };

    pub const ADMIN_LIST: ListConfig = ListConfig {
        filters: &[
            FilterField::bool("featured", "featured"),
            FilterField::text("industry", "industry"),
            FilterField::uuid("service", "service_id"),
            FilterField::text("status", "status"),
        ],
        ..Self::LIST
    };

    pub fn from_request(req: CreateCaseStudyRequest, now: Timestamp) -> Self {
        let status = req.status.unwrap_or_default();
        let published_at = match status {
            PublishStatus::Published => req.published_at.or(Some(now)),
            _ => req.published_at,
        };
        Self {
            id: new_entity_id(),
            slug: resolve_slug(req.slug.as_deref(), &req.title),
            title: req.title.trim().to_string(),
            client_name: req.client_name.trim().to_string(),
            industry: trimmed(req.industry),
            summary: req.summary.trim().to_string(),
            challenge: trimmed(req.challenge),
            solution: trimmed(req.solution),
            results: req.results,
            technologies: req.technologies,
            service_id: req.service_id,
            cover_image: trimmed(req.cover_image),
            featured: req.featured,
            status,
            published_at,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateCaseStudyRequest {
    pub slug: Option<String>,
    pub title: String,
    pub client_name: String,
    pub industry: Option<String>,
    pub summary: String,
    pub challenge: Option<String>,
    pub solution: Option<String>,
    #[serde(default)]
    pub results: Vec<String>,
    #[serde(default)]
    pub technologies: Vec<String>,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "uuid"))]
    pub service_id: Option<EntityId>,
    pub cover_image: Option<String>,
    #[serde(default)]
    pub featured: bool,
    pub status: Option<PublishStatus>,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "date-time"))]
    pub published_at: Option<Timestamp>,
}

impl Validate for CreateCaseStudyRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut v = Validator::new();
        v.text("title", "Title", &self.title, 2, 200)
            .text("client_name", "Client name", &self.client_name, 1, 200)
            .text("summary", "Summary", &self.summary, 10, 2_000)
            .optional_slug("slug", self.slug.as_deref())
            .check(
                !resolve_slug(self.slug.as_deref(), &self.title).is_empty(),
                "slug",
                "Slug could not be derived from the title",
            )
            .optional_text("challenge", "Challenge", self.challenge.as_deref(), 20_000)
            .optional_text("solution", "Solution", self.solution.as_deref(), 20_000)
            .optional_url("cover_image", "Cover image", self.cover_image.as_deref());
        v.finish()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UpdateCaseStudyRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub challenge: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub solution: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub technologies: Option<Vec<String>>,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "uuid"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_id: Option<EntityId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<PublishStatus>,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "date-time"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<Timestamp>,
}

impl HasUpdates for UpdateCaseStudyRequest {}

impl Validate for UpdateCaseStudyRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut v = Validator::new();
        if let Some(title) = &self.title {
            v.text("title", "Title", title, 2, 200);
        }
        if let Some(client_name) = &self.client_name {
            v.text("client_name", "Client name", client_name, 1, 200);
        }
        if let Some(summary) = &self.summary {
            v.text("summary", "Summary", summary, 10, 2_000);
        }
        v.optional_slug("slug", self.slug.as_deref())
            .optional_url("cover_image", "Cover image", self.cover_image.as_deref());
        v.finish()
    }
}

// ============================================================================
// TESTIMONIAL
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Testimonial {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub id: EntityId,
    pub client_name: String,
    pub client_title: Option<String>,
    pub company: Option<String>,
    pub quote: String,
    pub rating: Option<i32>,
    pub avatar_url: Option<String>,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "uuid"))]
    pub service_id: Option<EntityId>,
    pub featured: bool,
    pub status: PublishStatus,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub updated_at: Timestamp,
}

impl Record for Testimonial {
    const TABLE: Table = Table::Testimonials;
    const ENTITY_NAME: &'static str = "Testimonial";
}

impl Testimonial {
    pub const LIST: ListConfig = ListConfig {
        sortable: &["created_at", "rating"],
        filters: &[
            FilterField::bool("featured", "featured"),
            FilterField::uuid("service", "service_id"),
            FilterField::int("rating", "rating"),
        ],
        searchable: &["client_name", "company", "quote"],
        paginate: true,
        default_sort: "created_at",
        default_order: SortOrder::Desc,
    };

    pub const ADMIN_LIST: ListConfig = ListConfig {
        filters: &[
            FilterField::bool("featured", "featured"),
            FilterField::uuid("service", "service_id"),
            FilterField::int("rating", "rating"),
            FilterField::text("status", "status"),
        ],
        ..Self::LIST
    };

    pub fn from_request(req: CreateTestimonialRequest, now: Timestamp) -> Self {
        Self {
            id: new_entity_id(),
            client_name: req.client_name.trim().to_string(),
            client_title: trimmed(req.client_title),
            company: trimmed(req.company),
            quote: req.quote.trim().to_string(),
            rating: req.rating,
            avatar_url: trimmed(req.avatar_url),
            service_id: req.service_id,
            featured: req.featured,
            status: req.status.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateTestimonialRequest {
    pub client_name: String,
    pub client_title: Option<String>,
    pub company: Option<String>,
    pub quote: String,
    pub rating: Option<i32>,
    pub avatar_url: Option<String>,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "uuid"))]
    pub service_id: Option<EntityId>,
    #[serde(default)]
    pub featured: bool,
    pub status: Option<PublishStatus>,
}

impl Validate for CreateTestimonialRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut v = Validator::new();
        v.text("client_name", "Client name", &self.client_name, 1, 200)
            .text("quote", "Quote", &self.quote, 10, 2_000)
            .optional_url("avatar_url", "Avatar URL", self.avatar_url.as_deref());
        if let Some(rating) = self.rating {
            v.range("rating", "Rating", rating as i64, 1, 5);
        }
        v.finish()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UpdateTestimonialRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quote: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "uuid"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_id: Option<EntityId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<PublishStatus>,
}

impl HasUpdates for UpdateTestimonialRequest {}

impl Validate for UpdateTestimonialRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut v = Validator::new();
        if let Some(client_name) = &self.client_name {
            v.text("client_name", "Client name", client_name, 1, 200);
        }
        if let Some(quote) = &self.quote {
            v.text("quote", "Quote", quote, 10, 2_000);
        }
        if let Some(rating) = self.rating {
            v.range("rating", "Rating", rating as i64, 1, 5);
        }
        v.optional_url("avatar_url", "Avatar URL", self.avatar_url.as_deref());
        v.finish()
    }
}

// ============================================================================
// TEAM MEMBER
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TeamMember {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub id: EntityId,
    pub slug: String,
    pub name: String,
    pub role: String,
    pub department: Option<String>,
    pub bio: Option<String>,
    pub photo_url: Option<String>,
    pub linkedin_url: Option<String>,
    pub featured: bool,
    pub display_order: i32,
    pub is_active: bool,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub updated_at: Timestamp,
}

impl Record for TeamMember {
    const TABLE: Table = Table::TeamMembers;
    const ENTITY_NAME: &'static str = "Team member";
}

impl TeamMember {
    pub const LIST: ListConfig = ListConfig {
        sortable: &["display_order", "name", "created_at"],
        filters: &[
            FilterField::text("department", "department"),
            FilterField::bool("featured", "featured"),
        ],
        searchable: &["name", "role", "bio"],
        paginate: true,
        default_sort: "display_order",
        default_order: SortOrder::Asc,
    };

    pub const ADMIN_LIST: ListConfig = ListConfig {
        filters: &[
            FilterField::text("department", "department"),
            FilterField::bool("featured", "featured"),
            FilterField::bool("is_active", "is_active"),
        ],
        ..Self::LIST
    };

    pub fn from_request(req: CreateTeamMemberRequest, now: Timestamp) -> Self {
        Self {
            id: new_entity_id(),
            slug: resolve_slug(req.slug.as_deref(), &req.name),
            name: req.name.trim().to_string(),
            role: req.role.trim().to_string(),
            department: trimmed(req.department),
            bio: trimmed(req.bio),
            photo_url: trimmed(req.photo_url),
            linkedin_url: trimmed(req.linkedin_url),
            featured: req.featured,
            display_order: req.display_order.unwrap_or(0),
            is_active: req.is_active.unwrap_or(true),
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateTeamMemberRequest {
    pub slug: Option<String>,
    pub name: String,
    pub role: String,
    pub department: Option<String>,
    pub bio: Option<String>,
    pub photo_url: Option<String>,
    pub linkedin_url: Option<String>,
    #[serde(default)]
    pub featured: bool,
    pub display_order: Option<i32>,
    pub is_active: Option<bool>,
}

impl Validate for CreateTeamMemberRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut v = Validator::new();
        v.text("name", "Name", &self.name, 1, 100)
            .text("role", "Role", &self.role, 1, 100)
            .optional_slug("slug", self.slug.as_deref())
            .check(
                !resolve_slug(self.slug.as_deref(), &self.name).is_empty(),
                "slug",
                "Slug could not be derived from the name",
            )
            .optional_text("bio", "Bio", self.bio.as_deref(), 5_000)
            .optional_url("photo_url", "Photo URL", self.photo_url.as_deref())
            .optional_url("linkedin_url", "LinkedIn URL", self.linkedin_url.as_deref());
        v.finish()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UpdateTeamMemberRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linkedin_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_order: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl HasUpdates for UpdateTeamMemberRequest {}

impl Validate for UpdateTeamMemberRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut v = Validator::new();
        if let Some(name) = &self.name {
            v.text("name", "Name", name, 1, 100);
        }
        if let Some(role) = &self.role {
            v.text("role", "Role", role, 1, 100);
        }
        v.optional_slug("slug", self.slug.as_deref())
            .optional_text("bio", "Bio", self.bio.as_deref(), 5_000)
            .optional_url("photo_url", "Photo URL", self.photo_url.as_deref())
            .optional_url("linkedin_url", "LinkedIn URL", self.linkedin_url.as_deref());
        v.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::now;

    #[test]
    fn test_service_slug_derived_from_title() {
        let req = CreateServiceRequest {
            title: "Web Design & Development".to_string(),
            description: "Sites that convert".to_string(),
            ..Default::default()
        };
        assert!(req.validate().is_ok());
        let service = Service::from_request(req, now());
        assert_eq!(service.slug, "web-design-development");
        assert_eq!(service.status, PublishStatus::Draft);
    }

    #[test]
    fn test_service_rejects_bad_slug_and_price() {
        let req = CreateServiceRequest {
            slug: Some("Not A Slug".to_string()),
            title: "SEO".to_string(),
            description: "Search".to_string(),
            price_from: Some(-1.0),
            ..Default::default()
        };
        let errors = req.validate().err().unwrap_or_default();
        assert!(errors.contains("slug"));
        assert!(errors.contains("price_from"));
    }

    #[test]
    fn test_published_case_study_gets_published_at() {
        let at = now();
        let req = CreateCaseStudyRequest {
            title: "Rebrand".to_string(),
            client_name: "Acme".to_string(),
            summary: "A full rebrand for Acme".to_string(),
            status: Some(PublishStatus::Published),
            ..Default::default()
        };
        let study = CaseStudy::from_request(req, at);
        assert_eq!(study.published_at, Some(at));
    }

    #[test]
    fn test_update_patch_contains_only_supplied_fields() {
        let update = UpdateServiceRequest {
            title: Some("New title".to_string()),
            featured: Some(true),
            ..Default::default()
        };
        let patch = update.to_patch();
        assert_eq!(patch.len(), 2);
        assert!(update.has_any_updates());
        assert!(!UpdateServiceRequest::default().has_any_updates());
    }

    #[test]
    fn test_testimonial_rating_range() {
        let req = CreateTestimonialRequest {
            client_name: "Sam".to_string(),
            quote: "They shipped on time and on budget.".to_string(),
            rating: Some(9),
            ..Default::default()
        };
        let errors = req.validate().err().unwrap_or_default();
        assert_eq!(errors.messages("rating"), ["Rating must be between 1 and 5"]);
    }

    #[test]
    fn test_team_member_defaults_active() {
        let member = TeamMember::from_request(
            CreateTeamMemberRequest {
                name: "Ada Lovelace".to_string(),
                role: "Engineer".to_string(),
                ..Default::default()
            },
            now(),
        );
        assert!(member.is_active);
        assert_eq!(member.slug, "ada-lovelace");
    }
}
