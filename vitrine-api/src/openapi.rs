//! OpenAPI Specification for the Vitrine API
//!
//! The document is assembled by utoipa from route annotations and the
//! schema derives on `vitrine-core` types. Admin content CRUD is served by
//! the generic component router and is documented through its schemas only.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::envelope::{Created, Deleted};
use crate::error::{ApiError, ErrorCode};
use crate::notify::{EventName, WebhookEvent};
use crate::routes::admin::CacheCleared;
use crate::routes::health::{ComponentHealth, HealthDetails, HealthResponse, HealthStatus};
use crate::routes::site::SearchResults;
use crate::routes::webhooks::WebhookReceived;

use crate::routes::{admin, blog, careers, content, forms, health, site, webhooks};

use vitrine_core::{
    AnalyticsSummary, ApplicationStatus, BlogPost, BookConsultationRequest, CaseStudy, Category,
    Comment, CommentNode, CommentStatus, ConsultationRequest, ConsultationStatus, ContactRequest,
    ContactSubmission, CreateBlogPostRequest, CreateCaseStudyRequest, CreateCategoryRequest,
    CreateCommentRequest, CreateJobApplicationRequest, CreateJobRequest, CreateMediaRequest,
    CreateServiceRequest, CreateTagRequest, CreateTeamMemberRequest, CreateTestimonialRequest,
    EmploymentType, FormAction, Job, JobApplication, MediaItem, NewsletterSubscription,
    PaginationMeta, PublishStatus, SeoSetting, Service, SortOrder, SubmissionStatus,
    SubscribeRequest, Tag, TeamMember, Testimonial, TrackEventRequest, TrackFormRequest,
    TrackPageViewRequest, UnsubscribeRequest, UpdateApplicationRequest, UpdateBlogPostRequest,
    UpdateCaseStudyRequest, UpdateCommentRequest, UpdateConsultationRequest,
    UpdateContactRequest, UpdateJobRequest, UpdateServiceRequest, UpdateTeamMemberRequest,
    UpdateTestimonialRequest, UpsertSeoRequest,
};

/// OpenAPI document for the Vitrine API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Vitrine API",
        version = "0.1.0",
        description = "Agency website backend: published content, form intake, notifications and administration",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:3000", description = "Local Development")
    ),
    tags(
        (name = "Content", description = "Services, case studies, testimonials and team"),
        (name = "Blog", description = "Posts, taxonomy and threaded comments"),
        (name = "Careers", description = "Job openings and applications"),
        (name = "Site", description = "SEO settings and site search"),
        (name = "Forms", description = "Contact, newsletter and consultation intake"),
        (name = "Analytics", description = "Page view, engagement and form tracking"),
        (name = "Admin", description = "Content management and submission review"),
        (name = "Webhooks", description = "Signed inbound events"),
        (name = "Health", description = "Liveness and readiness probes")
    ),
    paths(
        // === Content ===
        content::list_services,
        content::get_service,
        content::list_case_studies,
        content::get_case_study,
        content::list_testimonials,
        content::list_team,
        content::get_team_member,

        // === Blog ===
        blog::list_posts,
        blog::get_post,
        blog::list_categories,
        blog::list_tags,
        blog::list_comments,

        // === Careers ===
        careers::list_jobs,
        careers::get_job,

        // === Site ===
        site::get_seo,
        site::search,

        // === Forms and analytics ===
        forms::submit_contact,
        forms::subscribe,
        forms::unsubscribe,
        forms::book_consultation,
        forms::apply,
        forms::submit_comment,
        forms::track_pageview,
        forms::track_event,
        forms::track_form,

        // === Admin ===
        admin::create_category,
        admin::delete_category,
        admin::create_tag,
        admin::list_comments,
        admin::update_comment,
        admin::delete_comment,
        admin::list_contact,
        admin::update_contact,
        admin::list_consultations,
        admin::update_consultation,
        admin::list_applications,
        admin::update_application,
        admin::list_newsletter,
        admin::upsert_seo,
        admin::list_media,
        admin::create_media,
        admin::delete_media,
        admin::analytics_summary,
        admin::clear_cache,

        // === Webhooks ===
        webhooks::receive_webhook,

        // === Health ===
        health::ping,
        health::liveness,
        health::readiness,
    ),
    components(
        schemas(
            // === Envelope and errors ===
            ApiError, ErrorCode, Created, Deleted, PaginationMeta, SortOrder,

            // === Content ===
            Service, CaseStudy, Testimonial, TeamMember, PublishStatus,
            CreateServiceRequest, UpdateServiceRequest,
            CreateCaseStudyRequest, UpdateCaseStudyRequest,
            CreateTestimonialRequest, UpdateTestimonialRequest,
            CreateTeamMemberRequest, UpdateTeamMemberRequest,

            // === Blog ===
            BlogPost, Category, Tag, Comment, CommentNode, CommentStatus,
            CreateBlogPostRequest, UpdateBlogPostRequest,
            CreateCategoryRequest, CreateTagRequest,
            CreateCommentRequest, UpdateCommentRequest,

            // === Careers ===
            Job, JobApplication, EmploymentType, ApplicationStatus,
            CreateJobRequest, UpdateJobRequest,
            CreateJobApplicationRequest, UpdateApplicationRequest,

            // === Forms ===
            ContactSubmission, ContactRequest, UpdateContactRequest, SubmissionStatus,
            ConsultationRequest, BookConsultationRequest, UpdateConsultationRequest,
            ConsultationStatus, NewsletterSubscription, SubscribeRequest, UnsubscribeRequest,

            // === Site and analytics ===
            SeoSetting, UpsertSeoRequest, MediaItem, CreateMediaRequest, SearchResults,
            TrackPageViewRequest, TrackEventRequest, TrackFormRequest, FormAction,
            AnalyticsSummary, CacheCleared,

            // === Webhooks ===
            EventName, WebhookEvent, WebhookReceived,

            // === Health ===
            HealthResponse, HealthStatus, HealthDetails, ComponentHealth
        )
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Security scheme modifier for OpenAPI document.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            // Admin API keys
            components.add_security_scheme(
                "api_key",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("X-API-Key"))),
            );

            // Admin JWTs
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("JWT Bearer token carrying an admin role"))
                        .build(),
                ),
            );
        }
    }
}

impl ApiDoc {
    /// Generate OpenAPI spec as JSON string.
    pub fn to_json() -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&Self::openapi())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_generation() -> Result<(), String> {
        let openapi = ApiDoc::openapi();
        assert_eq!(openapi.info.title, "Vitrine API");

        let tags = openapi
            .tags
            .as_ref()
            .ok_or_else(|| "OpenAPI tags missing".to_string())?;
        assert!(tags.iter().any(|t| t.name == "Forms"));

        let components = openapi
            .components
            .as_ref()
            .ok_or_else(|| "OpenAPI components missing".to_string())?;
        assert!(components.security_schemes.contains_key("api_key"));
        assert!(components.security_schemes.contains_key("bearer_auth"));
        assert!(components.schemas.contains_key("ContactRequest"));
        Ok(())
    }

    #[test]
    fn test_openapi_json_serialization() -> Result<(), String> {
        let json = ApiDoc::to_json().map_err(|e| format!("Failed to serialize OpenAPI: {}", e))?;
        serde_json::from_str::<serde_json::Value>(&json)
            .map_err(|e| format!("Generated JSON invalid: {}", e))?;
        assert!(json.contains("Vitrine API"));
        Ok(())
    }

    #[test]
    fn test_aliased_ids_and_timestamps_render_as_strings() -> Result<(), String> {
        let json = ApiDoc::to_json().map_err(|e| e.to_string())?;
        let doc: serde_json::Value = serde_json::from_str(&json).map_err(|e| e.to_string())?;
        let schemas = &doc["components"]["schemas"];

        let service = &schemas["Service"]["properties"];
        assert_eq!(service["id"]["format"], "uuid");
        assert_eq!(service["created_at"]["format"], "date-time");

        let post = &schemas["BlogPost"]["properties"];
        assert_eq!(post["category_id"]["format"], "uuid");
        assert_eq!(post["published_at"]["format"], "date-time");

        let comment = &schemas["Comment"]["properties"];
        assert_eq!(comment["post_id"]["format"], "uuid");
        Ok(())
    }

    #[test]
    fn test_openapi_paths_exist() {
        let paths = ApiDoc::openapi().paths.paths;

        for path in [
            "/api/services",
            "/api/blog/{slug}",
            "/api/blog/{slug}/comments",
            "/api/careers/{slug_or_id}/apply",
            "/api/contact",
            "/api/newsletter",
            "/api/search",
            "/api/admin/seo",
            "/api/admin/cache/clear",
            "/api/webhooks/incoming",
            "/health/ready",
        ] {
            assert!(paths.contains_key(path), "missing {}", path);
        }
    }
}
