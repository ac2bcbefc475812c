//! Admin Routes
//!
//! Everything under `/api/admin` sits behind the auth middleware (API key or
//! admin-role JWT). Content sections use the generic CRUD router; the rest
//! are moderation, submission review and site settings.

use axum::{
    extract::{Query, State},
    routing::{delete, get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use vitrine_core::{
    normalize_page_path, serialize_patch, BlogPost, CaseStudy, Category, Comment,
    ConsultationRequest, ContactSubmission, CreateCategoryRequest, CreateMediaRequest,
    CreateTagRequest, FormAction, Job, JobApplication, ListParams, MediaItem,
    NewsletterSubscription, Query as StoreQuery, RowKey, SeoSetting, Service, Table, Tag,
    TeamMember, Testimonial, UpdateApplicationRequest, UpdateCommentRequest,
    UpdateConsultationRequest, UpdateContactRequest, UpsertSeoRequest, AnalyticsSummary,
};

use crate::envelope::{ApiResponse, Deleted, ListData};
use crate::error::{ApiError, ApiResult};
use crate::extractors::{JsonBody, PathId, PathKey, ValidatedJson};
use crate::state::AppState;

use super::common::{admin_list, delete_row, require_updates, update_row};
use super::generic::crud_routes;

// ============================================================================
// BLOG TAXONOMY
// ============================================================================

/// POST /api/admin/blog/categories - Create a blog category
#[utoipa::path(
    post,
    path = "/api/admin/blog/categories",
    tag = "Admin",
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Category created", body = Category),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 409, description = "Duplicate slug", body = ApiError),
    ),
    security(("api_key" = []), ("bearer_auth" = [])),
)]
pub async fn create_category(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CreateCategoryRequest>,
) -> ApiResult<ApiResponse<Category>> {
    let category = state
        .db
        .insert(&Category::from_request(req, vitrine_core::now()))
        .await?;
    state.cache.invalidate(Table::BlogCategories);
    Ok(ApiResponse::created(category))
}

/// DELETE /api/admin/blog/categories/{slug_or_id} - Delete a blog category
#[utoipa::path(
    delete,
    path = "/api/admin/blog/categories/{slug_or_id}",
    tag = "Admin",
    params(("slug_or_id" = String, Path, description = "Category slug or UUID")),
    responses(
        (status = 200, description = "Deleted", body = Deleted),
        (status = 404, description = "Not found", body = ApiError),
    ),
    security(("api_key" = []), ("bearer_auth" = [])),
)]
pub async fn delete_category(
    State(state): State<AppState>,
    PathKey(key): PathKey,
) -> ApiResult<ApiResponse<Deleted>> {
    delete_row::<Category>(&state, &key).await?;
    // Post listings filter by category.
    state.cache.invalidate(Table::BlogCategories);
    state.cache.invalidate(Table::BlogPosts);
    Ok(ApiResponse::ok(Deleted { deleted: true }))
}

/// POST /api/admin/blog/tags - Create a blog tag
#[utoipa::path(
    post,
    path = "/api/admin/blog/tags",
    tag = "Admin",
    request_body = CreateTagRequest,
    responses(
        (status = 201, description = "Tag created", body = Tag),
        (status = 409, description = "Duplicate slug", body = ApiError),
    ),
    security(("api_key" = []), ("bearer_auth" = [])),
)]
pub async fn create_tag(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CreateTagRequest>,
) -> ApiResult<ApiResponse<Tag>> {
    let tag = state.db.insert(&Tag::from_request(req, vitrine_core::now())).await?;
    state.cache.invalidate(Table::BlogTags);
    Ok(ApiResponse::created(tag))
}

// ============================================================================
// COMMENT MODERATION
// ============================================================================

/// GET /api/admin/comments - Comments in any status
#[utoipa::path(
    get,
    path = "/api/admin/comments",
    tag = "Admin",
    params(
        ("status" = Option<String>, Query, description = "pending, approved, rejected or spam"),
        ("post" = Option<String>, Query, description = "Filter by post UUID"),
        ("page" = Option<u32>, Query, description = "1-based page number"),
        ("limit" = Option<u32>, Query, description = "Page size (max 100)"),
    ),
    responses((status = 200, description = "Page of comments")),
    security(("api_key" = []), ("bearer_auth" = [])),
)]
pub async fn list_comments(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<ApiResponse<ListData<Comment>>> {
    admin_list::<Comment>(&state, &params, &Comment::ADMIN_LIST).await
}

/// PUT /api/admin/comments/{id} - Moderate a comment
#[utoipa::path(
    put,
    path = "/api/admin/comments/{id}",
    tag = "Admin",
    params(("id" = Uuid, Path, description = "Comment ID")),
    request_body = UpdateCommentRequest,
    responses(
        (status = 200, description = "Comment updated", body = Comment),
        (status = 400, description = "No fields to update", body = ApiError),
        (status = 404, description = "Not found", body = ApiError),
    ),
    security(("api_key" = []), ("bearer_auth" = [])),
)]
pub async fn update_comment(
    State(state): State<AppState>,
    PathId(id): PathId,
    ValidatedJson(req): ValidatedJson<UpdateCommentRequest>,
) -> ApiResult<ApiResponse<Comment>> {
    let patch = require_updates(&req)?;
    let comment = update_row::<Comment>(&state, &RowKey::Id(id), patch).await?;
    tracing::info!(%id, status = %comment.status.as_db_str(), "Comment moderated");
    state.cache.invalidate(Table::Comments);
    Ok(ApiResponse::ok(comment))
}

/// DELETE /api/admin/comments/{id} - Delete a comment
#[utoipa::path(
    delete,
    path = "/api/admin/comments/{id}",
    tag = "Admin",
    params(("id" = Uuid, Path, description = "Comment ID")),
    responses(
        (status = 200, description = "Deleted", body = Deleted),
        (status = 404, description = "Not found", body = ApiError),
    ),
    security(("api_key" = []), ("bearer_auth" = [])),
)]
pub async fn delete_comment(
    State(state): State<AppState>,
    PathId(id): PathId,
) -> ApiResult<ApiResponse<Deleted>> {
    delete_row::<Comment>(&state, &RowKey::Id(id)).await?;
    state.cache.invalidate(Table::Comments);
    Ok(ApiResponse::ok(Deleted { deleted: true }))
}

// ============================================================================
// SUBMISSIONS
// ============================================================================

/// GET /api/admin/contact - Contact form submissions
#[utoipa::path(
    get,
    path = "/api/admin/contact",
    tag = "Admin",
    params(
        ("status" = Option<String>, Query, description = "new, read, replied or archived"),
        ("search" = Option<String>, Query, description = "Search name, email, company and message"),
        ("page" = Option<u32>, Query, description = "1-based page number"),
        ("limit" = Option<u32>, Query, description = "Page size (max 100)"),
    ),
    responses((status = 200, description = "Page of submissions")),
    security(("api_key" = []), ("bearer_auth" = [])),
)]
pub async fn list_contact(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<ApiResponse<ListData<ContactSubmission>>> {
    admin_list::<ContactSubmission>(&state, &params, &ContactSubmission::ADMIN_LIST).await
}

/// PUT /api/admin/contact/{id} - Update a submission's status
#[utoipa::path(
    put,
    path = "/api/admin/contact/{id}",
    tag = "Admin",
    params(("id" = Uuid, Path, description = "Submission ID")),
    request_body = UpdateContactRequest,
    responses(
        (status = 200, description = "Updated", body = ContactSubmission),
        (status = 404, description = "Not found", body = ApiError),
    ),
    security(("api_key" = []), ("bearer_auth" = [])),
)]
pub async fn update_contact(
    State(state): State<AppState>,
    PathId(id): PathId,
    JsonBody(req): JsonBody<UpdateContactRequest>,
) -> ApiResult<ApiResponse<ContactSubmission>> {
    let patch = require_updates(&req)?;
    Ok(ApiResponse::ok(update_row(&state, &RowKey::Id(id), patch).await?))
}

/// GET /api/admin/consultations - Consultation requests
#[utoipa::path(
    get,
    path = "/api/admin/consultations",
    tag = "Admin",
    params(
        ("status" = Option<String>, Query, description = "pending, confirmed, completed or cancelled"),
        ("service" = Option<String>, Query, description = "Filter by service UUID"),
        ("search" = Option<String>, Query, description = "Search name, email and company"),
        ("page" = Option<u32>, Query, description = "1-based page number"),
        ("limit" = Option<u32>, Query, description = "Page size (max 100)"),
    ),
    responses((status = 200, description = "Page of requests")),
    security(("api_key" = []), ("bearer_auth" = [])),
)]
pub async fn list_consultations(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<ApiResponse<ListData<ConsultationRequest>>> {
    admin_list::<ConsultationRequest>(&state, &params, &ConsultationRequest::ADMIN_LIST).await
}

/// PUT /api/admin/consultations/{id} - Update a request's status
#[utoipa::path(
    put,
    path = "/api/admin/consultations/{id}",
    tag = "Admin",
    params(("id" = Uuid, Path, description = "Consultation request ID")),
    request_body = UpdateConsultationRequest,
    responses(
        (status = 200, description = "Updated", body = ConsultationRequest),
        (status = 404, description = "Not found", body = ApiError),
    ),
    security(("api_key" = []), ("bearer_auth" = [])),
)]
pub async fn update_consultation(
    State(state): State<AppState>,
    PathId(id): PathId,
    JsonBody(req): JsonBody<UpdateConsultationRequest>,
) -> ApiResult<ApiResponse<ConsultationRequest>> {
    let patch = require_updates(&req)?;
    Ok(ApiResponse::ok(update_row(&state, &RowKey::Id(id), patch).await?))
}

/// GET /api/admin/applications - Job applications
#[utoipa::path(
    get,
    path = "/api/admin/applications",
    tag = "Admin",
    params(
        ("status" = Option<String>, Query, description = "Application status"),
        ("job" = Option<String>, Query, description = "Filter by job UUID"),
        ("search" = Option<String>, Query, description = "Search name and email"),
        ("page" = Option<u32>, Query, description = "1-based page number"),
        ("limit" = Option<u32>, Query, description = "Page size (max 100)"),
    ),
    responses((status = 200, description = "Page of applications")),
    security(("api_key" = []), ("bearer_auth" = [])),
)]
pub async fn list_applications(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<ApiResponse<ListData<JobApplication>>> {
    admin_list::<JobApplication>(&state, &params, &JobApplication::ADMIN_LIST).await
}

/// PUT /api/admin/applications/{id} - Update an application's status
#[utoipa::path(
    put,
    path = "/api/admin/applications/{id}",
    tag = "Admin",
    params(("id" = Uuid, Path, description = "Application ID")),
    request_body = UpdateApplicationRequest,
    responses(
        (status = 200, description = "Updated", body = JobApplication),
        (status = 404, description = "Not found", body = ApiError),
    ),
    security(("api_key" = []), ("bearer_auth" = [])),
)]
pub async fn update_application(
    State(state): State<AppState>,
    PathId(id): PathId,
    JsonBody(req): JsonBody<UpdateApplicationRequest>,
) -> ApiResult<ApiResponse<JobApplication>> {
    let patch = require_updates(&req)?;
    Ok(ApiResponse::ok(update_row(&state, &RowKey::Id(id), patch).await?))
}

/// GET /api/admin/newsletter - Newsletter subscriptions
#[utoipa::path(
    get,
    path = "/api/admin/newsletter",
    tag = "Admin",
    params(
        ("is_active" = Option<bool>, Query, description = "Only active or cancelled subscriptions"),
        ("source" = Option<String>, Query, description = "Signup source"),
        ("search" = Option<String>, Query, description = "Search email and name"),
        ("page" = Option<u32>, Query, description = "1-based page number"),
        ("limit" = Option<u32>, Query, description = "Page size (max 100)"),
    ),
    responses((status = 200, description = "Page of subscriptions")),
    security(("api_key" = []), ("bearer_auth" = [])),
)]
pub async fn list_newsletter(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<ApiResponse<ListData<NewsletterSubscription>>> {
    admin_list::<NewsletterSubscription>(&state, &params, &NewsletterSubscription::ADMIN_LIST)
        .await
}

// ============================================================================
// SEO AND MEDIA
// ============================================================================

/// PUT /api/admin/seo - Create or replace a page's SEO settings
#[utoipa::path(
    put,
    path = "/api/admin/seo",
    tag = "Admin",
    request_body = UpsertSeoRequest,
    responses(
        (status = 200, description = "Settings replaced", body = SeoSetting),
        (status = 201, description = "Settings created", body = SeoSetting),
        (status = 400, description = "Validation failed", body = ApiError),
    ),
    security(("api_key" = []), ("bearer_auth" = [])),
)]
pub async fn upsert_seo(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<UpsertSeoRequest>,
) -> ApiResult<ApiResponse<SeoSetting>> {
    let path = normalize_page_path(&req.page_path);
    let existing = state
        .db
        .find_one::<SeoSetting>(StoreQuery::table(Table::SeoSettings).eq_text("page_path", path))
        .await?;
    let row = SeoSetting::upsert(req, existing.as_ref(), vitrine_core::now());

    let response = match existing {
        Some(current) => {
            let mut patch = serialize_patch(&row);
            patch.remove("id");
            patch.remove("created_at");
            ApiResponse::ok(update_row::<SeoSetting>(&state, &RowKey::Id(current.id), patch).await?)
        }
        None => ApiResponse::created(state.db.insert(&row).await?),
    };
    state.cache.invalidate(Table::SeoSettings);
    Ok(response)
}

/// GET /api/admin/media - Media library
#[utoipa::path(
    get,
    path = "/api/admin/media",
    tag = "Admin",
    params(
        ("folder" = Option<String>, Query, description = "Filter by folder"),
        ("mime_type" = Option<String>, Query, description = "Filter by MIME type"),
        ("search" = Option<String>, Query, description = "Search file name and alt text"),
        ("page" = Option<u32>, Query, description = "1-based page number"),
        ("limit" = Option<u32>, Query, description = "Page size (max 100)"),
    ),
    responses((status = 200, description = "Page of media items")),
    security(("api_key" = []), ("bearer_auth" = [])),
)]
pub async fn list_media(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<ApiResponse<ListData<MediaItem>>> {
    admin_list::<MediaItem>(&state, &params, &MediaItem::ADMIN_LIST).await
}

/// POST /api/admin/media - Register an uploaded file
#[utoipa::path(
    post,
    path = "/api/admin/media",
    tag = "Admin",
    request_body = CreateMediaRequest,
    responses(
        (status = 201, description = "Media item created", body = MediaItem),
        (status = 400, description = "Validation failed", body = ApiError),
    ),
    security(("api_key" = []), ("bearer_auth" = [])),
)]
pub async fn create_media(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CreateMediaRequest>,
) -> ApiResult<ApiResponse<MediaItem>> {
    let item = state
        .db
        .insert(&MediaItem::from_request(req, vitrine_core::now()))
        .await?;
    Ok(ApiResponse::created(item))
}

/// DELETE /api/admin/media/{id} - Remove a media item
#[utoipa::path(
    delete,
    path = "/api/admin/media/{id}",
    tag = "Admin",
    params(("id" = Uuid, Path, description = "Media item ID")),
    responses(
        (status = 200, description = "Deleted", body = Deleted),
        (status = 404, description = "Not found", body = ApiError),
    ),
    security(("api_key" = []), ("bearer_auth" = [])),
)]
pub async fn delete_media(
    State(state): State<AppState>,
    PathId(id): PathId,
) -> ApiResult<ApiResponse<Deleted>> {
    delete_row::<MediaItem>(&state, &RowKey::Id(id)).await?;
    Ok(ApiResponse::ok(Deleted { deleted: true }))
}

// ============================================================================
// ANALYTICS AND CACHE
// ============================================================================

/// GET /api/admin/analytics/summary - Row counts across analytics and forms
#[utoipa::path(
    get,
    path = "/api/admin/analytics/summary",
    tag = "Admin",
    responses((status = 200, description = "Counts", body = AnalyticsSummary)),
    security(("api_key" = []), ("bearer_auth" = [])),
)]
pub async fn analytics_summary(
    State(state): State<AppState>,
) -> ApiResult<ApiResponse<AnalyticsSummary>> {
    let db = &state.db;
    let all = StoreQuery::table;
    let submitted = all(Table::FormAnalytics).eq_text("action", FormAction::Submit.as_db_str());
    let subscribed = all(Table::NewsletterSubscriptions).eq_bool("is_active", true);
    let tracked = [
        all(Table::PageViews),
        all(Table::EngagementEvents),
        all(Table::FormAnalytics),
        all(Table::SearchAnalytics),
    ];
    let forms = [
        all(Table::ContactSubmissions),
        all(Table::ConsultationRequests),
        all(Table::JobApplications),
    ];

    let (page_views, engagement_events, form_events, searches, form_submissions) = tokio::try_join!(
        db.count(&tracked[0]),
        db.count(&tracked[1]),
        db.count(&tracked[2]),
        db.count(&tracked[3]),
        db.count(&submitted),
    )?;
    let (contact_submissions, consultation_requests, job_applications, active_subscribers) = tokio::try_join!(
        db.count(&forms[0]),
        db.count(&forms[1]),
        db.count(&forms[2]),
        db.count(&subscribed),
    )?;

    Ok(ApiResponse::ok(AnalyticsSummary {
        page_views,
        engagement_events,
        form_events,
        form_submissions,
        searches,
        contact_submissions,
        consultation_requests,
        job_applications,
        active_subscribers,
    }))
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CacheCleared {
    pub cleared: usize,
}

/// POST /api/admin/cache/clear - Drop every cached public response
#[utoipa::path(
    post,
    path = "/api/admin/cache/clear",
    tag = "Admin",
    responses((status = 200, description = "Cache cleared", body = CacheCleared)),
    security(("api_key" = []), ("bearer_auth" = [])),
)]
pub async fn clear_cache(State(state): State<AppState>) -> ApiResponse<CacheCleared> {
    let cleared = state.cache.clear();
    tracing::info!(cleared, "Response cache cleared");
    ApiResponse::ok(CacheCleared { cleared })
}

// ============================================================================
// ROUTER
// ============================================================================

/// Admin routes, relative to `/api/admin`. The caller adds the auth layer.
pub fn create_router() -> Router<AppState> {
    Router::new()
        .nest("/services", crud_routes::<Service>())
        .nest("/case-studies", crud_routes::<CaseStudy>())
        .nest("/blog", crud_routes::<BlogPost>())
        .nest("/testimonials", crud_routes::<Testimonial>())
        .nest("/team", crud_routes::<TeamMember>())
        .nest("/careers", crud_routes::<Job>())
        .route("/blog/categories", post(create_category))
        .route("/blog/categories/:key", delete(delete_category))
        .route("/blog/tags", post(create_tag))
        .route("/comments", get(list_comments))
        .route("/comments/:id", put(update_comment).delete(delete_comment))
        .route("/contact", get(list_contact))
        .route("/contact/:id", put(update_contact))
        .route("/consultations", get(list_consultations))
        .route("/consultations/:id", put(update_consultation))
        .route("/applications", get(list_applications))
        .route("/applications/:id", put(update_application))
        .route("/newsletter", get(list_newsletter))
        .route("/seo", put(upsert_seo))
        .route("/media", get(list_media).post(create_media))
        .route("/media/:id", delete(delete_media))
        .route("/analytics/summary", get(analytics_summary))
        .route("/cache/clear", post(clear_cache))
}
