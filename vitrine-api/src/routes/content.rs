//! Public Content Routes
//!
//! Read-only, cached endpoints for services, case studies, testimonials and
//! team members. Only published (or active) rows are visible here; the admin
//! routes see everything.

use axum::{
    extract::{Query, State},
    http::Uri,
    routing::get,
    Router,
};
use serde_json::Value;
use vitrine_core::{CaseStudy, ListParams, Service, Table, TeamMember, Testimonial};

use crate::envelope::ApiResponse;
use crate::error::ApiResult;
use crate::extractors::PathKey;
use crate::state::AppState;

use super::common::{active, cached_get, cached_list, published};

// ============================================================================
// SERVICES
// ============================================================================

/// GET /api/services - List published services
#[utoipa::path(
    get,
    path = "/api/services",
    tag = "Content",
    params(
        ("featured" = Option<bool>, Query, description = "Only featured services"),
        ("category" = Option<String>, Query, description = "Filter by category"),
        ("search" = Option<String>, Query, description = "Search title and descriptions"),
        ("sort_by" = Option<String>, Query, description = "display_order, title, created_at or price_from"),
        ("sort_order" = Option<String>, Query, description = "asc or desc"),
        ("page" = Option<u32>, Query, description = "1-based page number"),
        ("limit" = Option<u32>, Query, description = "Page size (max 100)"),
    ),
    responses(
        (status = 200, description = "Page of services"),
    ),
)]
pub async fn list_services(
    State(state): State<AppState>,
    uri: Uri,
    Query(params): Query<ListParams>,
) -> ApiResult<ApiResponse<Value>> {
    cached_list::<Service>(&state, &uri, published(Table::Services), &params, &Service::LIST).await
}

/// GET /api/services/{slug_or_id} - Get one published service
#[utoipa::path(
    get,
    path = "/api/services/{slug_or_id}",
    tag = "Content",
    params(("slug_or_id" = String, Path, description = "Service slug or UUID")),
    responses(
        (status = 200, description = "Service", body = Service),
        (status = 404, description = "Not found", body = crate::error::ApiError),
    ),
)]
pub async fn get_service(
    State(state): State<AppState>,
    uri: Uri,
    PathKey(key): PathKey,
) -> ApiResult<ApiResponse<Value>> {
    cached_get::<Service>(&state, &uri, published(Table::Services), &key).await
}

// ============================================================================
// CASE STUDIES
// ============================================================================

/// GET /api/case-studies - List published case studies
#[utoipa::path(
    get,
    path = "/api/case-studies",
    tag = "Content",
    params(
        ("featured" = Option<bool>, Query, description = "Only featured case studies"),
        ("industry" = Option<String>, Query, description = "Filter by industry"),
        ("service" = Option<String>, Query, description = "Filter by service UUID"),
        ("search" = Option<String>, Query, description = "Search title, client and summary"),
        ("sort_by" = Option<String>, Query, description = "published_at, created_at or title"),
        ("sort_order" = Option<String>, Query, description = "asc or desc"),
        ("page" = Option<u32>, Query, description = "1-based page number"),
        ("limit" = Option<u32>, Query, description = "Page size (max 100)"),
    ),
    responses(
        (status = 200, description = "Page of case studies"),
    ),
)]
pub async fn list_case_studies(
    State(state): State<AppState>,
    uri: Uri,
    Query(params): Query<ListParams>,
) -> ApiResult<ApiResponse<Value>> {
    cached_list::<CaseStudy>(
        &state,
        &uri,
        published(Table::CaseStudies),
        &params,
        &CaseStudy::LIST,
    )
    .await
}

/// GET /api/case-studies/{slug_or_id} - Get one published case study
#[utoipa::path(
    get,
    path = "/api/case-studies/{slug_or_id}",
    tag = "Content",
    params(("slug_or_id" = String, Path, description = "Case study slug or UUID")),
    responses(
        (status = 200, description = "Case study", body = CaseStudy),
        (status = 404, description = "Not found", body = crate::error::ApiError),
    ),
)]
pub async fn get_case_study(
    State(state): State<AppState>,
    uri: Uri,
    PathKey(key): PathKey,
) -> ApiResult<ApiResponse<Value>> {
    cached_get::<CaseStudy>(&state, &uri, published(Table::CaseStudies), &key).await
}

// ============================================================================
// TESTIMONIALS AND TEAM
// ============================================================================

/// GET /api/testimonials - List published testimonials
#[utoipa::path(
    get,
    path = "/api/testimonials",
    tag = "Content",
    params(
        ("featured" = Option<bool>, Query, description = "Only featured testimonials"),
        ("service" = Option<String>, Query, description = "Filter by service UUID"),
        ("rating" = Option<i64>, Query, description = "Filter by star rating"),
        ("sort_by" = Option<String>, Query, description = "created_at or rating"),
        ("sort_order" = Option<String>, Query, description = "asc or desc"),
        ("page" = Option<u32>, Query, description = "1-based page number"),
        ("limit" = Option<u32>, Query, description = "Page size (max 100)"),
    ),
    responses(
        (status = 200, description = "Page of testimonials"),
    ),
)]
pub async fn list_testimonials(
    State(state): State<AppState>,
    uri: Uri,
    Query(params): Query<ListParams>,
) -> ApiResult<ApiResponse<Value>> {
    cached_list::<Testimonial>(
        &state,
        &uri,
        published(Table::Testimonials),
        &params,
        &Testimonial::LIST,
    )
    .await
}

/// GET /api/team - List active team members
#[utoipa::path(
    get,
    path = "/api/team",
    tag = "Content",
    params(
        ("department" = Option<String>, Query, description = "Filter by department"),
        ("featured" = Option<bool>, Query, description = "Only featured members"),
        ("search" = Option<String>, Query, description = "Search name and role"),
        ("sort_by" = Option<String>, Query, description = "display_order or name"),
        ("sort_order" = Option<String>, Query, description = "asc or desc"),
    ),
    responses(
        (status = 200, description = "Team members"),
    ),
)]
pub async fn list_team(
    State(state): State<AppState>,
    uri: Uri,
    Query(params): Query<ListParams>,
) -> ApiResult<ApiResponse<Value>> {
    cached_list::<TeamMember>(
        &state,
        &uri,
        active(Table::TeamMembers),
        &params,
        &TeamMember::LIST,
    )
    .await
}

/// GET /api/team/{slug_or_id} - Get one active team member
#[utoipa::path(
    get,
    path = "/api/team/{slug_or_id}",
    tag = "Content",
    params(("slug_or_id" = String, Path, description = "Team member slug or UUID")),
    responses(
        (status = 200, description = "Team member", body = TeamMember),
        (status = 404, description = "Not found", body = crate::error::ApiError),
    ),
)]
pub async fn get_team_member(
    State(state): State<AppState>,
    uri: Uri,
    PathKey(key): PathKey,
) -> ApiResult<ApiResponse<Value>> {
    cached_get::<TeamMember>(&state, &uri, active(Table::TeamMembers), &key).await
}

// ============================================================================
// ROUTER
// ============================================================================

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/services", get(list_services))
        .route("/services/:key", get(get_service))
        .route("/case-studies", get(list_case_studies))
        .route("/case-studies/:key", get(get_case_study))
        .route("/testimonials", get(list_testimonials))
        .route("/team", get(list_team))
        .route("/team/:key", get(get_team_member))
}
