//! Site-wide Public Routes
//!
//! Per-page SEO metadata and the cross-content search box.

use axum::{
    extract::{Query, State},
    http::{HeaderMap, Uri},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use vitrine_core::{
    apply_list_params, normalize_page_path, BlogPost, CaseStudy, ListParams, Query as StoreQuery,
    SearchAnalytics, SeoSetting, Service, Table,
};

use crate::envelope::ApiResponse;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::store::Listing;

use super::common::{cache_key, header_value, published};

const MIN_QUERY_LEN: usize = 2;
const DEFAULT_SEARCH_LIMIT: u32 = 5;
const MAX_SEARCH_LIMIT: u32 = 20;

// ============================================================================
// SEO
// ============================================================================

#[derive(Debug, Clone, Deserialize, utoipa::IntoParams)]
pub struct SeoQuery {
    /// Page path, e.g. `/about`.
    pub path: String,
}

/// GET /api/seo - SEO settings for a page path
#[utoipa::path(
    get,
    path = "/api/seo",
    tag = "Site",
    params(SeoQuery),
    responses(
        (status = 200, description = "SEO settings", body = SeoSetting),
        (status = 404, description = "No settings for this path", body = ApiError),
    ),
)]
pub async fn get_seo(
    State(state): State<AppState>,
    uri: Uri,
    Query(query): Query<SeoQuery>,
) -> ApiResult<ApiResponse<Value>> {
    let path = normalize_page_path(&query.path);
    let data = state
        .cache
        .get_or_load(cache_key(&uri), &[Table::SeoSettings], || async {
            state
                .db
                .find_one::<SeoSetting>(
                    StoreQuery::table(Table::SeoSettings).eq_text("page_path", path.clone()),
                )
                .await?
                .ok_or_else(|| ApiError::entity_not_found("SEO settings", &path))
        })
        .await?;
    Ok(ApiResponse::ok(Value::clone(&data)))
}

// ============================================================================
// SEARCH
// ============================================================================

#[derive(Debug, Clone, Deserialize, utoipa::IntoParams)]
pub struct SearchQuery {
    /// Search term, at least two characters.
    #[serde(default)]
    pub q: String,
    /// Results per content type (default 5, max 20).
    pub limit: Option<u32>,
}

/// Search hits grouped by content type.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct SearchResults {
    pub query: String,
    pub services: Vec<Service>,
    pub case_studies: Vec<CaseStudy>,
    pub blog_posts: Vec<BlogPost>,
    pub total: u64,
}

/// GET /api/search - Search published services, case studies and posts
#[utoipa::path(
    get,
    path = "/api/search",
    tag = "Site",
    params(SearchQuery),
    responses(
        (status = 200, description = "Grouped results", body = SearchResults),
        (status = 400, description = "Query too short", body = ApiError),
    ),
)]
pub async fn search(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<SearchQuery>,
) -> ApiResult<ApiResponse<SearchResults>> {
    let term = query.q.trim().to_string();
    if term.chars().count() < MIN_QUERY_LEN {
        return Err(ApiError::field(
            "q",
            format!("Search query must be at least {} characters", MIN_QUERY_LEN),
        ));
    }
    let limit = query
        .limit
        .unwrap_or(DEFAULT_SEARCH_LIMIT)
        .clamp(1, MAX_SEARCH_LIMIT);
    let params = ListParams::new()
        .with("search", term.clone())
        .with("limit", limit.to_string());

    let services = state
        .db
        .list::<Service>(&apply_list_params(
            published(Table::Services),
            &params,
            &Service::LIST,
        ))
        .await?;
    let case_studies = state
        .db
        .list::<CaseStudy>(&apply_list_params(
            published(Table::CaseStudies),
            &params,
            &CaseStudy::LIST,
        ))
        .await?;
    let blog_posts = state
        .db
        .list::<BlogPost>(&apply_list_params(
            published(Table::BlogPosts),
            &params,
            &BlogPost::LIST,
        ))
        .await?;

    let total = matches(&services) + matches(&case_studies) + matches(&blog_posts);

    // Analytics never fails the search.
    let row = SearchAnalytics::new(
        &term,
        total,
        header_value(&headers, "x-session-id"),
        vitrine_core::now(),
    );
    if let Err(e) = state.db.insert(&row).await {
        tracing::warn!(error = %e, "Failed to record search analytics");
    }

    Ok(ApiResponse::ok(SearchResults {
        query: term,
        services: services.items,
        case_studies: case_studies.items,
        blog_posts: blog_posts.items,
        total,
    }))
}

/// All matching rows, not just the shown page.
fn matches<R>(listing: &Listing<R>) -> u64 {
    listing
        .pagination
        .as_ref()
        .map_or(listing.items.len() as u64, |meta| meta.total)
}

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/seo", get(get_seo))
        .route("/search", get(search))
}
