//! Public Careers Routes

use axum::{
    extract::{Query, State},
    http::Uri,
    routing::get,
    Router,
};
use serde_json::Value;
use vitrine_core::{Job, ListParams, Table};

use crate::envelope::ApiResponse;
use crate::error::ApiResult;
use crate::extractors::PathKey;
use crate::state::AppState;

use super::common::{active, cached_get, cached_list};

/// GET /api/careers - List open positions
#[utoipa::path(
    get,
    path = "/api/careers",
    tag = "Careers",
    params(
        ("department" = Option<String>, Query, description = "Filter by department"),
        ("location" = Option<String>, Query, description = "Filter by location"),
        ("employment_type" = Option<String>, Query, description = "full_time, part_time, contract or internship"),
        ("remote" = Option<bool>, Query, description = "Remote positions only"),
        ("search" = Option<String>, Query, description = "Search title and description"),
        ("sort_by" = Option<String>, Query, description = "created_at or title"),
        ("sort_order" = Option<String>, Query, description = "asc or desc"),
        ("page" = Option<u32>, Query, description = "1-based page number"),
        ("limit" = Option<u32>, Query, description = "Page size (max 100)"),
    ),
    responses((status = 200, description = "Page of positions")),
)]
pub async fn list_jobs(
    State(state): State<AppState>,
    uri: Uri,
    Query(params): Query<ListParams>,
) -> ApiResult<ApiResponse<Value>> {
    cached_list::<Job>(&state, &uri, active(Table::Jobs), &params, &Job::LIST).await
}

/// GET /api/careers/{slug_or_id} - Get one open position
#[utoipa::path(
    get,
    path = "/api/careers/{slug_or_id}",
    tag = "Careers",
    params(("slug_or_id" = String, Path, description = "Position slug or UUID")),
    responses(
        (status = 200, description = "Position", body = Job),
        (status = 404, description = "Not found", body = crate::error::ApiError),
    ),
)]
pub async fn get_job(
    State(state): State<AppState>,
    uri: Uri,
    PathKey(key): PathKey,
) -> ApiResult<ApiResponse<Value>> {
    cached_get::<Job>(&state, &uri, active(Table::Jobs), &key).await
}

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/careers", get(list_jobs))
        .route("/careers/:key", get(get_job))
}
