//! Public Blog Routes
//!
//! Published posts, taxonomy and approved comment threads. Comment
//! submission lives with the other form routes.

use axum::{
    extract::{Query, State},
    http::Uri,
    routing::get,
    Router,
};
use serde_json::Value;
use vitrine_core::{
    apply_list_params, build_thread, BlogPost, Category, Comment, CommentStatus, ListParams,
    Pagination, PaginationMeta, Query as StoreQuery, Record, RowKey, SortOrder, Table, Tag,
};

use crate::envelope::{ApiResponse, ListData};
use crate::error::{ApiError, ApiResult};
use crate::extractors::PathKey;
use crate::state::AppState;

use super::common::{cache_key, cached_list, published};

/// Published post behind `key`, or 404.
pub(crate) async fn published_post(state: &AppState, key: &RowKey) -> ApiResult<BlogPost> {
    state
        .db
        .get_where::<BlogPost>(key, published(Table::BlogPosts))
        .await?
        .ok_or_else(|| ApiError::entity_not_found(BlogPost::ENTITY_NAME, key))
}

// ============================================================================
// POSTS
// ============================================================================

/// GET /api/blog - List published posts
///
/// `category` takes a category slug; an unknown slug yields an empty page.
#[utoipa::path(
    get,
    path = "/api/blog",
    tag = "Blog",
    params(
        ("featured" = Option<bool>, Query, description = "Only featured posts"),
        ("category" = Option<String>, Query, description = "Category slug"),
        ("tag" = Option<String>, Query, description = "Tag slug"),
        ("author" = Option<String>, Query, description = "Author name"),
        ("search" = Option<String>, Query, description = "Search title, excerpt and content"),
        ("sort_by" = Option<String>, Query, description = "published_at, created_at, title or view_count"),
        ("sort_order" = Option<String>, Query, description = "asc or desc"),
        ("page" = Option<u32>, Query, description = "1-based page number"),
        ("limit" = Option<u32>, Query, description = "Page size (max 100)"),
    ),
    responses(
        (status = 200, description = "Page of posts"),
    ),
)]
pub async fn list_posts(
    State(state): State<AppState>,
    uri: Uri,
    Query(mut params): Query<ListParams>,
) -> ApiResult<ApiResponse<Value>> {
    // Only the slug form is public.
    params.remove("category_id");
    let category = params.remove("category");

    let data = state
        .cache
        .get_or_load(
            cache_key(&uri),
            &[Table::BlogPosts, Table::BlogCategories],
            || async {
                let mut params = params;
                if let Some(slug) = category {
                    let found = state
                        .db
                        .get::<Category>(&RowKey::Slug(slug.trim().to_string()))
                        .await?;
                    match found {
                        Some(category) => {
                            params = params.with("category_id", category.id.to_string());
                        }
                        None => return Ok(empty_page(&params)),
                    }
                }
                let plan = apply_list_params(published(Table::BlogPosts), &params, &BlogPost::LIST);
                Ok::<_, ApiError>(ListData::from(state.db.list::<BlogPost>(&plan).await?))
            },
        )
        .await?;
    Ok(ApiResponse::ok(Value::clone(&data)))
}

fn empty_page(params: &ListParams) -> ListData<BlogPost> {
    let pagination = Pagination {
        page: params.page(),
        limit: params.limit(),
    };
    ListData {
        items: Vec::new(),
        pagination: Some(PaginationMeta::new(pagination, 0)),
    }
}

/// GET /api/blog/{slug} - Get a published post and count the view
#[utoipa::path(
    get,
    path = "/api/blog/{slug}",
    tag = "Blog",
    params(("slug" = String, Path, description = "Post slug or UUID")),
    responses(
        (status = 200, description = "Post", body = BlogPost),
        (status = 404, description = "Not found", body = ApiError),
    ),
)]
pub async fn get_post(
    State(state): State<AppState>,
    PathKey(key): PathKey,
) -> ApiResult<ApiResponse<BlogPost>> {
    let mut post = published_post(&state, &key).await?;

    // View counting never fails the read.
    let views = post.view_count.saturating_add(1);
    match state
        .db
        .set_counter::<BlogPost>(&RowKey::Id(post.id), "view_count", views)
        .await
    {
        Ok(_) => post.view_count = views,
        Err(e) => tracing::warn!(post_id = %post.id, error = %e, "Failed to count blog view"),
    }

    Ok(ApiResponse::ok(post))
}

// ============================================================================
// TAXONOMY
// ============================================================================

/// GET /api/blog/categories - All categories
#[utoipa::path(
    get,
    path = "/api/blog/categories",
    tag = "Blog",
    responses((status = 200, description = "Categories")),
)]
pub async fn list_categories(
    State(state): State<AppState>,
    uri: Uri,
    Query(params): Query<ListParams>,
) -> ApiResult<ApiResponse<Value>> {
    cached_list::<Category>(
        &state,
        &uri,
        StoreQuery::table(Table::BlogCategories),
        &params,
        &Category::LIST,
    )
    .await
}

/// GET /api/blog/tags - All tags
#[utoipa::path(
    get,
    path = "/api/blog/tags",
    tag = "Blog",
    responses((status = 200, description = "Tags")),
)]
pub async fn list_tags(
    State(state): State<AppState>,
    uri: Uri,
    Query(params): Query<ListParams>,
) -> ApiResult<ApiResponse<Value>> {
    cached_list::<Tag>(
        &state,
        &uri,
        StoreQuery::table(Table::BlogTags),
        &params,
        &Tag::LIST,
    )
    .await
}

// ============================================================================
// COMMENTS
// ============================================================================

/// GET /api/blog/{slug}/comments - Approved comments as reply trees
#[utoipa::path(
    get,
    path = "/api/blog/{slug}/comments",
    tag = "Blog",
    params(("slug" = String, Path, description = "Post slug or UUID")),
    responses(
        (status = 200, description = "Comment threads, oldest first", body = [vitrine_core::CommentNode]),
        (status = 404, description = "Post not found", body = ApiError),
    ),
)]
pub async fn list_comments(
    State(state): State<AppState>,
    uri: Uri,
    PathKey(key): PathKey,
) -> ApiResult<ApiResponse<Value>> {
    let data = state
        .cache
        .get_or_load(
            cache_key(&uri),
            &[Table::Comments, Table::BlogPosts],
            || async {
                let post = published_post(&state, &key).await?;
                let query = StoreQuery::table(Table::Comments)
                    .eq_uuid("post_id", post.id)
                    .eq_text("status", CommentStatus::Approved.as_db_str())
                    .order_by("created_at", SortOrder::Asc);
                let comments = state.db.select::<Comment>(&query).await?;
                Ok::<_, ApiError>(build_thread(comments))
            },
        )
        .await?;
    Ok(ApiResponse::ok(Value::clone(&data)))
}

// ============================================================================
// ROUTER
// ============================================================================

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/blog", get(list_posts))
        .route("/blog/categories", get(list_categories))
        .route("/blog/tags", get(list_tags))
        .route("/blog/:key", get(get_post))
        .route("/blog/:key/comments", get(list_comments))
}
