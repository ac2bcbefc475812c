//! Generic admin CRUD handlers for [`Component`] types.
//!
//! Every content section of the admin API (services, case studies, blog
//! posts, testimonials, team, careers) is mounted with [`crud_routes`]:
//!
//! ```ignore
//! Router::new().nest("/services", crud_routes::<Service>())
//! ```
//!
//! Writes drop the cached public responses of the component's table and
//! announce the change on the outbound webhook.

use axum::{
    extract::{Query, State},
    routing::get,
    Router,
};
use serde_json::Value;
use vitrine_core::{ListParams, RowKey};

use crate::component::Component;
use crate::envelope::{ApiResponse, Deleted, ListData};
use crate::error::{ApiError, ApiResult};
use crate::extractors::{PathKey, ValidatedJson};
use crate::notify::EventName;
use crate::state::AppState;

use super::common::{admin_list, content_changed, require_updates, update_row};

// ============================================================================
// GENERIC HANDLER HELPERS
// ============================================================================

/// Insert a new component row. Live rows announce `content.published`.
///
/// A taken slug is a 409 before the insert is attempted; the store's unique
/// constraint still covers concurrent creates.
pub async fn create_handler<C: Component>(
    state: &AppState,
    req: C::Create,
) -> ApiResult<ApiResponse<C>> {
    let row = C::build(req, vitrine_core::now());
    if let Some(slug) = row.slug() {
        let key = RowKey::Slug(slug.to_string());
        if state.db.get::<C>(&key).await?.is_some() {
            return Err(ApiError::entity_already_exists(C::ENTITY_NAME, slug));
        }
    }
    let row = state.db.insert(&row).await?;
    let event = if row.is_live() {
        EventName::ContentPublished
    } else {
        EventName::ContentUpdated
    };
    tracing::info!(table = %C::TABLE, id = %row.entity_id(), "Content created");
    content_changed(state, event, C::TABLE, row.entity_id(), row.slug());
    Ok(ApiResponse::created(row))
}

/// Any row regardless of status; 404 when absent.
pub async fn get_handler<C: Component>(state: &AppState, key: &RowKey) -> ApiResult<C> {
    state.db.require::<C>(key).await
}

/// Apply the fields present in `req`.
///
/// Publishing a dated component without a `published_at` stamps it with the
/// current time. A row going live announces `content.published`.
pub async fn update_handler<C: Component>(
    state: &AppState,
    key: &RowKey,
    req: C::Update,
) -> ApiResult<C> {
    let mut patch = require_updates(&req)?;
    let existing = state.db.require::<C>(key).await?;

    let publishing = patch.get("status").and_then(Value::as_str) == Some("published");
    if C::STAMPS_PUBLICATION
        && publishing
        && existing.published_at().is_none()
        && !patch.contains_key("published_at")
    {
        patch.insert(
            "published_at".to_string(),
            serde_json::to_value(vitrine_core::now())?,
        );
    }

    let updated = update_row::<C>(state, &RowKey::Id(existing.entity_id()), patch).await?;
    let event = if updated.is_live() && !existing.is_live() {
        EventName::ContentPublished
    } else {
        EventName::ContentUpdated
    };
    tracing::info!(table = %C::TABLE, id = %updated.entity_id(), "Content updated");
    content_changed(state, event, C::TABLE, updated.entity_id(), updated.slug());
    Ok(updated)
}

pub async fn delete_handler<C: Component>(state: &AppState, key: &RowKey) -> ApiResult<Deleted> {
    let existing = state.db.require::<C>(key).await?;
    let id = existing.entity_id();
    if !state.db.delete::<C>(&RowKey::Id(id)).await? {
        // Raced with another delete.
        return Ok(Deleted { deleted: false });
    }
    tracing::info!(table = %C::TABLE, %id, "Content deleted");
    content_changed(state, EventName::ContentDeleted, C::TABLE, id, existing.slug());
    Ok(Deleted { deleted: true })
}

// ============================================================================
// CRUD ROUTER FACTORY
// ============================================================================

/// Admin routes for one component type.
///
/// # Routes Created
///
/// - `GET /` - List rows, drafts included
/// - `POST /` - Create a row
/// - `GET /:key` - Get a row by slug or UUID
/// - `PUT /:key` - Update a row
/// - `DELETE /:key` - Delete a row
pub fn crud_routes<C: Component>() -> Router<AppState> {
    Router::new()
        .route("/", get(list_route::<C>).post(create_route::<C>))
        .route(
            "/:key",
            get(get_route::<C>)
                .put(update_route::<C>)
                .delete(delete_route::<C>),
        )
}

async fn list_route<C: Component>(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<ApiResponse<ListData<C>>> {
    admin_list::<C>(&state, &params, &C::ADMIN).await
}

async fn create_route<C: Component>(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<C::Create>,
) -> ApiResult<ApiResponse<C>> {
    create_handler::<C>(&state, req).await
}

async fn get_route<C: Component>(
    State(state): State<AppState>,
    PathKey(key): PathKey,
) -> ApiResult<ApiResponse<C>> {
    Ok(ApiResponse::ok(get_handler::<C>(&state, &key).await?))
}

async fn update_route<C: Component>(
    State(state): State<AppState>,
    PathKey(key): PathKey,
    ValidatedJson(req): ValidatedJson<C::Update>,
) -> ApiResult<ApiResponse<C>> {
    Ok(ApiResponse::ok(update_handler::<C>(&state, &key, req).await?))
}

async fn delete_route<C: Component>(
    State(state): State<AppState>,
    PathKey(key): PathKey,
) -> ApiResult<ApiResponse<Deleted>> {
    Ok(ApiResponse::ok(delete_handler::<C>(&state, &key).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use vitrine_core::{BlogPost, PublishStatus, Service, UpdateBlogPostRequest, UpdateServiceRequest};
    use vitrine_test_utils::fixtures;

    fn state() -> AppState {
        crate::state::test_state()
    }

    #[tokio::test]
    async fn test_publishing_post_stamps_published_at() -> ApiResult<()> {
        let state = state();
        let mut draft = fixtures::published_post("Launch Notes");
        draft.status = PublishStatus::Draft;
        draft.published_at = None;
        let draft = state.db.insert(&draft).await?;

        let req = UpdateBlogPostRequest {
            status: Some(PublishStatus::Published),
            ..Default::default()
        };
        let updated =
            update_handler::<BlogPost>(&state, &RowKey::Slug(draft.slug.clone()), req).await?;

        assert_eq!(updated.id, draft.id);
        assert_eq!(updated.status, PublishStatus::Published);
        assert!(updated.published_at.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn test_empty_update_is_rejected() -> ApiResult<()> {
        let state = state();
        let service = state.db.insert(&fixtures::service("Audit", false)).await?;

        let result = update_handler::<Service>(
            &state,
            &RowKey::Id(service.id),
            UpdateServiceRequest::default(),
        )
        .await;
        let err = result.err().ok_or_else(|| ApiError::internal_error("update accepted"))?;
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_missing_row_is_not_found() -> ApiResult<()> {
        let state = state();
        let result =
            delete_handler::<Service>(&state, &RowKey::Slug("no-such-service".into())).await;
        let err = result.err().ok_or_else(|| ApiError::internal_error("delete succeeded"))?;
        assert_eq!(err.status_code(), axum::http::StatusCode::NOT_FOUND);
        Ok(())
    }
}
