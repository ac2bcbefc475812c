//! Helpers shared by the public, form and admin handlers.

use axum::http::{HeaderMap, Uri};
use serde::Serialize;
use serde_json::{Map, Value};
use vitrine_core::{
    apply_list_params, HasUpdates, ListConfig, ListParams, PublishStatus, Query, Record, RowKey,
    Table,
};

use crate::envelope::{ApiResponse, ListData};
use crate::error::{ApiError, ApiResult};
use crate::notify::{EventName, NotificationJob};
use crate::state::AppState;

/// Cache key of a public GET: path plus raw query string.
pub(crate) fn cache_key(uri: &Uri) -> String {
    uri.path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string())
}

/// Rows visible on the public site.
pub(crate) fn published(table: Table) -> Query {
    Query::table(table).eq_text("status", PublishStatus::Published.as_db_str())
}

pub(crate) fn active(table: Table) -> Query {
    Query::table(table).eq_bool("is_active", true)
}

/// Translate `params` against `config`, list `R` rows and cache the page.
pub(crate) async fn cached_list<R: Record>(
    state: &AppState,
    uri: &Uri,
    base: Query,
    params: &ListParams,
    config: &ListConfig,
) -> ApiResult<ApiResponse<Value>> {
    let plan = apply_list_params(base, params, config);
    let data = state
        .cache
        .get_or_load(cache_key(uri), &[R::TABLE], || async {
            Ok::<_, ApiError>(ListData::from(state.db.list::<R>(&plan).await?))
        })
        .await?;
    Ok(ApiResponse::ok(Value::clone(&data)))
}

/// Fetch one `R` by slug-or-id within `scope` and cache it; 404 when absent.
pub(crate) async fn cached_get<R: Record>(
    state: &AppState,
    uri: &Uri,
    scope: Query,
    key: &RowKey,
) -> ApiResult<ApiResponse<Value>> {
    let data = state
        .cache
        .get_or_load(cache_key(uri), &[R::TABLE], || async {
            state
                .db
                .get_where::<R>(key, scope)
                .await?
                .ok_or_else(|| ApiError::entity_not_found(R::ENTITY_NAME, key))
        })
        .await?;
    Ok(ApiResponse::ok(Value::clone(&data)))
}

/// Uncached list for admin views; drafts and inactive rows included.
pub(crate) async fn admin_list<R: Record + Serialize>(
    state: &AppState,
    params: &ListParams,
    config: &ListConfig,
) -> ApiResult<ApiResponse<ListData<R>>> {
    let plan = apply_list_params(Query::table(R::TABLE), params, config);
    Ok(ApiResponse::ok(state.db.list::<R>(&plan).await?.into()))
}

/// Column patch of an update request; 400 when it names no fields.
pub(crate) fn require_updates<T: HasUpdates>(req: &T) -> ApiResult<Map<String, Value>> {
    let patch = req.to_patch();
    if patch.is_empty() {
        return Err(ApiError::invalid_input("No fields to update"));
    }
    Ok(patch)
}

/// Apply `patch` to the row behind `key`; 404 when nothing matched.
pub(crate) async fn update_row<R: Record>(
    state: &AppState,
    key: &RowKey,
    patch: Map<String, Value>,
) -> ApiResult<R> {
    state
        .db
        .update::<R>(key, patch)
        .await?
        .ok_or_else(|| ApiError::entity_not_found(R::ENTITY_NAME, key))
}

/// Delete the row behind `key`; 404 when nothing matched.
pub(crate) async fn delete_row<R: Record>(state: &AppState, key: &RowKey) -> ApiResult<()> {
    if state.db.delete::<R>(key).await? {
        Ok(())
    } else {
        Err(ApiError::entity_not_found(R::ENTITY_NAME, key))
    }
}

/// Drop cached responses and announce a content change to webhooks.
pub(crate) fn content_changed(
    state: &AppState,
    event: EventName,
    table: Table,
    id: uuid::Uuid,
    slug: Option<&str>,
) {
    state.cache.invalidate(table);
    state
        .notifier
        .spawn(NotificationJob::content_changed(event, table, id, slug));
}

/// First non-empty value of a request header.
pub(crate) fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Random URL-safe token for newsletter unsubscribe links.
pub(crate) fn unsubscribe_token() -> String {
    let bytes: [u8; 24] = rand::random();
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_includes_query() {
        let uri: Uri = "/api/services?featured=true&page=2".parse().unwrap_or_default();
        assert_eq!(cache_key(&uri), "/api/services?featured=true&page=2");
        let bare: Uri = "/api/team".parse().unwrap_or_default();
        assert_eq!(cache_key(&bare), "/api/team");
    }

    #[test]
    fn test_require_updates_rejects_empty_patch() {
        let empty = vitrine_core::UpdateServiceRequest::default();
        assert!(require_updates(&empty).is_err());

        let title = vitrine_core::UpdateServiceRequest {
            title: Some("Brand strategy".to_string()),
            ..Default::default()
        };
        assert_eq!(require_updates(&title).map(|p| p.len()).unwrap_or(0), 1);
    }

    #[test]
    fn test_unsubscribe_tokens_are_unique_hex() {
        let a = unsubscribe_token();
        let b = unsubscribe_token();
        assert_eq!(a.len(), 48);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }
}
