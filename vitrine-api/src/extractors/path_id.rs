//! Path extractors for row addressing.
//!
//! - [`PathKey`] turns a `{slug_or_id}` segment into a [`RowKey`]: a
//!   hyphenated UUID always addresses `id`, anything else addresses `slug`.
//! - [`PathId`] requires a UUID, for tables without slugs.

use crate::error::ApiError;
use axum::{
    async_trait,
    extract::{FromRequestParts, Path},
    http::request::Parts,
};
use uuid::Uuid;
use vitrine_core::RowKey;

/// Slug-or-id path segment.
///
/// ```rust,ignore
/// async fn update_service(PathKey(key): PathKey, ...) -> ApiResult<...> {
///     db.update::<Service>(&key, patch).await
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathKey(pub RowKey);

#[async_trait]
impl<S> FromRequestParts<S> for PathKey
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(segment): Path<String> = Path::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::invalid_input(format!("Invalid path parameter: {}", e)))?;

        if segment.trim().is_empty() {
            return Err(ApiError::invalid_format("slug_or_id", "a slug or UUID"));
        }
        Ok(PathKey(RowKey::parse(&segment)))
    }
}

/// UUID path segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathId(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for PathId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(uuid): Path<Uuid> = Path::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::invalid_format("id", "UUID"))?;
        Ok(PathId(uuid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, http::StatusCode, routing::get, Router};
    use tower::ServiceExt;

    async fn describe_key(PathKey(key): PathKey) -> String {
        format!("{}={}", key.column(), key)
    }

    async fn describe_id(PathId(id): PathId) -> String {
        id.to_string()
    }

    fn app() -> Router {
        Router::new()
            .route("/items/:key", get(describe_key))
            .route("/ids/:id", get(describe_id))
    }

    async fn get_text(uri: &str) -> Result<(StatusCode, String), String> {
        let request = Request::builder()
            .uri(uri)
            .body(Body::empty())
            .map_err(|e| e.to_string())?;
        let response = app().oneshot(request).await.map_err(|e| format!("{:?}", e))?;
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .map_err(|e| e.to_string())?;
        Ok((status, String::from_utf8_lossy(&body).into_owned()))
    }

    #[tokio::test]
    async fn test_uuid_segment_addresses_id() -> Result<(), String> {
        let id = Uuid::now_v7();
        let (status, body) = get_text(&format!("/items/{}", id)).await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, format!("id={}", id));
        Ok(())
    }

    #[tokio::test]
    async fn test_other_segment_addresses_slug() -> Result<(), String> {
        let (status, body) = get_text("/items/brand-strategy").await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "slug=brand-strategy");
        Ok(())
    }

    #[tokio::test]
    async fn test_path_id_rejects_non_uuid() -> Result<(), String> {
        let (status, body) = get_text("/ids/not-a-uuid").await?;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("INVALID_FORMAT"));
        Ok(())
    }
}
