//! Axum middleware for admin authentication
//!
//! `auth_middleware` authenticates with an API key or Bearer JWT, requires an
//! admin role, and injects the resulting [`AuthContext`] into request
//! extensions. Missing or bad credentials yield 401; a valid identity without
//! an admin role yields 403.

use crate::auth::{authenticate, require_admin, AuthConfig, AuthContext};
use crate::error::{ApiError, ApiResult};
use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

// ============================================================================
// MIDDLEWARE STATE
// ============================================================================

#[derive(Debug, Clone)]
pub struct AuthMiddlewareState {
    pub auth_config: Arc<AuthConfig>,
}

impl AuthMiddlewareState {
    pub fn new(auth_config: Arc<AuthConfig>) -> Self {
        Self { auth_config }
    }
}

// ============================================================================
// MIDDLEWARE FUNCTION
// ============================================================================

/// Authenticate the caller and require an admin role.
///
/// ```ignore
/// let admin = Router::new()
///     .route("/api/admin/services", get(list_services))
///     .layer(middleware::from_fn_with_state(auth_state, auth_middleware));
/// ```
pub async fn auth_middleware(
    State(state): State<AuthMiddlewareState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthMiddlewareError> {
    let api_key_header = request
        .headers()
        .get("x-api-key")
        .and_then(|h| h.to_str().ok());

    let auth_header = request
        .headers()
        .get("authorization")
        .and_then(|h| h.to_str().ok());

    let auth_context = authenticate(&state.auth_config, api_key_header, auth_header)
        .map_err(AuthMiddlewareError)?;

    if let Err(err) = require_admin(&state.auth_config, &auth_context) {
        tracing::info!(
            user_id = %auth_context.user_id,
            roles = ?auth_context.roles,
            "Rejected caller without admin role"
        );
        return Err(AuthMiddlewareError(err));
    }

    request.extensions_mut().insert(auth_context);
    Ok(next.run(request).await)
}

// ============================================================================
// ERROR HANDLING
// ============================================================================

/// Middleware rejection rendered through the standard error envelope.
#[derive(Debug)]
pub struct AuthMiddlewareError(pub ApiError);

impl IntoResponse for AuthMiddlewareError {
    fn into_response(self) -> Response {
        self.0.into_response()
    }
}

// ============================================================================
// TYPED EXTRACTOR
// ============================================================================

/// The authenticated admin for the current request.
///
/// `auth_middleware` must run on the route; without it extraction fails with
/// a 500.
#[derive(Debug, Clone)]
pub struct AuthExtractor(pub AuthContext);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthExtractor
where
    S: Send + Sync,
{
    type Rejection = AuthMiddlewareError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .map(AuthExtractor)
            .ok_or_else(|| {
                AuthMiddlewareError(ApiError::internal_error(
                    "AuthContext not found in request extensions. \
                     Ensure auth_middleware is applied to this route.",
                ))
            })
    }
}

impl std::ops::Deref for AuthExtractor {
    type Target = AuthContext;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

pub fn extract_auth_context(request: &Request) -> ApiResult<&AuthContext> {
    request
        .extensions()
        .get::<AuthContext>()
        .ok_or_else(|| ApiError::unauthorized("Auth context missing from request"))
}

// ============================================================================
// TESTS
// ============================================================================
