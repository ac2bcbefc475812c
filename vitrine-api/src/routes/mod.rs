//! REST API Routes Module
//!
//! Assembles the axum application:
//!
//! - `/api/*` public content, blog, careers, SEO and search (cached reads)
//! - `/api/*` form intake and analytics tracking (rate-limited per IP)
//! - `/api/webhooks/incoming` signed inbound events
//! - `/api/admin/*` content management (API key or admin JWT)
//! - `/health/*`, `/metrics`, `/openapi.json` and `/swagger-ui` (no auth)

pub mod admin;
pub mod blog;
pub mod careers;
pub mod common;
pub mod content;
pub mod forms;
pub mod generic;
pub mod health;
pub mod site;
pub mod webhooks;

use std::any::Any;
use std::time::Duration;

use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, Any as AnyOrigin, CorsLayer};
use utoipa::OpenApi;

use crate::config::ApiConfig;
use crate::error::{ApiError, ApiResult};
use crate::middleware::{
    auth_middleware, rate_limit_middleware, AuthMiddlewareState, RateLimitState,
};
use crate::openapi::ApiDoc;
use crate::state::AppState;
use crate::telemetry::{metrics_handler, observability_middleware};

pub use admin::create_router as admin_router;
pub use forms::create_router as forms_router;
pub use health::create_router as health_router;

// ============================================================================
// OPENAPI ENDPOINT
// ============================================================================

/// GET /openapi.json - The OpenAPI document
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

// ============================================================================
// PRODUCTION VALIDATION
// ============================================================================

/// Refuse to serve a production deployment with an open CORS policy.
pub fn validate_api_config_for_production(config: &ApiConfig) -> ApiResult<()> {
    if !config.is_production() {
        return Ok(());
    }

    if config.cors_origins.is_empty() {
        return Err(ApiError::invalid_input(
            "VITRINE_CORS_ORIGINS must be set in production",
        ));
    }

    if !config.rate_limit_enabled {
        tracing::warn!("Rate limiting is disabled in production; form routes are unprotected");
    }

    Ok(())
}

// ============================================================================
// APPLICATION
// ============================================================================

/// The `/api` router: public reads, rate-limited intake, inbound webhooks and
/// the authenticated admin section.
fn api_routes(state: &AppState) -> Router<AppState> {
    let intake = forms::create_router().layer(from_fn_with_state(
        RateLimitState::new(state.config.clone()),
        rate_limit_middleware,
    ));

    let admin = admin::create_router().layer(from_fn_with_state(
        AuthMiddlewareState::new(state.auth.clone()),
        auth_middleware,
    ));

    Router::new()
        .merge(content::create_router())
        .merge(blog::create_router())
        .merge(careers::create_router())
        .merge(site::create_router())
        .merge(intake)
        .merge(webhooks::create_router())
        .nest("/admin", admin)
}

/// Build the complete application.
///
/// # Middleware Order (outer to inner)
/// 1. Panic catching - a panicking handler becomes a 500 envelope
/// 2. CORS - handles preflight requests
/// 3. Compression
/// 4. Observability - request span, access log and metrics
/// 5. Rate limiting and auth, on their route groups only
///
/// In production the auth and CORS configuration are validated first and
/// an insecure setup is refused.
pub fn create_app(state: AppState) -> ApiResult<Router> {
    let production = state.config.is_production();
    state.auth.validate_for_production(production)?;
    validate_api_config_for_production(&state.config)?;

    let router = Router::new()
        .nest("/api", api_routes(&state))
        .nest("/health", health::create_router())
        .route("/metrics", get(metrics_handler))
        .route("/openapi.json", get(openapi_json));

    // The UI registers its own document route, which must not overlap /openapi.json.
    #[cfg(feature = "swagger-ui")]
    let router = router.merge(
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
            .url("/api-docs/openapi.json", ApiDoc::openapi()),
    );

    let cors = build_cors_layer(&state.config);

    Ok(router
        .with_state(state)
        .layer(from_fn(observability_middleware))
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(CatchPanicLayer::custom(panic_response)))
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(panic = %detail, "Handler panicked");
    ApiError::internal_error("Internal server error").into_response()
}

// ============================================================================
// CORS LAYER
// ============================================================================

/// Build the CORS layer from ApiConfig.
///
/// With no configured origins every origin is allowed (development). Otherwise
/// origins are matched by [`ApiConfig::is_origin_allowed`], which also accepts
/// `*.example.com` wildcard entries.
fn build_cors_layer(config: &ApiConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .expose_headers([
            HeaderName::from_static("x-ratelimit-limit"),
            HeaderName::from_static("retry-after"),
        ])
        .max_age(Duration::from_secs(config.cors_max_age_secs));

    if config.cors_origins.is_empty() {
        tracing::info!("CORS: development mode, allowing all origins");
        return cors.allow_origin(AnyOrigin).allow_headers(AnyOrigin);
    }

    tracing::info!(origins = ?config.cors_origins, "CORS: restricting origins");
    let allowed = config.clone();
    let cors = cors
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT,
            HeaderName::from_static("x-api-key"),
            HeaderName::from_static("x-session-id"),
            HeaderName::from_static("x-webhook-signature"),
        ])
        .allow_origin(AllowOrigin::predicate(move |origin: &HeaderValue, _| {
            origin
                .to_str()
                .map(|o| allowed.is_origin_allowed(o))
                .unwrap_or(false)
        }));

    if config.cors_allow_credentials {
        cors.allow_credentials(true)
    } else {
        cors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_production_requires_cors_origins() {
        let config = ApiConfig {
            environment: "production".to_string(),
            ..ApiConfig::default()
        };
        assert!(validate_api_config_for_production(&config).is_err());

        let config = ApiConfig {
            cors_origins: vec!["https://vitrine.example".to_string()],
            ..config
        };
        assert!(validate_api_config_for_production(&config).is_ok());
    }

    #[test]
    fn test_development_allows_open_cors() {
        assert!(validate_api_config_for_production(&ApiConfig::default()).is_ok());
    }

    #[test]
    fn test_app_builds_over_memory_store() -> ApiResult<()> {
        let _app = create_app(crate::state::test_state())?;
        Ok(())
    }
}
