//! Shared harness for router-level tests over the in-memory store.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use secrecy::SecretString;
use serde_json::Value;
use tower::ServiceExt;

use vitrine_api::auth::JwtSecret;
use vitrine_api::{create_app, ApiConfig, ApiResult, AppState, AuthConfig, Db, NotifyConfig};

pub const API_KEY: &str = "vk_test_admin_key";
pub const JWT_SECRET: &str = "integration-secret-that-is-long-enough";
pub const WEBHOOK_SECRET: &str = "whsec_integration";

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

pub fn auth_config() -> ApiResult<AuthConfig> {
    let mut config = AuthConfig::default();
    config.add_api_key(API_KEY.to_string());
    config.jwt_secret = JwtSecret::new(JWT_SECRET.to_string())?;
    Ok(config)
}

/// Rate limiting off, webhook secret set, no delivery channels.
pub fn test_app() -> ApiResult<TestApp> {
    test_app_with(ApiConfig {
        rate_limit_enabled: false,
        ..ApiConfig::default()
    })
}

pub fn test_app_with(config: ApiConfig) -> ApiResult<TestApp> {
    let notify = NotifyConfig {
        webhook_secret: Some(SecretString::new(WEBHOOK_SECRET.into())),
        ..NotifyConfig::default()
    };
    build(config, notify)
}

pub fn test_app_without_webhook_secret() -> ApiResult<TestApp> {
    build(
        ApiConfig {
            rate_limit_enabled: false,
            ..ApiConfig::default()
        },
        NotifyConfig::default(),
    )
}

fn build(config: ApiConfig, notify: NotifyConfig) -> ApiResult<TestApp> {
    let state = AppState::new(Db::memory(), config, auth_config()?, notify)?;
    let router = create_app(state.clone())?;
    Ok(TestApp { router, state })
}

// ============================================================================
// REQUESTS
// ============================================================================

pub fn get(uri: &str) -> Result<Request<Body>, String> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .map_err(|e| e.to_string())
}

pub fn json(method: Method, uri: &str, body: &Value) -> Result<Request<Body>, String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .map_err(|e| e.to_string())
}

/// Admin request authenticated with the test API key.
pub fn admin(method: Method, uri: &str, body: Option<&Value>) -> Result<Request<Body>, String> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("x-api-key", API_KEY);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    };
    request.map_err(|e| e.to_string())
}

/// Send `request` and decode the body as JSON (non-JSON bodies become a
/// JSON string).
pub async fn send(app: &TestApp, request: Request<Body>) -> Result<(StatusCode, Value), String> {
    let response = app
        .router
        .clone()
        .oneshot(request)
        .await
        .map_err(|e| e.to_string())?;
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .map_err(|e| e.to_string())?;
    let body = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
    Ok((status, body))
}
