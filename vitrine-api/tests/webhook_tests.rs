//! Signed inbound webhooks.

mod support;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use serde_json::{json, Value};
use support::{get, send, test_app, test_app_without_webhook_secret, WEBHOOK_SECRET};
use vitrine_api::notify::sign;
use vitrine_test_utils::assertions::{assert_error_code, assert_success};

fn event_body(event: &str) -> Vec<u8> {
    json!({
        "event": event,
        "timestamp": "2026-01-01T00:00:00Z",
        "payload": { "table": "services", "slug": "web-design" }
    })
    .to_string()
    .into_bytes()
}

fn signed(body: Vec<u8>, signature: Option<String>) -> Result<Request<Body>, String> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri("/api/webhooks/incoming")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(signature) = signature {
        builder = builder.header("x-webhook-signature", signature);
    }
    builder.body(Body::from(body)).map_err(|e| e.to_string())
}

fn signature_for(body: &[u8]) -> Result<String, String> {
    sign(body, WEBHOOK_SECRET)
        .map(|hex| format!("sha256={}", hex))
        .map_err(|e| e.to_string())
}

#[tokio::test]
async fn content_event_clears_the_cache() -> Result<(), String> {
    let app = test_app().map_err(|e| e.to_string())?;
    send(&app, get("/api/services")?).await?;
    assert_eq!(app.state.cache.len(), 1);

    let body = event_body("content.published");
    let signature = signature_for(&body)?;
    let (status, response) = send(&app, signed(body, Some(signature))?).await?;

    assert_eq!(status, StatusCode::OK);
    let data = assert_success(&response);
    assert_eq!(data["received"], Value::Bool(true));
    assert_eq!(data["event"], "content.published");
    assert_eq!(app.state.cache.len(), 0);
    Ok(())
}

#[tokio::test]
async fn bare_hex_signature_is_accepted() -> Result<(), String> {
    let app = test_app().map_err(|e| e.to_string())?;
    let body = event_body("contact.submitted");
    let hex = sign(&body, WEBHOOK_SECRET).map_err(|e| e.to_string())?;

    let (status, _) = send(&app, signed(body, Some(hex))?).await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn missing_signature_is_unauthorized() -> Result<(), String> {
    let app = test_app().map_err(|e| e.to_string())?;

    let (status, body) = send(&app, signed(event_body("content.updated"), None)?).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_error_code(&body, "UNAUTHORIZED");
    Ok(())
}

#[tokio::test]
async fn wrong_signature_is_rejected() -> Result<(), String> {
    let app = test_app().map_err(|e| e.to_string())?;
    let body = event_body("content.updated");
    let forged = format!("sha256={}", "0".repeat(64));

    let (status, body) = send(&app, signed(body, Some(forged))?).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_error_code(&body, "INVALID_SIGNATURE");
    Ok(())
}

#[tokio::test]
async fn tampered_body_fails_verification() -> Result<(), String> {
    let app = test_app().map_err(|e| e.to_string())?;
    let signature = signature_for(&event_body("content.updated"))?;

    let (status, _) = send(&app, signed(event_body("content.deleted"), Some(signature))?).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn unknown_event_is_reported() -> Result<(), String> {
    let app = test_app().map_err(|e| e.to_string())?;
    let body = event_body("content.exploded");
    let signature = signature_for(&body)?;

    let (status, body) = send(&app, signed(body, Some(signature))?).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error_code(&body, "UNKNOWN_EVENT");
    Ok(())
}

#[tokio::test]
async fn webhooks_are_refused_without_a_secret() -> Result<(), String> {
    let app = test_app_without_webhook_secret().map_err(|e| e.to_string())?;
    let body = event_body("content.published");
    let signature = signature_for(&body)?;

    let (status, _) = send(&app, signed(body, Some(signature))?).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}
