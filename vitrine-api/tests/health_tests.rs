//! Probes and operational endpoints.

mod support;

use axum::http::StatusCode;
use serde_json::Value;
use support::{get, send, test_app};

#[tokio::test]
async fn readiness_reports_the_store_backend() -> Result<(), String> {
    let app = test_app().map_err(|e| e.to_string())?;

    let (status, body) = send(&app, get("/health/ready")?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["details"]["store"]["backend"], "memory");
    assert_eq!(body["details"]["cached_responses"], 0);
    Ok(())
}

#[tokio::test]
async fn ping_and_liveness_answer() -> Result<(), String> {
    let app = test_app().map_err(|e| e.to_string())?;

    let (status, body) = send(&app, get("/health/ping")?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("pong".to_string()));

    let (status, body) = send(&app, get("/health/live")?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    Ok(())
}

#[tokio::test]
async fn metrics_are_exposed_in_text_format() -> Result<(), String> {
    let app = test_app().map_err(|e| e.to_string())?;
    send(&app, get("/api/services")?).await?;

    let (status, body) = send(&app, get("/metrics")?).await?;
    assert_eq!(status, StatusCode::OK);
    let text = body.as_str().ok_or("metrics body is not text")?;
    assert!(text.contains("vitrine_"), "unexpected metrics output");
    Ok(())
}

#[tokio::test]
async fn openapi_document_is_served() -> Result<(), String> {
    let app = test_app().map_err(|e| e.to_string())?;

    let (status, body) = send(&app, get("/openapi.json")?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["info"]["title"], "Vitrine API");
    assert!(body["paths"]["/api/contact"].is_object());
    Ok(())
}

#[tokio::test]
async fn unknown_routes_are_not_found() -> Result<(), String> {
    let app = test_app().map_err(|e| e.to_string())?;
    let (status, _) = send(&app, get("/api/nothing-here")?).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[cfg(feature = "swagger-ui")]
#[tokio::test]
async fn swagger_ui_serves_its_own_document() -> Result<(), String> {
    let app = test_app().map_err(|e| e.to_string())?;

    let (status, body) = send(&app, get("/api-docs/openapi.json")?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["info"]["title"], "Vitrine API");
    Ok(())
}
