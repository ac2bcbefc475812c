//! Inbound webhook endpoint.
//!
//! Accepts the same signed envelope the notifier sends out, so a CMS or a
//! second deployment can tell this site that content changed.

use axum::{body::Bytes, extract::State, http::HeaderMap, routing::post, Router};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::envelope::ApiResponse;
use crate::error::{ApiError, ApiResult};
use crate::notify::{verify, EventName, WebhookEvent};
use crate::state::AppState;

use super::common::header_value;

const SIGNATURE_HEADER: &str = "x-webhook-signature";

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct WebhookReceived {
    pub received: bool,
    pub event: EventName,
}

/// POST /api/webhooks/incoming - Receive a signed event
#[utoipa::path(
    post,
    path = "/api/webhooks/incoming",
    tag = "Webhooks",
    request_body = WebhookEvent,
    params(("X-Webhook-Signature" = String, Header, description = "sha256=<hex HMAC-SHA256 of the body>")),
    responses(
        (status = 200, description = "Event accepted", body = WebhookReceived),
        (status = 400, description = "Malformed body or unknown event", body = ApiError),
        (status = 401, description = "Missing or invalid signature", body = ApiError),
    ),
)]
pub async fn receive_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<ApiResponse<WebhookReceived>> {
    let secret = state
        .notifier
        .config()
        .webhook_secret()
        .ok_or_else(|| ApiError::unauthorized("Webhook secret is not configured"))?;
    let signature = header_value(&headers, SIGNATURE_HEADER)
        .ok_or_else(|| ApiError::unauthorized("Missing webhook signature"))?;
    if !verify(&body, &signature, secret) {
        return Err(ApiError::invalid_signature());
    }

    let event = parse_event(&body)?;
    tracing::info!(event = %event.event, "Received webhook");

    if event.event.is_content_change() {
        let cleared = state.cache.clear();
        tracing::info!(event = %event.event, cleared, "Response cache cleared by webhook");
    }

    Ok(ApiResponse::ok(WebhookReceived {
        received: true,
        event: event.event,
    }))
}

/// Decode an envelope, reporting unknown event names separately from
/// malformed bodies.
fn parse_event(body: &[u8]) -> ApiResult<WebhookEvent> {
    let raw: Value = serde_json::from_slice(body)
        .map_err(|e| ApiError::invalid_input(format!("Invalid webhook payload: {}", e)))?;
    let name = raw
        .get("event")
        .and_then(Value::as_str)
        .ok_or_else(|| ApiError::field("event", "Event name is required"))?;
    if let Err(unknown) = name.parse::<EventName>() {
        return Err(ApiError::unknown_event(&unknown.0));
    }
    serde_json::from_value(raw)
        .map_err(|e| ApiError::invalid_input(format!("Invalid webhook payload: {}", e)))
}

pub fn create_router() -> Router<AppState> {
    Router::new().route("/webhooks/incoming", post(receive_webhook))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_event_accepts_known_names() -> ApiResult<()> {
        let body = json!({
            "event": "content.published",
            "timestamp": "2026-03-01T12:00:00Z",
            "payload": { "table": "blog_posts" }
        });
        let event = parse_event(body.to_string().as_bytes())?;
        assert_eq!(event.event, EventName::ContentPublished);
        Ok(())
    }

    #[test]
    fn test_parse_event_rejects_unknown_names() {
        let body = json!({
            "event": "order.shipped",
            "timestamp": "2026-03-01T12:00:00Z",
            "payload": {}
        });
        let err = parse_event(body.to_string().as_bytes()).err();
        assert_eq!(
            err.map(|e| e.code),
            Some(crate::error::ErrorCode::UnknownEvent)
        );
    }

    #[test]
    fn test_parse_event_rejects_garbage() {
        let err = parse_event(b"not json").err();
        assert_eq!(
            err.map(|e| e.code),
            Some(crate::error::ErrorCode::InvalidInput)
        );
    }
}
