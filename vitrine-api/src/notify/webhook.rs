//! Signed webhook envelopes
//!
//! Outbound deliveries carry `X-Webhook-Signature: sha256=<hex>`, the
//! lowercase hex HMAC-SHA256 of the exact body bytes under the shared secret.
//! Inbound events are verified the same way.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::Sha256;
use std::fmt;
use std::str::FromStr;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "X-Webhook-Signature";
pub const EVENT_HEADER: &str = "X-Webhook-Event";
pub const TIMESTAMP_HEADER: &str = "X-Webhook-Timestamp";
pub const USER_AGENT: &str = "Vitrine-Webhook/1.0";

// ============================================================================
// EVENTS
// ============================================================================

/// Every event name the site emits or accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum EventName {
    #[serde(rename = "contact.submitted")]
    ContactSubmitted,
    #[serde(rename = "newsletter.subscribed")]
    NewsletterSubscribed,
    #[serde(rename = "newsletter.unsubscribed")]
    NewsletterUnsubscribed,
    #[serde(rename = "consultation.requested")]
    ConsultationRequested,
    #[serde(rename = "application.submitted")]
    ApplicationSubmitted,
    #[serde(rename = "comment.created")]
    CommentCreated,
    #[serde(rename = "content.published")]
    ContentPublished,
    #[serde(rename = "content.updated")]
    ContentUpdated,
    #[serde(rename = "content.deleted")]
    ContentDeleted,
}

impl EventName {
    pub const ALL: &'static [EventName] = &[
        EventName::ContactSubmitted,
        EventName::NewsletterSubscribed,
        EventName::NewsletterUnsubscribed,
        EventName::ConsultationRequested,
        EventName::ApplicationSubmitted,
        EventName::CommentCreated,
        EventName::ContentPublished,
        EventName::ContentUpdated,
        EventName::ContentDeleted,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventName::ContactSubmitted => "contact.submitted",
            EventName::NewsletterSubscribed => "newsletter.subscribed",
            EventName::NewsletterUnsubscribed => "newsletter.unsubscribed",
            EventName::ConsultationRequested => "consultation.requested",
            EventName::ApplicationSubmitted => "application.submitted",
            EventName::CommentCreated => "comment.created",
            EventName::ContentPublished => "content.published",
            EventName::ContentUpdated => "content.updated",
            EventName::ContentDeleted => "content.deleted",
        }
    }

    /// Events that change what public pages show.
    pub fn is_content_change(&self) -> bool {
        matches!(
            self,
            EventName::ContentPublished | EventName::ContentUpdated | EventName::ContentDeleted
        )
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The name is not one of [`EventName::ALL`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown event type: {0}")]
pub struct UnknownEvent(pub String);

impl FromStr for EventName {
    type Err = UnknownEvent;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventName::ALL
            .iter()
            .copied()
            .find(|event| event.as_str() == s)
            .ok_or_else(|| UnknownEvent(s.to_string()))
    }
}

/// Envelope POSTed to every generic webhook endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct WebhookEvent {
    pub event: EventName,
    pub timestamp: DateTime<Utc>,
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub payload: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<Object>))]
    pub metadata: Option<Value>,
}

impl WebhookEvent {
    pub fn new(event: EventName, payload: Value) -> Self {
        Self {
            event,
            timestamp: Utc::now(),
            payload,
            metadata: None,
        }
    }
}

// ============================================================================
// SIGNING
// ============================================================================

/// Lowercase hex HMAC-SHA256 of `body`.
pub fn sign(body: &[u8], secret: &str) -> Result<String, hmac::digest::InvalidLength> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())?;
    mac.update(body);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Check `signature` (bare hex or `sha256=<hex>`) against `body`.
///
/// The digest comparison is constant time. Empty, truncated, altered and
/// non-hex signatures all return `false`.
pub fn verify(body: &[u8], signature: &str, secret: &str) -> bool {
    let signature = signature.trim();
    let hex_digest = signature.strip_prefix("sha256=").unwrap_or(signature);
    if hex_digest.is_empty() {
        return false;
    }

    let Ok(expected) = hex::decode(hex_digest) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

// ============================================================================
// DELIVERY
// ============================================================================

/// POST one signed envelope. Single attempt; non-2xx counts as failure.
pub async fn deliver(
    client: &reqwest::Client,
    url: &str,
    event: &WebhookEvent,
    secret: &str,
) -> Result<(), String> {
    let body = serde_json::to_vec(event).map_err(|e| format!("serialize: {}", e))?;
    let signature = sign(&body, secret).map_err(|e| format!("sign: {}", e))?;

    let response = client
        .post(url)
        .header("Content-Type", "application/json")
        .header(SIGNATURE_HEADER, format!("sha256={}", signature))
        .header(EVENT_HEADER, event.event.as_str())
        .header(TIMESTAMP_HEADER, event.timestamp.to_rfc3339())
        .header("User-Agent", USER_AGENT)
        .body(body)
        .send()
        .await
        .map_err(|e| format!("webhook {}: {}", url, e))?;

    if response.status().is_success() {
        Ok(())
    } else {
        Err(format!("webhook {}: status {}", url, response.status()))
    }
}
