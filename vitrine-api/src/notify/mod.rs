//! Outbound notifications
//!
//! After a form row is stored, handlers build a [`NotificationJob`] and hand
//! it to [`Notifier::spawn`]. Every configured channel is attempted once,
//! concurrently, in a detached task. Failures are logged and collected in the
//! returned [`DispatchReport`]; they never reach the HTTP response.

mod chat;
mod email;
mod jobs;
pub mod templates;
pub mod webhook;

pub use chat::ChatMessage;
pub use email::{EmailConfig, EmailMessage, DEFAULT_EMAIL_API_URL};
pub use webhook::{sign, verify, EventName, UnknownEvent, WebhookEvent};

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::{join_all, BoxFuture, FutureExt};
use secrecy::{ExposeSecret, SecretString};
use tokio::task::JoinHandle;

use crate::config::split_list;
use crate::error::{ApiError, ApiResult};
use crate::telemetry::with_metrics;

// ============================================================================
// CONFIGURATION
// ============================================================================

#[derive(Clone)]
pub struct NotifyConfig {
    pub slack_webhook_url: Option<String>,
    pub discord_webhook_url: Option<String>,
    /// Generic endpoints receiving signed [`WebhookEvent`] envelopes.
    pub webhook_urls: Vec<String>,
    pub webhook_secret: Option<SecretString>,
    pub email: Option<EmailConfig>,
    /// Recipient of contact, consultation and comment notices.
    pub admin_email: Option<String>,
    /// Recipient of job applications; falls back to `admin_email`.
    pub hr_email: Option<String>,
    pub site_url: String,
    pub timeout: Duration,
}

impl std::fmt::Debug for NotifyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifyConfig")
            .field("slack_webhook_url", &self.slack_webhook_url.as_ref().map(|_| "[SET]"))
            .field("discord_webhook_url", &self.discord_webhook_url.as_ref().map(|_| "[SET]"))
            .field("webhook_urls", &self.webhook_urls.len())
            .field("webhook_secret", &self.webhook_secret.as_ref().map(|_| "[REDACTED]"))
            .field("email", &self.email)
            .field("admin_email", &self.admin_email)
            .field("hr_email", &self.hr_email)
            .field("site_url", &self.site_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            slack_webhook_url: None,
            discord_webhook_url: None,
            webhook_urls: Vec::new(),
            webhook_secret: None,
            email: None,
            admin_email: None,
            hr_email: None,
            site_url: "http://localhost:3000".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl NotifyConfig {
    /// Read channel configuration from the environment.
    ///
    /// Email is enabled only when `VITRINE_EMAIL_API_KEY` and
    /// `VITRINE_EMAIL_FROM` are both set.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let email = match (env_opt("VITRINE_EMAIL_API_KEY"), env_opt("VITRINE_EMAIL_FROM")) {
            (Some(api_key), Some(from)) => Some(EmailConfig {
                api_url: env_opt("VITRINE_EMAIL_API_URL")
                    .unwrap_or_else(|| DEFAULT_EMAIL_API_URL.to_string()),
                api_key: SecretString::from(api_key),
                from,
            }),
            _ => None,
        };

        Self {
            slack_webhook_url: env_opt("VITRINE_SLACK_WEBHOOK_URL"),
            discord_webhook_url: env_opt("VITRINE_DISCORD_WEBHOOK_URL"),
            webhook_urls: env_opt("VITRINE_WEBHOOK_URLS")
                .map(|s| split_list(&s))
                .unwrap_or_default(),
            webhook_secret: env_opt("VITRINE_WEBHOOK_SECRET").map(SecretString::from),
            email,
            admin_email: env_opt("VITRINE_ADMIN_EMAIL"),
            hr_email: env_opt("VITRINE_HR_EMAIL"),
            site_url: env_opt("VITRINE_SITE_URL")
                .map(|s| s.trim_end_matches('/').to_string())
                .unwrap_or(defaults.site_url),
            timeout: env_opt("VITRINE_NOTIFY_TIMEOUT_SECS")
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
        }
    }

    pub fn hr_recipient(&self) -> Option<&str> {
        self.hr_email.as_deref().or(self.admin_email.as_deref())
    }

    pub fn webhook_secret(&self) -> Option<&str> {
        self.webhook_secret.as_ref().map(|s| s.expose_secret())
    }
}

// ============================================================================
// JOBS AND REPORTS
// ============================================================================

/// Everything one stored submission should announce.
#[derive(Debug, Clone, Default)]
pub struct NotificationJob {
    /// Sent to every generic webhook endpoint.
    pub event: Option<WebhookEvent>,
    /// Sent to Slack and Discord.
    pub chat: Option<ChatMessage>,
    pub emails: Vec<EmailMessage>,
}

impl NotificationJob {
    pub fn is_empty(&self) -> bool {
        self.event.is_none() && self.chat.is_none() && self.emails.is_empty()
    }
}

/// Outcome of one dispatch; deliveries that were not configured are not
/// counted as attempted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub attempted: usize,
    pub delivered: usize,
    pub errors: Vec<String>,
}

// ============================================================================
// NOTIFIER
// ============================================================================

/// Shared HTTP client plus channel configuration.
#[derive(Clone, Debug)]
pub struct Notifier {
    client: reqwest::Client,
    config: Arc<NotifyConfig>,
}

type Delivery<'a> = BoxFuture<'a, (&'static str, Result<(), String>)>;

impl Notifier {
    pub fn new(config: NotifyConfig) -> ApiResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(webhook::USER_AGENT)
            .build()
            .map_err(|e| ApiError::internal_error(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &NotifyConfig {
        &self.config
    }

    /// Start `job` in a detached task. Callers do not need to await the
    /// handle; tests do.
    pub fn spawn(&self, job: NotificationJob) -> JoinHandle<DispatchReport> {
        let notifier = self.clone();
        tokio::spawn(async move { notifier.dispatch(job).await })
    }

    /// Attempt every configured delivery of `job` once, concurrently.
    pub async fn dispatch(&self, job: NotificationJob) -> DispatchReport {
        let mut report = DispatchReport::default();
        let mut deliveries: Vec<Delivery<'_>> = Vec::new();

        if let Some(message) = &job.chat {
            if let Some(url) = &self.config.slack_webhook_url {
                let payload = message.to_slack();
                deliveries.push(
                    async move { ("slack", chat::post(&self.client, url, &payload).await) }.boxed(),
                );
            }
            if let Some(url) = &self.config.discord_webhook_url {
                let payload = message.to_discord();
                deliveries.push(
                    async move { ("discord", chat::post(&self.client, url, &payload).await) }
                        .boxed(),
                );
            }
        }

        if let Some(event) = &job.event {
            if !self.config.webhook_urls.is_empty() {
                match self.config.webhook_secret() {
                    Some(secret) => {
                        for url in &self.config.webhook_urls {
                            deliveries.push(
                                async move {
                                    ("webhook", webhook::deliver(&self.client, url, event, secret).await)
                                }
                                .boxed(),
                            );
                        }
                    }
                    None => {
                        tracing::warn!(
                            event = %event.event,
                            "Webhook URLs configured without VITRINE_WEBHOOK_SECRET; skipping"
                        );
                        report
                            .errors
                            .push("webhook: no signing secret configured".to_string());
                    }
                }
            }
        }

        if let Some(email_config) = &self.config.email {
            for message in &job.emails {
                deliveries.push(
                    async move { ("email", email::send(&self.client, email_config, message).await) }
                        .boxed(),
                );
            }
        }

        report.attempted = deliveries.len();
        for (channel, outcome) in join_all(deliveries).await {
            with_metrics(|m| m.record_notification(channel, outcome.is_ok()));
            match outcome {
                Ok(()) => report.delivered += 1,
                Err(error) => {
                    tracing::warn!(channel, error = %error, "Notification delivery failed");
                    report.errors.push(error);
                }
            }
        }

        if report.attempted > 0 {
            tracing::debug!(
                attempted = report.attempted,
                delivered = report.delivered,
                "Notifications dispatched"
            );
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sample_job() -> NotificationJob {
        NotificationJob {
            event: Some(WebhookEvent::new(EventName::ContactSubmitted, json!({ "name": "Ada" }))),
            chat: Some(ChatMessage::new("New contact").field("Name", "Ada")),
            emails: vec![EmailMessage {
                to: vec!["admin@agency.example".to_string()],
                subject: "New contact".to_string(),
                html: "<p>Ada</p>".to_string(),
                text: "Ada".to_string(),
                reply_to: None,
            }],
        }
    }

    fn config_for(server: &MockServer) -> NotifyConfig {
        NotifyConfig {
            slack_webhook_url: Some(format!("{}/slack", server.uri())),
            discord_webhook_url: Some(format!("{}/discord", server.uri())),
            webhook_urls: vec![format!("{}/hook", server.uri())],
            webhook_secret: Some(SecretString::from("hook-secret".to_string())),
            email: Some(EmailConfig {
                api_url: format!("{}/emails", server.uri()),
                api_key: SecretString::from("re_test".to_string()),
                from: "Agency <hello@agency.example>".to_string(),
            }),
            timeout: Duration::from_secs(5),
            ..NotifyConfig::default()
        }
    }

    #[tokio::test]
    async fn test_unconfigured_channels_are_skipped() -> ApiResult<()> {
        let notifier = Notifier::new(NotifyConfig::default())?;
        let report = notifier.dispatch(sample_job()).await;
        assert_eq!(report, DispatchReport::default());
        Ok(())
    }

    #[tokio::test]
    async fn test_fan_out_to_every_channel() -> ApiResult<()> {
        let server = MockServer::start().await;
        for route in ["/slack", "/discord", "/hook"] {
            Mock::given(method("POST"))
                .and(path(route))
                .respond_with(ResponseTemplate::new(200))
                .expect(1)
                .mount(&server)
                .await;
        }
        Mock::given(method("POST"))
            .and(path("/emails"))
            .and(header("authorization", "Bearer re_test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "em_1" })))
            .expect(1)
            .mount(&server)
            .await;

        let notifier = Notifier::new(config_for(&server))?;
        let report = notifier
            .spawn(sample_job())
            .await
            .map_err(|e| ApiError::internal_error(e.to_string()))?;

        assert_eq!(report.attempted, 4);
        assert_eq!(report.delivered, 4);
        assert!(report.errors.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_webhook_delivery_is_signed() -> ApiResult<()> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .and(header_exists("x-webhook-signature"))
            .and(header("x-webhook-event", "contact.submitted"))
            .and(header("user-agent", webhook::USER_AGENT))
            .respond_with(ResponseTemplate::new(202))
            .mount(&server)
            .await;

        let config = NotifyConfig {
            webhook_urls: vec![format!("{}/hook", server.uri())],
            webhook_secret: Some(SecretString::from("hook-secret".to_string())),
            ..NotifyConfig::default()
        };
        let report = Notifier::new(config)?.dispatch(sample_job()).await;
        assert_eq!(report.delivered, 1);

        let requests = server.received_requests().await.unwrap_or_default();
        assert_eq!(requests.len(), 1);
        let signature = requests[0]
            .headers
            .get("x-webhook-signature")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        assert!(signature.starts_with("sha256="));
        assert!(verify(&requests[0].body, &signature, "hook-secret"));

        let body: serde_json::Value = serde_json::from_slice(&requests[0].body)?;
        assert_eq!(body["event"], "contact.submitted");
        assert_eq!(body["payload"]["name"], "Ada");
        Ok(())
    }

    #[tokio::test]
    async fn test_failures_are_collected_not_raised() -> ApiResult<()> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/slack"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/discord"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let config = NotifyConfig {
            slack_webhook_url: Some(format!("{}/slack", server.uri())),
            discord_webhook_url: Some(format!("{}/discord", server.uri())),
            ..NotifyConfig::default()
        };
        let report = Notifier::new(config)?.dispatch(sample_job()).await;

        assert_eq!(report.attempted, 2);
        assert_eq!(report.delivered, 1);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("500"));
        Ok(())
    }

    #[tokio::test]
    async fn test_webhooks_without_secret_are_skipped() -> ApiResult<()> {
        let config = NotifyConfig {
            webhook_urls: vec!["http://127.0.0.1:9/hook".to_string()],
            ..NotifyConfig::default()
        };
        let report = Notifier::new(config)?.dispatch(sample_job()).await;
        assert_eq!(report.attempted, 0);
        assert_eq!(report.errors.len(), 1);
        Ok(())
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = NotifyConfig {
            webhook_secret: Some(SecretString::from("hook-secret".to_string())),
            slack_webhook_url: Some("https://hooks.slack.com/services/T/B/X".to_string()),
            ..NotifyConfig::default()
        };
        let debug = format!("{:?}", config);
        assert!(!debug.contains("hook-secret"));
        assert!(!debug.contains("hooks.slack.com"));
    }

    #[test]
    fn test_hr_recipient_falls_back_to_admin() {
        let config = NotifyConfig {
            admin_email: Some("admin@agency.example".to_string()),
            ..NotifyConfig::default()
        };
        assert_eq!(config.hr_recipient(), Some("admin@agency.example"));
    }
}
