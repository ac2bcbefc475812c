//! Transactional email over an HTTP API (Resend-compatible)

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

pub const DEFAULT_EMAIL_API_URL: &str = "https://api.resend.com/emails";

/// Credentials for the email API.
#[derive(Clone)]
pub struct EmailConfig {
    pub api_url: String,
    pub api_key: SecretString,
    /// `Name <address>` or a bare address.
    pub from: String,
}

impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &"[REDACTED]")
            .field("from", &self.from)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
    pub text: String,
    pub reply_to: Option<String>,
}

#[derive(Serialize)]
struct SendRequest<'a> {
    from: &'a str,
    to: &'a [String],
    subject: &'a str,
    html: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to: Option<&'a str>,
}

/// Send one message. Single attempt; non-2xx counts as failure.
pub async fn send(
    client: &reqwest::Client,
    config: &EmailConfig,
    message: &EmailMessage,
) -> Result<(), String> {
    if message.to.is_empty() {
        return Err("email has no recipients".to_string());
    }

    let request = SendRequest {
        from: &config.from,
        to: &message.to,
        subject: &message.subject,
        html: &message.html,
        text: &message.text,
        reply_to: message.reply_to.as_deref(),
    };

    let response = client
        .post(&config.api_url)
        .bearer_auth(config.api_key.expose_secret())
        .json(&request)
        .send()
        .await
        .map_err(|e| format!("email: {}", e))?;

    if response.status().is_success() {
        Ok(())
    } else {
        let status = response.status();
        let detail = response.text().await.unwrap_or_default();
        Err(format!("email: status {} {}", status, detail.trim()))
    }
}
