//! Slack and Discord incoming-webhook payloads

use serde_json::{json, Value};

/// Slack renders at most ten fields in a section block.
const SLACK_MAX_FIELDS: usize = 10;
/// Discord rejects embed field values above 1024 characters.
const DISCORD_MAX_FIELD_CHARS: usize = 1_024;

/// Accent colour for Discord embeds.
const DISCORD_COLOR: u32 = 0x4F46E5;

/// A short team notification rendered for either chat service.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub title: String,
    pub fields: Vec<(String, String)>,
    /// Link to the admin view of the new row.
    pub link: Option<String>,
}

impl ChatMessage {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            fields: Vec::new(),
            link: None,
        }
    }

    /// Add a field; blank values are skipped.
    pub fn field(mut self, name: &str, value: impl Into<String>) -> Self {
        let value = value.into();
        if !value.trim().is_empty() {
            self.fields.push((name.to_string(), value));
        }
        self
    }

    pub fn optional_field(self, name: &str, value: Option<&str>) -> Self {
        match value {
            Some(value) => self.field(name, value),
            None => self,
        }
    }

    pub fn link(mut self, url: impl Into<String>) -> Self {
        self.link = Some(url.into());
        self
    }

    pub fn to_slack(&self) -> Value {
        let fields: Vec<Value> = self
            .fields
            .iter()
            .take(SLACK_MAX_FIELDS)
            .map(|(name, value)| {
                json!({
                    "type": "mrkdwn",
                    "text": format!("*{}:*\n{}", name, value),
                })
            })
            .collect();

        let mut blocks = vec![json!({
            "type": "header",
            "text": { "type": "plain_text", "text": self.title },
        })];
        if !fields.is_empty() {
            blocks.push(json!({ "type": "section", "fields": fields }));
        }
        if let Some(link) = &self.link {
            blocks.push(json!({
                "type": "section",
                "text": { "type": "mrkdwn", "text": format!("<{}|Open in admin>", link) },
            }));
        }

        json!({ "text": self.title, "blocks": blocks })
    }

    pub fn to_discord(&self) -> Value {
        let fields: Vec<Value> = self
            .fields
            .iter()
            .map(|(name, value)| {
                json!({
                    "name": name,
                    "value": truncate(value, DISCORD_MAX_FIELD_CHARS),
                    "inline": value.len() <= 40,
                })
            })
            .collect();

        let mut embed = json!({
            "title": self.title,
            "color": DISCORD_COLOR,
            "fields": fields,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });
        if let Some(link) = &self.link {
            embed["url"] = Value::String(link.clone());
        }

        json!({ "username": "Vitrine", "embeds": [embed] })
    }
}

fn truncate(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    let mut out: String = value.chars().take(max_chars.saturating_sub(1)).collect();
    out.push('…');
    out
}

/// POST a JSON payload to a chat webhook.
pub async fn post(client: &reqwest::Client, url: &str, payload: &Value) -> Result<(), String> {
    let response = client
        .post(url)
        .json(payload)
        .send()
        .await
        .map_err(|e| format!("chat webhook: {}", e))?;

    if response.status().is_success() {
        Ok(())
    } else {
        Err(format!("chat webhook: status {}", response.status()))
    }
}
