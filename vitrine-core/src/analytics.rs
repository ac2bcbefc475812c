//! First-party analytics rows

use crate::content::trimmed;
use crate::enums::FormAction;
use crate::error::ValidationErrors;
use crate::table::{Record, Table};
use crate::validation::{Validate, Validator};
use crate::{new_entity_id, EntityId, Timestamp};
use serde::{Deserialize, Serialize};
use serde_json::Value;

fn validate_path(v: &mut Validator, path: &str) {
    v.text("path", "Path", path, 1, 2_048)
        .check(path.trim().starts_with('/'), "path", "Path must start with '/'");
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PageView {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub id: EntityId,
    pub path: String,
    pub referrer: Option<String>,
    pub user_agent: Option<String>,
    pub session_id: Option<String>,
    pub country: Option<String>,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
}

impl Record for PageView {
    const TABLE: Table = Table::PageViews;
    const ENTITY_NAME: &'static str = "Page view";
}

/// Request metadata captured from headers rather than the body.
#[derive(Debug, Clone, Default)]
pub struct ClientInfo {
    pub user_agent: Option<String>,
    pub country: Option<String>,
}

impl PageView {
    pub fn from_request(req: TrackPageViewRequest, client: ClientInfo, now: Timestamp) -> Self {
        Self {
            id: new_entity_id(),
            path: req.path.trim().to_string(),
            referrer: trimmed(req.referrer),
            user_agent: client.user_agent,
            session_id: trimmed(req.session_id),
            country: client.country,
            created_at: now,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TrackPageViewRequest {
    #[serde(default)]
    pub path: String,
    pub referrer: Option<String>,
    pub session_id: Option<String>,
}

impl Validate for TrackPageViewRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut v = Validator::new();
        validate_path(&mut v, &self.path);
        v.optional_text("referrer", "Referrer", self.referrer.as_deref(), 2_048)
            .optional_text("session_id", "Session id", self.session_id.as_deref(), 128);
        v.finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct EngagementEvent {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub id: EntityId,
    pub event_type: String,
    pub path: String,
    pub element: Option<String>,
    pub value: Option<f64>,
    pub session_id: Option<String>,
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub metadata: Value,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
}

impl Record for EngagementEvent {
    const TABLE: Table = Table::EngagementEvents;
    const ENTITY_NAME: &'static str = "Engagement event";
}

impl EngagementEvent {
    pub fn from_request(req: TrackEventRequest, now: Timestamp) -> Self {
        Self {
            id: new_entity_id(),
            event_type: req.event_type.trim().to_string(),
            path: req.path.trim().to_string(),
            element: trimmed(req.element),
            value: req.value,
            session_id: trimmed(req.session_id),
            metadata: req.metadata.unwrap_or_else(|| Value::Object(Default::default())),
            created_at: now,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TrackEventRequest {
    #[serde(default)]
    pub event_type: String,
    #[serde(default)]
    pub path: String,
    pub element: Option<String>,
    pub value: Option<f64>,
    pub session_id: Option<String>,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<Object>))]
    pub metadata: Option<Value>,
}

impl Validate for TrackEventRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut v = Validator::new();
        v.text("event_type", "Event type", &self.event_type, 1, 64);
        validate_path(&mut v, &self.path);
        v.optional_text("element", "Element", self.element.as_deref(), 256)
            .check(
                self.metadata.as_ref().map_or(true, Value::is_object),
                "metadata",
                "Metadata must be a JSON object",
            );
        v.finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct FormAnalytics {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub id: EntityId,
    pub form_name: String,
    pub action: FormAction,
    pub path: Option<String>,
    pub session_id: Option<String>,
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub metadata: Value,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
}

impl Record for FormAnalytics {
    const TABLE: Table = Table::FormAnalytics;
    const ENTITY_NAME: &'static str = "Form event";
}

impl FormAnalytics {
    pub fn from_request(req: TrackFormRequest, now: Timestamp) -> Self {
        Self {
            id: new_entity_id(),
            form_name: req.form_name.trim().to_string(),
            action: req.action,
            path: trimmed(req.path),
            session_id: trimmed(req.session_id),
            metadata: req.metadata.unwrap_or_else(|| Value::Object(Default::default())),
            created_at: now,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TrackFormRequest {
    pub form_name: String,
    pub action: FormAction,
    pub path: Option<String>,
    pub session_id: Option<String>,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<Object>))]
    pub metadata: Option<Value>,
}

impl Validate for TrackFormRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut v = Validator::new();
        v.text("form_name", "Form name", &self.form_name, 1, 64)
            .check(
                self.metadata.as_ref().map_or(true, Value::is_object),
                "metadata",
                "Metadata must be a JSON object",
            );
        v.finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SearchAnalytics {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub id: EntityId,
    pub query: String,
    pub results_count: i64,
    pub path: Option<String>,
    pub session_id: Option<String>,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
}

impl Record for SearchAnalytics {
    const TABLE: Table = Table::SearchAnalytics;
    const ENTITY_NAME: &'static str = "Search";
}

impl SearchAnalytics {
    pub fn new(query: &str, results_count: u64, session_id: Option<String>, now: Timestamp) -> Self {
        Self {
            id: new_entity_id(),
            query: query.trim().to_lowercase(),
            results_count: results_count.min(i64::MAX as u64) as i64,
            path: None,
            session_id: trimmed(session_id),
            created_at: now,
        }
    }
}

/// Totals shown on the admin dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AnalyticsSummary {
    pub page_views: u64,
    pub engagement_events: u64,
    pub form_events: u64,
    pub form_submissions: u64,
    pub searches: u64,
    pub contact_submissions: u64,
    pub consultation_requests: u64,
    pub job_applications: u64,
    pub active_subscribers: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_view_path_must_be_absolute() {
        let req = TrackPageViewRequest {
            path: "about".to_string(),
            ..Default::default()
        };
        let errors = req.validate().err().unwrap_or_default();
        assert_eq!(errors.messages("path"), ["Path must start with '/'"]);
    }

    #[test]
    fn test_event_metadata_must_be_object() {
        let req = TrackEventRequest {
            event_type: "cta_click".to_string(),
            path: "/".to_string(),
            metadata: Some(Value::from(3)),
            ..Default::default()
        };
        assert!(req.validate().err().unwrap_or_default().contains("metadata"));
    }

    #[test]
    fn test_event_defaults_metadata() {
        let event = EngagementEvent::from_request(
            TrackEventRequest {
                event_type: "scroll".to_string(),
                path: "/blog".to_string(),
                ..Default::default()
            },
            crate::now(),
        );
        assert!(event.metadata.is_object());
    }

    #[test]
    fn test_search_query_normalized() {
        let row = SearchAnalytics::new("  Rust Consulting ", 4, None, crate::now());
        assert_eq!(row.query, "rust consulting");
        assert_eq!(row.results_count, 4);
    }
}
