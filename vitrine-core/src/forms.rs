//! Form intake: contact, consultation and newsletter

use crate::content::trimmed;
use crate::enums::{ConsultationStatus, SubmissionStatus};
use crate::error::ValidationErrors;
use crate::query::{FilterField, ListConfig, SortOrder};
use crate::table::{Record, Table};
use crate::validation::{HasUpdates, Validate, Validator};
use crate::{new_entity_id, EntityId, Timestamp};
use chrono::{NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// CONTACT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ContactSubmission {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub id: EntityId,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub subject: Option<String>,
    pub message: String,
    #[serde(default)]
    pub services: Vec<String>,
    pub budget: Option<String>,
    pub source: Option<String>,
    pub status: SubmissionStatus,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub updated_at: Timestamp,
}

impl Record for ContactSubmission {
    const TABLE: Table = Table::ContactSubmissions;
    const ENTITY_NAME: &'static str = "Contact submission";
}

impl ContactSubmission {
    pub const ADMIN_LIST: ListConfig = ListConfig {
        sortable: &["created_at", "name", "status"],
        filters: &[FilterField::text("status", "status")],
        searchable: &["name", "email", "company", "message"],
        paginate: true,
        default_sort: "created_at",
        default_order: SortOrder::Desc,
    };

    pub fn from_request(req: ContactRequest, now: Timestamp) -> Self {
        Self {
            id: new_entity_id(),
            name: req.name.trim().to_string(),
            email: req.email.trim().to_lowercase(),
            phone: trimmed(req.phone),
            company: trimmed(req.company),
            subject: trimmed(req.subject),
            message: req.message.trim().to_string(),
            services: req.services.iter().map(|s| s.trim().to_string()).collect(),
            budget: trimmed(req.budget),
            source: trimmed(req.source),
            status: SubmissionStatus::New,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ContactRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub subject: Option<String>,
    #[serde(default)]
    pub message: String,
    /// Services the sender is interested in. May be empty.
    #[serde(default)]
    pub services: Vec<String>,
    pub budget: Option<String>,
    pub source: Option<String>,
}

impl Validate for ContactRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut v = Validator::new();
        v.text("name", "Name", &self.name, 1, 100)
            .email("email", &self.email)
            .text("message", "Message", &self.message, 10, 5_000)
            .optional_phone("phone", self.phone.as_deref())
            .optional_text("company", "Company", self.company.as_deref(), 200)
            .optional_text("subject", "Subject", self.subject.as_deref(), 200)
            .optional_text("budget", "Budget", self.budget.as_deref(), 100)
            .each_non_empty("services", "Service", &self.services);
        v.finish()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UpdateContactRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<SubmissionStatus>,
}

impl HasUpdates for UpdateContactRequest {}

// ============================================================================
// CONSULTATION
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ConsultationRequest {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub id: EntityId,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "uuid"))]
    pub service_id: Option<EntityId>,
    pub preferred_date: Option<NaiveDate>,
    pub preferred_time: Option<String>,
    pub timezone: Option<String>,
    pub project_details: String,
    pub budget: Option<String>,
    pub status: ConsultationStatus,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub updated_at: Timestamp,
}

impl Record for ConsultationRequest {
    const TABLE: Table = Table::ConsultationRequests;
    const ENTITY_NAME: &'static str = "Consultation request";
}

impl ConsultationRequest {
    pub const ADMIN_LIST: ListConfig = ListConfig {
        sortable: &["created_at", "preferred_date", "status"],
        filters: &[
            FilterField::text("status", "status"),
            FilterField::uuid("service", "service_id"),
        ],
        searchable: &["name", "email", "company", "project_details"],
        paginate: true,
        default_sort: "created_at",
        default_order: SortOrder::Desc,
    };

    /// Expects a request that already passed validation; unparseable dates
    /// are dropped rather than stored.
    pub fn from_request(req: BookConsultationRequest, now: Timestamp) -> Self {
        Self {
            id: new_entity_id(),
            name: req.name.trim().to_string(),
            email: req.email.trim().to_lowercase(),
            phone: trimmed(req.phone),
            company: trimmed(req.company),
            service_id: req.service_id,
            preferred_date: req.preferred_date.as_deref().and_then(parse_date),
            preferred_time: trimmed(req.preferred_time),
            timezone: trimmed(req.timezone),
            project_details: req.project_details.trim().to_string(),
            budget: trimmed(req.budget),
            status: ConsultationStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

fn parse_time(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M").ok()
}

/// Body of `POST /api/consultation`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct BookConsultationRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "uuid"))]
    pub service_id: Option<EntityId>,
    /// `YYYY-MM-DD`, today or later.
    pub preferred_date: Option<String>,
    /// `HH:MM`, 24-hour clock.
    pub preferred_time: Option<String>,
    pub timezone: Option<String>,
    #[serde(default)]
    pub project_details: String,
    pub budget: Option<String>,
}

impl BookConsultationRequest {
    pub fn validate_on(&self, today: NaiveDate) -> Result<(), ValidationErrors> {
        let mut v = Validator::new();
        v.text("name", "Name", &self.name, 1, 100)
            .email("email", &self.email)
            .text("project_details", "Project details", &self.project_details, 20, 5_000)
            .optional_phone("phone", self.phone.as_deref())
            .optional_text("company", "Company", self.company.as_deref(), 200)
            .optional_text("timezone", "Timezone", self.timezone.as_deref(), 64);
        if let Some(raw) = self.preferred_date.as_deref().filter(|d| !d.trim().is_empty()) {
            match parse_date(raw) {
                Some(date) => {
                    v.check(date >= today, "preferred_date", "Preferred date cannot be in the past");
                }
                None => {
                    v.check(false, "preferred_date", "Preferred date must be formatted as YYYY-MM-DD");
                }
            }
        }
        if let Some(raw) = self.preferred_time.as_deref().filter(|t| !t.trim().is_empty()) {
            v.check(
                parse_time(raw).is_some(),
                "preferred_time",
                "Preferred time must be formatted as HH:MM",
            );
        }
        v.finish()
    }
}

impl Validate for BookConsultationRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        self.validate_on(Utc::now().date_naive())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UpdateConsultationRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ConsultationStatus>,
}

impl HasUpdates for UpdateConsultationRequest {}

// ============================================================================
// NEWSLETTER
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct NewsletterSubscription {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub id: EntityId,
    pub email: String,
    pub name: Option<String>,
    pub is_active: bool,
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub unsubscribe_token: String,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub subscribed_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "date-time"))]
    pub unsubscribed_at: Option<Timestamp>,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub updated_at: Timestamp,
}

impl Record for NewsletterSubscription {
    const TABLE: Table = Table::NewsletterSubscriptions;
    const ENTITY_NAME: &'static str = "Subscription";
}

impl NewsletterSubscription {
    pub const ADMIN_LIST: ListConfig = ListConfig {
        sortable: &["subscribed_at", "created_at", "email"],
        filters: &[
            FilterField::bool("is_active", "is_active"),
            FilterField::text("source", "source"),
        ],
        searchable: &["email", "name"],
        paginate: true,
        default_sort: "subscribed_at",
        default_order: SortOrder::Desc,
    };

    pub fn from_request(req: SubscribeRequest, token: String, now: Timestamp) -> Self {
        Self {
            id: new_entity_id(),
            email: normalize_email(&req.email),
            name: trimmed(req.name),
            is_active: true,
            source: trimmed(req.source),
            unsubscribe_token: token,
            subscribed_at: now,
            unsubscribed_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Lookup form of an email address.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SubscribeRequest {
    #[serde(default)]
    pub email: String,
    pub name: Option<String>,
    pub source: Option<String>,
}

impl Validate for SubscribeRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut v = Validator::new();
        v.email("email", &self.email)
            .optional_text("name", "Name", self.name.as_deref(), 100)
            .optional_text("source", "Source", self.source.as_deref(), 100);
        v.finish()
    }
}

/// Unsubscribe by the token from a newsletter footer link, or by email.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema, utoipa::IntoParams))]
pub struct UnsubscribeRequest {
    pub token: Option<String>,
    pub email: Option<String>,
}

impl Validate for UnsubscribeRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut v = Validator::new();
        let has_token = self.token.as_deref().is_some_and(|t| !t.trim().is_empty());
        if !has_token {
            match self.email.as_deref() {
                Some(email) => {
                    v.email("email", email);
                }
                None => {
                    v.check(false, "token", "Provide an unsubscribe token or an email address");
                }
            }
        }
        v.finish()
    }
}
