//! Job listings and applications

use crate::content::{resolve_slug, trimmed};
use crate::enums::{ApplicationStatus, EmploymentType};
use crate::error::ValidationErrors;
use crate::query::{FilterField, ListConfig, SortOrder};
use crate::table::{Record, Table};
use crate::validation::{HasUpdates, Validate, Validator};
use crate::{new_entity_id, EntityId, Timestamp};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Job {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub id: EntityId,
    pub slug: String,
    pub title: String,
    pub department: Option<String>,
    pub location: Option<String>,
    pub employment_type: EmploymentType,
    pub remote: bool,
    pub description: String,
    #[serde(default)]
    pub requirements: Vec<String>,
    pub salary_range: Option<String>,
    pub is_active: bool,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "date-time"))]
    pub closes_at: Option<Timestamp>,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub updated_at: Timestamp,
}

impl Record for Job {
    const TABLE: Table = Table::Jobs;
    const ENTITY_NAME: &'static str = "Job";
}

impl Job {
    pub const LIST: ListConfig = ListConfig {
        sortable: &["created_at", "title"],
        filters: &[
            FilterField::text("department", "department"),
            FilterField::text("location", "location"),
            FilterField::text("employment_type", "employment_type"),
            FilterField::bool("remote", "remote"),
        ],
        searchable: &["title", "description"],
        paginate: true,
        default_sort: "created_at",
        default_order: SortOrder::Desc,
    };

    pub const ADMIN_LIST: ListConfig = ListConfig {
        filters: &[
            FilterField::text("department", "department"),
            FilterField::text("location", "location"),
            FilterField::text("employment_type", "employment_type"),
            FilterField::bool("remote", "remote"),
            FilterField::bool("is_active", "is_active"),
        ],
        ..Self::LIST
    };

    /// Active and not past its closing date.
    pub fn accepts_applications(&self, now: Timestamp) -> bool {
        self.is_active && self.closes_at.map_or(true, |closes| closes > now)
    }

    pub fn from_request(req: CreateJobRequest, now: Timestamp) -> Self {
        Self {
            id: new_entity_id(),
            slug: resolve_slug(req.slug.as_deref(), &req.title),
            title: req.title.trim().to_string(),
            department: trimmed(req.department),
            location: trimmed(req.location),
            employment_type: req.employment_type.unwrap_or_default(),
            remote: req.remote,
            description: req.description.trim().to_string(),
            requirements: req.requirements,
            salary_range: trimmed(req.salary_range),
            is_active: req.is_active.unwrap_or(true),
            closes_at: req.closes_at,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateJobRequest {
    pub slug: Option<String>,
    pub title: String,
    pub department: Option<String>,
    pub location: Option<String>,
    pub employment_type: Option<EmploymentType>,
    #[serde(default)]
    pub remote: bool,
    pub description: String,
    #[serde(default)]
    pub requirements: Vec<String>,
    pub salary_range: Option<String>,
    pub is_active: Option<bool>,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "date-time"))]
    pub closes_at: Option<Timestamp>,
}

impl Validate for CreateJobRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut v = Validator::new();
        v.text("title", "Title", &self.title, 2, 200)
            .text("description", "Description", &self.description, 10, 20_000)
            .optional_slug("slug", self.slug.as_deref())
            .check(
                !resolve_slug(self.slug.as_deref(), &self.title).is_empty(),
                "slug",
                "Slug could not be derived from the title",
            )
            .each_non_empty("requirements", "Requirement", &self.requirements)
            .optional_text("salary_range", "Salary range", self.salary_range.as_deref(), 100);
        v.finish()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UpdateJobRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employment_type: Option<EmploymentType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requirements: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary_range: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "date-time"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closes_at: Option<Timestamp>,
}

impl HasUpdates for UpdateJobRequest {}

impl Validate for UpdateJobRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut v = Validator::new();
        if let Some(title) = &self.title {
            v.text("title", "Title", title, 2, 200);
        }
        if let Some(description) = &self.description {
            v.text("description", "Description", description, 10, 20_000);
        }
        if let Some(requirements) = &self.requirements {
            v.each_non_empty("requirements", "Requirement", requirements);
        }
        v.optional_slug("slug", self.slug.as_deref());
        v.finish()
    }
}

// ============================================================================
// APPLICATION
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct JobApplication {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub id: EntityId,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub job_id: EntityId,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub resume_url: String,
    pub cover_letter: Option<String>,
    pub portfolio_url: Option<String>,
    pub linkedin_url: Option<String>,
    pub status: ApplicationStatus,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub updated_at: Timestamp,
}

impl Record for JobApplication {
    const TABLE: Table = Table::JobApplications;
    const ENTITY_NAME: &'static str = "Job application";
}

impl JobApplication {
    pub const ADMIN_LIST: ListConfig = ListConfig {
        sortable: &["created_at", "full_name", "status"],
        filters: &[
            FilterField::text("status", "status"),
            FilterField::uuid("job", "job_id"),
        ],
        searchable: &["full_name", "email"],
        paginate: true,
        default_sort: "created_at",
        default_order: SortOrder::Desc,
    };

    pub fn from_request(req: CreateJobApplicationRequest, job_id: EntityId, now: Timestamp) -> Self {
        Self {
            id: new_entity_id(),
            job_id,
            full_name: req.full_name.trim().to_string(),
            email: req.email.trim().to_lowercase(),
            phone: trimmed(req.phone),
            resume_url: req.resume_url.trim().to_string(),
            cover_letter: trimmed(req.cover_letter),
            portfolio_url: trimmed(req.portfolio_url),
            linkedin_url: trimmed(req.linkedin_url),
            status: ApplicationStatus::New,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateJobApplicationRequest {
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub resume_url: String,
    pub cover_letter: Option<String>,
    pub portfolio_url: Option<String>,
    pub linkedin_url: Option<String>,
}

impl Validate for CreateJobApplicationRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut v = Validator::new();
        v.text("full_name", "Full name", &self.full_name, 2, 100)
            .email("email", &self.email)
            .optional_phone("phone", self.phone.as_deref())
            .url("resume_url", "Resume URL", &self.resume_url)
            .optional_text("cover_letter", "Cover letter", self.cover_letter.as_deref(), 10_000)
            .optional_url("portfolio_url", "Portfolio URL", self.portfolio_url.as_deref())
            .optional_url("linkedin_url", "LinkedIn URL", self.linkedin_url.as_deref());
        v.finish()
    }
}

/// Pipeline update from the hiring team.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UpdateApplicationRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ApplicationStatus>,
}

impl HasUpdates for UpdateApplicationRequest {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_closed_job_rejects_applications() {
        let now = crate::now();
        let mut job = Job::from_request(
            CreateJobRequest {
                title: "Rust Engineer".to_string(),
                description: "Build the backend of our site".to_string(),
                ..Default::default()
            },
            now,
        );
        assert!(job.accepts_applications(now));

        job.closes_at = Some(now - Duration::days(1));
        assert!(!job.accepts_applications(now));

        job.closes_at = None;
        job.is_active = false;
        assert!(!job.accepts_applications(now));
    }

    #[test]
    fn test_application_requires_http_resume() {
        let req = CreateJobApplicationRequest {
            full_name: "Grace Hopper".to_string(),
            email: "grace@example.com".to_string(),
            resume_url: "file:///home/grace/cv.pdf".to_string(),
            ..Default::default()
        };
        let errors = req.validate().err().unwrap_or_default();
        assert_eq!(errors.len(), 1);
        assert!(errors.contains("resume_url"));
    }

    #[test]
    fn test_application_email_normalized() {
        let app = JobApplication::from_request(
            CreateJobApplicationRequest {
                full_name: "Grace Hopper".to_string(),
                email: " Grace@Example.com ".to_string(),
                resume_url: "https://example.com/cv.pdf".to_string(),
                ..Default::default()
            },
            new_entity_id(),
            crate::now(),
        );
        assert_eq!(app.email, "grace@example.com");
        assert_eq!(app.status, ApplicationStatus::New);
    }
}
