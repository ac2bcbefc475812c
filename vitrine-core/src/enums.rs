//! Status and category enums stored as lowercase text columns

use crate::error::EnumParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Generates `as_db_str`, `Display` and `FromStr` for a text-backed enum.
macro_rules! text_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            /// All variants in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Convert to database string representation.
            pub fn as_db_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_db_str())
            }
        }

        impl FromStr for $name {
            type Err = EnumParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($text => Ok($name::$variant),)+
                    _ => Err(EnumParseError {
                        kind: $kind,
                        value: s.to_string(),
                    }),
                }
            }
        }
    };
}

/// Editorial state of published content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum PublishStatus {
    #[default]
    Draft,
    Published,
    Archived,
}

text_enum!(PublishStatus, "publish status", {
    Draft => "draft",
    Published => "published",
    Archived => "archived",
});

/// Moderation state of a blog comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum CommentStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
    Spam,
}

text_enum!(CommentStatus, "comment status", {
    Pending => "pending",
    Approved => "approved",
    Rejected => "rejected",
    Spam => "spam",
});

/// Hiring pipeline stage of a job application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    #[default]
    New,
    Reviewing,
    Interview,
    Rejected,
    Hired,
}

text_enum!(ApplicationStatus, "application status", {
    New => "new",
    Reviewing => "reviewing",
    Interview => "interview",
    Rejected => "rejected",
    Hired => "hired",
});

/// Inbox state of a contact form submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    #[default]
    New,
    Read,
    Replied,
    Archived,
}

text_enum!(SubmissionStatus, "submission status", {
    New => "new",
    Read => "read",
    Replied => "replied",
    Archived => "archived",
});

/// Booking state of a consultation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum ConsultationStatus {
    #[default]
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

text_enum!(ConsultationStatus, "consultation status", {
    Pending => "pending",
    Confirmed => "confirmed",
    Completed => "completed",
    Cancelled => "cancelled",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum EmploymentType {
    #[default]
    FullTime,
    PartTime,
    Contract,
    Internship,
}

text_enum!(EmploymentType, "employment type", {
    FullTime => "full_time",
    PartTime => "part_time",
    Contract => "contract",
    Internship => "internship",
});

/// Funnel step reported by the form analytics beacon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum FormAction {
    View,
    Start,
    Submit,
    Abandon,
    Error,
}

text_enum!(FormAction, "form action", {
    View => "view",
    Start => "start",
    Submit => "submit",
    Abandon => "abandon",
    Error => "error",
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_strings_match_serde_names() -> Result<(), serde_json::Error> {
        for status in PublishStatus::ALL {
            let json = serde_json::to_value(status)?;
            assert_eq!(json, status.as_db_str());
        }
        for kind in EmploymentType::ALL {
            let json = serde_json::to_value(kind)?;
            assert_eq!(json, kind.as_db_str());
        }
        Ok(())
    }

    #[test]
    fn test_from_str_is_case_insensitive() {
        assert_eq!("Published".parse::<PublishStatus>(), Ok(PublishStatus::Published));
        assert_eq!(" spam ".parse::<CommentStatus>(), Ok(CommentStatus::Spam));
        assert_eq!("FULL_TIME".parse::<EmploymentType>(), Ok(EmploymentType::FullTime));
    }

    #[test]
    fn test_from_str_rejects_unknown() {
        let err = "deleted".parse::<SubmissionStatus>();
        assert_eq!(
            err,
            Err(EnumParseError {
                kind: "submission status",
                value: "deleted".to_string()
            })
        );
    }
}
