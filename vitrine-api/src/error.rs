//! Error Types for the Vitrine API
//!
//! This module defines error handling for the API layer, including:
//! - ApiError struct for structured error responses
//! - ErrorCode enum for categorizing errors
//! - IntoResponse implementation producing the failure envelope
//!
//! Every error leaves the server as
//! `{"success": false, "error": {"code", "message", "details"?}}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use vitrine_core::ValidationErrors;

use crate::store::StoreError;

// ============================================================================
// ERROR CODE ENUM
// ============================================================================

/// Error codes for API responses.
///
/// Each error code maps to a specific HTTP status code and represents
/// a category of error that can occur during API operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // ========================================================================
    // Authentication Errors (401, 403)
    // ========================================================================
    /// Request lacks valid authentication credentials
    Unauthorized,

    /// Request is authenticated but lacks the admin role
    Forbidden,

    /// Authentication token is invalid or malformed
    InvalidToken,

    /// Authentication token has expired
    TokenExpired,

    /// Inbound webhook signature missing or wrong
    InvalidSignature,

    // ========================================================================
    // Validation Errors (400)
    // ========================================================================
    /// One or more fields failed validation; see `details.fields`
    ValidationFailed,

    /// Request body or parameters could not be understood
    InvalidInput,

    /// Field format is incorrect
    InvalidFormat,

    /// Inbound webhook named an event outside the accepted set
    UnknownEvent,

    // ========================================================================
    // Not Found Errors (404)
    // ========================================================================
    /// Requested entity does not exist
    EntityNotFound,

    // ========================================================================
    // Conflict Errors (409)
    // ========================================================================
    /// Entity with the same slug or key already exists
    EntityAlreadyExists,

    /// Newsletter address already has an active subscription
    EmailAlreadySubscribed,

    // ========================================================================
    // Rate limiting (429)
    // ========================================================================
    TooManyRequests,

    // ========================================================================
    // Server Errors (500, 503)
    // ========================================================================
    /// Internal server error
    InternalError,

    /// Store operation failed
    DatabaseError,

    /// Service is temporarily unavailable
    ServiceUnavailable,

    /// Database connection pool exhausted
    ConnectionPoolExhausted,
}

impl ErrorCode {
    /// Get the HTTP status code for this error code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::Unauthorized
            | ErrorCode::InvalidToken
            | ErrorCode::TokenExpired
            | ErrorCode::InvalidSignature => StatusCode::UNAUTHORIZED,

            ErrorCode::Forbidden => StatusCode::FORBIDDEN,

            ErrorCode::ValidationFailed
            | ErrorCode::InvalidInput
            | ErrorCode::InvalidFormat
            | ErrorCode::UnknownEvent => StatusCode::BAD_REQUEST,

            ErrorCode::EntityNotFound => StatusCode::NOT_FOUND,

            ErrorCode::EntityAlreadyExists
            | ErrorCode::EmailAlreadySubscribed => StatusCode::CONFLICT,

            ErrorCode::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,

            ErrorCode::ServiceUnavailable
            | ErrorCode::ConnectionPoolExhausted => StatusCode::SERVICE_UNAVAILABLE,

            ErrorCode::InternalError
            | ErrorCode::DatabaseError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get a default message for this error code.
    pub fn default_message(&self) -> &'static str {
        match self {
            ErrorCode::Unauthorized => "Authentication required",
            ErrorCode::Forbidden => "Access forbidden",
            ErrorCode::InvalidToken => "Invalid authentication token",
            ErrorCode::TokenExpired => "Authentication token has expired",
            ErrorCode::InvalidSignature => "Invalid webhook signature",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::InvalidInput => "Invalid input data",
            ErrorCode::InvalidFormat => "Invalid format",
            ErrorCode::UnknownEvent => "Unknown event type",
            ErrorCode::EntityNotFound => "Entity not found",
            ErrorCode::EntityAlreadyExists => "Entity already exists",
            ErrorCode::EmailAlreadySubscribed => "This email is already subscribed",
            ErrorCode::TooManyRequests => "Rate limit exceeded",
            ErrorCode::InternalError => "An unexpected error occurred",
            ErrorCode::DatabaseError => "Database operation failed",
            ErrorCode::ServiceUnavailable => "Service temporarily unavailable",
            ErrorCode::ConnectionPoolExhausted => "Connection pool exhausted",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

// ============================================================================
// API ERROR STRUCT
// ============================================================================

/// Structured error returned by every handler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ApiError {
    /// Error code categorizing the error
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details (field errors and the like)
    #[serde(skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<Object>))]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Create a new API error with the given code, using the default message.
    pub fn from_code(code: ErrorCode) -> Self {
        Self::new(code, code.default_message())
    }

    /// Add additional details to the error.
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        self.code.status_code()
    }

    // ========================================================================
    // Convenience constructors for common errors
    // ========================================================================

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    pub fn invalid_token(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidToken, message)
    }

    pub fn token_expired() -> Self {
        Self::from_code(ErrorCode::TokenExpired)
    }

    pub fn invalid_signature() -> Self {
        Self::from_code(ErrorCode::InvalidSignature)
    }

    /// Field-level validation failure with `details.fields`.
    pub fn validation(errors: ValidationErrors) -> Self {
        Self::from_code(ErrorCode::ValidationFailed)
            .with_details(serde_json::json!({ "fields": errors }))
    }

    /// Single-field validation failure.
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        Self::validation(ValidationErrors::single(field, message))
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    pub fn invalid_format(field: &str, expected: &str) -> Self {
        Self::new(
            ErrorCode::InvalidFormat,
            format!("Field '{}' has invalid format, expected {}", field, expected),
        )
    }

    pub fn unknown_event(event: &str) -> Self {
        Self::new(ErrorCode::UnknownEvent, format!("Unknown event type: {}", event))
    }

    /// `{entity} {key} not found`, where key is a slug or id.
    pub fn entity_not_found(entity_type: &str, key: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::EntityNotFound,
            format!("{} {} not found", entity_type, key),
        )
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::EntityNotFound, message)
    }

    pub fn entity_already_exists(entity_type: &str, key: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::EntityAlreadyExists,
            format!("{} {} already exists", entity_type, key),
        )
    }

    pub fn already_subscribed() -> Self {
        Self::from_code(ErrorCode::EmailAlreadySubscribed)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    pub fn database_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ServiceUnavailable, message)
    }

    pub fn connection_pool_exhausted() -> Self {
        Self::from_code(ErrorCode::ConnectionPoolExhausted)
    }

    pub fn too_many_requests(retry_after_secs: Option<u64>) -> Self {
        let message = match retry_after_secs {
            Some(secs) => format!("Rate limit exceeded. Retry after {} seconds", secs),
            None => "Rate limit exceeded".to_string(),
        };
        Self::new(ErrorCode::TooManyRequests, message)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

// ============================================================================
// AXUM INTEGRATION
// ============================================================================

#[derive(Serialize)]
struct ErrorEnvelope<'a> {
    success: bool,
    error: &'a ApiError,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = %self.code, message = %self.message, "Request failed");
        }
        let body = Json(ErrorEnvelope {
            success: false,
            error: &self,
        });
        (status, body).into_response()
    }
}

// ============================================================================
// CONVERSIONS
// ============================================================================

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        ApiError::validation(errors)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict { table, detail } => {
                tracing::debug!(%table, %detail, "Unique constraint violated");
                ApiError::new(ErrorCode::EntityAlreadyExists, detail)
            }
            StoreError::InvalidReference { table, detail } => {
                tracing::debug!(%table, %detail, "Foreign key violated");
                ApiError::invalid_input(detail)
            }
            StoreError::Constraint { table, detail } => {
                tracing::debug!(%table, %detail, "Check constraint violated");
                ApiError::invalid_input(detail)
            }
            StoreError::PoolExhausted => ApiError::connection_pool_exhausted(),
            StoreError::Unavailable(reason) => {
                tracing::error!(%reason, "Store unavailable");
                ApiError::service_unavailable("Database is unavailable")
            }
            StoreError::Query(_) => ApiError::internal_error("Invalid store query"),
            StoreError::Backend(reason) => {
                // Driver messages stay in the logs.
                tracing::error!(%reason, "Store operation failed");
                ApiError::database_error("Database operation failed")
            }
            StoreError::Decode(reason) => {
                tracing::error!(%reason, "Stored row did not decode");
                ApiError::internal_error("Stored data has an unexpected shape")
            }
        }
    }
}

/// Convert from serde_json::Error to ApiError.
impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        tracing::error!("JSON serialization error: {:?}", err);
        ApiError::invalid_input(format!("Invalid JSON: {}", err))
    }
}

// ============================================================================
// RESULT TYPE ALIAS
// ============================================================================

/// Result type alias for API operations.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[test]
    fn test_error_code_status_mapping() {
        assert_eq!(ErrorCode::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ErrorCode::InvalidSignature.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ErrorCode::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(ErrorCode::ValidationFailed.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorCode::EntityNotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorCode::EmailAlreadySubscribed.status_code(), StatusCode::CONFLICT);
        assert_eq!(ErrorCode::TooManyRequests.status_code(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(ErrorCode::InternalError.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(ErrorCode::ServiceUnavailable.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_validation_error_details() {
        let mut errors = ValidationErrors::new();
        errors.add("email", "Invalid email address");
        let err = ApiError::from(errors);

        assert_eq!(err.code, ErrorCode::ValidationFailed);
        let details = err.details.unwrap_or_default();
        assert_eq!(details["fields"]["email"][0], "Invalid email address");
    }

    #[test]
    fn test_store_conflict_maps_to_409() {
        let err = ApiError::from(StoreError::Conflict {
            table: "services",
            detail: "Key (slug)=(seo) already exists.".to_string(),
        });
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_backend_error_hides_driver_message() {
        let err = ApiError::from(StoreError::Backend("relation \"x\" does not exist".to_string()));
        assert_eq!(err.code, ErrorCode::DatabaseError);
        assert!(!err.message.contains("relation"));
    }

    #[tokio::test]
    async fn test_into_response_envelope() -> Result<(), Box<dyn std::error::Error>> {
        let response = ApiError::entity_not_found("Service", "seo").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        let json: serde_json::Value = serde_json::from_slice(&bytes)?;
        assert_eq!(json["success"], false);
        assert_eq!(json["error"]["code"], "ENTITY_NOT_FOUND");
        assert_eq!(json["error"]["message"], "Service seo not found");
        assert!(json["error"].get("details").is_none());
        Ok(())
    }

    #[test]
    fn test_error_display() {
        let err = ApiError::database_error("Connection failed");
        let display = format!("{}", err);
        assert!(display.contains("DatabaseError"));
        assert!(display.contains("Connection failed"));
    }
}
