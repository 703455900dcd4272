/// Error handling for the API server
///
/// This module provides a unified error type that maps to HTTP responses.
/// All handlers should return `Result<T, ApiError>` which automatically
/// converts to appropriate HTTP status codes.
///
/// Error bodies share the success envelope and add a machine-readable code:
///
/// ```json
/// { "message": "Task not found", "data": null, "error": "not_found" }
/// ```
///
/// # Example
///
/// ```
/// use taskboard_api::error::{ApiError, ApiResult};
///
/// fn parse_limit(raw: &str) -> ApiResult<u64> {
///     raw.parse()
///         .map_err(|_| ApiError::BadRequest("\"limit\" must be a non-negative integer".to_string()))
/// }
///
/// assert!(parse_limit("10").is_ok());
/// assert!(parse_limit("-1").is_err());
/// ```

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use taskboard_shared::DomainError;
use uuid::Uuid;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400)
    BadRequest(String),

    /// Bad request (400) - required fields missing or malformed
    ValidationError {
        message: String,
        errors: Vec<ValidationErrorDetail>,
    },

    /// Bad request (400) - referenced tasks do not exist
    MissingReferences(Vec<Uuid>),

    /// Not found (404)
    NotFound(String),

    /// Conflict (409) - e.g., duplicate email
    Conflict(String),

    /// Internal server error (500)
    InternalError(String),
}

/// Validation error detail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Field that failed validation
    pub field: String,

    /// Error message
    pub message: String,
}

impl ValidationErrorDetail {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable error message
    pub message: String,

    /// Error detail, or null
    pub data: Value,

    /// Error code (e.g., "bad_request", "not_found")
    pub error: String,
}

impl ApiError {
    /// Status code for this error
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_)
            | ApiError::ValidationError { .. }
            | ApiError::MissingReferences(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::ValidationError { message, errors } => {
                write!(f, "Validation failed: {} ({} errors)", message, errors.len())
            }
            ApiError::MissingReferences(missing) => {
                write!(f, "Missing references: {} tasks", missing.len())
            }
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let (error_code, message, data) = match self {
            ApiError::BadRequest(msg) => ("bad_request", msg, Value::Null),
            ApiError::ValidationError { message, errors } => {
                ("validation_error", message, json!(errors))
            }
            ApiError::MissingReferences(missing) => (
                "missing_references",
                "Some tasks were not found".to_string(),
                json!({ "missingTaskIds": missing }),
            ),
            ApiError::NotFound(msg) => ("not_found", msg, Value::Null),
            ApiError::Conflict(msg) => ("conflict", msg, Value::Null),
            ApiError::InternalError(msg) => {
                // Log internal errors but don't expose details to clients
                tracing::error!("Internal error: {}", msg);
                (
                    "internal_error",
                    "An internal error occurred".to_string(),
                    Value::Null,
                )
            }
        };

        let body = Json(ErrorResponse {
            message,
            data,
            error: error_code.to_string(),
        });

        (status, body).into_response()
    }
}

/// Convert domain errors to API errors
impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::NotFound(msg) => ApiError::NotFound(msg),
            DomainError::InvalidArgument(msg) => ApiError::BadRequest(msg),
            DomainError::Conflict(msg) => ApiError::Conflict(msg),
            DomainError::ReferenceError { missing } => ApiError::MissingReferences(missing),
            DomainError::Unexpected(msg) => ApiError::InternalError(msg),
        }
    }
}

/// Convert malformed JSON bodies to API errors
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// Convert malformed query strings to API errors
impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// Convert validator failures to API errors, keeping one detail per field
impl ApiError {
    pub fn from_validation(message: impl Into<String>, errors: validator::ValidationErrors) -> Self {
        let mut details: Vec<ValidationErrorDetail> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, field_errors)| {
                field_errors.iter().map(move |error| {
                    let message = error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| error.code.to_string());
                    ValidationErrorDetail::new(field.to_string(), message)
                })
            })
            .collect();
        details.sort_by(|a, b| a.field.cmp(&b.field));

        ApiError::ValidationError {
            message: message.into(),
            errors: details,
        }
    }
}
