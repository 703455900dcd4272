/// Domain error taxonomy
///
/// Every service and reconciler operation returns `DomainResult<T>`. The API
/// crate maps each variant onto an HTTP status; nothing here knows about HTTP.

use crate::store::StoreError;
use uuid::Uuid;

/// Domain result type alias
pub type DomainResult<T> = Result<T, DomainError>;

/// Failures surfaced by the assignment reconciler and the services built on it
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    /// An entity id did not resolve
    #[error("{0}")]
    NotFound(String),

    /// Malformed id, missing required field, unparseable date or list encoding
    #[error("{0}")]
    InvalidArgument(String),

    /// A unique field collided with an existing document
    #[error("{0}")]
    Conflict(String),

    /// Some requested task ids do not exist
    #[error("Some tasks were not found")]
    ReferenceError {
        /// Missing ids, in the order they were requested
        missing: Vec<Uuid>,
    },

    /// Storage or network failure
    #[error("Unexpected failure: {0}")]
    Unexpected(String),
}

impl DomainError {
    /// Shorthand for `NotFound`
    pub fn not_found(message: impl Into<String>) -> Self {
        DomainError::NotFound(message.into())
    }

    /// Shorthand for `InvalidArgument`
    pub fn invalid(message: impl Into<String>) -> Self {
        DomainError::InvalidArgument(message.into())
    }
}

impl From<StoreError> for DomainError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate { field } if field == "email" => {
                DomainError::Conflict("Email already exists".to_string())
            }
            StoreError::Duplicate { .. } => {
                DomainError::Conflict("Duplicate value violates unique constraint".to_string())
            }
            other => DomainError::Unexpected(other.to_string()),
        }
    }
}
