//! Error types for the mapping operations
//!
//! Errors are classified by who has to act:
//! - Caller: NotFound, InvalidArgument (surfaced as 4xx with the message)
//! - Server: Internal (logged, surfaced as a generic 500)

use thiserror::Error;

use crate::db::DbError;

/// Error returned by every service operation.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    InvalidArgument(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// Returns true if the caller caused this error and can fix the request
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            ServiceError::NotFound(_) | ServiceError::InvalidArgument(_)
        )
    }

    /// HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            ServiceError::NotFound(_) => 404,
            ServiceError::InvalidArgument(_) => 400,
            ServiceError::Internal(_) => 500,
        }
    }
}

impl From<DbError> for ServiceError {
    fn from(err: DbError) -> Self {
        ServiceError::Internal(err.to_string())
    }
}

/// Serializable error body for HTTP responses
#[derive(Debug, Clone, serde::Serialize)]
pub struct ApiError {
    pub error: String,
}

impl ApiError {
    /// Build the body for `err`. Internal detail is replaced with `fallback`.
    pub fn from_service(err: &ServiceError, fallback: &str) -> Self {
        let error = if err.is_caller_error() {
            err.to_string()
        } else {
            fallback.to_string()
        };
        ApiError { error }
    }
}
