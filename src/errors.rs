use sea_orm::error::DbErr;
use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;

/// Errors surfaced by the rental core services.
///
/// Validation failures carry the full field-keyed error map from the
/// `validator` crate so callers can render per-field messages. Lifecycle
/// violations are a single message that vetoes a destroy attempt before any
/// state is touched.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] DbErr),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(ValidationErrors),

    #[error("Lifecycle violation: {0}")]
    LifecycleViolation(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ServiceError {
    /// Returns true when the error represents a rejected (but well-formed)
    /// request rather than an infrastructure failure.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ServiceError::NotFound(_)
                | ServiceError::ValidationError(_)
                | ServiceError::LifecycleViolation(_)
                | ServiceError::InvalidOperation(_)
                | ServiceError::InvalidInput(_)
        )
    }
}

/// Flat error payload for callers that serialize errors outward.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl From<&ServiceError> for ErrorResponse {
    fn from(err: &ServiceError) -> Self {
        let error = match err {
            ServiceError::DatabaseError(_) => "Database Error",
            ServiceError::NotFound(_) => "Not Found",
            ServiceError::ValidationError(_) => "Validation Error",
            ServiceError::LifecycleViolation(_) => "Lifecycle Violation",
            ServiceError::InvalidOperation(_) => "Invalid Operation",
            ServiceError::InvalidInput(_) => "Invalid Input",
            ServiceError::InternalError(_) => "Internal Error",
        };
        Self {
            error: error.to_string(),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_are_classified() {
        assert!(ServiceError::NotFound("rental 7".into()).is_client_error());
        assert!(ServiceError::LifecycleViolation("in progress".into()).is_client_error());
        assert!(!ServiceError::InternalError("boom".into()).is_client_error());
    }

    #[test]
    fn error_response_carries_category_and_message() {
        let err = ServiceError::NotFound("Rental 42 not found".into());
        let resp = ErrorResponse::from(&err);
        assert_eq!(resp.error, "Not Found");
        assert_eq!(resp.message, "Not found: Rental 42 not found");
    }
}
