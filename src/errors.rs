use serde::Serialize;

/// Unified error type for store and persistence operations.
///
/// Business-rule violations (duplicate SKU, oversell) are raised by the CLI
/// handlers before they reach the store; the store itself only fails on
/// missing records and on persistence problems.
#[derive(Debug, thiserror::Error, Serialize)]
pub enum ServiceError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Insufficient stock: {0}")]
    InsufficientStock(String),

    #[error("Duplicate SKU: {0}")]
    DuplicateSku(String),

    #[error("Storage error: {0}")]
    StorageError(
        #[from]
        #[serde(skip)]
        std::io::Error,
    ),

    #[error("Serialization error: {0}")]
    SerializationError(
        #[from]
        #[serde(skip)]
        serde_json::Error,
    ),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

impl ServiceError {
    /// True for errors caused by user input rather than the environment.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_)
                | Self::ValidationError(_)
                | Self::InvalidInput(_)
                | Self::InsufficientStock(_)
                | Self::DuplicateSku(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_facing_errors_include_the_message() {
        assert_eq!(
            ServiceError::NotFound("item 42".into()).to_string(),
            "Not found: item 42"
        );
        assert_eq!(
            ServiceError::DuplicateSku("WID-1".into()).to_string(),
            "Duplicate SKU: WID-1"
        );
        assert_eq!(
            ServiceError::InsufficientStock("only 3 left".into()).to_string(),
            "Insufficient stock: only 3 left"
        );
    }

    #[test]
    fn error_classification() {
        assert!(ServiceError::DuplicateSku("x".into()).is_user_error());
        assert!(ServiceError::InsufficientStock("x".into()).is_user_error());
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        assert!(!ServiceError::StorageError(io).is_user_error());
    }
}
