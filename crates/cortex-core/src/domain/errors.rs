//! Domain error types
//!
//! This module defines error types specific to domain operations,
//! mostly validation failures raised while constructing newtypes.

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Invalid email address format
    #[error("Invalid email format: {0}")]
    InvalidEmail(String),

    /// Invalid remote file ID format
    #[error("Invalid remote file ID: {0}")]
    InvalidRemoteId(String),

    /// Size value is not a non-negative decimal integer
    #[error("Invalid byte size: {0}")]
    InvalidSize(String),

    /// ID parsing error
    #[error("Invalid ID format: {0}")]
    InvalidId(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DomainError::InvalidEmail("notanemail".to_string());
        assert_eq!(err.to_string(), "Invalid email format: notanemail");

        let err = DomainError::InvalidSize("-1".to_string());
        assert_eq!(err.to_string(), "Invalid byte size: -1");
    }

    #[test]
    fn test_error_equality() {
        let err1 = DomainError::InvalidRemoteId("a b".to_string());
        let err2 = DomainError::InvalidRemoteId("a b".to_string());
        let err3 = DomainError::InvalidRemoteId("c".to_string());

        assert_eq!(err1, err2);
        assert_ne!(err1, err3);
    }
}
