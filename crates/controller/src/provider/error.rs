//! # Store Error Types
//!
//! Classifies remote store failures so callers can tell absence apart from real errors.

use crate::constants::{
    DELETED_SECRET_MESSAGE_MARKERS, ERROR_CODE_INVALID_PARAMETER, ERROR_CODE_INVALID_REQUEST,
    ERROR_CODE_RESOURCE_NOT_FOUND,
};
use thiserror::Error;

/// Remote store failure with classification
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// Secret or version does not exist (or is not visible yet)
    #[error("ResourceNotFoundException: {message}")]
    NotFound { message: String },

    /// Secret is deleted or scheduled for deletion
    #[error("InvalidRequestException: {message}")]
    MarkedForDeletion { message: String },

    /// Request rejected as invalid, e.g. removing `AWSCURRENT` outright
    #[error("InvalidParameterException: {message}")]
    InvalidParameter { message: String },

    /// Any other service error
    #[error("{code}: {message}")]
    Service { code: String, message: String },

    /// No service response (dispatch failure, timeout, I/O)
    #[error("request failed: {0}")]
    Transport(String),
}

impl StoreError {
    /// Classify a service error from its error code and message
    pub fn classify(code: &str, message: &str) -> Self {
        let message = message.to_string();
        match code {
            ERROR_CODE_RESOURCE_NOT_FOUND => StoreError::NotFound { message },
            ERROR_CODE_INVALID_REQUEST
                if DELETED_SECRET_MESSAGE_MARKERS
                    .iter()
                    .any(|marker| message.contains(marker)) =>
            {
                StoreError::MarkedForDeletion { message }
            }
            ERROR_CODE_INVALID_PARAMETER => StoreError::InvalidParameter { message },
            _ => StoreError::Service {
                code: code.to_string(),
                message,
            },
        }
    }

    /// True when the error means the secret or version is gone (or not yet visible)
    pub fn is_absent(&self) -> bool {
        matches!(
            self,
            StoreError::NotFound { .. } | StoreError::MarkedForDeletion { .. }
        )
    }

    /// Get reason string for metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreError::NotFound { .. } => "not_found",
            StoreError::MarkedForDeletion { .. } => "marked_for_deletion",
            StoreError::InvalidParameter { .. } => "invalid_parameter",
            StoreError::Service { .. } => "service",
            StoreError::Transport(_) => "transport",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_not_found() {
        let err = StoreError::classify(
            "ResourceNotFoundException",
            "Secrets Manager can't find the specified secret value for VersionId: v1",
        );
        assert!(matches!(err, StoreError::NotFound { .. }));
        assert!(err.is_absent());
    }

    #[test]
    fn test_classify_deleted_secret() {
        // AWS uses a typographic apostrophe in this message
        let err = StoreError::classify(
            "InvalidRequestException",
            "You can\u{2019}t perform this operation on the secret because it was deleted.",
        );
        assert!(matches!(err, StoreError::MarkedForDeletion { .. }));
        assert!(err.is_absent());

        let err = StoreError::classify(
            "InvalidRequestException",
            "You can't perform this operation on the secret because it was marked for deletion.",
        );
        assert!(err.is_absent());
    }

    #[test]
    fn test_other_invalid_request_is_not_absence() {
        let err = StoreError::classify(
            "InvalidRequestException",
            "You can't create this secret because a secret with this name is already scheduled",
        );
        assert!(matches!(err, StoreError::Service { .. }));
        assert!(!err.is_absent());
    }

    #[test]
    fn test_classify_invalid_parameter() {
        let err = StoreError::classify(
            "InvalidParameterException",
            "You can only move staging label AWSCURRENT to a different secret version.",
        );
        assert_eq!(err.as_str(), "invalid_parameter");
        assert!(!err.is_absent());
    }

    #[test]
    fn test_transport_is_not_absence() {
        let err = StoreError::Transport("dispatch failure".to_string());
        assert!(!err.is_absent());
        assert_eq!(err.to_string(), "request failed: dispatch failure");
    }
}
