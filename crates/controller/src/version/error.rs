//! # Version Errors
//!
//! Error taxonomy for secret version operations.

use crate::provider::StoreError;
use thiserror::Error;

/// Errors surfaced by secret version lifecycle and stage reconciliation
#[derive(Debug, Error)]
pub enum VersionError {
    /// Resource id is not `<secret_id>|<version_id>`
    #[error("expected ID in format SecretID|VersionID, received: {0}")]
    InvalidResourceId(String),

    /// `secret_binary` is not valid base64
    #[error("expected base64 in secret_binary: {0}")]
    InvalidBase64(String),

    /// Both `secret_string` and `secret_binary` were provided
    #[error("secret_string and secret_binary are mutually exclusive")]
    ConflictingPayload,

    /// Neither `secret_string` nor `secret_binary` was provided
    #[error("one of secret_string or secret_binary is required")]
    MissingPayload,

    #[error("failed to put value for secret {secret_id}: {source}")]
    Put {
        secret_id: String,
        #[source]
        source: StoreError,
    },

    #[error("failed to read secret version {id}: {source}")]
    Read {
        id: String,
        #[source]
        source: StoreError,
    },

    #[error("failed to read secret version {id}: empty response")]
    EmptyResponse { id: String },

    /// A stage label move failed; the label is kept for context
    #[error("failed to update secret {secret_id} version stage {label}: {source}")]
    StageUpdate {
        secret_id: String,
        label: String,
        #[source]
        source: StoreError,
    },

    #[error("failed to update tags for {identifier}: {source}")]
    TagUpdate {
        identifier: String,
        #[source]
        source: StoreError,
    },
}

impl VersionError {
    /// Validation errors are raised before any remote call
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            VersionError::InvalidResourceId(_)
                | VersionError::InvalidBase64(_)
                | VersionError::ConflictingPayload
                | VersionError::MissingPayload
        )
    }

    /// Short reason string for metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            VersionError::InvalidResourceId(_) => "invalid_resource_id",
            VersionError::InvalidBase64(_) => "invalid_base64",
            VersionError::ConflictingPayload => "conflicting_payload",
            VersionError::MissingPayload => "missing_payload",
            VersionError::Put { .. } => "put",
            VersionError::Read { .. } => "read",
            VersionError::EmptyResponse { .. } => "empty_response",
            VersionError::StageUpdate { .. } => "stage_update",
            VersionError::TagUpdate { .. } => "tag_update",
        }
    }
}
