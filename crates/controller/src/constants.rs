//! # Constants
//!
//! Staging labels, error markers, and configuration defaults.

/// The singleton staging label. Exactly one version per secret holds it and the
/// store only accepts moving it, never removing it outright.
pub const STAGE_CURRENT: &str = "AWSCURRENT";

/// Label the store attaches to the version that last held `AWSCURRENT`
pub const STAGE_PREVIOUS: &str = "AWSPREVIOUS";

/// Delimiter between secret id and version id in a resource id
pub const RESOURCE_ID_DELIMITER: char = '|';

/// Tag keys with this prefix are reserved by AWS and never synced
pub const AWS_RESERVED_TAG_PREFIX: &str = "aws:";

// AWS error codes
pub const ERROR_CODE_RESOURCE_NOT_FOUND: &str = "ResourceNotFoundException";
pub const ERROR_CODE_INVALID_REQUEST: &str = "InvalidRequestException";
pub const ERROR_CODE_INVALID_PARAMETER: &str = "InvalidParameterException";

/// Message fragments AWS returns when a secret is deleted or scheduled for deletion.
/// Both forms have been observed on `InvalidRequestException`.
pub const DELETED_SECRET_MESSAGE_MARKERS: &[&str] =
    &["because it was deleted", "marked for deletion"];

// Configuration defaults
pub const DEFAULT_AWS_REGION: &str = "us-east-1";
pub const DEFAULT_PROPAGATION_TIMEOUT_SECS: u64 = 120;
/// Upper bound for the propagation window (one day)
pub const MAX_PROPAGATION_TIMEOUT_SECS: u64 = 86_400;
pub const DEFAULT_READ_RETRY_MIN_DELAY_MS: u64 = 500;
pub const DEFAULT_READ_RETRY_MAX_DELAY_MS: u64 = 10_000;
pub const DEFAULT_LIST_VERSIONS_PAGE_SIZE: i32 = 100;
