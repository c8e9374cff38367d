//! # Controller Settings
//!
//! AWS client and read-retry settings loaded from environment variables.

use crate::version::ReadRetryPolicy;
use std::time::Duration;

/// Controller configuration
///
/// All settings have sensible defaults and can be overridden via environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    /// AWS region for the Secrets Manager client
    pub region: String,
    /// Optional endpoint override (LocalStack, mock servers)
    pub endpoint_url: Option<String>,
    /// How long a freshly created version may stay invisible to reads (seconds)
    pub propagation_timeout_secs: u64,
    /// First backoff step between read attempts (milliseconds)
    pub read_retry_min_delay_ms: u64,
    /// Upper bound for a single backoff step (milliseconds)
    pub read_retry_max_delay_ms: u64,
    /// Page size used when scanning version history
    pub list_versions_page_size: i32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        use crate::constants::*;
        Self {
            region: DEFAULT_AWS_REGION.to_string(),
            endpoint_url: None,
            propagation_timeout_secs: DEFAULT_PROPAGATION_TIMEOUT_SECS,
            read_retry_min_delay_ms: DEFAULT_READ_RETRY_MIN_DELAY_MS,
            read_retry_max_delay_ms: DEFAULT_READ_RETRY_MAX_DELAY_MS,
            list_versions_page_size: DEFAULT_LIST_VERSIONS_PAGE_SIZE,
        }
    }
}

impl ControllerConfig {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        use crate::constants::*;
        Self {
            region: std::env::var("AWS_REGION")
                .or_else(|_| std::env::var("AWS_DEFAULT_REGION"))
                .unwrap_or_else(|_| DEFAULT_AWS_REGION.to_string()),
            endpoint_url: std::env::var("AWS_SECRETS_MANAGER_ENDPOINT")
                .ok()
                .filter(|v| !v.trim().is_empty()),
            propagation_timeout_secs: env_var_or_default(
                "PROPAGATION_TIMEOUT_SECS",
                DEFAULT_PROPAGATION_TIMEOUT_SECS,
            ),
            read_retry_min_delay_ms: env_var_or_default(
                "READ_RETRY_MIN_DELAY_MS",
                DEFAULT_READ_RETRY_MIN_DELAY_MS,
            ),
            read_retry_max_delay_ms: env_var_or_default(
                "READ_RETRY_MAX_DELAY_MS",
                DEFAULT_READ_RETRY_MAX_DELAY_MS,
            ),
            list_versions_page_size: env_var_or_default(
                "LIST_VERSIONS_PAGE_SIZE",
                DEFAULT_LIST_VERSIONS_PAGE_SIZE,
            ),
        }
    }

    /// Retry policy for reads of freshly written versions
    pub fn read_retry_policy(&self) -> ReadRetryPolicy {
        ReadRetryPolicy {
            timeout: Duration::from_secs(
                self.propagation_timeout_secs
                    .min(crate::constants::MAX_PROPAGATION_TIMEOUT_SECS),
            ),
            min_delay: Duration::from_millis(self.read_retry_min_delay_ms),
            max_delay: Duration::from_millis(self.read_retry_max_delay_ms),
        }
    }
}

/// Read environment variable or return default value
fn env_var_or_default<T: std::str::FromStr>(key: &str, default: T) -> T
where
    <T as std::str::FromStr>::Err: std::fmt::Debug,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
