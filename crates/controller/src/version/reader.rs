//! # Retrying Reader
//!
//! Reads one secret version, tolerating read-after-write propagation lag.
//!
//! A freshly written version may not be visible yet, so for new resources
//! "not found" and "marked for deletion" are retried with Fibonacci backoff
//! inside a fixed window. When the window elapses one final attempt is made
//! and its outcome is authoritative.
//!
//! For pre-existing resources the same errors mean the version is gone and
//! the read returns `Ok(None)`.

use crate::constants::{
    DEFAULT_PROPAGATION_TIMEOUT_SECS, DEFAULT_READ_RETRY_MAX_DELAY_MS,
    DEFAULT_READ_RETRY_MIN_DELAY_MS, MAX_PROPAGATION_TIMEOUT_SECS,
};
use crate::observability::metrics;
use crate::provider::{SecretVersionStore, SecretVersionValue, StoreError};
use crate::version::backoff::FibonacciBackoff;
use crate::version::{ResourceId, VersionError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Retry window and backoff bounds for reads of new versions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadRetryPolicy {
    pub timeout: Duration,
    pub min_delay: Duration,
    pub max_delay: Duration,
}

impl Default for ReadRetryPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_PROPAGATION_TIMEOUT_SECS),
            min_delay: Duration::from_millis(DEFAULT_READ_RETRY_MIN_DELAY_MS),
            max_delay: Duration::from_millis(DEFAULT_READ_RETRY_MAX_DELAY_MS),
        }
    }
}

/// Version-scoped reader with propagation retry
#[derive(Clone, Copy)]
pub struct RetryingReader<'a> {
    store: &'a dyn SecretVersionStore,
    policy: ReadRetryPolicy,
}

impl std::fmt::Debug for RetryingReader<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryingReader")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl<'a> RetryingReader<'a> {
    pub fn new(store: &'a dyn SecretVersionStore, policy: ReadRetryPolicy) -> Self {
        Self { store, policy }
    }

    /// Read a version
    ///
    /// Returns `Ok(None)` when a pre-existing version (`is_new_resource == false`)
    /// no longer exists.
    ///
    /// # Errors
    ///
    /// - [`VersionError::Read`] for non-retryable store errors, and for absence
    ///   of a new version that outlived the retry window
    /// - [`VersionError::EmptyResponse`] when the store returns no version id
    pub async fn read(
        &self,
        id: &ResourceId,
        is_new_resource: bool,
    ) -> Result<Option<SecretVersionValue>, VersionError> {
        let result = if is_new_resource {
            self.read_with_retry(id).await
        } else {
            self.store.get_value(&id.secret_id, &id.version_id).await
        };

        match result {
            Ok(value) if value.version_id.is_none() => {
                metrics::increment_reads("error");
                Err(VersionError::EmptyResponse { id: id.to_string() })
            }
            Ok(value) => {
                metrics::increment_reads("found");
                Ok(Some(value))
            }
            Err(e) if !is_new_resource && e.is_absent() => {
                warn!("Secrets Manager Secret Version ({}) not found, removing from state", id);
                metrics::increment_reads("absent");
                Ok(None)
            }
            Err(source) => {
                metrics::increment_reads("error");
                Err(VersionError::Read {
                    id: id.to_string(),
                    source,
                })
            }
        }
    }

    async fn read_with_retry(&self, id: &ResourceId) -> Result<SecretVersionValue, StoreError> {
        let start = Instant::now();
        let deadline = start
            .checked_add(self.policy.timeout)
            .or_else(|| start.checked_add(Duration::from_secs(MAX_PROPAGATION_TIMEOUT_SECS)))
            .unwrap_or(start);
        let mut backoff = FibonacciBackoff::new(self.policy.min_delay, self.policy.max_delay);

        loop {
            let now = Instant::now();
            if now >= deadline {
                break;
            }

            match self.store.get_value(&id.secret_id, &id.version_id).await {
                Err(e) if e.is_absent() => {
                    let delay = backoff.next_delay().min(deadline.saturating_duration_since(now));
                    debug!(
                        "Secret version {} not visible yet ({}), retrying in {:?}",
                        id,
                        e.as_str(),
                        delay
                    );
                    metrics::increment_read_retries();
                    tokio::time::sleep(delay).await;
                }
                other => return other,
            }
        }

        warn!(
            "Timed out after {:?} waiting for secret version {} to become readable, making a final attempt",
            self.policy.timeout, id
        );
        self.store.get_value(&id.secret_id, &id.version_id).await
    }
}
