//! # Current-Holder Locator
//!
//! Finds which version of a secret carries `AWSCURRENT` by paging through
//! version history. The store guarantees a single holder, so the scan stops
//! at the first match and later pages are never requested.

use crate::constants::STAGE_CURRENT;
use crate::observability::metrics;
use crate::provider::{SecretVersionStore, StoreError};
use tracing::debug;

/// Scan version history for the `AWSCURRENT` holder
///
/// Returns `Ok(None)` if no version carries the label.
///
/// # Errors
///
/// Returns the store error of the first failed page request.
pub async fn find_current_holder(
    store: &dyn SecretVersionStore,
    secret_id: &str,
) -> Result<Option<String>, StoreError> {
    let mut next_token: Option<String> = None;
    let mut pages = 0_u32;

    loop {
        let page = store.list_versions(secret_id, next_token.as_deref()).await?;
        pages += 1;
        metrics::increment_locator_pages();

        if let Some(version) = page
            .versions
            .iter()
            .find(|v| v.stages.iter().any(|s| s == STAGE_CURRENT))
        {
            debug!(
                "Secret {} version {} holds {} (found on page {})",
                secret_id, version.version_id, STAGE_CURRENT, pages
            );
            return Ok(Some(version.version_id.clone()));
        }

        match page.next_token {
            Some(token) => next_token = Some(token),
            None => {
                debug!(
                    "No version of secret {} holds {} ({} pages scanned)",
                    secret_id, STAGE_CURRENT, pages
                );
                return Ok(None);
            }
        }
    }
}

/// `AWSCURRENT` holder memoized for one reconciliation call
///
/// The answer changes as a side effect of moving labels, so it must not be
/// shared between calls.
#[derive(Debug, Default)]
pub struct CurrentHolderCache {
    resolved: Option<Option<String>>,
}

impl CurrentHolderCache {
    /// Locate the holder on first use, then return the cached answer
    ///
    /// # Errors
    ///
    /// Returns the store error if the scan fails; failures are not cached.
    pub async fn get(
        &mut self,
        store: &dyn SecretVersionStore,
        secret_id: &str,
    ) -> Result<Option<String>, StoreError> {
        if let Some(holder) = &self.resolved {
            return Ok(holder.clone());
        }
        let holder = find_current_holder(store, secret_id).await?;
        self.resolved = Some(holder.clone());
        Ok(holder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::memory::{InMemorySecretStore, StoreCall, StoreOperation};
    use crate::version::SecretPayload;

    fn store_with_history(page_size: usize, current: &str, count: usize) -> InMemorySecretStore {
        let store = InMemorySecretStore::new().with_page_size(page_size);
        for n in 1..=count {
            let id = format!("v{n}");
            let stages: &[&str] = if id == current { &[STAGE_CURRENT] } else { &[] };
            store.insert_version("db", &id, SecretPayload::String(id.clone()), stages);
        }
        store
    }

    #[tokio::test]
    async fn test_stops_on_first_page() {
        let store = store_with_history(2, "v1", 6);

        let holder = find_current_holder(&store, "db").await.unwrap();

        assert_eq!(holder.as_deref(), Some("v1"));
        assert_eq!(
            store.calls(),
            vec![StoreCall::ListVersions {
                secret_id: "db".to_string(),
                next_token: None,
            }]
        );
    }

    #[tokio::test]
    async fn test_follows_continuation_tokens() {
        let store = store_with_history(2, "v5", 6);

        let holder = find_current_holder(&store, "db").await.unwrap();

        assert_eq!(holder.as_deref(), Some("v5"));
        assert_eq!(store.calls_for(StoreOperation::ListVersions).len(), 3);
    }

    #[tokio::test]
    async fn test_no_holder_scans_all_pages() {
        let store = store_with_history(2, "none", 5);

        let holder = find_current_holder(&store, "db").await.unwrap();

        assert!(holder.is_none());
        assert_eq!(store.calls_for(StoreOperation::ListVersions).len(), 3);
    }

    #[tokio::test]
    async fn test_cache_scans_once() {
        let store = store_with_history(10, "v2", 3);
        let mut cache = CurrentHolderCache::default();

        let first = cache.get(&store, "db").await.unwrap();
        let second = cache.get(&store, "db").await.unwrap();

        assert_eq!(first.as_deref(), Some("v2"));
        assert_eq!(first, second);
        assert_eq!(store.calls_for(StoreOperation::ListVersions).len(), 1);
    }

    #[tokio::test]
    async fn test_list_error_propagates() {
        let store = InMemorySecretStore::new();

        let err = find_current_holder(&store, "missing").await.unwrap_err();
        assert!(err.is_absent());
    }
}
