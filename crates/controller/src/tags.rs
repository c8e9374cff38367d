//! # Tag Sync
//!
//! Key-value tags on a secret and the untag/tag calls needed to move from an
//! old tag set to a new one.

use crate::constants::AWS_RESERVED_TAG_PREFIX;
use crate::provider::TagStore;
use crate::version::VersionError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Ordered key-value tag set
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyValueTags(BTreeMap<String, String>);

impl KeyValueTags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn keys(&self) -> Vec<String> {
        self.0.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Tags present here but absent from `new`
    #[must_use]
    pub fn removed(&self, new: &KeyValueTags) -> KeyValueTags {
        self.0
            .iter()
            .filter(|(k, _)| !new.0.contains_key(*k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Tags in `new` that are missing here or carry a different value
    #[must_use]
    pub fn updated(&self, new: &KeyValueTags) -> KeyValueTags {
        new.0
            .iter()
            .filter(|(k, v)| self.0.get(*k) != Some(*v))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Drop AWS-reserved `aws:` keys
    #[must_use]
    pub fn ignore_aws(&self) -> KeyValueTags {
        self.0
            .iter()
            .filter(|(k, _)| !k.starts_with(AWS_RESERVED_TAG_PREFIX))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

impl FromIterator<(String, String)> for KeyValueTags {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<BTreeMap<String, String>> for KeyValueTags {
    fn from(map: BTreeMap<String, String>) -> Self {
        Self(map)
    }
}

/// Read the tags on a resource
///
/// # Errors
///
/// Returns [`VersionError::TagUpdate`] if the store call fails.
pub async fn list_tags(
    store: &dyn TagStore,
    identifier: &str,
) -> Result<KeyValueTags, VersionError> {
    store
        .list_tags(identifier)
        .await
        .map_err(|source| VersionError::TagUpdate {
            identifier: identifier.to_string(),
            source,
        })
}

/// Move a resource from `old` tags to `new` tags
///
/// Removed keys are untagged first, then new or changed keys are tagged.
/// `aws:` keys are never touched. Each call is skipped when it has nothing to do.
///
/// # Errors
///
/// Returns [`VersionError::TagUpdate`] on the first failed store call.
pub async fn update_tags(
    store: &dyn TagStore,
    identifier: &str,
    old: &KeyValueTags,
    new: &KeyValueTags,
) -> Result<(), VersionError> {
    let removed = old.removed(new).ignore_aws();
    if !removed.is_empty() {
        debug!("Untagging {}: {:?}", identifier, removed.keys());
        store
            .untag_resource(identifier, &removed.keys())
            .await
            .map_err(|source| VersionError::TagUpdate {
                identifier: identifier.to_string(),
                source,
            })?;
    }

    let updated = old.updated(new).ignore_aws();
    if !updated.is_empty() {
        debug!("Tagging {}: {:?}", identifier, updated.keys());
        store
            .tag_resource(identifier, &updated)
            .await
            .map_err(|source| VersionError::TagUpdate {
                identifier: identifier.to_string(),
                source,
            })?;
    }

    Ok(())
}
