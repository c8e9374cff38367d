//! # Secret Store Providers
//!
//! Abstract interface for the remote secret store.
//!
//! - `aws`: AWS Secrets Manager implementation
//! - `memory`: in-process implementation that records every call (tests, dry runs)

pub mod aws;
pub mod error;
pub mod memory;

pub use error::StoreError;

use crate::tags::KeyValueTags;
use crate::version::SecretPayload;
use async_trait::async_trait;
use std::collections::BTreeSet;

/// Result of writing a new secret version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutValueOutput {
    pub arn: Option<String>,
    pub version_id: String,
}

/// A secret version as returned by a version-scoped read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretVersionValue {
    pub arn: Option<String>,
    pub version_id: Option<String>,
    pub payload: Option<SecretPayload>,
    pub stages: BTreeSet<String>,
}

/// One entry of the version history listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionSummary {
    pub version_id: String,
    pub stages: Vec<String>,
}

/// One page of the version history listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionPage {
    pub versions: Vec<VersionSummary>,
    /// Continuation token, `None` on the last page
    pub next_token: Option<String>,
}

/// A single staging label move
///
/// With both version ids set the store detaches the label from `remove_from`
/// and attaches it to `move_to` atomically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageMove {
    pub secret_id: String,
    pub label: String,
    pub move_to: Option<String>,
    pub remove_from: Option<String>,
}

impl StageMove {
    /// Attach `label` to `version_id`, detaching it from `remove_from` if given
    pub fn attach(
        secret_id: &str,
        label: &str,
        version_id: &str,
        remove_from: Option<String>,
    ) -> Self {
        Self {
            secret_id: secret_id.to_string(),
            label: label.to_string(),
            move_to: Some(version_id.to_string()),
            remove_from,
        }
    }

    /// Detach `label` from `version_id`
    pub fn detach(secret_id: &str, label: &str, version_id: &str) -> Self {
        Self {
            secret_id: secret_id.to_string(),
            label: label.to_string(),
            move_to: None,
            remove_from: Some(version_id.to_string()),
        }
    }
}

/// Version-scoped operations of the remote secret store
#[async_trait]
pub trait SecretVersionStore: Send + Sync {
    /// Write a new immutable version, returning its id.
    /// An empty `stages` slice lets the store apply its default (`AWSCURRENT`).
    async fn put_value(
        &self,
        secret_id: &str,
        payload: &SecretPayload,
        stages: &[String],
    ) -> Result<PutValueOutput, StoreError>;

    /// Read one specific version
    async fn get_value(
        &self,
        secret_id: &str,
        version_id: &str,
    ) -> Result<SecretVersionValue, StoreError>;

    /// List one page of version history
    async fn list_versions(
        &self,
        secret_id: &str,
        next_token: Option<&str>,
    ) -> Result<VersionPage, StoreError>;

    /// Move, attach, or detach a staging label
    async fn move_stage_label(&self, stage_move: &StageMove) -> Result<(), StoreError>;
}

/// Key-value tags on a secret
#[async_trait]
pub trait TagStore: Send + Sync {
    async fn list_tags(&self, identifier: &str) -> Result<KeyValueTags, StoreError>;

    async fn tag_resource(&self, identifier: &str, tags: &KeyValueTags) -> Result<(), StoreError>;

    async fn untag_resource(&self, identifier: &str, keys: &[String]) -> Result<(), StoreError>;
}
