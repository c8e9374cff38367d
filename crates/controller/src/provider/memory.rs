//! # In-Memory Secret Store
//!
//! A process-local implementation of [`SecretVersionStore`] and [`TagStore`]
//! that follows the AWS Secrets Manager staging label rules:
//!
//! - every label is attached to at most one version of a secret
//! - `AWSCURRENT` can only be moved, never removed outright
//! - moving a label that is attached elsewhere requires naming that version
//!   in `remove_from`
//! - promoting a version to `AWSCURRENT` tags the demoted version `AWSPREVIOUS`
//!
//! Every call is recorded, and failures can be queued per operation, so tests
//! can assert the exact sequence of remote operations.

use crate::constants::{STAGE_CURRENT, STAGE_PREVIOUS};
use crate::provider::{
    PutValueOutput, SecretVersionStore, SecretVersionValue, StageMove, StoreError, TagStore,
    VersionPage, VersionSummary,
};
use crate::tags::KeyValueTags;
use crate::version::SecretPayload;
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

const DEFAULT_PAGE_SIZE: usize = 100;

/// Remote operation kinds, used to queue failures and filter recorded calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    PutValue,
    GetValue,
    ListVersions,
    MoveStageLabel,
    ListTags,
    TagResource,
    UntagResource,
}

/// A recorded remote call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    PutValue {
        secret_id: String,
        stages: Vec<String>,
    },
    GetValue {
        secret_id: String,
        version_id: String,
    },
    ListVersions {
        secret_id: String,
        next_token: Option<String>,
    },
    MoveStageLabel(StageMove),
    ListTags {
        identifier: String,
    },
    TagResource {
        identifier: String,
        keys: Vec<String>,
    },
    UntagResource {
        identifier: String,
        keys: Vec<String>,
    },
}

impl StoreCall {
    pub fn operation(&self) -> StoreOperation {
        match self {
            StoreCall::PutValue { .. } => StoreOperation::PutValue,
            StoreCall::GetValue { .. } => StoreOperation::GetValue,
            StoreCall::ListVersions { .. } => StoreOperation::ListVersions,
            StoreCall::MoveStageLabel(_) => StoreOperation::MoveStageLabel,
            StoreCall::ListTags { .. } => StoreOperation::ListTags,
            StoreCall::TagResource { .. } => StoreOperation::TagResource,
            StoreCall::UntagResource { .. } => StoreOperation::UntagResource,
        }
    }
}

#[derive(Debug)]
struct VersionRecord {
    version_id: String,
    payload: SecretPayload,
    stages: BTreeSet<String>,
}

#[derive(Debug, Default)]
struct SecretRecord {
    versions: Vec<VersionRecord>,
    tags: KeyValueTags,
    deleted: bool,
    version_counter: u64,
}

impl SecretRecord {
    fn index_of(&self, version_id: &str) -> Option<usize> {
        self.versions
            .iter()
            .position(|v| v.version_id == version_id)
    }

    fn holder(&self, label: &str) -> Option<usize> {
        self.versions.iter().position(|v| v.stages.contains(label))
    }

    fn attach(&mut self, label: &str, index: usize) {
        for version in &mut self.versions {
            version.stages.remove(label);
        }
        self.versions[index].stages.insert(label.to_string());
    }

    fn promote_current(&mut self, index: usize) {
        if let Some(old) = self.holder(STAGE_CURRENT) {
            if old != index {
                self.attach(STAGE_PREVIOUS, old);
            }
        }
        self.attach(STAGE_CURRENT, index);
    }

    fn apply_label(&mut self, label: &str, index: usize) {
        if label == STAGE_CURRENT {
            self.promote_current(index);
        } else {
            self.attach(label, index);
        }
    }

    fn next_version_id(&mut self) -> String {
        loop {
            self.version_counter += 1;
            let candidate = format!("v{}", self.version_counter);
            if self.index_of(&candidate).is_none() {
                return candidate;
            }
        }
    }
}

#[derive(Debug, Default)]
struct State {
    secrets: BTreeMap<String, SecretRecord>,
    calls: Vec<StoreCall>,
    failures: VecDeque<(StoreOperation, StoreError)>,
}

impl State {
    fn secret(&mut self, secret_id: &str) -> Result<&mut SecretRecord, StoreError> {
        match self.secrets.get_mut(secret_id) {
            None => Err(StoreError::NotFound {
                message: format!("Secrets Manager can't find the specified secret: {secret_id}"),
            }),
            Some(secret) if secret.deleted => Err(StoreError::MarkedForDeletion {
                message: "You can't perform this operation on the secret because it was marked for deletion."
                    .to_string(),
            }),
            Some(secret) => Ok(secret),
        }
    }
}

/// In-memory secret store
#[derive(Debug)]
pub struct InMemorySecretStore {
    state: Mutex<State>,
    page_size: usize,
}

impl Default for InMemorySecretStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemorySecretStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Number of versions returned per `list_versions` page
    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn arn_for(secret_id: &str) -> String {
        format!("arn:aws:secretsmanager:us-east-1:000000000000:secret:{secret_id}")
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record the call and pop a queued failure for its operation, if any
    fn begin(&self, call: StoreCall) -> Result<MutexGuard<'_, State>, StoreError> {
        let operation = call.operation();
        debug!("In-memory store call: {:?}", call);
        let mut state = self.lock();
        state.calls.push(call);
        if let Some(position) = state.failures.iter().position(|(op, _)| *op == operation) {
            if let Some((_, error)) = state.failures.remove(position) {
                return Err(error);
            }
        }
        Ok(state)
    }

    /// Create an empty secret
    pub fn create_secret(&self, secret_id: &str) {
        self.lock()
            .secrets
            .entry(secret_id.to_string())
            .or_default();
    }

    /// Seed a version with an explicit id; labels are detached from other versions
    pub fn insert_version(
        &self,
        secret_id: &str,
        version_id: &str,
        payload: SecretPayload,
        stages: &[&str],
    ) {
        let mut state = self.lock();
        let secret = state.secrets.entry(secret_id.to_string()).or_default();
        secret.versions.push(VersionRecord {
            version_id: version_id.to_string(),
            payload,
            stages: BTreeSet::new(),
        });
        let index = secret.versions.len() - 1;
        for stage in stages {
            secret.attach(stage, index);
        }
    }

    /// Schedule a secret for deletion; further calls fail with `MarkedForDeletion`
    pub fn mark_deleted(&self, secret_id: &str) {
        if let Some(secret) = self.lock().secrets.get_mut(secret_id) {
            secret.deleted = true;
        }
    }

    /// Labels currently attached to a version (empty if unknown)
    pub fn stages(&self, secret_id: &str, version_id: &str) -> BTreeSet<String> {
        let state = self.lock();
        state
            .secrets
            .get(secret_id)
            .and_then(|s| s.index_of(version_id).map(|i| s.versions[i].stages.clone()))
            .unwrap_or_default()
    }

    /// Version currently holding `label`
    pub fn holder_of(&self, secret_id: &str, label: &str) -> Option<String> {
        let state = self.lock();
        let secret = state.secrets.get(secret_id)?;
        secret
            .holder(label)
            .map(|i| secret.versions[i].version_id.clone())
    }

    pub fn tags(&self, secret_id: &str) -> KeyValueTags {
        self.lock()
            .secrets
            .get(secret_id)
            .map(|s| s.tags.clone())
            .unwrap_or_default()
    }

    pub fn set_tags(&self, secret_id: &str, tags: KeyValueTags) {
        self.lock()
            .secrets
            .entry(secret_id.to_string())
            .or_default()
            .tags = tags;
    }

    /// Fail the next call of `operation` with `error`
    pub fn fail_next(&self, operation: StoreOperation, error: StoreError) {
        self.lock().failures.push_back((operation, error));
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.lock().calls.clone()
    }

    pub fn calls_for(&self, operation: StoreOperation) -> Vec<StoreCall> {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.operation() == operation)
            .cloned()
            .collect()
    }

    /// Recorded label moves, in call order
    pub fn stage_moves(&self) -> Vec<StageMove> {
        self.lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                StoreCall::MoveStageLabel(m) => Some(m.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }
}

#[async_trait]
impl SecretVersionStore for InMemorySecretStore {
    async fn put_value(
        &self,
        secret_id: &str,
        payload: &SecretPayload,
        stages: &[String],
    ) -> Result<PutValueOutput, StoreError> {
        let mut state = self.begin(StoreCall::PutValue {
            secret_id: secret_id.to_string(),
            stages: stages.to_vec(),
        })?;
        let secret = state.secret(secret_id)?;

        let version_id = secret.next_version_id();
        secret.versions.push(VersionRecord {
            version_id: version_id.clone(),
            payload: payload.clone(),
            stages: BTreeSet::new(),
        });
        let index = secret.versions.len() - 1;

        if stages.is_empty() {
            secret.promote_current(index);
        } else {
            for stage in stages {
                secret.apply_label(stage, index);
            }
        }

        Ok(PutValueOutput {
            arn: Some(Self::arn_for(secret_id)),
            version_id,
        })
    }

    async fn get_value(
        &self,
        secret_id: &str,
        version_id: &str,
    ) -> Result<SecretVersionValue, StoreError> {
        let mut state = self.begin(StoreCall::GetValue {
            secret_id: secret_id.to_string(),
            version_id: version_id.to_string(),
        })?;
        let secret = state.secret(secret_id)?;
        let index = secret.index_of(version_id).ok_or_else(|| StoreError::NotFound {
            message: format!(
                "Secrets Manager can't find the specified secret value for VersionId: {version_id}"
            ),
        })?;
        let version = &secret.versions[index];

        Ok(SecretVersionValue {
            arn: Some(Self::arn_for(secret_id)),
            version_id: Some(version.version_id.clone()),
            payload: Some(version.payload.clone()),
            stages: version.stages.clone(),
        })
    }

    async fn list_versions(
        &self,
        secret_id: &str,
        next_token: Option<&str>,
    ) -> Result<VersionPage, StoreError> {
        let page_size = self.page_size;
        let mut state = self.begin(StoreCall::ListVersions {
            secret_id: secret_id.to_string(),
            next_token: next_token.map(str::to_string),
        })?;
        let secret = state.secret(secret_id)?;

        let start = match next_token {
            None => 0,
            Some(token) => token
                .parse::<usize>()
                .ok()
                .filter(|offset| *offset <= secret.versions.len())
                .ok_or_else(|| StoreError::Service {
                    code: "InvalidNextTokenException".to_string(),
                    message: format!("The NextToken value {token} is not valid"),
                })?,
        };
        let end = (start + page_size).min(secret.versions.len());

        let versions = secret.versions[start..end]
            .iter()
            .map(|v| VersionSummary {
                version_id: v.version_id.clone(),
                stages: v.stages.iter().cloned().collect(),
            })
            .collect();
        let next_token = (end < secret.versions.len()).then(|| end.to_string());

        Ok(VersionPage {
            versions,
            next_token,
        })
    }

    async fn move_stage_label(&self, stage_move: &StageMove) -> Result<(), StoreError> {
        let mut state = self.begin(StoreCall::MoveStageLabel(stage_move.clone()))?;
        let secret = state.secret(&stage_move.secret_id)?;
        let label = stage_move.label.as_str();

        match (&stage_move.move_to, &stage_move.remove_from) {
            (Some(move_to), remove_from) => {
                let target = secret.index_of(move_to).ok_or_else(|| StoreError::NotFound {
                    message: format!(
                        "Secrets Manager can't find the specified secret value for VersionId: {move_to}"
                    ),
                })?;
                if let Some(holder) = secret.holder(label) {
                    let holder_id = secret.versions[holder].version_id.as_str();
                    if holder != target && remove_from.as_deref() != Some(holder_id) {
                        return Err(StoreError::InvalidParameter {
                            message: format!(
                                "The parameter RemoveFromVersionId doesn't match. Staging label {label} is currently attached to version {holder_id}, but you have specified {}",
                                remove_from.as_deref().unwrap_or("none")
                            ),
                        });
                    }
                }
                secret.apply_label(label, target);
                Ok(())
            }
            (None, Some(remove_from)) => {
                if label == STAGE_CURRENT {
                    return Err(StoreError::InvalidParameter {
                        message: "You can only move staging label AWSCURRENT to a different secret version. It can\u{2019}t be completely removed."
                            .to_string(),
                    });
                }
                let index = secret.index_of(remove_from).ok_or_else(|| StoreError::NotFound {
                    message: format!(
                        "Secrets Manager can't find the specified secret value for VersionId: {remove_from}"
                    ),
                })?;
                secret.versions[index].stages.remove(label);
                Ok(())
            }
            (None, None) => Err(StoreError::InvalidParameter {
                message: "You must specify MoveToVersionId, RemoveFromVersionId, or both"
                    .to_string(),
            }),
        }
    }
}

#[async_trait]
impl TagStore for InMemorySecretStore {
    async fn list_tags(&self, identifier: &str) -> Result<KeyValueTags, StoreError> {
        let mut state = self.begin(StoreCall::ListTags {
            identifier: identifier.to_string(),
        })?;
        Ok(state.secret(identifier)?.tags.clone())
    }

    async fn tag_resource(&self, identifier: &str, tags: &KeyValueTags) -> Result<(), StoreError> {
        let mut state = self.begin(StoreCall::TagResource {
            identifier: identifier.to_string(),
            keys: tags.keys(),
        })?;
        let secret = state.secret(identifier)?;
        for (key, value) in tags.iter() {
            secret.tags.insert(key, value);
        }
        Ok(())
    }

    async fn untag_resource(&self, identifier: &str, keys: &[String]) -> Result<(), StoreError> {
        let mut state = self.begin(StoreCall::UntagResource {
            identifier: identifier.to_string(),
            keys: keys.to_vec(),
        })?;
        let secret = state.secret(identifier)?;
        for key in keys {
            secret.tags.remove(key);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(value: &str) -> SecretPayload {
        SecretPayload::String(value.to_string())
    }

    #[tokio::test]
    async fn test_put_value_defaults_to_current_and_demotes_previous() {
        let store = InMemorySecretStore::new();
        store.create_secret("db");

        let first = store.put_value("db", &payload("one"), &[]).await.unwrap();
        let second = store.put_value("db", &payload("two"), &[]).await.unwrap();

        assert_eq!(
            store.holder_of("db", STAGE_CURRENT).as_deref(),
            Some(second.version_id.as_str())
        );
        assert_eq!(
            store.holder_of("db", STAGE_PREVIOUS).as_deref(),
            Some(first.version_id.as_str())
        );
    }

    #[tokio::test]
    async fn test_current_cannot_be_removed_outright() {
        let store = InMemorySecretStore::new();
        store.insert_version("db", "v1", payload("one"), &[STAGE_CURRENT]);

        let err = store
            .move_stage_label(&StageMove::detach("db", STAGE_CURRENT, "v1"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidParameter { .. }));
        assert_eq!(store.holder_of("db", STAGE_CURRENT).as_deref(), Some("v1"));
    }

    #[tokio::test]
    async fn test_move_requires_matching_remove_from() {
        let store = InMemorySecretStore::new();
        store.insert_version("db", "v1", payload("one"), &[STAGE_CURRENT]);
        store.insert_version("db", "v2", payload("two"), &[]);

        let err = store
            .move_stage_label(&StageMove::attach("db", STAGE_CURRENT, "v2", None))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidParameter { .. }));

        store
            .move_stage_label(&StageMove::attach(
                "db",
                STAGE_CURRENT,
                "v2",
                Some("v1".to_string()),
            ))
            .await
            .unwrap();
        assert_eq!(store.holder_of("db", STAGE_CURRENT).as_deref(), Some("v2"));
        assert_eq!(store.holder_of("db", STAGE_PREVIOUS).as_deref(), Some("v1"));
    }

    #[tokio::test]
    async fn test_list_versions_paginates() {
        let store = InMemorySecretStore::new().with_page_size(2);
        for id in ["v1", "v2", "v3"] {
            store.insert_version("db", id, payload(id), &[]);
        }

        let first = store.list_versions("db", None).await.unwrap();
        assert_eq!(first.versions.len(), 2);
        let token = first.next_token.unwrap();

        let second = store.list_versions("db", Some(&token)).await.unwrap();
        assert_eq!(second.versions.len(), 1);
        assert_eq!(second.versions[0].version_id, "v3");
        assert!(second.next_token.is_none());
    }

    #[tokio::test]
    async fn test_queued_failure_is_returned_once() {
        let store = InMemorySecretStore::new();
        store.insert_version("db", "v1", payload("one"), &[STAGE_CURRENT]);
        store.fail_next(
            StoreOperation::GetValue,
            StoreError::Transport("connection reset".to_string()),
        );

        assert!(store.get_value("db", "v1").await.is_err());
        assert!(store.get_value("db", "v1").await.is_ok());
        assert_eq!(store.calls_for(StoreOperation::GetValue).len(), 2);
    }

    #[tokio::test]
    async fn test_deleted_secret_reports_marked_for_deletion() {
        let store = InMemorySecretStore::new();
        store.insert_version("db", "v1", payload("one"), &[STAGE_CURRENT]);
        store.mark_deleted("db");

        let err = store.get_value("db", "v1").await.unwrap_err();
        assert!(matches!(err, StoreError::MarkedForDeletion { .. }));
    }
}
