//! # Secret Version Lifecycle
//!
//! Create, read, update-stages, and delete for one secret version, built on
//! the reader, planner, executor, and deletion path.

use crate::observability::metrics;
use crate::provider::{SecretVersionStore, SecretVersionValue};
use crate::version::delete::{delete_version_stages, DeleteOutcome};
use crate::version::executor::{apply_stage_plan, StageOutcome};
use crate::version::locator::find_current_holder;
use crate::version::reader::{ReadRetryPolicy, RetryingReader};
use crate::version::{ResourceId, SecretPayload, StagePlan, VersionError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, info_span, Instrument};

/// Declared input for a new secret version
#[derive(Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretVersionInput {
    /// Secret name or ARN
    pub secret_id: String,
    #[serde(default)]
    pub secret_string: Option<String>,
    /// Base64-encoded binary value
    #[serde(default)]
    pub secret_binary: Option<String>,
    /// Labels for the new version; `None` lets the store attach `AWSCURRENT`
    #[serde(default)]
    pub version_stages: Option<Vec<String>>,
}

impl std::fmt::Debug for SecretVersionInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretVersionInput")
            .field("secret_id", &self.secret_id)
            .field("secret_string", &self.secret_string.as_ref().map(|_| "<redacted>"))
            .field("secret_binary", &self.secret_binary.as_ref().map(|_| "<redacted>"))
            .field("version_stages", &self.version_stages)
            .finish()
    }
}

/// Observed state of a secret version
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretVersionState {
    /// `<secret_id>|<version_id>`
    pub id: String,
    pub secret_id: String,
    pub version_id: String,
    pub arn: Option<String>,
    pub version_stages: BTreeSet<String>,
    #[serde(skip)]
    pub payload: Option<SecretPayload>,
}

impl SecretVersionState {
    fn from_value(id: &ResourceId, value: SecretVersionValue) -> Self {
        let SecretVersionValue {
            arn,
            version_id,
            payload,
            stages,
        } = value;
        let version_id = version_id.unwrap_or_else(|| id.version_id.clone());
        Self {
            id: ResourceId::new(id.secret_id.clone(), version_id.clone()).encode(),
            secret_id: id.secret_id.clone(),
            version_id,
            arn,
            version_stages: stages,
            payload,
        }
    }

    pub fn resource_id(&self) -> ResourceId {
        ResourceId::new(self.secret_id.clone(), self.version_id.clone())
    }

    pub fn secret_string(&self) -> Option<&str> {
        self.payload.as_ref().and_then(SecretPayload::as_string)
    }

    /// Binary payload as base64
    pub fn secret_binary(&self) -> Option<String> {
        self.payload.as_ref().and_then(SecretPayload::binary_base64)
    }
}

/// Lifecycle operations for secret versions against one store
#[derive(Clone)]
pub struct SecretVersionManager {
    store: Arc<dyn SecretVersionStore>,
    retry_policy: ReadRetryPolicy,
}

impl std::fmt::Debug for SecretVersionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretVersionManager")
            .field("retry_policy", &self.retry_policy)
            .finish_non_exhaustive()
    }
}

impl SecretVersionManager {
    pub fn new(store: Arc<dyn SecretVersionStore>, retry_policy: ReadRetryPolicy) -> Self {
        Self {
            store,
            retry_policy,
        }
    }

    fn reader(&self) -> RetryingReader<'_> {
        RetryingReader::new(self.store.as_ref(), self.retry_policy)
    }

    /// Write a new version and read it back through propagation lag
    ///
    /// # Errors
    ///
    /// Validation errors are returned before any remote call; store failures
    /// are wrapped as [`VersionError::Put`] or [`VersionError::Read`].
    pub async fn create(
        &self,
        input: &SecretVersionInput,
    ) -> Result<SecretVersionState, VersionError> {
        let payload = SecretPayload::from_fields(
            input.secret_string.as_deref(),
            input.secret_binary.as_deref(),
        )?;
        let stages: Vec<String> = input
            .version_stages
            .iter()
            .flatten()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let span = info_span!(
            "secret_version.create",
            secret.id = %input.secret_id,
            payload.binary = payload.is_binary()
        );
        let start = Instant::now();

        async move {
            debug!("Putting Secrets Manager Secret {} value", input.secret_id);
            let output = self
                .store
                .put_value(&input.secret_id, &payload, &stages)
                .await
                .map_err(|source| VersionError::Put {
                    secret_id: input.secret_id.clone(),
                    source,
                })?;

            let id = ResourceId::new(input.secret_id.clone(), output.version_id);
            info!("Created secret version {}", id);

            let value = self
                .reader()
                .read(&id, true)
                .await?
                .ok_or_else(|| VersionError::EmptyResponse { id: id.to_string() })?;
            metrics::observe_lifecycle_duration("create", start.elapsed().as_secs_f64());
            Ok(SecretVersionState::from_value(&id, value))
        }
        .instrument(span)
        .await
    }

    /// Read a pre-existing version; `None` means it is gone
    ///
    /// # Errors
    ///
    /// Returns [`VersionError::Read`] for store failures other than absence.
    pub async fn read(&self, id: &ResourceId) -> Result<Option<SecretVersionState>, VersionError> {
        let span = info_span!(
            "secret_version.read",
            secret.id = %id.secret_id,
            version.id = %id.version_id
        );
        async move {
            Ok(self
                .reader()
                .read(id, false)
                .await?
                .map(|value| SecretVersionState::from_value(id, value)))
        }
        .instrument(span)
        .await
    }

    /// Reconcile labels from `observed` to `desired`
    ///
    /// # Errors
    ///
    /// Returns [`VersionError::StageUpdate`] for the first failed label move.
    pub async fn reconcile_stages(
        &self,
        id: &ResourceId,
        observed: &BTreeSet<String>,
        desired: &BTreeSet<String>,
    ) -> Result<StageOutcome, VersionError> {
        let span = info_span!(
            "secret_version.reconcile_stages",
            secret.id = %id.secret_id,
            version.id = %id.version_id
        );
        let start = Instant::now();

        async move {
            let plan = StagePlan::compute(observed, desired);
            if plan.is_empty() {
                debug!("Stages of secret version {} already match", id);
                return Ok(StageOutcome::default());
            }
            debug!(
                "Stage plan for {}: add {:?}, remove {:?}",
                id, plan.to_add, plan.to_remove
            );

            let outcome =
                apply_stage_plan(self.store.as_ref(), &id.secret_id, &id.version_id, &plan)
                    .await?;
            info!(
                "Reconciled stages of secret version {}: {} moves, {} skipped",
                id,
                outcome.moves(),
                outcome.skipped.len()
            );
            metrics::observe_lifecycle_duration("update", start.elapsed().as_secs_f64());
            Ok(outcome)
        }
        .instrument(span)
        .await
    }

    /// Read observed labels, reconcile them to `desired`, and read back
    ///
    /// Returns `None` if the version is gone.
    ///
    /// # Errors
    ///
    /// Propagates read and stage update failures.
    pub async fn update_stages(
        &self,
        id: &ResourceId,
        desired: &BTreeSet<String>,
    ) -> Result<Option<SecretVersionState>, VersionError> {
        let Some(current) = self.read(id).await? else {
            return Ok(None);
        };
        self.reconcile_stages(id, &current.version_stages, desired)
            .await?;
        self.read(id).await
    }

    /// Detach all removable labels from a version
    ///
    /// # Errors
    ///
    /// Propagates read and stage update failures; absence is success.
    pub async fn delete(&self, id: &ResourceId) -> Result<DeleteOutcome, VersionError> {
        let span = info_span!(
            "secret_version.delete",
            secret.id = %id.secret_id,
            version.id = %id.version_id
        );
        let start = Instant::now();

        async move {
            let Some(current) = self.read(id).await? else {
                return Ok(DeleteOutcome {
                    already_gone: true,
                    ..DeleteOutcome::default()
                });
            };
            let outcome =
                delete_version_stages(self.store.as_ref(), id, &current.version_stages).await?;
            metrics::observe_lifecycle_duration("delete", start.elapsed().as_secs_f64());
            Ok(outcome)
        }
        .instrument(span)
        .await
    }

    /// Version currently holding `AWSCURRENT`
    ///
    /// # Errors
    ///
    /// Returns [`VersionError::Read`] if listing version history fails.
    pub async fn find_current(&self, secret_id: &str) -> Result<Option<String>, VersionError> {
        find_current_holder(self.store.as_ref(), secret_id)
            .await
            .map_err(|source| VersionError::Read {
                id: secret_id.to_string(),
                source,
            })
    }
}
