//! # Reconciliation Executor
//!
//! Applies a [`StagePlan`] to one secret version as a sequence of label moves.
//!
//! Additions run first. Adding `AWSCURRENT` names the current holder as the
//! version to move it from, so the store demotes and promotes in one call.
//! The demoted version then becomes the target of the removals that follow;
//! without a relocation, removals target the version under reconciliation.
//! Removing `AWSCURRENT` is never attempted: it can only move by being added
//! to another version.
//!
//! Failures are returned as they happen; nothing is rolled back and running
//! the same reconciliation again converges.

use crate::constants::STAGE_CURRENT;
use crate::observability::metrics;
use crate::provider::{SecretVersionStore, StageMove, StoreError};
use crate::version::locator::CurrentHolderCache;
use crate::version::{StagePlan, VersionError};
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// What a reconciliation call did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageOutcome {
    /// Labels attached to the reconciled version
    pub attached: Vec<String>,
    /// Labels detached from the removal target
    pub detached: Vec<String>,
    /// Removals that were not attempted (`AWSCURRENT`)
    pub skipped: Vec<String>,
    /// Version that lost `AWSCURRENT` in this call
    pub previous_holder: Option<String>,
}

impl StageOutcome {
    pub fn moves(&self) -> usize {
        self.attached.len() + self.detached.len()
    }
}

fn stage_error(secret_id: &str, label: &str, source: StoreError) -> VersionError {
    VersionError::StageUpdate {
        secret_id: secret_id.to_string(),
        label: label.to_string(),
        source,
    }
}

/// Apply `plan` to `version_id` of `secret_id`
///
/// # Errors
///
/// Returns [`VersionError::StageUpdate`] for the first failed store call.
pub async fn apply_stage_plan(
    store: &dyn SecretVersionStore,
    secret_id: &str,
    version_id: &str,
    plan: &StagePlan,
) -> Result<StageOutcome, VersionError> {
    let mut outcome = StageOutcome::default();

    let removal_target =
        add_stages(store, secret_id, version_id, &plan.to_add, &mut outcome).await?;
    remove_stages(store, secret_id, &removal_target, &plan.to_remove, &mut outcome).await?;

    Ok(outcome)
}

/// Attach `labels` to `version_id`, returning the target for subsequent removals
async fn add_stages(
    store: &dyn SecretVersionStore,
    secret_id: &str,
    version_id: &str,
    labels: &BTreeSet<String>,
    outcome: &mut StageOutcome,
) -> Result<String, VersionError> {
    let mut current_holder = CurrentHolderCache::default();
    let mut removal_target = version_id.to_string();

    for label in labels {
        let remove_from = if label == STAGE_CURRENT {
            debug!(
                "Going to set {} staging label for secret {} version {}",
                STAGE_CURRENT, secret_id, version_id
            );
            match current_holder
                .get(store, secret_id)
                .await
                .map_err(|source| stage_error(secret_id, label, source))?
            {
                Some(holder) if holder == version_id => {
                    info!(
                        "Secret {} version {} already holds {}, nothing to move",
                        secret_id, version_id, STAGE_CURRENT
                    );
                    continue;
                }
                Some(holder) => {
                    info!(
                        "Moving {} staging label for secret {} from version {} to version {}",
                        STAGE_CURRENT, secret_id, holder, version_id
                    );
                    Some(holder)
                }
                None => {
                    warn!(
                        "No version of secret {} holds {}, attaching it to version {}",
                        secret_id, STAGE_CURRENT, version_id
                    );
                    None
                }
            }
        } else {
            None
        };

        let stage_move = StageMove::attach(secret_id, label, version_id, remove_from);
        debug!("Updating Secrets Manager Secret Version Stage: {:?}", stage_move);
        store
            .move_stage_label(&stage_move)
            .await
            .map_err(|source| stage_error(secret_id, label, source))?;
        metrics::increment_stage_moves("attach");
        outcome.attached.push(label.clone());

        // The freshly demoted version now carries the previous-version role
        if let Some(demoted) = stage_move.remove_from {
            removal_target.clone_from(&demoted);
            outcome.previous_holder = Some(demoted);
        }
    }

    Ok(removal_target)
}

/// Detach `labels` from `removal_target`, never touching `AWSCURRENT`
async fn remove_stages(
    store: &dyn SecretVersionStore,
    secret_id: &str,
    removal_target: &str,
    labels: &BTreeSet<String>,
    outcome: &mut StageOutcome,
) -> Result<(), VersionError> {
    for label in labels {
        // The store rejects removing AWSCURRENT outright; it only moves
        if label == STAGE_CURRENT {
            info!(
                "Skipping removal of {} staging label for secret {} version {}",
                STAGE_CURRENT, secret_id, removal_target
            );
            metrics::increment_stage_removals_skipped();
            outcome.skipped.push(label.clone());
            continue;
        }

        let stage_move = StageMove::detach(secret_id, label, removal_target);
        debug!("Updating Secrets Manager Secret Version Stage: {:?}", stage_move);
        store
            .move_stage_label(&stage_move)
            .await
            .map_err(|source| stage_error(secret_id, label, source))?;
        metrics::increment_stage_moves("detach");
        outcome.detached.push(label.clone());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::STAGE_PREVIOUS;
    use crate::provider::memory::{InMemorySecretStore, StoreOperation};
    use crate::version::SecretPayload;

    fn set(labels: &[&str]) -> BTreeSet<String> {
        labels.iter().map(|l| (*l).to_string()).collect()
    }

    fn payload(value: &str) -> SecretPayload {
        SecretPayload::String(value.to_string())
    }

    #[tokio::test]
    async fn test_promote_to_current_moves_from_old_holder() {
        let store = InMemorySecretStore::new();
        store.insert_version("db", "v1", payload("one"), &[STAGE_CURRENT]);
        store.insert_version("db", "v2", payload("two"), &[]);

        let plan = StagePlan::compute(&set(&[]), &set(&[STAGE_CURRENT]));
        let outcome = apply_stage_plan(&store, "db", "v2", &plan).await.unwrap();

        assert_eq!(
            store.stage_moves(),
            vec![StageMove::attach("db", STAGE_CURRENT, "v2", Some("v1".to_string()))]
        );
        assert_eq!(outcome.previous_holder.as_deref(), Some("v1"));
        assert_eq!(store.holder_of("db", STAGE_CURRENT).as_deref(), Some("v2"));
        assert_eq!(store.holder_of("db", STAGE_PREVIOUS).as_deref(), Some("v1"));
    }

    #[tokio::test]
    async fn test_remove_without_relocation_targets_reconciled_version() {
        let store = InMemorySecretStore::new();
        store.insert_version("db", "v1", payload("one"), &[STAGE_CURRENT]);
        store.insert_version("db", "v2", payload("two"), &["STAGING"]);

        let plan = StagePlan::compute(&set(&["STAGING"]), &set(&[]));
        let outcome = apply_stage_plan(&store, "db", "v2", &plan).await.unwrap();

        assert_eq!(store.stage_moves(), vec![StageMove::detach("db", "STAGING", "v2")]);
        assert_eq!(outcome.detached, vec!["STAGING".to_string()]);
        assert!(store.stages("db", "v2").is_empty());
        // No locator scan was needed
        assert!(store.calls_for(StoreOperation::ListVersions).is_empty());
    }

    #[tokio::test]
    async fn test_removals_after_relocation_target_demoted_version() {
        let store = InMemorySecretStore::new();
        store.insert_version("db", "v1", payload("one"), &[STAGE_CURRENT, "BLUE"]);
        store.insert_version("db", "v2", payload("two"), &[]);

        let plan = StagePlan {
            to_add: set(&[STAGE_CURRENT]),
            to_remove: set(&["BLUE"]),
        };
        apply_stage_plan(&store, "db", "v2", &plan).await.unwrap();

        assert_eq!(
            store.stage_moves(),
            vec![
                StageMove::attach("db", STAGE_CURRENT, "v2", Some("v1".to_string())),
                StageMove::detach("db", "BLUE", "v1"),
            ]
        );
        assert!(!store.stages("db", "v1").contains("BLUE"));
    }

    #[tokio::test]
    async fn test_current_is_never_bare_removed() {
        let store = InMemorySecretStore::new();
        store.insert_version("db", "v1", payload("one"), &[STAGE_CURRENT, "STAGING"]);

        let plan = StagePlan::compute(&set(&[STAGE_CURRENT, "STAGING"]), &set(&[]));
        let outcome = apply_stage_plan(&store, "db", "v1", &plan).await.unwrap();

        assert!(store
            .stage_moves()
            .iter()
            .all(|m| m.label != STAGE_CURRENT));
        assert_eq!(outcome.skipped, vec![STAGE_CURRENT.to_string()]);
        assert_eq!(store.holder_of("db", STAGE_CURRENT).as_deref(), Some("v1"));
    }

    #[tokio::test]
    async fn test_locator_runs_only_when_current_is_added() {
        let store = InMemorySecretStore::new();
        store.insert_version("db", "v1", payload("one"), &[STAGE_CURRENT]);
        store.insert_version("db", "v2", payload("two"), &[]);

        let plan = StagePlan::compute(&set(&[]), &set(&["AWSPENDING", "GREEN"]));
        let outcome = apply_stage_plan(&store, "db", "v2", &plan).await.unwrap();

        assert_eq!(outcome.attached, vec!["AWSPENDING".to_string(), "GREEN".to_string()]);
        assert!(store.calls_for(StoreOperation::ListVersions).is_empty());
        assert!(store.stage_moves().iter().all(|m| m.remove_from.is_none()));
    }

    #[tokio::test]
    async fn test_current_already_on_version_is_not_moved() {
        let store = InMemorySecretStore::new();
        store.insert_version("db", "v1", payload("one"), &[STAGE_CURRENT]);

        // Observed state is stale: it does not show AWSCURRENT on v1
        let plan = StagePlan::compute(&set(&[]), &set(&[STAGE_CURRENT]));
        let outcome = apply_stage_plan(&store, "db", "v1", &plan).await.unwrap();

        assert!(store.stage_moves().is_empty());
        assert_eq!(outcome.moves(), 0);
        assert!(outcome.previous_holder.is_none());
    }

    #[tokio::test]
    async fn test_failure_is_wrapped_with_label() {
        let store = InMemorySecretStore::new();
        store.insert_version("db", "v1", payload("one"), &[STAGE_CURRENT, "STAGING"]);
        store.fail_next(
            StoreOperation::MoveStageLabel,
            StoreError::Transport("connection reset".to_string()),
        );

        let plan = StagePlan::compute(&set(&["STAGING"]), &set(&[]));
        let err = apply_stage_plan(&store, "db", "v1", &plan).await.unwrap_err();

        match err {
            VersionError::StageUpdate {
                secret_id, label, ..
            } => {
                assert_eq!(secret_id, "db");
                assert_eq!(label, "STAGING");
            }
            other => panic!("Expected StageUpdate error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_locator_failure_aborts_before_any_move() {
        let store = InMemorySecretStore::new();
        store.insert_version("db", "v1", payload("one"), &[STAGE_CURRENT]);
        store.insert_version("db", "v2", payload("two"), &[]);
        store.fail_next(
            StoreOperation::ListVersions,
            StoreError::Transport("timeout".to_string()),
        );

        let plan = StagePlan::compute(&set(&[]), &set(&[STAGE_CURRENT]));
        let err = apply_stage_plan(&store, "db", "v2", &plan).await.unwrap_err();

        assert!(matches!(err, VersionError::StageUpdate { ref label, .. } if label == STAGE_CURRENT));
        assert!(store.stage_moves().is_empty());
    }
}
