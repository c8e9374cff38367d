//! # Deletion Path
//!
//! Detaches every staging label from a version that leaves the desired state.
//! `AWSCURRENT` stays in place with a warning: there is no version to move it
//! to, and the store rejects removing it outright.

use crate::constants::STAGE_CURRENT;
use crate::observability::metrics;
use crate::provider::{SecretVersionStore, StageMove};
use crate::version::{ResourceId, VersionError};
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// What the deletion path did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub detached: Vec<String>,
    /// Labels left on the version (`AWSCURRENT`)
    pub retained: Vec<String>,
    /// The secret or version was already gone
    pub already_gone: bool,
}

/// Detach `stages` from the version identified by `id`
///
/// # Errors
///
/// Returns [`VersionError::StageUpdate`] for store failures other than absence.
pub async fn delete_version_stages(
    store: &dyn SecretVersionStore,
    id: &ResourceId,
    stages: &BTreeSet<String>,
) -> Result<DeleteOutcome, VersionError> {
    let mut outcome = DeleteOutcome::default();

    for label in stages {
        if label == STAGE_CURRENT {
            warn!(
                "Cannot remove {} staging label, which may leave the secret {} version {} active",
                STAGE_CURRENT, id.secret_id, id.version_id
            );
            metrics::increment_stage_removals_skipped();
            outcome.retained.push(label.clone());
            continue;
        }

        let stage_move = StageMove::detach(&id.secret_id, label, &id.version_id);
        debug!("Updating Secrets Manager Secret Version Stage: {:?}", stage_move);
        match store.move_stage_label(&stage_move).await {
            Ok(()) => {
                metrics::increment_stage_moves("detach");
                outcome.detached.push(label.clone());
            }
            Err(e) if e.is_absent() => {
                info!("Secret version {} already deleted ({})", id, e.as_str());
                outcome.already_gone = true;
                return Ok(outcome);
            }
            Err(source) => {
                return Err(VersionError::StageUpdate {
                    secret_id: id.secret_id.clone(),
                    label: label.clone(),
                    source,
                });
            }
        }
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::memory::{InMemorySecretStore, StoreOperation};
    use crate::provider::StoreError;
    use crate::version::SecretPayload;

    fn set(labels: &[&str]) -> BTreeSet<String> {
        labels.iter().map(|l| (*l).to_string()).collect()
    }

    #[tokio::test]
    async fn test_detaches_everything_but_current() {
        let store = InMemorySecretStore::new();
        store.insert_version(
            "db",
            "v1",
            SecretPayload::String("one".to_string()),
            &[STAGE_CURRENT, "BLUE", "GREEN"],
        );
        let id = ResourceId::new("db", "v1");

        let outcome = delete_version_stages(&store, &id, &set(&[STAGE_CURRENT, "BLUE", "GREEN"]))
            .await
            .unwrap();

        assert_eq!(outcome.detached, vec!["BLUE".to_string(), "GREEN".to_string()]);
        assert_eq!(outcome.retained, vec![STAGE_CURRENT.to_string()]);
        assert_eq!(store.stages("db", "v1"), set(&[STAGE_CURRENT]));
        assert!(store.stage_moves().iter().all(|m| m.label != STAGE_CURRENT));
    }

    #[tokio::test]
    async fn test_absent_secret_is_success() {
        let store = InMemorySecretStore::new();
        let id = ResourceId::new("gone", "v1");

        let outcome = delete_version_stages(&store, &id, &set(&["BLUE", "GREEN"]))
            .await
            .unwrap();

        assert!(outcome.already_gone);
        assert_eq!(store.calls_for(StoreOperation::MoveStageLabel).len(), 1);
    }

    #[tokio::test]
    async fn test_other_errors_are_fatal() {
        let store = InMemorySecretStore::new();
        store.insert_version("db", "v1", SecretPayload::String("one".to_string()), &["BLUE"]);
        store.fail_next(
            StoreOperation::MoveStageLabel,
            StoreError::Service {
                code: "AccessDeniedException".to_string(),
                message: "denied".to_string(),
            },
        );

        let err = delete_version_stages(&store, &ResourceId::new("db", "v1"), &set(&["BLUE"]))
            .await
            .unwrap_err();
        assert!(matches!(err, VersionError::StageUpdate { .. }));
    }
}
