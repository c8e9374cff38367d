//! # AWS Secrets Manager Operations
//!
//! [`SecretVersionStore`] implementation for AWS Secrets Manager.

use super::{record, store_error, AwsSecretVersionStore};
use crate::provider::{
    PutValueOutput, SecretVersionStore, SecretVersionValue, StageMove, StoreError, VersionPage,
    VersionSummary,
};
use crate::version::SecretPayload;
use async_trait::async_trait;
use aws_sdk_secretsmanager::primitives::Blob;
use std::time::Instant;
use tracing::{debug, debug_span, Instrument};

#[async_trait]
impl SecretVersionStore for AwsSecretVersionStore {
    async fn put_value(
        &self,
        secret_id: &str,
        payload: &SecretPayload,
        stages: &[String],
    ) -> Result<PutValueOutput, StoreError> {
        let span = debug_span!("aws.secretsmanager.put_secret_value", secret.id = secret_id);
        let start = Instant::now();

        async move {
            let mut request = self.client.put_secret_value().secret_id(secret_id);
            request = match payload {
                SecretPayload::String(value) => request.secret_string(value.as_str()),
                SecretPayload::Binary(bytes) => request.secret_binary(Blob::new(bytes.clone())),
            };
            if !stages.is_empty() {
                request = request.set_version_stages(Some(stages.to_vec()));
            }

            let result = request
                .send()
                .await
                .map_err(|e| store_error(&e))
                .and_then(|output| {
                    let version_id =
                        output
                            .version_id()
                            .map(str::to_string)
                            .ok_or_else(|| StoreError::Service {
                                code: "EmptyResponse".to_string(),
                                message: format!(
                                    "PutSecretValue for {secret_id} returned no VersionId"
                                ),
                            })?;
                    Ok(PutValueOutput {
                        arn: output.arn().map(str::to_string),
                        version_id,
                    })
                });
            record("put_secret_value", start, &result);
            result
        }
        .instrument(span)
        .await
    }

    async fn get_value(
        &self,
        secret_id: &str,
        version_id: &str,
    ) -> Result<SecretVersionValue, StoreError> {
        let span = debug_span!(
            "aws.secretsmanager.get_secret_value",
            secret.id = secret_id,
            version.id = version_id
        );
        let start = Instant::now();

        async move {
            let result = self
                .client
                .get_secret_value()
                .secret_id(secret_id)
                .version_id(version_id)
                .send()
                .await
                .map_err(|e| store_error(&e))
                .map(|output| {
                    let payload = match (output.secret_string(), output.secret_binary()) {
                        (Some(value), _) => Some(SecretPayload::String(value.to_string())),
                        (None, Some(blob)) => Some(SecretPayload::Binary(blob.as_ref().to_vec())),
                        (None, None) => None,
                    };
                    SecretVersionValue {
                        arn: output.arn().map(str::to_string),
                        version_id: output.version_id().map(str::to_string),
                        payload,
                        stages: output.version_stages().iter().cloned().collect(),
                    }
                });
            record("get_secret_value", start, &result);
            result
        }
        .instrument(span)
        .await
    }

    async fn list_versions(
        &self,
        secret_id: &str,
        next_token: Option<&str>,
    ) -> Result<VersionPage, StoreError> {
        let span = debug_span!("aws.secretsmanager.list_secret_version_ids", secret.id = secret_id);
        let start = Instant::now();

        async move {
            let result = self
                .client
                .list_secret_version_ids()
                .secret_id(secret_id)
                .max_results(self.page_size)
                .set_next_token(next_token.map(str::to_string))
                .send()
                .await
                .map_err(|e| store_error(&e))
                .map(|output| VersionPage {
                    versions: output
                        .versions()
                        .iter()
                        .filter_map(|entry| {
                            entry.version_id().map(|version_id| VersionSummary {
                                version_id: version_id.to_string(),
                                stages: entry.version_stages().to_vec(),
                            })
                        })
                        .collect(),
                    next_token: output.next_token().map(str::to_string),
                });
            if let Ok(page) = &result {
                debug!(
                    "Listed {} versions of secret {} (more pages: {})",
                    page.versions.len(),
                    secret_id,
                    page.next_token.is_some()
                );
            }
            record("list_secret_version_ids", start, &result);
            result
        }
        .instrument(span)
        .await
    }

    async fn move_stage_label(&self, stage_move: &StageMove) -> Result<(), StoreError> {
        let span = debug_span!(
            "aws.secretsmanager.update_secret_version_stage",
            secret.id = %stage_move.secret_id,
            stage = %stage_move.label
        );
        let start = Instant::now();

        async move {
            let result = self
                .client
                .update_secret_version_stage()
                .secret_id(&stage_move.secret_id)
                .version_stage(&stage_move.label)
                .set_move_to_version_id(stage_move.move_to.clone())
                .set_remove_from_version_id(stage_move.remove_from.clone())
                .send()
                .await
                .map(|_| ())
                .map_err(|e| store_error(&e));
            record("update_secret_version_stage", start, &result);
            result
        }
        .instrument(span)
        .await
    }
}
