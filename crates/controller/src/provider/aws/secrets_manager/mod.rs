//! # AWS Secrets Manager Client
//!
//! Client for interacting with AWS Secrets Manager API.
//!
//! This module provides:
//! - `PutSecretValue`, `GetSecretValue`, `ListSecretVersionIds`, and
//!   `UpdateSecretVersionStage` behind [`SecretVersionStore`](crate::provider::SecretVersionStore)
//! - `DescribeSecret`, `TagResource`, and `UntagResource` behind [`TagStore`](crate::provider::TagStore)
//! - SDK configuration from [`ControllerConfig`]

mod auth;
mod operations;
mod tags;

use aws_sdk_secretsmanager::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_secretsmanager::Client as SecretsManagerClient;

use crate::config::ControllerConfig;
use crate::observability::metrics;
use crate::provider::StoreError;
use anyhow::Result;
use std::time::Instant;

use self::auth::create_sdk_config;

/// AWS Secrets Manager provider implementation
pub struct AwsSecretVersionStore {
    pub(crate) client: SecretsManagerClient,
    pub(crate) region: String,
    pub(crate) page_size: i32,
}

impl std::fmt::Debug for AwsSecretVersionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsSecretVersionStore")
            .field("region", &self.region)
            .field("page_size", &self.page_size)
            .finish_non_exhaustive()
    }
}

impl AwsSecretVersionStore {
    /// Create a new AWS Secrets Manager client
    #[allow(
        clippy::missing_errors_doc,
        reason = "Error documentation is provided in doc comments"
    )]
    pub async fn new(config: &ControllerConfig) -> Result<Self> {
        let sdk_config = create_sdk_config(config).await?;
        Ok(Self::from_client(
            SecretsManagerClient::new(&sdk_config),
            config,
        ))
    }

    /// Wrap an existing SDK client
    pub fn from_client(client: SecretsManagerClient, config: &ControllerConfig) -> Self {
        Self {
            client,
            region: config.region.clone(),
            page_size: config.list_versions_page_size,
        }
    }
}

/// Convert an SDK error into a classified [`StoreError`]
pub(crate) fn store_error<E, R>(err: &SdkError<E, R>) -> StoreError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    match err.code() {
        Some(code) => StoreError::classify(code, err.message().unwrap_or_default()),
        None => StoreError::Transport(DisplayErrorContext(err).to_string()),
    }
}

/// Record duration and failure metrics for one API call
pub(crate) fn record<T>(
    operation: &str,
    start: Instant,
    result: &std::result::Result<T, StoreError>,
) {
    metrics::record_provider_operation(operation, start.elapsed().as_secs_f64());
    if let Err(e) = result {
        metrics::increment_provider_operation_errors(operation, e.as_str());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_secretsmanager::config::{BehaviorVersion, Credentials, Region};

    fn test_client() -> SecretsManagerClient {
        let config = aws_sdk_secretsmanager::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .credentials_provider(Credentials::new("test", "test", None, None, "test"))
            .build();
        SecretsManagerClient::from_conf(config)
    }

    #[test]
    fn test_from_client_uses_config() {
        let config = ControllerConfig {
            region: "eu-west-1".to_string(),
            list_versions_page_size: 25,
            ..ControllerConfig::default()
        };

        let store = AwsSecretVersionStore::from_client(test_client(), &config);
        assert_eq!(store.region, "eu-west-1");
        assert_eq!(store.page_size, 25);
    }

    #[test]
    fn test_debug_hides_client() {
        let store = AwsSecretVersionStore::from_client(test_client(), &ControllerConfig::default());
        let rendered = format!("{store:?}");
        assert!(rendered.contains("us-east-1"));
        assert!(!rendered.contains("client"));
    }
}
