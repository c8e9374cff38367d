//! # AWS Secrets Manager Authentication
//!
//! Handles AWS SDK configuration and credential setup.

use crate::config::ControllerConfig;
use anyhow::Result;
use aws_config::SdkConfig;
use aws_credential_types::Credentials;
use tracing::info;

/// Create AWS SDK config from controller configuration
///
/// Credentials come from the default chain (environment, profile, IRSA, IMDS).
/// When an endpoint override is set and no access key is present in the
/// environment, static placeholder credentials are used so local mock
/// endpoints can be reached without an AWS account.
pub async fn create_sdk_config(config: &ControllerConfig) -> Result<SdkConfig> {
    let mut builder = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(aws_config::Region::new(config.region.clone()));

    if let Some(endpoint) = &config.endpoint_url {
        info!(
            "Routing AWS Secrets Manager requests to {}",
            endpoint
        );
        builder = builder.endpoint_url(endpoint);

        if std::env::var("AWS_ACCESS_KEY_ID").is_err() {
            info!("No AWS credentials in environment, using placeholder credentials for custom endpoint");
            builder = builder.credentials_provider(Credentials::new(
                "test",
                "test",
                None,
                None,
                "secret-version-controller-static",
            ));
        }
    } else {
        info!("Using default AWS credential chain in region {}", config.region);
    }

    Ok(builder.load().await)
}
