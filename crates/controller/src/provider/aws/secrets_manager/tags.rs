//! # AWS Secrets Manager Tags
//!
//! [`TagStore`] implementation. Secrets Manager has no list-tags call; tags
//! are read from `DescribeSecret`.

use super::{record, store_error, AwsSecretVersionStore};
use crate::provider::{StoreError, TagStore};
use crate::tags::KeyValueTags;
use async_trait::async_trait;
use aws_sdk_secretsmanager::types::Tag;
use std::time::Instant;

#[async_trait]
impl TagStore for AwsSecretVersionStore {
    async fn list_tags(&self, identifier: &str) -> Result<KeyValueTags, StoreError> {
        let start = Instant::now();
        let result = self
            .client
            .describe_secret()
            .secret_id(identifier)
            .send()
            .await
            .map_err(|e| store_error(&e))
            .map(|output| {
                output
                    .tags()
                    .iter()
                    .filter_map(|tag| {
                        tag.key()
                            .map(|k| (k.to_string(), tag.value().unwrap_or_default().to_string()))
                    })
                    .collect::<KeyValueTags>()
            });
        record("describe_secret", start, &result);
        result
    }

    async fn tag_resource(&self, identifier: &str, tags: &KeyValueTags) -> Result<(), StoreError> {
        let start = Instant::now();
        let aws_tags: Vec<Tag> = tags
            .iter()
            .map(|(key, value)| Tag::builder().key(key).value(value).build())
            .collect();

        let result = self
            .client
            .tag_resource()
            .secret_id(identifier)
            .set_tags(Some(aws_tags))
            .send()
            .await
            .map(|_| ())
            .map_err(|e| store_error(&e));
        record("tag_resource", start, &result);
        result
    }

    async fn untag_resource(&self, identifier: &str, keys: &[String]) -> Result<(), StoreError> {
        let start = Instant::now();
        let result = self
            .client
            .untag_resource()
            .secret_id(identifier)
            .set_tag_keys(Some(keys.to_vec()))
            .send()
            .await
            .map(|_| ())
            .map_err(|e| store_error(&e));
        record("untag_resource", start, &result);
        result
    }
}
