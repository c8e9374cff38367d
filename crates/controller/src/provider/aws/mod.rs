//! # AWS Providers
//!
//! - `secrets_manager`: AWS Secrets Manager secret versions, staging labels, and tags

pub mod secrets_manager;

// Re-export for convenience
pub use secrets_manager::AwsSecretVersionStore;
