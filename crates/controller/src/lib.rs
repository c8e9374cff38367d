//! Secret Version Controller Library
//!
//! Manages AWS Secrets Manager secret versions: creating immutable versions,
//! reading them back through propagation lag, and reconciling staging labels
//! (`AWSCURRENT`, `AWSPENDING`, `AWSPREVIOUS`, custom labels) against a desired set.
//! Tests are included in the module files and under `tests/`.

pub mod config;
pub mod constants;
pub mod observability;
pub mod provider;
pub mod tags;
pub mod version;

// Re-export the core types for convenience
pub use version::{
    ResourceId, SecretPayload, SecretVersionInput, SecretVersionManager, SecretVersionState,
    StagePlan, VersionError,
};
