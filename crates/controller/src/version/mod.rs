//! # Secret Versions
//!
//! Lifecycle of secret versions and reconciliation of their staging labels.
//!
//! - `id`: `<secret_id>|<version_id>` resource identifiers
//! - `payload`: string/binary payloads and the base64 boundary
//! - `plan`: stage diff planner
//! - `locator`: finds the `AWSCURRENT` holder in version history
//! - `executor`: applies a plan as label moves
//! - `reader`: version reads with propagation retry
//! - `delete`: label removal when a version leaves the desired state
//! - `resource`: create / read / update / delete built on the above

pub mod backoff;
pub mod delete;
pub mod error;
pub mod executor;
pub mod id;
pub mod locator;
pub mod payload;
pub mod plan;
pub mod reader;
pub mod resource;

pub use delete::{delete_version_stages, DeleteOutcome};
pub use error::VersionError;
pub use executor::{apply_stage_plan, StageOutcome};
pub use id::ResourceId;
pub use locator::{find_current_holder, CurrentHolderCache};
pub use payload::SecretPayload;
pub use plan::StagePlan;
pub use reader::{ReadRetryPolicy, RetryingReader};
pub use resource::{SecretVersionInput, SecretVersionManager, SecretVersionState};
