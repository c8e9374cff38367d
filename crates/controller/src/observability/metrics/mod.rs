//! # Metrics Module
//!
//! Prometheus metrics, organized by responsibility.
//!
//! ## Sub-modules
//!
//! - `registry` - Metrics registry setup, registration, and text export
//! - `version_metrics` - Stage moves, reads, retries, locator scans, lifecycle durations
//! - `provider_metrics` - Remote store call durations and errors

pub mod provider_metrics;
pub mod registry;
pub mod version_metrics;

pub use provider_metrics::*;
pub use registry::*;
pub use version_metrics::*;
