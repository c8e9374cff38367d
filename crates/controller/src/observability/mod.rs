//! # Observability
//!
//! - `logging`: tracing subscriber setup
//! - `metrics`: Prometheus metrics for stage moves, reads, and provider calls

pub mod logging;
pub mod metrics;
