//! # Version Metrics
//!
//! Metrics for stage reconciliation and version reads.

use crate::observability::metrics::registry::REGISTRY;
use anyhow::Result;
use prometheus::{HistogramVec, IntCounter, IntCounterVec};
use std::sync::LazyLock;

static STAGE_MOVES_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "secret_version_stage_moves_total",
            "Total number of staging label moves issued",
        ),
        &["operation"],
    )
    .expect("Failed to create STAGE_MOVES_TOTAL metric - this should never happen")
});

static STAGE_REMOVALS_SKIPPED_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "secret_version_stage_removals_skipped_total",
        "Total number of AWSCURRENT removals skipped",
    )
    .expect("Failed to create STAGE_REMOVALS_SKIPPED_TOTAL metric - this should never happen")
});

static READ_RETRIES_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "secret_version_read_retries_total",
        "Total number of reads retried while a new version propagates",
    )
    .expect("Failed to create READ_RETRIES_TOTAL metric - this should never happen")
});

static READS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "secret_version_reads_total",
            "Total number of version reads by outcome",
        ),
        &["outcome"],
    )
    .expect("Failed to create READS_TOTAL metric - this should never happen")
});

static LOCATOR_PAGES_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "secret_version_locator_pages_total",
        "Total number of version history pages scanned for AWSCURRENT",
    )
    .expect("Failed to create LOCATOR_PAGES_TOTAL metric - this should never happen")
});

static LIFECYCLE_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    HistogramVec::new(
        prometheus::HistogramOpts::new(
            "secret_version_lifecycle_duration_seconds",
            "Duration of secret version lifecycle operations in seconds",
        )
        .buckets(vec![0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 30.0, 120.0]),
        &["operation"],
    )
    .expect("Failed to create LIFECYCLE_DURATION metric - this should never happen")
});

/// Register version metrics with the registry
pub(crate) fn register_version_metrics() -> Result<()> {
    REGISTRY.register(Box::new(STAGE_MOVES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(STAGE_REMOVALS_SKIPPED_TOTAL.clone()))?;
    REGISTRY.register(Box::new(READ_RETRIES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(READS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(LOCATOR_PAGES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(LIFECYCLE_DURATION.clone()))?;
    Ok(())
}

pub fn increment_stage_moves(operation: &str) {
    STAGE_MOVES_TOTAL.with_label_values(&[operation]).inc();
}

pub fn increment_stage_removals_skipped() {
    STAGE_REMOVALS_SKIPPED_TOTAL.inc();
}

pub fn increment_read_retries() {
    READ_RETRIES_TOTAL.inc();
}

pub fn increment_reads(outcome: &str) {
    READS_TOTAL.with_label_values(&[outcome]).inc();
}

pub fn increment_locator_pages() {
    LOCATOR_PAGES_TOTAL.inc();
}

pub fn observe_lifecycle_duration(operation: &str, duration: f64) {
    LIFECYCLE_DURATION
        .with_label_values(&[operation])
        .observe(duration);
}
