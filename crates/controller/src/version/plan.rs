//! # Stage Diff Planner
//!
//! Computes which staging labels must be attached to and detached from a version.

use std::collections::BTreeSet;

/// Label changes for one reconciliation call
///
/// Sets are ordered so iteration is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StagePlan {
    /// `desired - observed`
    pub to_add: BTreeSet<String>,
    /// `observed - desired`
    pub to_remove: BTreeSet<String>,
}

impl StagePlan {
    pub fn compute(observed: &BTreeSet<String>, desired: &BTreeSet<String>) -> Self {
        Self {
            to_add: desired.difference(observed).cloned().collect(),
            to_remove: observed.difference(desired).cloned().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}
