//! Diff calculation between fetched and persisted release sets.
//!
//! A release is new when no persisted release is equal to it. Releases are
//! never reported as removed: the persisted set only grows.

use std::collections::HashSet;

use crate::models::Release;

/// Releases found in a fetch that were not persisted before.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReleaseDiff {
    /// New releases, in fetch order
    pub added: Vec<Release>,
    /// Fetched releases already present in the previous set
    pub unchanged: usize,
}

impl ReleaseDiff {
    /// Check if there are any new releases.
    pub fn has_changes(&self) -> bool {
        !self.added.is_empty()
    }

    /// The set to persist: new releases first, then everything previously stored.
    pub fn merged_with(&self, previous: &[Release]) -> Vec<Release> {
        self.added.iter().chain(previous.iter()).cloned().collect()
    }
}

/// Compute `fetched - previous`.
///
/// Duplicates inside `fetched` are reported once.
pub fn calculate_diff(previous: &[Release], fetched: &[Release]) -> ReleaseDiff {
    let mut seen: HashSet<&Release> = previous.iter().collect();
    let mut diff = ReleaseDiff::default();

    for release in fetched {
        if seen.insert(release) {
            diff.added.push(release.clone());
        } else {
            diff.unchanged += 1;
        }
    }

    diff
}
