//! Diff calculation between consecutive snapshots.
//!
//! Computes the added/removed item sets between the previous and the
//! current observation of one target. Pure set arithmetic over
//! structural equality; no side effects, no failure mode.

use std::collections::HashSet;

use crate::models::{Delta, Item};

/// Compute `(added, removed)` between two item sets.
///
/// `added = current − previous`, `removed = previous − current`.
/// Iteration order of the results is unspecified.
pub fn diff(
    previous: &HashSet<Item>,
    current: &HashSet<Item>,
) -> (HashSet<Item>, HashSet<Item>) {
    let added = current.difference(previous).cloned().collect();
    let removed = previous.difference(current).cloned().collect();
    (added, removed)
}

impl Delta {
    /// Build the delta between two consecutive item sets of one target.
    pub fn between(
        target_id: impl Into<String>,
        previous: &HashSet<Item>,
        current: &HashSet<Item>,
    ) -> Self {
        let (added, removed) = diff(previous, current);
        Self {
            target_id: target_id.into(),
            added,
            removed,
        }
    }
}
