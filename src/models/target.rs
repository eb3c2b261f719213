//! Watch target and watch-list data structures.

use std::sync::RwLock;

use serde::{Deserialize, Serialize};

/// A single remote page being monitored for content changes.
///
/// Immutable once created by the registration gateway.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WatchTarget {
    /// Opaque identifier (the source URL)
    pub id: String,

    /// Display name taken from the page heading
    pub display_name: String,
}

impl WatchTarget {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
        }
    }
}

/// The set of currently watched targets, shared between the
/// registration gateway and the poll scheduler.
///
/// The lock is only held for short synchronous sections and never
/// across an await point; the scheduler takes a cloned view per sweep,
/// so targets added mid-sweep are picked up on the next tick.
#[derive(Debug, Default)]
pub struct WatchList {
    targets: RwLock<Vec<WatchTarget>>,
}

impl WatchList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a target. Re-adding an already-watched id is a no-op.
    pub fn add(&self, target: WatchTarget) {
        let mut targets = self.targets.write().unwrap_or_else(|e| e.into_inner());
        if !targets.iter().any(|t| t.id == target.id) {
            targets.push(target);
        }
    }

    /// Remove a target by id; other targets are unaffected.
    pub fn remove(&self, target_id: &str) -> Option<WatchTarget> {
        let mut targets = self.targets.write().unwrap_or_else(|e| e.into_inner());
        let pos = targets.iter().position(|t| t.id == target_id)?;
        Some(targets.remove(pos))
    }

    /// Clone the current target set for one sweep.
    pub fn current(&self) -> Vec<WatchTarget> {
        self.targets
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn contains(&self, target_id: &str) -> bool {
        self.targets
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .any(|t| t.id == target_id)
    }

    pub fn len(&self) -> usize {
        self.targets.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
