//! In-memory snapshot store.
//!
//! Holds the latest observed item set per watch target. No history is
//! retained and nothing survives a restart.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use crate::models::{Item, Snapshot};

/// Latest snapshot per target, keyed by target id.
///
/// `replace` is atomic with respect to concurrent readers of the same
/// target id: a reader observes either the old or the new snapshot,
/// never a partial one.
#[derive(Debug, Default)]
pub struct SnapshotStore {
    snapshots: Mutex<HashMap<String, Snapshot>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the current snapshot for a target, if one exists.
    pub fn get(&self, target_id: &str) -> Option<Snapshot> {
        self.snapshots
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(target_id)
            .cloned()
    }

    /// Replace the snapshot for a target with `new_items`, returning
    /// the previous item set.
    ///
    /// `None` means first observation; callers must not diff against
    /// it.
    pub fn replace(&self, target_id: &str, new_items: HashSet<Item>) -> Option<HashSet<Item>> {
        let snapshot = Snapshot::capture(target_id, new_items);
        self.snapshots
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(target_id.to_string(), snapshot)
            .map(|prev| prev.items)
    }

    /// Drop the snapshot for a target (used when a target is
    /// unregistered).
    pub fn remove(&self, target_id: &str) -> Option<Snapshot> {
        self.snapshots
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(target_id)
    }

    /// Number of targets with a stored snapshot.
    pub fn len(&self) -> usize {
        self.snapshots
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
