//! Watched item, snapshot, and delta data structures.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single content item extracted from a course page.
///
/// Items are values: two items are equal iff name, kind, and link all
/// match exactly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Item {
    /// Primary label text
    pub name: String,

    /// Secondary label text ("File", "Quiz", ...); "Link" when the page
    /// carries no kind marker
    pub kind: String,

    /// Target reference of the item
    pub link: String,
}

impl Item {
    pub fn new(
        name: impl Into<String>,
        kind: impl Into<String>,
        link: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            link: link.into(),
        }
    }
}

/// The most recently observed item set for a watch target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// Identifier of the watch target this snapshot belongs to
    pub target_id: String,

    /// Items observed in the last successful cycle
    pub items: HashSet<Item>,

    /// When the snapshot was captured
    pub captured_at: DateTime<Utc>,
}

impl Snapshot {
    /// Capture a snapshot of `items` for `target_id` at the current time.
    pub fn capture(target_id: impl Into<String>, items: HashSet<Item>) -> Self {
        Self {
            target_id: target_id.into(),
            items,
            captured_at: Utc::now(),
        }
    }
}

/// Added/removed items between two consecutive snapshots of one target.
///
/// Transient: produced by the differ, consumed by the notification
/// path, never stored.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Delta {
    /// Identifier of the watch target
    pub target_id: String,

    /// Items present now but not before
    pub added: HashSet<Item>,

    /// Items present before but not now
    pub removed: HashSet<Item>,
}

impl Delta {
    /// Check if there are any changes.
    pub fn has_changes(&self) -> bool {
        !self.added.is_empty() || !self.removed.is_empty()
    }

    /// Get the total number of changes.
    pub fn change_count(&self) -> usize {
        self.added.len() + self.removed.len()
    }
}
