//! Outbound notification collaborator.
//!
//! Everything externally visible (registration outcomes, per-sweep
//! deltas, fetch failures) leaves through one [`Notifier`] channel.
//! Delivery is best effort; the core never retries.

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::models::{Delta, Item};

/// Added/removed item lists for one target, as sent to the notifier.
///
/// Lists are sorted by item fields only to keep payloads stable;
/// consumers must still treat them as unordered.
#[derive(Debug, Clone, Serialize, Default, PartialEq, Eq)]
pub struct ChangeSet {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub added: Vec<Item>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub removed: Vec<Item>,
}

impl From<&Delta> for ChangeSet {
    fn from(delta: &Delta) -> Self {
        let mut added: Vec<Item> = delta.added.iter().cloned().collect();
        let mut removed: Vec<Item> = delta.removed.iter().cloned().collect();
        let key = |i: &Item| (i.name.clone(), i.kind.clone(), i.link.clone());
        added.sort_by_key(key);
        removed.sort_by_key(key);
        Self { added, removed }
    }
}

/// The `data` value of a notification payload: either a plain status
/// message or change sets keyed by target display name.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum NotifyData {
    Status(String),
    Changes(BTreeMap<String, ChangeSet>),
}

impl NotifyData {
    pub fn status(message: impl Into<String>) -> Self {
        Self::Status(message.into())
    }
}

/// Human-readable rendering: one header per target, then the added and
/// removed sub-lists, each only when non-empty.
impl fmt::Display for NotifyData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status(message) => write!(f, "{message}"),
            Self::Changes(changes) => {
                for (name, change_set) in changes {
                    writeln!(f, "FOR \"{name}\":")?;
                    if !change_set.added.is_empty() {
                        writeln!(f, "  ADDED:")?;
                        for item in &change_set.added {
                            writeln!(f, "    {} [{}] {}", item.name, item.kind, item.link)?;
                        }
                    }
                    if !change_set.removed.is_empty() {
                        writeln!(f, "  REMOVED:")?;
                        for item in &change_set.removed {
                            writeln!(f, "    {} [{}] {}", item.name, item.kind, item.link)?;
                        }
                    }
                }
                Ok(())
            }
        }
    }
}

/// Outbound notification channel.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one notification. No acknowledgment contract; failures
    /// are reported but not retried here.
    async fn notify(&self, data: &NotifyData) -> Result<()>;
}

#[derive(Serialize)]
struct WebhookPayload<'a> {
    data: &'a NotifyData,
}

/// Notifier posting `{"data": ...}` JSON to a configured webhook URL.
pub struct WebhookNotifier {
    client: Client,
    webhook_url: String,
}

impl WebhookNotifier {
    pub fn new(client: Client, webhook_url: impl Into<String>) -> Self {
        Self {
            client,
            webhook_url: webhook_url.into(),
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, data: &NotifyData) -> Result<()> {
        let response = self
            .client
            .post(&self.webhook_url)
            .json(&WebhookPayload { data })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::notify(format!("webhook returned {status}")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn delta(added: &[&str], removed: &[&str]) -> Delta {
        let to_set = |names: &[&str]| -> HashSet<Item> {
            names
                .iter()
                .map(|n| Item::new(*n, "File", format!("/{n}")))
                .collect()
        };
        Delta {
            target_id: "https://example/course/1".to_string(),
            added: to_set(added),
            removed: to_set(removed),
        }
    }

    #[test]
    fn test_change_set_is_sorted() {
        let change_set = ChangeSet::from(&delta(&["b", "a", "c"], &[]));
        let names: Vec<&str> = change_set.added.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert!(change_set.removed.is_empty());
    }

    #[test]
    fn test_status_payload_serializes_as_string() {
        let data = NotifyData::status("Logged in");
        let json = serde_json::to_value(WebhookPayload { data: &data }).unwrap();
        assert_eq!(json, serde_json::json!({ "data": "Logged in" }));
    }

    #[test]
    fn test_changes_payload_shape() {
        let mut changes = BTreeMap::new();
        changes.insert(
            "Intro to Systems".to_string(),
            ChangeSet::from(&delta(&["a"], &[])),
        );
        let data = NotifyData::Changes(changes);

        let json = serde_json::to_value(WebhookPayload { data: &data }).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "data": {
                    "Intro to Systems": {
                        "added": [{ "name": "a", "kind": "File", "link": "/a" }]
                    }
                }
            })
        );
    }

    #[test]
    fn test_render_skips_empty_sublists() {
        let mut changes = BTreeMap::new();
        changes.insert("Course".to_string(), ChangeSet::from(&delta(&[], &["x"])));
        let rendered = NotifyData::Changes(changes).to_string();

        assert!(rendered.contains("FOR \"Course\":"));
        assert!(rendered.contains("REMOVED:"));
        assert!(!rendered.contains("ADDED:"));
    }
}
