//! Service layer for the watcher application.
//!
//! This module contains the collaborators the poll pipeline is built
//! from:
//! - Page fetching with marker wait (`PageFetcher` / `HttpFetcher`)
//! - Item extraction (`ItemExtractor`)
//! - Snapshot storage (`SnapshotStore`)
//! - Outbound notifications (`Notifier` / `WebhookNotifier`)

mod extractor;
mod fetcher;
mod notifier;
mod snapshot;

pub use extractor::ItemExtractor;
pub use fetcher::{FetchedPage, HttpFetcher, PageFetcher};
pub use notifier::{ChangeSet, Notifier, NotifyData, WebhookNotifier};
pub use snapshot::SnapshotStore;
