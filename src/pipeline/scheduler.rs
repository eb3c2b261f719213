//! Poll scheduler: the periodic fetch→extract→diff→notify loop.
//!
//! One long-lived task owns the loop. Every tick it sweeps the
//! currently watched targets sequentially; each target's cycle is
//! ordered and isolated, so one failing fetch never disturbs another
//! target's diff or its stored snapshot.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::models::{Config, Delta, WatchList, WatchTarget};
use crate::services::{ChangeSet, ItemExtractor, Notifier, NotifyData, PageFetcher, SnapshotStore};

/// Shared handle to the single fetch session. The mutex serializes
/// fetches between the scheduler and the registration gateway.
pub type SharedFetcher = Arc<Mutex<Box<dyn PageFetcher>>>;

/// Summary of one sweep over all watched targets.
#[derive(Debug, Default)]
pub struct SweepOutcome {
    pub targets: usize,
    pub failures: usize,
    pub first_observations: usize,
    pub deltas: usize,
}

/// Drives the periodic poll cycle for every watched target.
pub struct PollScheduler {
    watch_list: Arc<WatchList>,
    store: Arc<SnapshotStore>,
    fetcher: SharedFetcher,
    notifier: Arc<dyn Notifier>,
    extractor: Arc<ItemExtractor>,
    heading_selector: String,
    poll_interval: Duration,
}

impl PollScheduler {
    pub fn new(
        config: &Config,
        watch_list: Arc<WatchList>,
        store: Arc<SnapshotStore>,
        fetcher: SharedFetcher,
        notifier: Arc<dyn Notifier>,
        extractor: Arc<ItemExtractor>,
    ) -> Self {
        Self {
            watch_list,
            store,
            fetcher,
            notifier,
            extractor,
            heading_selector: config.markers.heading_selector.clone(),
            poll_interval: Duration::from_secs(config.watch.poll_interval_secs),
        }
    }

    /// Run the poll loop forever. Only process shutdown ends it.
    pub async fn run(self: Arc<Self>) {
        info!(
            interval_secs = self.poll_interval.as_secs(),
            "poll scheduler started"
        );

        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            let outcome = self.sweep().await;
            debug!(
                targets = outcome.targets,
                failures = outcome.failures,
                first_observations = outcome.first_observations,
                deltas = outcome.deltas,
                "sweep complete"
            );
        }
    }

    /// Run one sweep over the currently registered targets.
    ///
    /// Targets added while the sweep is running are picked up on the
    /// next tick, not this one.
    pub async fn sweep(&self) -> SweepOutcome {
        let targets = self.watch_list.current();
        let mut outcome = SweepOutcome {
            targets: targets.len(),
            ..SweepOutcome::default()
        };

        let mut changes: BTreeMap<String, ChangeSet> = BTreeMap::new();

        for target in &targets {
            match self.cycle(target).await {
                Ok(Some(delta)) if delta.has_changes() => {
                    changes.insert(target.display_name.clone(), ChangeSet::from(&delta));
                }
                Ok(Some(_)) => {}
                Ok(None) => outcome.first_observations += 1,
                Err(error) => {
                    outcome.failures += 1;
                    warn!(target = %target.id, %error, "poll cycle failed, snapshot kept");
                    self.send(&NotifyData::status(format!(
                        "Failed to check \"{}\" (<{}>): {}",
                        target.display_name, target.id, error
                    )))
                    .await;
                }
            }
        }

        if !changes.is_empty() {
            outcome.deltas = changes.len();
            let data = NotifyData::Changes(changes);
            info!("changes detected:\n{data}");
            self.send(&data).await;
        }

        outcome
    }

    /// One fetch→extract→store→diff cycle for a single target.
    ///
    /// Returns `None` on first observation (nothing to compare yet),
    /// `Some(delta)` otherwise. On error the stored snapshot is left
    /// untouched (stale-is-safe).
    async fn cycle(&self, target: &WatchTarget) -> Result<Option<Delta>> {
        let page = {
            let mut fetcher = self.fetcher.lock().await;
            fetcher
                .fetch_when_ready(&target.id, &self.heading_selector)
                .await?
        };

        let items = self.extractor.extract_items(&page.html);

        let Some(previous) = self.store.replace(&target.id, items.clone()) else {
            debug!(target = %target.id, count = items.len(), "first observation");
            return Ok(None);
        };

        Ok(Some(Delta::between(target.id.as_str(), &previous, &items)))
    }

    /// Best-effort notification; delivery failures are logged, never
    /// escalated.
    async fn send(&self, data: &NotifyData) {
        if let Err(error) = self.notifier.notify(data).await {
            warn!(%error, "notification delivery failed");
        }
    }
}
