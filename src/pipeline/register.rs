//! Registration gateway: validates and admits new watch targets.
//!
//! Every candidate passes a fixed gate sequence (domain, probe fetch,
//! accessibility) before it reaches the scheduler's watch-list. Both
//! acceptance and rejection are externally visible through the
//! notifier.

use std::fmt;
use std::sync::Arc;

use tracing::{info, warn};

use crate::error::{AppError, Result};
use crate::models::{Config, WatchList, WatchTarget};
use crate::pipeline::scheduler::SharedFetcher;
use crate::services::{ItemExtractor, Notifier, NotifyData};

/// Why a candidate URL was not admitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// URL is outside the allowed host/domain prefix
    WrongDomain,
    /// Probe fetch failed or the page never became ready
    Unreachable,
    /// Page is reachable but enrollment-gated or the generic landing page
    NotAccessible,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WrongDomain => write!(f, "wrong domain"),
            Self::Unreachable => write!(f, "unreachable or malformed"),
            Self::NotAccessible => write!(f, "not accessible"),
        }
    }
}

/// Outcome of a registration attempt. Callers branch on the tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationOutcome {
    Accepted(WatchTarget),
    Rejected(RejectReason),
}

/// Admits new watch targets into the running scheduler's watch-list.
pub struct RegistrationGateway {
    watch_list: Arc<WatchList>,
    fetcher: SharedFetcher,
    notifier: Arc<dyn Notifier>,
    extractor: Arc<ItemExtractor>,
    allowed_url_prefix: String,
    landing_page_title: String,
    enrol_url_marker: String,
    heading_selector: String,
}

impl RegistrationGateway {
    pub fn new(
        config: &Config,
        watch_list: Arc<WatchList>,
        fetcher: SharedFetcher,
        notifier: Arc<dyn Notifier>,
        extractor: Arc<ItemExtractor>,
    ) -> Self {
        Self {
            watch_list,
            fetcher,
            notifier,
            extractor,
            allowed_url_prefix: config.watch.allowed_url_prefix.clone(),
            landing_page_title: config.watch.landing_page_title.clone(),
            enrol_url_marker: config.watch.enrol_url_marker.clone(),
            heading_selector: config.markers.heading_selector.clone(),
        }
    }

    /// Validate a candidate URL and, on success, add it to the
    /// watch-list.
    ///
    /// Probe failures come back as `Rejected`, not `Err`; `Err` means
    /// the system itself misbehaved. A duplicate id is a no-op re-add
    /// and still reports `Accepted`.
    pub async fn register(&self, candidate_url: &str) -> Result<RegistrationOutcome> {
        if !candidate_url.starts_with(&self.allowed_url_prefix) {
            return self.reject(candidate_url, RejectReason::WrongDomain).await;
        }

        let page = {
            let mut fetcher = self.fetcher.lock().await;
            fetcher
                .fetch_when_ready(candidate_url, &self.heading_selector)
                .await
        };
        let page = match page {
            Ok(page) => page,
            Err(AppError::Fetch { message, .. }) => {
                warn!(url = candidate_url, %message, "probe fetch failed");
                return self.reject(candidate_url, RejectReason::Unreachable).await;
            }
            Err(AppError::Http(error)) => {
                warn!(url = candidate_url, %error, "probe fetch failed");
                return self.reject(candidate_url, RejectReason::Unreachable).await;
            }
            Err(error) => return Err(error),
        };

        if page.final_url.contains(&self.enrol_url_marker) {
            return self
                .reject(candidate_url, RejectReason::NotAccessible)
                .await;
        }

        let heading = self.extractor.extract_heading(&page.html);
        let display_name = match heading {
            Some(name) if name != self.landing_page_title => name,
            _ => {
                return self
                    .reject(candidate_url, RejectReason::NotAccessible)
                    .await;
            }
        };

        let target = WatchTarget::new(candidate_url, display_name);
        self.watch_list.add(target.clone());
        info!(url = candidate_url, name = %target.display_name, "watch target added");
        self.send(NotifyData::status(format!(
            "Course \"{}\" (<{}>) added",
            target.display_name, target.id
        )))
        .await;

        Ok(RegistrationOutcome::Accepted(target))
    }

    async fn reject(&self, url: &str, reason: RejectReason) -> Result<RegistrationOutcome> {
        info!(url, %reason, "watch target rejected");
        self.send(NotifyData::status(format!(
            "Failed to add <{url}>: {reason}"
        )))
        .await;
        Ok(RegistrationOutcome::Rejected(reason))
    }

    async fn send(&self, data: NotifyData) {
        if let Err(error) = self.notifier.notify(&data).await {
            warn!(%error, "notification delivery failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::Mutex;

    use super::*;
    use crate::pipeline::test_support::{course_page, RecordingNotifier, ScriptedFetcher};
    use crate::services::PageFetcher;

    fn build(
        fetcher: ScriptedFetcher,
    ) -> (RegistrationGateway, Arc<RecordingNotifier>, Arc<WatchList>) {
        let config = Config::default();
        let watch_list = Arc::new(WatchList::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let gateway = RegistrationGateway::new(
            &config,
            Arc::clone(&watch_list),
            Arc::new(Mutex::new(Box::new(fetcher) as Box<dyn PageFetcher>)),
            Arc::clone(&notifier) as Arc<dyn Notifier>,
            Arc::new(ItemExtractor::new(&config.markers).unwrap()),
        );
        (gateway, notifier, watch_list)
    }

    fn status_messages(notifier: &RecordingNotifier) -> Vec<String> {
        notifier
            .payloads()
            .into_iter()
            .map(|p| match p {
                NotifyData::Status(m) => m,
                other => panic!("unexpected payload: {other:?}"),
            })
            .collect()
    }

    #[tokio::test]
    async fn test_wrong_domain_is_rejected() {
        let (gateway, notifier, watch_list) = build(ScriptedFetcher::new());

        let outcome = gateway.register("https://evil.example/x").await.unwrap();
        assert_eq!(
            outcome,
            RegistrationOutcome::Rejected(RejectReason::WrongDomain)
        );
        assert!(watch_list.is_empty());

        let messages = status_messages(&notifier);
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("wrong domain"));
    }

    #[tokio::test]
    async fn test_happy_path_admits_target() {
        let url = "https://www.icorsi.ch/course/view.php?id=7";
        let fetcher = ScriptedFetcher::new()
            .script(url, vec![Ok(course_page("Intro to Systems", &[]))]);
        let (gateway, notifier, watch_list) = build(fetcher);

        let outcome = gateway.register(url).await.unwrap();
        let RegistrationOutcome::Accepted(target) = outcome else {
            panic!("expected acceptance");
        };
        assert_eq!(target.display_name, "Intro to Systems");
        assert_eq!(watch_list.len(), 1);
        assert!(watch_list.contains(url));

        let messages = status_messages(&notifier);
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("Intro to Systems"));
        assert!(messages[0].contains("added"));
    }

    #[tokio::test]
    async fn test_unreachable_probe_is_rejected() {
        let url = "https://www.icorsi.ch/course/view.php?id=9";
        let fetcher = ScriptedFetcher::new().script(url, vec![Err("timeout".to_string())]);
        let (gateway, notifier, watch_list) = build(fetcher);

        let outcome = gateway.register(url).await.unwrap();
        assert_eq!(
            outcome,
            RegistrationOutcome::Rejected(RejectReason::Unreachable)
        );
        assert!(watch_list.is_empty());
        assert!(status_messages(&notifier)[0].contains("unreachable"));
    }

    #[tokio::test]
    async fn test_enrolment_redirect_is_rejected() {
        let url = "https://www.icorsi.ch/course/view.php?id=3";
        let fetcher = ScriptedFetcher::new().script_redirect(
            url,
            "https://www.icorsi.ch/enrol/index.php?id=3",
            course_page("Locked Course", &[]),
        );
        let (gateway, _, watch_list) = build(fetcher);

        let outcome = gateway.register(url).await.unwrap();
        assert_eq!(
            outcome,
            RegistrationOutcome::Rejected(RejectReason::NotAccessible)
        );
        assert!(watch_list.is_empty());
    }

    #[tokio::test]
    async fn test_landing_page_heading_is_rejected() {
        let url = "https://www.icorsi.ch/course/view.php?id=4";
        let fetcher = ScriptedFetcher::new().script(url, vec![Ok(course_page("iCorsi", &[]))]);
        let (gateway, _, watch_list) = build(fetcher);

        let outcome = gateway.register(url).await.unwrap();
        assert_eq!(
            outcome,
            RegistrationOutcome::Rejected(RejectReason::NotAccessible)
        );
        assert!(watch_list.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_registration_is_noop_readd() {
        let url = "https://www.icorsi.ch/course/view.php?id=7";
        let fetcher = ScriptedFetcher::new()
            .script(url, vec![Ok(course_page("Intro to Systems", &[]))]);
        let (gateway, _, watch_list) = build(fetcher);

        let first = gateway.register(url).await.unwrap();
        let second = gateway.register(url).await.unwrap();
        assert!(matches!(first, RegistrationOutcome::Accepted(_)));
        assert!(matches!(second, RegistrationOutcome::Accepted(_)));
        assert_eq!(watch_list.len(), 1);
    }
}
