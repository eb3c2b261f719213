//! Page fetcher collaborator.
//!
//! The scheduler and the registration gateway both talk to the remote
//! site through [`PageFetcher`]. The trait models a single stateful
//! browsing session: callers take `&mut self`, and the shared instance
//! is kept behind a `tokio::sync::Mutex` so at most one fetch is in
//! flight at a time.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};

use crate::error::{AppError, Result};
use crate::models::FetcherConfig;

/// A fetched page: the URL the request finally resolved to (after
/// redirects) and the raw markup.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub final_url: String,
    pub html: String,
}

/// Capability to fetch a page and wait until a marker element is
/// present, failing after a bounded wait.
#[async_trait]
pub trait PageFetcher: Send {
    /// Fetch `url` and return it once an element matching
    /// `marker_selector` is present in the markup, or fail with
    /// [`AppError::Fetch`] when the bounded wait elapses first.
    async fn fetch_when_ready(&mut self, url: &str, marker_selector: &str) -> Result<FetchedPage>;
}

/// Default fetcher backed by a plain reqwest client.
///
/// The "wait until marker present" primitive is implemented by
/// re-fetching the page until the marker shows up or the load timeout
/// elapses. An authenticated (cookie-carrying) client can be injected
/// via [`HttpFetcher::with_client`] without touching the core.
pub struct HttpFetcher {
    client: Client,
    load_timeout: Duration,
    poll_delay: Duration,
}

impl HttpFetcher {
    /// Create a fetcher with a client built from the configuration.
    pub fn new(config: &FetcherConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self::with_client(client, config))
    }

    /// Create a fetcher around an existing client (e.g. one carrying
    /// session cookies).
    pub fn with_client(client: Client, config: &FetcherConfig) -> Self {
        Self {
            client,
            load_timeout: Duration::from_secs(config.page_load_timeout_secs),
            poll_delay: Duration::from_millis(config.marker_poll_delay_ms),
        }
    }

    async fn fetch_once(&self, url: &str) -> Result<FetchedPage> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::fetch(url, format!("status {status}")));
        }
        let final_url = response.url().to_string();
        let html = response.text().await?;
        Ok(FetchedPage { final_url, html })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch_when_ready(&mut self, url: &str, marker_selector: &str) -> Result<FetchedPage> {
        let deadline = Instant::now() + self.load_timeout;
        loop {
            let page = self.fetch_once(url).await?;
            if marker_present(&page.html, marker_selector)? {
                return Ok(page);
            }
            if Instant::now() + self.poll_delay >= deadline {
                return Err(AppError::fetch(
                    url,
                    format!("timed out waiting for marker '{marker_selector}'"),
                ));
            }
            tokio::time::sleep(self.poll_delay).await;
        }
    }
}

/// Check whether `selector` matches anything in `html`.
///
/// Synchronous on purpose: the parsed document is not `Send` and must
/// not be held across an await point.
fn marker_present(html: &str, selector: &str) -> Result<bool> {
    let marker = Selector::parse(selector).map_err(|e| AppError::selector(selector, format!("{e:?}")))?;
    let document = Html::parse_document(html);
    Ok(document.select(&marker).next().is_some())
}
