//! Shared test doubles for the pipeline tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::services::{FetchedPage, Notifier, NotifyData, PageFetcher};

#[derive(Clone)]
enum Step {
    Page {
        final_url: Option<String>,
        html: String,
    },
    Fail(String),
}

/// Fetcher returning scripted responses per URL. The last entry of a
/// script is sticky so repeated sweeps keep seeing it.
pub(crate) struct ScriptedFetcher {
    scripts: HashMap<String, VecDeque<Step>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self {
            scripts: HashMap::new(),
        }
    }

    pub fn script(mut self, url: &str, steps: Vec<std::result::Result<String, String>>) -> Self {
        let steps = steps
            .into_iter()
            .map(|step| match step {
                Ok(html) => Step::Page {
                    final_url: None,
                    html,
                },
                Err(message) => Step::Fail(message),
            })
            .collect();
        self.scripts.insert(url.to_string(), steps);
        self
    }

    /// Script a page whose fetch resolves to a different final URL
    /// (redirect).
    pub fn script_redirect(mut self, url: &str, final_url: &str, html: String) -> Self {
        self.scripts.insert(
            url.to_string(),
            VecDeque::from(vec![Step::Page {
                final_url: Some(final_url.to_string()),
                html,
            }]),
        );
        self
    }
}

#[async_trait]
impl PageFetcher for ScriptedFetcher {
    async fn fetch_when_ready(&mut self, url: &str, _marker_selector: &str) -> Result<FetchedPage> {
        let queue = self
            .scripts
            .get_mut(url)
            .unwrap_or_else(|| panic!("no script for {url}"));
        let step = if queue.len() > 1 {
            queue.pop_front().unwrap()
        } else {
            queue.front().cloned().unwrap()
        };
        match step {
            Step::Page { final_url, html } => Ok(FetchedPage {
                final_url: final_url.unwrap_or_else(|| url.to_string()),
                html,
            }),
            Step::Fail(message) => Err(AppError::fetch(url, message)),
        }
    }
}

/// Notifier recording every payload it is handed.
pub(crate) struct RecordingNotifier {
    sent: Mutex<Vec<NotifyData>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn payloads(&self) -> Vec<NotifyData> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, data: &NotifyData) -> Result<()> {
        self.sent.lock().unwrap().push(data.clone());
        Ok(())
    }
}

/// Minimal course page markup with a heading and the given items.
pub(crate) fn course_page(heading: &str, item_lines: &[(&str, &str, &str)]) -> String {
    let items: String = item_lines
        .iter()
        .map(|(name, kind, link)| {
            format!(
                r#"<li data-for="cmitem"><a href="{link}">
                <span class="instancename">{name} <span class="accesshide"> {kind}</span></span>
                </a></li>"#
            )
        })
        .collect();
    format!(
        r#"<html><body>
        <div class="page-header-headings"><h1>{heading}</h1></div>
        <ul>{items}</ul>
        </body></html>"#
    )
}
