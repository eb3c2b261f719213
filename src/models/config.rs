//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Control endpoint settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Polling and target admission settings
    #[serde(default)]
    pub watch: WatchConfig,

    /// HTTP fetcher settings
    #[serde(default)]
    pub fetcher: FetcherConfig,

    /// Page markup markers (CSS selectors)
    #[serde(default)]
    pub markers: MarkerConfig,

    /// Outbound notification settings
    #[serde(default)]
    pub notifier: NotifierConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration, falling back to defaults if loading fails.
    ///
    /// The load error is returned alongside the defaults instead of
    /// being logged here: callers typically load config before the
    /// tracing subscriber exists, and a warning emitted that early
    /// would be dropped.
    pub fn load_with_fallback(path: impl AsRef<Path>) -> (Self, Option<AppError>) {
        match Self::load(&path) {
            Ok(config) => (config, None),
            Err(error) => (Self::default(), Some(error)),
        }
    }

    /// Validate configuration values for basic sanity.
    ///
    /// Selector strings are checked here so a bad selector fails at
    /// startup instead of on every poll cycle.
    pub fn validate(&self) -> Result<()> {
        if self.watch.allowed_url_prefix.trim().is_empty() {
            return Err(AppError::validation("watch.allowed_url_prefix is empty"));
        }
        url::Url::parse(&self.watch.allowed_url_prefix)
            .map_err(|e| AppError::validation(format!("watch.allowed_url_prefix: {e}")))?;
        if self.watch.poll_interval_secs == 0 {
            return Err(AppError::validation("watch.poll_interval_secs must be > 0"));
        }
        if self.fetcher.timeout_secs == 0 {
            return Err(AppError::validation("fetcher.timeout_secs must be > 0"));
        }
        if self.fetcher.page_load_timeout_secs == 0 {
            return Err(AppError::validation(
                "fetcher.page_load_timeout_secs must be > 0",
            ));
        }
        if self.fetcher.marker_poll_delay_ms == 0 {
            return Err(AppError::validation(
                "fetcher.marker_poll_delay_ms must be > 0",
            ));
        }
        if self.fetcher.user_agent.trim().is_empty() {
            return Err(AppError::validation("fetcher.user_agent is empty"));
        }
        if self.notifier.webhook_url.trim().is_empty() {
            return Err(AppError::validation("notifier.webhook_url is empty"));
        }
        for selector in [
            &self.markers.heading_selector,
            &self.markers.item_selector,
            &self.markers.name_selector,
            &self.markers.kind_selector,
            &self.markers.link_selector,
        ] {
            scraper::Selector::parse(selector)
                .map_err(|e| AppError::selector(selector.clone(), format!("{e:?}")))?;
        }
        Ok(())
    }
}

/// Control endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the control endpoint binds to
    #[serde(default = "defaults::bind_addr")]
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: defaults::bind_addr(),
        }
    }
}

/// Polling cadence and target admission rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Candidate URLs must start with this prefix
    #[serde(default = "defaults::allowed_url_prefix")]
    pub allowed_url_prefix: String,

    /// Seconds between sweeps over all watched targets
    #[serde(default = "defaults::poll_interval")]
    pub poll_interval_secs: u64,

    /// Heading text of the site's generic landing page; candidates
    /// resolving to it are rejected
    #[serde(default = "defaults::landing_page_title")]
    pub landing_page_title: String,

    /// Substring in the resolved URL indicating an enrollment-required
    /// redirect
    #[serde(default = "defaults::enrol_url_marker")]
    pub enrol_url_marker: String,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            allowed_url_prefix: defaults::allowed_url_prefix(),
            poll_interval_secs: defaults::poll_interval(),
            landing_page_title: defaults::landing_page_title(),
            enrol_url_marker: defaults::enrol_url_marker(),
        }
    }
}

/// HTTP client behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetcherConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Per-request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Bounded wait for the page marker to appear, in seconds
    #[serde(default = "defaults::page_load_timeout")]
    pub page_load_timeout_secs: u64,

    /// Delay between marker re-checks in milliseconds
    #[serde(default = "defaults::marker_poll_delay")]
    pub marker_poll_delay_ms: u64,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            page_load_timeout_secs: defaults::page_load_timeout(),
            marker_poll_delay_ms: defaults::marker_poll_delay(),
        }
    }
}

/// CSS selectors identifying the markup nodes the watcher cares about.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkerConfig {
    /// Page heading; doubles as the content-ready marker
    #[serde(default = "defaults::heading_selector")]
    pub heading_selector: String,

    /// Nodes carrying the course item marker
    #[serde(default = "defaults::item_selector")]
    pub item_selector: String,

    /// Primary label node within an item
    #[serde(default = "defaults::name_selector")]
    pub name_selector: String,

    /// Secondary label node within the name node
    #[serde(default = "defaults::kind_selector")]
    pub kind_selector: String,

    /// Anchor carrying the item's target reference
    #[serde(default = "defaults::link_selector")]
    pub link_selector: String,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            heading_selector: defaults::heading_selector(),
            item_selector: defaults::item_selector(),
            name_selector: defaults::name_selector(),
            kind_selector: defaults::kind_selector(),
            link_selector: defaults::link_selector(),
        }
    }
}

/// Outbound notification settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NotifierConfig {
    /// Webhook URL receiving `{"data": ...}` payloads
    #[serde(default)]
    pub webhook_url: String,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter ("debug", "info", "warn", "error")
    #[serde(default = "defaults::log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
        }
    }
}

/// Default values for configuration fields.
mod defaults {
    pub fn bind_addr() -> String {
        "127.0.0.1:8080".to_string()
    }

    pub fn allowed_url_prefix() -> String {
        "https://www.icorsi.ch/".to_string()
    }

    pub fn poll_interval() -> u64 {
        60
    }

    pub fn landing_page_title() -> String {
        "iCorsi".to_string()
    }

    pub fn enrol_url_marker() -> String {
        "enrol".to_string()
    }

    pub fn user_agent() -> String {
        format!("coursewatch/{}", env!("CARGO_PKG_VERSION"))
    }

    pub fn timeout() -> u64 {
        30
    }

    pub fn page_load_timeout() -> u64 {
        30
    }

    pub fn marker_poll_delay() -> u64 {
        1000
    }

    pub fn heading_selector() -> String {
        "div.page-header-headings".to_string()
    }

    pub fn item_selector() -> String {
        "li[data-for=\"cmitem\"]".to_string()
    }

    pub fn name_selector() -> String {
        "span.instancename".to_string()
    }

    pub fn kind_selector() -> String {
        "span.accesshide".to_string()
    }

    pub fn link_selector() -> String {
        "a".to_string()
    }

    pub fn log_level() -> String {
        "info".to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn valid_config() -> Config {
        Config {
            notifier: NotifierConfig {
                webhook_url: "https://hooks.example.com/abc".to_string(),
            },
            ..Config::default()
        }
    }

    #[test]
    fn test_defaults_validate() {
        let config = valid_config();
        assert!(config.validate().is_ok());
        assert_eq!(config.watch.poll_interval_secs, 60);
        assert_eq!(config.markers.item_selector, "li[data-for=\"cmitem\"]");
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let mut config = valid_config();
        config.watch.poll_interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_selector() {
        let mut config = valid_config();
        config.markers.item_selector = "[[invalid".to_string();
        assert!(matches!(
            config.validate().unwrap_err(),
            AppError::Selector { .. }
        ));
    }

    #[test]
    fn test_validate_rejects_missing_webhook() {
        let config = Config::default();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[watch]
poll_interval_secs = 15

[notifier]
webhook_url = "https://hooks.example.com/xyz"
"#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.watch.poll_interval_secs, 15);
        assert_eq!(config.notifier.webhook_url, "https://hooks.example.com/xyz");
        // Unspecified sections fall back to defaults
        assert_eq!(config.server.bind_addr, "127.0.0.1:8080");
    }

    #[test]
    fn test_validate_rejects_zero_poll_delay() {
        let mut config = valid_config();
        config.fetcher.marker_poll_delay_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_with_fallback_on_missing_file() {
        let (config, error) = Config::load_with_fallback("/nonexistent/config.toml");
        assert_eq!(config.watch.poll_interval_secs, 60);
        assert!(matches!(error, Some(AppError::Io(_))));
    }

    #[test]
    fn test_load_with_fallback_surfaces_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "not valid toml [[[").unwrap();

        let (config, error) = Config::load_with_fallback(file.path());
        assert_eq!(config.watch.poll_interval_secs, 60);
        assert!(matches!(error, Some(AppError::Toml(_))));
    }
}
