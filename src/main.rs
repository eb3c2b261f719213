// src/main.rs

//! coursewatch: course page change watcher.
//!
//! Spawns the poll scheduler as a background task, then serves the
//! control endpoint for registering new watch targets.

use std::sync::Arc;

use clap::Parser;
use tokio::sync::Mutex;
use tracing::{info, warn};

use coursewatch::error::Result;
use coursewatch::logging;
use coursewatch::models::{Config, WatchList};
use coursewatch::pipeline::{PollScheduler, RegistrationGateway, SharedFetcher};
use coursewatch::server::{self, AppState};
use coursewatch::services::{
    HttpFetcher, ItemExtractor, Notifier, PageFetcher, SnapshotStore, WebhookNotifier,
};

#[derive(Parser, Debug)]
#[command(
    name = "coursewatch",
    version,
    about = "Watches course pages for added/removed materials"
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "data/config.toml")]
    config: String,

    /// Override the control endpoint bind address
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let (mut config, load_error) = Config::load_with_fallback(&cli.config);
    if let Some(bind) = cli.bind {
        config.server.bind_addr = bind;
    }

    logging::init(&config.logging.level);
    if let Some(error) = load_error {
        warn!(path = %cli.config, %error, "config load failed, using defaults");
    }
    config.validate()?;

    let watch_list = Arc::new(WatchList::new());
    let store = Arc::new(SnapshotStore::new());
    let extractor = Arc::new(ItemExtractor::new(&config.markers)?);

    let fetcher: SharedFetcher = Arc::new(Mutex::new(
        Box::new(HttpFetcher::new(&config.fetcher)?) as Box<dyn PageFetcher>,
    ));
    let notifier: Arc<dyn Notifier> = Arc::new(WebhookNotifier::new(
        reqwest::Client::new(),
        config.notifier.webhook_url.clone(),
    ));

    // The scheduler task starts before the control endpoint accepts
    // registrations and only ends with the process.
    let scheduler = Arc::new(PollScheduler::new(
        &config,
        Arc::clone(&watch_list),
        Arc::clone(&store),
        Arc::clone(&fetcher),
        Arc::clone(&notifier),
        Arc::clone(&extractor),
    ));
    tokio::spawn(Arc::clone(&scheduler).run());

    let gateway = Arc::new(RegistrationGateway::new(
        &config,
        Arc::clone(&watch_list),
        fetcher,
        notifier,
        extractor,
    ));

    info!(
        prefix = %config.watch.allowed_url_prefix,
        interval_secs = config.watch.poll_interval_secs,
        "coursewatch starting"
    );

    server::serve(
        AppState {
            gateway,
            watch_list,
            store,
        },
        &config.server.bind_addr,
    )
    .await
}
