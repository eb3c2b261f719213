// src/models/mod.rs

//! Domain models for the watcher application.
//!
//! This module contains all data structures used throughout the
//! application, organized by their primary purpose.

mod config;
mod item;
mod target;

// Re-export all public types
pub use config::{
    Config, FetcherConfig, LoggingConfig, MarkerConfig, NotifierConfig, ServerConfig, WatchConfig,
};
pub use item::{Delta, Item, Snapshot};
pub use target::{WatchList, WatchTarget};
