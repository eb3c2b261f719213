// src/lib.rs

//! coursewatch library: watches course pages for content changes and
//! notifies when items are added or removed.

pub mod error;
pub mod logging;
pub mod models;
pub mod pipeline;
pub mod server;
pub mod services;
