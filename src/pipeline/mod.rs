//! Pipeline layer: diffing, scheduling, and target registration.
//!
//! - `diff`: pure set difference between consecutive snapshots
//! - `scheduler`: the periodic poll-diff-notify loop
//! - `register`: validation and admission of new watch targets

pub mod diff;
pub mod register;
pub mod scheduler;

#[cfg(test)]
pub(crate) mod test_support;

pub use diff::diff;
pub use register::{RegistrationGateway, RegistrationOutcome, RejectReason};
pub use scheduler::{PollScheduler, SharedFetcher, SweepOutcome};
