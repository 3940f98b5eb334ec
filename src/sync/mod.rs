//! Product-table sync: option resolution, record reconciliation and the
//! batched write run.

pub mod error;
pub mod fields;
pub mod options;
pub mod reconcile;
pub mod run_log;
pub mod runner;
pub mod throttle;

pub use error::SyncError;
pub use options::{normalize_choice, OptionMap, OptionRef, OptionResolver};
pub use reconcile::{IndexSummary, ReconcileOptions, Reconciler, SkipReason, UnmatchedSelectPolicy};
pub use runner::{RunMode, SyncReport, SyncRunner, SyncStats, SyncStatus};
pub use throttle::{FixedDelay, NoDelay, RateLimited, Throttle};
