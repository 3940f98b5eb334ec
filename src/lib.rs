pub mod airtable;
pub mod api;
pub mod config;
pub mod normalization;
pub mod sync;
pub mod telemetry;

pub mod util {
    pub mod env;
}

pub use config::SyncConfig;
pub use sync::{SyncReport, SyncRunner};
