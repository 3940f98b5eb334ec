pub mod client;
pub mod models;
pub mod store;

pub use client::AirtableClient;
pub use models::{Record, TableSchema, UpdatePayload};
pub use store::{RecordStore, MAX_RECORDS_PER_WRITE};
