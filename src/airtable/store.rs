use anyhow::Result;
use async_trait::async_trait;

use super::models::{Record, TableSchema, UpdatePayload};

/// Airtable accepts at most this many records per PATCH call.
pub const MAX_RECORDS_PER_WRITE: usize = 10;

/// The remote operations the sync pipeline depends on.
///
/// [`super::AirtableClient`] talks to the real API; tests plug in an
/// in-memory implementation.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Table metadata for the whole base.
    async fn fetch_tables(&self) -> Result<Vec<TableSchema>>;

    /// Every record of `table`, optionally restricted to a saved view.
    async fn list_records(&self, table: &str, view: Option<&str>) -> Result<Vec<Record>>;

    /// Write one chunk of at most [`MAX_RECORDS_PER_WRITE`] updates.
    /// All-or-nothing per call.
    async fn update_records(&self, table: &str, records: &[UpdatePayload]) -> Result<()>;
}
