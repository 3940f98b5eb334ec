use thiserror::Error;

/// Ways a sync run can stop. Every variant aborts the run; nothing is retried.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("unauthorized: invalid sync password")]
    Unauthorized,

    #[error("failed to fetch base schema: {0}")]
    SchemaFetch(String),

    #[error("table '{0}' not found in base schema")]
    TableNotFound(String),

    #[error("failed to fetch records from '{table}': {message}")]
    SourceFetch { table: String, message: String },

    /// Earlier batches (`written` records) stay committed.
    #[error("batch {batch}/{total} failed after {written} records were written: {message}")]
    WriteBatch {
        batch: usize,
        total: usize,
        written: usize,
        message: String,
    },
}

impl SyncError {
    pub fn source_fetch(table: &str, err: &anyhow::Error) -> Self {
        Self::SourceFetch {
            table: table.to_string(),
            message: format!("{err:#}"),
        }
    }

    /// Short machine-readable kind, used in API responses.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::SchemaFetch(_) => "schema_fetch",
            Self::TableNotFound(_) => "table_not_found",
            Self::SourceFetch { .. } => "source_fetch",
            Self::WriteBatch { .. } => "write_batch",
        }
    }
}
