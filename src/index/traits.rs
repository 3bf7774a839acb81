//! Index sink trait and error types

use crate::aggregate::IndexRecord;
use thiserror::Error;

/// Errors that can occur while writing to an index backend
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Index rejected request with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Index lock poisoned")]
    Poisoned,

    #[error("Index write failed: {0}")]
    WriteFailed(String),
}

/// Result type for index operations
pub type IndexResult<T> = Result<T, IndexError>;

/// Receives finished document records
///
/// Every `write` is one blocking round trip that replaces any earlier record
/// with the same URL. Callers do not retry failed writes.
pub trait IndexSink: Send + Sync {
    /// Writes one record
    fn write(&self, record: &IndexRecord) -> IndexResult<()>;

    /// Makes all written records visible; called once when the crawl ends
    fn commit(&self) -> IndexResult<()> {
        Ok(())
    }

    /// Short backend name for logging
    fn name(&self) -> &str;
}
