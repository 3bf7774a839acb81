//! Index module for flushed documents
//!
//! This module holds the backends that receive finished document records:
//! - `SqliteIndex`: local SQLite database (default)
//! - `SolrIndex`: JSON update handler of a Solr core
//! - `MemoryIndex`: in-memory collection for tests and dry runs

mod memory;
mod schema;
mod solr;
mod sqlite;
mod traits;

pub use memory::MemoryIndex;
pub use solr::SolrIndex;
pub use sqlite::SqliteIndex;
pub use traits::{IndexError, IndexResult, IndexSink};

use crate::config::{IndexBackend, IndexConfig};
use crate::ConfigError;
use crate::SpiderError;
use std::path::Path;
use std::sync::Arc;
use url::Url;

/// Opens the index backend selected by the configuration
///
/// # Arguments
///
/// * `config` - The index configuration
///
/// # Returns
///
/// * `Ok(Arc<dyn IndexSink>)` - The opened backend
/// * `Err(SpiderError)` - The backend is misconfigured or could not be opened
pub fn open_index(config: &IndexConfig) -> Result<Arc<dyn IndexSink>, SpiderError> {
    match config.backend {
        IndexBackend::Sqlite => {
            let path = config.database_path.as_deref().ok_or_else(|| {
                ConfigError::Validation("database_path is required for the sqlite index backend".to_string())
            })?;
            Ok(Arc::new(SqliteIndex::new(Path::new(path))?))
        }
        IndexBackend::Solr => {
            let raw = config.solr_url.as_deref().ok_or_else(|| {
                ConfigError::Validation("solr_url is required for the solr index backend".to_string())
            })?;
            let url = Url::parse(raw)?;
            Ok(Arc::new(SolrIndex::new(&url)?))
        }
        IndexBackend::Memory => Ok(Arc::new(MemoryIndex::new())),
    }
}
