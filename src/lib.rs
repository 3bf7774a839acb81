//! Linkspider: revisit scheduling and document ingestion for a Linked-Data crawler
//!
//! This crate sits between "should I fetch this resource?" and "what index record
//! did this fetch produce?". It keeps a persisted map of resource expiry dates,
//! turns HTTP response metadata and RDF bodies into statements, and aggregates the
//! statements of each document into a flat record for a search index.

pub mod aggregate;
pub mod config;
pub mod content;
pub mod crawler;
pub mod filter;
pub mod headers;
pub mod index;
pub mod statement;
pub mod store;

use thiserror::Error;

/// Main error type for linkspider operations
#[derive(Debug, Error)]
pub enum SpiderError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Revisit store error: {0}")]
    Store(#[from] store::StoreError),

    #[error("Malformed statement: {0}")]
    Statement(#[from] statement::StatementError),

    #[error("Content error: {0}")]
    Content(#[from] content::ContentError),

    #[error("Aggregation error: {0}")]
    Aggregate(#[from] aggregate::AggregateError),

    #[error("Index error: {0}")]
    Index(#[from] index::IndexError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] crawler::FetchError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Worker task failed: {0}")]
    Task(String),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for linkspider operations
pub type Result<T> = std::result::Result<T, SpiderError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use aggregate::{AggregateOutcome, DocumentAggregator, IndexRecord, Vocabulary};
pub use config::Config;
pub use content::{ContentDispatcher, ContentHandler, DispatchOutcome};
pub use crawler::{Crawler, FetchedResponse, IngestPipeline, IngestReport};
pub use filter::{AllowOnlyNewOrExpired, FetchFilter};
pub use headers::{HeaderReifier, HeaderTable};
pub use index::IndexSink;
pub use statement::{Node, Statement};
pub use store::{Expiry, RevisitStore};
