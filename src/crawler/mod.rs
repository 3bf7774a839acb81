//! Crawler module: fetching and ingestion
//!
//! This module connects the library to the network, including:
//! - HTTP fetching of single documents
//! - The ingestion pipeline from response to index record
//! - A concurrent driver for lists of URIs

mod coordinator;
mod fetcher;
mod pipeline;

pub use coordinator::{CrawlSummary, Crawler};
pub use fetcher::{
    build_http_client, display_header_name, fetch_document, FetchError, FetchedResponse,
    ACCEPT_RDF,
};
pub use pipeline::{IngestPipeline, IngestReport};
