//! Document aggregation module
//!
//! This module folds the statement stream of one fetched document into a flat
//! index record:
//! - `DocumentAggregator`: the single-use start/process/end state machine
//! - `Vocabulary`: the predicates and classes it reacts to
//! - `IndexRecord`: the record handed to an index sink

mod aggregator;
mod record;
mod vocabulary;

pub use aggregator::{AggregateOutcome, Assembled, DiscardReason, DocumentAggregator};
pub use record::IndexRecord;
pub use vocabulary::{Vocabulary, DC_NS, GEO_NS, RDF_TYPE, WON_NS};

use thiserror::Error;

/// Errors raised by the aggregator
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AggregateError {
    /// The start/statements/end protocol was violated
    #[error("Document framing violated: {0}")]
    Framing(String),
}

/// Result type for aggregation operations
pub type AggregateResult<T> = Result<T, AggregateError>;
