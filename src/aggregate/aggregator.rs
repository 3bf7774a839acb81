//! Per-document statement aggregator
//!
//! One aggregator handles exactly one document:
//!
//! ```text
//! CREATED --start--> COLLECTING --end--> FLUSHED | DISCARDED
//!                               --abort--> DISCARDED
//! ```
//!
//! `end` and `abort` consume the aggregator, so a finished aggregator cannot be
//! reused for another document.

use crate::aggregate::{AggregateError, AggregateResult, IndexRecord, Vocabulary};
use crate::index::IndexSink;
use crate::statement::Statement;
use regex::Regex;
use std::sync::{Arc, OnceLock};
use url::Url;

fn hashtag_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"#\w+").ok()).as_ref()
}

/// Why a document did not reach the index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardReason {
    /// No statement typed any subject with the need class
    NotClassified,

    /// The document produced no statements at all
    NoStatements,

    /// The body could not be parsed
    Aborted,
}

/// Terminal state of an aggregator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AggregateOutcome {
    /// The record was written to the index
    Flushed { url: String },

    /// The record was assembled but the index rejected it; it is not retried
    WriteFailed { url: String },

    /// Nothing was written
    Discarded(DiscardReason),
}

/// Result of assembling a document without writing it
#[derive(Debug, Clone, PartialEq)]
pub enum Assembled {
    Ready(IndexRecord),
    Discarded(DiscardReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Created,
    Collecting,
}

/// Accumulates the statements of one document into an [`IndexRecord`]
#[derive(Debug)]
pub struct DocumentAggregator {
    provenance: Url,
    vocabulary: Arc<Vocabulary>,
    phase: Phase,
    document_url: Option<String>,
    ntriples: String,
    statements: usize,
    classified: bool,
    title: Option<String>,
    description: Option<String>,
    category: Option<String>,
    tags: Vec<String>,
    price_lower: Option<f64>,
    price_upper: Option<f64>,
    latitude: Option<f64>,
    longitude: Option<f64>,
}

impl DocumentAggregator {
    /// Creates an aggregator for the document fetched from `provenance`
    pub fn new(provenance: Url, vocabulary: Arc<Vocabulary>) -> Self {
        Self {
            provenance,
            vocabulary,
            phase: Phase::Created,
            document_url: None,
            ntriples: String::new(),
            statements: 0,
            classified: false,
            title: None,
            description: None,
            category: None,
            tags: Vec::new(),
            price_lower: None,
            price_upper: None,
            latitude: None,
            longitude: None,
        }
    }

    pub fn provenance(&self) -> &Url {
        &self.provenance
    }

    /// Number of statements processed so far
    pub fn statement_count(&self) -> usize {
        self.statements
    }

    /// Begins the document
    pub fn start(&mut self) -> AggregateResult<()> {
        if self.phase != Phase::Created {
            return Err(AggregateError::Framing(format!(
                "start called twice for {}",
                self.provenance
            )));
        }
        *self = Self::new(self.provenance.clone(), Arc::clone(&self.vocabulary));
        self.phase = Phase::Collecting;
        tracing::debug!("Started document {}", self.provenance);
        Ok(())
    }

    /// Folds one statement into the document
    pub fn process(&mut self, statement: &Statement) -> AggregateResult<()> {
        if self.phase != Phase::Collecting {
            return Err(AggregateError::Framing(format!(
                "statement received outside of document {}",
                self.provenance
            )));
        }

        self.ntriples.push_str(&statement.to_ntriples());
        self.ntriples.push('\n');
        self.statements += 1;

        let Some(predicate) = statement.predicate.as_iri() else {
            return Ok(());
        };
        let vocabulary = Arc::clone(&self.vocabulary);
        let object = statement.object.lexical();

        if predicate == vocabulary.has_connections && self.document_url.is_none() {
            tracing::debug!("Document URL of {} is {}", self.provenance, statement.subject.lexical());
            self.document_url = Some(statement.subject.lexical().to_string());
        }

        if predicate == vocabulary.type_predicate
            && statement.object.as_iri() == Some(vocabulary.need_class.as_str())
        {
            self.classified = true;
        }

        if predicate == vocabulary.title && self.title.is_none() {
            self.title = Some(object.to_string());
            self.add_hashtags(object);
        }
        if predicate == vocabulary.description && self.description.is_none() {
            self.description = Some(object.to_string());
            self.add_hashtags(object);
        }
        if predicate == vocabulary.category && self.category.is_none() {
            self.category = Some(object.to_string());
        }
        if predicate == vocabulary.tag {
            self.tags.push(object.to_string());
        }

        if predicate == vocabulary.price_lower {
            set_number(&mut self.price_lower, "lower price", object);
        }
        if predicate == vocabulary.price_upper {
            set_number(&mut self.price_upper, "upper price", object);
        }
        if predicate == vocabulary.latitude {
            set_number(&mut self.latitude, "latitude", object);
        }
        if predicate == vocabulary.longitude {
            set_number(&mut self.longitude, "longitude", object);
        }

        Ok(())
    }

    fn add_hashtags(&mut self, text: &str) {
        if let Some(pattern) = hashtag_pattern() {
            self.tags
                .extend(pattern.find_iter(text).map(|m| m.as_str().to_string()));
        }
    }

    /// Ends the document without writing anything
    pub fn abort(self) -> AggregateOutcome {
        tracing::debug!("Aborted document {}", self.provenance);
        AggregateOutcome::Discarded(DiscardReason::Aborted)
    }

    /// Ends the document and assembles its record without writing it
    pub fn finish(self) -> AggregateResult<Assembled> {
        if self.phase != Phase::Collecting {
            return Err(AggregateError::Framing(format!(
                "end called before start for {}",
                self.provenance
            )));
        }

        if self.statements == 0 {
            tracing::debug!("Not indexing {}: no statements", self.provenance);
            return Ok(Assembled::Discarded(DiscardReason::NoStatements));
        }
        if !self.classified {
            tracing::debug!("Not indexing {}: not typed as a need", self.provenance);
            return Ok(Assembled::Discarded(DiscardReason::NotClassified));
        }

        let url = match self.document_url {
            Some(url) => url,
            None => {
                tracing::warn!(
                    "No document URL found in {}, using the fetched URI",
                    self.provenance
                );
                self.provenance.to_string()
            }
        };

        let location = match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) if lat != 0.0 && lon != 0.0 => Some(format!("{},{}", lat, lon)),
            _ => None,
        };

        Ok(Assembled::Ready(IndexRecord {
            url,
            ntriple: self.ntriples,
            title: self.title,
            description: self.description,
            category: self.category,
            location,
            price_lower: self.price_lower,
            price_upper: self.price_upper,
            tag: self.tags,
        }))
    }

    /// Ends the document and writes its record to `sink` if it qualifies
    ///
    /// A failed index write is logged and reported as
    /// [`AggregateOutcome::WriteFailed`]; it is not an error of this call.
    pub fn end(self, sink: &dyn IndexSink) -> AggregateResult<AggregateOutcome> {
        let record = match self.finish()? {
            Assembled::Ready(record) => record,
            Assembled::Discarded(reason) => return Ok(AggregateOutcome::Discarded(reason)),
        };

        match sink.write(&record) {
            Ok(()) => {
                tracing::debug!("Indexed document {}", record.url);
                Ok(AggregateOutcome::Flushed { url: record.url })
            }
            Err(e) => {
                tracing::error!("Failed to index document {}: {}", record.url, e);
                Ok(AggregateOutcome::WriteFailed { url: record.url })
            }
        }
    }
}

/// Parses a numeric literal into an unset field; failures leave it unset
fn set_number(field: &mut Option<f64>, name: &str, text: &str) {
    if field.is_some() {
        return;
    }
    match text.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => *field = Some(value),
        Ok(_) => tracing::warn!("Ignoring non-finite {} '{}'", name, text),
        Err(e) => tracing::warn!("Could not parse {} '{}': {}", name, text, e),
    }
}
