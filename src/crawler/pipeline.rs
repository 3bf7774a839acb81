//! Document ingestion pipeline
//!
//! Runs one fetched response through the header reifier and the content
//! dispatcher into a fresh document aggregator, and derives the next expiry.

use crate::aggregate::{AggregateOutcome, DocumentAggregator, Vocabulary};
use crate::config::{Config, MAX_DEFAULT_TTL_SECS};
use crate::content::{build_dispatcher, ContentDispatcher, DispatchOutcome};
use crate::crawler::FetchedResponse;
use crate::headers::HeaderReifier;
use crate::index::IndexSink;
use crate::statement::Statement;
use crate::store::{expiry_from_headers, Expiry};
use crate::Result;
use chrono::{Duration, Utc};
use std::sync::Arc;

/// What happened to one fetched response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    /// Number of statements produced from the response headers
    pub header_statements: usize,

    /// Outcome of parsing the body; `None` if the body was not offered
    /// to a handler (non-2xx status or no content type)
    pub dispatch: Option<DispatchOutcome>,

    /// Terminal state of the document
    pub outcome: AggregateOutcome,

    /// Expiry to register for the fetched URI
    pub expiry: Expiry,
}

/// Turns fetched responses into index records
pub struct IngestPipeline {
    reifier: HeaderReifier,
    dispatcher: ContentDispatcher,
    vocabulary: Arc<Vocabulary>,
    sink: Arc<dyn IndexSink>,
    default_ttl: Duration,
}

impl IngestPipeline {
    pub fn new(
        reifier: HeaderReifier,
        dispatcher: ContentDispatcher,
        vocabulary: Arc<Vocabulary>,
        sink: Arc<dyn IndexSink>,
        default_ttl: Duration,
    ) -> Self {
        Self {
            reifier,
            dispatcher,
            vocabulary,
            sink,
            default_ttl,
        }
    }

    /// Builds the pipeline described by the configuration
    pub fn from_config(config: &Config, sink: Arc<dyn IndexSink>) -> Self {
        Self::new(
            HeaderReifier::default(),
            build_dispatcher(&config.content),
            Arc::new(config.vocabulary.clone()),
            sink,
            Duration::seconds(config.crawler.default_ttl_secs.min(MAX_DEFAULT_TTL_SECS) as i64),
        )
    }

    /// Registers an additional body handler behind the configured ones
    pub fn dispatcher_mut(&mut self) -> &mut ContentDispatcher {
        &mut self.dispatcher
    }

    pub fn sink(&self) -> &Arc<dyn IndexSink> {
        &self.sink
    }

    /// Ingests one response
    ///
    /// Header statements are processed first, then the body statements. A body
    /// that fails to parse aborts the document; nothing is written for it.
    ///
    /// # Errors
    ///
    /// Only contract violations are errors: a malformed statement from a body
    /// handler or broken aggregator framing.
    pub fn ingest(&self, response: &FetchedResponse) -> Result<IngestReport> {
        let uri = response.uri.as_str();
        let mut aggregator =
            DocumentAggregator::new(response.uri.clone(), Arc::clone(&self.vocabulary));
        aggregator.start()?;

        let header_statements = self.reifier.reify(uri, response.status, &response.headers);
        for statement in &header_statements {
            aggregator.process(statement)?;
        }

        let dispatch = match response.content_type.as_deref() {
            Some(mime) if response.is_success() => {
                let mut violation = None;
                let mut body = response.body.as_slice();
                let mut forward = |statement: Statement| {
                    if violation.is_none() {
                        if let Err(e) = aggregator.process(&statement) {
                            violation = Some(e);
                        }
                    }
                };
                let outcome = self.dispatcher.dispatch(uri, mime, &mut body, &mut forward)?;
                if let Some(e) = violation {
                    return Err(e.into());
                }
                Some(outcome)
            }
            Some(_) => {
                tracing::debug!("Not parsing body of {}: status {}", uri, response.status);
                None
            }
            None => {
                tracing::debug!("Not parsing body of {}: no content type", uri);
                None
            }
        };

        let outcome = match dispatch {
            Some(DispatchOutcome::Failed) => aggregator.abort(),
            _ => aggregator.end(self.sink.as_ref())?,
        };

        let expiry = expiry_from_headers(&response.headers, Utc::now(), self.default_ttl);
        tracing::info!("Ingested {} ({}): {:?}", uri, response.status, outcome);

        Ok(IngestReport {
            header_statements: header_statements.len(),
            dispatch,
            outcome,
            expiry,
        })
    }
}
