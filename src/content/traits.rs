//! Content handler traits and error types
//!
//! This module defines the interface between the dispatcher and the grammar
//! parsers that turn response bodies into statements.

use crate::statement::{Node, ParseError, Statement, StatementError};
use std::io::Read;
use thiserror::Error;

/// Errors that can occur while turning a body into statements
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("Could not parse document: {0}")]
    Parse(#[from] ParseError),

    #[error("Could not read document: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parser produced a malformed statement: {0}")]
    Statement(#[from] StatementError),
}

/// Result type for content operations
pub type ContentResult<T> = Result<T, ContentError>;

/// A grammar parser producing raw statement tuples
///
/// Implementations decode the body incrementally and hand every decoded tuple
/// to `emit` before reading further. A tuple is expected to hold 3 or 4 nodes.
pub trait StatementParser: Send + Sync {
    /// Parses `body`, resolving relative references against `base`
    fn parse(
        &self,
        base: &str,
        body: &mut dyn Read,
        emit: &mut dyn FnMut(Vec<Node>) -> ContentResult<()>,
    ) -> ContentResult<()>;
}

/// A registered body handler
///
/// The dispatcher asks each handler in registration order whether it accepts
/// a mime type; the first that does parses the body.
pub trait ContentHandler: Send + Sync {
    /// Returns true if this handler accepts the given mime type
    fn can_handle(&self, mime: &str) -> bool;

    /// Parses the body, forwarding each statement to `callback` as it is decoded
    ///
    /// # Returns
    ///
    /// * `Ok(usize)` - Number of statements forwarded
    /// * `Err(ContentError)` - Parse or read failure (statements already
    ///   forwarded stay forwarded)
    fn handle(
        &self,
        uri: &str,
        mime: &str,
        body: &mut dyn Read,
        callback: &mut dyn FnMut(Statement),
    ) -> ContentResult<usize>;

    /// Short name used in log output
    fn name(&self) -> &str;
}

/// Binds a grammar parser to an accept list of mime types
///
/// `can_handle` matches when the declared mime type contains any accepted
/// entry, so `application/n-triples; charset=utf-8` is accepted by
/// `application/n-triples`.
pub struct ParserBinding<P> {
    name: String,
    accept: Vec<String>,
    parser: P,
}

impl<P: StatementParser> ParserBinding<P> {
    pub fn new(name: impl Into<String>, accept: Vec<String>, parser: P) -> Self {
        Self {
            name: name.into(),
            accept,
            parser,
        }
    }

    /// Returns the accepted mime types
    pub fn accept(&self) -> &[String] {
        &self.accept
    }
}

impl<P: StatementParser> ContentHandler for ParserBinding<P> {
    fn can_handle(&self, mime: &str) -> bool {
        self.accept.iter().any(|ct| mime.contains(ct.as_str()))
    }

    fn handle(
        &self,
        uri: &str,
        _mime: &str,
        body: &mut dyn Read,
        callback: &mut dyn FnMut(Statement),
    ) -> ContentResult<usize> {
        let mut count = 0;
        self.parser.parse(uri, body, &mut |nodes| {
            let statement = Statement::try_from(nodes)?;
            tracing::trace!("processing {}", statement);
            callback(statement);
            count += 1;
            Ok(())
        })?;
        Ok(count)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
