//! Content handling module
//!
//! This module turns fetched response bodies into statements:
//! - `ContentHandler`: a registered body handler with a mime-type accept test
//! - `StatementParser`: the grammar parser a handler delegates to
//! - `ContentDispatcher`: ordered handler list, first match wins

mod dispatcher;
mod traits;

pub use dispatcher::{ContentDispatcher, DispatchOutcome};
pub use traits::{ContentError, ContentHandler, ContentResult, ParserBinding, StatementParser};

use crate::config::ContentConfig;
use crate::statement::NTriplesParser;

/// Mime types accepted by the built-in N-Triples handler unless configured otherwise
pub const DEFAULT_NTRIPLES_MIME_TYPES: &[&str] = &["application/n-triples", "application/n-quads"];

/// Creates the built-in N-Triples / N-Quads handler for the given accept list
pub fn ntriples_handler(accept: Vec<String>) -> Box<dyn ContentHandler> {
    Box::new(ParserBinding::new("n-triples", accept, NTriplesParser::new()))
}

/// Builds the dispatcher with the built-in handlers registered
///
/// Additional grammar parsers (RDF/XML, Turtle, ...) are registered by the
/// embedding crawler through [`ContentDispatcher::register`].
pub fn build_dispatcher(config: &ContentConfig) -> ContentDispatcher {
    ContentDispatcher::new().with_handler(ntriples_handler(config.ntriples_mime_types.clone()))
}
