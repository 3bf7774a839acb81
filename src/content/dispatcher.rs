//! Content dispatcher
//!
//! Picks the first registered handler accepting the declared mime type and
//! streams the produced statements into a callback.

use crate::content::traits::{ContentError, ContentHandler};
use crate::statement::Statement;
use std::io::Read;

/// Outcome of dispatching one response body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A handler parsed the whole body and forwarded this many statements
    Parsed(usize),

    /// No registered handler accepts the mime type; nothing was forwarded
    Unsupported,

    /// The body could not be parsed or read; statements may have been forwarded
    /// before the failure and must not be flushed
    Failed,
}

impl DispatchOutcome {
    /// Returns true if the body was parsed completely
    pub fn is_parsed(&self) -> bool {
        matches!(self, Self::Parsed(_))
    }
}

/// Ordered list of content handlers, first match wins
#[derive(Default)]
pub struct ContentDispatcher {
    handlers: Vec<Box<dyn ContentHandler>>,
}

impl ContentDispatcher {
    /// Creates a dispatcher without handlers
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a handler; handlers registered earlier take precedence
    pub fn register(&mut self, handler: Box<dyn ContentHandler>) {
        tracing::debug!("Registered content handler '{}'", handler.name());
        self.handlers.push(handler);
    }

    /// Builder-style variant of [`register`](Self::register)
    pub fn with_handler(mut self, handler: Box<dyn ContentHandler>) -> Self {
        self.register(handler);
        self
    }

    /// Number of registered handlers
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Returns the first handler accepting `mime`
    pub fn select(&self, mime: &str) -> Option<&dyn ContentHandler> {
        self.handlers
            .iter()
            .find(|handler| handler.can_handle(mime))
            .map(|handler| handler.as_ref())
    }

    /// Parses a response body with the matching handler
    ///
    /// Parse and read failures are logged and reported as
    /// [`DispatchOutcome::Failed`]. A handler emitting a statement with the
    /// wrong arity is a contract violation and is returned as an error.
    pub fn dispatch(
        &self,
        uri: &str,
        mime: &str,
        body: &mut dyn Read,
        callback: &mut dyn FnMut(Statement),
    ) -> Result<DispatchOutcome, ContentError> {
        let Some(handler) = self.select(mime) else {
            tracing::info!("No content handler for '{}' ({}), skipping", mime, uri);
            return Ok(DispatchOutcome::Unsupported);
        };

        tracing::debug!("Handling {} ({}) with '{}'", uri, mime, handler.name());
        match handler.handle(uri, mime, body, callback) {
            Ok(count) => {
                tracing::debug!("Parsed {} statements from {}", count, uri);
                Ok(DispatchOutcome::Parsed(count))
            }
            Err(ContentError::Parse(e)) => {
                tracing::info!("Could not parse document {}: {}", uri, e);
                Ok(DispatchOutcome::Failed)
            }
            Err(ContentError::Io(e)) => {
                tracing::warn!("Could not read document {}: {}", uri, e);
                Ok(DispatchOutcome::Failed)
            }
            Err(e @ ContentError::Statement(_)) => Err(e),
        }
    }
}
