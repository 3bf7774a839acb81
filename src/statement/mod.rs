//! Statement model
//!
//! Statements are the unit of exchange between parsers, the header reifier and
//! the document aggregator. A statement is a subject-predicate-object triple with
//! an optional context naming the document it was asserted in.
//!
//! # Components
//!
//! - `Node`: an IRI, a blank node or a literal
//! - `Statement`: an immutable triple plus optional context
//! - `NTriplesParser`: line parser for N-Triples and N-Quads bodies

mod node;
mod ntriples;

pub use node::{escape_literal, Node, XSD_INTEGER};
pub use ntriples::{NTriplesParser, ParseError};

use std::fmt;
use thiserror::Error;

/// Errors raised when building a statement from a parsed tuple
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StatementError {
    #[error("A statement must consist of 3 or 4 nodes, got {0}")]
    Arity(usize),
}

/// An immutable subject-predicate-object statement with optional context
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Statement {
    pub subject: Node,
    pub predicate: Node,
    pub object: Node,
    pub context: Option<Node>,
}

impl Statement {
    /// Creates a triple without context
    pub fn new(subject: Node, predicate: Node, object: Node) -> Self {
        Self {
            subject,
            predicate,
            object,
            context: None,
        }
    }

    /// Creates a statement asserted in the given context
    pub fn with_context(subject: Node, predicate: Node, object: Node, context: Node) -> Self {
        Self {
            subject,
            predicate,
            object,
            context: Some(context),
        }
    }

    /// Renders the triple part as a canonical N-Triples line (without newline)
    ///
    /// The context is not part of the line.
    pub fn to_ntriples(&self) -> String {
        format!(
            "{} {} {} .",
            self.subject.to_ntriples(),
            self.predicate.to_ntriples(),
            self.object.to_ntriples()
        )
    }

    /// Renders the statement as an N-Quads line (without newline)
    pub fn to_nquads(&self) -> String {
        match &self.context {
            Some(context) => format!(
                "{} {} {} {} .",
                self.subject.to_ntriples(),
                self.predicate.to_ntriples(),
                self.object.to_ntriples(),
                context.to_ntriples()
            ),
            None => self.to_ntriples(),
        }
    }
}

impl TryFrom<Vec<Node>> for Statement {
    type Error = StatementError;

    fn try_from(nodes: Vec<Node>) -> Result<Self, Self::Error> {
        let arity = nodes.len();
        let mut nodes = nodes.into_iter();
        match (nodes.next(), nodes.next(), nodes.next(), nodes.next(), nodes.next()) {
            (Some(subject), Some(predicate), Some(object), context, None) => Ok(Self {
                subject,
                predicate,
                object,
                context,
            }),
            _ => Err(StatementError::Arity(arity)),
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_nquads())
    }
}
