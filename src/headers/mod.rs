//! HTTP header reification
//!
//! Turns the status code and the allowlisted headers of a response into
//! statements about a fresh blank "header record":
//!
//! ```text
//! <uri> ldspider:headerInfo _:header<id> <uri> .
//! _:header<id> http:responseCode "200"^^xsd:integer <uri> .
//! _:header<id> http:content-type "text/turtle" <uri> .
//! ```

mod table;

pub use table::{HeaderTable, HEADER_INFO, HTTP_NS, RESPONSE_CODE};

use crate::statement::{Node, Statement};
use uuid::Uuid;

/// Stateless mapper from response metadata to statements
#[derive(Debug, Clone, Default)]
pub struct HeaderReifier {
    table: HeaderTable,
}

impl HeaderReifier {
    pub fn new(table: HeaderTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &HeaderTable {
        &self.table
    }

    /// Reifies one response
    ///
    /// # Arguments
    ///
    /// * `uri` - The fetched URI, used as link subject and as context of every statement
    /// * `status` - The HTTP status code
    /// * `headers` - Response headers in response order
    ///
    /// # Returns
    ///
    /// The header-info link, the response code statement, then one statement per
    /// mapped header occurrence in table order. Unmapped headers are dropped.
    pub fn reify(&self, uri: &str, status: u16, headers: &[(String, String)]) -> Vec<Statement> {
        let context = Node::iri(uri);
        let record = Node::blank(format!("header{}", Uuid::new_v4().simple()));

        let mut statements = vec![
            Statement::with_context(
                Node::iri(uri),
                Node::iri(HEADER_INFO),
                record.clone(),
                context.clone(),
            ),
            Statement::with_context(
                record.clone(),
                Node::iri(RESPONSE_CODE),
                Node::integer(i64::from(status)),
                context.clone(),
            ),
        ];

        for (name, predicate) in self.table.iter() {
            for (_, value) in headers.iter().filter(|(header, _)| header == name) {
                statements.push(Statement::with_context(
                    record.clone(),
                    Node::iri(predicate),
                    Node::literal(value.as_str()),
                    context.clone(),
                ));
            }
        }

        tracing::debug!(
            "Reified {} header statements for {}",
            statements.len(),
            uri
        );
        statements
    }
}
