/// RDF node definitions
///
/// Nodes are rendered in their canonical N-Triples form, which is also the form
/// the aggregator writes into the bulk triple text of an index record.
use std::fmt;

/// XML Schema integer datatype IRI
pub const XSD_INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";

/// A single term of a statement
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Node {
    /// An absolute IRI, stored without angle brackets
    Iri(String),

    /// A blank node, stored without the `_:` prefix
    Blank(String),

    /// A literal with optional datatype IRI or language tag
    Literal {
        value: String,
        datatype: Option<String>,
        language: Option<String>,
    },
}

impl Node {
    pub fn iri(iri: impl Into<String>) -> Self {
        Self::Iri(iri.into())
    }

    pub fn blank(label: impl Into<String>) -> Self {
        Self::Blank(label.into())
    }

    /// Creates a plain literal
    pub fn literal(value: impl Into<String>) -> Self {
        Self::Literal {
            value: value.into(),
            datatype: None,
            language: None,
        }
    }

    /// Creates a literal with a datatype IRI
    pub fn typed_literal(value: impl Into<String>, datatype: impl Into<String>) -> Self {
        Self::Literal {
            value: value.into(),
            datatype: Some(datatype.into()),
            language: None,
        }
    }

    /// Creates a language-tagged literal
    pub fn lang_literal(value: impl Into<String>, language: impl Into<String>) -> Self {
        Self::Literal {
            value: value.into(),
            datatype: None,
            language: Some(language.into()),
        }
    }

    /// Creates an `xsd:integer` literal
    pub fn integer(value: i64) -> Self {
        Self::typed_literal(value.to_string(), XSD_INTEGER)
    }

    /// Returns the IRI if this node is one
    pub fn as_iri(&self) -> Option<&str> {
        match self {
            Self::Iri(iri) => Some(iri),
            _ => None,
        }
    }

    /// Returns true if this node is a literal
    pub fn is_literal(&self) -> bool {
        matches!(self, Self::Literal { .. })
    }

    /// Returns the lexical text of the node
    ///
    /// For literals this is the unescaped value, for IRIs the IRI itself and for
    /// blank nodes the label.
    pub fn lexical(&self) -> &str {
        match self {
            Self::Iri(iri) => iri,
            Self::Blank(label) => label,
            Self::Literal { value, .. } => value,
        }
    }

    /// Renders the node as an N-Triples token
    pub fn to_ntriples(&self) -> String {
        match self {
            Self::Iri(iri) => format!("<{}>", iri),
            Self::Blank(label) => format!("_:{}", label),
            Self::Literal {
                value,
                datatype,
                language,
            } => {
                let escaped = escape_literal(value);
                match (datatype, language) {
                    (_, Some(lang)) => format!("\"{}\"@{}", escaped, lang),
                    (Some(dt), None) => format!("\"{}\"^^<{}>", escaped, dt),
                    (None, None) => format!("\"{}\"", escaped),
                }
            }
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_ntriples())
    }
}

/// Escapes a literal value for N-Triples output
pub fn escape_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out
}
