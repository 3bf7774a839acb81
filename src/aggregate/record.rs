//! Flat index record produced by a flushed document

use serde::Serialize;

/// One document as written to the search index
///
/// Field names are the index schema; unset optional fields are left out of
/// the serialized form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexRecord {
    /// Canonical document URL, unique key of the index
    pub url: String,

    /// All statements of the document, one N-Triples line each
    pub ntriple: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// "lat,lon", only when both coordinates are nonzero
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_lower: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_upper: Option<f64>,

    /// Tags in arrival order, duplicates kept
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tag: Vec<String>,
}

impl IndexRecord {
    /// Creates a record holding only the mandatory fields
    pub fn new(url: impl Into<String>, ntriple: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ntriple: ntriple.into(),
            title: None,
            description: None,
            category: None,
            location: None,
            price_lower: None,
            price_upper: None,
            tag: Vec::new(),
        }
    }
}
