//! Header name to predicate table

/// Namespace of the HTTP vocabulary used for header predicates
pub const HTTP_NS: &str = "http://www.w3.org/2006/http#";

/// Predicate linking a fetched URI to its header record
pub const HEADER_INFO: &str = "http://code.google.com/p/ldspider/ns#headerInfo";

/// Predicate carrying the numeric response code of a header record
pub const RESPONSE_CODE: &str = "http://www.w3.org/2006/http#responseCode";

/// Headers reified by [`HeaderTable::standard`], in emission order
const STANDARD_HEADERS: [&str; 18] = [
    "Accept",
    "Accept-Charset",
    "Accept-Encoding",
    "Connection",
    "Content-Encoding",
    "Content-Length",
    "Content-Location",
    "Content-Type",
    "Date",
    "ETag",
    "Host",
    "Last-Modified",
    "Location",
    "MIME-Version",
    "Server",
    "Content-Base",
    "Link",
    "Expires",
];

/// Immutable, ordered mapping from HTTP header names to predicate IRIs
///
/// Lookups are case-sensitive; the order of the table is the order in which
/// header statements are emitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderTable {
    entries: Vec<(String, String)>,
}

impl HeaderTable {
    /// The 18-entry allowlist, each header mapped to its lowercase name under [`HTTP_NS`]
    pub fn standard() -> Self {
        Self::from_pairs(
            STANDARD_HEADERS
                .iter()
                .map(|name| (name.to_string(), format!("{}{}", HTTP_NS, name.to_lowercase()))),
        )
    }

    /// Builds a table from (header name, predicate IRI) pairs
    ///
    /// A header listed twice keeps its first position and predicate.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut entries: Vec<(String, String)> = Vec::new();
        for (name, predicate) in pairs {
            if entries.iter().any(|(existing, _)| *existing == name) {
                continue;
            }
            entries.push((name, predicate));
        }
        Self { entries }
    }

    /// Returns the predicate mapped to `name`
    pub fn predicate(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(header, _)| header == name)
            .map(|(_, predicate)| predicate.as_str())
    }

    /// Returns the table's spelling of `name`, compared case-insensitively
    ///
    /// HTTP clients commonly lowercase header names; this recovers the spelling
    /// the table is keyed by.
    pub fn canonical_name(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(header, _)| header.eq_ignore_ascii_case(name))
            .map(|(header, _)| header.as_str())
    }

    /// Iterates (header name, predicate) in table order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(name, predicate)| (name.as_str(), predicate.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for HeaderTable {
    fn default() -> Self {
        Self::standard()
    }
}
