//! HTTP fetcher implementation
//!
//! This module performs the single-shot fetches of the crawl driver:
//! - Building HTTP clients with proper user agent strings
//! - GET requests asking for RDF serializations
//! - Collecting status, headers and body into a `FetchedResponse`

use crate::config::UserAgentConfig;
use crate::headers::HeaderTable;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{redirect::Policy, Client};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Accept header sent with every fetch
pub const ACCEPT_RDF: &str =
    "application/n-triples, application/n-quads;q=0.9, text/turtle;q=0.8, application/rdf+xml;q=0.5";

/// Errors that can occur while fetching a document
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request to {url} failed: {source}")]
    Request { url: String, source: reqwest::Error },

    #[error("Reading body of {url} failed: {source}")]
    Body { url: String, source: reqwest::Error },
}

impl FetchError {
    /// Returns true for timeouts and refused connections
    pub fn is_unreachable(&self) -> bool {
        match self {
            Self::Request { source, .. } => source.is_timeout() || source.is_connect(),
            Self::Body { source, .. } => source.is_timeout(),
        }
    }
}

/// One fetched response, as handed to the ingestion pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedResponse {
    /// The URI that was requested; provenance of the document
    pub uri: Url,

    /// HTTP status code
    pub status: u16,

    /// Response headers in response order
    pub headers: Vec<(String, String)>,

    /// Declared Content-Type, if any
    pub content_type: Option<String>,

    /// Raw body
    pub body: Vec<u8>,
}

impl FetchedResponse {
    /// A 200 response without headers, e.g. for a local file
    pub fn from_body(uri: Url, content_type: impl Into<String>, body: Vec<u8>) -> Self {
        Self {
            uri,
            status: 200,
            headers: Vec::new(),
            content_type: Some(content_type.into()),
            body,
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use linkspider::config::UserAgentConfig;
/// use linkspider::crawler::build_http_client;
///
/// let config = UserAgentConfig {
///     crawler_name: "LinkSpider".to_string(),
///     crawler_version: "0.3".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
///
/// let client = build_http_client(&config).unwrap();
/// ```
pub fn build_http_client(config: &UserAgentConfig) -> Result<Client, reqwest::Error> {
    // Format: CrawlerName/Version (+ContactURL; ContactEmail)
    let user_agent = format!(
        "{}/{} (+{}; {})",
        config.crawler_name, config.crawler_version, config.contact_url, config.contact_email
    );

    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_RDF));

    Client::builder()
        .user_agent(user_agent)
        .default_headers(headers)
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Returns the spelling a header name is reified under
///
/// Names in the standard header table get the table's spelling; other names
/// are title-cased per dash-separated segment.
pub fn display_header_name(name: &str) -> String {
    if let Some(canonical) = HeaderTable::standard().canonical_name(name) {
        return canonical.to_string();
    }
    name.split('-')
        .map(|segment| {
            let mut chars = segment.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + &chars.as_str().to_ascii_lowercase(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}

/// Fetches one document
///
/// Any status code is a successful fetch; only transport failures are errors.
///
/// # Arguments
///
/// * `client` - The HTTP client to use
/// * `url` - The URL to fetch
pub async fn fetch_document(client: &Client, url: &Url) -> Result<FetchedResponse, FetchError> {
    tracing::debug!("Fetching {}", url);
    let response = client
        .get(url.clone())
        .send()
        .await
        .map_err(|source| FetchError::Request {
            url: url.to_string(),
            source,
        })?;

    let status = response.status().as_u16();
    let headers: Vec<(String, String)> = response
        .headers()
        .iter()
        .map(|(name, value)| {
            (
                display_header_name(name.as_str()),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect();
    let content_type = headers
        .iter()
        .find(|(name, _)| name == "Content-Type")
        .map(|(_, value)| value.clone());

    let body = response
        .bytes()
        .await
        .map_err(|source| FetchError::Body {
            url: url.to_string(),
            source,
        })?
        .to_vec();

    tracing::debug!(
        "Fetched {}: status {}, {} bytes, content type {}",
        url,
        status,
        body.len(),
        content_type.as_deref().unwrap_or("[none]")
    );

    Ok(FetchedResponse {
        uri: url.clone(),
        status,
        headers,
        content_type,
        body,
    })
}
