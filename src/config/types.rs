use crate::aggregate::Vocabulary;
use crate::content::DEFAULT_NTRIPLES_MIME_TYPES;
use serde::Deserialize;

/// Main configuration structure for linkspider
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub store: StoreConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub index: IndexConfig,
    #[serde(default)]
    pub content: ContentConfig,
    #[serde(default)]
    pub vocabulary: Vocabulary,
}

/// Revisit store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Directory holding the persisted revisit state
    #[serde(rename = "data-dir")]
    pub data_dir: String,
}

/// Fetch driver configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Maximum number of fetches in flight at once
    #[serde(rename = "max-concurrent-fetches", default = "default_max_concurrent_fetches")]
    pub max_concurrent_fetches: u32,

    /// Expiry applied when a response carries no caching headers (seconds)
    #[serde(rename = "default-ttl-secs", default = "default_ttl_secs")]
    pub default_ttl_secs: u64,
}

/// Largest accepted `default-ttl-secs` (ten years)
pub const MAX_DEFAULT_TTL_SECS: u64 = 10 * 365 * 24 * 60 * 60;

fn default_max_concurrent_fetches() -> u32 {
    4
}

fn default_ttl_secs() -> u64 {
    24 * 60 * 60
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_fetches: default_max_concurrent_fetches(),
            default_ttl_secs: default_ttl_secs(),
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

/// Which index backend receives flushed documents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexBackend {
    Sqlite,
    Solr,
    Memory,
}

/// Index sink configuration
#[derive(Debug, Clone, Deserialize)]
pub struct IndexConfig {
    pub backend: IndexBackend,

    /// Path to the SQLite index database (sqlite backend)
    #[serde(rename = "database-path")]
    pub database_path: Option<String>,

    /// Base URL of the Solr core (solr backend)
    #[serde(rename = "solr-url")]
    pub solr_url: Option<String>,
}

/// Body handler configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ContentConfig {
    /// Mime types handed to the built-in N-Triples parser
    #[serde(rename = "ntriples-mime-types", default = "default_ntriples_mime_types")]
    pub ntriples_mime_types: Vec<String>,
}

fn default_ntriples_mime_types() -> Vec<String> {
    DEFAULT_NTRIPLES_MIME_TYPES
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            ntriples_mime_types: default_ntriples_mime_types(),
        }
    }
}
