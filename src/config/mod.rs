//! Configuration module for linkspider
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use linkspider::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("linkspider.toml")).unwrap();
//! println!("Revisit state lives in: {}", config.store.data_dir);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, ContentConfig, CrawlerConfig, IndexBackend, IndexConfig, StoreConfig,
    UserAgentConfig, MAX_DEFAULT_TTL_SECS,
};

// Re-export parser functions
pub use parser::{config_digest, load_config, load_config_with_hash, parse_config};
