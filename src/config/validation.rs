use crate::aggregate::Vocabulary;
use crate::config::types::{
    Config, ContentConfig, CrawlerConfig, IndexBackend, IndexConfig, StoreConfig, UserAgentConfig,
    MAX_DEFAULT_TTL_SECS,
};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_store_config(&config.store)?;
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_index_config(&config.index)?;
    validate_content_config(&config.content)?;
    validate_vocabulary(&config.vocabulary)?;
    Ok(())
}

fn validate_store_config(config: &StoreConfig) -> Result<(), ConfigError> {
    if config.data_dir.trim().is_empty() {
        return Err(ConfigError::Validation(
            "data_dir cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Validates fetch driver configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_concurrent_fetches < 1 || config.max_concurrent_fetches > 64 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_fetches must be between 1 and 64, got {}",
            config.max_concurrent_fetches
        )));
    }

    if config.default_ttl_secs < 1 || config.default_ttl_secs > MAX_DEFAULT_TTL_SECS {
        return Err(ConfigError::Validation(format!(
            "default_ttl_secs must be between 1 and {}, got {}",
            MAX_DEFAULT_TTL_SECS, config.default_ttl_secs
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

/// Validates that the selected index backend has what it needs
fn validate_index_config(config: &IndexConfig) -> Result<(), ConfigError> {
    match config.backend {
        IndexBackend::Sqlite => match config.database_path.as_deref() {
            Some(path) if !path.trim().is_empty() => Ok(()),
            _ => Err(ConfigError::Validation(
                "database_path is required for the sqlite index backend".to_string(),
            )),
        },
        IndexBackend::Solr => {
            let raw = config.solr_url.as_deref().ok_or_else(|| {
                ConfigError::Validation(
                    "solr_url is required for the solr index backend".to_string(),
                )
            })?;
            let url = Url::parse(raw)
                .map_err(|e| ConfigError::InvalidUrl(format!("Invalid solr_url '{}': {}", raw, e)))?;
            if url.scheme() != "http" && url.scheme() != "https" {
                return Err(ConfigError::Validation(format!(
                    "solr_url '{}' must use http or https",
                    raw
                )));
            }
            Ok(())
        }
        IndexBackend::Memory => Ok(()),
    }
}

/// Validates the body handler accept lists
///
/// An empty entry would match every mime type.
fn validate_content_config(config: &ContentConfig) -> Result<(), ConfigError> {
    if config
        .ntriples_mime_types
        .iter()
        .any(|mime| mime.trim().is_empty())
    {
        return Err(ConfigError::Validation(
            "ntriples_mime_types cannot contain empty entries".to_string(),
        ));
    }
    Ok(())
}

/// Validates that every vocabulary entry is an absolute IRI
fn validate_vocabulary(vocabulary: &Vocabulary) -> Result<(), ConfigError> {
    for (name, iri) in vocabulary.entries() {
        Url::parse(iri).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid vocabulary entry {} '{}': {}", name, iri, e))
        })?;
    }
    Ok(())
}

/// Checks that the contact address has a local part and a dotted host
fn validate_email(email: &str) -> Result<(), ConfigError> {
    let Some((local, host)) = email.split_once('@') else {
        return Err(ConfigError::Validation(format!(
            "contact_email must look like user@host, got '{}'",
            email
        )));
    };

    if local.is_empty() || host.is_empty() || host.contains('@') || !host.contains('.') {
        return Err(ConfigError::Validation(format!(
            "contact_email must look like user@host, got '{}'",
            email
        )));
    }

    Ok(())
}
