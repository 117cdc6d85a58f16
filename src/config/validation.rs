use crate::config::types::{Config, CrawlerConfig, OutputConfig, StorageBackend, UserAgentConfig};
use crate::ConfigError;
use url::Url;

/// Deepest crawl a request or config may ask for
pub const MAX_ALLOWED_DEPTH: u32 = 5;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_depth < 1 || config.max_depth > MAX_ALLOWED_DEPTH {
        return Err(ConfigError::Validation(format!(
            "max_depth must be between 1 and {}, got {}",
            MAX_ALLOWED_DEPTH, config.max_depth
        )));
    }

    if config.max_concurrent_requests < 1 || config.max_concurrent_requests > 100 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_requests must be between 1 and 100, got {}",
            config.max_concurrent_requests
        )));
    }

    if config.page_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "page_timeout_secs must be greater than 0".to_string(),
        ));
    }

    if config.crawl_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "crawl_timeout_secs must be greater than 0".to_string(),
        ));
    }

    if config.max_retries > 5 {
        return Err(ConfigError::Validation(format!(
            "max_retries must be at most 5, got {}",
            config.max_retries
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Validate crawler name: non-empty, alphanumeric + hyphens only
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

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    match config.backend {
        StorageBackend::Local if config.base_path.trim().is_empty() => Err(
            ConfigError::Validation("base_path cannot be empty".to_string()),
        ),
        StorageBackend::Sqlite if config.database_path.trim().is_empty() => Err(
            ConfigError::Validation("database_path cannot be empty".to_string()),
        ),
        StorageBackend::S3 if !is_valid_bucket_name(&config.s3_bucket) => Err(
            ConfigError::Validation(format!("Invalid s3_bucket: '{}'", config.s3_bucket)),
        ),
        StorageBackend::S3 if config.s3_region.trim().is_empty() => Err(
            ConfigError::Validation("s3_region cannot be empty".to_string()),
        ),
        _ => Ok(()),
    }
}

/// S3 bucket naming: 3-63 lowercase letters, digits, dots and hyphens
fn is_valid_bucket_name(name: &str) -> bool {
    (3..=63).contains(&name.len())
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '.' || c == '-')
        && !name.starts_with(['.', '-'])
        && !name.ends_with(['.', '-'])
}
