//! SiteHarvest: a single-site crawler and structured data harvester
//!
//! This crate crawls a website from a seed URL, follows same-domain links up to
//! a bounded depth, extracts text, images, contact details, products, social
//! links and page metadata from every page, and aggregates everything into a
//! per-site result with a sitemap summary.

pub mod config;
pub mod crawler;
pub mod extract;
pub mod output;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for SiteHarvest operations
///
/// Page-level failures never surface here; they are recorded inside the
/// [`output::SiteResult`]. Only invalid input, client construction and
/// persistence failures abort a scrape.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] UrlError),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ScrapeError {
    /// Short machine-readable tag used in error responses
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Config(_) => "ConfigurationError",
            Self::InvalidUrl(_) => "InvalidURL",
            Self::InvalidRequest(_) => "ValidationError",
            Self::Storage(_) => "StorageError",
            Self::HttpClient(_) => "HttpClientError",
            Self::Serialization(_) => "SerializationError",
            Self::Io(_) => "IoError",
        }
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,

    #[error("Malformed URL: {0}")]
    Malformed(String),
}

/// Result type alias for SiteHarvest operations
pub type Result<T> = std::result::Result<T, ScrapeError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{crawl, scrape, ScrapeRequest};
pub use output::{ScrapeResponse, SiteResult};
pub use url::{is_same_domain, normalize, NormalizedUrl};
