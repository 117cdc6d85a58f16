use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main configuration structure for SiteHarvest
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default, rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Maximum depth to crawl from the seed URL (seed = 0)
    #[serde(rename = "max-depth")]
    pub max_depth: u32,

    /// Maximum number of fetch+extract tasks in flight
    #[serde(rename = "max-concurrent-requests")]
    pub max_concurrent_requests: u32,

    /// Timeout for a single fetch attempt (seconds)
    #[serde(rename = "page-timeout-secs")]
    pub page_timeout_secs: u64,

    /// Wall-clock budget for the whole crawl (seconds)
    #[serde(rename = "crawl-timeout-secs")]
    pub crawl_timeout_secs: u64,

    /// Additional attempts for retryable fetch failures
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Delay before the first retry; doubles on each further retry (milliseconds)
    #[serde(rename = "retry-delay-ms")]
    pub retry_delay_ms: u64,

    /// Drop every query string instead of only tracking parameters
    #[serde(rename = "strip-query")]
    pub strip_query: bool,

    /// Compare full hosts instead of registrable domains
    #[serde(rename = "same-host-only")]
    pub same_host_only: bool,

    /// Treat `www.example.com` and `example.com` as the same host
    #[serde(rename = "ignore-www")]
    pub ignore_www: bool,
}

impl CrawlerConfig {
    pub fn page_timeout(&self) -> Duration {
        Duration::from_secs(self.page_timeout_secs)
    }

    pub fn crawl_timeout(&self) -> Duration {
        Duration::from_secs(self.crawl_timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_depth: 2,
            max_concurrent_requests: 10,
            page_timeout_secs: 30,
            crawl_timeout_secs: 300,
            max_retries: 2,
            retry_delay_ms: 500,
            strip_query: false,
            same_host_only: false,
            ignore_www: true,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
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
}

impl UserAgentConfig {
    /// Formats the User-Agent header: `Name/Version (+ContactURL)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{})",
            self.crawler_name, self.crawler_version, self.contact_url
        )
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "SiteHarvest".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: "https://github.com/siteharvest/siteharvest".to_string(),
        }
    }
}

/// Which persistence backend receives the category payloads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// JSON files under `base-path`
    Local,
    /// Payload rows in the SQLite database at `database-path`
    Sqlite,
    /// Objects in the S3 bucket `s3-bucket`
    S3,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    pub backend: StorageBackend,

    /// Root folder for the local backend
    #[serde(rename = "base-path")]
    pub base_path: String,

    /// Path to the SQLite database file for the sqlite backend
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Bucket for the s3 backend; credentials come from the standard AWS environment
    #[serde(rename = "s3-bucket")]
    pub s3_bucket: String,

    #[serde(rename = "s3-region")]
    pub s3_region: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Local,
            base_path: "outputs".to_string(),
            database_path: "outputs/siteharvest.db".to_string(),
            s3_bucket: "webscraper-data".to_string(),
            s3_region: "us-east-1".to_string(),
        }
    }
}
