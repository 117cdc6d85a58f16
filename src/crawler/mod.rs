//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with retry logic
//! - HTML analysis and link extraction
//! - Frontier scheduling and the concurrency gate
//! - Overall crawl coordination
//! - The request-level entry points [`crawl`] and [`scrape`]

mod coordinator;
mod fetcher;
mod page;
mod parser;
mod scheduler;

pub use coordinator::{run_crawl, Coordinator};
pub use fetcher::{build_http_client, fetch, Document, FetchError, FetchOutcome};
pub use page::{CrawlTarget, PageError, PageErrorKind, PageResult};
pub use parser::{analyze_page, extract_links, LinkScope, PageAnalysis};
pub use scheduler::{fetch_with_retry, RetryPolicy, ScheduledTarget, Scheduler};

use crate::config::{Config, MAX_ALLOWED_DEPTH};
use crate::output::{CrawlMetadata, ScrapeResponse, SiteResult};
use crate::storage::{persist_error, persist_site_result, ResultStore};
use crate::url::{extract_domain, normalize, NormalizedUrl};
use crate::ScrapeError;
use chrono::Utc;
use tracing::{error, info, warn};
use url::Url;

/// Subdomain labels skipped when deriving a company name from a host
const GENERIC_SUBDOMAINS: &[&str] = &["www", "web", "app", "api"];

/// A request to scrape one site
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScrapeRequest {
    pub seed_url: String,
    /// Derived from the seed host when absent
    pub company_name: Option<String>,
    /// Overrides the configured maximum depth (1..=5)
    pub max_depth: Option<u32>,
}

impl ScrapeRequest {
    pub fn new(seed_url: impl Into<String>) -> Self {
        Self {
            seed_url: seed_url.into(),
            ..Default::default()
        }
    }

    pub fn with_company_name(mut self, name: impl Into<String>) -> Self {
        self.company_name = Some(name.into());
        self
    }

    pub fn with_max_depth(mut self, depth: u32) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Checks the request and returns the normalized seed
    ///
    /// # Errors
    ///
    /// * `ScrapeError::InvalidUrl` - The seed is malformed or not http(s)
    /// * `ScrapeError::InvalidRequest` - `max_depth` is out of range
    pub fn validate(&self) -> Result<NormalizedUrl, ScrapeError> {
        let seed = normalize(&self.seed_url, None)?;

        if let Some(depth) = self.max_depth {
            if !(1..=MAX_ALLOWED_DEPTH).contains(&depth) {
                return Err(ScrapeError::InvalidRequest(format!(
                    "max_depth must be between 1 and {}, got {}",
                    MAX_ALLOWED_DEPTH, depth
                )));
            }
        }

        Ok(seed)
    }

    /// The display name for this request's company
    pub fn resolved_company_name(&self, seed: &Url) -> String {
        match self.company_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => derive_company_name(seed),
        }
    }

    /// The configuration with this request's overrides applied
    pub fn effective_config(&self, config: &Config) -> Config {
        let mut config = config.clone();
        if let Some(depth) = self.max_depth {
            config.crawler.max_depth = depth;
        }
        config
    }
}

/// Derives a display name from a URL's host
///
/// `https://www.acme-corp.com` becomes `Acme Corp`.
pub fn derive_company_name(url: &Url) -> String {
    let Some(host) = extract_domain(url) else {
        return "Unknown".to_string();
    };

    let labels: Vec<&str> = host.split('.').collect();
    let label = match labels.as_slice() {
        [first, second, ..] if GENERIC_SUBDOMAINS.contains(first) => *second,
        [first, ..] => *first,
        [] => host.as_str(),
    };

    label
        .split(['-', '_'])
        .filter(|word| !word.is_empty())
        .map(title_case)
        .collect::<Vec<_>>()
        .join(" ")
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Turns a company name into a storage key
///
/// Punctuation is dropped, runs of spaces and hyphens become one underscore,
/// and the result is lowercase: `Acme Corp` becomes `acme_corp`.
pub fn sanitize_company_name(name: &str) -> String {
    let mut key = String::with_capacity(name.len());
    let mut separator = false;

    for c in name.chars() {
        if c.is_alphanumeric() || c == '_' {
            if separator && !key.is_empty() {
                key.push('_');
            }
            separator = false;
            key.extend(c.to_lowercase());
        } else if c == '-' || c.is_whitespace() {
            separator = true;
        }
    }

    let key = key.trim_matches('_');
    if key.is_empty() {
        "unknown".to_string()
    } else {
        key.to_string()
    }
}

/// Runs a complete crawl for `request`
///
/// # Returns
///
/// * `Ok(SiteResult)` - The crawl ran; page failures are inside the result
/// * `Err(ScrapeError)` - The request was invalid or the crawl could not start
pub async fn crawl(
    config: &Config,
    request: &ScrapeRequest,
    config_hash: Option<String>,
) -> Result<SiteResult, ScrapeError> {
    let seed = request.validate()?;
    let company_name = request.resolved_company_name(seed.as_url());
    let config = request.effective_config(config);
    run_crawl(&config, seed, &company_name, config_hash).await
}

/// Crawls, persists every category and summarizes the outcome
///
/// Never fails: problems are reported in the returned [`ScrapeResponse`]. When
/// persisting fails, the error itself is written to the `errors` category if
/// the store still accepts writes.
pub async fn scrape(
    config: &Config,
    request: &ScrapeRequest,
    config_hash: Option<String>,
    store: &mut dyn ResultStore,
) -> ScrapeResponse {
    let seed = match request.validate() {
        Ok(seed) => seed,
        Err(e) => {
            warn!("Rejected request for {}: {}", request.seed_url, e);
            let company = request.company_name.clone().unwrap_or_default();
            return ScrapeResponse::failure(&company, &request.seed_url, &e);
        }
    };

    let company_name = request.resolved_company_name(seed.as_url());
    let storage_key = sanitize_company_name(&company_name);
    let config = request.effective_config(config);

    let site = match run_crawl(&config, seed.clone(), &company_name, config_hash.clone()).await {
        Ok(site) => site,
        Err(e) => {
            error!("Crawl of {} could not start: {}", seed, e);
            let metadata = failure_metadata(&config, &seed, &company_name, config_hash);
            return record_failure(store, &storage_key, &metadata, e).await;
        }
    };

    match persist_site_result(store, &storage_key, &site).await {
        Ok(storage_files) => {
            info!("Stored {} categories for {}", storage_files.len(), company_name);
            ScrapeResponse::success(
                site.metadata,
                site.sitemap.coverage_summary,
                storage_files,
            )
        }
        Err(e) => record_failure(store, &storage_key, &site.metadata, e.into()).await,
    }
}

async fn record_failure(
    store: &mut dyn ResultStore,
    storage_key: &str,
    metadata: &CrawlMetadata,
    error: ScrapeError,
) -> ScrapeResponse {
    let mut response = ScrapeResponse::failure(&metadata.company_name, &metadata.source_url, &error);
    match persist_error(store, storage_key, metadata, error.error_type(), &error.to_string()).await {
        Ok(location) => {
            response.storage_files.insert("errors".to_string(), location);
        }
        Err(e) => error!("Could not record failure for {}: {}", storage_key, e),
    }
    response.metadata = Some(metadata.clone());
    response
}

fn failure_metadata(
    config: &Config,
    seed: &NormalizedUrl,
    company_name: &str,
    config_hash: Option<String>,
) -> CrawlMetadata {
    CrawlMetadata {
        scraping_timestamp: Utc::now(),
        source_url: seed.to_string(),
        company_name: company_name.to_string(),
        extraction_method: crate::output::aggregator::EXTRACTION_METHOD.to_string(),
        crawl_depth: config.crawler.max_depth,
        total_pages_crawled: 0,
        processing_time_seconds: 0.0,
        base_domain: extract_domain(seed.as_url()).unwrap_or_default(),
        config_hash,
        truncated: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(raw: &str) -> Url {
        Url::parse(raw).unwrap()
    }

    #[test]
    fn test_derive_company_name() {
        assert_eq!(derive_company_name(&url("https://www.acme-corp.com/")), "Acme Corp");
        assert_eq!(derive_company_name(&url("https://shop.example.co.uk/")), "Shop");
        assert_eq!(derive_company_name(&url("https://api.big-data.io/")), "Big Data");
        assert_eq!(derive_company_name(&url("https://localhost/")), "Localhost");
    }

    #[test]
    fn test_sanitize_company_name() {
        assert_eq!(sanitize_company_name("Acme Corp"), "acme_corp");
        assert_eq!(sanitize_company_name("  AT&T - Inc. "), "att_inc");
        assert_eq!(sanitize_company_name("already_clean"), "already_clean");
        assert_eq!(sanitize_company_name("!!!"), "unknown");
    }

    #[test]
    fn test_validate_accepts_good_request() {
        let request = ScrapeRequest::new("https://www.acme-corp.com/about/").with_max_depth(3);
        let seed = request.validate().unwrap();
        assert_eq!(seed.as_str(), "https://www.acme-corp.com/about");
        assert_eq!(request.resolved_company_name(seed.as_url()), "Acme Corp");
    }

    #[test]
    fn test_validate_rejects_bad_input() {
        assert!(matches!(
            ScrapeRequest::new("ftp://example.com").validate(),
            Err(ScrapeError::InvalidUrl(_))
        ));
        assert!(matches!(
            ScrapeRequest::new("not a url").validate(),
            Err(ScrapeError::InvalidUrl(_))
        ));
        assert!(matches!(
            ScrapeRequest::new("https://example.com").with_max_depth(0).validate(),
            Err(ScrapeError::InvalidRequest(_))
        ));
        assert!(matches!(
            ScrapeRequest::new("https://example.com").with_max_depth(6).validate(),
            Err(ScrapeError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_explicit_company_name_wins() {
        let request = ScrapeRequest::new("https://example.com").with_company_name("  Globex  ");
        assert_eq!(request.resolved_company_name(&url("https://example.com")), "Globex");
    }

    #[test]
    fn test_effective_config_applies_depth() {
        let config = Config::default();
        let request = ScrapeRequest::new("https://example.com").with_max_depth(4);
        assert_eq!(request.effective_config(&config).crawler.max_depth, 4);
        assert_eq!(
            ScrapeRequest::new("https://example.com").effective_config(&config).crawler.max_depth,
            config.crawler.max_depth
        );
    }

    #[tokio::test]
    async fn test_scrape_reports_invalid_request() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut store = crate::storage::LocalStore::new(dir.path());
        let request = ScrapeRequest::new("mailto:someone@example.com");

        let response = scrape(&Config::default(), &request, None, &mut store).await;
        assert!(!response.is_success());
        assert_eq!(response.error_type.as_deref(), Some("InvalidURL"));
        assert!(response.storage_files.is_empty());
    }
}
