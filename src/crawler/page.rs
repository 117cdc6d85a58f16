//! Per-page crawl records

use crate::crawler::fetcher::FetchError;
use crate::extract::PageExtraction;
use crate::url::NormalizedUrl;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// A URL waiting to be crawled at a given depth
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTarget {
    pub url: NormalizedUrl,
    /// Link hops from the seed (seed = 0)
    pub depth: u32,
}

impl CrawlTarget {
    pub fn new(url: NormalizedUrl, depth: u32) -> Self {
        Self { url, depth }
    }
}

/// Category of a page failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PageErrorKind {
    Timeout,
    #[serde(rename = "http_4xx")]
    Http4xx,
    #[serde(rename = "http_5xx")]
    Http5xx,
    NetworkError,
}

impl PageErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::Http4xx => "http_4xx",
            Self::Http5xx => "http_5xx",
            Self::NetworkError => "network_error",
        }
    }
}

impl fmt::Display for PageErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A page that could not be fetched
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageError {
    pub url: String,
    pub error_type: PageErrorKind,
    pub message: String,
    /// Retries performed after the first attempt
    pub retry_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
}

impl PageError {
    pub fn from_fetch(url: &NormalizedUrl, error: &FetchError, retry_count: u32) -> Self {
        let (error_type, status_code) = match error {
            FetchError::Timeout => (PageErrorKind::Timeout, None),
            FetchError::Http(status) if *status >= 500 => (PageErrorKind::Http5xx, Some(*status)),
            FetchError::Http(status) => (PageErrorKind::Http4xx, Some(*status)),
            FetchError::Network { .. } => (PageErrorKind::NetworkError, None),
        };

        Self {
            url: url.to_string(),
            error_type,
            message: error.to_string(),
            retry_count,
            status_code,
        }
    }
}

/// Everything one crawl task produced for one page
#[derive(Debug, Clone)]
pub struct PageResult {
    pub url: NormalizedUrl,
    pub depth: u32,
    /// Raw HTML; empty when the fetch failed
    pub html: String,
    pub extracted: PageExtraction,
    /// Normalized same-domain links found on the page
    pub links: Vec<NormalizedUrl>,
    pub error: Option<PageError>,
    pub status_code: Option<u16>,
    /// Normalized post-redirect URL, when it differs from `url`
    pub redirected_to: Option<NormalizedUrl>,
    pub fetched_at: DateTime<Utc>,
}

impl PageResult {
    /// Result for a page whose fetch failed after all retries
    pub fn failed(target: CrawlTarget, error: PageError) -> Self {
        Self {
            url: target.url,
            depth: target.depth,
            html: String::new(),
            extracted: PageExtraction::default(),
            links: Vec::new(),
            status_code: error.status_code,
            error: Some(error),
            redirected_to: None,
            fetched_at: Utc::now(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}
