//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the HTTP client with the crawler's user agent
//! - Single GET attempts bounded by a per-attempt timeout
//! - Classifying failures as retryable or fatal
//!
//! Retrying is the scheduler's job; see [`crate::crawler::fetch_with_retry`].

use crate::config::UserAgentConfig;
use reqwest::{redirect::Policy, Client};
use std::time::Duration;
use thiserror::Error;
use url::Url;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_REDIRECTS: usize = 10;

/// A fetched page
#[derive(Debug, Clone)]
pub struct Document {
    /// Final URL after redirects
    pub final_url: Url,
    pub status_code: u16,
    pub content_type: Option<String>,
    pub body: String,
}

/// Why a fetch attempt failed
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("No response within the page timeout")]
    Timeout,

    #[error("HTTP status {0}")]
    Http(u16),

    #[error("Network error: {message}")]
    Network {
        message: String,
        /// Connection-level failure (refused, reset, DNS); worth retrying
        connection_class: bool,
    },
}

/// Result of a single fetch attempt
#[derive(Debug)]
pub enum FetchOutcome {
    Ok(Document),
    /// Timeouts, 5xx responses and connection failures
    Retryable(FetchError),
    /// 4xx responses and other network errors
    Fatal(FetchError),
}

impl FetchOutcome {
    fn from_error(error: FetchError) -> Self {
        let retryable = match &error {
            FetchError::Timeout => true,
            FetchError::Http(status) => *status >= 500,
            FetchError::Network {
                connection_class, ..
            } => *connection_class,
        };
        if retryable {
            Self::Retryable(error)
        } else {
            Self::Fatal(error)
        }
    }
}

/// Builds an HTTP client with proper configuration
///
/// The User-Agent is `Name/Version (+ContactURL)`. Compressed responses are
/// decoded transparently and at most 10 redirects are followed.
///
/// # Example
///
/// ```no_run
/// use siteharvest::config::UserAgentConfig;
/// use siteharvest::crawler::build_http_client;
///
/// let client = build_http_client(&UserAgentConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &UserAgentConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .connect_timeout(CONNECT_TIMEOUT)
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Performs one GET request for `url`
///
/// The whole exchange, headers and body, must finish within `timeout`.
pub async fn fetch(client: &Client, url: &Url, timeout: Duration) -> FetchOutcome {
    match tokio::time::timeout(timeout, attempt(client, url)).await {
        Ok(Ok(document)) => FetchOutcome::Ok(document),
        Ok(Err(error)) => FetchOutcome::from_error(error),
        Err(_) => FetchOutcome::Retryable(FetchError::Timeout),
    }
}

async fn attempt(client: &Client, url: &Url) -> Result<Document, FetchError> {
    let response = client.get(url.clone()).send().await.map_err(classify)?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Http(status.as_u16()));
    }

    let final_url = response.url().clone();
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let body = response.text().await.map_err(classify)?;

    Ok(Document {
        final_url,
        status_code: status.as_u16(),
        content_type,
        body,
    })
}

fn classify(error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        return FetchError::Timeout;
    }
    // Redirect loops, decode failures and builder errors will not heal on retry
    let connection_class =
        error.is_connect() || (error.is_request() && !error.is_redirect() && !error.is_builder());
    FetchError::Network {
        message: error.to_string(),
        connection_class,
    }
}
