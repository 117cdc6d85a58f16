//! URL handling module for SiteHarvest
//!
//! This module provides URL normalization, domain extraction and the
//! same-domain policy that bounds a crawl to one site.

mod domain;
mod normalize;

use serde::{Serialize, Serializer};
use std::fmt;
use url::Url;

// Re-export main functions
pub use domain::{extract_domain, registrable_domain, strip_www};
pub use normalize::{normalize, normalize_with, QueryPolicy};

/// A URL in canonical form
///
/// Only [`normalize`] and [`normalize_with`] construct values of this type, so
/// equality between two `NormalizedUrl`s means "same page".
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NormalizedUrl(Url);

impl NormalizedUrl {
    pub(crate) fn from_url_unchecked(url: Url) -> Self {
        Self(url)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn as_url(&self) -> &Url {
        &self.0
    }
}

impl fmt::Display for NormalizedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

impl Serialize for NormalizedUrl {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.0.as_str())
    }
}

/// Rules deciding whether a URL belongs to the crawled site
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DomainPolicy {
    /// Compare full hosts instead of registrable domains
    pub same_host_only: bool,
    /// With `same_host_only`, treat `www.host` and `host` as equal
    pub ignore_www: bool,
}

impl Default for DomainPolicy {
    fn default() -> Self {
        Self {
            same_host_only: false,
            ignore_www: true,
        }
    }
}

impl From<&crate::config::CrawlerConfig> for DomainPolicy {
    fn from(config: &crate::config::CrawlerConfig) -> Self {
        Self {
            same_host_only: config.same_host_only,
            ignore_www: config.ignore_www,
        }
    }
}

impl From<&crate::config::CrawlerConfig> for QueryPolicy {
    fn from(config: &crate::config::CrawlerConfig) -> Self {
        if config.strip_query {
            Self::StripAll
        } else {
            Self::StripTracking
        }
    }
}

/// Decides whether two URLs are on the same site
///
/// By default two URLs match when they share a registrable domain, so
/// `blog.example.com` and `www.example.com` belong together. With
/// `same_host_only` the hosts must match exactly, except for a `www.` prefix
/// when `ignore_www` is set. Ports and schemes are not compared.
///
/// # Examples
///
/// ```
/// use siteharvest::url::{is_same_domain, DomainPolicy};
/// use url::Url;
///
/// let a = Url::parse("https://www.example.com/").unwrap();
/// let b = Url::parse("http://shop.example.com/cart").unwrap();
/// assert!(is_same_domain(&a, &b, &DomainPolicy::default()));
/// ```
pub fn is_same_domain(a: &Url, b: &Url, policy: &DomainPolicy) -> bool {
    if policy.same_host_only {
        let (Some(host_a), Some(host_b)) = (extract_domain(a), extract_domain(b)) else {
            return false;
        };
        if policy.ignore_www {
            strip_www(&host_a) == strip_www(&host_b)
        } else {
            host_a == host_b
        }
    } else {
        match (registrable_domain(a), registrable_domain(b)) {
            (Some(da), Some(db)) => da == db,
            _ => false,
        }
    }
}
