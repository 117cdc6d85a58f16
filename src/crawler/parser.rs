//! HTML parser for page analysis and link extraction
//!
//! This module turns a fetched body into:
//! - The structured records from every extractor
//! - The normalized same-domain links to follow
//!
//! [`scraper::Html`] is not `Send`, so parsing and everything that reads the
//! parsed tree happens inside one synchronous call.

use crate::extract::{content_hash, extract_page, PageExtraction};
use crate::url::{is_same_domain, normalize_with, DomainPolicy, NormalizedUrl, QueryPolicy};
use scraper::{Html, Selector};
use std::collections::HashSet;
use tracing::debug;
use url::Url;

/// Decides which discovered links belong to the crawl
#[derive(Debug, Clone)]
pub struct LinkScope {
    pub seed: Url,
    pub domain_policy: DomainPolicy,
    pub query_policy: QueryPolicy,
}

impl LinkScope {
    pub fn new(seed: Url, domain_policy: DomainPolicy, query_policy: QueryPolicy) -> Self {
        Self {
            seed,
            domain_policy,
            query_policy,
        }
    }

    /// Normalizes `href` against `base` and keeps it only if it is on the seed's site
    pub fn admit(&self, href: &str, base: &Url) -> Option<NormalizedUrl> {
        let normalized = normalize_with(href, Some(base), self.query_policy).ok()?;
        if is_same_domain(normalized.as_url(), &self.seed, &self.domain_policy) {
            Some(normalized)
        } else {
            debug!("Dropping off-domain link {}", normalized);
            None
        }
    }
}

/// Extraction output and outgoing links for one page
#[derive(Debug, Clone, Default)]
pub struct PageAnalysis {
    pub extracted: PageExtraction,
    pub links: Vec<NormalizedUrl>,
}

/// Parses a page body, runs every extractor and collects in-scope links
///
/// Relative references resolve against `served_from`, the URL after redirects.
/// Every record is attributed to `page_url`, the URL the crawl visited.
pub fn analyze_page(
    html: &str,
    page_url: &Url,
    served_from: &Url,
    depth: u32,
    scope: &LinkScope,
) -> PageAnalysis {
    let document = Html::parse_document(html);

    let mut extracted = extract_page(&document, served_from);
    if served_from != page_url {
        extracted.attribute_to(page_url.as_str());
    }
    if let Some(metadata) = extracted.page_metadata.as_mut() {
        metadata.depth = depth;
        metadata.content_hash = content_hash(html);
    }

    let mut seen = HashSet::new();
    let links = extract_links(&document, served_from)
        .into_iter()
        .filter_map(|href| scope.admit(&href, served_from))
        .filter(|link| seen.insert(link.clone()))
        .collect();

    PageAnalysis { extracted, links }
}

/// Extracts all followable links from the HTML document as absolute URLs
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` tags anywhere in the document
/// - `<link rel="canonical" href="...">`
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:` links
/// - Data URIs and fragment-only links
///
/// `rel="nofollow"` links are followed.
pub fn extract_links(document: &Html, base_url: &Url) -> Vec<String> {
    let mut links = Vec::new();

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in document.select(&a_selector) {
            if element.value().attr("download").is_some() {
                continue;
            }
            if let Some(absolute_url) = element.value().attr("href").and_then(|h| resolve_link(h, base_url)) {
                links.push(absolute_url);
            }
        }
    }

    if let Ok(canonical_selector) = Selector::parse("link[rel='canonical'][href]") {
        for element in document.select(&canonical_selector) {
            if let Some(absolute_url) = element.value().attr("href").and_then(|h| resolve_link(h, base_url)) {
                links.push(absolute_url);
            }
        }
    }

    links
}

/// Resolves a link href to an absolute http(s) URL, or None if it should be skipped
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lowered.starts_with(scheme))
    {
        return None;
    }

    let absolute_url = base_url.join(href).ok()?;
    matches!(absolute_url.scheme(), "http" | "https").then(|| absolute_url.to_string())
}
