//! Human-readable crawl statistics
//!
//! The CLI prints these to stderr after a crawl; stdout carries the JSON response.

use crate::output::response::ScrapeResponse;
use crate::output::types::Category;

/// Crawl statistics summary
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlStatistics {
    pub source_url: String,
    pub total_pages: usize,
    pub pages_failed: usize,
    /// Pages with at least one item, per item category
    pub pages_by_category: Vec<(Category, usize)>,
    pub truncated: bool,
    pub pending_targets: usize,
    pub processing_time_seconds: f64,
    pub stored_categories: usize,
}

impl CrawlStatistics {
    /// Statistics for a successful response; `None` when the scrape failed
    pub fn from_response(response: &ScrapeResponse) -> Option<Self> {
        let metadata = response.metadata.as_ref()?;
        let coverage = response.coverage_summary.as_ref()?;

        Some(Self {
            source_url: metadata.source_url.clone(),
            total_pages: coverage.total_pages,
            pages_failed: coverage.pages_failed,
            pages_by_category: vec![
                (Category::Text, coverage.pages_with_text),
                (Category::Images, coverage.pages_with_images),
                (Category::Contact, coverage.pages_with_contact),
                (Category::Products, coverage.pages_with_products),
                (Category::SocialMedia, coverage.pages_with_social_media),
            ],
            truncated: coverage.truncated,
            pending_targets: coverage.pending_targets,
            processing_time_seconds: metadata.processing_time_seconds,
            stored_categories: response.storage_files.len(),
        })
    }

    pub fn success_rate(&self) -> f64 {
        if self.total_pages == 0 {
            return 0.0;
        }
        (self.total_pages - self.pages_failed) as f64 / self.total_pages as f64 * 100.0
    }
}

/// Prints statistics to stderr in a formatted manner
pub fn print_statistics(stats: &CrawlStatistics) {
    eprintln!("=== Crawl Statistics ===\n");

    eprintln!("Overview:");
    eprintln!("  Seed: {}", stats.source_url);
    eprintln!("  Total pages crawled: {}", stats.total_pages);
    eprintln!("  Failed pages: {}", stats.pages_failed);
    eprintln!("  Processing time: {:.2}s", stats.processing_time_seconds);
    eprintln!("  Stored categories: {}", stats.stored_categories);
    if stats.truncated {
        eprintln!(
            "  Truncated by crawl timeout ({} targets left pending)",
            stats.pending_targets
        );
    }
    eprintln!();

    eprintln!("Pages with Content:");
    for (category, count) in &stats.pages_by_category {
        eprintln!("  {}: {}", category, count);
    }
    eprintln!();

    eprintln!(
        "Success Rate: {:.1}% ({} / {} pages successfully processed)",
        stats.success_rate(),
        stats.total_pages - stats.pages_failed,
        stats.total_pages
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::{CrawlTarget, FetchError, PageError, PageResult};
    use crate::output::aggregator::{aggregate, CrawlInfo};
    use crate::url::normalize;
    use crate::ScrapeError;
    use chrono::Utc;
    use std::collections::BTreeMap;
    use std::time::Duration;

    fn failed(path: &str, depth: u32, error: FetchError) -> PageResult {
        let url = normalize(&format!("https://example.com{}", path), None).unwrap();
        let target = CrawlTarget::new(url, depth);
        let error = PageError::from_fetch(&target.url, &error, 0);
        PageResult::failed(target, error)
    }

    #[test]
    fn test_statistics_from_response() {
        let site = aggregate(
            vec![
                failed("/", 0, FetchError::Http(404)),
                failed("/a", 1, FetchError::Timeout),
            ],
            CrawlInfo {
                source_url: "https://example.com/".to_string(),
                company_name: "Example".to_string(),
                base_domain: "example.com".to_string(),
                max_depth: 2,
                config_hash: None,
                started_at: Utc::now(),
                elapsed: Duration::from_secs(2),
                truncated: true,
                pending_targets: 3,
            },
        );
        let mut files = BTreeMap::new();
        files.insert("text".to_string(), "file:///tmp/text.json".to_string());
        let response = ScrapeResponse::success(site.metadata, site.sitemap.coverage_summary, files);

        let stats = CrawlStatistics::from_response(&response).unwrap();
        assert_eq!(stats.total_pages, 2);
        assert_eq!(stats.pages_failed, 2);
        assert_eq!(stats.pending_targets, 3);
        assert!(stats.truncated);
        assert_eq!(stats.stored_categories, 1);
        assert_eq!(stats.success_rate(), 0.0);
    }

    #[test]
    fn test_no_statistics_for_failed_scrape() {
        let error = ScrapeError::InvalidRequest("bad".to_string());
        let response = ScrapeResponse::failure("Example", "https://example.com", &error);
        assert!(CrawlStatistics::from_response(&response).is_none());
    }
}
