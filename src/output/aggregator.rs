//! Merging per-page results into a site result

use crate::crawler::PageResult;
use crate::output::types::{
    Category, CoverageSummary, CrawlMetadata, PageStatus, SiteData, SiteResult, Sitemap,
    SitemapEntry,
};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::time::Duration;

pub const EXTRACTION_METHOD: &str = "depth_bounded_html_crawl";

/// Crawl facts the aggregator cannot see in the page results themselves
#[derive(Debug, Clone)]
pub struct CrawlInfo {
    pub source_url: String,
    pub company_name: String,
    pub base_domain: String,
    pub max_depth: u32,
    pub config_hash: Option<String>,
    pub started_at: DateTime<Utc>,
    pub elapsed: Duration,
    pub truncated: bool,
    pub pending_targets: usize,
}

/// Builds a [`SiteResult`] incrementally as page results arrive
#[derive(Debug, Default)]
pub struct Aggregator {
    data: SiteData,
    raw_html: BTreeMap<String, String>,
    crawl_structure: BTreeMap<String, SitemapEntry>,
    coverage: CoverageSummary,
    errors: Vec<crate::crawler::PageError>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one page result in; lists keep arrival order
    pub fn add(&mut self, result: PageResult) {
        let url = result.url.to_string();
        let extracted = result.extracted;

        let mut data_extracted = Vec::new();
        for (category, count) in [
            (Category::Text, extracted.text.len()),
            (Category::Images, extracted.images.len()),
            (Category::Contact, extracted.contact.len()),
            (Category::Products, extracted.products.len()),
            (Category::SocialMedia, extracted.social.len()),
        ] {
            if count > 0 {
                data_extracted.push(category);
            }
        }

        self.coverage.total_pages += 1;
        for category in &data_extracted {
            match category {
                Category::Text => self.coverage.pages_with_text += 1,
                Category::Images => self.coverage.pages_with_images += 1,
                Category::Contact => self.coverage.pages_with_contact += 1,
                Category::Products => self.coverage.pages_with_products += 1,
                Category::SocialMedia => self.coverage.pages_with_social_media += 1,
                _ => {}
            }
        }

        let status = match result.error {
            Some(error) => {
                self.coverage.pages_failed += 1;
                self.errors.push(error);
                PageStatus::Failed
            }
            None => {
                self.raw_html.insert(url.clone(), result.html);
                PageStatus::Completed
            }
        };

        self.crawl_structure.insert(
            url,
            SitemapEntry {
                depth: result.depth,
                links_found: result.links.len(),
                data_extracted,
                status,
            },
        );

        self.data.text.extend(extracted.text);
        self.data.images.extend(extracted.images);
        self.data.contact.extend(extracted.contact);
        self.data.products.extend(extracted.products);
        self.data.social_media.extend(extracted.social);
        self.data.metadata_list.extend(extracted.page_metadata);
    }

    pub fn pages(&self) -> usize {
        self.coverage.total_pages
    }

    /// Finalizes the result
    pub fn finish(self, info: CrawlInfo) -> SiteResult {
        let mut coverage = self.coverage;
        coverage.truncated = info.truncated;
        coverage.pending_targets = info.pending_targets;

        SiteResult {
            metadata: CrawlMetadata {
                scraping_timestamp: info.started_at,
                source_url: info.source_url,
                company_name: info.company_name,
                extraction_method: EXTRACTION_METHOD.to_string(),
                crawl_depth: info.max_depth,
                total_pages_crawled: coverage.total_pages,
                processing_time_seconds: info.elapsed.as_secs_f64(),
                base_domain: info.base_domain,
                config_hash: info.config_hash,
                truncated: info.truncated,
            },
            data: self.data,
            raw_html: self.raw_html,
            sitemap: Sitemap {
                crawl_structure: self.crawl_structure,
                coverage_summary: coverage,
            },
            errors: self.errors,
        }
    }
}

/// One-shot aggregation of a finished set of page results
pub fn aggregate(results: impl IntoIterator<Item = PageResult>, info: CrawlInfo) -> SiteResult {
    let mut aggregator = Aggregator::new();
    for result in results {
        aggregator.add(result);
    }
    aggregator.finish(info)
}
