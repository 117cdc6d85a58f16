//! Output module for assembling and reporting crawl results
//!
//! This module handles:
//! - Merging per-page results into a [`SiteResult`]
//! - Building the per-category payloads handed to storage
//! - The [`ScrapeResponse`] summary and human-readable statistics

pub mod aggregator;
pub mod payload;
mod response;
pub mod stats;
mod types;

pub use aggregator::{aggregate, Aggregator, CrawlInfo};
pub use payload::{build_payload, error_payload, ExtractionSummary};
pub use response::{ResponseStatus, ScrapeResponse};
pub use stats::{print_statistics, CrawlStatistics};
pub use types::{
    Category, CoverageSummary, CrawlMetadata, PageStatus, SiteData, SiteResult, Sitemap,
    SitemapEntry,
};
