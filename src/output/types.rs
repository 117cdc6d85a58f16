//! The aggregated per-site result

use crate::crawler::PageError;
use crate::extract::{ContactItem, ImageItem, MetadataItem, ProductItem, SocialItem, TextItem};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Named data categories handed to the persistence layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Text,
    Images,
    Contact,
    Products,
    SocialMedia,
    Metadata,
    RawHtml,
    Sitemap,
    Errors,
}

impl Category {
    /// Categories stored for every crawl, in storage order
    pub const ALWAYS_STORED: [Category; 8] = [
        Self::Text,
        Self::Images,
        Self::Contact,
        Self::Products,
        Self::SocialMedia,
        Self::Metadata,
        Self::RawHtml,
        Self::Sitemap,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Images => "images",
            Self::Contact => "contact",
            Self::Products => "products",
            Self::SocialMedia => "social_media",
            Self::Metadata => "metadata",
            Self::RawHtml => "raw_html",
            Self::Sitemap => "sitemap",
            Self::Errors => "errors",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Crawl-level metadata attached to the result and to every stored payload
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrawlMetadata {
    pub scraping_timestamp: DateTime<Utc>,
    pub source_url: String,
    pub company_name: String,
    pub extraction_method: String,
    /// Configured maximum depth
    pub crawl_depth: u32,
    pub total_pages_crawled: usize,
    pub processing_time_seconds: f64,
    pub base_domain: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_hash: Option<String>,
    pub truncated: bool,
}

/// Extracted items merged across pages, in arrival order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SiteData {
    pub text: Vec<TextItem>,
    pub images: Vec<ImageItem>,
    pub contact: Vec<ContactItem>,
    pub products: Vec<ProductItem>,
    pub social_media: Vec<SocialItem>,
    pub metadata_list: Vec<MetadataItem>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PageStatus {
    Completed,
    Failed,
}

/// One crawled page in the sitemap
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SitemapEntry {
    pub depth: u32,
    pub links_found: usize,
    /// Item categories that produced at least one record on this page
    pub data_extracted: Vec<Category>,
    pub status: PageStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CoverageSummary {
    pub total_pages: usize,
    pub pages_with_text: usize,
    pub pages_with_images: usize,
    pub pages_with_contact: usize,
    pub pages_with_products: usize,
    pub pages_with_social_media: usize,
    pub pages_failed: usize,
    /// The crawl deadline passed before the frontier was exhausted
    pub truncated: bool,
    /// Targets still pending when the crawl stopped
    pub pending_targets: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Sitemap {
    pub crawl_structure: BTreeMap<String, SitemapEntry>,
    pub coverage_summary: CoverageSummary,
}

/// Everything a crawl produced for one site
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SiteResult {
    pub metadata: CrawlMetadata,
    pub data: SiteData,
    pub raw_html: BTreeMap<String, String>,
    pub sitemap: Sitemap,
    pub errors: Vec<PageError>,
}
