//! The summary returned to the caller after a scrape

use crate::output::types::{CoverageSummary, CrawlMetadata};
use crate::ScrapeError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Error,
}

/// JSON summary of one scrape request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScrapeResponse {
    pub status: ResponseStatus,
    pub company_name: String,
    pub url: String,
    pub timestamp: DateTime<Utc>,
    /// Category name -> storage location
    pub storage_files: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<CrawlMetadata>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coverage_summary: Option<CoverageSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl ScrapeResponse {
    pub fn success(
        metadata: CrawlMetadata,
        coverage: CoverageSummary,
        storage_files: BTreeMap<String, String>,
    ) -> Self {
        Self {
            status: ResponseStatus::Success,
            company_name: metadata.company_name.clone(),
            url: metadata.source_url.clone(),
            timestamp: Utc::now(),
            storage_files,
            metadata: Some(metadata),
            coverage_summary: Some(coverage),
            error_type: None,
            error_message: None,
        }
    }

    pub fn failure(company_name: &str, url: &str, error: &ScrapeError) -> Self {
        Self {
            status: ResponseStatus::Error,
            company_name: company_name.to_string(),
            url: url.to_string(),
            timestamp: Utc::now(),
            storage_files: BTreeMap::new(),
            metadata: None,
            coverage_summary: None,
            error_type: Some(error.error_type().to_string()),
            error_message: Some(error.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ResponseStatus::Success
    }
}
