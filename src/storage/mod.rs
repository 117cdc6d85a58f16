//! Storage module for persisting crawl results
//!
//! This module handles writing per-category payloads to a result store:
//! - [`LocalStore`]: JSON files under a per-company folder layout
//! - [`SqliteStore`]: payload rows in a SQLite database
//! - [`S3Store`]: objects in an S3 bucket, keyed like the local layout

mod local;
mod s3;
mod schema;
mod sqlite;
mod traits;

pub use local::{create_company_folders, LocalStore};
pub use s3::S3Store;
pub use sqlite::SqliteStore;
pub use traits::{ResultStore, StorageError, StorageResult};

use crate::config::{OutputConfig, StorageBackend};
use crate::output::{build_payload, error_payload, Category, CrawlMetadata, SiteResult};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, error};

/// Opens the store selected by the output configuration
pub fn open_store(config: &OutputConfig) -> StorageResult<Box<dyn ResultStore>> {
    match config.backend {
        StorageBackend::Local => Ok(Box::new(LocalStore::new(&config.base_path))),
        StorageBackend::Sqlite => Ok(Box::new(SqliteStore::open(Path::new(&config.database_path))?)),
        StorageBackend::S3 => Ok(Box::new(S3Store::from_config(config)?)),
    }
}

/// Stores every category of `site` under `company`
///
/// The eight data categories are always written; `errors` only when at least
/// one page failed. Returns category name -> location.
pub async fn persist_site_result(
    store: &mut dyn ResultStore,
    company: &str,
    site: &SiteResult,
) -> StorageResult<BTreeMap<String, String>> {
    store.prepare(company).await?;

    let mut categories = Category::ALWAYS_STORED.to_vec();
    if !site.errors.is_empty() {
        categories.push(Category::Errors);
    }

    let mut locations = BTreeMap::new();
    for category in categories {
        let payload = build_payload(site, category)?;
        let location = store.store(company, category, &payload).await.map_err(|e| {
            error!("Failed to store {} for {}: {}", category, company, e);
            e
        })?;
        debug!("Stored {} at {}", category, location);
        locations.insert(category.as_str().to_string(), location);
    }

    Ok(locations)
}

/// Stores the record of a failed scrape in the `errors` category
pub async fn persist_error(
    store: &mut dyn ResultStore,
    company: &str,
    metadata: &CrawlMetadata,
    error_type: &str,
    error_message: &str,
) -> StorageResult<String> {
    let payload = error_payload(metadata, error_type, error_message)?;
    store.store(company, Category::Errors, &payload).await
}
