//! JSON files on the local filesystem
//!
//! Layout: `<base>/<company>/<data_type>/<company>_<data_type>_<timestamp>.json`,
//! with crawl errors written as `<company>_crawl_error_<timestamp>.json`.

use crate::output::Category;
use crate::storage::traits::{ResultStore, StorageError, StorageResult};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tokio::fs as async_fs;
use tracing::debug;
use url::Url;

const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S_%3f";

/// File name for a new payload of `data_type`, stamped with the current time
pub(crate) fn payload_file_name(company: &str, data_type: Category) -> String {
    let timestamp = Utc::now().format(TIMESTAMP_FORMAT);
    match data_type {
        Category::Errors => format!("{}_crawl_error_{}.json", company, timestamp),
        other => format!("{}_{}_{}.json", company, other, timestamp),
    }
}

/// Filesystem-backed result store
#[derive(Debug, Clone)]
pub struct LocalStore {
    base: PathBuf,
}

impl LocalStore {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    fn file_path(&self, company: &str, data_type: Category) -> PathBuf {
        self.base
            .join(company)
            .join(data_type.as_str())
            .join(payload_file_name(company, data_type))
    }
}

/// Creates `<base>/<company>/<category>/` for every category
pub fn create_company_folders(base: &Path, company: &str) -> StorageResult<PathBuf> {
    let company_dir = base.join(company);
    for category in Category::ALWAYS_STORED.iter().chain([&Category::Errors]) {
        fs::create_dir_all(company_dir.join(category.as_str()))?;
    }
    Ok(company_dir)
}

#[async_trait]
impl ResultStore for LocalStore {
    async fn prepare(&mut self, company: &str) -> StorageResult<()> {
        create_company_folders(&self.base, company).map(|_| ())
    }

    async fn store(
        &mut self,
        company: &str,
        data_type: Category,
        payload: &Value,
    ) -> StorageResult<String> {
        let path = self.file_path(company, data_type);
        if let Some(parent) = path.parent() {
            async_fs::create_dir_all(parent).await?;
        }

        async_fs::write(&path, serde_json::to_vec_pretty(payload)?).await?;

        let absolute = async_fs::canonicalize(&path).await?;
        let location = Url::from_file_path(&absolute)
            .map_err(|_| StorageError::InvalidLocation(absolute.display().to_string()))?;
        debug!("Wrote {} payload to {}", data_type, absolute.display());
        Ok(location.to_string())
    }

    async fn load(&self, location: &str) -> StorageResult<Value> {
        let url = Url::parse(location).map_err(|_| StorageError::InvalidLocation(location.to_string()))?;
        if url.scheme() != "file" {
            return Err(StorageError::InvalidLocation(location.to_string()));
        }
        let path = url
            .to_file_path()
            .map_err(|_| StorageError::InvalidLocation(location.to_string()))?;
        if !async_fs::try_exists(&path).await? {
            return Err(StorageError::NotFound(location.to_string()));
        }
        Ok(serde_json::from_slice(&async_fs::read(path).await?)?)
    }
}
