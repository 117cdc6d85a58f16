//! Object-store result store
//!
//! Keys follow the local folder layout, `<company>/<data_type>/<file>.json`, and
//! locations have the form `s3://<bucket>/<key>`. Object stores have no
//! directories, so nothing is prepared ahead of the first write.

use crate::config::OutputConfig;
use crate::output::Category;
use crate::storage::local::payload_file_name;
use crate::storage::traits::{ResultStore, StorageError, StorageResult};
use async_trait::async_trait;
use object_store::aws::AmazonS3Builder;
use object_store::path::Path as ObjectPath;
use object_store::{ObjectStore, PutPayload};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

const LOCATION_PREFIX: &str = "s3://";

/// Result store backed by an S3 bucket
pub struct S3Store {
    bucket: String,
    inner: Arc<dyn ObjectStore>,
}

impl S3Store {
    /// Connects to the configured bucket
    ///
    /// Credentials and endpoint overrides are read from the usual `AWS_*`
    /// environment variables.
    pub fn from_config(config: &OutputConfig) -> StorageResult<Self> {
        let s3 = AmazonS3Builder::from_env()
            .with_bucket_name(&config.s3_bucket)
            .with_region(&config.s3_region)
            .build()?;
        info!("S3 store ready for bucket {} ({})", config.s3_bucket, config.s3_region);
        Ok(Self::with_object_store(config.s3_bucket.clone(), Arc::new(s3)))
    }

    /// Wraps any object store under the given bucket name
    pub fn with_object_store(bucket: impl Into<String>, inner: Arc<dyn ObjectStore>) -> Self {
        Self {
            bucket: bucket.into(),
            inner,
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    fn parse_location(&self, location: &str) -> StorageResult<ObjectPath> {
        let invalid = || StorageError::InvalidLocation(location.to_string());

        let rest = location.strip_prefix(LOCATION_PREFIX).ok_or_else(invalid)?;
        let (bucket, key) = rest.split_once('/').ok_or_else(invalid)?;
        if bucket != self.bucket || key.is_empty() {
            return Err(invalid());
        }
        ObjectPath::parse(key).map_err(|_| invalid())
    }
}

#[async_trait]
impl ResultStore for S3Store {
    async fn store(
        &mut self,
        company: &str,
        data_type: Category,
        payload: &Value,
    ) -> StorageResult<String> {
        let key = format!(
            "{}/{}/{}",
            company,
            data_type.as_str(),
            payload_file_name(company, data_type)
        );
        let path = ObjectPath::parse(&key).map_err(|_| StorageError::InvalidLocation(key.clone()))?;

        let body = serde_json::to_vec_pretty(payload)?;
        self.inner.put(&path, PutPayload::from(body)).await?;

        let location = format!("{}{}/{}", LOCATION_PREFIX, self.bucket, path);
        debug!("Uploaded {} payload to {}", data_type, location);
        Ok(location)
    }

    async fn load(&self, location: &str) -> StorageResult<Value> {
        let path = self.parse_location(location)?;
        let object = match self.inner.get(&path).await {
            Ok(object) => object,
            Err(object_store::Error::NotFound { .. }) => {
                return Err(StorageError::NotFound(location.to_string()))
            }
            Err(e) => return Err(e.into()),
        };
        let bytes = object.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}
