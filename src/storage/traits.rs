//! Storage traits and error types
//!
//! This module defines the trait interface for result stores and
//! associated error types.

use crate::output::Category;
use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Object store error: {0}")]
    ObjectStore(#[from] object_store::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Payload not found: {0}")]
    NotFound(String),

    #[error("Invalid storage location: {0}")]
    InvalidLocation(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// A place crawl payloads can be written to and read back from
///
/// `company` is the sanitized storage key (see
/// [`crate::crawler::sanitize_company_name`]); the returned location string is
/// opaque to callers and only meaningful to [`ResultStore::load`] of the same
/// backend.
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Prepares the store for `company` before its first write
    async fn prepare(&mut self, _company: &str) -> StorageResult<()> {
        Ok(())
    }

    /// Stores one category payload and returns its location
    async fn store(
        &mut self,
        company: &str,
        data_type: Category,
        payload: &Value,
    ) -> StorageResult<String>;

    /// Reads back a payload previously returned by [`ResultStore::store`]
    async fn load(&self, location: &str) -> StorageResult<Value>;
}
