//! SQLite storage implementation
//!
//! Payloads are kept as JSON text in a single `payloads` table. Locations have
//! the form `sqlite://<path>#<id>`.

use crate::output::Category;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{ResultStore, StorageError, StorageResult};
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use std::fs;
use std::path::Path;
use tokio::sync::Mutex;

const LOCATION_PREFIX: &str = "sqlite://";

/// SQLite result store
///
/// The connection sits behind a mutex so loads can run through a shared reference.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    path: String,
}

impl SqliteStore {
    /// Opens or creates the database at `path`
    pub fn open(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
        ",
        )?;
        initialize_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
            path: path.display().to_string(),
        })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            path: ":memory:".to_string(),
        })
    }

    /// Number of stored payloads for `company`
    pub async fn count_payloads(&self, company: &str) -> StorageResult<u64> {
        let count: i64 = self.conn.lock().await.query_row(
            "SELECT COUNT(*) FROM payloads WHERE company = ?1",
            params![company],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn parse_location(&self, location: &str) -> StorageResult<i64> {
        let invalid = || StorageError::InvalidLocation(location.to_string());

        let rest = location.strip_prefix(LOCATION_PREFIX).ok_or_else(invalid)?;
        let (path, id) = rest.rsplit_once('#').ok_or_else(invalid)?;
        if path != self.path {
            return Err(invalid());
        }
        id.parse().map_err(|_| invalid())
    }
}

#[async_trait]
impl ResultStore for SqliteStore {
    async fn store(
        &mut self,
        company: &str,
        data_type: Category,
        payload: &Value,
    ) -> StorageResult<String> {
        let conn = self.conn.get_mut();
        conn.execute(
            "INSERT INTO payloads (company, data_type, payload, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                company,
                data_type.as_str(),
                serde_json::to_string(payload)?,
                Utc::now().to_rfc3339()
            ],
        )?;
        let id = conn.last_insert_rowid();
        Ok(format!("{}{}#{}", LOCATION_PREFIX, self.path, id))
    }

    async fn load(&self, location: &str) -> StorageResult<Value> {
        let id = self.parse_location(location)?;
        let text: Option<String> = self
            .conn
            .lock()
            .await
            .query_row(
                "SELECT payload FROM payloads WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?;

        let text = text.ok_or_else(|| StorageError::NotFound(location.to_string()))?;
        Ok(serde_json::from_str(&text)?)
    }
}
