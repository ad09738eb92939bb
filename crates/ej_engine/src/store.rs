use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::{params, Connection, ErrorCode, OptionalExtension, TransactionBehavior};
use thiserror::Error;

use crate::{ExternalJobRecord, TableHandle};

pub const EXTERNAL_JOBS_TABLE: &str = "e_jobs";

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("job {0} is already stored")]
    DuplicateId(String),
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Durable sink for external jobs, keyed by job id.
pub trait Store: Send + Sync {
    /// Creates the table when absent. Safe to call repeatedly.
    fn ensure_schema(&self) -> Result<TableHandle, StoreError>;

    /// Writes one record in its own transaction. A second insert for the same
    /// id fails with `StoreError::DuplicateId` and leaves the stored row as is.
    fn insert(&self, table: &TableHandle, record: &ExternalJobRecord) -> Result<(), StoreError>;
}

/// SQLite store opening a fresh connection for every operation.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    path: PathBuf,
}

impl SqliteStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(
        &self,
        table: &TableHandle,
        id: &str,
    ) -> Result<Option<ExternalJobRecord>, StoreError> {
        let conn = self.connect()?;
        let sql = format!(
            "SELECT id, job_title, company FROM {} WHERE id = ?1",
            table.name()
        );
        let record = conn
            .query_row(&sql, params![id], |row| {
                Ok(ExternalJobRecord {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    company: row.get(2)?,
                })
            })
            .optional()?;
        Ok(record)
    }

    pub fn count(&self, table: &TableHandle) -> Result<usize, StoreError> {
        let conn = self.connect()?;
        let sql = format!("SELECT COUNT(*) FROM {}", table.name());
        let count: i64 = conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(count.max(0) as usize)
    }

    fn connect(&self) -> Result<Connection, StoreError> {
        let conn = Connection::open(&self.path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Ok(conn)
    }
}

impl Store for SqliteStore {
    fn ensure_schema(&self) -> Result<TableHandle, StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let conn = self.connect()?;
        conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {EXTERNAL_JOBS_TABLE} (
                id TEXT PRIMARY KEY NOT NULL,
                job_title TEXT NOT NULL,
                company TEXT NOT NULL
            );"
        ))?;
        Ok(TableHandle::new(EXTERNAL_JOBS_TABLE))
    }

    fn insert(&self, table: &TableHandle, record: &ExternalJobRecord) -> Result<(), StoreError> {
        let mut conn = self.connect()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let sql = format!(
            "INSERT INTO {} (id, job_title, company) VALUES (?1, ?2, ?3)",
            table.name()
        );
        tx.execute(&sql, params![record.id, record.title, record.company])
            .map_err(|err| match err.sqlite_error_code() {
                Some(ErrorCode::ConstraintViolation) => StoreError::DuplicateId(record.id.clone()),
                _ => StoreError::Sqlite(err),
            })?;
        tx.commit()?;
        Ok(())
    }
}
