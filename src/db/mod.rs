//! SQLite access for the assistant
//!
//! `Database` only remembers where the file is. Every call opens its own
//! connection and drops it before returning, so nothing is held between
//! requests.

pub mod executor;
pub mod schema;

pub use executor::QueryResult;
pub use schema::{ColumnInfo, Schema, TableInfo};

use crate::error::Result;
use rusqlite::{Connection, OpenFlags};
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct Database {
    path: PathBuf,
    read_only: bool,
}

impl Database {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            read_only: false,
        }
    }

    /// Open every execution connection read-only
    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open a connection to the existing file. The file is never created.
    fn open(&self, read_only: bool) -> Result<Connection> {
        let access = if read_only {
            OpenFlags::SQLITE_OPEN_READ_ONLY
        } else {
            OpenFlags::SQLITE_OPEN_READ_WRITE
        };
        debug!("Opening {} (read_only={})", self.path.display(), read_only);
        let flags = access | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        Ok(Connection::open_with_flags(&self.path, flags)?)
    }

    /// Read the current schema from the catalog
    pub fn introspect(&self) -> Result<Schema> {
        let conn = self.open(true)?;
        schema::introspect(&conn)
    }

    /// Run one statement and collect its full result set
    pub fn execute(&self, sql: &str) -> Result<QueryResult> {
        let conn = self.open(self.read_only)?;
        executor::run_query(&conn, sql)
    }

    /// `introspect` on the blocking thread pool
    pub async fn introspect_async(&self) -> Result<Schema> {
        let db = self.clone();
        tokio::task::spawn_blocking(move || db.introspect()).await?
    }

    /// `execute` on the blocking thread pool
    pub async fn execute_async(&self, sql: &str) -> Result<QueryResult> {
        let db = self.clone();
        let sql = sql.to_string();
        tokio::task::spawn_blocking(move || db.execute(&sql)).await?
    }
}
