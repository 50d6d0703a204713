//! The embedded DuckDB store.
//!
//! One `Store` owns the single connection of a run. The command layer opens
//! it and lends it to whichever stage needs it.

use crate::error::{PipelineError, Result, Stage};
use crate::input;
use crate::model::Entity;
use duckdb::Connection;
use std::fs;
use std::path::{Path, PathBuf};

pub struct Store {
    conn: Connection,
    path: Option<PathBuf>,
}

impl Store {
    /// Open (or create) a store file
    pub fn open(path: &Path, stage: Stage) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| PipelineError::io(parent, e))?;
        }
        let conn = Connection::open(path).map_err(|e| PipelineError::store(stage, e))?;
        log::debug!("{}: opened store {}", stage, path.display());
        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    /// Open a store that lives only as long as this value
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| PipelineError::store(Stage::Load, e))?;
        Ok(Self { conn, path: None })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Execute one statement, returning the number of rows changed
    pub fn execute(&self, sql: &str) -> duckdb::Result<usize> {
        self.conn.execute(sql, [])
    }

    pub fn execute_batch(&self, sql: &str) -> duckdb::Result<()> {
        self.conn.execute_batch(sql)
    }

    /// Run a query returning a single integer
    pub fn count(&self, sql: &str) -> duckdb::Result<u64> {
        let n: i64 = self.conn.query_row(sql, [], |row| row.get(0))?;
        Ok(n.max(0) as u64)
    }

    pub fn table_count(&self, entity: Entity) -> duckdb::Result<u64> {
        self.count(&format!("SELECT COUNT(*) FROM {}", entity.table()))
    }

    /// Row counts of all four tables, root first
    pub fn counts(&self) -> duckdb::Result<Vec<(Entity, u64)>> {
        Entity::ALL
            .iter()
            .map(|&e| self.table_count(e).map(|n| (e, n)))
            .collect()
    }

    pub fn table_exists(&self, table: &str) -> duckdb::Result<bool> {
        let n: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM information_schema.tables WHERE table_name = ?",
            duckdb::params![table],
            |row| row.get(0),
        )?;
        Ok(n > 0)
    }

    /// Execute a schema file. The file is required.
    pub fn apply_schema(&self, path: &Path, stage: Stage) -> Result<()> {
        let sql = input::read_text(path, stage, "schema file")?;
        self.execute_batch(&sql)
            .map_err(|e| PipelineError::store(stage, e))?;
        log::debug!("{}: applied schema {}", stage, path.display());
        Ok(())
    }
}

/// Write-ahead log that DuckDB keeps next to a store file
pub fn wal_path(path: &Path) -> PathBuf {
    PathBuf::from(format!("{}.wal", path.display()))
}

/// Remove a store file and its write-ahead log, returning what was removed.
pub fn remove_store_files(path: &Path) -> Result<Vec<PathBuf>> {
    let mut removed = Vec::new();
    for candidate in [path.to_path_buf(), wal_path(path)] {
        if candidate.exists() {
            fs::remove_file(&candidate).map_err(|e| PipelineError::io(&candidate, e))?;
            removed.push(candidate);
        }
    }
    Ok(removed)
}
