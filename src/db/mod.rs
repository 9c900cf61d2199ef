//! SQLite-backed store for employees, reports and mapping rules.
//!
//! The database lives at `~/.reportmap/reportmap.db` unless the config or
//! `DATABASE_PATH` points elsewhere. Employees and reports are seeded from
//! outside; mapping rows are written by the mapping writer and are never
//! hard-deleted (exclusion flips the flag).

use std::path::PathBuf;
use std::time::Duration;

use chrono::Utc;
use rusqlite::{params, Connection};

use crate::types::{Employee, InclusionFlag, MappingRule, MappingType, Region, Report};

pub mod types;
pub use types::*;

mod employees;
mod mappings;
mod reports;

pub struct MappingDb {
    conn: Connection,
}

impl MappingDb {
    /// Borrow the underlying connection for ad-hoc queries.
    #[cfg(test)]
    pub fn conn_ref(&self) -> &Connection {
        &self.conn
    }

    /// Execute a closure within a SQLite transaction.
    /// Commits on Ok, rolls back on Err.
    pub fn with_transaction<F, T>(&self, f: F) -> Result<T, DbError>
    where
        F: FnOnce(&Self) -> Result<T, DbError>,
    {
        self.conn.execute_batch("BEGIN IMMEDIATE")?;
        match f(self) {
            Ok(val) => {
                self.conn.execute_batch("COMMIT")?;
                Ok(val)
            }
            Err(e) => {
                let _ = self.conn.execute_batch("ROLLBACK");
                Err(e)
            }
        }
    }

    /// Open a database at an explicit path.
    pub fn open_at(path: PathBuf) -> Result<Self, DbError> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(DbError::CreateDir)?;
            }
        }

        let conn = Connection::open(&path)?;
        conn.busy_timeout(Duration::from_secs(5))?;

        // WAL lets the read-only handlers proceed while a mapping write commits
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;

        crate::migrations::run_migrations(&conn).map_err(DbError::Migration)?;

        conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        log::info!("Opened mapping database at {}", path.display());
        Ok(Self { conn })
    }

    /// Resolve the default database path: `~/.reportmap/reportmap.db`.
    pub fn default_path() -> Result<PathBuf, DbError> {
        let home = dirs::home_dir().ok_or(DbError::HomeDirNotFound)?;
        Ok(home.join(".reportmap").join("reportmap.db"))
    }

    /// True when neither employees nor reports have been loaded yet.
    pub fn is_empty(&self) -> Result<bool, DbError> {
        let count: i64 = self.conn.query_row(
            "SELECT (SELECT COUNT(*) FROM employees) + (SELECT COUNT(*) FROM reports)",
            [],
            |row| row.get(0),
        )?;
        Ok(count == 0)
    }
}


// =============================================================================
// Tests
// =============================================================================
