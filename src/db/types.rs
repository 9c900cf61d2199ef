//! Shared type definitions for the database layer.

use thiserror::Error;

/// Errors specific to database operations.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Home directory not found")]
    HomeDirNotFound,

    #[error("Failed to create database directory: {0}")]
    CreateDir(std::io::Error),

    #[error("Schema migration failed: {0}")]
    Migration(String),

    #[error("Unrecognized value in column {column}: {value}")]
    BadColumn { column: &'static str, value: String },
}

/// A row from the `mappings` table including bookkeeping columns.
#[cfg(test)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbMappingRow {
    pub id: i64,
    pub rule: crate::types::MappingRule,
    pub created_at: String,
    pub updated_at: String,
}
