//! Error types for the SQLite backend

use noteload_core::LoadError;
use std::path::PathBuf;
use thiserror::Error;

/// SQLite backend error type
#[derive(Error, Debug)]
pub enum SqliteError {
    /// Database connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Schema/migration error
    #[error("Schema error: {0}")]
    Schema(String),

    /// Table name is not a plain identifier
    #[error("Invalid table name: {0:?}")]
    InvalidTableName(String),

    /// Artifact row does not fit its table
    #[error("Invalid artifact {path} at row {row}: {reason}")]
    InvalidArtifact {
        /// Artifact path
        path: PathBuf,
        /// 1-based row number
        row: usize,
        /// What was wrong
        reason: String,
    },

    /// Reading an artifact or script failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Blocking task panicked or was cancelled
    #[error("Task error: {0}")]
    Task(String),

    /// Underlying rusqlite error
    #[error("SQLite error: {0}")]
    Rusqlite(#[from] rusqlite::Error),
}

/// Result type for SQLite operations
pub type SqliteResult<T> = Result<T, SqliteError>;

impl From<SqliteError> for LoadError {
    fn from(err: SqliteError) -> Self {
        match err {
            SqliteError::InvalidArtifact { path, row, reason } => {
                Self::InvalidArtifact { path, row, reason }
            }
            SqliteError::Io(e) => Self::Io(e),
            other => Self::Backend(other.to_string()),
        }
    }
}

impl From<tokio::task::JoinError> for SqliteError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Task(err.to_string())
    }
}
