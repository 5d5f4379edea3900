//! SQLite connection settings

use std::path::{Path, PathBuf};

/// Connection settings for [`SqlitePool`](crate::SqlitePool)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqliteConfig {
    /// Database file, or `:memory:`
    pub path: PathBuf,
    /// Write-ahead logging
    pub wal_mode: bool,
    /// Enforce foreign keys (chunk rows cascade with their note)
    pub foreign_keys: bool,
    /// How long a locked database is retried
    pub busy_timeout_ms: u32,
    /// Page cache size (negative = KiB)
    pub cache_size: i32,
}

impl SqliteConfig {
    /// Settings for a database file
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            wal_mode: true,
            foreign_keys: true,
            busy_timeout_ms: 5_000,
            cache_size: -16_000,
        }
    }

    /// In-memory database for tests
    pub fn memory() -> Self {
        Self {
            wal_mode: false,
            ..Self::new(":memory:")
        }
    }

    /// Whether this points at an in-memory database
    pub fn is_memory(&self) -> bool {
        self.path.to_str() == Some(":memory:")
    }
}
