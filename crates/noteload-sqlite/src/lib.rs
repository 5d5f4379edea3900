//! SQLite backend for the note loader
//!
//! Implements both collaborator traits against one SQLite database:
//!
//! - **SqliteCatalog**: object-type, note-type, user, accession and next-key lookups
//! - **SqliteBulkLoader**: scoped purges, deletion scripts and artifact ingestion
//! - **WAL Mode**: enabled for file databases
//! - **Thread Safety**: Arc<Mutex<Connection>> pattern, blocking work on `spawn_blocking`
//!
//! ## Usage
//!
//! ```rust,ignore
//! use noteload_sqlite::{SqliteCatalog, SqliteConfig, SqlitePool};
//! use noteload_core::next_note_key;
//!
//! let pool = SqlitePool::new(SqliteConfig::new("./notes.db"))?;
//! let catalog = SqliteCatalog::new(pool, "MGI_Note")?;
//! let first_key = next_note_key(&catalog).await?;
//! ```

pub mod catalog;
pub mod config;
pub mod connection;
pub mod error;
pub mod loader;
pub mod schema;

pub use catalog::SqliteCatalog;
pub use config::SqliteConfig;
pub use connection::SqlitePool;
pub use error::{SqliteError, SqliteResult};
pub use loader::SqliteBulkLoader;
