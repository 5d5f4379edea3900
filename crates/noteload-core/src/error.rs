//! Error types for note loading
//!
//! Two layers:
//!
//! - [`LoadError`]: failures reported by external collaborators (catalog
//!   lookups, purges, script execution, bulk loads). The core never
//!   interprets these beyond success/failure.
//! - [`NoteLoadError`]: fatal conditions of a run. Any of these aborts the
//!   run before the bulk-load step.

use std::path::PathBuf;
use thiserror::Error;

/// Collaborator failure
#[derive(Error, Debug)]
pub enum LoadError {
    /// A catalog lookup failed (connection, query, ...)
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// Deleting existing notes failed
    #[error("Purge failed: {0}")]
    Purge(String),

    /// The bulk-load or script tool ran but reported failure
    #[error("{tool} exited with {status}")]
    ToolFailed {
        /// Program or backend that failed
        tool: String,
        /// Exit status description
        status: String,
    },

    /// An artifact could not be read back by the loader
    #[error("Invalid artifact {path} at row {row}: {reason}")]
    InvalidArtifact {
        /// Artifact path
        path: PathBuf,
        /// 1-based row number
        row: usize,
        /// What was wrong with the row
        reason: String,
    },

    /// Underlying I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Any other backend-specific failure
    #[error("Backend error: {0}")]
    Backend(String),
}

/// Result type for collaborator calls
pub type LoadResult<T> = Result<T, LoadError>;

/// Fatal run error
#[derive(Error, Debug)]
pub enum NoteLoadError {
    /// Mode name is not one of load / incremental / preview
    #[error("Invalid Processing Mode: {0}")]
    InvalidMode(String),

    /// Object type name is not in the catalog
    #[error("Invalid Object Type: {0}")]
    UnknownObjectType(String),

    /// Note type name does not resolve within the object-type scope
    #[error("Invalid Note Type Name: {name} (object type key {object_type_key})")]
    UnknownNoteType {
        /// Note type name as given (quotes stripped)
        name: String,
        /// Object-type scope that was searched
        object_type_key: i64,
    },

    /// Login user has no user key
    #[error("Invalid User: {0}")]
    UnknownUser(String),

    /// Input line has fewer fields than the layout requires
    #[error("Invalid Line ({line_number}): expected {expected} fields, found {found}: {line}")]
    MalformedLine {
        /// 1-based line number
        line_number: usize,
        /// Field count required by the layout
        expected: usize,
        /// Field count present
        found: usize,
        /// The offending line, without its terminator
        line: String,
    },

    /// Input line is not valid UTF-8
    #[error("Invalid Line ({line_number}): not valid UTF-8: {source}")]
    InvalidEncoding {
        /// 1-based line number
        line_number: usize,
        /// Decoding failure
        #[source]
        source: std::str::Utf8Error,
    },

    /// Escape table cannot be used
    #[error("Invalid escape rule: {0}")]
    InvalidEscapeRule(String),

    /// Artifact delimiters cannot be used
    #[error("Invalid artifact format: {0}")]
    InvalidFormat(String),

    /// Collaborator failure that aborts the run
    #[error(transparent)]
    Load(#[from] LoadError),
}

/// Result type for fatal run errors
pub type NoteLoadResult<T> = Result<T, NoteLoadError>;
