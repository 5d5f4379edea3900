//! Collaborator abstractions
//!
//! The core never talks to a database or spawns a tool itself. Lookups go
//! through a [`Catalog`]; purges, deletion scripts and bulk loads go
//! through a [`BulkLoader`]. Backends implement these; the pipeline
//! injects them.

use crate::error::LoadResult;
use crate::mode::DeletionScope;
use crate::resolver::{IdentifierScope, NoteType, ObjectRef};
use async_trait::async_trait;
use std::fmt;
use std::path::{Path, PathBuf};

/// Read-only lookups needed before records can be built
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Key of a named object type (e.g. "Allele", "Marker")
    async fn object_type_key(&self, name: &str) -> LoadResult<Option<i64>>;

    /// Note type with the given name inside the object-type scope
    async fn note_type(&self, name: &str, object_type_key: i64) -> LoadResult<Option<NoteType>>;

    /// User key for a login name
    async fn user_key(&self, login: &str) -> LoadResult<Option<i64>>;

    /// Every preferred identifier of the scope's source authority
    async fn preferred_identifiers(&self, scope: &IdentifierScope) -> LoadResult<Vec<ObjectRef>>;

    /// Largest note key in storage, `None` when there are no notes
    async fn max_note_key(&self) -> LoadResult<Option<i64>>;
}

/// Which table an artifact feeds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    /// One row per note
    Note,
    /// One row per note chunk
    NoteChunk,
}

impl ArtifactKind {
    /// Fields per row
    pub fn width(self) -> usize {
        match self {
            Self::Note => 8,
            Self::NoteChunk => 7,
        }
    }

    /// Position of the free-text field, if the row has one
    pub fn text_field(self) -> Option<usize> {
        match self {
            Self::Note => None,
            Self::NoteChunk => Some(2),
        }
    }
}

/// A delimited file ready for bulk load
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// What the rows describe
    pub kind: ArtifactKind,
    /// Destination table name
    pub table: String,
    /// File location
    pub path: PathBuf,
    /// Rows written
    pub rows: u64,
}

impl Artifact {
    /// File location
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Rows accepted by a bulk load
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct RowsLoaded(pub u64);

impl fmt::Display for RowsLoaded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} rows", self.0)
    }
}

/// Persistence side of a run
///
/// Failures are reported, never retried.
#[async_trait]
pub trait BulkLoader: Send + Sync {
    /// Delete every stored note in `scope`, returning the count deleted
    /// (when the backend can tell)
    async fn purge(&self, scope: &DeletionScope) -> LoadResult<u64>;

    /// Execute a script of deletion statements
    async fn execute_script(&self, script: &Path) -> LoadResult<()>;

    /// Ingest a delimited artifact into its table
    async fn load(&self, artifact: &Artifact) -> LoadResult<RowsLoaded>;

    /// Loader name for diagnostics
    fn name(&self) -> &'static str;
}
