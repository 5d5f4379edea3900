//! Pipeline error type

use noteload_config::ConfigError;
use noteload_core::{LoadError, NoteLoadError};
use std::path::PathBuf;
use thiserror::Error;

/// Anything that aborts a run
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Resolution, parsing or mode failure
    #[error(transparent)]
    NoteLoad(#[from] NoteLoadError),

    /// Collaborator failure (purge, script, bulk load)
    #[error(transparent)]
    Load(#[from] LoadError),

    /// Invalid configuration
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A file of the run could not be read or written
    #[error("{}: {source}", path.display())]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The input path has no file name to derive artifact names from
    #[error("Input path has no file name: {}", .0.display())]
    InputName(PathBuf),

    /// Strict identifier checking found unresolved identifiers
    #[error("{0} identifier(s) did not resolve")]
    UnresolvedIdentifiers(usize),
}

impl PipelineError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;
