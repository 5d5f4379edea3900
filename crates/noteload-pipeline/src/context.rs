//! Run context
//!
//! Everything a run needs is gathered here once, before the first phase,
//! and passed by reference from then on.

use crate::error::{PipelineError, PipelineResult};
use chrono::{DateTime, Local, NaiveDateTime};
use noteload_config::{LoaderConfig, TableNames};
use noteload_core::{IdentifierScope, NoteLoadResult, ProcessingMode};
use std::path::{Path, PathBuf};

/// The eight run arguments, as given by the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunArgs {
    /// Database server
    pub server: String,
    /// Database name
    pub database: String,
    /// Login user; also the created-by user of every record
    pub user: String,
    /// File holding the database password
    pub password_file: PathBuf,
    /// Processing mode, parsed once the run log is open
    pub mode: String,
    /// Annotation file
    pub input_file: PathBuf,
    /// Object type name, e.g. "Allele"
    pub object_type: String,
    /// Note type name, e.g. "Molecular"
    pub note_type: String,
}

/// Output file locations of a run, all named after the input file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    /// `<tail>.<note table>.bcp`
    pub note: PathBuf,
    /// `<tail>.<chunk table>.bcp`
    pub note_chunk: PathBuf,
    /// `<tail>.sql`
    pub script: PathBuf,
    /// `<tail>.diagnostics`
    pub diagnostics: PathBuf,
    /// `<tail>.error`
    pub error: PathBuf,
}

impl ArtifactPaths {
    /// Paths under `directory` for input base name `tail`
    pub fn new(directory: &Path, tail: &str, tables: &TableNames) -> Self {
        Self {
            note: directory.join(format!("{tail}.{}.bcp", tables.note)),
            note_chunk: directory.join(format!("{tail}.{}.bcp", tables.note_chunk)),
            script: directory.join(format!("{tail}.sql")),
            diagnostics: directory.join(format!("{tail}.diagnostics")),
            error: directory.join(format!("{tail}.error")),
        }
    }
}

/// Immutable state of one run
#[derive(Debug, Clone)]
pub struct LoadContext {
    /// Run arguments
    pub args: RunArgs,
    /// Resolved configuration
    pub config: LoaderConfig,
    /// Start of the run; also the audit date of every record
    pub started: DateTime<Local>,
    /// Base name of the input file
    pub tail: String,
    /// Output locations
    pub paths: ArtifactPaths,
}

impl LoadContext {
    /// Build the context, stamping the start time now
    pub fn new(args: RunArgs, config: LoaderConfig) -> PipelineResult<Self> {
        Self::started_at(args, config, Local::now())
    }

    /// Build the context with an explicit start time
    pub fn started_at(
        args: RunArgs,
        config: LoaderConfig,
        started: DateTime<Local>,
    ) -> PipelineResult<Self> {
        config.validate()?;
        let tail = args
            .input_file
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| PipelineError::InputName(args.input_file.clone()))?;
        let paths = ArtifactPaths::new(&config.output_directory, &tail, &config.tables);

        Ok(Self {
            args,
            config,
            started,
            tail,
            paths,
        })
    }

    /// Parse the mode argument
    pub fn mode(&self) -> NoteLoadResult<ProcessingMode> {
        self.args.mode.parse()
    }

    /// Audit date of every record in the run
    pub fn load_date(&self) -> NaiveDateTime {
        self.started.naive_local()
    }

    /// Which accessions resolve for `object_type_key`
    pub fn identifier_scope(&self, object_type_key: i64) -> IdentifierScope {
        IdentifierScope {
            object_type_key,
            logical_db_key: self.config.identifiers.logical_db_key,
            prefix: self.config.identifiers.prefix.clone(),
        }
    }
}
