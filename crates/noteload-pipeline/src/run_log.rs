//! Diagnostics and error artifacts
//!
//! Two append-only files per input: `<tail>.diagnostics` records what the
//! run did (arguments, statements, loader calls, counters) and
//! `<tail>.error` records every skipped line. Both open with a
//! `Start Date/Time` line and close with `End Date/Time`, fatal runs
//! included.

use crate::context::{ArtifactPaths, RunArgs};
use crate::error::{PipelineError, PipelineResult};
use crate::note_load::LoadSummary;
use chrono::{DateTime, Local};
use noteload_core::SkipReason;
use std::fmt::Display;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

const TIMESTAMP_FORMAT: &str = "%m/%d/%Y %H:%M:%S";

struct LogFile {
    path: PathBuf,
    file: File,
}

impl LogFile {
    fn append(path: &Path) -> PipelineResult<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| PipelineError::io(path, e))?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    fn line(&mut self, text: impl Display) -> PipelineResult<()> {
        writeln!(self.file, "{text}").map_err(|e| PipelineError::io(&self.path, e))
    }
}

/// Open diagnostics and error artifacts of one run
pub struct RunLog {
    diagnostics: LogFile,
    errors: LogFile,
}

impl RunLog {
    /// Open both files for appending and write their headers
    pub fn open(paths: &ArtifactPaths, args: &RunArgs, started: DateTime<Local>) -> PipelineResult<Self> {
        let mut log = Self {
            diagnostics: LogFile::append(&paths.diagnostics)?,
            errors: LogFile::append(&paths.error)?,
        };

        let stamp = started.format(TIMESTAMP_FORMAT);
        let d = &mut log.diagnostics;
        d.line(format_args!("Start Date/Time: {stamp}"))?;
        d.line(format_args!("Server: {}", args.server))?;
        d.line(format_args!("Database: {}", args.database))?;
        d.line(format_args!("User: {}", args.user))?;
        d.line(format_args!("Input File: {}", args.input_file.display()))?;
        d.line(format_args!("Object Type: {}", args.object_type))?;
        d.line(format_args!("Note Type: {}", args.note_type))?;
        d.line(format_args!("Mode: {}", args.mode))?;
        d.line("")?;

        log.errors.line(format_args!("Start Date/Time: {stamp}"))?;
        log.errors.line("")?;

        Ok(log)
    }

    /// Free-form diagnostics line
    pub fn note(&mut self, text: impl Display) -> PipelineResult<()> {
        self.diagnostics.line(text)
    }

    /// Echo a statement about to run against the store
    pub fn statement(&mut self, sql: &str) -> PipelineResult<()> {
        self.diagnostics.line(sql)
    }

    /// One skipped input line
    pub fn skip(&mut self, line_number: usize, reason: &SkipReason) -> PipelineResult<()> {
        self.errors.line(format_args!("Line {line_number}: {reason}"))
    }

    /// Reason a run aborted, written to both files
    pub fn fatal(&mut self, error: &PipelineError) -> PipelineResult<()> {
        self.diagnostics.line(format_args!("FATAL: {error}"))?;
        self.errors.line(format_args!("FATAL: {error}"))
    }

    /// Closing counters
    pub fn summary(&mut self, summary: &LoadSummary) -> PipelineResult<()> {
        let d = &mut self.diagnostics;
        d.line("")?;
        d.line(format_args!("Lines read: {}", summary.lines_read))?;
        d.line(format_args!("Notes built: {}", summary.notes_built))?;
        d.line(format_args!("Chunks built: {}", summary.chunks_built))?;
        d.line(format_args!(
            "Skipped (unresolved identifier): {}",
            summary.skipped_unresolved
        ))?;
        d.line(format_args!("Skipped (empty text): {}", summary.skipped_empty))?;
        d.line(format_args!("Rows loaded: {}", summary.rows_loaded))
    }

    /// Write `End Date/Time` to both files and close them
    pub fn close(mut self, ended: DateTime<Local>) -> PipelineResult<()> {
        let stamp = ended.format(TIMESTAMP_FORMAT);
        self.diagnostics.line("")?;
        self.diagnostics.line(format_args!("End Date/Time: {stamp}"))?;
        self.errors.line("")?;
        self.errors.line(format_args!("End Date/Time: {stamp}"))
    }
}
