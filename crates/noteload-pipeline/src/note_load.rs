//! Note Load Orchestrator
//!
//! ## Phases
//!
//! 1. **Resolve**: mode, object type, note type, user, identifier map and
//!    the first surrogate key
//! 2. **Read**: the whole input file is read and split into lines; an
//!    unreadable file or a malformed line aborts here
//! 3. **Check**: strict identifier checking, if enabled
//! 4. **Purge**: `load` mode deletes every note of the type up front
//! 5. **Build**: each input line becomes a note plus its chunks, written
//!    straight to the artifacts; unresolved and empty lines are skipped
//! 6. **Load**: `incremental` runs the deletion script, then active modes
//!    load the note artifact followed by the chunk artifact
//!
//! Nothing in the store changes before phase 4, so every fatal input
//! condition leaves existing notes in place. `preview` stops after phase 5
//! without touching the loader.

use crate::context::LoadContext;
use crate::emitter::{BulkEmitter, EmittedArtifacts};
use crate::error::{PipelineError, PipelineResult};
use crate::run_log::RunLog;
use chrono::Local;
use noteload_core::{
    next_note_key, resolve_note_type, resolve_object_type, resolve_user, AuditStamp, BuildOutcome,
    BuilderSettings, BulkLoader, Catalog, IdentifierMap, InputLine, NoteType, ProcessingMode,
    RecordBuilder, SkipReason,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Counters of a finished run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadSummary {
    /// Input lines read
    pub lines_read: usize,
    /// Notes built
    pub notes_built: usize,
    /// Chunks built
    pub chunks_built: usize,
    /// Lines whose identifier did not resolve
    pub skipped_unresolved: usize,
    /// Lines with empty text
    pub skipped_empty: usize,
    /// Rows the loader accepted across both artifacts
    pub rows_loaded: u64,
}

/// Keys and lookups resolved before any line is read
struct Resolved {
    mode: ProcessingMode,
    object_type_key: i64,
    note_type: NoteType,
    user_key: i64,
    identifiers: IdentifierMap,
    first_key: i64,
}

/// The run orchestrator
///
/// ```text
/// NoteLoadPipeline
///   ├─> Catalog    (resolve phase)
///   ├─> BulkEmitter (build phase)
///   └─> BulkLoader (purge, script, load phases)
/// ```
pub struct NoteLoadPipeline {
    catalog: Arc<dyn Catalog>,
    loader: Arc<dyn BulkLoader>,
}

impl NoteLoadPipeline {
    /// Create a pipeline over its collaborators
    pub fn new(catalog: Arc<dyn Catalog>, loader: Arc<dyn BulkLoader>) -> Self {
        Self { catalog, loader }
    }

    /// Run once
    ///
    /// The diagnostics and error artifacts are opened first; whatever
    /// happens after that, both are closed with `End Date/Time`.
    ///
    /// # Errors
    ///
    /// Any fatal condition: bad mode, unknown object type, note type or
    /// user, unreadable input, malformed line, strict identifier failure,
    /// collaborator failure.
    pub async fn run(&self, ctx: &LoadContext) -> PipelineResult<LoadSummary> {
        let start = std::time::Instant::now();
        info!(input = %ctx.args.input_file.display(), mode = %ctx.args.mode, "Starting note load");

        let mut log = RunLog::open(&ctx.paths, &ctx.args, ctx.started)?;
        let result = self.execute(ctx, &mut log).await;

        match &result {
            Ok(summary) => log.summary(summary)?,
            Err(error) => {
                warn!(%error, "Note load failed");
                log.fatal(error)?;
            }
        }
        log.close(Local::now())?;

        if let Ok(summary) = &result {
            info!(
                notes = summary.notes_built,
                chunks = summary.chunks_built,
                skipped = summary.skipped_unresolved + summary.skipped_empty,
                rows = summary.rows_loaded,
                elapsed = ?start.elapsed(),
                "Note load finished"
            );
        }
        result
    }

    async fn execute(&self, ctx: &LoadContext, log: &mut RunLog) -> PipelineResult<LoadSummary> {
        // Phase 1: Resolve
        let resolved = self.phase1_resolve(ctx, log).await?;
        let mode = resolved.mode;

        // Phase 2: Read
        let input = &ctx.args.input_file;
        let contents = tokio::fs::read(input)
            .await
            .map_err(|e| PipelineError::io(input, e))?;
        let lines = ctx.config.layout.parse_all(&contents)?;
        debug!(lines = lines.len(), "Phase 2: Read input");

        // Phase 3: Check
        if ctx.config.identifiers.strict {
            self.phase3_check(log, &resolved.identifiers, &lines)?;
        }

        // Phase 4: Purge
        if mode.persists() {
            if let Some(scope) =
                mode.upfront_deletion(resolved.object_type_key, resolved.note_type.type_key)
            {
                log.statement(&scope.to_sql(&ctx.config.tables.note))?;
                let deleted = self.loader.purge(&scope).await?;
                debug!(deleted, "Phase 4: Purged existing notes");
            }
        }

        // Phase 5: Build
        let (mut summary, artifacts) = self.phase5_build(ctx, log, resolved, &lines)?;
        log.note(format_args!(
            "Wrote {} note rows, {} chunk rows, {} deletion statements",
            artifacts.note.rows, artifacts.note_chunk.rows, artifacts.statements
        ))?;

        if !mode.persists() {
            info!("Preview mode, nothing loaded");
            return Ok(summary);
        }

        // Phase 6: Load
        if mode.executes_deletion_script() {
            log.note(format_args!(
                "Executing {} via {}",
                artifacts.script.display(),
                self.loader.name()
            ))?;
            self.loader.execute_script(&artifacts.script).await?;
        }

        for artifact in artifacts.load_order() {
            log.note(format_args!(
                "Loading {} into {} via {}",
                artifact.path.display(),
                artifact.table,
                self.loader.name()
            ))?;
            let loaded = self.loader.load(artifact).await?;
            log.note(format_args!("{}: {loaded}", artifact.table))?;
            summary.rows_loaded += loaded.0;
        }

        Ok(summary)
    }

    async fn phase1_resolve(&self, ctx: &LoadContext, log: &mut RunLog) -> PipelineResult<Resolved> {
        let catalog = self.catalog.as_ref();
        let mode = ctx.mode()?;

        let object_type_key = resolve_object_type(catalog, &ctx.args.object_type).await?;
        let note_type = resolve_note_type(catalog, &ctx.args.note_type, object_type_key).await?;
        let user_key = resolve_user(catalog, &ctx.args.user).await?;

        match note_type.is_private {
            Some(private) => log.note(format_args!(
                "Note type key: {} (private: {private})",
                note_type.type_key
            ))?,
            None => log.note(format_args!("Note type key: {}", note_type.type_key))?,
        }

        let identifiers =
            IdentifierMap::load(catalog, &ctx.identifier_scope(object_type_key)).await?;
        let first_key = next_note_key(catalog).await?;

        debug!(
            object_type_key,
            note_type_key = note_type.type_key,
            user_key,
            identifiers = identifiers.len(),
            first_key,
            "Phase 1: Resolved run keys"
        );

        Ok(Resolved {
            mode,
            object_type_key,
            note_type,
            user_key,
            identifiers,
            first_key,
        })
    }

    fn phase3_check(
        &self,
        log: &mut RunLog,
        identifiers: &IdentifierMap,
        lines: &[InputLine<'_>],
    ) -> PipelineResult<()> {
        let mut unresolved = 0;
        for line in lines {
            if identifiers.resolve(line.external_id).is_none() {
                unresolved += 1;
                let reason = SkipReason::UnresolvedIdentifier(line.external_id.to_string());
                log.skip(line.line_number, &reason)?;
            }
        }

        if unresolved > 0 {
            return Err(PipelineError::UnresolvedIdentifiers(unresolved));
        }
        debug!("Phase 3: Every identifier resolved");
        Ok(())
    }

    fn phase5_build(
        &self,
        ctx: &LoadContext,
        log: &mut RunLog,
        resolved: Resolved,
        lines: &[InputLine<'_>],
    ) -> PipelineResult<(LoadSummary, EmittedArtifacts)> {
        let config = &ctx.config;
        let settings = BuilderSettings::new(
            resolved.object_type_key,
            resolved.note_type.type_key,
            AuditStamp::new(resolved.user_key, ctx.load_date()),
            resolved.mode,
        )
        .with_escape(config.escape.clone())
        .with_max_chunk_length(config.max_chunk_length);
        let mut builder = RecordBuilder::new(settings, resolved.first_key);
        let mut emitter = BulkEmitter::create(&ctx.paths, config)?;
        let mut summary = LoadSummary {
            lines_read: lines.len(),
            ..LoadSummary::default()
        };

        for line in lines {
            match builder.build_line(line, &resolved.identifiers) {
                BuildOutcome::Built(built) => {
                    summary.notes_built += 1;
                    summary.chunks_built += built.chunks.len();
                    emitter.emit(&built)?;
                }
                BuildOutcome::Skipped(reason) => {
                    match &reason {
                        SkipReason::UnresolvedIdentifier(_) => summary.skipped_unresolved += 1,
                        SkipReason::EmptyText(_) => summary.skipped_empty += 1,
                    }
                    debug!(line = line.line_number, %reason, "Skipped input line");
                    log.skip(line.line_number, &reason)?;
                }
            }
        }

        debug!(
            lines = summary.lines_read,
            notes = summary.notes_built,
            next_key = builder.next_key(),
            "Phase 5: Built records"
        );
        Ok((summary, emitter.finish()?))
    }
}
