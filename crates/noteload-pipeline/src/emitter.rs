//! Bulk emitter
//!
//! Serializes built notes into the note and chunk artifacts and collects
//! per-object deletion statements into the script artifact. Rows are
//! written in input order, chunks in sequence order.

use crate::context::ArtifactPaths;
use crate::error::{PipelineError, PipelineResult};
use chrono::NaiveDateTime;
use noteload_config::{LoaderConfig, TableNames};
use noteload_core::{Artifact, ArtifactFormat, ArtifactKind, AuditStamp, BuiltNote, DeletionScope};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

struct Sink {
    path: PathBuf,
    out: BufWriter<File>,
    rows: u64,
}

impl Sink {
    fn create(path: &Path) -> PipelineResult<Self> {
        let file = File::create(path).map_err(|e| PipelineError::io(path, e))?;
        Ok(Self {
            path: path.to_path_buf(),
            out: BufWriter::new(file),
            rows: 0,
        })
    }

    fn write(&mut self, text: &str) -> PipelineResult<()> {
        self.out
            .write_all(text.as_bytes())
            .map_err(|e| PipelineError::io(&self.path, e))?;
        self.rows += 1;
        Ok(())
    }

    fn finish(mut self) -> PipelineResult<(PathBuf, u64)> {
        self.out
            .flush()
            .map_err(|e| PipelineError::io(&self.path, e))?;
        Ok((self.path, self.rows))
    }
}

/// Artifacts of a finished emission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmittedArtifacts {
    /// Note rows
    pub note: Artifact,
    /// Chunk rows
    pub note_chunk: Artifact,
    /// Deletion script
    pub script: PathBuf,
    /// Statements in the script
    pub statements: u64,
}

impl EmittedArtifacts {
    /// Artifacts in load order: notes before their chunks
    pub fn load_order(&self) -> [&Artifact; 2] {
        [&self.note, &self.note_chunk]
    }
}

/// Writes the three artifacts of a run
pub struct BulkEmitter {
    format: ArtifactFormat,
    date_format: String,
    tables: TableNames,
    notes: Sink,
    chunks: Sink,
    script: Sink,
}

impl BulkEmitter {
    /// Create (truncate) the artifacts named by `paths`
    pub fn create(paths: &ArtifactPaths, config: &LoaderConfig) -> PipelineResult<Self> {
        debug!(
            note = %paths.note.display(),
            chunk = %paths.note_chunk.display(),
            script = %paths.script.display(),
            "Creating artifacts"
        );
        Ok(Self {
            format: config.format.clone(),
            date_format: config.load_date_format.clone(),
            tables: config.tables.clone(),
            notes: Sink::create(&paths.note)?,
            chunks: Sink::create(&paths.note_chunk)?,
            script: Sink::create(&paths.script)?,
        })
    }

    /// Write one note, its chunks and its deletion statement
    pub fn emit(&mut self, built: &BuiltNote) -> PipelineResult<()> {
        let note = &built.note;
        let [created_by, modified_by, created, modified] = self.stamp_fields(&note.stamp);
        let row = self.format.row([
            note.note_key.to_string(),
            note.object_key.to_string(),
            note.object_type_key.to_string(),
            note.note_type_key.to_string(),
            created_by,
            modified_by,
            created,
            modified,
        ]);
        self.notes.write(&row)?;

        for chunk in &built.chunks {
            let [created_by, modified_by, created, modified] = self.stamp_fields(&chunk.stamp);
            let row = self.format.row([
                chunk.note_key.to_string(),
                chunk.sequence_number.to_string(),
                chunk.text.clone(),
                created_by,
                modified_by,
                created,
                modified,
            ]);
            self.chunks.write(&row)?;
        }

        if let Some(scope) = &built.deletion {
            self.emit_deletion(scope)?;
        }
        Ok(())
    }

    /// Append a deletion statement to the script
    pub fn emit_deletion(&mut self, scope: &DeletionScope) -> PipelineResult<()> {
        let statement = format!("{}\n", scope.to_sql(&self.tables.note));
        self.script.write(&statement)
    }

    /// Flush everything and describe what was written
    pub fn finish(self) -> PipelineResult<EmittedArtifacts> {
        let (note_path, note_rows) = self.notes.finish()?;
        let (chunk_path, chunk_rows) = self.chunks.finish()?;
        let (script, statements) = self.script.finish()?;

        Ok(EmittedArtifacts {
            note: Artifact {
                kind: ArtifactKind::Note,
                table: self.tables.note,
                path: note_path,
                rows: note_rows,
            },
            note_chunk: Artifact {
                kind: ArtifactKind::NoteChunk,
                table: self.tables.note_chunk,
                path: chunk_path,
                rows: chunk_rows,
            },
            script,
            statements,
        })
    }

    fn stamp_fields(&self, stamp: &AuditStamp) -> [String; 4] {
        [
            stamp.created_by_key.to_string(),
            stamp.modified_by_key.to_string(),
            self.date(stamp.created_date),
            self.date(stamp.modified_date),
        ]
    }

    fn date(&self, date: NaiveDateTime) -> String {
        date.format(&self.date_format).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use noteload_config::Profile;
    use noteload_core::{BuildOutcome, BuilderSettings, ProcessingMode, RecordBuilder};
    use tempfile::TempDir;

    fn stamp() -> AuditStamp {
        let date = NaiveDate::from_ymd_opt(2026, 10, 16)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        AuditStamp::new(1001, date)
    }

    fn built(builder: &mut RecordBuilder, object_key: i64, text: &str) -> BuiltNote {
        match builder.build(Some(object_key), "MGI:1", text) {
            BuildOutcome::Built(note) => note,
            BuildOutcome::Skipped(reason) => panic!("unexpected skip: {reason}"),
        }
    }

    fn emitter(dir: &TempDir, config: &LoaderConfig) -> (ArtifactPaths, BulkEmitter) {
        let paths = ArtifactPaths::new(dir.path(), "notes.txt", &config.tables);
        let emitter = BulkEmitter::create(&paths, config).unwrap();
        (paths, emitter)
    }

    #[test]
    fn writes_note_and_chunk_rows() {
        let dir = TempDir::new().unwrap();
        let config = LoaderConfig::for_profile(Profile::Mgi);
        let (paths, mut emitter) = emitter(&dir, &config);

        let settings = BuilderSettings::new(11, 7, stamp(), ProcessingMode::Load);
        let mut builder = RecordBuilder::new(settings, 100);
        emitter
            .emit(&built(&mut builder, 42, "Some allele note text"))
            .unwrap();
        let artifacts = emitter.finish().unwrap();

        assert_eq!(
            std::fs::read_to_string(&paths.note).unwrap(),
            "100\t42\t11\t7\t1001\t1001\t10/16/2026\t10/16/2026\n"
        );
        assert_eq!(
            std::fs::read_to_string(&paths.note_chunk).unwrap(),
            "100\t1\tSome allele note text\t1001\t1001\t10/16/2026\t10/16/2026\n"
        );
        assert_eq!(artifacts.note.rows, 1);
        assert_eq!(artifacts.note_chunk.rows, 1);
        assert_eq!(artifacts.note.table, "MGI_Note");
        assert_eq!(artifacts.statements, 0);
        assert_eq!(std::fs::read_to_string(&paths.script).unwrap(), "");
    }

    #[test]
    fn incremental_notes_add_script_statements() {
        let dir = TempDir::new().unwrap();
        let config = LoaderConfig::for_profile(Profile::Mgi);
        let (paths, mut emitter) = emitter(&dir, &config);

        let settings = BuilderSettings::new(11, 7, stamp(), ProcessingMode::Incremental);
        let mut builder = RecordBuilder::new(settings, 1);
        emitter.emit(&built(&mut builder, 42, "first")).unwrap();
        emitter.emit(&built(&mut builder, 43, "second")).unwrap();
        let artifacts = emitter.finish().unwrap();

        let script = std::fs::read_to_string(&paths.script).unwrap();
        assert_eq!(script.lines().count(), 2);
        assert!(script.lines().all(|l| l.starts_with("delete from MGI_Note")));
        assert_eq!(artifacts.statements, 2);
    }

    #[test]
    fn long_text_spans_ordered_chunk_rows() {
        let dir = TempDir::new().unwrap();
        let config = LoaderConfig::for_profile(Profile::Mgi);
        let (paths, mut emitter) = emitter(&dir, &config);

        let settings = BuilderSettings::new(11, 7, stamp(), ProcessingMode::Load);
        let mut builder = RecordBuilder::new(settings, 5);
        emitter.emit(&built(&mut builder, 42, &"a".repeat(600))).unwrap();
        let artifacts = emitter.finish().unwrap();

        let contents = std::fs::read_to_string(&paths.note_chunk).unwrap();
        let sequences: Vec<&str> = contents
            .lines()
            .map(|line| line.split('\t').nth(1).unwrap())
            .collect();
        assert_eq!(sequences, vec!["1", "2", "3"]);
        assert_eq!(artifacts.note_chunk.rows, 3);
    }

    #[test]
    fn configured_delimiters_and_date_format() {
        let dir = TempDir::new().unwrap();
        let mut config = LoaderConfig::for_profile(Profile::Allele);
        config.format = ArtifactFormat::new("&=&", "#=#\n").unwrap();
        config.load_date_format = "%Y-%m-%d".to_string();
        let (paths, mut emitter) = emitter(&dir, &config);

        let settings = BuilderSettings::new(11, 7, stamp(), ProcessingMode::Load);
        let mut builder = RecordBuilder::new(settings, 1);
        emitter.emit(&built(&mut builder, 42, "x")).unwrap();
        emitter.finish().unwrap();

        assert_eq!(
            std::fs::read_to_string(&paths.note).unwrap(),
            "1&=&42&=&11&=&7&=&1001&=&1001&=&2026-10-16&=&2026-10-16#=#\n"
        );
    }
}
