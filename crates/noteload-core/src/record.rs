//! Note record building
//!
//! [`RecordBuilder`] turns one resolved (object, text) pair into a
//! [`NoteRecord`] plus its ordered [`NoteChunkRecord`]s:
//!
//! 1. skip when the object did not resolve or the text is empty
//! 2. decode `\n` markers into line breaks
//! 3. take the next surrogate key
//! 4. escape the text with the configured [`EscapePolicy`]
//! 5. split into chunks of at most `max_chunk_length` characters,
//!    numbered from 1
//!
//! The builder owns the key counter, so keys are strictly increasing and
//! never handed out twice. Skipped lines consume no key.

use crate::chunk::{chunks, DEFAULT_CHUNK_LENGTH};
use crate::escape::{decode_line_breaks, EscapePolicy};
use crate::input::InputLine;
use crate::mode::{DeletionScope, ProcessingMode};
use crate::resolver::IdentifierMap;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroUsize;
use tracing::trace;

/// Who and when, stamped on every record of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStamp {
    /// Creating user key
    pub created_by_key: i64,
    /// Modifying user key
    pub modified_by_key: i64,
    /// Creation timestamp
    pub created_date: NaiveDateTime,
    /// Modification timestamp
    pub modified_date: NaiveDateTime,
}

impl AuditStamp {
    /// Same user and time for creation and modification
    pub fn new(user_key: i64, load_date: NaiveDateTime) -> Self {
        Self {
            created_by_key: user_key,
            modified_by_key: user_key,
            created_date: load_date,
            modified_date: load_date,
        }
    }
}

/// Primary note row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteRecord {
    /// Surrogate key
    pub note_key: i64,
    /// Annotated object
    pub object_key: i64,
    /// Object-type key
    pub object_type_key: i64,
    /// Note-type key
    pub note_type_key: i64,
    /// Audit columns
    #[serde(flatten)]
    pub stamp: AuditStamp,
}

/// One ordered slice of a note's escaped text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteChunkRecord {
    /// Owning note
    pub note_key: i64,
    /// 1-based position within the note
    pub sequence_number: u32,
    /// Escaped text, at most the configured chunk length
    pub text: String,
    /// Audit columns
    #[serde(flatten)]
    pub stamp: AuditStamp,
}

/// A note and everything emitted alongside it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltNote {
    /// Primary row
    pub note: NoteRecord,
    /// Chunk rows in sequence order
    pub chunks: Vec<NoteChunkRecord>,
    /// Per-object deletion to run before loading, when the mode asks for one
    pub deletion: Option<DeletionScope>,
}

/// Why a line produced no records
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// External identifier is not a preferred identifier of the object type
    UnresolvedIdentifier(String),
    /// Text field is empty
    EmptyText(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnresolvedIdentifier(id) => write!(f, "Invalid Accession ID: {id}"),
            Self::EmptyText(id) => write!(f, "Empty note text: {id}"),
        }
    }
}

/// Result of building one line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    /// Records were built
    Built(BuiltNote),
    /// Line skipped; the run continues
    Skipped(SkipReason),
}

/// Fixed parameters of a run's records
#[derive(Debug, Clone)]
pub struct BuilderSettings {
    /// Object-type key
    pub object_type_key: i64,
    /// Note-type key
    pub note_type_key: i64,
    /// Audit columns
    pub stamp: AuditStamp,
    /// Escaping applied to chunk text
    pub escape: EscapePolicy,
    /// Maximum characters per chunk
    pub max_chunk_length: NonZeroUsize,
    /// Mode, consulted for per-object deletions
    pub mode: ProcessingMode,
}

impl BuilderSettings {
    /// Settings with the default escape table and chunk length
    pub fn new(
        object_type_key: i64,
        note_type_key: i64,
        stamp: AuditStamp,
        mode: ProcessingMode,
    ) -> Self {
        Self {
            object_type_key,
            note_type_key,
            stamp,
            escape: EscapePolicy::default(),
            max_chunk_length: DEFAULT_CHUNK_LENGTH,
            mode,
        }
    }

    /// Replace the escape table
    #[must_use]
    pub fn with_escape(mut self, escape: EscapePolicy) -> Self {
        self.escape = escape;
        self
    }

    /// Replace the chunk length
    #[must_use]
    pub fn with_max_chunk_length(mut self, max: NonZeroUsize) -> Self {
        self.max_chunk_length = max;
        self
    }
}

/// Builds note records and owns the surrogate-key counter
#[derive(Debug)]
pub struct RecordBuilder {
    settings: BuilderSettings,
    next_key: i64,
}

impl RecordBuilder {
    /// Create a builder whose first note gets `first_key`
    pub fn new(settings: BuilderSettings, first_key: i64) -> Self {
        Self {
            settings,
            next_key: first_key,
        }
    }

    /// Key the next built note will receive
    pub fn next_key(&self) -> i64 {
        self.next_key
    }

    /// Settings in use
    pub fn settings(&self) -> &BuilderSettings {
        &self.settings
    }

    /// Resolve a parsed line and build it
    pub fn build_line(&mut self, line: &InputLine<'_>, identifiers: &IdentifierMap) -> BuildOutcome {
        match identifiers.resolve(line.external_id) {
            Some(object_key) => self.build(Some(object_key), line.external_id, line.text),
            None => BuildOutcome::Skipped(SkipReason::UnresolvedIdentifier(
                line.external_id.to_string(),
            )),
        }
    }

    /// Build records for an already-resolved object (`None` = unresolved)
    pub fn build(&mut self, object_key: Option<i64>, external_id: &str, raw_text: &str) -> BuildOutcome {
        let Some(object_key) = object_key else {
            return BuildOutcome::Skipped(SkipReason::UnresolvedIdentifier(external_id.to_string()));
        };

        if raw_text.is_empty() {
            return BuildOutcome::Skipped(SkipReason::EmptyText(external_id.to_string()));
        }

        let text = decode_line_breaks(raw_text);
        let note_key = self.take_key();
        let settings = &self.settings;

        let note = NoteRecord {
            note_key,
            object_key,
            object_type_key: settings.object_type_key,
            note_type_key: settings.note_type_key,
            stamp: settings.stamp,
        };

        let escaped = settings.escape.escape(&text);
        let chunks: Vec<NoteChunkRecord> = chunks(&escaped, settings.max_chunk_length)
            .zip(1u32..)
            .map(|(part, sequence_number)| NoteChunkRecord {
                note_key,
                sequence_number,
                text: part.to_string(),
                stamp: settings.stamp,
            })
            .collect();

        let deletion = settings
            .mode
            .emits_object_deletions()
            .then_some(DeletionScope::Object {
                object_type_key: settings.object_type_key,
                note_type_key: settings.note_type_key,
                object_key,
            });

        trace!(note_key, object_key, chunks = chunks.len(), "Built note");

        BuildOutcome::Built(BuiltNote {
            note,
            chunks,
            deletion,
        })
    }

    fn take_key(&mut self) -> i64 {
        let key = self.next_key;
        self.next_key += 1;
        key
    }
}

/// Reassemble a note's text from its chunks, reversing the escaping
pub fn reassemble(chunks: &[NoteChunkRecord], escape: &EscapePolicy) -> String {
    let mut ordered: Vec<&NoteChunkRecord> = chunks.iter().collect();
    ordered.sort_by_key(|c| c.sequence_number);
    let joined: String = ordered.iter().map(|c| c.text.as_str()).collect();
    escape.unescape(&joined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::InputLayout;
    use crate::resolver::ObjectRef;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn load_date() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 16)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn builder(mode: ProcessingMode, first_key: i64) -> RecordBuilder {
        let settings = BuilderSettings::new(11, 7, AuditStamp::new(1001, load_date()), mode);
        RecordBuilder::new(settings, first_key)
    }

    fn identifiers() -> IdentifierMap {
        IdentifierMap::from_refs(11, vec![ObjectRef::new("MGI:12345", 42)])
    }

    fn built(outcome: BuildOutcome) -> BuiltNote {
        match outcome {
            BuildOutcome::Built(note) => note,
            BuildOutcome::Skipped(reason) => panic!("unexpected skip: {reason}"),
        }
    }

    #[test]
    fn builds_single_chunk_note() {
        let mut builder = builder(ProcessingMode::Load, 100);
        let line = InputLayout::AccessionText
            .parse(1, "MGI:12345\tSome allele note text\n")
            .unwrap();

        let note = built(builder.build_line(&line, &identifiers()));

        assert_eq!(note.note.note_key, 100);
        assert_eq!(note.note.object_key, 42);
        assert_eq!(note.note.note_type_key, 7);
        assert_eq!(note.note.object_type_key, 11);
        assert_eq!(note.chunks.len(), 1);
        assert_eq!(note.chunks[0].note_key, 100);
        assert_eq!(note.chunks[0].sequence_number, 1);
        assert_eq!(note.chunks[0].text, "Some allele note text");
        assert_eq!(note.deletion, None);
        assert_eq!(builder.next_key(), 101);
    }

    #[test]
    fn unresolved_identifier_consumes_no_key() {
        let mut builder = builder(ProcessingMode::Load, 100);
        let line = InputLayout::AccessionText
            .parse(1, "MGI:99999\ttext\n")
            .unwrap();

        let outcome = builder.build_line(&line, &identifiers());

        assert_eq!(
            outcome,
            BuildOutcome::Skipped(SkipReason::UnresolvedIdentifier("MGI:99999".into()))
        );
        assert_eq!(builder.next_key(), 100);
    }

    #[test]
    fn empty_text_is_skipped() {
        let mut builder = builder(ProcessingMode::Incremental, 5);
        let outcome = builder.build(Some(42), "MGI:12345", "");
        assert_eq!(
            outcome,
            BuildOutcome::Skipped(SkipReason::EmptyText("MGI:12345".into()))
        );
        assert_eq!(builder.next_key(), 5);
    }

    #[test]
    fn long_text_is_split_into_numbered_chunks() {
        let mut builder = builder(ProcessingMode::Load, 1);
        let text = "a".repeat(600);
        let note = built(builder.build(Some(42), "MGI:12345", &text));

        let seqs: Vec<u32> = note.chunks.iter().map(|c| c.sequence_number).collect();
        let lens: Vec<usize> = note.chunks.iter().map(|c| c.text.chars().count()).collect();
        assert_eq!(seqs, vec![1, 2, 3]);
        assert_eq!(lens, vec![255, 255, 90]);
    }

    #[test]
    fn line_break_markers_are_decoded_then_reescaped() {
        let mut builder = builder(ProcessingMode::Load, 1);
        let note = built(builder.build(Some(42), "MGI:12345", "first\\nsecond #1?"));
        assert_eq!(note.chunks[0].text, "first\\nsecond \\#1\\?");
        assert_eq!(
            reassemble(&note.chunks, &builder.settings().escape),
            "first\nsecond #1?"
        );
    }

    #[test]
    fn incremental_emits_object_deletion() {
        let mut builder = builder(ProcessingMode::Incremental, 1);
        let note = built(builder.build(Some(42), "MGI:12345", "text"));
        assert_eq!(
            note.deletion,
            Some(DeletionScope::Object {
                object_type_key: 11,
                note_type_key: 7,
                object_key: 42
            })
        );
    }

    #[test]
    fn keys_increase_without_gaps() {
        let mut builder = builder(ProcessingMode::Load, 10);
        let mut keys = Vec::new();
        for (id, text) in [("MGI:1", "a"), ("MGI:2", ""), ("MGI:3", "c"), ("MGI:4", "d")] {
            let object = (id != "MGI:4").then_some(1);
            if let BuildOutcome::Built(note) = builder.build(object, id, text) {
                keys.push(note.note.note_key);
            }
        }
        assert_eq!(keys, vec![10, 11]);
    }

    #[test]
    fn custom_chunk_length_applies() {
        let settings = BuilderSettings::new(11, 7, AuditStamp::new(1, load_date()), ProcessingMode::Load)
            .with_escape(EscapePolicy::none())
            .with_max_chunk_length(NonZeroUsize::new(4).unwrap());
        let mut builder = RecordBuilder::new(settings, 1);
        let note = built(builder.build(Some(1), "MGI:1", "abcdefghij"));
        let texts: Vec<&str> = note.chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["abcd", "efgh", "ij"]);
    }

    proptest! {
        #[test]
        fn chunks_reassemble_to_decoded_text(text in "[a-z #?\\\\\n]{1,900}") {
            // Inputs never contain raw newlines; the marker stands in for them
            let raw = text.replace('\n', "\\n");
            let mut builder = builder(ProcessingMode::Load, 1);
            let note = built(builder.build(Some(42), "MGI:1", &raw));

            let expected = decode_line_breaks(&raw).into_owned();
            prop_assert_eq!(reassemble(&note.chunks, &builder.settings().escape), expected);
            for (i, chunk) in note.chunks.iter().enumerate() {
                prop_assert_eq!(chunk.sequence_number as usize, i + 1);
                prop_assert!(chunk.text.chars().count() <= 255);
            }
        }
    }
}
