//! Core of the note loader
//!
//! Everything here is pure or trait-bound: the record builder, escaping,
//! chunking, the mode policy and the resolvers. Databases and external
//! tools sit behind [`Catalog`] and [`BulkLoader`].

pub mod chunk;
pub mod error;
pub mod escape;
pub mod format;
pub mod input;
pub mod mode;
pub mod record;
pub mod resolver;
pub mod traits;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_support;

pub use chunk::{chunks, Chunks, DEFAULT_CHUNK_LENGTH};
pub use error::{LoadError, LoadResult, NoteLoadError, NoteLoadResult};
pub use escape::{decode_line_breaks, EscapePolicy, EscapeRule, LINE_BREAK_MARKER};
pub use format::ArtifactFormat;
pub use input::{InputLayout, InputLine, INPUT_FIELD_DELIMITER};
pub use mode::{DeletionScope, ProcessingMode};
pub use record::{
    reassemble, AuditStamp, BuildOutcome, BuilderSettings, BuiltNote, NoteChunkRecord, NoteRecord,
    RecordBuilder, SkipReason,
};
pub use resolver::{
    next_note_key, normalize_note_type_name, resolve_note_type, resolve_object_type, resolve_user,
    IdentifierMap, IdentifierScope, NoteType, ObjectRef, MGI_LOGICAL_DB_KEY, MGI_PREFIX,
};
pub use traits::{Artifact, ArtifactKind, BulkLoader, Catalog, RowsLoaded};
