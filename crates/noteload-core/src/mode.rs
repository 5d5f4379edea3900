//! Processing mode policy and deletion scopes

use crate::error::NoteLoadError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How a run treats existing notes and whether it persists anything
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingMode {
    /// Delete every note of the (object type, note type) pair, then load
    Load,
    /// Delete and reload notes only for the objects named in the input
    Incremental,
    /// Build and validate everything, change nothing
    Preview,
}

impl ProcessingMode {
    /// All modes, in CLI help order
    pub const ALL: [ProcessingMode; 3] = [Self::Load, Self::Incremental, Self::Preview];

    /// Name used on the command line
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Load => "load",
            Self::Incremental => "incremental",
            Self::Preview => "preview",
        }
    }

    /// Whether deletions and bulk loads are actually executed
    pub fn persists(self) -> bool {
        matches!(self, Self::Load | Self::Incremental)
    }

    /// Whether every built note also yields a per-object deletion statement
    ///
    /// Preview writes them too so the script can be inspected.
    pub fn emits_object_deletions(self) -> bool {
        matches!(self, Self::Incremental | Self::Preview)
    }

    /// Scope to purge before any record is built, if any
    pub fn upfront_deletion(self, object_type_key: i64, note_type_key: i64) -> Option<DeletionScope> {
        match self {
            Self::Load => Some(DeletionScope::NoteType {
                object_type_key,
                note_type_key,
            }),
            Self::Incremental | Self::Preview => None,
        }
    }

    /// Whether the deletion script must run before the bulk load
    pub fn executes_deletion_script(self) -> bool {
        matches!(self, Self::Incremental)
    }
}

impl fmt::Display for ProcessingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProcessingMode {
    type Err = NoteLoadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "load" => Ok(Self::Load),
            "incremental" => Ok(Self::Incremental),
            "preview" => Ok(Self::Preview),
            other => Err(NoteLoadError::InvalidMode(other.to_string())),
        }
    }
}

/// Set of stored notes a deletion targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeletionScope {
    /// Every note of the type, regardless of object
    NoteType {
        /// Object-type key
        object_type_key: i64,
        /// Note-type key
        note_type_key: i64,
    },
    /// Notes of the type attached to one object
    Object {
        /// Object-type key
        object_type_key: i64,
        /// Note-type key
        note_type_key: i64,
        /// Internal object key
        object_key: i64,
    },
}

impl DeletionScope {
    /// Object-type key of the scope
    pub fn object_type_key(&self) -> i64 {
        match *self {
            Self::NoteType { object_type_key, .. } | Self::Object { object_type_key, .. } => {
                object_type_key
            }
        }
    }

    /// Note-type key of the scope
    pub fn note_type_key(&self) -> i64 {
        match *self {
            Self::NoteType { note_type_key, .. } | Self::Object { note_type_key, .. } => {
                note_type_key
            }
        }
    }

    /// Object key, when scoped to a single object
    pub fn object_key(&self) -> Option<i64> {
        match *self {
            Self::NoteType { .. } => None,
            Self::Object { object_key, .. } => Some(object_key),
        }
    }

    /// Render as a `delete` statement against `note_table`
    pub fn to_sql(&self, note_table: &str) -> String {
        match *self {
            Self::NoteType {
                object_type_key,
                note_type_key,
            } => format!(
                "delete from {note_table} where _MGIType_key = {object_type_key} and _NoteType_key = {note_type_key};"
            ),
            Self::Object {
                object_type_key,
                note_type_key,
                object_key,
            } => format!(
                "delete from {note_table} where _MGIType_key = {object_type_key} and _NoteType_key = {note_type_key} and _Object_key = {object_key};"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_modes() {
        for mode in ProcessingMode::ALL {
            assert_eq!(mode.as_str().parse::<ProcessingMode>().unwrap(), mode);
        }
    }

    #[test]
    fn unknown_mode_is_fatal() {
        let err = "reload".parse::<ProcessingMode>().unwrap_err();
        assert!(matches!(err, NoteLoadError::InvalidMode(m) if m == "reload"));
        // Mode names are case sensitive
        assert!("LOAD".parse::<ProcessingMode>().is_err());
    }

    #[test]
    fn load_purges_whole_note_type() {
        let scope = ProcessingMode::Load.upfront_deletion(2, 1028).unwrap();
        assert_eq!(
            scope,
            DeletionScope::NoteType {
                object_type_key: 2,
                note_type_key: 1028
            }
        );
        assert_eq!(scope.object_key(), None);
        assert!(!ProcessingMode::Load.emits_object_deletions());
    }

    #[test]
    fn incremental_has_no_upfront_purge() {
        assert!(ProcessingMode::Incremental.upfront_deletion(2, 1028).is_none());
        assert!(ProcessingMode::Incremental.emits_object_deletions());
        assert!(ProcessingMode::Incremental.executes_deletion_script());
    }

    #[test]
    fn preview_never_persists() {
        let mode = ProcessingMode::Preview;
        assert!(!mode.persists());
        assert!(!mode.executes_deletion_script());
        assert!(mode.upfront_deletion(2, 1028).is_none());
    }

    #[test]
    fn object_scope_renders_object_filter() {
        let scope = DeletionScope::Object {
            object_type_key: 11,
            note_type_key: 1020,
            object_key: 42,
        };
        assert_eq!(
            scope.to_sql("MGI_Note"),
            "delete from MGI_Note where _MGIType_key = 11 and _NoteType_key = 1020 and _Object_key = 42;"
        );
    }
}
