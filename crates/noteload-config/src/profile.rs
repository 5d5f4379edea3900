//! Built-in profiles
//!
//! A profile is a bundle of defaults for one family of note tables:
//!
//! | profile  | layout                   | field | tables                        |
//! |----------|--------------------------|-------|-------------------------------|
//! | `mgi`    | accession, text          | tab   | `MGI_Note`, `MGI_NoteChunk`   |
//! | `allele` | accession, symbol, text  | `\|`  | `ALL_Note`, `ALL_NoteChunk`   |
//!
//! Anything a profile sets can be overridden in the config file.

use noteload_core::{ArtifactFormat, EscapePolicy, InputLayout};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Table-family defaults
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    /// General MGI note tables
    #[default]
    Mgi,
    /// Allele note tables
    Allele,
}

impl Profile {
    /// Profile name as written in config files
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mgi => "mgi",
            Self::Allele => "allele",
        }
    }

    /// Input column layout
    pub fn layout(self) -> InputLayout {
        match self {
            Self::Mgi => InputLayout::AccessionText,
            Self::Allele => InputLayout::AccessionSymbolText,
        }
    }

    /// Artifact delimiters
    pub fn format(self) -> ArtifactFormat {
        match self {
            Self::Mgi => ArtifactFormat::tab_newline(),
            Self::Allele => ArtifactFormat::pipe_newline(),
        }
    }

    /// Note table name
    pub fn note_table(self) -> &'static str {
        match self {
            Self::Mgi => "MGI_Note",
            Self::Allele => "ALL_Note",
        }
    }

    /// Note chunk table name
    pub fn note_chunk_table(self) -> &'static str {
        match self {
            Self::Mgi => "MGI_NoteChunk",
            Self::Allele => "ALL_NoteChunk",
        }
    }

    /// Escape table for chunk text
    pub fn escape(self) -> EscapePolicy {
        match self {
            Self::Mgi => EscapePolicy::mgi(),
            Self::Allele => EscapePolicy::allele(),
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Profile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mgi" => Ok(Self::Mgi),
            "allele" => Ok(Self::Allele),
            other => Err(format!("unknown profile '{other}' (expected mgi or allele)")),
        }
    }
}
