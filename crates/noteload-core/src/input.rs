//! Input line layouts
//!
//! Input files are tab-delimited with no header row. The field count is
//! fixed per layout: a line with fewer fields aborts the run, extra
//! trailing fields are ignored. Blank lines count as malformed; only the
//! empty segment after the final terminator is dropped.

use crate::error::{NoteLoadError, NoteLoadResult};
use serde::{Deserialize, Serialize};

/// Field separator of input files
pub const INPUT_FIELD_DELIMITER: char = '\t';

/// Column layout of an input file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InputLayout {
    /// `accession \t text`
    #[default]
    AccessionText,
    /// `accession \t symbol \t text`
    AccessionSymbolText,
}

impl InputLayout {
    /// Number of fields every line must carry
    pub fn field_count(self) -> usize {
        match self {
            Self::AccessionText => 2,
            Self::AccessionSymbolText => 3,
        }
    }

    /// Parse a whole file, numbering lines from 1
    ///
    /// Stops at the first line that is not UTF-8 or has too few fields.
    pub fn parse_all(self, contents: &[u8]) -> NoteLoadResult<Vec<InputLine<'_>>> {
        let body = contents.strip_suffix(b"\n").unwrap_or(contents);
        if body.is_empty() {
            return Ok(Vec::new());
        }

        body.split(|b| *b == b'\n')
            .enumerate()
            .map(|(index, raw)| {
                let line_number = index + 1;
                let line = std::str::from_utf8(raw).map_err(|source| {
                    NoteLoadError::InvalidEncoding {
                        line_number,
                        source,
                    }
                })?;
                self.parse(line_number, line)
            })
            .collect()
    }

    /// Parse one line (terminator optional)
    pub fn parse<'a>(self, line_number: usize, line: &'a str) -> NoteLoadResult<InputLine<'a>> {
        let line = strip_terminator(line);
        let fields: Vec<&str> = line.split(INPUT_FIELD_DELIMITER).collect();

        if fields.len() < self.field_count() {
            return Err(NoteLoadError::MalformedLine {
                line_number,
                expected: self.field_count(),
                found: fields.len(),
                line: line.to_string(),
            });
        }

        Ok(match self {
            Self::AccessionText => InputLine {
                line_number,
                external_id: fields[0],
                symbol: None,
                text: fields[1],
            },
            Self::AccessionSymbolText => InputLine {
                line_number,
                external_id: fields[0],
                symbol: Some(fields[1]),
                text: fields[2],
            },
        })
    }
}

/// One parsed input line, borrowing from the raw line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputLine<'a> {
    /// 1-based line number
    pub line_number: usize,
    /// External accession identifier
    pub external_id: &'a str,
    /// Object symbol, for layouts that carry one
    pub symbol: Option<&'a str>,
    /// Raw note text (line-break markers still encoded)
    pub text: &'a str,
}

fn strip_terminator(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}
