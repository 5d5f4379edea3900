//! Delimited artifact format
//!
//! Artifacts are rows of fields joined by a field delimiter and terminated
//! by a line delimiter. Both may be control characters or multi-character
//! sentinels. Every field but the chunk text is numeric or a date; chunk
//! text goes through the escape table, yet may still carry the field
//! delimiter when an escape sequence is cut by a chunk boundary.

use crate::error::{NoteLoadError, NoteLoadResult};
use serde::{Deserialize, Serialize};

/// Field and line delimiters of an artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactFormat {
    field_delimiter: String,
    line_delimiter: String,
}

impl ArtifactFormat {
    /// Create a format, rejecting empty or identical delimiters
    pub fn new(
        field_delimiter: impl Into<String>,
        line_delimiter: impl Into<String>,
    ) -> NoteLoadResult<Self> {
        let field_delimiter = field_delimiter.into();
        let line_delimiter = line_delimiter.into();
        if field_delimiter.is_empty() || line_delimiter.is_empty() {
            return Err(NoteLoadError::InvalidFormat(
                "delimiters must not be empty".to_string(),
            ));
        }
        if field_delimiter == line_delimiter {
            return Err(NoteLoadError::InvalidFormat(
                "field and line delimiters must differ".to_string(),
            ));
        }
        Ok(Self {
            field_delimiter,
            line_delimiter,
        })
    }

    /// Tab-separated fields, newline-terminated rows
    pub fn tab_newline() -> Self {
        Self {
            field_delimiter: "\t".to_string(),
            line_delimiter: "\n".to_string(),
        }
    }

    /// Pipe-separated fields, newline-terminated rows
    pub fn pipe_newline() -> Self {
        Self {
            field_delimiter: "|".to_string(),
            line_delimiter: "\n".to_string(),
        }
    }

    /// Field delimiter
    pub fn field_delimiter(&self) -> &str {
        &self.field_delimiter
    }

    /// Line delimiter
    pub fn line_delimiter(&self) -> &str {
        &self.line_delimiter
    }

    /// Render one row, terminator included
    pub fn row<I, S>(&self, fields: I) -> String
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out = String::new();
        for (i, field) in fields.into_iter().enumerate() {
            if i > 0 {
                out.push_str(&self.field_delimiter);
            }
            out.push_str(field.as_ref());
        }
        out.push_str(&self.line_delimiter);
        out
    }

    /// Split artifact contents into raw rows
    ///
    /// A trailing line delimiter does not produce an empty final row.
    pub fn lines<'a>(&'a self, contents: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        let body = contents
            .strip_suffix(self.line_delimiter.as_str())
            .unwrap_or(contents);
        body.split(self.line_delimiter.as_str())
            .filter(move |_| !body.is_empty())
    }

    /// Split one row into exactly `width` fields
    ///
    /// `free` names the one field (chunk text) that may itself contain the
    /// field delimiter, e.g. when an escape straddles a chunk boundary.
    /// Fields before it are split from the left, fields after it from the
    /// right. Returns `None` when the row has too few fields.
    pub fn fields<'a>(&self, row: &'a str, width: usize, free: Option<usize>) -> Option<Vec<&'a str>> {
        let delim = self.field_delimiter.as_str();
        let Some(free) = free.filter(|f| *f < width) else {
            let fields: Vec<&str> = row.split(delim).collect();
            return (fields.len() == width).then_some(fields);
        };

        let mut fields: Vec<&str> = Vec::with_capacity(width);
        let mut left = row.splitn(free + 1, delim);
        for _ in 0..free {
            fields.push(left.next()?);
        }
        let rest = left.next()?;

        let trailing = width - free - 1;
        let mut right: Vec<&str> = rest.rsplitn(trailing + 1, delim).collect();
        if right.len() != trailing + 1 {
            return None;
        }
        right.reverse();
        fields.extend(right);
        Some(fields)
    }
}

impl Default for ArtifactFormat {
    fn default() -> Self {
        Self::tab_newline()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_and_splits_rows() {
        let format = ArtifactFormat::tab_newline();
        let contents = format.row(["1", "42", "a b"]) + &format.row(["2", "43", "c"]);
        assert_eq!(contents, "1\t42\ta b\n2\t43\tc\n");

        let rows: Vec<Vec<&str>> = format
            .lines(&contents)
            .map(|line| format.fields(line, 3, None).unwrap())
            .collect();
        assert_eq!(rows, vec![vec!["1", "42", "a b"], vec!["2", "43", "c"]]);
    }

    #[test]
    fn free_field_may_contain_the_delimiter() {
        let format = ArtifactFormat::pipe_newline();
        let row = "100|1|a\\|b|1001|1001|d|d";
        let fields = format.fields(row, 7, Some(2)).unwrap();
        assert_eq!(fields, vec!["100", "1", "a\\|b", "1001", "1001", "d", "d"]);
    }

    #[test]
    fn short_rows_are_rejected() {
        let format = ArtifactFormat::tab_newline();
        assert!(format.fields("1\t2", 3, None).is_none());
        assert!(format.fields("1\t2", 7, Some(2)).is_none());
    }

    #[test]
    fn multi_character_sentinels() {
        let format = ArtifactFormat::new("&=&", "#=#").unwrap();
        let contents = format.row(["1", "x"]);
        assert_eq!(contents, "1&=&x#=#");
        assert_eq!(format.lines(&contents).count(), 1);
    }

    #[test]
    fn empty_contents_have_no_rows() {
        assert_eq!(ArtifactFormat::default().lines("").count(), 0);
    }

    #[test]
    fn rejects_bad_delimiters() {
        assert!(ArtifactFormat::new("", "\n").is_err());
        assert!(ArtifactFormat::new("|", "|").is_err());
    }
}
