//! Escaping policy for chunk text
//!
//! The bulk format reserves a handful of characters (the escape lead itself,
//! the field delimiter, characters the downstream tool treats specially).
//! An [`EscapePolicy`] is a table of `char -> replacement` applied to every
//! character of the note text before it is chunked, and reversed by loaders
//! that read the artifact back.
//!
//! Reversal is exact as long as every replacement starts with a lead
//! character whose own rule is part of the table (e.g. `\` -> `\\`).

use crate::error::{NoteLoadError, NoteLoadResult};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Literal marker used for embedded line breaks, both in input files and
/// in escaped chunk text
pub const LINE_BREAK_MARKER: &str = "\\n";

/// One `char -> replacement` entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscapeRule {
    /// Character to replace
    pub from: char,
    /// Replacement text
    pub to: String,
}

impl EscapeRule {
    /// Create a rule
    pub fn new(from: char, to: impl Into<String>) -> Self {
        Self {
            from,
            to: to.into(),
        }
    }
}

/// Table-driven escaping applied to chunk text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EscapePolicy {
    rules: Vec<EscapeRule>,
}

impl EscapePolicy {
    /// Build a policy from rules
    ///
    /// Rejects empty replacements and characters listed twice.
    pub fn new(rules: Vec<EscapeRule>) -> NoteLoadResult<Self> {
        for (i, rule) in rules.iter().enumerate() {
            if rule.to.is_empty() {
                return Err(NoteLoadError::InvalidEscapeRule(format!(
                    "empty replacement for {:?}",
                    rule.from
                )));
            }
            if rules[..i].iter().any(|r| r.from == rule.from) {
                return Err(NoteLoadError::InvalidEscapeRule(format!(
                    "{:?} listed more than once",
                    rule.from
                )));
            }
        }
        Ok(Self { rules })
    }

    /// No escaping at all
    pub fn none() -> Self {
        Self { rules: Vec::new() }
    }

    /// Rules for the MGI note chunk table: backslash, `#`, `?`, newline
    pub fn mgi() -> Self {
        Self {
            rules: vec![
                EscapeRule::new('\\', "\\\\"),
                EscapeRule::new('#', "\\#"),
                EscapeRule::new('?', "\\?"),
                EscapeRule::new('\n', LINE_BREAK_MARKER),
            ],
        }
    }

    /// Rules for the allele note table: backslash, the `|` delimiter, newline
    pub fn allele() -> Self {
        Self {
            rules: vec![
                EscapeRule::new('\\', "\\\\"),
                EscapeRule::new('|', "\\|"),
                EscapeRule::new('\n', LINE_BREAK_MARKER),
            ],
        }
    }

    /// The rules in table order
    pub fn rules(&self) -> &[EscapeRule] {
        &self.rules
    }

    /// Whether `c` has a rule
    pub fn escapes(&self, c: char) -> bool {
        self.replacement(c).is_some()
    }

    /// First rule whose replacement does not lead with an escaped character
    ///
    /// Any such rule makes [`unescape`](Self::unescape) ambiguous.
    pub fn irreversible_rule(&self) -> Option<&EscapeRule> {
        self.rules.iter().find(|rule| {
            rule.to
                .chars()
                .next()
                .map_or(true, |lead| !self.escapes(lead))
        })
    }

    fn replacement(&self, c: char) -> Option<&str> {
        self.rules
            .iter()
            .find(|r| r.from == c)
            .map(|r| r.to.as_str())
    }

    /// Apply the table to `text`
    pub fn escape<'a>(&self, text: &'a str) -> Cow<'a, str> {
        if !text.chars().any(|c| self.replacement(c).is_some()) {
            return Cow::Borrowed(text);
        }

        let mut out = String::with_capacity(text.len() + text.len() / 8);
        for c in text.chars() {
            match self.replacement(c) {
                Some(rep) => out.push_str(rep),
                None => out.push(c),
            }
        }
        Cow::Owned(out)
    }

    /// Reverse [`escape`](Self::escape)
    ///
    /// Scans left to right, replacing the longest matching replacement with
    /// its source character. Text that matches no replacement passes through.
    pub fn unescape(&self, text: &str) -> String {
        let mut by_length: Vec<&EscapeRule> = self.rules.iter().collect();
        by_length.sort_by(|a, b| b.to.len().cmp(&a.to.len()));

        let mut out = String::with_capacity(text.len());
        let mut rest = text;
        'outer: while !rest.is_empty() {
            for rule in &by_length {
                if let Some(tail) = rest.strip_prefix(rule.to.as_str()) {
                    out.push(rule.from);
                    rest = tail;
                    continue 'outer;
                }
            }
            let mut chars = rest.chars();
            if let Some(c) = chars.next() {
                out.push(c);
            }
            rest = chars.as_str();
        }
        out
    }
}

impl Default for EscapePolicy {
    fn default() -> Self {
        Self::mgi()
    }
}

/// Turn literal `\n` markers from the upstream export into line breaks
pub fn decode_line_breaks(text: &str) -> Cow<'_, str> {
    if text.contains(LINE_BREAK_MARKER) {
        Cow::Owned(text.replace(LINE_BREAK_MARKER, "\n"))
    } else {
        Cow::Borrowed(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mgi_escapes_reserved_characters() {
        let policy = EscapePolicy::mgi();
        assert_eq!(
            policy.escape("a\\b#c?d\ne"),
            "a\\\\b\\#c\\?d\\ne"
        );
    }

    #[test]
    fn plain_text_is_borrowed() {
        let policy = EscapePolicy::mgi();
        assert!(matches!(policy.escape("plain text"), Cow::Borrowed(_)));
    }

    #[test]
    fn unescape_reverses_backslash_before_marker() {
        // A literal backslash followed by `n` must not come back as a newline
        let policy = EscapePolicy::mgi();
        let original = "C:\\new\nline";
        let escaped = policy.escape(original);
        assert_eq!(escaped, "C:\\\\new\\nline");
        assert_eq!(policy.unescape(&escaped), original);
    }

    #[test]
    fn allele_policy_escapes_pipe_not_hash() {
        let policy = EscapePolicy::allele();
        assert_eq!(policy.escape("a|b#c"), "a\\|b#c");
    }

    #[test]
    fn duplicate_rule_is_rejected() {
        let err = EscapePolicy::new(vec![
            EscapeRule::new('#', "\\#"),
            EscapeRule::new('#', "##"),
        ])
        .unwrap_err();
        assert!(matches!(err, NoteLoadError::InvalidEscapeRule(_)));
    }

    #[test]
    fn empty_replacement_is_rejected() {
        assert!(EscapePolicy::new(vec![EscapeRule::new('#', "")]).is_err());
    }

    #[test]
    fn decode_line_breaks_replaces_markers() {
        assert_eq!(decode_line_breaks("one\\ntwo"), "one\ntwo");
        assert!(matches!(decode_line_breaks("one"), Cow::Borrowed(_)));
    }

    #[test]
    fn preset_tables_are_reversible() {
        assert_eq!(EscapePolicy::mgi().irreversible_rule(), None);
        assert_eq!(EscapePolicy::allele().irreversible_rule(), None);
        assert!(EscapePolicy::mgi().escapes('\n'));
        assert!(!EscapePolicy::mgi().escapes('|'));
    }

    #[test]
    fn replacement_without_escaped_lead_is_irreversible() {
        let policy = EscapePolicy::new(vec![
            EscapeRule::new('\\', "\\\\"),
            EscapeRule::new('#', "%23"),
        ])
        .unwrap();
        assert_eq!(policy.irreversible_rule(), Some(&EscapeRule::new('#', "%23")));
    }

    #[test]
    fn none_policy_is_identity() {
        let policy = EscapePolicy::none();
        assert_eq!(policy.escape("a\\b\n"), "a\\b\n");
        assert_eq!(policy.unescape("a\\b"), "a\\b");
    }
}
