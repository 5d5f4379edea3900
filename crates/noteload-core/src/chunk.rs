//! Fixed-length text chunking
//!
//! Chunk boundaries fall on character counts only. Words and escape
//! sequences are not kept whole, so a two-character escape may straddle
//! two chunks; readers must concatenate before unescaping.

use std::num::NonZeroUsize;

/// Maximum chunk length of the note chunk table
pub const DEFAULT_CHUNK_LENGTH: NonZeroUsize = match NonZeroUsize::new(255) {
    Some(n) => n,
    None => unreachable!(),
};

/// Lazy iterator over consecutive chunks of at most `max` characters
#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    rest: &'a str,
    max: NonZeroUsize,
}

/// Split `text` into chunks of at most `max` characters, left to right
///
/// Empty text yields no chunks.
pub fn chunks(text: &str, max: NonZeroUsize) -> Chunks<'_> {
    Chunks { rest: text, max }
}

impl<'a> Iterator for Chunks<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        if self.rest.is_empty() {
            return None;
        }

        let split = self
            .rest
            .char_indices()
            .nth(self.max.get())
            .map(|(i, _)| i)
            .unwrap_or(self.rest.len());

        let (head, tail) = self.rest.split_at(split);
        self.rest = tail;
        Some(head)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.rest.is_empty() {
            return (0, Some(0));
        }
        let max = self.max.get();
        // Byte length bounds the character count from above
        let lower = self.rest.len().div_ceil(4).div_ceil(max).max(1);
        let upper = self.rest.len().div_ceil(max);
        (lower, Some(upper))
    }
}

impl std::iter::FusedIterator for Chunks<'_> {}
