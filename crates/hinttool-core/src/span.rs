//! Byte spans, content hashing, and materialized edits.
//!
//! A [`Span`] is a half-open byte interval `[start, end)` into a single file's
//! content. Spans are snapshot-scoped: they are only meaningful against the
//! exact text they were computed from. [`OutputEdit`] is the materialized,
//! output-facing form of an applied edit, carrying enough context to render
//! JSON and unified diffs.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Hash type for content verification (SHA-256, stored as hex string for JSON compatibility).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash(pub String);

impl ContentHash {
    /// Compute SHA-256 hash of the given bytes, returning hex-encoded string.
    pub fn compute(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        let result = hasher.finalize();
        ContentHash(hex::encode(result))
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Byte offsets into file content.
///
/// Spans are half-open intervals: `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    /// Start byte offset (inclusive).
    pub start: usize,
    /// End byte offset (exclusive).
    pub end: usize,
}

impl Span {
    /// Create a new span.
    ///
    /// # Panics
    /// Panics if `start > end`.
    pub fn new(start: usize, end: usize) -> Self {
        assert!(
            start <= end,
            "Span start ({}) must be <= end ({})",
            start,
            end
        );
        Span { start, end }
    }

    /// Length of the span in bytes.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Check if span is empty.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Check if this span overlaps with another.
    ///
    /// Two spans overlap if they share any byte positions.
    /// Adjacent spans (one ends where another starts) do NOT overlap.
    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Check if this span contains another span entirely.
    pub fn contains(&self, other: &Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// A materialized edit, suitable for JSON output and diff rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputEdit {
    /// File the edit applies to (workspace-relative path).
    pub file: String,
    /// Span in the original file content.
    pub span: Span,
    /// Text previously at the span.
    pub old_text: String,
    /// Replacement text.
    pub new_text: String,
    /// 1-indexed line of the edit start.
    pub line: u32,
    /// 1-indexed column of the edit start.
    pub col: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_basics() {
        let span = Span::new(4, 7);
        assert_eq!(span.len(), 3);
        assert!(!span.is_empty());
        assert!(Span::new(4, 4).is_empty());
    }

    #[test]
    #[should_panic(expected = "must be <=")]
    fn span_rejects_inverted() {
        let _ = Span::new(7, 4);
    }

    #[test]
    fn span_overlap() {
        let a = Span::new(0, 5);
        let b = Span::new(5, 10);
        let c = Span::new(4, 6);
        assert!(!a.overlaps(&b), "adjacent spans do not overlap");
        assert!(a.overlaps(&c));
        assert!(c.overlaps(&b));
    }

    #[test]
    fn span_contains() {
        let outer = Span::new(0, 10);
        assert!(outer.contains(&Span::new(2, 8)));
        assert!(outer.contains(&outer));
        assert!(!Span::new(2, 8).contains(&outer));
    }

    #[test]
    fn content_hash_is_stable_hex() {
        let h1 = ContentHash::compute(b"x = 1\n");
        let h2 = ContentHash::compute(b"x = 1\n");
        assert_eq!(h1, h2);
        assert_eq!(h1.0.len(), 64);
        assert!(h1.0.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn content_hash_differs_on_content() {
        assert_ne!(ContentHash::compute(b"a"), ContentHash::compute(b"b"));
    }
}
