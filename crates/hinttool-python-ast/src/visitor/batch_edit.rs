// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Batch edit infrastructure for applying multiple span-based edits atomically.
//!
//! [`BatchSpanEditor`] collects edit primitives computed against one snapshot
//! of a source text and applies them in a single pass. Edits are applied in
//! reverse position order so that applying one edit never shifts the offsets
//! of edits earlier in the text; this is the edit-sequencing rule that lets
//! every edit be computed from the original parse without re-resolving
//! positions after each mutation.
//!
//! # Edit Primitives
//!
//! | Primitive | Description | Span Semantics |
//! |-----------|-------------|----------------|
//! | `Replace(span, text)` | Replace content at span with new text | `span.start..span.end` becomes `text` |
//! | `InsertBefore(span, text)` | Insert text immediately before span | Insert at `span.start` |
//! | `InsertAfter(span, text)` | Insert text immediately after span | Insert at `span.end` |
//! | `Delete(span)` | Remove content at span | Equivalent to `Replace(span, "")` |
//! | `InsertAt(position, text)` | Insert at absolute position | Zero-width span at position |

use hinttool_core::span::Span;

/// An atomic edit operation on source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditPrimitive {
    /// Replace content at span with new text.
    Replace { span: Span, new_text: String },

    /// Insert text immediately before the given span.
    InsertBefore { anchor_span: Span, text: String },

    /// Insert text immediately after the given span.
    InsertAfter { anchor_span: Span, text: String },

    /// Delete content at span. Equivalent to `Replace { span, new_text: "" }`.
    Delete { span: Span },

    /// Insert text at an absolute byte position.
    InsertAt { position: usize, text: String },
}

impl EditPrimitive {
    /// Returns the insertion point (byte offset where new text begins).
    pub fn insertion_point(&self) -> usize {
        match self {
            EditPrimitive::Replace { span, .. } => span.start,
            EditPrimitive::InsertBefore { anchor_span, .. } => anchor_span.start,
            EditPrimitive::InsertAfter { anchor_span, .. } => anchor_span.end,
            EditPrimitive::Delete { span } => span.start,
            EditPrimitive::InsertAt { position, .. } => *position,
        }
    }

    /// The span of original text this edit removes, if any.
    pub fn replaced_span(&self) -> Option<Span> {
        match self {
            EditPrimitive::Replace { span, .. } => Some(*span),
            EditPrimitive::Delete { span } => Some(*span),
            EditPrimitive::InsertBefore { .. }
            | EditPrimitive::InsertAfter { .. }
            | EditPrimitive::InsertAt { .. } => None,
        }
    }

    /// The text this edit inserts.
    pub fn inserted_text(&self) -> &str {
        match self {
            EditPrimitive::Replace { new_text, .. } => new_text,
            EditPrimitive::InsertBefore { text, .. } => text,
            EditPrimitive::InsertAfter { text, .. } => text,
            EditPrimitive::Delete { .. } => "",
            EditPrimitive::InsertAt { text, .. } => text,
        }
    }
}

/// Error type for batch edit operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchEditError {
    /// Two edits remove overlapping spans of original text.
    OverlappingEdits { edit1_span: Span, edit2_span: Span },

    /// An insertion lands strictly inside a span removed by another edit.
    InsertionInsideReplacedSpan { position: usize, span: Span },

    /// An edit span extends beyond source length or splits a character.
    SpanOutOfBounds { span: Span, source_len: usize },
}

impl std::fmt::Display for BatchEditError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BatchEditError::OverlappingEdits {
                edit1_span,
                edit2_span,
            } => write!(
                f,
                "overlapping edits: {} and {}",
                edit1_span, edit2_span
            ),
            BatchEditError::InsertionInsideReplacedSpan { position, span } => write!(
                f,
                "insertion at {} lands inside replaced span {}",
                position, span
            ),
            BatchEditError::SpanOutOfBounds { span, source_len } => write!(
                f,
                "edit span {} out of bounds for source of length {}",
                span, source_len
            ),
        }
    }
}

impl std::error::Error for BatchEditError {}

/// Applies a batch of span edits to one source snapshot.
///
/// # Example
///
/// ```
/// use hinttool_python_ast::visitor::{BatchSpanEditor, EditPrimitive};
/// use hinttool_core::span::Span;
///
/// let source = "def foo():\n    return 1\n";
///
/// let mut editor = BatchSpanEditor::new(source);
/// editor.add(EditPrimitive::Replace {
///     span: Span::new(4, 7),
///     new_text: "bar".to_string(),
/// });
///
/// let result = editor.apply().unwrap();
/// assert_eq!(result, "def bar():\n    return 1\n");
/// ```
pub struct BatchSpanEditor<'a> {
    source: &'a str,
    edits: Vec<EditPrimitive>,
}

impl<'a> BatchSpanEditor<'a> {
    /// Create an editor over one source snapshot.
    pub fn new(source: &'a str) -> Self {
        BatchSpanEditor {
            source,
            edits: Vec::new(),
        }
    }

    /// Queue an edit. Validation happens at [`apply`](Self::apply) time.
    pub fn add(&mut self, edit: EditPrimitive) {
        self.edits.push(edit);
    }

    /// Number of queued edits.
    pub fn len(&self) -> usize {
        self.edits.len()
    }

    /// True when no edits are queued.
    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// The queued edits, in the order they were added.
    pub fn edits(&self) -> &[EditPrimitive] {
        &self.edits
    }

    /// Validate and apply all queued edits, returning the rewritten source.
    ///
    /// Edits are applied in reverse position order to preserve span validity.
    /// With no queued edits the source is returned unchanged.
    pub fn apply(&self) -> Result<String, BatchEditError> {
        self.validate()?;

        // Sort indices by insertion point descending; for equal positions the
        // later-added edit applies first so earlier-added text ends up first
        // in the output.
        let mut order: Vec<usize> = (0..self.edits.len()).collect();
        order.sort_by(|&a, &b| {
            let pa = self.edits[a].insertion_point();
            let pb = self.edits[b].insertion_point();
            pb.cmp(&pa).then(b.cmp(&a))
        });

        let mut result = self.source.to_string();
        for idx in order {
            match &self.edits[idx] {
                EditPrimitive::Replace { span, new_text } => {
                    result.replace_range(span.start..span.end, new_text);
                }
                EditPrimitive::InsertBefore { anchor_span, text } => {
                    result.insert_str(anchor_span.start, text);
                }
                EditPrimitive::InsertAfter { anchor_span, text } => {
                    result.insert_str(anchor_span.end, text);
                }
                EditPrimitive::Delete { span } => {
                    result.replace_range(span.start..span.end, "");
                }
                EditPrimitive::InsertAt { position, text } => {
                    result.insert_str(*position, text);
                }
            }
        }
        Ok(result)
    }

    fn validate(&self) -> Result<(), BatchEditError> {
        let len = self.source.len();
        for edit in &self.edits {
            let point = edit.insertion_point();
            if point > len || !self.source.is_char_boundary(point) {
                return Err(BatchEditError::SpanOutOfBounds {
                    span: Span::new(point.min(len), point.min(len)),
                    source_len: len,
                });
            }
            if let Some(span) = edit.replaced_span() {
                if span.end > len
                    || !self.source.is_char_boundary(span.start)
                    || !self.source.is_char_boundary(span.end)
                {
                    return Err(BatchEditError::SpanOutOfBounds {
                        span,
                        source_len: len,
                    });
                }
            }
        }

        // Replaced spans must not overlap each other.
        let mut replaced: Vec<Span> = self
            .edits
            .iter()
            .filter_map(|e| e.replaced_span())
            .collect();
        replaced.sort_by_key(|s| s.start);
        for pair in replaced.windows(2) {
            if pair[0].overlaps(&pair[1]) {
                return Err(BatchEditError::OverlappingEdits {
                    edit1_span: pair[0],
                    edit2_span: pair[1],
                });
            }
        }

        // Insertions must not land strictly inside a replaced span.
        for edit in &self.edits {
            if edit.replaced_span().is_some() {
                continue;
            }
            let point = edit.insertion_point();
            for span in &replaced {
                if span.start < point && point < span.end {
                    return Err(BatchEditError::InsertionInsideReplacedSpan {
                        position: point,
                        span: *span,
                    });
                }
            }
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replace_single() {
        let mut editor = BatchSpanEditor::new("def foo(): pass");
        editor.add(EditPrimitive::Replace {
            span: Span::new(4, 7),
            new_text: "bar".to_string(),
        });
        assert_eq!(editor.apply().unwrap(), "def bar(): pass");
    }

    #[test]
    fn empty_edit_list_is_identity() {
        let editor = BatchSpanEditor::new("x = 1\n");
        assert_eq!(editor.apply().unwrap(), "x = 1\n");
    }

    #[test]
    fn multiple_edits_apply_in_reverse_position_order() {
        // Annotating both parameters must not invalidate the earlier span.
        let source = "def f(a, b): pass";
        let mut editor = BatchSpanEditor::new(source);
        let a = source.find('a').unwrap();
        let b = source.find('b').unwrap();
        editor.add(EditPrimitive::Replace {
            span: Span::new(a, a + 1),
            new_text: "a: int".to_string(),
        });
        editor.add(EditPrimitive::Replace {
            span: Span::new(b, b + 1),
            new_text: "b: str".to_string(),
        });
        assert_eq!(editor.apply().unwrap(), "def f(a: int, b: str): pass");
    }

    #[test]
    fn insert_after_and_before() {
        let source = "x = 1\n";
        let mut editor = BatchSpanEditor::new(source);
        editor.add(EditPrimitive::InsertAfter {
            anchor_span: Span::new(0, 1),
            text: ": int".to_string(),
        });
        editor.add(EditPrimitive::InsertBefore {
            anchor_span: Span::new(0, 5),
            text: "# lead\n".to_string(),
        });
        assert_eq!(editor.apply().unwrap(), "# lead\nx: int = 1\n");
    }

    #[test]
    fn inserts_at_same_point_keep_add_order() {
        let mut editor = BatchSpanEditor::new("ab");
        editor.add(EditPrimitive::InsertAt {
            position: 1,
            text: "1".to_string(),
        });
        editor.add(EditPrimitive::InsertAt {
            position: 1,
            text: "2".to_string(),
        });
        assert_eq!(editor.apply().unwrap(), "a12b");
    }

    #[test]
    fn delete_span() {
        let mut editor = BatchSpanEditor::new("x = 1  # tail");
        editor.add(EditPrimitive::Delete {
            span: Span::new(5, 13),
        });
        assert_eq!(editor.apply().unwrap(), "x = 1");
    }

    #[test]
    fn overlapping_replaces_rejected() {
        let mut editor = BatchSpanEditor::new("abcdef");
        editor.add(EditPrimitive::Replace {
            span: Span::new(0, 3),
            new_text: "x".to_string(),
        });
        editor.add(EditPrimitive::Replace {
            span: Span::new(2, 5),
            new_text: "y".to_string(),
        });
        assert!(matches!(
            editor.apply(),
            Err(BatchEditError::OverlappingEdits { .. })
        ));
    }

    #[test]
    fn adjacent_replaces_allowed() {
        let mut editor = BatchSpanEditor::new("abcdef");
        editor.add(EditPrimitive::Replace {
            span: Span::new(0, 3),
            new_text: "x".to_string(),
        });
        editor.add(EditPrimitive::Replace {
            span: Span::new(3, 6),
            new_text: "y".to_string(),
        });
        assert_eq!(editor.apply().unwrap(), "xy");
    }

    #[test]
    fn insertion_inside_replace_rejected() {
        let mut editor = BatchSpanEditor::new("abcdef");
        editor.add(EditPrimitive::Replace {
            span: Span::new(0, 4),
            new_text: "x".to_string(),
        });
        editor.add(EditPrimitive::InsertAt {
            position: 2,
            text: "!".to_string(),
        });
        assert!(matches!(
            editor.apply(),
            Err(BatchEditError::InsertionInsideReplacedSpan { .. })
        ));
    }

    #[test]
    fn out_of_bounds_rejected() {
        let mut editor = BatchSpanEditor::new("abc");
        editor.add(EditPrimitive::Replace {
            span: Span::new(1, 10),
            new_text: "x".to_string(),
        });
        assert!(matches!(
            editor.apply(),
            Err(BatchEditError::SpanOutOfBounds { .. })
        ));
    }

    #[test]
    fn non_char_boundary_rejected() {
        let mut editor = BatchSpanEditor::new("é = 1");
        editor.add(EditPrimitive::InsertAt {
            position: 1,
            text: "x".to_string(),
        });
        assert!(matches!(
            editor.apply(),
            Err(BatchEditError::SpanOutOfBounds { .. })
        ));
    }
}
