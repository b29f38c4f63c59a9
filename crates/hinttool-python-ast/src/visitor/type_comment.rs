// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Type comment detection.
//!
//! Type comments (`# type: Foo`) are legacy PEP 484-style annotations used
//! where syntactic annotations are unavailable. This module scans raw source
//! lines (comments never reach the token stream) and classifies each comment:
//!
//! - Variable annotations: `x = value  # type: Foo`
//! - Tuple unpacking: `x, y = value  # type: (int, str)`
//! - Function signatures: `def foo(x):  # type: (int) -> str`
//! - Type ignore: `x = value  # type: ignore[attr-defined]`
//!
//! Detection is line-based with a small quote-tracking scan so that `#`
//! characters inside string literals on the same line are not mistaken for
//! comment starts. Multi-line strings containing `# type:` text can still
//! produce false positives; the reference implementation shares this
//! limitation.

use hinttool_core::span::Span;

/// The kind of type comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeCommentKind {
    /// A variable type annotation: `# type: T` or `# type: (T, U)`.
    Variable,
    /// A function signature annotation: `# type: (...) -> T`.
    FunctionSignature,
    /// A type ignore directive: `# type: ignore` or `# type: ignore[code]`.
    Ignore,
}

/// A type comment extracted from source code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeComment {
    /// The kind of type comment.
    pub kind: TypeCommentKind,
    /// The content after `# type:` (trimmed).
    pub content: String,
    /// The span of the entire comment in the source.
    pub span: Span,
    /// The line number (1-indexed) where this comment appears.
    pub line: u32,
}

/// Scans source text for type comments.
pub struct TypeCommentCollector;

impl TypeCommentCollector {
    /// Collect all type comments in the source, in line order.
    pub fn collect(source: &str) -> Vec<TypeComment> {
        let mut comments = Vec::new();
        let mut offset = 0usize;
        for (idx, line) in source.split('\n').enumerate() {
            if let Some(hash_pos) = comment_start(line) {
                let comment = &line[hash_pos..];
                if let Some(content) = type_comment_content(comment) {
                    let kind = classify(content);
                    comments.push(TypeComment {
                        kind,
                        content: content.to_string(),
                        span: Span::new(offset + hash_pos, offset + line.len()),
                        line: (idx + 1) as u32,
                    });
                }
            }
            offset += line.len() + 1;
        }
        comments
    }

    /// True when the comment text is a type comment (`# type: ...`).
    pub fn is_type_comment(text: &str) -> bool {
        type_comment_content(text).is_some()
    }
}

/// Find the byte offset of the first `#` on the line that is not inside a
/// single- or double-quoted string.
fn comment_start(line: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (i, ch) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' => escaped = true,
            '\'' | '"' => match quote {
                Some(q) if q == ch => quote = None,
                Some(_) => {}
                None => quote = Some(ch),
            },
            '#' if quote.is_none() => return Some(i),
            _ => {}
        }
    }
    None
}

/// Strip the `# type:` prefix and return the trimmed content, or `None` when
/// the comment is not a type comment.
fn type_comment_content(comment: &str) -> Option<&str> {
    let body = comment.strip_prefix('#')?.trim_start();
    let rest = body.strip_prefix("type")?.trim_start();
    let content = rest.strip_prefix(':')?;
    Some(content.trim())
}

fn classify(content: &str) -> TypeCommentKind {
    if content == "ignore" || content.starts_with("ignore[") {
        return TypeCommentKind::Ignore;
    }
    if content.starts_with('(') && content.contains("->") {
        return TypeCommentKind::FunctionSignature;
    }
    TypeCommentKind::Variable
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_variable_comment() {
        let source = "x = make()  # type: Handler\n";
        let comments = TypeCommentCollector::collect(source);
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].kind, TypeCommentKind::Variable);
        assert_eq!(comments[0].content, "Handler");
        assert_eq!(comments[0].line, 1);
        assert_eq!(
            &source[comments[0].span.start..comments[0].span.end],
            "# type: Handler"
        );
    }

    #[test]
    fn collects_tuple_comment() {
        let comments = TypeCommentCollector::collect("x, y = f()  # type: (int, str)\n");
        assert_eq!(comments[0].kind, TypeCommentKind::Variable);
        assert_eq!(comments[0].content, "(int, str)");
    }

    #[test]
    fn collects_signature_comment() {
        let comments =
            TypeCommentCollector::collect("def f(a, b):\n    # type: (int, str) -> bool\n    pass\n");
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].kind, TypeCommentKind::FunctionSignature);
        assert_eq!(comments[0].line, 2);
    }

    #[test]
    fn collects_ignore_comment() {
        let comments = TypeCommentCollector::collect("x = f()  # type: ignore[attr-defined]\n");
        assert_eq!(comments[0].kind, TypeCommentKind::Ignore);
        let comments = TypeCommentCollector::collect("x = f()  # type: ignore\n");
        assert_eq!(comments[0].kind, TypeCommentKind::Ignore);
    }

    #[test]
    fn plain_comments_are_not_type_comments() {
        let comments = TypeCommentCollector::collect("x = 1  # the type: of thing\n# typo: int\n");
        assert!(comments.is_empty());
    }

    #[test]
    fn hash_inside_string_is_ignored() {
        let comments = TypeCommentCollector::collect("x = '# type: int'\n");
        assert!(comments.is_empty());
        let comments = TypeCommentCollector::collect("x = '# fake'  # type: str\n");
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].content, "str");
    }

    #[test]
    fn spacing_variants() {
        for text in &["#type:int", "# type : int", "#  type:  int"] {
            let line = format!("x = 1  {}\n", text);
            let comments = TypeCommentCollector::collect(&line);
            assert_eq!(comments.len(), 1, "failed for {:?}", text);
            assert_eq!(comments[0].content, "int");
        }
    }

    #[test]
    fn is_type_comment_predicate() {
        assert!(TypeCommentCollector::is_type_comment("# type: int"));
        assert!(TypeCommentCollector::is_type_comment("# type: ignore"));
        assert!(!TypeCommentCollector::is_type_comment("# types: int"));
        assert!(!TypeCommentCollector::is_type_comment("plain text"));
    }

    #[test]
    fn multiple_lines_tracked() {
        let source = "a = 1  # type: int\nb = 2\nc = 3  # type: str\n";
        let comments = TypeCommentCollector::collect(source);
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].line, 1);
        assert_eq!(comments[1].line, 3);
    }
}
