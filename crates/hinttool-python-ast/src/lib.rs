// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! A Python parser and span-carrying AST library.
//!
//! This crate parses Python source into an owned AST where every node records
//! the byte span of its source text, and provides the traversal and editing
//! infrastructure the annotation engine builds on: visitors and collectors
//! over the tree, and a batch span editor for atomic text rewrites.
//!
//! # Quick Start
//!
//! ```
//! use hinttool_python_ast::{parse_module, Statement};
//!
//! let module = parse_module("x = 1").expect("parse error");
//! assert!(matches!(module.body[0], Statement::Assign(_)));
//! ```
//!
//! # Error Rendering
//!
//! ```
//! use hinttool_python_ast::{parse_module, prettify_error};
//!
//! if let Err(e) = parse_module("def f(:\n    pass") {
//!     let formatted = prettify_error(&e, "def f(:\n    pass", "example.py");
//!     assert!(formatted.contains("example.py"));
//! }
//! ```

use std::cmp::max;

/// Tokenizer for Python source code.
pub mod tokenizer;
pub use tokenizer::{tokenize, TokError, TokKind, Token};

/// AST node types.
pub mod nodes;
pub use nodes::*;

mod parser;
pub use parser::{ParserError, Result};

/// Visitor and collector infrastructure for AST traversal.
pub mod visitor;
pub use visitor::{
    BatchEditError, BatchSpanEditor, BindingKind, EditPrimitive, FunctionCollector, FunctionInfo,
    ScopeId, ScopeIndex, ScopeInfo, ScopeKind, ScopedBinding, TargetCollector, TargetContext,
    TargetInfo, TypeComment, TypeCommentCollector, TypeCommentKind, VisitResult, Visitor,
};

// ============================================================================
// Parsing functions
// ============================================================================

/// Parse a Python module into an AST.
///
/// # Errors
///
/// Returns a [`ParserError`] when the source fails to tokenize or parse.
///
/// # Example
///
/// ```
/// use hinttool_python_ast::parse_module;
///
/// let module = parse_module("def hello():\n    print('world')\n").expect("parse error");
/// assert_eq!(module.body.len(), 1);
/// ```
pub fn parse_module(mut source: &str) -> Result<Module> {
    // Strip UTF-8 BOM
    if let Some(stripped) = source.strip_prefix('\u{feff}') {
        source = stripped;
    }
    parser::parse(source)
}

// ============================================================================
// Error formatting
// ============================================================================

/// Returns the byte offset of the beginning of line `n` (1-indexed).
fn bol_offset(source: &str, n: i32) -> usize {
    if n <= 1 {
        return 0;
    }
    source
        .match_indices('\n')
        .nth((n - 2) as usize)
        .map(|(index, _)| index + 1)
        .unwrap_or(source.len())
}

/// Formats a parser error into a human-readable string with source context.
///
/// Produces a caret-and-snippet diagnostic with the relevant source lines and
/// the error location highlighted.
pub fn prettify_error(err: &ParserError, source: &str, label: &str) -> String {
    use annotate_snippets::{Level, Renderer, Snippet};

    let offset = err.offset().min(source.len());
    let (line, _) = hinttool_core::text::byte_offset_to_position_str(source, offset);
    let context = 1i32;
    let line_start = max(1, line as i32 - context) as usize;
    let start_offset = bol_offset(source, line as i32 - context);
    let end_offset = bol_offset(source, line as i32 + context + 1);
    let snippet_source = &source[start_offset..end_offset.max(start_offset)];
    let start = offset - start_offset;
    let end = snippet_source[start.min(snippet_source.len())..]
        .chars()
        .next()
        .map(|c| start + c.len_utf8())
        .unwrap_or(start);
    let message = err.to_string();
    let rendered = Renderer::styled()
        .render(
            Level::Error.title(label).snippet(
                Snippet::source(snippet_source)
                    .line_start(line_start)
                    .fold(false)
                    .annotations(vec![Level::Error
                        .span(start.min(snippet_source.len())..end.min(snippet_source.len()))
                        .label(&message)]),
            ),
        )
        .to_string();
    rendered
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_bare_minimum_funcdef() {
        parse_module("def f(): ...").expect("parse error");
    }

    #[test]
    fn test_funcdef_params() {
        parse_module("def g(a, b): ...").expect("parse error");
    }

    #[test]
    fn test_bom_is_stripped() {
        let module = parse_module("\u{feff}x = 1\n").expect("parse error");
        assert_eq!(module.body.len(), 1);
    }

    #[test]
    fn test_tokenizer_error_surfaces() {
        let err = parse_module("s = 'unterminated").unwrap_err();
        assert!(matches!(err, ParserError::Tokenize(_)));
    }

    #[test]
    fn bol_offset_first_line() {
        assert_eq!(0, bol_offset("hello", 1));
        assert_eq!(0, bol_offset("hello", 0));
        assert_eq!(0, bol_offset("hello\nhello", 1));
    }

    #[test]
    fn bol_offset_second_line() {
        assert_eq!(6, bol_offset("hello\nhello", 2));
        assert_eq!(6, bol_offset("hello\nhello\nhello", 2));
    }

    #[test]
    fn bol_offset_past_end() {
        assert_eq!(5, bol_offset("hello", 3));
        assert_eq!(11, bol_offset("hello\nhello", 3));
    }

    #[test]
    fn prettify_contains_label_and_message() {
        let source = "x = = 1\n";
        let err = parse_module(source).unwrap_err();
        let rendered = prettify_error(&err, source, "bad.py");
        assert!(rendered.contains("bad.py"));
    }

    #[test]
    fn spans_index_into_source() {
        let source = "value = compute(1, 2)\n";
        let module = parse_module(source).expect("parse error");
        if let Statement::Assign(assign) = &module.body[0] {
            let target_span = assign.targets[0].span();
            assert_eq!(&source[target_span.start..target_span.end], "value");
            let value_span = assign.value.span();
            assert_eq!(&source[value_span.start..value_span.end], "compute(1, 2)");
        } else {
            panic!("expected Assign");
        }
    }

    #[test]
    fn multiline_structures_parse() {
        let source = r#"
import os
from typing import Any


class Config:
    defaults = {"debug": False}

    def __init__(self, path):
        self.path = path
        self.values = dict(self.defaults)

    def load(self):
        with open(self.path) as handle:
            for line in handle:
                key, value = line.split("=", 1)
                self.values[key.strip()] = value.strip()
        return self.values


def main(argv=None):
    config = Config(os.environ.get("CONFIG", "app.cfg"))
    data = config.load()
    print(len(data))
"#;
        let module = parse_module(source).expect("parse error");
        assert_eq!(module.body.len(), 4);
    }
}
