//! The annotate operation.
//!
//! Pipeline per file: parse → collect (targets, scopes, functions, type
//! comments) → discovery filtering → per-candidate synthesis → one atomic
//! batch apply. All edits are computed against the original parse snapshot
//! and committed through the reverse-ordered batch editor, so no edit ever
//! invalidates another's offsets.
//!
//! Recoverable synthesis failures (incompatible types, unsupported shapes)
//! skip that single target or signature slot and are reported in the result;
//! they never abort the rest of the file. Parse failures fail the file but
//! never the batch.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use hinttool_core::span::{ContentHash, OutputEdit, Span};
use hinttool_core::text::{byte_offset_to_position, line_end, line_start};
use hinttool_python_ast::visitor::{
    BatchSpanEditor, EditPrimitive, FunctionCollector, ScopeIndex, TargetCollector,
    TypeCommentCollector,
};
use hinttool_python_ast::{parse_module, ParserError};

use crate::files::FileError;
use crate::level::PythonLevel;
use crate::oracle::{EvalContext, LiteralOracle, StubOracle, TypeOracle};
use crate::synthesis::{SkippedSlot, Synthesizer};
use crate::targets::{
    find_class_level_definitions, find_suitable_targets, is_fully_annotated,
    is_instance_attribute, DiscoveryContext,
};

// ============================================================================
// Options
// ============================================================================

/// Which oracle the operation consults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OracleKind {
    /// Always-`Any` stub annotations.
    #[default]
    Stub,
    /// Literal-level inference with `Any` fallback.
    Infer,
}

/// Options for the annotate operation.
#[derive(Debug, Clone)]
pub struct AnnotateOptions {
    /// Target language level; decides inline vs comment syntax.
    pub level: PythonLevel,
    /// Oracle selection.
    pub oracle: OracleKind,
    /// Annotate variable binding targets.
    pub annotate_variables: bool,
    /// Annotate function signatures.
    pub annotate_functions: bool,
}

impl Default for AnnotateOptions {
    fn default() -> Self {
        AnnotateOptions {
            level: PythonLevel::default(),
            oracle: OracleKind::default(),
            annotate_variables: true,
            annotate_functions: true,
        }
    }
}

// ============================================================================
// Results
// ============================================================================

/// A target or signature slot that was skipped, with the reason.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedTarget {
    pub file: String,
    pub name: String,
    pub line: u32,
    pub col: u32,
    pub reason: String,
}

/// Annotation result for one file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileAnnotation {
    pub file: String,
    /// The rewritten source. Not serialized; consumers write it to disk or
    /// render a diff instead.
    #[serde(skip)]
    pub new_source: String,
    pub changed: bool,
    pub variables_annotated: usize,
    pub functions_annotated: usize,
    pub edits: Vec<OutputEdit>,
    pub skipped: Vec<SkippedTarget>,
    /// SHA-256 of the rewritten content.
    pub content_hash: ContentHash,
}

/// A file that failed analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileFailure {
    pub file: String,
    pub error: String,
}

/// Result of annotating a batch of files.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnnotateBatch {
    pub files: Vec<FileAnnotation>,
    pub failures: Vec<FileFailure>,
}

impl AnnotateBatch {
    /// Total edits across all files.
    pub fn edit_count(&self) -> usize {
        self.files.iter().map(|f| f.edits.len()).sum()
    }

    /// True when no file changed.
    pub fn is_clean(&self) -> bool {
        self.files.iter().all(|f| !f.changed)
    }
}

/// Errors that can occur during the annotate operation.
#[derive(Debug, Error)]
pub enum AnnotateError {
    /// Source failed to parse.
    #[error("parse error in {file}: {message}")]
    Parse { file: String, message: String },

    /// The computed edit set failed to apply (an internal invariant broke).
    #[error("failed to apply edits to {file}: {message}")]
    Apply { file: String, message: String },

    /// File collection failed.
    #[error(transparent)]
    File(#[from] FileError),
}

// ============================================================================
// Entry points
// ============================================================================

/// Annotate one file's source, returning the rewritten text and edit report.
pub fn annotate_source(
    file: &str,
    source: &str,
    options: &AnnotateOptions,
) -> Result<FileAnnotation, AnnotateError> {
    let module = parse_module(source).map_err(|err| parse_failure(file, source, &err))?;

    let targets = TargetCollector::collect(&module);
    let scopes = ScopeIndex::build(&module);
    let functions = FunctionCollector::collect(&module);
    let type_comments = TypeCommentCollector::collect(source);
    let discovery = DiscoveryContext {
        source,
        scopes: &scopes,
        functions: &functions,
        type_comments: &type_comments,
    };

    let stub = StubOracle;
    let literal = LiteralOracle;
    let oracle: &dyn TypeOracle = match options.oracle {
        OracleKind::Stub => &stub,
        OracleKind::Infer => &literal,
    };
    let eval = EvalContext::new(file, source);
    let synthesizer = Synthesizer::new(source, options.level, oracle, eval);

    let mut editor = BatchSpanEditor::new(source);
    let mut skipped: Vec<SkippedTarget> = Vec::new();
    let mut variables_annotated = 0usize;
    let mut functions_annotated = 0usize;

    // Anchors already claimed by an earlier target in this invocation; a
    // later target redirecting to the same site must not annotate it twice.
    let mut used_inline_anchors: HashSet<usize> = HashSet::new();
    let mut used_comment_positions: HashSet<usize> = HashSet::new();
    let mut used_declarations: HashSet<(usize, String)> = HashSet::new();

    if options.annotate_variables {
        let suitable = find_suitable_targets(&targets, &discovery);
        debug!(file, candidates = suitable.len(), "variable discovery");
        for target in suitable {
            let class_defs = if is_instance_attribute(target, &discovery) {
                find_class_level_definitions(target, &discovery)
            } else {
                Vec::new()
            };
            let redirect = class_defs.first().copied();

            match synthesizer.variable_edits(target, redirect) {
                Ok(result) => {
                    let mut added = false;
                    for edit in result.edits {
                        let fresh = match &edit {
                            EditPrimitive::InsertAfter { anchor_span, .. } => {
                                used_inline_anchors.insert(anchor_span.end)
                            }
                            EditPrimitive::InsertAt { position, .. } => {
                                used_comment_positions.insert(*position)
                            }
                            EditPrimitive::InsertBefore { anchor_span, text } => {
                                used_declarations.insert((anchor_span.start, text.clone()))
                            }
                            _ => true,
                        };
                        if fresh {
                            editor.add(edit);
                            added = true;
                        }
                    }
                    if added {
                        variables_annotated += 1;
                    }
                }
                Err(err) => {
                    debug!(file, target = %target.name, %err, "variable target skipped");
                    skipped.push(skipped_target(file, source, &target.name, target.name_span.start, err.to_string()));
                }
            }
        }
    }

    if options.annotate_functions {
        for func in &functions {
            if is_fully_annotated(func, &discovery) {
                debug!(file, function = %func.node.name, "already fully annotated");
                continue;
            }
            let result = synthesizer.function_edits(func);
            if !result.edits.is_empty() {
                functions_annotated += 1;
            }
            for edit in result.edits {
                editor.add(edit);
            }
            for slot in result.skipped {
                let SkippedSlot {
                    name,
                    offset,
                    reason,
                } = slot;
                debug!(file, slot = %name, %reason, "signature slot skipped");
                skipped.push(skipped_target(file, source, &name, offset, reason));
            }
        }
    }

    let edits = materialize_edits(file, source, editor.edits());
    let new_source = editor.apply().map_err(|err| AnnotateError::Apply {
        file: file.to_string(),
        message: err.to_string(),
    })?;
    let changed = new_source != source;
    let content_hash = ContentHash::compute(new_source.as_bytes());

    info!(
        file,
        variables = variables_annotated,
        functions = functions_annotated,
        edits = edits.len(),
        skipped = skipped.len(),
        "annotate"
    );

    Ok(FileAnnotation {
        file: file.to_string(),
        new_source,
        changed,
        variables_annotated,
        functions_annotated,
        edits,
        skipped,
        content_hash,
    })
}

/// Annotate a batch of files. Per-file failures are collected, never fatal.
pub fn annotate_files(files: &[(String, String)], options: &AnnotateOptions) -> AnnotateBatch {
    let mut batch = AnnotateBatch::default();
    for (file, source) in files {
        match annotate_source(file, source, options) {
            Ok(result) => batch.files.push(result),
            Err(err) => {
                debug!(file, %err, "file failed");
                batch.failures.push(FileFailure {
                    file: file.clone(),
                    error: err.to_string(),
                });
            }
        }
    }
    batch
}

// ============================================================================
// Helpers
// ============================================================================

fn parse_failure(file: &str, source: &str, err: &ParserError) -> AnnotateError {
    let (line, col) = byte_offset_to_position(source.as_bytes(), err.offset());
    AnnotateError::Parse {
        file: file.to_string(),
        message: format!("line {}, column {}: {}", line, col, err),
    }
}

fn skipped_target(
    file: &str,
    source: &str,
    name: &str,
    offset: usize,
    reason: String,
) -> SkippedTarget {
    let (line, col) = byte_offset_to_position(source.as_bytes(), offset);
    SkippedTarget {
        file: file.to_string(),
        name: name.to_string(),
        line,
        col,
        reason,
    }
}

/// Materialize queued primitives as output edits with line-level context.
fn materialize_edits(file: &str, source: &str, primitives: &[EditPrimitive]) -> Vec<OutputEdit> {
    let mut edits: Vec<OutputEdit> = primitives
        .iter()
        .map(|edit| {
            let point = edit.insertion_point();
            let (line, col) = byte_offset_to_position(source.as_bytes(), point);
            let (region_start, region_end, span) = match edit.replaced_span() {
                Some(span) => (
                    line_start(source, span.start),
                    line_end(source, span.end),
                    span,
                ),
                None => (
                    line_start(source, point),
                    line_end(source, point),
                    Span::new(point, point),
                ),
            };
            let old_text = source[region_start..region_end].to_string();
            let mut new_text = String::new();
            new_text.push_str(&source[region_start..span.start]);
            new_text.push_str(edit.inserted_text());
            new_text.push_str(&source[span.end..region_end]);
            OutputEdit {
                file: file.to_string(),
                span,
                old_text,
                new_text,
                line,
                col,
            }
        })
        .collect();
    edits.sort_by_key(|e| (e.span.start, e.span.end));
    edits
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn annotate(src: &str) -> FileAnnotation {
        annotate_source("test.py", src, &AnnotateOptions::default()).expect("annotate")
    }

    fn annotate_with(src: &str, options: &AnnotateOptions) -> FileAnnotation {
        annotate_source("test.py", src, options).expect("annotate")
    }

    #[test]
    fn annotates_variable_and_function() {
        let result = annotate("x = 1\n\ndef f(a):\n    return a\n");
        assert!(result.changed);
        assert_eq!(result.variables_annotated, 1);
        assert_eq!(result.functions_annotated, 1);
        assert_eq!(
            result.new_source,
            "x: Any = 1\n\ndef f(a: Any) -> Any:\n    return a\n"
        );
    }

    #[test]
    fn annotate_is_idempotent() {
        let src = "x = 1\n\ndef f(a, b=2):\n    return a\n\nclass C:\n    y = 0\n    def m(self):\n        self.y = 1\n        self.z = 2\n";
        let first = annotate(src);
        assert!(first.changed);
        let second = annotate(&first.new_source);
        assert!(!second.changed, "second run must not produce edits:\n{}", second.new_source);
        assert!(second.edits.is_empty());
    }

    #[test]
    fn instance_attribute_prefers_class_level_definition() {
        let src = "class C:\n    x = None\n    def m(self):\n        self.x = 1\n";
        let result = annotate(src);
        assert_eq!(
            result.new_source,
            "class C:\n    x: Any = None\n    def m(self) -> Any:\n        self.x = 1\n"
        );
    }

    #[test]
    fn instance_attribute_without_class_level_definition_annotates_usage() {
        let options = AnnotateOptions {
            annotate_functions: false,
            ..AnnotateOptions::default()
        };
        let src = "class C:\n    def m(self):\n        self.x = 0\n";
        let result = annotate_with(src, &options);
        assert_eq!(
            result.new_source,
            "class C:\n    def m(self):\n        self.x: Any = 0\n"
        );
    }

    #[test]
    fn tuple_targets_declare_each_name_once() {
        let options = AnnotateOptions {
            annotate_functions: false,
            oracle: OracleKind::Infer,
            ..AnnotateOptions::default()
        };
        let result = annotate_with("a, b = 1, 'x'\n", &options);
        assert_eq!(result.new_source, "a: int\nb: str\na, b = 1, 'x'\n");
        assert_eq!(result.variables_annotated, 2);
    }

    #[test]
    fn legacy_tuple_comment_emitted_once() {
        let options = AnnotateOptions {
            level: PythonLevel::PY27,
            annotate_functions: false,
            oracle: OracleKind::Infer,
            ..AnnotateOptions::default()
        };
        let result = annotate_with("a, b = 1, 'x'\n", &options);
        assert_eq!(result.new_source, "a, b = 1, 'x'  # type: (int, str)\n");
        // Both targets are candidates but share one comment.
        assert_eq!(result.edits.len(), 1);
    }

    #[test]
    fn incompatible_target_skipped_others_annotated() {
        let options = AnnotateOptions {
            annotate_functions: false,
            oracle: OracleKind::Infer,
            ..AnnotateOptions::default()
        };
        let src = "callback = lambda: 1\nvalue = 2\n";
        let result = annotate_with(src, &options);
        assert_eq!(result.new_source, "callback = lambda: 1\nvalue: int = 2\n");
        assert_eq!(result.skipped.len(), 1);
        assert_eq!(result.skipped[0].name, "callback");
    }

    #[test]
    fn parse_error_reports_location() {
        let err = annotate_source("bad.py", "def f(:\n", &AnnotateOptions::default()).unwrap_err();
        match err {
            AnnotateError::Parse { file, message } => {
                assert_eq!(file, "bad.py");
                assert!(message.contains("line 1"));
            }
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn batch_collects_failures() {
        let files = vec![
            ("good.py".to_string(), "x = 1\n".to_string()),
            ("bad.py".to_string(), "def f(:\n".to_string()),
        ];
        let batch = annotate_files(&files, &AnnotateOptions::default());
        assert_eq!(batch.files.len(), 1);
        assert_eq!(batch.failures.len(), 1);
        assert_eq!(batch.failures[0].file, "bad.py");
    }

    #[test]
    fn output_edits_carry_line_context() {
        let result = annotate("x = 1\n");
        assert_eq!(result.edits.len(), 1);
        let edit = &result.edits[0];
        assert_eq!(edit.line, 1);
        assert_eq!(edit.old_text, "x = 1");
        assert_eq!(edit.new_text, "x: Any = 1");
    }

    #[test]
    fn unchanged_file_reports_clean() {
        let src = "x: int = 1\n\ndef f(a: int) -> int:\n    return a\n";
        let result = annotate(src);
        assert!(!result.changed);
        assert!(result.edits.is_empty());
        assert_eq!(result.new_source, src);
    }

    #[test]
    fn variables_only_mode() {
        let options = AnnotateOptions {
            annotate_functions: false,
            ..AnnotateOptions::default()
        };
        let result = annotate_with("x = 1\n\ndef f(a):\n    return a\n", &options);
        assert_eq!(result.functions_annotated, 0);
        assert!(result.new_source.contains("x: Any = 1"));
        assert!(result.new_source.contains("def f(a):"));
    }

    #[test]
    fn functions_only_mode() {
        let options = AnnotateOptions {
            annotate_variables: false,
            ..AnnotateOptions::default()
        };
        let result = annotate_with("x = 1\n\ndef f(a):\n    return a\n", &options);
        assert_eq!(result.variables_annotated, 0);
        assert!(result.new_source.contains("x = 1"));
        assert!(result.new_source.contains("def f(a: Any) -> Any:"));
    }

    #[test]
    fn infer_oracle_on_functions() {
        let options = AnnotateOptions {
            oracle: OracleKind::Infer,
            annotate_variables: false,
            ..AnnotateOptions::default()
        };
        let result = annotate_with("def f(a, b=1):\n    return 'done'\n", &options);
        assert_eq!(
            result.new_source,
            "def f(a: Any, b: int = 1) -> str:\n    return 'done'\n"
        );
    }

    #[test]
    fn content_hash_matches_new_source() {
        let result = annotate("x = 1\n");
        assert_eq!(
            result.content_hash,
            ContentHash::compute(result.new_source.as_bytes())
        );
    }
}
