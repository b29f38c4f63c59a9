//! Annotation synthesis: turning discovered targets into text edits.
//!
//! Synthesis never mutates anything itself; it produces [`EditPrimitive`]s
//! for the batch editor, all computed against the original source snapshot.
//!
//! Variable targets get one of three shapes:
//!
//! - inline annotation at the usage site (`x: int = 1`) for a simple
//!   single-target assignment under modern syntax,
//! - a standalone declaration line (`x: int`) before the owning statement for
//!   targets that cannot carry an inline annotation (tuple elements, loop and
//!   `with` bindings, chained assignments, walrus targets),
//! - a legacy `# type:` comment on the owning statement when the language
//!   level predates variable annotations, with composite patterns rendered as
//!   `(T1, T2)` and a sub-range recorded per leaf.
//!
//! Instance attributes prefer an existing class-level definition of the same
//! attribute (the `redirect` binding) over the usage site.
//!
//! Function signatures get a return annotation (replacing an existing one in
//! place, otherwise inserted before the header colon) and per-parameter
//! re-declarations applied in reverse declaration order, so an edit never
//! shifts the span of a parameter that has not been processed yet.

use thiserror::Error;

use hinttool_core::span::Span;
use hinttool_core::text::{extract_span_str, line_end, line_indentation};
use hinttool_python_ast::nodes::{Expression, ParamKind};
use hinttool_python_ast::visitor::{
    EditPrimitive, FunctionInfo, ScopedBinding, TargetContext, TargetInfo,
};

use crate::level::PythonLevel;
use crate::oracle::{
    check_compatibility, destructure, AnnotationSyntax, EvalContext, Inferred,
    IncompatibleTypeError, TypeOracle, ANY,
};

/// The synthesized annotation artifact: the annotation text plus, for
/// composite targets and signature comments, a `(type, sub-range)` pair per
/// typed leaf. Sub-ranges index into `annotation`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationInfo {
    pub annotation: String,
    pub types: Vec<String>,
    pub type_spans: Vec<Span>,
}

impl AnnotationInfo {
    fn single(annotation: String) -> Self {
        let span = Span::new(0, annotation.len());
        AnnotationInfo {
            types: vec![annotation.clone()],
            type_spans: vec![span],
            annotation,
        }
    }
}

/// A recoverable per-target synthesis failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SynthesisError {
    /// The inferred type cannot be rendered in the active annotation syntax.
    #[error(transparent)]
    Incompatible(#[from] IncompatibleTypeError),

    /// The target's shape does not admit the required edit.
    #[error("{0}")]
    Unsupported(&'static str),
}

/// A signature slot that was skipped while the rest of the function was
/// still annotated.
#[derive(Debug, Clone)]
pub struct SkippedSlot {
    pub name: String,
    pub offset: usize,
    pub reason: String,
}

/// Result of variable-target synthesis.
#[derive(Debug, Clone)]
pub struct VariableSynthesis {
    pub edits: Vec<EditPrimitive>,
    pub info: AnnotationInfo,
}

/// Result of function-signature synthesis.
#[derive(Debug, Clone)]
pub struct FunctionSynthesis {
    pub edits: Vec<EditPrimitive>,
    pub info: Option<AnnotationInfo>,
    pub skipped: Vec<SkippedSlot>,
}

/// Builds annotation edits for one file.
pub struct Synthesizer<'a> {
    pub source: &'a str,
    pub level: PythonLevel,
    pub oracle: &'a dyn TypeOracle,
    pub eval: EvalContext<'a>,
}

impl<'a> Synthesizer<'a> {
    pub fn new(
        source: &'a str,
        level: PythonLevel,
        oracle: &'a dyn TypeOracle,
        eval: EvalContext<'a>,
    ) -> Self {
        Synthesizer {
            source,
            level,
            oracle,
            eval,
        }
    }

    // ------------------------------------------------------------------
    // Variables
    // ------------------------------------------------------------------

    /// Compute the edits annotating one variable target.
    ///
    /// When `redirect` is given, the annotation is applied to that
    /// class-level definition instead of the usage site.
    pub fn variable_edits(
        &self,
        target: &TargetInfo<'_>,
        redirect: Option<&ScopedBinding>,
    ) -> Result<VariableSynthesis, SynthesisError> {
        if self.level.supports_variable_annotations() {
            self.variable_inline(target, redirect)
        } else {
            self.variable_comment(target, redirect)
        }
    }

    fn variable_inline(
        &self,
        target: &TargetInfo<'_>,
        redirect: Option<&ScopedBinding>,
    ) -> Result<VariableSynthesis, SynthesisError> {
        let rendered = self.oracle.infer_target(&self.eval, target).render_or_any();
        check_compatibility(&rendered, AnnotationSyntax::Inline)?;

        if let Some(binding) = redirect {
            if !self.followed_by_assignment(binding.name_span.end) {
                return Err(SynthesisError::Unsupported(
                    "class-level definition cannot carry an inline annotation",
                ));
            }
            let edit = EditPrimitive::InsertAfter {
                anchor_span: binding.name_span,
                text: format!(": {}", rendered),
            };
            return Ok(VariableSynthesis {
                edits: vec![edit],
                info: AnnotationInfo::single(rendered),
            });
        }

        let inline_ok = !target.in_composite()
            && target.target_count == 1
            && matches!(
                target.context,
                TargetContext::Assign | TargetContext::AnnAssign
            );
        let edit = if inline_ok {
            EditPrimitive::InsertAfter {
                anchor_span: target.span,
                text: format!(": {}", rendered),
            }
        } else {
            // Standalone declaration line before the owning statement.
            let decl_name = extract_span_str(self.source, &target.span)
                .ok_or_else(|| SynthesisError::Unsupported("target span out of bounds"))?;
            let indent = line_indentation(self.source, target.stmt_span.start);
            EditPrimitive::InsertBefore {
                anchor_span: target.stmt_span,
                text: format!("{}: {}\n{}", decl_name, rendered, indent),
            }
        };
        Ok(VariableSynthesis {
            edits: vec![edit],
            info: AnnotationInfo::single(rendered),
        })
    }

    fn variable_comment(
        &self,
        target: &TargetInfo<'_>,
        redirect: Option<&ScopedBinding>,
    ) -> Result<VariableSynthesis, SynthesisError> {
        let info = match target.pattern_root {
            Some(root) => {
                let mut builder = String::new();
                let mut types = Vec::new();
                let mut spans = Vec::new();
                let mut path = Vec::new();
                self.nested_hint(
                    root,
                    target.assigned_value,
                    &mut path,
                    &mut builder,
                    &mut types,
                    &mut spans,
                )?;
                AnnotationInfo {
                    annotation: builder,
                    types,
                    type_spans: spans,
                }
            }
            None => {
                let rendered = self.oracle.infer_target(&self.eval, target).render_or_any();
                check_compatibility(&rendered, AnnotationSyntax::Comment)?;
                AnnotationInfo::single(rendered)
            }
        };

        let mut anchor = match redirect {
            Some(binding) => line_end(self.source, binding.name_span.end),
            None => line_end(self.source, target.comment_anchor),
        };
        // Stay before a CR in CRLF sources.
        if anchor > 0 && self.source.as_bytes()[anchor - 1] == b'\r' {
            anchor -= 1;
        }
        let edit = EditPrimitive::InsertAt {
            position: anchor,
            text: format!("  # type: {}", info.annotation),
        };
        Ok(VariableSynthesis {
            edits: vec![edit],
            info,
        })
    }

    /// Recursive nested-hint builder for composite patterns.
    ///
    /// Parenthesized patterns recurse into their contents; tuples and lists
    /// join their elements with `, ` inside literal parentheses; each typed
    /// leaf records a `(type, sub-range)` pair. Non-typed sub-nodes (stars)
    /// contribute nothing but keep their structural position.
    fn nested_hint(
        &self,
        pattern: &Expression,
        value: Option<&Expression>,
        path: &mut Vec<usize>,
        builder: &mut String,
        types: &mut Vec<String>,
        spans: &mut Vec<Span>,
    ) -> Result<(), SynthesisError> {
        match pattern {
            Expression::Paren(paren) => {
                if let Some(inner) = &paren.inner {
                    self.nested_hint(inner, value, path, builder, types, spans)?;
                }
                Ok(())
            }
            Expression::Tuple(tuple) => {
                self.nested_hint_elements(&tuple.elements, value, path, builder, types, spans)
            }
            Expression::List(list) => {
                self.nested_hint_elements(&list.elements, value, path, builder, types, spans)
            }
            Expression::Name(_) | Expression::Attribute(_) => {
                let leaf = value.and_then(|v| destructure(v, path));
                let rendered = match leaf {
                    Some(expr) => self.oracle.infer_expression(&self.eval, expr).render_or_any(),
                    None => ANY.to_string(),
                };
                check_compatibility(&rendered, AnnotationSyntax::Comment)?;
                let start = builder.len();
                spans.push(Span::new(start, start + rendered.len()));
                builder.push_str(&rendered);
                types.push(rendered);
                Ok(())
            }
            // Stars and any other non-typed sub-node contribute nothing.
            _ => Ok(()),
        }
    }

    fn nested_hint_elements(
        &self,
        elements: &[Expression],
        value: Option<&Expression>,
        path: &mut Vec<usize>,
        builder: &mut String,
        types: &mut Vec<String>,
        spans: &mut Vec<Span>,
    ) -> Result<(), SynthesisError> {
        builder.push('(');
        for (i, element) in elements.iter().enumerate() {
            if i > 0 {
                builder.push_str(", ");
            }
            path.push(i);
            let result = self.nested_hint(element, value, path, builder, types, spans);
            path.pop();
            result?;
        }
        builder.push(')');
        Ok(())
    }

    /// True when the next non-space character after `offset` starts an `=`
    /// assignment, so an inline `: T` insertion stays syntactically valid.
    fn followed_by_assignment(&self, offset: usize) -> bool {
        let rest = self.source[offset.min(self.source.len())..].trim_start();
        rest.starts_with('=') && !rest.starts_with("==")
    }

    // ------------------------------------------------------------------
    // Functions
    // ------------------------------------------------------------------

    /// Compute the edits annotating one function signature.
    ///
    /// Individual slot failures are recorded and skipped; they never abort
    /// the remaining slots or other functions.
    pub fn function_edits(&self, func: &FunctionInfo<'_>) -> FunctionSynthesis {
        if self.level.supports_function_annotations() {
            self.function_inline(func)
        } else {
            self.function_comment(func)
        }
    }

    fn function_inline(&self, func: &FunctionInfo<'_>) -> FunctionSynthesis {
        let mut edits = Vec::new();
        let mut skipped = Vec::new();
        let node = func.node;

        let rendered = self.oracle.infer_return(&self.eval, node).render_or_any();
        match check_compatibility(&rendered, AnnotationSyntax::Inline) {
            Ok(()) => match &node.returns {
                Some(ann) => edits.push(EditPrimitive::Replace {
                    span: Span::new(ann.arrow_span.start, ann.expr.span().end),
                    new_text: format!("-> {}", rendered),
                }),
                None => edits.push(EditPrimitive::InsertAt {
                    position: node.colon_span.start,
                    text: format!(" -> {}", rendered),
                }),
            },
            Err(err) => skipped.push(SkippedSlot {
                name: format!("{}()", node.name),
                offset: node.colon_span.start,
                reason: err.to_string(),
            }),
        }

        let implicit = func.has_implicit_first_param();
        for (i, param) in node.params.params.iter().enumerate().rev() {
            if matches!(param.kind, ParamKind::SlashMarker | ParamKind::StarMarker) {
                continue;
            }
            if i == 0 && implicit {
                continue;
            }
            if param.annotation.is_some() {
                continue;
            }
            let rendered = self
                .oracle
                .infer_parameter(&self.eval, param)
                .render_or_any();
            if let Err(err) = check_compatibility(&rendered, AnnotationSyntax::Inline) {
                skipped.push(SkippedSlot {
                    name: param.name.clone(),
                    offset: param.name_span.start,
                    reason: err.to_string(),
                });
                continue;
            }
            let prefix = match param.kind {
                ParamKind::Star => "*",
                ParamKind::StarStar => "**",
                _ => "",
            };
            let mut new_text = format!("{}{}: {}", prefix, param.name, rendered);
            if let Some(default) = &param.default {
                let span = default.span();
                if let Some(default_text) = extract_span_str(self.source, &span) {
                    new_text.push_str(" = ");
                    new_text.push_str(default_text);
                }
            }
            edits.push(EditPrimitive::Replace {
                span: param.span,
                new_text,
            });
        }

        FunctionSynthesis {
            edits,
            info: None,
            skipped,
        }
    }

    fn function_comment(&self, func: &FunctionInfo<'_>) -> FunctionSynthesis {
        let node = func.node;
        let Some(first_stmt) = node.body.first() else {
            return FunctionSynthesis {
                edits: Vec::new(),
                info: None,
                skipped: vec![SkippedSlot {
                    name: format!("{}()", node.name),
                    offset: node.colon_span.start,
                    reason: "function has no body to anchor a signature comment".to_string(),
                }],
            };
        };
        let body_start = first_stmt.span().start;
        // An inline suite shares the header line; there is no line to carry
        // the signature comment.
        let header_line_end = line_end(self.source, node.colon_span.start);
        if body_start < header_line_end {
            return FunctionSynthesis {
                edits: Vec::new(),
                info: None,
                skipped: vec![SkippedSlot {
                    name: format!("{}()", node.name),
                    offset: node.colon_span.start,
                    reason: "single-line function body cannot carry a signature comment"
                        .to_string(),
                }],
            };
        }

        let implicit = func.has_implicit_first_param();
        let mut builder = String::from("# type: (");
        let mut types = Vec::new();
        let mut spans = Vec::new();
        let mut first = true;
        for (i, param) in node.params.params.iter().enumerate() {
            if matches!(param.kind, ParamKind::SlashMarker | ParamKind::StarMarker) {
                continue;
            }
            if i == 0 && implicit {
                continue;
            }
            let rendered = match &param.annotation {
                Some(ann) => {
                    let span = ann.span();
                    extract_span_str(self.source, &span)
                        .unwrap_or(ANY)
                        .to_string()
                }
                None => self
                    .oracle
                    .infer_parameter(&self.eval, param)
                    .render_or_any(),
            };
            if let Err(err) = check_compatibility(&rendered, AnnotationSyntax::Comment) {
                return FunctionSynthesis {
                    edits: Vec::new(),
                    info: None,
                    skipped: vec![SkippedSlot {
                        name: param.name.clone(),
                        offset: param.name_span.start,
                        reason: err.to_string(),
                    }],
                };
            }
            if !first {
                builder.push_str(", ");
            }
            first = false;
            let prefix = match param.kind {
                ParamKind::Star => "*",
                ParamKind::StarStar => "**",
                _ => "",
            };
            builder.push_str(prefix);
            let start = builder.len();
            spans.push(Span::new(start, start + rendered.len()));
            builder.push_str(&rendered);
            types.push(rendered);
        }
        builder.push_str(") -> ");

        let ret = match self.oracle.infer_return(&self.eval, node) {
            Inferred::Known(t) => t.render().to_string(),
            Inferred::Unknown => ANY.to_string(),
        };
        if let Err(err) = check_compatibility(&ret, AnnotationSyntax::Comment) {
            return FunctionSynthesis {
                edits: Vec::new(),
                info: None,
                skipped: vec![SkippedSlot {
                    name: format!("{}()", node.name),
                    offset: node.colon_span.start,
                    reason: err.to_string(),
                }],
            };
        }
        let start = builder.len();
        spans.push(Span::new(start, start + ret.len()));
        builder.push_str(&ret);
        types.push(ret);

        let indent = line_indentation(self.source, body_start);
        let edit = EditPrimitive::InsertAt {
            position: body_start,
            text: format!("{}\n{}", builder, indent),
        };
        FunctionSynthesis {
            edits: vec![edit],
            info: Some(AnnotationInfo {
                annotation: builder,
                types,
                type_spans: spans,
            }),
            skipped: Vec::new(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::{LiteralOracle, StubOracle};
    use hinttool_python_ast::parse_module;
    use hinttool_python_ast::visitor::{BatchSpanEditor, FunctionCollector, TargetCollector};

    fn apply_variable(src: &str, level: PythonLevel, name: &str) -> String {
        let module = parse_module(src).expect("parse error");
        let targets = TargetCollector::collect(&module);
        let target = targets.iter().find(|t| t.name == name).expect("target");
        let eval = EvalContext::new("test.py", src);
        let oracle = LiteralOracle;
        let synth = Synthesizer::new(src, level, &oracle, eval);
        let result = synth.variable_edits(target, None).expect("synthesis");
        let mut editor = BatchSpanEditor::new(src);
        for edit in result.edits {
            editor.add(edit);
        }
        editor.apply().expect("apply")
    }

    #[test]
    fn inline_simple_assignment() {
        assert_eq!(
            apply_variable("x = 1\n", PythonLevel::default(), "x"),
            "x: int = 1\n"
        );
    }

    #[test]
    fn inline_unknown_gets_any() {
        assert_eq!(
            apply_variable("x = compute()\n", PythonLevel::default(), "x"),
            "x: Any = compute()\n"
        );
    }

    #[test]
    fn tuple_element_gets_standalone_declaration() {
        assert_eq!(
            apply_variable("a, b = 1, 'x'\n", PythonLevel::default(), "a"),
            "a: int\na, b = 1, 'x'\n"
        );
    }

    #[test]
    fn standalone_declaration_keeps_indentation() {
        let src = "def f():\n    a, b = 1, 2\n";
        let out = apply_variable(src, PythonLevel::default(), "b");
        assert_eq!(out, "def f():\n    b: int\n    a, b = 1, 2\n");
    }

    #[test]
    fn for_target_gets_standalone_declaration() {
        let out = apply_variable("for i in xs:\n    pass\n", PythonLevel::default(), "i");
        assert_eq!(out, "i: Any\nfor i in xs:\n    pass\n");
    }

    #[test]
    fn chained_assignment_gets_standalone_declaration() {
        let out = apply_variable("a = b = 1\n", PythonLevel::default(), "a");
        assert_eq!(out, "a: int\na = b = 1\n");
    }

    #[test]
    fn legacy_comment_simple() {
        assert_eq!(
            apply_variable("x = 1\n", PythonLevel::PY27, "x"),
            "x = 1  # type: int\n"
        );
    }

    #[test]
    fn legacy_comment_for_header() {
        assert_eq!(
            apply_variable("for i in xs:\n    pass\n", PythonLevel::PY27, "i"),
            "for i in xs:  # type: Any\n    pass\n"
        );
    }

    #[test]
    fn legacy_tuple_hint_records_subranges() {
        let src = "(a, b) = f()\n";
        let module = parse_module(src).expect("parse error");
        let targets = TargetCollector::collect(&module);
        let eval = EvalContext::new("test.py", src);
        let oracle = StubOracle;
        let synth = Synthesizer::new(src, PythonLevel::PY27, &oracle, eval);
        let result = synth
            .variable_edits(&targets[0], None)
            .expect("synthesis");
        assert_eq!(result.info.annotation, "(Any, Any)");
        assert_eq!(result.info.types, vec!["Any", "Any"]);
        assert_eq!(result.info.type_spans.len(), 2);
        for (ty, span) in result.info.types.iter().zip(&result.info.type_spans) {
            assert_eq!(span.len(), ty.len());
            assert_eq!(&result.info.annotation[span.start..span.end], ty);
        }
    }

    #[test]
    fn legacy_nested_tuple_hint() {
        let src = "(a, (b, c)) = f()\n";
        let module = parse_module(src).expect("parse error");
        let targets = TargetCollector::collect(&module);
        let eval = EvalContext::new("test.py", src);
        let oracle = StubOracle;
        let synth = Synthesizer::new(src, PythonLevel::PY27, &oracle, eval);
        let result = synth.variable_edits(&targets[0], None).expect("synthesis");
        assert_eq!(result.info.annotation, "(Any, (Any, Any))");
    }

    #[test]
    fn legacy_tuple_hint_with_known_types() {
        let src = "a, b = 1, 'x'\n";
        let module = parse_module(src).expect("parse error");
        let targets = TargetCollector::collect(&module);
        let eval = EvalContext::new("test.py", src);
        let oracle = LiteralOracle;
        let synth = Synthesizer::new(src, PythonLevel::PY27, &oracle, eval);
        let result = synth.variable_edits(&targets[0], None).expect("synthesis");
        assert_eq!(result.info.annotation, "(int, str)");
    }

    #[test]
    fn union_type_rejected_in_legacy_comment() {
        let src = "x = 1 if p else 'a'\n";
        let module = parse_module(src).expect("parse error");
        let targets = TargetCollector::collect(&module);
        let eval = EvalContext::new("test.py", src);
        let oracle = LiteralOracle;
        let synth = Synthesizer::new(src, PythonLevel::PY27, &oracle, eval);
        let err = synth.variable_edits(&targets[0], None).unwrap_err();
        assert!(matches!(err, SynthesisError::Incompatible(_)));
    }

    #[test]
    fn lambda_type_rejected_inline() {
        let src = "x = lambda: 1\n";
        let module = parse_module(src).expect("parse error");
        let targets = TargetCollector::collect(&module);
        let eval = EvalContext::new("test.py", src);
        let oracle = LiteralOracle;
        let synth = Synthesizer::new(src, PythonLevel::default(), &oracle, eval);
        let err = synth.variable_edits(&targets[0], None).unwrap_err();
        assert!(matches!(err, SynthesisError::Incompatible(_)));
    }

    fn apply_function(src: &str, level: PythonLevel) -> (String, FunctionSynthesis) {
        let module = parse_module(src).expect("parse error");
        let functions = FunctionCollector::collect(&module);
        let eval = EvalContext::new("test.py", src);
        let oracle = StubOracle;
        let synth = Synthesizer::new(src, level, &oracle, eval);
        let result = synth.function_edits(&functions[0]);
        let mut editor = BatchSpanEditor::new(src);
        for edit in result.edits.clone() {
            editor.add(edit);
        }
        (editor.apply().expect("apply"), result)
    }

    #[test]
    fn function_params_and_return_annotated() {
        let (out, _) = apply_function("def f(a, b=1):\n    pass\n", PythonLevel::default());
        assert_eq!(out, "def f(a: Any, b: Any = 1) -> Any:\n    pass\n");
    }

    #[test]
    fn method_self_is_never_annotated() {
        let src = "class C:\n    def m(self, a, b=1):\n        pass\n";
        let module = parse_module(src).expect("parse error");
        let functions = FunctionCollector::collect(&module);
        let eval = EvalContext::new("test.py", src);
        let oracle = StubOracle;
        let synth = Synthesizer::new(src, PythonLevel::default(), &oracle, eval);
        let result = synth.function_edits(&functions[0]);
        let mut editor = BatchSpanEditor::new(src);
        for edit in result.edits {
            editor.add(edit);
        }
        let out = editor.apply().expect("apply");
        assert_eq!(
            out,
            "class C:\n    def m(self, a: Any, b: Any = 1) -> Any:\n        pass\n"
        );
    }

    #[test]
    fn existing_return_annotation_is_replaced() {
        let (out, _) = apply_function("def f(a) -> int:\n    pass\n", PythonLevel::default());
        assert_eq!(out, "def f(a: Any) -> Any:\n    pass\n");
    }

    #[test]
    fn annotated_params_are_skipped() {
        let (out, _) = apply_function("def f(a: int, b):\n    pass\n", PythonLevel::default());
        assert_eq!(out, "def f(a: int, b: Any) -> Any:\n    pass\n");
    }

    #[test]
    fn star_params_keep_prefixes() {
        let (out, _) = apply_function("def f(a, *args, **kwargs):\n    pass\n", PythonLevel::default());
        assert_eq!(
            out,
            "def f(a: Any, *args: Any, **kwargs: Any) -> Any:\n    pass\n"
        );
    }

    #[test]
    fn marker_params_are_untouched() {
        let (out, _) = apply_function("def f(a, /, b, *, c):\n    pass\n", PythonLevel::default());
        assert_eq!(out, "def f(a: Any, /, b: Any, *, c: Any) -> Any:\n    pass\n");
    }

    #[test]
    fn reverse_order_keeps_param_spans_valid() {
        let (_, result) = apply_function("def f(a, b, c):\n    pass\n", PythonLevel::default());
        let param_edits: Vec<usize> = result
            .edits
            .iter()
            .filter_map(|e| match e {
                EditPrimitive::Replace { span, .. } => Some(span.start),
                _ => None,
            })
            .collect();
        let mut sorted = param_edits.clone();
        sorted.sort_by(|x, y| y.cmp(x));
        assert_eq!(param_edits, sorted, "parameters must be processed right to left");
    }

    #[test]
    fn legacy_signature_comment() {
        let (out, result) = apply_function("def f(a, b=1):\n    return 1\n", PythonLevel::PY27);
        assert_eq!(
            out,
            "def f(a, b=1):\n    # type: (Any, Any) -> Any\n    return 1\n"
        );
        let info = result.info.expect("info");
        assert_eq!(info.types.len(), 3);
        for (ty, span) in info.types.iter().zip(&info.type_spans) {
            assert_eq!(&info.annotation[span.start..span.end], ty);
        }
    }

    #[test]
    fn legacy_signature_comment_omits_self() {
        let src = "class C:\n    def m(self, a):\n        return a\n";
        let module = parse_module(src).expect("parse error");
        let functions = FunctionCollector::collect(&module);
        let eval = EvalContext::new("test.py", src);
        let oracle = StubOracle;
        let synth = Synthesizer::new(src, PythonLevel::PY27, &oracle, eval);
        let result = synth.function_edits(&functions[0]);
        let info = result.info.expect("info");
        assert_eq!(info.annotation, "# type: (Any) -> Any");
    }

    #[test]
    fn single_line_function_skipped_in_legacy_mode() {
        let (out, result) = apply_function("def f(a): return a\n", PythonLevel::PY27);
        assert_eq!(out, "def f(a): return a\n");
        assert_eq!(result.skipped.len(), 1);
    }

    #[test]
    fn legacy_keeps_existing_param_annotation_text() {
        let (out, _) = apply_function("def f(a, b):\n    return b\n", PythonLevel::PY27);
        assert!(out.contains("# type: (Any, Any) -> Any"));
    }
}
