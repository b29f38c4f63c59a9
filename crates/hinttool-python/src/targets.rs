//! Annotation-target discovery.
//!
//! Given the collected binding targets of a file, this module decides which
//! of them should receive an annotation:
//!
//! 1. the target must be *annotatable*: its syntactic context admits an
//!    annotation at all (imports, comprehension loop variables and
//!    `global`/`nonlocal` names never do), and
//! 2. the target must not already be *annotated*, neither directly, nor via
//!    a same-named sibling binding in its scope, nor (for instance
//!    attributes) via an annotated class-level definition.
//!
//! The sibling rule exists because the language allows re-assigning an
//! unannotated name after an annotated declaration elsewhere in the same
//! scope; the annotation lives at the first declaration.

use hinttool_core::text::byte_offset_to_position;
use hinttool_python_ast::visitor::{
    BindingKind, FunctionInfo, ScopeIndex, ScopedBinding, TargetContext, TargetInfo, TypeComment,
};

/// Everything discovery needs about one file, built once per analysis request.
pub struct DiscoveryContext<'a> {
    pub source: &'a str,
    pub scopes: &'a ScopeIndex,
    pub functions: &'a [FunctionInfo<'a>],
    pub type_comments: &'a [TypeComment],
}

impl DiscoveryContext<'_> {
    fn line_of(&self, offset: usize) -> u32 {
        byte_offset_to_position(self.source.as_bytes(), offset).0
    }

    fn has_type_comment_on_line(&self, line: u32) -> bool {
        self.type_comments.iter().any(|c| c.line == line)
    }
}

/// Whether a target's syntactic context admits an annotation.
///
/// Rejected outright: import elements, comprehension loop variables,
/// `global`/`nonlocal` declarations. Accepted: targets under an assignment
/// statement, a `for` header, or a `with` item; walrus targets only when such
/// a statement encloses them.
pub fn can_be_annotated(target: &TargetInfo<'_>) -> bool {
    match target.context {
        TargetContext::ImportElement
        | TargetContext::ComprehensionFor
        | TargetContext::GlobalDecl
        | TargetContext::NonlocalDecl => false,
        TargetContext::Assign
        | TargetContext::AnnAssign
        | TargetContext::For
        | TargetContext::WithItem => true,
        TargetContext::NamedExpr => target.has_binding_ancestor,
        TargetContext::AugAssign | TargetContext::ExceptAs => false,
    }
}

/// Whether a target already carries an annotation, directly or through a
/// sibling/class-level declaration.
pub fn is_annotated(target: &TargetInfo<'_>, ctx: &DiscoveryContext<'_>) -> bool {
    if target.has_own_annotation {
        return true;
    }
    // A legacy type comment on the owning statement's anchor line.
    if ctx.has_type_comment_on_line(ctx.line_of(target.comment_anchor)) {
        return true;
    }

    if !target.is_qualified {
        let scope = ctx.scopes.scope_at(target.name_span.start);
        for binding in ctx.scopes.named_bindings(scope, &target.name) {
            if binding.kind != BindingKind::Variable {
                continue;
            }
            if binding.has_inline_annotation {
                return true;
            }
            if ctx.has_type_comment_on_line(ctx.line_of(binding.name_span.start)) {
                return true;
            }
        }
        return false;
    }

    if is_instance_attribute(target, ctx) {
        return find_class_level_definitions(target, ctx).iter().any(|b| {
            b.has_inline_annotation
                || ctx.has_type_comment_on_line(ctx.line_of(b.name_span.start))
        });
    }

    false
}

/// The innermost function whose span contains the target.
fn enclosing_function<'b, 'a>(
    target: &TargetInfo<'_>,
    functions: &'b [FunctionInfo<'a>],
) -> Option<&'b FunctionInfo<'a>> {
    functions
        .iter()
        .filter(|f| f.contains(target.name_span.start))
        .min_by_key(|f| f.node.span.len())
}

/// Whether the target is an instance-attribute assignment: `q.attr` inside a
/// method whose implicit first parameter is `q`.
///
/// Qualifiers that do not resolve to the receiver (complex expressions,
/// other names) make this false, which routes the target through default
/// handling instead of failing.
pub fn is_instance_attribute(target: &TargetInfo<'_>, ctx: &DiscoveryContext<'_>) -> bool {
    if !target.is_qualified {
        return false;
    }
    let Some(qualifier) = target.qualifier.as_deref() else {
        return false;
    };
    let Some(func) = enclosing_function(target, ctx.functions) else {
        return false;
    };
    func.is_method && func.implicit_first_param() == Some(qualifier)
}

/// Class-level definitions of an instance attribute's name, in source order.
///
/// Resolution runs against the enclosing class only and requires matches to
/// originate at class scope (plain variable bindings in the class body).
pub fn find_class_level_definitions<'b>(
    target: &'b TargetInfo<'_>,
    ctx: &'b DiscoveryContext<'_>,
) -> Vec<&'b ScopedBinding> {
    let Some(func) = enclosing_function(target, ctx.functions) else {
        return Vec::new();
    };
    let Some(class_span) = func.class_span else {
        return Vec::new();
    };
    let Some(scope) = ctx.scopes.class_scope_with_span(class_span) else {
        return Vec::new();
    };
    ctx.scopes
        .named_bindings(scope, &target.name)
        .filter(|b| b.kind == BindingKind::Variable)
        .collect()
}

/// Discovery: annotatable, not-yet-annotated targets, in source order.
pub fn find_suitable_targets<'b, 'a>(
    targets: &'b [TargetInfo<'a>],
    ctx: &DiscoveryContext<'_>,
) -> Vec<&'b TargetInfo<'a>> {
    targets
        .iter()
        .filter(|t| can_be_annotated(t))
        .filter(|t| !is_annotated(t, ctx))
        .collect()
}

/// Whether every annotation slot of a function is already filled: the return
/// annotation plus every non-implicit named parameter.
pub fn is_fully_annotated(func: &FunctionInfo<'_>, ctx: &DiscoveryContext<'_>) -> bool {
    use hinttool_python_ast::nodes::ParamKind;
    use hinttool_python_ast::visitor::TypeCommentKind;

    // A signature type comment between the header colon and the first body
    // statement annotates the whole signature.
    let body_start = func
        .node
        .body
        .first()
        .map(|s| s.span().start)
        .unwrap_or(func.node.colon_span.end);
    let has_signature_comment = ctx.type_comments.iter().any(|c| {
        c.kind == TypeCommentKind::FunctionSignature
            && c.span.start >= func.node.colon_span.end
            && c.span.start <= body_start
    });
    if has_signature_comment {
        return true;
    }

    if func.node.returns.is_none() {
        return false;
    }
    let implicit = func.has_implicit_first_param();
    func.node.params.params.iter().enumerate().all(|(i, p)| {
        if matches!(p.kind, ParamKind::SlashMarker | ParamKind::StarMarker) {
            return true;
        }
        if i == 0 && implicit {
            return true;
        }
        p.annotation.is_some()
    })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use hinttool_python_ast::visitor::{FunctionCollector, TargetCollector, TypeCommentCollector};
    use hinttool_python_ast::{parse_module, Module};

    struct Analysis<'a> {
        targets: Vec<TargetInfo<'a>>,
        scopes: ScopeIndex,
        functions: Vec<FunctionInfo<'a>>,
        comments: Vec<TypeComment>,
    }

    fn analyze(module: &Module) -> Analysis<'_> {
        Analysis {
            targets: TargetCollector::collect(module),
            scopes: ScopeIndex::build(module),
            functions: FunctionCollector::collect(module),
            comments: Vec::new(),
        }
    }

    fn suitable_names(src: &str) -> Vec<String> {
        let module = parse_module(src).expect("parse error");
        let mut analysis = analyze(&module);
        analysis.comments = TypeCommentCollector::collect(src);
        let ctx = DiscoveryContext {
            source: src,
            scopes: &analysis.scopes,
            functions: &analysis.functions,
            type_comments: &analysis.comments,
        };
        find_suitable_targets(&analysis.targets, &ctx)
            .iter()
            .map(|t| t.name.clone())
            .collect()
    }

    #[test]
    fn plain_assignment_is_suitable() {
        assert_eq!(suitable_names("x = 1\n"), vec!["x"]);
    }

    #[test]
    fn excluded_contexts_are_rejected() {
        let src = "import os\nfrom sys import argv\nfor i in [j for j in xs]:\n    pass\n\ndef f():\n    global g\n    g = 1\n";
        let names = suitable_names(src);
        assert!(!names.contains(&"os".to_string()));
        assert!(!names.contains(&"argv".to_string()));
        assert!(!names.contains(&"j".to_string()), "comprehension target");
        assert!(names.contains(&"i".to_string()), "for target is suitable");
        // `g` is bound under a `global` declaration and also assigned; the
        // assignment target remains suitable, the declaration name does not.
        assert_eq!(names.iter().filter(|n| *n == "g").count(), 1);
    }

    #[test]
    fn own_annotation_excludes_target() {
        assert!(suitable_names("x: int = 1\n").is_empty());
    }

    #[test]
    fn own_type_comment_excludes_target() {
        assert!(suitable_names("x = 1  # type: int\n").is_empty());
        assert!(suitable_names("x = 1  # type: ignore\n").is_empty());
    }

    #[test]
    fn annotated_sibling_excludes_target() {
        // Annotation lives at the first declaration; re-assignment is fine.
        assert!(suitable_names("x: int = 1\nx = 2\n").is_empty());
        assert!(suitable_names("x: int\nx = 2\n").is_empty());
    }

    #[test]
    fn sibling_in_other_scope_does_not_count() {
        let names = suitable_names("x: int = 1\ndef f():\n    x = 2\n");
        assert_eq!(names, vec!["x"], "function-local x shadows module x");
    }

    #[test]
    fn annotated_sibling_in_function_scope() {
        let src = "def f():\n    x: int = 1\n    x = 2\n";
        assert!(suitable_names(src).is_empty());
    }

    #[test]
    fn class_attribute_sibling() {
        let src = "class C:\n    x: int = 0\n    x = 1\n";
        assert!(suitable_names(src).is_empty());
    }

    #[test]
    fn instance_attribute_with_annotated_class_level_def() {
        let src = "class C:\n    x: int = 0\n    def m(self):\n        self.x = 1\n";
        assert!(suitable_names(src).is_empty());
    }

    #[test]
    fn instance_attribute_with_unannotated_class_level_def_is_suitable() {
        let src = "class C:\n    x = None\n    def m(self):\n        self.x = 1\n";
        let names = suitable_names(src);
        // Both the class-level x and the usage-site self.x are candidates.
        assert_eq!(names, vec!["x", "x"]);
    }

    #[test]
    fn non_self_qualifier_is_not_instance_attribute() {
        let src = "class C:\n    def m(self, other):\n        other.x = 1\n";
        let module = parse_module(src).expect("parse error");
        let analysis = analyze(&module);
        let ctx = DiscoveryContext {
            source: src,
            scopes: &analysis.scopes,
            functions: &analysis.functions,
            type_comments: &analysis.comments,
        };
        let target = analysis
            .targets
            .iter()
            .find(|t| t.is_qualified)
            .expect("qualified target");
        assert!(!is_instance_attribute(target, &ctx));
    }

    #[test]
    fn static_method_self_is_not_receiver() {
        let src = "class C:\n    @staticmethod\n    def m(self):\n        self.x = 1\n";
        let module = parse_module(src).expect("parse error");
        let analysis = analyze(&module);
        let ctx = DiscoveryContext {
            source: src,
            scopes: &analysis.scopes,
            functions: &analysis.functions,
            type_comments: &analysis.comments,
        };
        let target = analysis
            .targets
            .iter()
            .find(|t| t.is_qualified)
            .expect("qualified target");
        assert!(!is_instance_attribute(target, &ctx));
    }

    #[test]
    fn aug_assign_is_not_annotatable() {
        assert!(suitable_names("x += 1\n").is_empty());
    }

    #[test]
    fn walrus_needs_binding_ancestor() {
        let names = suitable_names("y = (n := 10)\nif (m := g()):\n    pass\n");
        assert!(names.contains(&"n".to_string()));
        assert!(!names.contains(&"m".to_string()));
    }

    #[test]
    fn with_and_for_targets_are_suitable() {
        let names = suitable_names("with open(p) as f:\n    for k, v in items:\n        pass\n");
        assert_eq!(names, vec!["f", "k", "v"]);
    }

    #[test]
    fn fully_annotated_function_detection() {
        let src = "def a(x: int) -> str:\n    pass\n\ndef b(x: int):\n    pass\n\ndef c(x) -> str:\n    pass\n\nclass C:\n    def m(self, x: int) -> None:\n        pass\n";
        let module = parse_module(src).expect("parse error");
        let analysis = analyze(&module);
        let ctx = DiscoveryContext {
            source: src,
            scopes: &analysis.scopes,
            functions: &analysis.functions,
            type_comments: &analysis.comments,
        };
        let status: Vec<(String, bool)> = analysis
            .functions
            .iter()
            .map(|f| (f.node.name.clone(), is_fully_annotated(f, &ctx)))
            .collect();
        assert_eq!(
            status,
            vec![
                ("a".to_string(), true),
                ("b".to_string(), false),
                ("c".to_string(), false),
                ("m".to_string(), true),
            ]
        );
    }

    #[test]
    fn signature_comment_counts_as_fully_annotated() {
        let src = "def f(a, b):\n    # type: (int, str) -> bool\n    return True\n";
        let module = parse_module(src).expect("parse error");
        let mut analysis = analyze(&module);
        analysis.comments = TypeCommentCollector::collect(src);
        let ctx = DiscoveryContext {
            source: src,
            scopes: &analysis.scopes,
            functions: &analysis.functions,
            type_comments: &analysis.comments,
        };
        assert!(is_fully_annotated(&analysis.functions[0], &ctx));
    }
}
