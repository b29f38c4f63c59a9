// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Binding-target collection for annotation discovery.
//!
//! [`TargetCollector`] walks a module and records every syntactic position
//! where a name receives a value: assignment targets (including nested tuple
//! and list patterns), loop variables, `with ... as` bindings, walrus targets,
//! import elements, comprehension loop variables, `global`/`nonlocal` names
//! and `except ... as` names. Each occurrence carries its syntactic context so
//! downstream filtering can decide which targets are annotatable at all.
//!
//! Unlike the scope collector this walker keeps references into the AST
//! (the assigned value expression, the enclosing composite pattern), which the
//! type oracle needs for literal-level inference, so it is written as a direct
//! recursive walk rather than a [`Visitor`](crate::visitor::Visitor).

use hinttool_core::span::Span;

use crate::nodes::{Comprehension, Expression, Module, Statement};

/// The syntactic context a binding target appears in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetContext {
    /// Target of a plain assignment statement.
    Assign,
    /// Target of an annotated assignment (`x: int = ...`).
    AnnAssign,
    /// Target of an augmented assignment (`x += ...`).
    AugAssign,
    /// Loop variable in a `for` statement header.
    For,
    /// `with ... as` binding.
    WithItem,
    /// Walrus operator target (`(x := ...)`).
    NamedExpr,
    /// Name bound by an `import` statement.
    ImportElement,
    /// Loop variable of a comprehension `for` clause.
    ComprehensionFor,
    /// Name listed in a `global` statement.
    GlobalDecl,
    /// Name listed in a `nonlocal` statement.
    NonlocalDecl,
    /// `except ... as` name.
    ExceptAs,
}

impl TargetContext {
    /// Returns the string representation used in output.
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetContext::Assign => "assign",
            TargetContext::AnnAssign => "ann_assign",
            TargetContext::AugAssign => "aug_assign",
            TargetContext::For => "for",
            TargetContext::WithItem => "with_item",
            TargetContext::NamedExpr => "named_expr",
            TargetContext::ImportElement => "import",
            TargetContext::ComprehensionFor => "comprehension_for",
            TargetContext::GlobalDecl => "global",
            TargetContext::NonlocalDecl => "nonlocal",
            TargetContext::ExceptAs => "except_as",
        }
    }
}

impl std::fmt::Display for TargetContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One binding-target occurrence.
#[derive(Debug, Clone)]
pub struct TargetInfo<'a> {
    /// The bound name (`x` for both `x` and `self.x`).
    pub name: String,
    /// Span of the full target expression (`self.x` including the qualifier).
    pub span: Span,
    /// Span of the bound name token only.
    pub name_span: Span,
    /// Simple qualifier name when the target is `qualifier.attr`.
    pub qualifier: Option<String>,
    /// True for attribute targets (`anything.x`).
    pub is_qualified: bool,
    /// Syntactic context of the occurrence.
    pub context: TargetContext,
    /// True when the target carries its own inline annotation (`x: int = ...`).
    pub has_own_annotation: bool,
    /// Span of the owning statement.
    pub stmt_span: Span,
    /// Offset a legacy type comment for this statement anchors to: the header
    /// colon for `for`/`with`, the end of the statement otherwise.
    pub comment_anchor: usize,
    /// The assigned value expression, when the statement has one.
    pub assigned_value: Option<&'a Expression>,
    /// The outermost composite pattern this target sits in, if any.
    pub pattern_root: Option<&'a Expression>,
    /// Element indices leading from the pattern root to this target.
    pub tuple_path: Vec<usize>,
    /// Number of `=`-chained top-level targets in the owning assignment.
    pub target_count: usize,
    /// For walrus targets: whether an assignment/`for`/`with` statement
    /// encloses the expression.
    pub has_binding_ancestor: bool,
}

impl TargetInfo<'_> {
    /// True when this target is an element of a composite pattern.
    pub fn in_composite(&self) -> bool {
        self.pattern_root.is_some()
    }
}

/// Collects every binding-target occurrence in a module.
pub struct TargetCollector<'a> {
    targets: Vec<TargetInfo<'a>>,
    stmt_spans: Vec<Span>,
    binding_stmt_depth: usize,
}

/// Shared per-statement fields for the targets being collected.
#[derive(Clone, Copy)]
struct StatementContext<'a> {
    context: TargetContext,
    stmt_span: Span,
    comment_anchor: usize,
    assigned_value: Option<&'a Expression>,
    target_count: usize,
    has_own_annotation: bool,
}

impl<'a> TargetCollector<'a> {
    /// Collect all binding targets of a module in source order.
    pub fn collect(module: &'a Module) -> Vec<TargetInfo<'a>> {
        let mut collector = TargetCollector {
            targets: Vec::new(),
            stmt_spans: Vec::new(),
            binding_stmt_depth: 0,
        };
        collector.walk_suite(&module.body);
        collector.targets
    }

    fn walk_suite(&mut self, body: &'a [Statement]) {
        for stmt in body {
            self.walk_statement(stmt);
        }
    }

    fn walk_statement(&mut self, stmt: &'a Statement) {
        self.stmt_spans.push(stmt.span());
        self.walk_statement_inner(stmt);
        self.stmt_spans.pop();
    }

    fn walk_statement_inner(&mut self, stmt: &'a Statement) {
        match stmt {
            Statement::Assign(node) => {
                self.binding_stmt_depth += 1;
                let base = StatementContext {
                    context: TargetContext::Assign,
                    stmt_span: node.span,
                    comment_anchor: node.span.end,
                    assigned_value: Some(&node.value),
                    target_count: node.targets.len(),
                    has_own_annotation: false,
                };
                for target in &node.targets {
                    self.collect_target(target, base);
                }
                self.walk_expression(&node.value);
                self.binding_stmt_depth -= 1;
            }
            Statement::AnnAssign(node) => {
                self.binding_stmt_depth += 1;
                let base = StatementContext {
                    context: TargetContext::AnnAssign,
                    stmt_span: node.span,
                    comment_anchor: node.span.end,
                    assigned_value: node.value.as_ref(),
                    target_count: 1,
                    has_own_annotation: true,
                };
                self.collect_target(&node.target, base);
                if let Some(value) = &node.value {
                    self.walk_expression(value);
                }
                self.binding_stmt_depth -= 1;
            }
            Statement::AugAssign(node) => {
                let base = StatementContext {
                    context: TargetContext::AugAssign,
                    stmt_span: node.span,
                    comment_anchor: node.span.end,
                    assigned_value: Some(&node.value),
                    target_count: 1,
                    has_own_annotation: false,
                };
                self.collect_target(&node.target, base);
                self.walk_expression(&node.value);
            }
            Statement::For(node) => {
                self.binding_stmt_depth += 1;
                let base = StatementContext {
                    context: TargetContext::For,
                    stmt_span: node.span,
                    comment_anchor: node.colon_span.start,
                    assigned_value: None,
                    target_count: 1,
                    has_own_annotation: false,
                };
                self.collect_target(&node.target, base);
                self.walk_expression(&node.iter);
                self.walk_suite(&node.body);
                self.walk_suite(&node.orelse);
                self.binding_stmt_depth -= 1;
            }
            Statement::With(node) => {
                self.binding_stmt_depth += 1;
                for item in &node.items {
                    self.walk_expression(&item.context);
                    if let Some(target) = &item.target {
                        let base = StatementContext {
                            context: TargetContext::WithItem,
                            stmt_span: node.span,
                            comment_anchor: node.colon_span.start,
                            assigned_value: None,
                            target_count: 1,
                            has_own_annotation: false,
                        };
                        self.collect_target(target, base);
                    }
                }
                self.walk_suite(&node.body);
                self.binding_stmt_depth -= 1;
            }
            Statement::FunctionDef(node) => {
                for dec in &node.decorators {
                    self.walk_expression(&dec.expr);
                }
                for param in &node.params.params {
                    if let Some(annotation) = &param.annotation {
                        self.walk_expression(annotation);
                    }
                    if let Some(default) = &param.default {
                        self.walk_expression(default);
                    }
                }
                if let Some(returns) = &node.returns {
                    self.walk_expression(&returns.expr);
                }
                self.walk_suite(&node.body);
            }
            Statement::ClassDef(node) => {
                for dec in &node.decorators {
                    self.walk_expression(&dec.expr);
                }
                for base in &node.bases {
                    self.walk_expression(base);
                }
                self.walk_suite(&node.body);
            }
            Statement::If(node) => {
                self.walk_expression(&node.test);
                self.walk_suite(&node.body);
                self.walk_suite(&node.orelse);
            }
            Statement::While(node) => {
                self.walk_expression(&node.test);
                self.walk_suite(&node.body);
                self.walk_suite(&node.orelse);
            }
            Statement::Try(node) => {
                self.walk_suite(&node.body);
                for handler in &node.handlers {
                    if let Some(typ) = &handler.typ {
                        self.walk_expression(typ);
                    }
                    if let Some(name) = &handler.name {
                        self.push_simple(
                            name.name.clone(),
                            name.span,
                            TargetContext::ExceptAs,
                            handler.span,
                        );
                    }
                    self.walk_suite(&handler.body);
                }
                self.walk_suite(&node.orelse);
                self.walk_suite(&node.finalbody);
            }
            Statement::Import(node) => {
                for alias in &node.names {
                    let (name, span) = match &alias.asname {
                        Some(asname) => (asname.name.clone(), asname.span),
                        None => (alias.name.clone(), alias.name_span),
                    };
                    self.push_simple(name, span, TargetContext::ImportElement, node.span);
                }
            }
            Statement::ImportFrom(node) => {
                for alias in &node.names {
                    let (name, span) = match &alias.asname {
                        Some(asname) => (asname.name.clone(), asname.span),
                        None => (alias.name.clone(), alias.name_span),
                    };
                    self.push_simple(name, span, TargetContext::ImportElement, node.span);
                }
            }
            Statement::Global(node) => {
                for name in &node.names {
                    self.push_simple(
                        name.name.clone(),
                        name.span,
                        TargetContext::GlobalDecl,
                        node.span,
                    );
                }
            }
            Statement::Nonlocal(node) => {
                for name in &node.names {
                    self.push_simple(
                        name.name.clone(),
                        name.span,
                        TargetContext::NonlocalDecl,
                        node.span,
                    );
                }
            }
            Statement::Return(node) => {
                if let Some(value) = &node.value {
                    self.walk_expression(value);
                }
            }
            Statement::Raise(node) => {
                if let Some(exc) = &node.exc {
                    self.walk_expression(exc);
                }
                if let Some(cause) = &node.cause {
                    self.walk_expression(cause);
                }
            }
            Statement::Assert(node) => {
                self.walk_expression(&node.test);
                if let Some(msg) = &node.msg {
                    self.walk_expression(msg);
                }
            }
            Statement::Del(node) => {
                for target in &node.targets {
                    self.walk_expression(target);
                }
            }
            Statement::Expr(node) => self.walk_expression(&node.value),
            Statement::Pass(_) | Statement::Break(_) | Statement::Continue(_) => {}
        }
    }

    /// A binding occurrence with no pattern structure (imports, declarations).
    fn push_simple(&mut self, name: String, span: Span, context: TargetContext, stmt_span: Span) {
        self.targets.push(TargetInfo {
            name,
            span,
            name_span: span,
            qualifier: None,
            is_qualified: false,
            context,
            has_own_annotation: false,
            stmt_span,
            comment_anchor: stmt_span.end,
            assigned_value: None,
            pattern_root: None,
            tuple_path: Vec::new(),
            target_count: 1,
            has_binding_ancestor: self.binding_stmt_depth > 0,
        });
    }

    /// Collect all leaves of one top-level target pattern.
    fn collect_target(&mut self, target: &'a Expression, base: StatementContext<'a>) {
        let root = if is_composite(target) {
            Some(target)
        } else {
            None
        };
        let mut path = Vec::new();
        self.collect_pattern(target, root, &mut path, base);
    }

    fn collect_pattern(
        &mut self,
        expr: &'a Expression,
        root: Option<&'a Expression>,
        path: &mut Vec<usize>,
        base: StatementContext<'a>,
    ) {
        match expr {
            Expression::Name(name) => {
                self.targets.push(TargetInfo {
                    name: name.value.clone(),
                    span: name.span,
                    name_span: name.span,
                    qualifier: None,
                    is_qualified: false,
                    context: base.context,
                    has_own_annotation: base.has_own_annotation,
                    stmt_span: base.stmt_span,
                    comment_anchor: base.comment_anchor,
                    assigned_value: base.assigned_value,
                    pattern_root: root,
                    tuple_path: path.clone(),
                    target_count: base.target_count,
                    has_binding_ancestor: self.binding_stmt_depth > 0,
                });
            }
            Expression::Attribute(attr) => {
                let qualifier = match &attr.value {
                    Expression::Name(base_name) => Some(base_name.value.clone()),
                    _ => None,
                };
                self.targets.push(TargetInfo {
                    name: attr.attr.clone(),
                    span: attr.span,
                    name_span: attr.attr_span,
                    qualifier,
                    is_qualified: true,
                    context: base.context,
                    has_own_annotation: base.has_own_annotation,
                    stmt_span: base.stmt_span,
                    comment_anchor: base.comment_anchor,
                    assigned_value: base.assigned_value,
                    pattern_root: root,
                    tuple_path: path.clone(),
                    target_count: base.target_count,
                    has_binding_ancestor: self.binding_stmt_depth > 0,
                });
            }
            Expression::Tuple(tuple) => {
                for (i, element) in tuple.elements.iter().enumerate() {
                    path.push(i);
                    self.collect_pattern(element, root, path, base);
                    path.pop();
                }
            }
            Expression::List(list) => {
                for (i, element) in list.elements.iter().enumerate() {
                    path.push(i);
                    self.collect_pattern(element, root, path, base);
                    path.pop();
                }
            }
            Expression::Paren(paren) => {
                if let Some(inner) = &paren.inner {
                    self.collect_pattern(inner, root, path, base);
                }
            }
            Expression::Starred(starred) => {
                self.collect_pattern(&starred.value, root, path, base);
            }
            // Subscript targets and anything else are not annotatable names.
            _ => {}
        }
    }

    /// Walk a non-target expression, collecting walrus targets and
    /// comprehension loop variables.
    fn walk_expression(&mut self, expr: &'a Expression) {
        match expr {
            Expression::NamedExpr(node) => {
                let stmt_span = self
                    .stmt_spans
                    .last()
                    .copied()
                    .unwrap_or_else(|| expr.span());
                self.targets.push(TargetInfo {
                    name: node.target.value.clone(),
                    span: node.target.span,
                    name_span: node.target.span,
                    qualifier: None,
                    is_qualified: false,
                    context: TargetContext::NamedExpr,
                    has_own_annotation: false,
                    stmt_span,
                    comment_anchor: stmt_span.end,
                    assigned_value: Some(&node.value),
                    pattern_root: None,
                    tuple_path: Vec::new(),
                    target_count: 1,
                    has_binding_ancestor: self.binding_stmt_depth > 0,
                });
                self.walk_expression(&node.value);
            }
            Expression::ListComp(node)
            | Expression::SetComp(node)
            | Expression::GeneratorExp(node) => {
                self.walk_comprehensions(&node.generators);
                self.walk_expression(&node.element);
            }
            Expression::DictComp(node) => {
                self.walk_comprehensions(&node.generators);
                self.walk_expression(&node.key);
                self.walk_expression(&node.value);
            }
            Expression::Lambda(node) => {
                for param in &node.params.params {
                    if let Some(default) = &param.default {
                        self.walk_expression(default);
                    }
                }
                self.walk_expression(&node.body);
            }
            Expression::Attribute(node) => self.walk_expression(&node.value),
            Expression::Subscript(node) => {
                self.walk_expression(&node.value);
                for slice in &node.slices {
                    self.walk_expression(slice);
                }
            }
            Expression::Call(node) => {
                self.walk_expression(&node.func);
                for arg in &node.args {
                    self.walk_expression(&arg.value);
                }
            }
            Expression::Tuple(node) => {
                for element in &node.elements {
                    self.walk_expression(element);
                }
            }
            Expression::List(node) => {
                for element in &node.elements {
                    self.walk_expression(element);
                }
            }
            Expression::Set(node) => {
                for element in &node.elements {
                    self.walk_expression(element);
                }
            }
            Expression::Dict(node) => {
                for item in &node.items {
                    if let Some(key) = &item.key {
                        self.walk_expression(key);
                    }
                    self.walk_expression(&item.value);
                }
            }
            Expression::Paren(node) => {
                if let Some(inner) = &node.inner {
                    self.walk_expression(inner);
                }
            }
            Expression::Starred(node) => self.walk_expression(&node.value),
            Expression::IfExp(node) => {
                self.walk_expression(&node.body);
                self.walk_expression(&node.test);
                self.walk_expression(&node.orelse);
            }
            Expression::BinaryOp(node) => {
                self.walk_expression(&node.left);
                self.walk_expression(&node.right);
            }
            Expression::UnaryOp(node) => self.walk_expression(&node.operand),
            Expression::BoolOp(node) => {
                for value in &node.values {
                    self.walk_expression(value);
                }
            }
            Expression::Compare(node) => {
                self.walk_expression(&node.left);
                for (_, right) in &node.comparisons {
                    self.walk_expression(right);
                }
            }
            Expression::Await(node) => self.walk_expression(&node.value),
            Expression::Yield(node) => {
                if let Some(value) = &node.value {
                    self.walk_expression(value);
                }
            }
            Expression::Slice(node) => {
                for part in [&node.lower, &node.upper, &node.step].into_iter().flatten() {
                    self.walk_expression(part);
                }
            }
            Expression::Name(_)
            | Expression::Int(_)
            | Expression::Float(_)
            | Expression::Imaginary(_)
            | Expression::Str(_)
            | Expression::Bytes(_)
            | Expression::FString(_)
            | Expression::True(_)
            | Expression::False(_)
            | Expression::NoneLit(_)
            | Expression::Ellipsis(_) => {}
        }
    }

    fn walk_comprehensions(&mut self, generators: &'a [Comprehension]) {
        for gen in generators {
            let base = StatementContext {
                context: TargetContext::ComprehensionFor,
                stmt_span: gen.target.span(),
                comment_anchor: gen.target.span().end,
                assigned_value: None,
                target_count: 1,
                has_own_annotation: false,
            };
            self.collect_target(&gen.target, base);
            self.walk_expression(&gen.iter);
            for cond in &gen.ifs {
                self.walk_expression(cond);
            }
        }
    }
}

fn is_composite(expr: &Expression) -> bool {
    matches!(
        expr,
        Expression::Tuple(_) | Expression::List(_) | Expression::Paren(_) | Expression::Starred(_)
    )
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn collect(src: &str) -> (Module, Vec<String>) {
        let module = parse(src).expect("parse error");
        let names = TargetCollector::collect(&module)
            .iter()
            .map(|t| format!("{}:{}", t.name, t.context))
            .collect();
        (module, names)
    }

    #[test]
    fn simple_assignment_target() {
        let module = parse("x = 1\n").expect("parse error");
        let targets = TargetCollector::collect(&module);
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].name, "x");
        assert_eq!(targets[0].context, TargetContext::Assign);
        assert!(!targets[0].is_qualified);
        assert!(targets[0].assigned_value.is_some());
        assert!(targets[0].pattern_root.is_none());
    }

    #[test]
    fn tuple_targets_have_paths() {
        let module = parse("(a, (b, c)) = f()\n").expect("parse error");
        let targets = TargetCollector::collect(&module);
        let paths: Vec<(String, Vec<usize>)> = targets
            .iter()
            .map(|t| (t.name.clone(), t.tuple_path.clone()))
            .collect();
        assert_eq!(
            paths,
            vec![
                ("a".to_string(), vec![0]),
                ("b".to_string(), vec![1, 0]),
                ("c".to_string(), vec![1, 1]),
            ]
        );
        assert!(targets.iter().all(|t| t.in_composite()));
    }

    #[test]
    fn starred_element_keeps_position() {
        let module = parse("a, *rest = xs\n").expect("parse error");
        let targets = TargetCollector::collect(&module);
        assert_eq!(targets[1].name, "rest");
        assert_eq!(targets[1].tuple_path, vec![1]);
    }

    #[test]
    fn attribute_target_qualifier() {
        let module = parse("self.x = 0\n").expect("parse error");
        let targets = TargetCollector::collect(&module);
        assert_eq!(targets.len(), 1);
        assert!(targets[0].is_qualified);
        assert_eq!(targets[0].qualifier.as_deref(), Some("self"));
        assert_eq!(targets[0].name, "x");
    }

    #[test]
    fn chained_assignment_counts_targets() {
        let module = parse("a = b = 1\n").expect("parse error");
        let targets = TargetCollector::collect(&module);
        assert_eq!(targets.len(), 2);
        assert!(targets.iter().all(|t| t.target_count == 2));
    }

    #[test]
    fn contexts_are_classified() {
        let (_m, names) = collect(
            "import os\nfrom sys import argv\nfor i in xs:\n    pass\nwith open(p) as f:\n    pass\nglobal g\nxs = [i2 for i2 in ys]\nx += 1\ntry:\n    pass\nexcept E as e:\n    pass\n",
        );
        assert!(names.contains(&"os:import".to_string()));
        assert!(names.contains(&"argv:import".to_string()));
        assert!(names.contains(&"i:for".to_string()));
        assert!(names.contains(&"f:with_item".to_string()));
        assert!(names.contains(&"g:global".to_string()));
        assert!(names.contains(&"i2:comprehension_for".to_string()));
        assert!(names.contains(&"x:aug_assign".to_string()));
        assert!(names.contains(&"e:except_as".to_string()));
        assert!(names.contains(&"xs:assign".to_string()));
    }

    #[test]
    fn ann_assign_marks_own_annotation() {
        let module = parse("x: int = 1\n").expect("parse error");
        let targets = TargetCollector::collect(&module);
        assert!(targets[0].has_own_annotation);
        assert_eq!(targets[0].context, TargetContext::AnnAssign);
    }

    #[test]
    fn walrus_inside_assignment_has_binding_ancestor() {
        let module = parse("y = (n := 10)\nif (m := g()):\n    pass\n").expect("parse error");
        let targets = TargetCollector::collect(&module);
        let n = targets.iter().find(|t| t.name == "n").expect("n");
        assert_eq!(n.context, TargetContext::NamedExpr);
        assert!(n.has_binding_ancestor);
        let m = targets.iter().find(|t| t.name == "m").expect("m");
        assert!(!m.has_binding_ancestor);
    }

    #[test]
    fn for_comment_anchor_is_header_colon() {
        let src = "for i in xs:\n    y = i\n";
        let module = parse(src).expect("parse error");
        let targets = TargetCollector::collect(&module);
        let i = targets.iter().find(|t| t.name == "i").expect("i");
        assert_eq!(&src[i.comment_anchor..i.comment_anchor + 1], ":");
    }

    #[test]
    fn nested_function_targets_are_collected() {
        let (_m, names) = collect("def f():\n    local = 1\n    self.attr = 2\n");
        assert!(names.contains(&"local:assign".to_string()));
        assert!(names.contains(&"attr:assign".to_string()));
    }

    #[test]
    fn subscript_target_is_skipped() {
        let module = parse("a[0] = 1\n").expect("parse error");
        let targets = TargetCollector::collect(&module);
        assert!(targets.is_empty());
    }
}
