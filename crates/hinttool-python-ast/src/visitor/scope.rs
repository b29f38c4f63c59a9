// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Scope collection for Python source.
//!
//! [`ScopeIndex`] records every scope in a module (module, class, function,
//! lambda, comprehension) together with the names bound directly in it. It
//! answers the two questions annotation discovery needs:
//!
//! - which scope does a given source offset belong to (`scope_at`), and
//! - which same-named sibling bindings exist in a scope (`named_bindings`),
//!   including whether any of them already carries an inline annotation.
//!
//! Module-scope bindings double as the "top-level attributes" view and
//! class-scope bindings as the "class attributes" view used by the
//! already-annotated check.

use hinttool_core::span::Span;

use crate::nodes::{
    AnnAssign, Assign, ClassDef, Comp, Comprehension, DictComp, ExceptHandler, Expression, For,
    FunctionDef, Import, ImportFrom, Lambda, Module, NamedExpr, Param, WithItem,
};
use crate::visitor::dispatch::walk_module;
use crate::visitor::traits::{VisitResult, Visitor};

/// Identifier of a scope within one [`ScopeIndex`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(pub usize);

/// The kind of scope in Python.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeKind {
    /// Module-level scope (top-level of a file).
    Module,
    /// Class body scope.
    Class,
    /// Function or method body scope.
    Function,
    /// Lambda expression scope.
    Lambda,
    /// Comprehension scope (list/set/dict comp, generator expression).
    Comprehension,
}

impl ScopeKind {
    /// Returns the string representation used in output.
    pub fn as_str(&self) -> &'static str {
        match self {
            ScopeKind::Module => "module",
            ScopeKind::Class => "class",
            ScopeKind::Function => "function",
            ScopeKind::Lambda => "lambda",
            ScopeKind::Comprehension => "comprehension",
        }
    }
}

impl std::fmt::Display for ScopeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The kind of binding in Python.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingKind {
    /// Function definition (`def foo():`).
    Function,
    /// Class definition (`class Foo:`).
    Class,
    /// Function or lambda parameter.
    Parameter,
    /// Variable binding target (assignment, loop, with, walrus, except-as).
    Variable,
    /// Import statement (`import foo`).
    Import,
    /// Import alias (`import foo as bar`, `from x import y as z`).
    ImportAlias,
}

impl BindingKind {
    /// Returns the string representation used in output.
    pub fn as_str(&self) -> &'static str {
        match self {
            BindingKind::Function => "function",
            BindingKind::Class => "class",
            BindingKind::Parameter => "parameter",
            BindingKind::Variable => "variable",
            BindingKind::Import => "import",
            BindingKind::ImportAlias => "import_alias",
        }
    }
}

impl std::fmt::Display for BindingKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A name bound directly in a scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopedBinding {
    /// The bound name.
    pub name: String,
    /// Span of the name token at the binding site.
    pub name_span: Span,
    /// What kind of binding this is.
    pub kind: BindingKind,
    /// True when the binding site carries an inline annotation
    /// (`x: int = ...` targets and annotated parameters).
    pub has_inline_annotation: bool,
}

/// One scope with the names bound in it.
#[derive(Debug, Clone)]
pub struct ScopeInfo {
    pub id: ScopeId,
    pub kind: ScopeKind,
    /// Function or class name for named scopes.
    pub name: Option<String>,
    pub parent: Option<ScopeId>,
    /// Source span covered by the scope.
    pub span: Span,
    /// Names bound directly in this scope, in source order.
    pub bindings: Vec<ScopedBinding>,
}

/// All scopes of a module, indexed for containment and name lookups.
#[derive(Debug, Clone)]
pub struct ScopeIndex {
    scopes: Vec<ScopeInfo>,
}

impl ScopeIndex {
    /// Build the scope index for a parsed module.
    pub fn build(module: &Module) -> ScopeIndex {
        let mut collector = ScopeCollector {
            scopes: vec![ScopeInfo {
                id: ScopeId(0),
                kind: ScopeKind::Module,
                name: None,
                parent: None,
                span: module.span,
                bindings: Vec::new(),
            }],
            stack: vec![ScopeId(0)],
        };
        walk_module(&mut collector, module);
        ScopeIndex {
            scopes: collector.scopes,
        }
    }

    /// The module scope.
    pub fn module_scope(&self) -> ScopeId {
        ScopeId(0)
    }

    /// Look up a scope by id.
    pub fn get(&self, id: ScopeId) -> &ScopeInfo {
        &self.scopes[id.0]
    }

    /// All scopes, in creation (pre-order traversal) order.
    pub fn scopes(&self) -> &[ScopeInfo] {
        &self.scopes
    }

    /// The innermost scope whose span contains `offset`.
    pub fn scope_at(&self, offset: usize) -> ScopeId {
        let mut best = ScopeId(0);
        let mut best_len = usize::MAX;
        for scope in &self.scopes {
            if scope.span.start <= offset && offset < scope.span.end.max(scope.span.start + 1) {
                let len = scope.span.len();
                if len < best_len {
                    best = scope.id;
                    best_len = len;
                }
            }
        }
        best
    }

    /// Bindings of `name` made directly in the given scope.
    pub fn named_bindings<'a>(
        &'a self,
        id: ScopeId,
        name: &'a str,
    ) -> impl Iterator<Item = &'a ScopedBinding> {
        self.get(id).bindings.iter().filter(move |b| b.name == name)
    }

    /// The class scope created by the class definition with the given span.
    pub fn class_scope_with_span(&self, span: Span) -> Option<ScopeId> {
        self.scopes
            .iter()
            .find(|s| s.kind == ScopeKind::Class && s.span == span)
            .map(|s| s.id)
    }
}

// ============================================================================
// Collector
// ============================================================================

struct ScopeCollector {
    scopes: Vec<ScopeInfo>,
    stack: Vec<ScopeId>,
}

impl ScopeCollector {
    fn current(&self) -> ScopeId {
        *self.stack.last().unwrap_or(&ScopeId(0))
    }

    fn push_scope(&mut self, kind: ScopeKind, name: Option<String>, span: Span) {
        let id = ScopeId(self.scopes.len());
        let parent = Some(self.current());
        self.scopes.push(ScopeInfo {
            id,
            kind,
            name,
            parent,
            span,
            bindings: Vec::new(),
        });
        self.stack.push(id);
    }

    fn pop_scope(&mut self) {
        if self.stack.len() > 1 {
            self.stack.pop();
        }
    }

    fn bind(&mut self, name: &str, name_span: Span, kind: BindingKind, annotated: bool) {
        let current = self.current();
        self.scopes[current.0].bindings.push(ScopedBinding {
            name: name.to_string(),
            name_span,
            kind,
            has_inline_annotation: annotated,
        });
    }

    /// Bind every plain name in a target pattern (tuples, lists, parens and
    /// stars are transparent; qualified targets bind nothing).
    fn bind_pattern(&mut self, target: &Expression, annotated: bool) {
        match target {
            Expression::Name(name) => {
                self.bind(&name.value, name.span, BindingKind::Variable, annotated)
            }
            Expression::Tuple(tuple) => {
                for element in &tuple.elements {
                    self.bind_pattern(element, annotated);
                }
            }
            Expression::List(list) => {
                for element in &list.elements {
                    self.bind_pattern(element, annotated);
                }
            }
            Expression::Paren(paren) => {
                if let Some(inner) = &paren.inner {
                    self.bind_pattern(inner, annotated);
                }
            }
            Expression::Starred(starred) => self.bind_pattern(&starred.value, annotated),
            _ => {}
        }
    }
}

impl Visitor for ScopeCollector {
    fn visit_function_def(&mut self, node: &FunctionDef) -> VisitResult {
        self.bind(&node.name, node.name_span, BindingKind::Function, false);
        self.push_scope(ScopeKind::Function, Some(node.name.clone()), node.span);
        VisitResult::Continue
    }

    fn leave_function_def(&mut self, _node: &FunctionDef) {
        self.pop_scope();
    }

    fn visit_class_def(&mut self, node: &ClassDef) -> VisitResult {
        self.bind(&node.name, node.name_span, BindingKind::Class, false);
        self.push_scope(ScopeKind::Class, Some(node.name.clone()), node.span);
        VisitResult::Continue
    }

    fn leave_class_def(&mut self, _node: &ClassDef) {
        self.pop_scope();
    }

    fn visit_lambda(&mut self, node: &Lambda) -> VisitResult {
        self.push_scope(ScopeKind::Lambda, None, node.span);
        VisitResult::Continue
    }

    fn leave_lambda(&mut self, _node: &Lambda) {
        self.pop_scope();
    }

    fn visit_comp(&mut self, node: &Comp) -> VisitResult {
        self.push_scope(ScopeKind::Comprehension, None, node.span);
        VisitResult::Continue
    }

    fn leave_comp(&mut self, _node: &Comp) {
        self.pop_scope();
    }

    fn visit_dict_comp(&mut self, node: &DictComp) -> VisitResult {
        self.push_scope(ScopeKind::Comprehension, None, node.span);
        VisitResult::Continue
    }

    fn leave_dict_comp(&mut self, _node: &DictComp) {
        self.pop_scope();
    }

    fn visit_param(&mut self, node: &Param) -> VisitResult {
        use crate::nodes::ParamKind;
        if !matches!(node.kind, ParamKind::SlashMarker | ParamKind::StarMarker) {
            self.bind(
                &node.name,
                node.name_span,
                BindingKind::Parameter,
                node.annotation.is_some(),
            );
        }
        VisitResult::Continue
    }

    fn visit_assign(&mut self, node: &Assign) -> VisitResult {
        for target in &node.targets {
            self.bind_pattern(target, false);
        }
        VisitResult::Continue
    }

    fn visit_ann_assign(&mut self, node: &AnnAssign) -> VisitResult {
        self.bind_pattern(&node.target, true);
        VisitResult::Continue
    }

    fn visit_for(&mut self, node: &For) -> VisitResult {
        self.bind_pattern(&node.target, false);
        VisitResult::Continue
    }

    fn visit_with_item(&mut self, node: &WithItem) -> VisitResult {
        if let Some(target) = &node.target {
            self.bind_pattern(target, false);
        }
        VisitResult::Continue
    }

    fn visit_named_expr(&mut self, node: &NamedExpr) -> VisitResult {
        self.bind(
            &node.target.value,
            node.target.span,
            BindingKind::Variable,
            false,
        );
        VisitResult::Continue
    }

    fn visit_comprehension(&mut self, node: &Comprehension) -> VisitResult {
        self.bind_pattern(&node.target, false);
        VisitResult::Continue
    }

    fn visit_except_handler(&mut self, node: &ExceptHandler) -> VisitResult {
        if let Some(name) = &node.name {
            self.bind(&name.name, name.span, BindingKind::Variable, false);
        }
        VisitResult::Continue
    }

    fn visit_import(&mut self, node: &Import) -> VisitResult {
        for alias in &node.names {
            match &alias.asname {
                Some(asname) => {
                    self.bind(&asname.name, asname.span, BindingKind::ImportAlias, false)
                }
                None => {
                    // `import a.b` binds `a`.
                    let first = alias.name.split('.').next().unwrap_or(&alias.name);
                    self.bind(first, alias.name_span, BindingKind::Import, false);
                }
            }
        }
        VisitResult::Continue
    }

    fn visit_import_from(&mut self, node: &ImportFrom) -> VisitResult {
        for alias in &node.names {
            match &alias.asname {
                Some(asname) => {
                    self.bind(&asname.name, asname.span, BindingKind::ImportAlias, false)
                }
                None => self.bind(&alias.name, alias.name_span, BindingKind::Import, false),
            }
        }
        VisitResult::Continue
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn index(src: &str) -> ScopeIndex {
        ScopeIndex::build(&parse(src).expect("parse error"))
    }

    #[test]
    fn module_scope_bindings() {
        let idx = index("x = 1\ny: int = 2\n");
        let module = idx.get(idx.module_scope());
        assert_eq!(module.kind, ScopeKind::Module);
        let names: Vec<&str> = module.bindings.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["x", "y"]);
        assert!(!module.bindings[0].has_inline_annotation);
        assert!(module.bindings[1].has_inline_annotation);
    }

    #[test]
    fn function_scope_contains_params_and_locals() {
        let src = "def f(a, b=1):\n    c = a\n";
        let idx = index(src);
        let func = idx
            .scopes()
            .iter()
            .find(|s| s.kind == ScopeKind::Function)
            .expect("function scope");
        let names: Vec<&str> = func.bindings.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert_eq!(func.bindings[0].kind, BindingKind::Parameter);
        assert_eq!(func.bindings[2].kind, BindingKind::Variable);
    }

    #[test]
    fn class_scope_has_class_attributes() {
        let src = "class C:\n    x = None\n    y: int = 0\n    def m(self):\n        pass\n";
        let idx = index(src);
        let class = idx
            .scopes()
            .iter()
            .find(|s| s.kind == ScopeKind::Class)
            .expect("class scope");
        let names: Vec<&str> = class.bindings.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["x", "y", "m"]);
        assert!(class.bindings[1].has_inline_annotation);
        assert_eq!(class.bindings[2].kind, BindingKind::Function);
    }

    #[test]
    fn scope_at_finds_innermost() {
        let src = "x = 1\ndef f():\n    y = 2\n";
        let idx = index(src);
        let x_offset = src.find("x =").expect("x");
        let y_offset = src.find("y =").expect("y");
        assert_eq!(idx.get(idx.scope_at(x_offset)).kind, ScopeKind::Module);
        assert_eq!(idx.get(idx.scope_at(y_offset)).kind, ScopeKind::Function);
    }

    #[test]
    fn scope_at_class_body_vs_method() {
        let src = "class C:\n    attr = 1\n    def m(self):\n        local = 2\n";
        let idx = index(src);
        let attr_offset = src.find("attr").expect("attr");
        let local_offset = src.find("local").expect("local");
        assert_eq!(idx.get(idx.scope_at(attr_offset)).kind, ScopeKind::Class);
        assert_eq!(idx.get(idx.scope_at(local_offset)).kind, ScopeKind::Function);
    }

    #[test]
    fn named_bindings_filters_by_name() {
        let idx = index("x = 1\nx: int = 2\ny = 3\n");
        let hits: Vec<_> = idx.named_bindings(idx.module_scope(), "x").collect();
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().any(|b| b.has_inline_annotation));
    }

    #[test]
    fn tuple_targets_bind_each_name() {
        let idx = index("a, (b, c) = f()\n");
        let names: Vec<&str> = idx
            .get(idx.module_scope())
            .bindings
            .iter()
            .map(|b| b.name.as_str())
            .collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn comprehension_gets_own_scope() {
        let src = "xs = [i for i in ys]\n";
        let idx = index(src);
        let comp = idx
            .scopes()
            .iter()
            .find(|s| s.kind == ScopeKind::Comprehension)
            .expect("comprehension scope");
        assert_eq!(comp.bindings.len(), 1);
        assert_eq!(comp.bindings[0].name, "i");
    }

    #[test]
    fn imports_bind_names() {
        let idx = index("import os.path\nimport json as j\nfrom sys import argv\n");
        let names: Vec<&str> = idx
            .get(idx.module_scope())
            .bindings
            .iter()
            .map(|b| b.name.as_str())
            .collect();
        assert_eq!(names, vec!["os", "j", "argv"]);
    }

    #[test]
    fn walrus_binds_in_enclosing_scope() {
        let idx = index("y = (n := 10)\n");
        let names: Vec<&str> = idx
            .get(idx.module_scope())
            .bindings
            .iter()
            .map(|b| b.name.as_str())
            .collect();
        assert!(names.contains(&"n"));
    }

    #[test]
    fn class_scope_lookup_by_span() {
        let src = "class C:\n    x = 1\n";
        let module = parse(src).expect("parse error");
        let idx = ScopeIndex::build(&module);
        let class_span = module.body[0].span();
        let id = idx.class_scope_with_span(class_span).expect("class scope");
        assert_eq!(idx.get(id).name.as_deref(), Some("C"));
    }
}
