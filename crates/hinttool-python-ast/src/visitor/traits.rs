// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Visitor trait definitions for AST traversal.

use crate::nodes::{
    AnnAssign, Assign, Attribute, AugAssign, Call, ClassDef, Comp, Comprehension, DictComp,
    ExceptHandler, Expression, For, FunctionDef, Global, Import, ImportFrom, Lambda, Name,
    NamedExpr, Nonlocal, Param, Return, Statement, With, WithItem,
};

/// Result of visiting a node - controls traversal behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VisitResult {
    /// Continue traversal into children. After visiting children, the
    /// matching `leave_*` method is called for scope-introducing nodes.
    #[default]
    Continue,

    /// Skip children, continue with siblings. `leave_*` is still called.
    SkipChildren,

    /// Stop traversal entirely. No further `visit_*` or `leave_*` methods
    /// are called; the walk functions return immediately.
    Stop,
}

/// A visitor over the AST.
///
/// Every method has a default implementation, so implementors override only
/// the hooks they need. The `visit_statement` and `visit_expression` hooks
/// fire for every node of the respective category before the kind-specific
/// hook; returning [`VisitResult::SkipChildren`] from either suppresses both
/// the kind-specific hook and the descent.
#[allow(unused_variables)]
pub trait Visitor {
    // Generic hooks -----------------------------------------------------

    fn visit_statement(&mut self, node: &Statement) -> VisitResult {
        VisitResult::Continue
    }

    fn visit_expression(&mut self, node: &Expression) -> VisitResult {
        VisitResult::Continue
    }

    // Scope-introducing nodes -------------------------------------------

    fn visit_function_def(&mut self, node: &FunctionDef) -> VisitResult {
        VisitResult::Continue
    }

    fn leave_function_def(&mut self, node: &FunctionDef) {}

    fn visit_class_def(&mut self, node: &ClassDef) -> VisitResult {
        VisitResult::Continue
    }

    fn leave_class_def(&mut self, node: &ClassDef) {}

    fn visit_lambda(&mut self, node: &Lambda) -> VisitResult {
        VisitResult::Continue
    }

    fn leave_lambda(&mut self, node: &Lambda) {}

    /// List/set comprehensions and generator expressions.
    fn visit_comp(&mut self, node: &Comp) -> VisitResult {
        VisitResult::Continue
    }

    fn leave_comp(&mut self, node: &Comp) {}

    fn visit_dict_comp(&mut self, node: &DictComp) -> VisitResult {
        VisitResult::Continue
    }

    fn leave_dict_comp(&mut self, node: &DictComp) {}

    // Binding statements ------------------------------------------------

    fn visit_assign(&mut self, node: &Assign) -> VisitResult {
        VisitResult::Continue
    }

    fn visit_ann_assign(&mut self, node: &AnnAssign) -> VisitResult {
        VisitResult::Continue
    }

    fn visit_aug_assign(&mut self, node: &AugAssign) -> VisitResult {
        VisitResult::Continue
    }

    fn visit_for(&mut self, node: &For) -> VisitResult {
        VisitResult::Continue
    }

    fn visit_with(&mut self, node: &With) -> VisitResult {
        VisitResult::Continue
    }

    fn visit_with_item(&mut self, node: &WithItem) -> VisitResult {
        VisitResult::Continue
    }

    fn visit_import(&mut self, node: &Import) -> VisitResult {
        VisitResult::Continue
    }

    fn visit_import_from(&mut self, node: &ImportFrom) -> VisitResult {
        VisitResult::Continue
    }

    fn visit_global(&mut self, node: &Global) -> VisitResult {
        VisitResult::Continue
    }

    fn visit_nonlocal(&mut self, node: &Nonlocal) -> VisitResult {
        VisitResult::Continue
    }

    fn visit_return(&mut self, node: &Return) -> VisitResult {
        VisitResult::Continue
    }

    fn visit_except_handler(&mut self, node: &ExceptHandler) -> VisitResult {
        VisitResult::Continue
    }

    /// One `for ... in ...` clause of a comprehension.
    fn visit_comprehension(&mut self, node: &Comprehension) -> VisitResult {
        VisitResult::Continue
    }

    // Expression nodes --------------------------------------------------

    fn visit_name(&mut self, node: &Name) -> VisitResult {
        VisitResult::Continue
    }

    fn visit_attribute(&mut self, node: &Attribute) -> VisitResult {
        VisitResult::Continue
    }

    fn visit_call(&mut self, node: &Call) -> VisitResult {
        VisitResult::Continue
    }

    fn visit_named_expr(&mut self, node: &NamedExpr) -> VisitResult {
        VisitResult::Continue
    }

    fn visit_param(&mut self, node: &Param) -> VisitResult {
        VisitResult::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoopVisitor;
    impl Visitor for NoopVisitor {}

    #[test]
    fn default_results_continue() {
        let mut v = NoopVisitor;
        let name = Name {
            value: "x".to_string(),
            span: hinttool_core::span::Span::new(0, 1),
        };
        assert_eq!(v.visit_name(&name), VisitResult::Continue);
        assert_eq!(VisitResult::default(), VisitResult::Continue);
    }
}
