// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Walk functions driving a [`Visitor`] over the AST.
//!
//! Each walk function returns `true` to keep walking and `false` once a
//! visitor requested [`VisitResult::Stop`]. Matches over statement and
//! expression kinds are exhaustive, so new node kinds cannot be silently
//! skipped.

use crate::nodes::{
    Comp, Comprehension, DictComp, Expression, FunctionDef, Lambda, Module, Parameters, Statement,
};
use crate::visitor::traits::{VisitResult, Visitor};

/// Walk an entire module. Returns `false` if the visitor stopped the walk.
pub fn walk_module<V: Visitor>(visitor: &mut V, module: &Module) -> bool {
    walk_suite(visitor, &module.body)
}

/// Walk a list of statements.
pub fn walk_suite<V: Visitor>(visitor: &mut V, body: &[Statement]) -> bool {
    for stmt in body {
        if !walk_statement(visitor, stmt) {
            return false;
        }
    }
    true
}

/// Walk a single statement and its children.
pub fn walk_statement<V: Visitor>(visitor: &mut V, stmt: &Statement) -> bool {
    match visitor.visit_statement(stmt) {
        VisitResult::Stop => return false,
        VisitResult::SkipChildren => return true,
        VisitResult::Continue => {}
    }
    match stmt {
        Statement::FunctionDef(node) => walk_function_def(visitor, node),
        Statement::ClassDef(node) => match visitor.visit_class_def(node) {
            VisitResult::Stop => false,
            VisitResult::SkipChildren => {
                visitor.leave_class_def(node);
                true
            }
            VisitResult::Continue => {
                for dec in &node.decorators {
                    if !walk_expression(visitor, &dec.expr) {
                        return false;
                    }
                }
                for base in &node.bases {
                    if !walk_expression(visitor, base) {
                        return false;
                    }
                }
                if !walk_suite(visitor, &node.body) {
                    return false;
                }
                visitor.leave_class_def(node);
                true
            }
        },
        Statement::If(node) => {
            walk_expression(visitor, &node.test)
                && walk_suite(visitor, &node.body)
                && walk_suite(visitor, &node.orelse)
        }
        Statement::While(node) => {
            walk_expression(visitor, &node.test)
                && walk_suite(visitor, &node.body)
                && walk_suite(visitor, &node.orelse)
        }
        Statement::For(node) => match visitor.visit_for(node) {
            VisitResult::Stop => false,
            VisitResult::SkipChildren => true,
            VisitResult::Continue => {
                walk_expression(visitor, &node.target)
                    && walk_expression(visitor, &node.iter)
                    && walk_suite(visitor, &node.body)
                    && walk_suite(visitor, &node.orelse)
            }
        },
        Statement::With(node) => match visitor.visit_with(node) {
            VisitResult::Stop => false,
            VisitResult::SkipChildren => true,
            VisitResult::Continue => {
                for item in &node.items {
                    match visitor.visit_with_item(item) {
                        VisitResult::Stop => return false,
                        VisitResult::SkipChildren => continue,
                        VisitResult::Continue => {}
                    }
                    if !walk_expression(visitor, &item.context) {
                        return false;
                    }
                    if let Some(target) = &item.target {
                        if !walk_expression(visitor, target) {
                            return false;
                        }
                    }
                }
                walk_suite(visitor, &node.body)
            }
        },
        Statement::Try(node) => {
            if !walk_suite(visitor, &node.body) {
                return false;
            }
            for handler in &node.handlers {
                match visitor.visit_except_handler(handler) {
                    VisitResult::Stop => return false,
                    VisitResult::SkipChildren => continue,
                    VisitResult::Continue => {}
                }
                if let Some(typ) = &handler.typ {
                    if !walk_expression(visitor, typ) {
                        return false;
                    }
                }
                if !walk_suite(visitor, &handler.body) {
                    return false;
                }
            }
            walk_suite(visitor, &node.orelse) && walk_suite(visitor, &node.finalbody)
        }
        Statement::Assign(node) => match visitor.visit_assign(node) {
            VisitResult::Stop => false,
            VisitResult::SkipChildren => true,
            VisitResult::Continue => {
                for target in &node.targets {
                    if !walk_expression(visitor, target) {
                        return false;
                    }
                }
                walk_expression(visitor, &node.value)
            }
        },
        Statement::AnnAssign(node) => match visitor.visit_ann_assign(node) {
            VisitResult::Stop => false,
            VisitResult::SkipChildren => true,
            VisitResult::Continue => {
                if !walk_expression(visitor, &node.target) {
                    return false;
                }
                if !walk_expression(visitor, &node.annotation) {
                    return false;
                }
                match &node.value {
                    Some(value) => walk_expression(visitor, value),
                    None => true,
                }
            }
        },
        Statement::AugAssign(node) => match visitor.visit_aug_assign(node) {
            VisitResult::Stop => false,
            VisitResult::SkipChildren => true,
            VisitResult::Continue => {
                walk_expression(visitor, &node.target) && walk_expression(visitor, &node.value)
            }
        },
        Statement::Import(node) => !matches!(visitor.visit_import(node), VisitResult::Stop),
        Statement::ImportFrom(node) => {
            !matches!(visitor.visit_import_from(node), VisitResult::Stop)
        }
        Statement::Global(node) => !matches!(visitor.visit_global(node), VisitResult::Stop),
        Statement::Nonlocal(node) => !matches!(visitor.visit_nonlocal(node), VisitResult::Stop),
        Statement::Return(node) => match visitor.visit_return(node) {
            VisitResult::Stop => false,
            VisitResult::SkipChildren => true,
            VisitResult::Continue => match &node.value {
                Some(value) => walk_expression(visitor, value),
                None => true,
            },
        },
        Statement::Raise(node) => {
            if let Some(exc) = &node.exc {
                if !walk_expression(visitor, exc) {
                    return false;
                }
            }
            match &node.cause {
                Some(cause) => walk_expression(visitor, cause),
                None => true,
            }
        }
        Statement::Assert(node) => {
            if !walk_expression(visitor, &node.test) {
                return false;
            }
            match &node.msg {
                Some(msg) => walk_expression(visitor, msg),
                None => true,
            }
        }
        Statement::Del(node) => {
            for target in &node.targets {
                if !walk_expression(visitor, target) {
                    return false;
                }
            }
            true
        }
        Statement::Pass(_) | Statement::Break(_) | Statement::Continue(_) => true,
        Statement::Expr(node) => walk_expression(visitor, &node.value),
    }
}

/// Walk a function definition and its children.
pub fn walk_function_def<V: Visitor>(visitor: &mut V, node: &FunctionDef) -> bool {
    match visitor.visit_function_def(node) {
        VisitResult::Stop => false,
        VisitResult::SkipChildren => {
            visitor.leave_function_def(node);
            true
        }
        VisitResult::Continue => {
            for dec in &node.decorators {
                if !walk_expression(visitor, &dec.expr) {
                    return false;
                }
            }
            if !walk_parameters(visitor, &node.params) {
                return false;
            }
            if let Some(returns) = &node.returns {
                if !walk_expression(visitor, &returns.expr) {
                    return false;
                }
            }
            if !walk_suite(visitor, &node.body) {
                return false;
            }
            visitor.leave_function_def(node);
            true
        }
    }
}

/// Walk a parameter list: each parameter, its annotation, and its default.
pub fn walk_parameters<V: Visitor>(visitor: &mut V, params: &Parameters) -> bool {
    for param in &params.params {
        match visitor.visit_param(param) {
            VisitResult::Stop => return false,
            VisitResult::SkipChildren => continue,
            VisitResult::Continue => {}
        }
        if let Some(annotation) = &param.annotation {
            if !walk_expression(visitor, annotation) {
                return false;
            }
        }
        if let Some(default) = &param.default {
            if !walk_expression(visitor, default) {
                return false;
            }
        }
    }
    true
}

fn walk_lambda<V: Visitor>(visitor: &mut V, node: &Lambda) -> bool {
    match visitor.visit_lambda(node) {
        VisitResult::Stop => false,
        VisitResult::SkipChildren => {
            visitor.leave_lambda(node);
            true
        }
        VisitResult::Continue => {
            if !walk_parameters(visitor, &node.params) {
                return false;
            }
            if !walk_expression(visitor, &node.body) {
                return false;
            }
            visitor.leave_lambda(node);
            true
        }
    }
}

fn walk_comprehensions<V: Visitor>(visitor: &mut V, generators: &[Comprehension]) -> bool {
    for gen in generators {
        match visitor.visit_comprehension(gen) {
            VisitResult::Stop => return false,
            VisitResult::SkipChildren => continue,
            VisitResult::Continue => {}
        }
        if !walk_expression(visitor, &gen.target) {
            return false;
        }
        if !walk_expression(visitor, &gen.iter) {
            return false;
        }
        for cond in &gen.ifs {
            if !walk_expression(visitor, cond) {
                return false;
            }
        }
    }
    true
}

fn walk_comp<V: Visitor>(visitor: &mut V, node: &Comp) -> bool {
    match visitor.visit_comp(node) {
        VisitResult::Stop => false,
        VisitResult::SkipChildren => {
            visitor.leave_comp(node);
            true
        }
        VisitResult::Continue => {
            if !walk_expression(visitor, &node.element) {
                return false;
            }
            if !walk_comprehensions(visitor, &node.generators) {
                return false;
            }
            visitor.leave_comp(node);
            true
        }
    }
}

fn walk_dict_comp<V: Visitor>(visitor: &mut V, node: &DictComp) -> bool {
    match visitor.visit_dict_comp(node) {
        VisitResult::Stop => false,
        VisitResult::SkipChildren => {
            visitor.leave_dict_comp(node);
            true
        }
        VisitResult::Continue => {
            if !walk_expression(visitor, &node.key) {
                return false;
            }
            if !walk_expression(visitor, &node.value) {
                return false;
            }
            if !walk_comprehensions(visitor, &node.generators) {
                return false;
            }
            visitor.leave_dict_comp(node);
            true
        }
    }
}

/// Walk an expression and its children.
pub fn walk_expression<V: Visitor>(visitor: &mut V, expr: &Expression) -> bool {
    match visitor.visit_expression(expr) {
        VisitResult::Stop => return false,
        VisitResult::SkipChildren => return true,
        VisitResult::Continue => {}
    }
    match expr {
        Expression::Name(node) => !matches!(visitor.visit_name(node), VisitResult::Stop),
        Expression::Attribute(node) => match visitor.visit_attribute(node) {
            VisitResult::Stop => false,
            VisitResult::SkipChildren => true,
            VisitResult::Continue => walk_expression(visitor, &node.value),
        },
        Expression::Subscript(node) => {
            if !walk_expression(visitor, &node.value) {
                return false;
            }
            for slice in &node.slices {
                if !walk_expression(visitor, slice) {
                    return false;
                }
            }
            true
        }
        Expression::Call(node) => match visitor.visit_call(node) {
            VisitResult::Stop => false,
            VisitResult::SkipChildren => true,
            VisitResult::Continue => {
                if !walk_expression(visitor, &node.func) {
                    return false;
                }
                for arg in &node.args {
                    if !walk_expression(visitor, &arg.value) {
                        return false;
                    }
                }
                true
            }
        },
        Expression::Tuple(node) => {
            for element in &node.elements {
                if !walk_expression(visitor, element) {
                    return false;
                }
            }
            true
        }
        Expression::List(node) => {
            for element in &node.elements {
                if !walk_expression(visitor, element) {
                    return false;
                }
            }
            true
        }
        Expression::Set(node) => {
            for element in &node.elements {
                if !walk_expression(visitor, element) {
                    return false;
                }
            }
            true
        }
        Expression::Dict(node) => {
            for item in &node.items {
                if let Some(key) = &item.key {
                    if !walk_expression(visitor, key) {
                        return false;
                    }
                }
                if !walk_expression(visitor, &item.value) {
                    return false;
                }
            }
            true
        }
        Expression::Paren(node) => match &node.inner {
            Some(inner) => walk_expression(visitor, inner),
            None => true,
        },
        Expression::Starred(node) => walk_expression(visitor, &node.value),
        Expression::Lambda(node) => walk_lambda(visitor, node),
        Expression::IfExp(node) => {
            walk_expression(visitor, &node.body)
                && walk_expression(visitor, &node.test)
                && walk_expression(visitor, &node.orelse)
        }
        Expression::BinaryOp(node) => {
            walk_expression(visitor, &node.left) && walk_expression(visitor, &node.right)
        }
        Expression::UnaryOp(node) => walk_expression(visitor, &node.operand),
        Expression::BoolOp(node) => {
            for value in &node.values {
                if !walk_expression(visitor, value) {
                    return false;
                }
            }
            true
        }
        Expression::Compare(node) => {
            if !walk_expression(visitor, &node.left) {
                return false;
            }
            for (_, right) in &node.comparisons {
                if !walk_expression(visitor, right) {
                    return false;
                }
            }
            true
        }
        Expression::Await(node) => walk_expression(visitor, &node.value),
        Expression::Yield(node) => match &node.value {
            Some(value) => walk_expression(visitor, value),
            None => true,
        },
        Expression::NamedExpr(node) => match visitor.visit_named_expr(node) {
            VisitResult::Stop => false,
            VisitResult::SkipChildren => true,
            VisitResult::Continue => {
                if matches!(visitor.visit_name(&node.target), VisitResult::Stop) {
                    return false;
                }
                walk_expression(visitor, &node.value)
            }
        },
        Expression::ListComp(node) | Expression::SetComp(node) | Expression::GeneratorExp(node) => {
            walk_comp(visitor, node)
        }
        Expression::DictComp(node) => walk_dict_comp(visitor, node),
        Expression::Slice(node) => {
            for part in [&node.lower, &node.upper, &node.step].into_iter().flatten() {
                if !walk_expression(visitor, part) {
                    return false;
                }
            }
            true
        }
        Expression::Int(_)
        | Expression::Float(_)
        | Expression::Imaginary(_)
        | Expression::Str(_)
        | Expression::Bytes(_)
        | Expression::FString(_)
        | Expression::True(_)
        | Expression::False(_)
        | Expression::NoneLit(_)
        | Expression::Ellipsis(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    struct NameCounter {
        names: Vec<String>,
        stop_at: Option<usize>,
    }

    impl Visitor for NameCounter {
        fn visit_name(&mut self, node: &crate::nodes::Name) -> VisitResult {
            self.names.push(node.value.clone());
            if let Some(limit) = self.stop_at {
                if self.names.len() >= limit {
                    return VisitResult::Stop;
                }
            }
            VisitResult::Continue
        }
    }

    #[test]
    fn walks_all_names() {
        let module = parse("x = a + b\ndef f(p=c):\n    return d\n").unwrap();
        let mut counter = NameCounter {
            names: Vec::new(),
            stop_at: None,
        };
        assert!(walk_module(&mut counter, &module));
        for expected in ["x", "a", "b", "c", "d"] {
            assert!(
                counter.names.iter().any(|n| n == expected),
                "missing name {}",
                expected
            );
        }
    }

    #[test]
    fn stop_halts_walk() {
        let module = parse("a = 1\nb = 2\nc = 3\n").unwrap();
        let mut counter = NameCounter {
            names: Vec::new(),
            stop_at: Some(1),
        };
        assert!(!walk_module(&mut counter, &module));
        assert_eq!(counter.names.len(), 1);
    }

    struct SkipFunctions {
        names: Vec<String>,
    }

    impl Visitor for SkipFunctions {
        fn visit_function_def(&mut self, _node: &crate::nodes::FunctionDef) -> VisitResult {
            VisitResult::SkipChildren
        }

        fn visit_name(&mut self, node: &crate::nodes::Name) -> VisitResult {
            self.names.push(node.value.clone());
            VisitResult::Continue
        }
    }

    #[test]
    fn skip_children_skips_function_body() {
        let module = parse("def f():\n    hidden = 1\nvisible = 2\n").unwrap();
        let mut v = SkipFunctions { names: Vec::new() };
        assert!(walk_module(&mut v, &module));
        assert!(v.names.iter().any(|n| n == "visible"));
        assert!(!v.names.iter().any(|n| n == "hidden"));
    }
}
