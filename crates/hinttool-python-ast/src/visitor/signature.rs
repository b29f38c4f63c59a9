// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Function-definition collection for signature annotation.
//!
//! [`FunctionCollector`] walks a module and returns every function definition
//! (top-level, nested, and methods) together with its class context. Methods
//! are functions defined directly in a class body, including bodies of `if`
//! and `try` statements nested inside the class; functions nested inside
//! other functions are never methods.

use hinttool_core::span::Span;

use crate::nodes::{ClassDef, Expression, FunctionDef, Module, ParamKind, Statement};

/// A collected function definition with its class context.
#[derive(Debug, Clone)]
pub struct FunctionInfo<'a> {
    pub node: &'a FunctionDef,
    /// Name of the class the function is a method of, if any.
    pub class_name: Option<String>,
    /// Span of that class's definition.
    pub class_span: Option<Span>,
    /// True when the function is defined directly in a class body.
    pub is_method: bool,
    /// True when decorated with `@staticmethod`.
    pub is_static: bool,
}

impl FunctionInfo<'_> {
    /// True when the first positional parameter is the implicit receiver
    /// (`self`, or `cls` for classmethods) and must never be annotated.
    pub fn has_implicit_first_param(&self) -> bool {
        self.is_method
            && !self.is_static
            && self
                .node
                .params
                .params
                .first()
                .is_some_and(|p| p.kind == ParamKind::Positional)
    }

    /// The name of the implicit first parameter, when there is one.
    pub fn implicit_first_param(&self) -> Option<&str> {
        if self.has_implicit_first_param() {
            self.node.params.params.first().map(|p| p.name.as_str())
        } else {
            None
        }
    }

    /// True when the function's span contains the given offset.
    pub fn contains(&self, offset: usize) -> bool {
        self.node.span.start <= offset && offset < self.node.span.end
    }
}

/// Collects every function definition in a module, in source order.
pub struct FunctionCollector;

impl FunctionCollector {
    /// Collect all functions of a module.
    pub fn collect(module: &Module) -> Vec<FunctionInfo<'_>> {
        let mut out = Vec::new();
        collect_suite(&module.body, None, &mut out);
        out
    }
}

fn collect_suite<'a>(
    body: &'a [Statement],
    current_class: Option<&'a ClassDef>,
    out: &mut Vec<FunctionInfo<'a>>,
) {
    for stmt in body {
        match stmt {
            Statement::FunctionDef(func) => {
                out.push(FunctionInfo {
                    node: func,
                    class_name: current_class.map(|c| c.name.clone()),
                    class_span: current_class.map(|c| c.span),
                    is_method: current_class.is_some(),
                    is_static: is_staticmethod(func),
                });
                // A nested def is scoped to the function, not the class.
                collect_suite(&func.body, None, out);
            }
            Statement::ClassDef(class) => {
                collect_suite(&class.body, Some(class), out);
            }
            // Control flow does not change the enclosing scope owner.
            Statement::If(node) => {
                collect_suite(&node.body, current_class, out);
                collect_suite(&node.orelse, current_class, out);
            }
            Statement::While(node) => {
                collect_suite(&node.body, current_class, out);
                collect_suite(&node.orelse, current_class, out);
            }
            Statement::For(node) => {
                collect_suite(&node.body, current_class, out);
                collect_suite(&node.orelse, current_class, out);
            }
            Statement::With(node) => {
                collect_suite(&node.body, current_class, out);
            }
            Statement::Try(node) => {
                collect_suite(&node.body, current_class, out);
                for handler in &node.handlers {
                    collect_suite(&handler.body, current_class, out);
                }
                collect_suite(&node.orelse, current_class, out);
                collect_suite(&node.finalbody, current_class, out);
            }
            _ => {}
        }
    }
}

fn is_staticmethod(func: &FunctionDef) -> bool {
    func.decorators
        .iter()
        .any(|d| matches!(&d.expr, Expression::Name(n) if n.value == "staticmethod"))
}

// ============================================================================
// Tests
// ============================================================================
