//! The type oracle: best-effort static type inference for annotation targets.
//!
//! The oracle is deliberately shallow. It answers "what type should this
//! annotation carry" from literal-level evidence only: literal values,
//! display forms, constructor calls, and unions arising from conditionals.
//! Anything deeper returns [`Inferred::Unknown`] and the synthesis layer
//! substitutes the universal placeholder `Any`.
//!
//! Two implementations exist:
//!
//! - [`StubOracle`]: always unknown; every slot gets `Any`. This is the
//!   cheapest mode and never produces a wrong annotation.
//! - [`LiteralOracle`]: literal-level inference as described above.
//!
//! Oracles are consulted through an explicit [`EvalContext`] created per
//! file-analysis request; there is no ambient inference state.

use thiserror::Error;

use hinttool_python_ast::nodes::{
    BinOp, Expression, FunctionDef, Param, ParamKind, Return, Statement, UnOp,
};
use hinttool_python_ast::visitor::TargetInfo;

/// The annotation syntax a type must be rendered into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnnotationSyntax {
    /// Syntactic annotations: `x: int`, `def f() -> str:`.
    Inline,
    /// Legacy structured comments: `# type: int`.
    Comment,
}

impl AnnotationSyntax {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnnotationSyntax::Inline => "inline",
            AnnotationSyntax::Comment => "comment",
        }
    }
}

impl std::fmt::Display for AnnotationSyntax {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The universal placeholder substituted when inference yields nothing.
pub const ANY: &str = "Any";

/// An inferred type with its source rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PyType {
    rendered: String,
}

impl PyType {
    /// A type known by name (`int`, `MyClass`).
    pub fn named(name: impl Into<String>) -> Self {
        PyType {
            rendered: name.into(),
        }
    }

    /// The union of several types, deduplicated in first-seen order.
    pub fn union(members: Vec<PyType>) -> Self {
        let mut seen: Vec<String> = Vec::new();
        for member in members {
            // A nested union contributes its own members.
            for part in member.rendered.split(" | ") {
                if !seen.iter().any(|s| s == part) {
                    seen.push(part.to_string());
                }
            }
        }
        PyType {
            rendered: seen.join(" | "),
        }
    }

    /// Source rendering of the type.
    pub fn render(&self) -> &str {
        &self.rendered
    }

    /// True when the rendering is a PEP 604 union.
    pub fn is_union(&self) -> bool {
        self.rendered.contains(" | ")
    }
}

/// Result of a type query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inferred {
    Known(PyType),
    Unknown,
}

impl Inferred {
    /// The rendered type, or the `Any` placeholder when unknown.
    pub fn render_or_any(&self) -> String {
        match self {
            Inferred::Known(t) => t.render().to_string(),
            Inferred::Unknown => ANY.to_string(),
        }
    }
}

/// An inferred type cannot be expressed in the target annotation syntax.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("type '{rendered}' cannot be expressed in {syntax} annotation syntax")]
pub struct IncompatibleTypeError {
    pub rendered: String,
    pub syntax: AnnotationSyntax,
}

/// Check that a rendered type is expressible in the given annotation syntax.
///
/// Non-denotable markers (`<lambda>`) are never expressible; PEP 604 unions
/// are additionally not expressible inside legacy `# type:` comments.
pub fn check_compatibility(
    rendered: &str,
    syntax: AnnotationSyntax,
) -> Result<(), IncompatibleTypeError> {
    if rendered.contains('<') {
        return Err(IncompatibleTypeError {
            rendered: rendered.to_string(),
            syntax,
        });
    }
    if syntax == AnnotationSyntax::Comment && rendered.contains(" | ") {
        return Err(IncompatibleTypeError {
            rendered: rendered.to_string(),
            syntax,
        });
    }
    Ok(())
}

/// Explicit per-file evaluation context for oracle queries.
///
/// Created for one file-analysis request and discarded afterwards.
#[derive(Debug, Clone, Copy)]
pub struct EvalContext<'a> {
    /// Label of the file under analysis (for diagnostics).
    pub file: &'a str,
    /// The file's source text.
    pub source: &'a str,
}

impl<'a> EvalContext<'a> {
    pub fn new(file: &'a str, source: &'a str) -> Self {
        EvalContext { file, source }
    }
}

/// A type oracle answering annotation-type queries.
pub trait TypeOracle {
    /// Infer the static type of an expression.
    fn infer_expression(&self, ctx: &EvalContext<'_>, expr: &Expression) -> Inferred;

    /// Infer the type a binding target receives, destructuring tuple values
    /// along the target's pattern path.
    fn infer_target(&self, ctx: &EvalContext<'_>, target: &TargetInfo<'_>) -> Inferred {
        let Some(value) = target.assigned_value else {
            return Inferred::Unknown;
        };
        match destructure(value, &target.tuple_path) {
            Some(leaf) => self.infer_expression(ctx, leaf),
            None => Inferred::Unknown,
        }
    }

    /// Infer a parameter type from its default value, when it has one.
    fn infer_parameter(&self, ctx: &EvalContext<'_>, param: &Param) -> Inferred {
        if matches!(param.kind, ParamKind::Star | ParamKind::StarStar) {
            return Inferred::Unknown;
        }
        match &param.default {
            // `None` defaults say nothing useful about the parameter type.
            Some(Expression::NoneLit(_)) | None => Inferred::Unknown,
            Some(default) => self.infer_expression(ctx, default),
        }
    }

    /// Infer a function's return type from its `return` statements.
    fn infer_return(&self, ctx: &EvalContext<'_>, func: &FunctionDef) -> Inferred {
        let mut returns: Vec<&Return> = Vec::new();
        collect_returns(&func.body, &mut returns);
        if returns.is_empty() {
            return Inferred::Known(PyType::named("None"));
        }
        let mut members = Vec::new();
        for ret in returns {
            match &ret.value {
                None => members.push(PyType::named("None")),
                Some(value) => match self.infer_expression(ctx, value) {
                    Inferred::Known(t) => members.push(t),
                    Inferred::Unknown => return Inferred::Unknown,
                },
            }
        }
        Inferred::Known(PyType::union(members))
    }
}

/// Descend into a value expression along tuple-pattern element indices,
/// returning the sub-expression assigned to that pattern position.
pub fn destructure<'a>(value: &'a Expression, path: &[usize]) -> Option<&'a Expression> {
    let Some((&index, rest)) = path.split_first() else {
        return Some(value);
    };
    match value {
        Expression::Paren(paren) => destructure(paren.inner.as_ref()?, path),
        Expression::Tuple(tuple) => destructure(tuple.elements.get(index)?, rest),
        Expression::List(list) => destructure(list.elements.get(index)?, rest),
        _ => None,
    }
}

/// Collect `return` statements belonging to one function body, not entering
/// nested function or class scopes.
fn collect_returns<'a>(body: &'a [Statement], out: &mut Vec<&'a Return>) {
    for stmt in body {
        match stmt {
            Statement::Return(ret) => out.push(ret),
            Statement::FunctionDef(_) | Statement::ClassDef(_) => {}
            Statement::If(node) => {
                collect_returns(&node.body, out);
                collect_returns(&node.orelse, out);
            }
            Statement::While(node) => {
                collect_returns(&node.body, out);
                collect_returns(&node.orelse, out);
            }
            Statement::For(node) => {
                collect_returns(&node.body, out);
                collect_returns(&node.orelse, out);
            }
            Statement::With(node) => collect_returns(&node.body, out),
            Statement::Try(node) => {
                collect_returns(&node.body, out);
                for handler in &node.handlers {
                    collect_returns(&handler.body, out);
                }
                collect_returns(&node.orelse, out);
                collect_returns(&node.finalbody, out);
            }
            _ => {}
        }
    }
}

// ============================================================================
// Oracle implementations
// ============================================================================

/// The stub oracle: every query is unknown, every slot gets `Any`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StubOracle;

impl TypeOracle for StubOracle {
    fn infer_expression(&self, _ctx: &EvalContext<'_>, _expr: &Expression) -> Inferred {
        Inferred::Unknown
    }

    fn infer_return(&self, _ctx: &EvalContext<'_>, _func: &FunctionDef) -> Inferred {
        Inferred::Unknown
    }
}

/// Builtin constructor names whose call result is the builtin type itself.
const BUILTIN_CONSTRUCTORS: &[&str] = &[
    "list", "dict", "set", "tuple", "str", "int", "float", "bool", "bytes", "frozenset",
];

/// Literal-level inference.
#[derive(Debug, Clone, Copy, Default)]
pub struct LiteralOracle;

impl TypeOracle for LiteralOracle {
    fn infer_expression(&self, ctx: &EvalContext<'_>, expr: &Expression) -> Inferred {
        match expr {
            Expression::Int(_) => known("int"),
            Expression::Float(_) => known("float"),
            Expression::Imaginary(_) => known("complex"),
            Expression::Str(_) | Expression::FString(_) => known("str"),
            Expression::Bytes(_) => known("bytes"),
            Expression::True(_) | Expression::False(_) => known("bool"),
            Expression::NoneLit(_) => known("None"),
            Expression::List(_) | Expression::ListComp(_) => known("list"),
            Expression::Dict(_) | Expression::DictComp(_) => known("dict"),
            Expression::Set(_) | Expression::SetComp(_) => known("set"),
            Expression::Tuple(_) => known("tuple"),
            Expression::Paren(paren) => match &paren.inner {
                Some(inner) => self.infer_expression(ctx, inner),
                None => known("tuple"),
            },
            // Lambdas have no denotable annotation; surface a marker that the
            // compatibility check rejects.
            Expression::Lambda(_) => Inferred::Known(PyType::named("<lambda>")),
            Expression::Compare(_) => known("bool"),
            Expression::NamedExpr(node) => self.infer_expression(ctx, &node.value),
            Expression::UnaryOp(node) => match node.op {
                UnOp::Not => known("bool"),
                UnOp::Plus | UnOp::Minus | UnOp::Invert => {
                    match self.infer_expression(ctx, &node.operand) {
                        Inferred::Known(t)
                            if matches!(t.render(), "int" | "float" | "complex" | "bool") =>
                        {
                            Inferred::Known(t)
                        }
                        _ => Inferred::Unknown,
                    }
                }
            },
            Expression::BinaryOp(node) => self.infer_binary(ctx, node.op, &node.left, &node.right),
            Expression::BoolOp(node) => {
                let mut members = Vec::new();
                for value in &node.values {
                    match self.infer_expression(ctx, value) {
                        Inferred::Known(t) => members.push(t),
                        Inferred::Unknown => return Inferred::Unknown,
                    }
                }
                Inferred::Known(PyType::union(members))
            }
            Expression::IfExp(node) => {
                let body = self.infer_expression(ctx, &node.body);
                let orelse = self.infer_expression(ctx, &node.orelse);
                match (body, orelse) {
                    (Inferred::Known(a), Inferred::Known(b)) => {
                        Inferred::Known(PyType::union(vec![a, b]))
                    }
                    _ => Inferred::Unknown,
                }
            }
            Expression::Call(node) => match &node.func {
                Expression::Name(name) => {
                    if BUILTIN_CONSTRUCTORS.contains(&name.value.as_str()) {
                        known(&name.value)
                    } else if name.value.chars().next().is_some_and(|c| c.is_uppercase()) {
                        // Constructor heuristic: capitalized callee names a class.
                        known(&name.value)
                    } else {
                        Inferred::Unknown
                    }
                }
                _ => Inferred::Unknown,
            },
            Expression::Name(_)
            | Expression::Attribute(_)
            | Expression::Subscript(_)
            | Expression::Starred(_)
            | Expression::Await(_)
            | Expression::Yield(_)
            | Expression::GeneratorExp(_)
            | Expression::Slice(_)
            | Expression::Ellipsis(_) => Inferred::Unknown,
        }
    }
}

impl LiteralOracle {
    fn infer_binary(
        &self,
        ctx: &EvalContext<'_>,
        op: BinOp,
        left: &Expression,
        right: &Expression,
    ) -> Inferred {
        let (Inferred::Known(l), Inferred::Known(r)) = (
            self.infer_expression(ctx, left),
            self.infer_expression(ctx, right),
        ) else {
            return Inferred::Unknown;
        };
        let l = l.render();
        let r = r.render();
        let numeric = |t: &str| matches!(t, "int" | "float" | "bool");
        match op {
            BinOp::Div if numeric(l) && numeric(r) => known("float"),
            BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Mod | BinOp::FloorDiv | BinOp::Pow
                if numeric(l) && numeric(r) =>
            {
                if l == "float" || r == "float" {
                    known("float")
                } else {
                    known("int")
                }
            }
            BinOp::Add if l == "str" && r == "str" => known("str"),
            BinOp::Add if l == "list" && r == "list" => known("list"),
            BinOp::Mod if l == "str" => known("str"),
            BinOp::Mul if l == "str" && r == "int" => known("str"),
            _ => Inferred::Unknown,
        }
    }
}

fn known(name: &str) -> Inferred {
    Inferred::Known(PyType::named(name))
}

// ============================================================================
// Tests
// ============================================================================
