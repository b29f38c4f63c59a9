// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! AST node types for Python source.
//!
//! Every node carries the byte [`Span`] of its source text; targeted nodes
//! additionally carry the spans of the sub-tokens that annotation synthesis
//! anchors edits to (parameter names, header colons, the `->` arrow). The
//! tree is fully owned: nodes store their own strings, and spans index into
//! the original source the module was parsed from.
//!
//! Statement and expression kinds are closed enums, so dispatch over node
//! kind is an exhaustive `match` checked by the compiler.

use hinttool_core::span::Span;

// ============================================================================
// Module
// ============================================================================

/// A parsed Python module (one source file).
#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    pub body: Vec<Statement>,
    pub span: Span,
}

// ============================================================================
// Statements
// ============================================================================

/// Any statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    FunctionDef(FunctionDef),
    ClassDef(ClassDef),
    If(If),
    While(While),
    For(For),
    With(With),
    Try(Try),
    Assign(Assign),
    AnnAssign(AnnAssign),
    AugAssign(AugAssign),
    Import(Import),
    ImportFrom(ImportFrom),
    Global(Global),
    Nonlocal(Nonlocal),
    Return(Return),
    Raise(Raise),
    Assert(Assert),
    Del(Del),
    Pass(Pass),
    Break(Break),
    Continue(Continue),
    Expr(ExprStatement),
}

impl Statement {
    /// The full span of the statement, including any suite.
    pub fn span(&self) -> Span {
        match self {
            Statement::FunctionDef(s) => s.span,
            Statement::ClassDef(s) => s.span,
            Statement::If(s) => s.span,
            Statement::While(s) => s.span,
            Statement::For(s) => s.span,
            Statement::With(s) => s.span,
            Statement::Try(s) => s.span,
            Statement::Assign(s) => s.span,
            Statement::AnnAssign(s) => s.span,
            Statement::AugAssign(s) => s.span,
            Statement::Import(s) => s.span,
            Statement::ImportFrom(s) => s.span,
            Statement::Global(s) => s.span,
            Statement::Nonlocal(s) => s.span,
            Statement::Return(s) => s.span,
            Statement::Raise(s) => s.span,
            Statement::Assert(s) => s.span,
            Statement::Del(s) => s.span,
            Statement::Pass(s) => s.span,
            Statement::Break(s) => s.span,
            Statement::Continue(s) => s.span,
            Statement::Expr(s) => s.span,
        }
    }
}

/// A decorator line (`@name(...)`).
#[derive(Debug, Clone, PartialEq)]
pub struct Decorator {
    pub expr: Expression,
    pub span: Span,
}

/// Parameter kind, covering both real parameters and the bare `/` and `*`
/// separator markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKind {
    /// Ordinary positional-or-keyword (or keyword-only) parameter.
    Positional,
    /// `*args` variadic parameter.
    Star,
    /// `**kwargs` variadic keyword parameter.
    StarStar,
    /// Bare `/` positional-only marker (no name).
    SlashMarker,
    /// Bare `*` keyword-only marker (no name).
    StarMarker,
}

/// A single formal parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub name_span: Span,
    pub kind: ParamKind,
    pub annotation: Option<Expression>,
    pub default: Option<Expression>,
    /// Span of the whole parameter, from any `*`/`**` prefix through the
    /// default value.
    pub span: Span,
}

/// A parameter list, without the surrounding parentheses.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameters {
    pub params: Vec<Param>,
    pub span: Span,
}

impl Parameters {
    pub fn empty(at: usize) -> Self {
        Parameters {
            params: Vec::new(),
            span: Span::new(at, at),
        }
    }
}

/// A function return annotation: `-> expr`.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnAnnotation {
    /// Span of the `->` token.
    pub arrow_span: Span,
    pub expr: Expression,
}

/// `def name(params) -> ret: body`
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    pub name: String,
    pub name_span: Span,
    pub decorators: Vec<Decorator>,
    pub params: Parameters,
    /// Span of the closing `)` of the parameter list.
    pub rpar_span: Span,
    pub returns: Option<ReturnAnnotation>,
    /// Span of the header `:`.
    pub colon_span: Span,
    pub body: Vec<Statement>,
    pub is_async: bool,
    pub span: Span,
}

/// `class name(bases): body`
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDef {
    pub name: String,
    pub name_span: Span,
    pub decorators: Vec<Decorator>,
    pub bases: Vec<Expression>,
    pub body: Vec<Statement>,
    pub span: Span,
}

/// `if`/`elif`/`else` chain; `elif` is represented as a nested `If` in `orelse`.
#[derive(Debug, Clone, PartialEq)]
pub struct If {
    pub test: Expression,
    pub body: Vec<Statement>,
    pub orelse: Vec<Statement>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct While {
    pub test: Expression,
    pub body: Vec<Statement>,
    pub orelse: Vec<Statement>,
    pub span: Span,
}

/// `for target in iter: body else: orelse`
#[derive(Debug, Clone, PartialEq)]
pub struct For {
    pub target: Expression,
    pub iter: Expression,
    pub body: Vec<Statement>,
    pub orelse: Vec<Statement>,
    /// Span of the header `:`.
    pub colon_span: Span,
    pub is_async: bool,
    pub span: Span,
}

/// One `expr as target` item of a `with` statement.
#[derive(Debug, Clone, PartialEq)]
pub struct WithItem {
    pub context: Expression,
    pub target: Option<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct With {
    pub items: Vec<WithItem>,
    pub body: Vec<Statement>,
    /// Span of the header `:`.
    pub colon_span: Span,
    pub is_async: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExceptHandler {
    pub typ: Option<Expression>,
    pub name: Option<NameItem>,
    pub body: Vec<Statement>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Try {
    pub body: Vec<Statement>,
    pub handlers: Vec<ExceptHandler>,
    pub orelse: Vec<Statement>,
    pub finalbody: Vec<Statement>,
    pub span: Span,
}

/// `targets = value` (chained: `a = b = value` has two targets).
#[derive(Debug, Clone, PartialEq)]
pub struct Assign {
    pub targets: Vec<Expression>,
    pub value: Expression,
    pub span: Span,
}

/// `target: annotation = value`
#[derive(Debug, Clone, PartialEq)]
pub struct AnnAssign {
    pub target: Expression,
    pub annotation: Expression,
    pub value: Option<Expression>,
    pub span: Span,
}

/// `target op= value`
#[derive(Debug, Clone, PartialEq)]
pub struct AugAssign {
    pub target: Expression,
    pub op: String,
    pub value: Expression,
    pub span: Span,
}

/// A plain name with a span, used where only an identifier may appear.
#[derive(Debug, Clone, PartialEq)]
pub struct NameItem {
    pub name: String,
    pub span: Span,
}

/// `import a.b as c, d`
#[derive(Debug, Clone, PartialEq)]
pub struct ImportAlias {
    /// Dotted module or imported name.
    pub name: String,
    pub name_span: Span,
    pub asname: Option<NameItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Import {
    pub names: Vec<ImportAlias>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportFrom {
    pub module: Option<String>,
    /// Number of leading dots (relative import level).
    pub level: usize,
    pub names: Vec<ImportAlias>,
    pub is_star: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Global {
    pub names: Vec<NameItem>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Nonlocal {
    pub names: Vec<NameItem>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Return {
    pub value: Option<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Raise {
    pub exc: Option<Expression>,
    pub cause: Option<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assert {
    pub test: Expression,
    pub msg: Option<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Del {
    pub targets: Vec<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Pass {
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Break {
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Continue {
    pub span: Span,
}

/// A bare expression used as a statement.
#[derive(Debug, Clone, PartialEq)]
pub struct ExprStatement {
    pub value: Expression,
    pub span: Span,
}

// ============================================================================
// Expressions
// ============================================================================

/// Any expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Name(Name),
    Attribute(Box<Attribute>),
    Subscript(Box<Subscript>),
    Call(Box<Call>),
    Tuple(Tuple),
    List(List),
    Set(SetLit),
    Dict(Dict),
    Paren(Box<Paren>),
    Starred(Box<Starred>),
    Lambda(Box<Lambda>),
    IfExp(Box<IfExp>),
    BinaryOp(Box<BinaryOp>),
    UnaryOp(Box<UnaryOp>),
    BoolOp(Box<BoolOp>),
    Compare(Box<Compare>),
    Await(Box<Await>),
    Yield(Box<Yield>),
    NamedExpr(Box<NamedExpr>),
    ListComp(Box<Comp>),
    SetComp(Box<Comp>),
    GeneratorExp(Box<Comp>),
    DictComp(Box<DictComp>),
    Slice(Box<SliceExpr>),
    Int(Literal),
    Float(Literal),
    Imaginary(Literal),
    Str(StrLit),
    Bytes(StrLit),
    FString(StrLit),
    True(Literal),
    False(Literal),
    NoneLit(Literal),
    Ellipsis(Literal),
}

impl Expression {
    /// The byte span of this expression.
    pub fn span(&self) -> Span {
        match self {
            Expression::Name(e) => e.span,
            Expression::Attribute(e) => e.span,
            Expression::Subscript(e) => e.span,
            Expression::Call(e) => e.span,
            Expression::Tuple(e) => e.span,
            Expression::List(e) => e.span,
            Expression::Set(e) => e.span,
            Expression::Dict(e) => e.span,
            Expression::Paren(e) => e.span,
            Expression::Starred(e) => e.span,
            Expression::Lambda(e) => e.span,
            Expression::IfExp(e) => e.span,
            Expression::BinaryOp(e) => e.span,
            Expression::UnaryOp(e) => e.span,
            Expression::BoolOp(e) => e.span,
            Expression::Compare(e) => e.span,
            Expression::Await(e) => e.span,
            Expression::Yield(e) => e.span,
            Expression::NamedExpr(e) => e.span,
            Expression::ListComp(e) => e.span,
            Expression::SetComp(e) => e.span,
            Expression::GeneratorExp(e) => e.span,
            Expression::DictComp(e) => e.span,
            Expression::Slice(e) => e.span,
            Expression::Int(e) => e.span,
            Expression::Float(e) => e.span,
            Expression::Imaginary(e) => e.span,
            Expression::Str(e) => e.span,
            Expression::Bytes(e) => e.span,
            Expression::FString(e) => e.span,
            Expression::True(e) => e.span,
            Expression::False(e) => e.span,
            Expression::NoneLit(e) => e.span,
            Expression::Ellipsis(e) => e.span,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Name {
    pub value: String,
    pub span: Span,
}

/// `value.attr`
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub value: Expression,
    pub attr: String,
    pub attr_span: Span,
    pub span: Span,
}

/// `value[slice, ...]`
#[derive(Debug, Clone, PartialEq)]
pub struct Subscript {
    pub value: Expression,
    pub slices: Vec<Expression>,
    pub span: Span,
}

/// A call argument: positional, `name=value`, `*args`, or `**kwargs`.
#[derive(Debug, Clone, PartialEq)]
pub struct Arg {
    pub value: Expression,
    pub keyword: Option<String>,
    /// `"*"`, `"**"`, or empty.
    pub star: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub func: Expression,
    pub args: Vec<Arg>,
    pub span: Span,
}

/// An unparenthesized tuple: `a, b`.
#[derive(Debug, Clone, PartialEq)]
pub struct Tuple {
    pub elements: Vec<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct List {
    pub elements: Vec<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SetLit {
    pub elements: Vec<Expression>,
    pub span: Span,
}

/// One `key: value` entry, or a `**expr` spread (key is `None`).
#[derive(Debug, Clone, PartialEq)]
pub struct DictItem {
    pub key: Option<Expression>,
    pub value: Expression,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dict {
    pub items: Vec<DictItem>,
    pub span: Span,
}

/// A parenthesized expression; `inner` is `None` for the empty tuple `()`.
#[derive(Debug, Clone, PartialEq)]
pub struct Paren {
    pub inner: Option<Expression>,
    pub span: Span,
}

/// `*expr`
#[derive(Debug, Clone, PartialEq)]
pub struct Starred {
    pub value: Expression,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Lambda {
    pub params: Parameters,
    pub body: Expression,
    pub span: Span,
}

/// `body if test else orelse`
#[derive(Debug, Clone, PartialEq)]
pub struct IfExp {
    pub body: Expression,
    pub test: Expression,
    pub orelse: Expression,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    MatMul,
    Div,
    FloorDiv,
    Mod,
    Pow,
    LShift,
    RShift,
    BitOr,
    BitXor,
    BitAnd,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryOp {
    pub left: Expression,
    pub op: BinOp,
    pub right: Expression,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnOp {
    Plus,
    Minus,
    Invert,
    Not,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnaryOp {
    pub op: UnOp,
    pub operand: Expression,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoolOpKind {
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoolOp {
    pub op: BoolOpKind,
    pub values: Vec<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CmpOp {
    Eq,
    NotEq,
    Lt,
    LtE,
    Gt,
    GtE,
    Is,
    IsNot,
    In,
    NotIn,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Compare {
    pub left: Expression,
    pub comparisons: Vec<(CmpOp, Expression)>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Await {
    pub value: Expression,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Yield {
    pub value: Option<Expression>,
    pub is_from: bool,
    pub span: Span,
}

/// `target := value`
#[derive(Debug, Clone, PartialEq)]
pub struct NamedExpr {
    pub target: Name,
    pub value: Expression,
    pub span: Span,
}

/// One `for target in iter if cond...` clause of a comprehension.
#[derive(Debug, Clone, PartialEq)]
pub struct Comprehension {
    pub target: Expression,
    pub iter: Expression,
    pub ifs: Vec<Expression>,
    pub is_async: bool,
}

/// A list/set comprehension or generator expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Comp {
    pub element: Expression,
    pub generators: Vec<Comprehension>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DictComp {
    pub key: Expression,
    pub value: Expression,
    pub generators: Vec<Comprehension>,
    pub span: Span,
}

/// `lower:upper:step` inside a subscript.
#[derive(Debug, Clone, PartialEq)]
pub struct SliceExpr {
    pub lower: Option<Expression>,
    pub upper: Option<Expression>,
    pub step: Option<Expression>,
    pub span: Span,
}

/// A literal token kept as source text (numbers, keyword literals).
#[derive(Debug, Clone, PartialEq)]
pub struct Literal {
    pub value: String,
    pub span: Span,
}

/// A string-ish literal with its prefix and quotes preserved.
#[derive(Debug, Clone, PartialEq)]
pub struct StrLit {
    pub value: String,
    pub span: Span,
}
