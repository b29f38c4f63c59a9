// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Recursive-descent parser from the token stream to the AST.
//!
//! The parser follows the reference grammar's precedence ladder
//! (test → or_test → and_test → not_test → comparison → bitwise/arith chains
//! → unary → power → primary → atom) and builds the owned node types from
//! [`crate::nodes`]. It is permissive about context: constructs such as the
//! walrus operator are accepted anywhere an expression is, and soft keywords
//! (`match`, `case`) are treated as ordinary names.

use thiserror::Error;

use hinttool_core::span::Span;

use crate::nodes::*;
use crate::tokenizer::{tokenize, TokError, TokKind, Token};

/// Parser error type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParserError {
    /// The tokenizer rejected the input.
    #[error("tokenizer error: {0}")]
    Tokenize(#[from] TokError),

    /// The token stream did not match the grammar.
    #[error("syntax error at offset {offset}: {message}")]
    Syntax { message: String, offset: usize },
}

impl ParserError {
    /// Byte offset of the error in the source.
    pub fn offset(&self) -> usize {
        match self {
            ParserError::Tokenize(TokError::UnterminatedString(o)) => *o,
            ParserError::Tokenize(TokError::InconsistentDedent(o)) => *o,
            ParserError::Tokenize(TokError::InvalidCharacter(o, _)) => *o,
            ParserError::Syntax { offset, .. } => *offset,
        }
    }
}

/// Result type for parser operations.
pub type Result<T> = std::result::Result<T, ParserError>;

/// Hard keywords that can never be used as identifiers.
const KEYWORDS: &[&str] = &[
    "and", "as", "assert", "async", "await", "break", "class", "continue", "def", "del", "elif",
    "else", "except", "finally", "for", "from", "global", "if", "import", "in", "is", "lambda",
    "nonlocal", "not", "or", "pass", "raise", "return", "try", "while", "with", "yield", "True",
    "False", "None",
];

const AUG_OPS: &[&str] = &[
    "+=", "-=", "*=", "/=", "//=", "%=", "@=", "&=", "|=", "^=", ">>=", "<<=", "**=",
];

/// Parse a complete module.
pub fn parse(src: &str) -> Result<Module> {
    let tokens = tokenize(src)?;
    let mut parser = Parser { tokens, pos: 0 };
    parser.module(src.len())
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    // ------------------------------------------------------------------
    // Token helpers
    // ------------------------------------------------------------------

    fn peek(&self) -> &Token {
        // The stream always ends with EndMarker, which is never consumed.
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_ahead(&self, n: usize) -> &Token {
        &self.tokens[(self.pos + n).min(self.tokens.len() - 1)]
    }

    fn bump(&mut self) -> Token {
        let tok = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        tok
    }

    fn at_kind(&self, kind: TokKind) -> bool {
        self.peek().kind == kind
    }

    fn at_op(&self, op: &str) -> bool {
        let t = self.peek();
        t.kind == TokKind::Op && t.text == op
    }

    fn at_name(&self, name: &str) -> bool {
        let t = self.peek();
        t.kind == TokKind::Name && t.text == name
    }

    fn at_ident(&self) -> bool {
        let t = self.peek();
        t.kind == TokKind::Name && !KEYWORDS.contains(&t.text.as_str())
    }

    fn error<T>(&self, message: impl Into<String>) -> Result<T> {
        Err(ParserError::Syntax {
            message: message.into(),
            offset: self.peek().span.start,
        })
    }

    fn expect_op(&mut self, op: &str) -> Result<Span> {
        if self.at_op(op) {
            Ok(self.bump().span)
        } else {
            self.error(format!("expected '{}', found '{}'", op, self.peek().text))
        }
    }

    fn expect_keyword(&mut self, kw: &str) -> Result<Span> {
        if self.at_name(kw) {
            Ok(self.bump().span)
        } else {
            self.error(format!("expected '{}', found '{}'", kw, self.peek().text))
        }
    }

    fn expect_ident(&mut self) -> Result<NameItem> {
        if self.at_ident() {
            let tok = self.bump();
            Ok(NameItem {
                name: tok.text,
                span: tok.span,
            })
        } else {
            self.error(format!("expected identifier, found '{}'", self.peek().text))
        }
    }

    fn expect_newline(&mut self) -> Result<()> {
        if self.at_kind(TokKind::Newline) {
            self.bump();
            Ok(())
        } else if self.at_kind(TokKind::EndMarker) {
            Ok(())
        } else {
            self.error(format!("expected end of line, found '{}'", self.peek().text))
        }
    }

    // ------------------------------------------------------------------
    // Module and statements
    // ------------------------------------------------------------------

    fn module(&mut self, src_len: usize) -> Result<Module> {
        let mut body = Vec::new();
        while !self.at_kind(TokKind::EndMarker) {
            if self.at_kind(TokKind::Indent) {
                return self.error("unexpected indent");
            }
            if self.at_kind(TokKind::Dedent) || self.at_kind(TokKind::Newline) {
                self.bump();
                continue;
            }
            self.statements_into(&mut body)?;
        }
        Ok(Module {
            body,
            span: Span::new(0, src_len),
        })
    }

    /// Parse one logical statement (possibly several small statements on a
    /// single line) and append them to `out`.
    fn statements_into(&mut self, out: &mut Vec<Statement>) -> Result<()> {
        if self.at_op("@") {
            let stmt = self.decorated()?;
            out.push(stmt);
            return Ok(());
        }
        if self.at_kind(TokKind::Name) {
            let keyword = self.peek().text.clone();
            match keyword.as_str() {
                "def" => {
                    let stmt = self.function_def(Vec::new(), false, None)?;
                    out.push(stmt);
                    return Ok(());
                }
                "class" => {
                    let stmt = self.class_def(Vec::new())?;
                    out.push(stmt);
                    return Ok(());
                }
                "async" => {
                    let stmt = self.async_statement(Vec::new())?;
                    out.push(stmt);
                    return Ok(());
                }
                "if" => {
                    let stmt = self.if_statement()?;
                    out.push(stmt);
                    return Ok(());
                }
                "while" => {
                    let stmt = self.while_statement()?;
                    out.push(stmt);
                    return Ok(());
                }
                "for" => {
                    let stmt = self.for_statement(false, None)?;
                    out.push(stmt);
                    return Ok(());
                }
                "with" => {
                    let stmt = self.with_statement(false, None)?;
                    out.push(stmt);
                    return Ok(());
                }
                "try" => {
                    let stmt = self.try_statement()?;
                    out.push(stmt);
                    return Ok(());
                }
                _ => {}
            }
        }
        self.simple_statement_line(out)
    }

    fn simple_statement_line(&mut self, out: &mut Vec<Statement>) -> Result<()> {
        loop {
            let stmt = self.small_statement()?;
            out.push(stmt);
            if self.at_op(";") {
                self.bump();
                if self.at_kind(TokKind::Newline) || self.at_kind(TokKind::EndMarker) {
                    break;
                }
                continue;
            }
            break;
        }
        self.expect_newline()
    }

    fn small_statement(&mut self) -> Result<Statement> {
        if self.at_kind(TokKind::Name) {
            let keyword = self.peek().text.clone();
            match keyword.as_str() {
                "pass" => {
                    let span = self.bump().span;
                    return Ok(Statement::Pass(Pass { span }));
                }
                "break" => {
                    let span = self.bump().span;
                    return Ok(Statement::Break(Break { span }));
                }
                "continue" => {
                    let span = self.bump().span;
                    return Ok(Statement::Continue(Continue { span }));
                }
                "return" => return self.return_statement(),
                "raise" => return self.raise_statement(),
                "global" => return self.global_statement(),
                "nonlocal" => return self.nonlocal_statement(),
                "import" => return self.import_statement(),
                "from" => return self.import_from_statement(),
                "del" => return self.del_statement(),
                "assert" => return self.assert_statement(),
                _ => {}
            }
        }
        self.expression_statement()
    }

    fn return_statement(&mut self) -> Result<Statement> {
        let kw = self.bump().span;
        let value = if self.ends_expression() {
            None
        } else {
            Some(self.testlist_star_expr()?)
        };
        let end = value.as_ref().map(|v| v.span().end).unwrap_or(kw.end);
        Ok(Statement::Return(Return {
            value,
            span: Span::new(kw.start, end),
        }))
    }

    fn raise_statement(&mut self) -> Result<Statement> {
        let kw = self.bump().span;
        let mut exc = None;
        let mut cause = None;
        let mut end = kw.end;
        if !self.ends_expression() {
            let e = self.expression()?;
            end = e.span().end;
            exc = Some(e);
            if self.at_name("from") {
                self.bump();
                let c = self.expression()?;
                end = c.span().end;
                cause = Some(c);
            }
        }
        Ok(Statement::Raise(Raise {
            exc,
            cause,
            span: Span::new(kw.start, end),
        }))
    }

    fn global_statement(&mut self) -> Result<Statement> {
        let kw = self.bump().span;
        let names = self.name_list()?;
        let end = names.last().map(|n| n.span.end).unwrap_or(kw.end);
        Ok(Statement::Global(Global {
            names,
            span: Span::new(kw.start, end),
        }))
    }

    fn nonlocal_statement(&mut self) -> Result<Statement> {
        let kw = self.bump().span;
        let names = self.name_list()?;
        let end = names.last().map(|n| n.span.end).unwrap_or(kw.end);
        Ok(Statement::Nonlocal(Nonlocal {
            names,
            span: Span::new(kw.start, end),
        }))
    }

    fn name_list(&mut self) -> Result<Vec<NameItem>> {
        let mut names = vec![self.expect_ident()?];
        while self.at_op(",") {
            self.bump();
            names.push(self.expect_ident()?);
        }
        Ok(names)
    }

    fn import_statement(&mut self) -> Result<Statement> {
        let kw = self.bump().span;
        let mut names = vec![self.import_alias()?];
        while self.at_op(",") {
            self.bump();
            names.push(self.import_alias()?);
        }
        let end = names
            .last()
            .map(|a| a.asname.as_ref().map(|n| n.span.end).unwrap_or(a.name_span.end))
            .unwrap_or(kw.end);
        Ok(Statement::Import(Import {
            names,
            span: Span::new(kw.start, end),
        }))
    }

    fn import_from_statement(&mut self) -> Result<Statement> {
        let kw = self.bump().span;
        let mut level = 0usize;
        loop {
            if self.at_op(".") {
                self.bump();
                level += 1;
            } else if self.at_op("...") {
                self.bump();
                level += 3;
            } else {
                break;
            }
        }
        let module = if self.at_name("import") {
            None
        } else {
            Some(self.dotted_name()?.name)
        };
        self.expect_keyword("import")?;
        let mut names = Vec::new();
        let mut is_star = false;
        let end;
        if self.at_op("*") {
            end = self.bump().span.end;
            is_star = true;
        } else if self.at_op("(") {
            self.bump();
            loop {
                if self.at_op(")") {
                    break;
                }
                names.push(self.import_alias()?);
                if self.at_op(",") {
                    self.bump();
                } else {
                    break;
                }
            }
            end = self.expect_op(")")?.end;
        } else {
            names.push(self.import_alias()?);
            while self.at_op(",") {
                self.bump();
                names.push(self.import_alias()?);
            }
            end = names
                .last()
                .map(|a| a.asname.as_ref().map(|n| n.span.end).unwrap_or(a.name_span.end))
                .unwrap_or(kw.end);
        }
        Ok(Statement::ImportFrom(ImportFrom {
            module,
            level,
            names,
            is_star,
            span: Span::new(kw.start, end),
        }))
    }

    fn dotted_name(&mut self) -> Result<NameItem> {
        let first = self.expect_ident()?;
        let mut name = first.name;
        let mut end = first.span.end;
        while self.at_op(".") && self.peek_ahead(1).kind == TokKind::Name {
            self.bump();
            let part = self.expect_ident()?;
            name.push('.');
            name.push_str(&part.name);
            end = part.span.end;
        }
        Ok(NameItem {
            name,
            span: Span::new(first.span.start, end),
        })
    }

    fn import_alias(&mut self) -> Result<ImportAlias> {
        let name = self.dotted_name()?;
        let asname = if self.at_name("as") {
            self.bump();
            Some(self.expect_ident()?)
        } else {
            None
        };
        Ok(ImportAlias {
            name: name.name,
            name_span: name.span,
            asname,
        })
    }

    fn del_statement(&mut self) -> Result<Statement> {
        let kw = self.bump().span;
        let mut targets = vec![self.target_item()?];
        while self.at_op(",") {
            self.bump();
            if self.ends_expression() {
                break;
            }
            targets.push(self.target_item()?);
        }
        let end = targets.last().map(|t| t.span().end).unwrap_or(kw.end);
        Ok(Statement::Del(Del {
            targets,
            span: Span::new(kw.start, end),
        }))
    }

    fn assert_statement(&mut self) -> Result<Statement> {
        let kw = self.bump().span;
        let test = self.expression()?;
        let mut end = test.span().end;
        let msg = if self.at_op(",") {
            self.bump();
            let m = self.expression()?;
            end = m.span().end;
            Some(m)
        } else {
            None
        };
        Ok(Statement::Assert(Assert {
            test,
            msg,
            span: Span::new(kw.start, end),
        }))
    }

    fn expression_statement(&mut self) -> Result<Statement> {
        let first = self.testlist_star_expr()?;
        let start = first.span().start;

        if self.at_op(":") {
            self.bump();
            let annotation = self.expression()?;
            let mut end = annotation.span().end;
            let value = if self.at_op("=") {
                self.bump();
                let v = self.assigned_value()?;
                end = v.span().end;
                Some(v)
            } else {
                None
            };
            return Ok(Statement::AnnAssign(AnnAssign {
                target: first,
                annotation,
                value,
                span: Span::new(start, end),
            }));
        }

        if self.at_op("=") {
            let mut targets = vec![first];
            let mut last = None;
            while self.at_op("=") {
                self.bump();
                let next = self.assigned_value()?;
                if let Some(prev) = last.replace(next) {
                    targets.push(prev);
                }
            }
            // `last` is always Some after at least one `=`.
            let value = match last {
                Some(v) => v,
                None => return self.error("assignment without value"),
            };
            let end = value.span().end;
            return Ok(Statement::Assign(Assign {
                targets,
                value,
                span: Span::new(start, end),
            }));
        }

        if self.peek().kind == TokKind::Op && AUG_OPS.contains(&self.peek().text.as_str()) {
            let op = self.bump().text;
            let value = self.assigned_value()?;
            let end = value.span().end;
            return Ok(Statement::AugAssign(AugAssign {
                target: first,
                op,
                value,
                span: Span::new(start, end),
            }));
        }

        let span = first.span();
        Ok(Statement::Expr(ExprStatement { value: first, span }))
    }

    /// The right-hand side of an assignment: a yield expression or a
    /// (possibly starred/tuple) expression list.
    fn assigned_value(&mut self) -> Result<Expression> {
        self.testlist_star_expr()
    }

    // ------------------------------------------------------------------
    // Compound statements
    // ------------------------------------------------------------------

    fn decorated(&mut self) -> Result<Statement> {
        let mut decorators = Vec::new();
        while self.at_op("@") {
            let at = self.bump().span;
            let expr = self.expression()?;
            let span = Span::new(at.start, expr.span().end);
            decorators.push(Decorator { expr, span });
            self.expect_newline()?;
        }
        if self.at_name("def") {
            self.function_def(decorators, false, None)
        } else if self.at_name("async") {
            self.async_statement(decorators)
        } else if self.at_name("class") {
            self.class_def(decorators)
        } else {
            self.error("expected 'def', 'async' or 'class' after decorators")
        }
    }

    fn async_statement(&mut self, decorators: Vec<Decorator>) -> Result<Statement> {
        let kw = self.expect_keyword("async")?;
        if self.at_name("def") {
            self.function_def(decorators, true, Some(kw.start))
        } else if self.at_name("for") {
            self.for_statement(true, Some(kw.start))
        } else if self.at_name("with") {
            self.with_statement(true, Some(kw.start))
        } else {
            self.error("expected 'def', 'for' or 'with' after 'async'")
        }
    }

    fn function_def(
        &mut self,
        decorators: Vec<Decorator>,
        is_async: bool,
        async_start: Option<usize>,
    ) -> Result<Statement> {
        let kw = self.expect_keyword("def")?;
        let start = async_start.unwrap_or(kw.start);
        let name = self.expect_ident()?;
        self.expect_op("(")?;
        let params = self.def_parameters()?;
        let rpar_span = self.expect_op(")")?;
        let returns = if self.at_op("->") {
            let arrow_span = self.bump().span;
            let expr = self.expression()?;
            Some(ReturnAnnotation { arrow_span, expr })
        } else {
            None
        };
        let colon_span = self.expect_op(":")?;
        let body = self.suite()?;
        let end = body.last().map(|s| s.span().end).unwrap_or(colon_span.end);
        Ok(Statement::FunctionDef(FunctionDef {
            name: name.name,
            name_span: name.span,
            decorators,
            params,
            rpar_span,
            returns,
            colon_span,
            body,
            is_async,
            span: Span::new(start, end),
        }))
    }

    fn def_parameters(&mut self) -> Result<Parameters> {
        let start = self.peek().span.start;
        let mut params = Vec::new();
        loop {
            if self.at_op(")") {
                break;
            }
            let param = self.def_parameter()?;
            params.push(param);
            if self.at_op(",") {
                self.bump();
            } else {
                break;
            }
        }
        let end = params.last().map(|p| p.span.end).unwrap_or(start);
        Ok(Parameters {
            params,
            span: Span::new(start, end.max(start)),
        })
    }

    fn def_parameter(&mut self) -> Result<Param> {
        if self.at_op("/") {
            let span = self.bump().span;
            return Ok(Param {
                name: "/".to_string(),
                name_span: span,
                kind: ParamKind::SlashMarker,
                annotation: None,
                default: None,
                span,
            });
        }
        if self.at_op("*") {
            let star = self.bump().span;
            if self.at_op(",") || self.at_op(")") {
                return Ok(Param {
                    name: "*".to_string(),
                    name_span: star,
                    kind: ParamKind::StarMarker,
                    annotation: None,
                    default: None,
                    span: star,
                });
            }
            return self.named_parameter(ParamKind::Star, star.start);
        }
        if self.at_op("**") {
            let star = self.bump().span;
            return self.named_parameter(ParamKind::StarStar, star.start);
        }
        let start = self.peek().span.start;
        self.named_parameter(ParamKind::Positional, start)
    }

    fn named_parameter(&mut self, kind: ParamKind, start: usize) -> Result<Param> {
        let name = self.expect_ident()?;
        let mut end = name.span.end;
        let annotation = if self.at_op(":") {
            self.bump();
            let ann = self.expression()?;
            end = ann.span().end;
            Some(ann)
        } else {
            None
        };
        let default = if self.at_op("=") {
            self.bump();
            let d = self.expression()?;
            end = d.span().end;
            Some(d)
        } else {
            None
        };
        Ok(Param {
            name: name.name,
            name_span: name.span,
            kind,
            annotation,
            default,
            span: Span::new(start, end),
        })
    }

    fn class_def(&mut self, decorators: Vec<Decorator>) -> Result<Statement> {
        let kw = self.expect_keyword("class")?;
        let name = self.expect_ident()?;
        let mut bases = Vec::new();
        if self.at_op("(") {
            self.bump();
            loop {
                if self.at_op(")") {
                    break;
                }
                if self.at_op("*") || self.at_op("**") {
                    self.bump();
                }
                let base = self.expression()?;
                if self.at_op("=") {
                    // keyword argument (e.g. metaclass=...); keep its value
                    self.bump();
                    let value = self.expression()?;
                    bases.push(value);
                } else {
                    bases.push(base);
                }
                if self.at_op(",") {
                    self.bump();
                } else {
                    break;
                }
            }
            self.expect_op(")")?;
        }
        let colon = self.expect_op(":")?;
        let body = self.suite()?;
        let end = body.last().map(|s| s.span().end).unwrap_or(colon.end);
        Ok(Statement::ClassDef(ClassDef {
            name: name.name,
            name_span: name.span,
            decorators,
            bases,
            body,
            span: Span::new(kw.start, end),
        }))
    }

    fn if_statement(&mut self) -> Result<Statement> {
        let kw = self.expect_keyword("if")?;
        let test = self.expression()?;
        self.expect_op(":")?;
        let body = self.suite()?;
        let orelse = self.elif_else()?;
        let end = orelse
            .last()
            .map(|s| s.span().end)
            .or_else(|| body.last().map(|s| s.span().end))
            .unwrap_or(kw.end);
        Ok(Statement::If(If {
            test,
            body,
            orelse,
            span: Span::new(kw.start, end),
        }))
    }

    fn elif_else(&mut self) -> Result<Vec<Statement>> {
        if self.at_name("elif") {
            let kw = self.bump().span;
            let test = self.expression()?;
            self.expect_op(":")?;
            let body = self.suite()?;
            let orelse = self.elif_else()?;
            let end = orelse
                .last()
                .map(|s| s.span().end)
                .or_else(|| body.last().map(|s| s.span().end))
                .unwrap_or(kw.end);
            return Ok(vec![Statement::If(If {
                test,
                body,
                orelse,
                span: Span::new(kw.start, end),
            })]);
        }
        if self.at_name("else") {
            self.bump();
            self.expect_op(":")?;
            return self.suite();
        }
        Ok(Vec::new())
    }

    fn while_statement(&mut self) -> Result<Statement> {
        let kw = self.expect_keyword("while")?;
        let test = self.expression()?;
        self.expect_op(":")?;
        let body = self.suite()?;
        let orelse = if self.at_name("else") {
            self.bump();
            self.expect_op(":")?;
            self.suite()?
        } else {
            Vec::new()
        };
        let end = orelse
            .last()
            .map(|s| s.span().end)
            .or_else(|| body.last().map(|s| s.span().end))
            .unwrap_or(kw.end);
        Ok(Statement::While(While {
            test,
            body,
            orelse,
            span: Span::new(kw.start, end),
        }))
    }

    fn for_statement(&mut self, is_async: bool, async_start: Option<usize>) -> Result<Statement> {
        let kw = self.expect_keyword("for")?;
        let start = async_start.unwrap_or(kw.start);
        let target = self.target_list()?;
        self.expect_keyword("in")?;
        let iter = self.testlist_star_expr()?;
        let colon_span = self.expect_op(":")?;
        let body = self.suite()?;
        let orelse = if self.at_name("else") {
            self.bump();
            self.expect_op(":")?;
            self.suite()?
        } else {
            Vec::new()
        };
        let end = orelse
            .last()
            .map(|s| s.span().end)
            .or_else(|| body.last().map(|s| s.span().end))
            .unwrap_or(colon_span.end);
        Ok(Statement::For(For {
            target,
            iter,
            body,
            orelse,
            colon_span,
            is_async,
            span: Span::new(start, end),
        }))
    }

    fn with_statement(&mut self, is_async: bool, async_start: Option<usize>) -> Result<Statement> {
        let kw = self.expect_keyword("with")?;
        let start = async_start.unwrap_or(kw.start);
        let mut items = vec![self.with_item()?];
        while self.at_op(",") {
            self.bump();
            items.push(self.with_item()?);
        }
        let colon_span = self.expect_op(":")?;
        let body = self.suite()?;
        let end = body.last().map(|s| s.span().end).unwrap_or(colon_span.end);
        Ok(Statement::With(With {
            items,
            body,
            colon_span,
            is_async,
            span: Span::new(start, end),
        }))
    }

    fn with_item(&mut self) -> Result<WithItem> {
        let context = self.expression()?;
        let start = context.span().start;
        let mut end = context.span().end;
        let target = if self.at_name("as") {
            self.bump();
            let t = self.target_item()?;
            end = t.span().end;
            Some(t)
        } else {
            None
        };
        Ok(WithItem {
            context,
            target,
            span: Span::new(start, end),
        })
    }

    fn try_statement(&mut self) -> Result<Statement> {
        let kw = self.expect_keyword("try")?;
        self.expect_op(":")?;
        let body = self.suite()?;
        let mut handlers = Vec::new();
        while self.at_name("except") {
            let except_kw = self.bump().span;
            if self.at_op("*") {
                self.bump();
            }
            let mut typ = None;
            let mut name = None;
            if !self.at_op(":") {
                typ = Some(self.expression()?);
                if self.at_name("as") {
                    self.bump();
                    name = Some(self.expect_ident()?);
                }
            }
            let colon = self.expect_op(":")?;
            let hbody = self.suite()?;
            let hend = hbody.last().map(|s| s.span().end).unwrap_or(colon.end);
            handlers.push(ExceptHandler {
                typ,
                name,
                body: hbody,
                span: Span::new(except_kw.start, hend),
            });
        }
        let orelse = if self.at_name("else") {
            self.bump();
            self.expect_op(":")?;
            self.suite()?
        } else {
            Vec::new()
        };
        let finalbody = if self.at_name("finally") {
            self.bump();
            self.expect_op(":")?;
            self.suite()?
        } else {
            Vec::new()
        };
        let end = finalbody
            .last()
            .map(|s| s.span().end)
            .or_else(|| orelse.last().map(|s| s.span().end))
            .or_else(|| handlers.last().map(|h| h.span.end))
            .or_else(|| body.last().map(|s| s.span().end))
            .unwrap_or(kw.end);
        Ok(Statement::Try(Try {
            body,
            handlers,
            orelse,
            finalbody,
            span: Span::new(kw.start, end),
        }))
    }

    fn suite(&mut self) -> Result<Vec<Statement>> {
        if self.at_kind(TokKind::Newline) {
            self.bump();
            if !self.at_kind(TokKind::Indent) {
                return self.error("expected an indented block");
            }
            self.bump();
            let mut body = Vec::new();
            while !self.at_kind(TokKind::Dedent) && !self.at_kind(TokKind::EndMarker) {
                self.statements_into(&mut body)?;
            }
            if self.at_kind(TokKind::Dedent) {
                self.bump();
            }
            if body.is_empty() {
                return self.error("empty block");
            }
            Ok(body)
        } else {
            let mut body = Vec::new();
            self.simple_statement_line(&mut body)?;
            Ok(body)
        }
    }

    // ------------------------------------------------------------------
    // Targets
    // ------------------------------------------------------------------

    /// A comma-separated target list (`for` loop headers, `del`).
    fn target_list(&mut self) -> Result<Expression> {
        let first = self.target_item()?;
        if !self.at_op(",") {
            return Ok(first);
        }
        let start = first.span().start;
        let mut elements = vec![first];
        let mut end = elements[0].span().end;
        while self.at_op(",") {
            self.bump();
            if self.at_name("in") || self.at_op(":") || self.ends_expression() {
                break;
            }
            let t = self.target_item()?;
            end = t.span().end;
            elements.push(t);
        }
        if elements.len() == 1 {
            let single = elements.remove(0);
            return Ok(single);
        }
        Ok(Expression::Tuple(Tuple {
            elements,
            span: Span::new(start, end),
        }))
    }

    /// A single assignment target: name, attribute, subscript, starred, or a
    /// parenthesized/bracketed pattern. Parsed below comparison precedence so
    /// `in` is left for the `for` header.
    fn target_item(&mut self) -> Result<Expression> {
        if self.at_op("*") {
            let star = self.bump().span;
            let value = self.bitor_expr()?;
            let span = Span::new(star.start, value.span().end);
            return Ok(Expression::Starred(Box::new(Starred { value, span })));
        }
        self.bitor_expr()
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    /// True when the next token cannot start an expression.
    fn ends_expression(&self) -> bool {
        match self.peek().kind {
            TokKind::Newline | TokKind::EndMarker | TokKind::Dedent | TokKind::Indent => true,
            TokKind::Op => matches!(
                self.peek().text.as_str(),
                ")" | "]" | "}" | ":" | ";" | "," | "="
            ),
            TokKind::Name => false,
            _ => false,
        }
    }

    /// An expression list with optional stars: `a, *b, c`. Produces a
    /// [`Tuple`] when more than one element (or a trailing comma) is present.
    fn testlist_star_expr(&mut self) -> Result<Expression> {
        let first = self.star_or_test()?;
        if !self.at_op(",") {
            return Ok(first);
        }
        let start = first.span().start;
        let mut end = first.span().end;
        let mut elements = vec![first];
        let mut trailing = false;
        while self.at_op(",") {
            let comma = self.bump().span;
            if self.ends_expression() {
                trailing = true;
                end = comma.end;
                break;
            }
            let next = self.star_or_test()?;
            end = next.span().end;
            elements.push(next);
        }
        if elements.len() == 1 && !trailing {
            let single = elements.remove(0);
            return Ok(single);
        }
        Ok(Expression::Tuple(Tuple {
            elements,
            span: Span::new(start, end),
        }))
    }

    fn star_or_test(&mut self) -> Result<Expression> {
        if self.at_op("*") {
            let star = self.bump().span;
            let value = self.bitor_expr()?;
            let span = Span::new(star.start, value.span().end);
            return Ok(Expression::Starred(Box::new(Starred { value, span })));
        }
        self.expression()
    }

    /// `test`: lambda, conditional expression, walrus, or `or_test`.
    pub(crate) fn expression(&mut self) -> Result<Expression> {
        if self.at_name("lambda") {
            return self.lambda();
        }
        if self.at_name("yield") {
            return self.yield_expression();
        }
        let body = self.or_test()?;
        if self.at_op(":=") {
            if let Expression::Name(target) = body {
                self.bump();
                let value = self.expression()?;
                let span = Span::new(target.span.start, value.span().end);
                return Ok(Expression::NamedExpr(Box::new(NamedExpr {
                    target,
                    value,
                    span,
                })));
            }
            return self.error("invalid target for walrus operator");
        }
        if self.at_name("if") {
            self.bump();
            let test = self.or_test()?;
            self.expect_keyword("else")?;
            let orelse = self.expression()?;
            let span = Span::new(body.span().start, orelse.span().end);
            return Ok(Expression::IfExp(Box::new(IfExp {
                body,
                test,
                orelse,
                span,
            })));
        }
        Ok(body)
    }

    fn lambda(&mut self) -> Result<Expression> {
        let kw = self.expect_keyword("lambda")?;
        let pstart = self.peek().span.start;
        let mut params = Vec::new();
        loop {
            if self.at_op(":") {
                break;
            }
            let param = if self.at_op("*") {
                let star = self.bump().span;
                if self.at_op(",") || self.at_op(":") {
                    Param {
                        name: "*".to_string(),
                        name_span: star,
                        kind: ParamKind::StarMarker,
                        annotation: None,
                        default: None,
                        span: star,
                    }
                } else {
                    self.lambda_parameter(ParamKind::Star, star.start)?
                }
            } else if self.at_op("**") {
                let star = self.bump().span;
                self.lambda_parameter(ParamKind::StarStar, star.start)?
            } else {
                let start = self.peek().span.start;
                self.lambda_parameter(ParamKind::Positional, start)?
            };
            params.push(param);
            if self.at_op(",") {
                self.bump();
            } else {
                break;
            }
        }
        let pend = params.last().map(|p| p.span.end).unwrap_or(pstart);
        self.expect_op(":")?;
        let body = self.expression()?;
        let span = Span::new(kw.start, body.span().end);
        Ok(Expression::Lambda(Box::new(Lambda {
            params: Parameters {
                params,
                span: Span::new(pstart, pend.max(pstart)),
            },
            body,
            span,
        })))
    }

    fn lambda_parameter(&mut self, kind: ParamKind, start: usize) -> Result<Param> {
        let name = self.expect_ident()?;
        let mut end = name.span.end;
        let default = if self.at_op("=") {
            self.bump();
            let d = self.expression()?;
            end = d.span().end;
            Some(d)
        } else {
            None
        };
        Ok(Param {
            name: name.name,
            name_span: name.span,
            kind,
            annotation: None,
            default,
            span: Span::new(start, end),
        })
    }

    fn yield_expression(&mut self) -> Result<Expression> {
        let kw = self.expect_keyword("yield")?;
        if self.at_name("from") {
            self.bump();
            let value = self.expression()?;
            let span = Span::new(kw.start, value.span().end);
            return Ok(Expression::Yield(Box::new(Yield {
                value: Some(value),
                is_from: true,
                span,
            })));
        }
        if self.ends_expression() {
            return Ok(Expression::Yield(Box::new(Yield {
                value: None,
                is_from: false,
                span: kw,
            })));
        }
        let value = self.testlist_star_expr()?;
        let span = Span::new(kw.start, value.span().end);
        Ok(Expression::Yield(Box::new(Yield {
            value: Some(value),
            is_from: false,
            span,
        })))
    }

    fn or_test(&mut self) -> Result<Expression> {
        let first = self.and_test()?;
        if !self.at_name("or") {
            return Ok(first);
        }
        let start = first.span().start;
        let mut values = vec![first];
        while self.at_name("or") {
            self.bump();
            values.push(self.and_test()?);
        }
        let end = values.last().map(|v| v.span().end).unwrap_or(start);
        Ok(Expression::BoolOp(Box::new(BoolOp {
            op: BoolOpKind::Or,
            values,
            span: Span::new(start, end),
        })))
    }

    fn and_test(&mut self) -> Result<Expression> {
        let first = self.not_test()?;
        if !self.at_name("and") {
            return Ok(first);
        }
        let start = first.span().start;
        let mut values = vec![first];
        while self.at_name("and") {
            self.bump();
            values.push(self.not_test()?);
        }
        let end = values.last().map(|v| v.span().end).unwrap_or(start);
        Ok(Expression::BoolOp(Box::new(BoolOp {
            op: BoolOpKind::And,
            values,
            span: Span::new(start, end),
        })))
    }

    fn not_test(&mut self) -> Result<Expression> {
        if self.at_name("not") {
            let kw = self.bump().span;
            let operand = self.not_test()?;
            let span = Span::new(kw.start, operand.span().end);
            return Ok(Expression::UnaryOp(Box::new(UnaryOp {
                op: UnOp::Not,
                operand,
                span,
            })));
        }
        self.comparison()
    }

    fn comparison(&mut self) -> Result<Expression> {
        let left = self.bitor_expr()?;
        let mut comparisons = Vec::new();
        loop {
            let op = if self.at_op("==") {
                CmpOp::Eq
            } else if self.at_op("!=") {
                CmpOp::NotEq
            } else if self.at_op("<=") {
                CmpOp::LtE
            } else if self.at_op(">=") {
                CmpOp::GtE
            } else if self.at_op("<") {
                CmpOp::Lt
            } else if self.at_op(">") {
                CmpOp::Gt
            } else if self.at_name("in") {
                CmpOp::In
            } else if self.at_name("is") {
                if self.peek_ahead(1).kind == TokKind::Name && self.peek_ahead(1).text == "not" {
                    self.bump();
                    CmpOp::IsNot
                } else {
                    CmpOp::Is
                }
            } else if self.at_name("not") && self.peek_ahead(1).text == "in" {
                self.bump();
                CmpOp::NotIn
            } else {
                break;
            };
            self.bump();
            let right = self.bitor_expr()?;
            comparisons.push((op, right));
        }
        if comparisons.is_empty() {
            return Ok(left);
        }
        let start = left.span().start;
        let end = comparisons
            .last()
            .map(|(_, e)| e.span().end)
            .unwrap_or(start);
        Ok(Expression::Compare(Box::new(Compare {
            left,
            comparisons,
            span: Span::new(start, end),
        })))
    }

    fn binary_chain(
        &mut self,
        next: fn(&mut Self) -> Result<Expression>,
        ops: &[(&str, BinOp)],
    ) -> Result<Expression> {
        let mut left = next(self)?;
        'outer: loop {
            for (text, op) in ops {
                if self.at_op(text) {
                    self.bump();
                    let right = next(self)?;
                    let span = Span::new(left.span().start, right.span().end);
                    left = Expression::BinaryOp(Box::new(BinaryOp {
                        left,
                        op: *op,
                        right,
                        span,
                    }));
                    continue 'outer;
                }
            }
            break;
        }
        Ok(left)
    }

    fn bitor_expr(&mut self) -> Result<Expression> {
        self.binary_chain(Self::bitxor_expr, &[("|", BinOp::BitOr)])
    }

    fn bitxor_expr(&mut self) -> Result<Expression> {
        self.binary_chain(Self::bitand_expr, &[("^", BinOp::BitXor)])
    }

    fn bitand_expr(&mut self) -> Result<Expression> {
        self.binary_chain(Self::shift_expr, &[("&", BinOp::BitAnd)])
    }

    fn shift_expr(&mut self) -> Result<Expression> {
        self.binary_chain(
            Self::arith_expr,
            &[("<<", BinOp::LShift), (">>", BinOp::RShift)],
        )
    }

    fn arith_expr(&mut self) -> Result<Expression> {
        self.binary_chain(Self::term, &[("+", BinOp::Add), ("-", BinOp::Sub)])
    }

    fn term(&mut self) -> Result<Expression> {
        self.binary_chain(
            Self::factor,
            &[
                ("*", BinOp::Mul),
                ("@", BinOp::MatMul),
                ("//", BinOp::FloorDiv),
                ("/", BinOp::Div),
                ("%", BinOp::Mod),
            ],
        )
    }

    fn factor(&mut self) -> Result<Expression> {
        let op = if self.at_op("+") {
            Some(UnOp::Plus)
        } else if self.at_op("-") {
            Some(UnOp::Minus)
        } else if self.at_op("~") {
            Some(UnOp::Invert)
        } else {
            None
        };
        if let Some(op) = op {
            let tok = self.bump().span;
            let operand = self.factor()?;
            let span = Span::new(tok.start, operand.span().end);
            return Ok(Expression::UnaryOp(Box::new(UnaryOp { op, operand, span })));
        }
        self.power()
    }

    fn power(&mut self) -> Result<Expression> {
        let base = self.await_primary()?;
        if self.at_op("**") {
            self.bump();
            let exp = self.factor()?;
            let span = Span::new(base.span().start, exp.span().end);
            return Ok(Expression::BinaryOp(Box::new(BinaryOp {
                left: base,
                op: BinOp::Pow,
                right: exp,
                span,
            })));
        }
        Ok(base)
    }

    fn await_primary(&mut self) -> Result<Expression> {
        if self.at_name("await") {
            let kw = self.bump().span;
            let value = self.await_primary()?;
            let span = Span::new(kw.start, value.span().end);
            return Ok(Expression::Await(Box::new(Await { value, span })));
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Expression> {
        let mut expr = self.atom()?;
        loop {
            if self.at_op(".") {
                self.bump();
                let attr = self.expect_ident()?;
                let span = Span::new(expr.span().start, attr.span.end);
                expr = Expression::Attribute(Box::new(Attribute {
                    value: expr,
                    attr: attr.name,
                    attr_span: attr.span,
                    span,
                }));
            } else if self.at_op("(") {
                self.bump();
                let args = self.call_arguments()?;
                let rpar = self.expect_op(")")?;
                let span = Span::new(expr.span().start, rpar.end);
                expr = Expression::Call(Box::new(Call {
                    func: expr,
                    args,
                    span,
                }));
            } else if self.at_op("[") {
                self.bump();
                let slices = self.subscript_list()?;
                let rbr = self.expect_op("]")?;
                let span = Span::new(expr.span().start, rbr.end);
                expr = Expression::Subscript(Box::new(Subscript {
                    value: expr,
                    slices,
                    span,
                }));
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn call_arguments(&mut self) -> Result<Vec<Arg>> {
        let mut args = Vec::new();
        loop {
            if self.at_op(")") {
                break;
            }
            if self.at_op("*") {
                self.bump();
                let value = self.expression()?;
                args.push(Arg {
                    value,
                    keyword: None,
                    star: "*",
                });
            } else if self.at_op("**") {
                self.bump();
                let value = self.expression()?;
                args.push(Arg {
                    value,
                    keyword: None,
                    star: "**",
                });
            } else {
                let value = self.expression()?;
                if self.at_op("=") {
                    if let Expression::Name(name) = &value {
                        let keyword = name.value.clone();
                        self.bump();
                        let kwvalue = self.expression()?;
                        args.push(Arg {
                            value: kwvalue,
                            keyword: Some(keyword),
                            star: "",
                        });
                    } else {
                        return self.error("invalid keyword argument");
                    }
                } else if self.at_name("for") || self.at_name("async") {
                    // Generator expression argument: f(x for x in y)
                    let generators = self.comp_clauses()?;
                    let start = value.span().start;
                    let end = match generators.last() {
                        Some(g) => g
                            .ifs
                            .last()
                            .map(|e| e.span().end)
                            .unwrap_or_else(|| g.iter.span().end),
                        None => start,
                    };
                    args.push(Arg {
                        value: Expression::GeneratorExp(Box::new(Comp {
                            element: value,
                            generators,
                            span: Span::new(start, end),
                        })),
                        keyword: None,
                        star: "",
                    });
                } else {
                    args.push(Arg {
                        value,
                        keyword: None,
                        star: "",
                    });
                }
            }
            if self.at_op(",") {
                self.bump();
            } else {
                break;
            }
        }
        Ok(args)
    }

    fn subscript_list(&mut self) -> Result<Vec<Expression>> {
        let mut slices = Vec::new();
        loop {
            if self.at_op("]") {
                break;
            }
            slices.push(self.subscript_item()?);
            if self.at_op(",") {
                self.bump();
            } else {
                break;
            }
        }
        Ok(slices)
    }

    fn subscript_item(&mut self) -> Result<Expression> {
        let start = self.peek().span.start;
        let lower = if self.at_op(":") {
            None
        } else {
            Some(self.star_or_test()?)
        };
        if !self.at_op(":") {
            return match lower {
                Some(expr) => Ok(expr),
                None => self.error("expected subscript"),
            };
        }
        let mut end = self.bump().span.end; // first ':'
        let upper = if self.at_op(":") || self.at_op("]") || self.at_op(",") {
            None
        } else {
            let e = self.expression()?;
            end = e.span().end;
            Some(e)
        };
        let step = if self.at_op(":") {
            self.bump();
            if self.at_op("]") || self.at_op(",") {
                None
            } else {
                let e = self.expression()?;
                end = e.span().end;
                Some(e)
            }
        } else {
            None
        };
        Ok(Expression::Slice(Box::new(SliceExpr {
            lower,
            upper,
            step,
            span: Span::new(start, end),
        })))
    }

    fn atom(&mut self) -> Result<Expression> {
        let t = self.peek().clone();
        match t.kind {
            TokKind::Name => match t.text.as_str() {
                "True" => {
                    self.bump();
                    Ok(Expression::True(Literal {
                        value: t.text,
                        span: t.span,
                    }))
                }
                "False" => {
                    self.bump();
                    Ok(Expression::False(Literal {
                        value: t.text,
                        span: t.span,
                    }))
                }
                "None" => {
                    self.bump();
                    Ok(Expression::NoneLit(Literal {
                        value: t.text,
                        span: t.span,
                    }))
                }
                "lambda" => self.lambda(),
                name if KEYWORDS.contains(&name) => {
                    self.error(format!("unexpected keyword '{}'", name))
                }
                _ => {
                    self.bump();
                    Ok(Expression::Name(Name {
                        value: t.text,
                        span: t.span,
                    }))
                }
            },
            TokKind::Number => {
                self.bump();
                Ok(classify_number(t.text, t.span))
            }
            TokKind::Str => {
                // Adjacent string literals concatenate implicitly.
                let first = self.bump();
                let mut text = first.text.clone();
                let mut end = first.span.end;
                while self.at_kind(TokKind::Str) {
                    let next = self.bump();
                    text.push_str(&next.text);
                    end = next.span.end;
                }
                Ok(classify_string(text, Span::new(first.span.start, end)))
            }
            TokKind::Op => match t.text.as_str() {
                "(" => self.paren_atom(),
                "[" => self.list_atom(),
                "{" => self.brace_atom(),
                "..." => {
                    self.bump();
                    Ok(Expression::Ellipsis(Literal {
                        value: t.text,
                        span: t.span,
                    }))
                }
                _ => self.error(format!("unexpected token '{}'", t.text)),
            },
            _ => self.error(format!("unexpected token '{}'", t.text)),
        }
    }

    fn paren_atom(&mut self) -> Result<Expression> {
        let lpar = self.expect_op("(")?;
        if self.at_op(")") {
            let rpar = self.bump().span;
            return Ok(Expression::Paren(Box::new(Paren {
                inner: None,
                span: Span::new(lpar.start, rpar.end),
            })));
        }
        let first = self.star_or_test()?;
        if self.at_name("for") || self.at_name("async") {
            let generators = self.comp_clauses()?;
            let rpar = self.expect_op(")")?;
            return Ok(Expression::GeneratorExp(Box::new(Comp {
                element: first,
                generators,
                span: Span::new(lpar.start, rpar.end),
            })));
        }
        if self.at_op(",") {
            let mut elements = vec![first];
            let tstart = elements[0].span().start;
            let mut tend = elements[0].span().end;
            while self.at_op(",") {
                self.bump();
                if self.at_op(")") {
                    break;
                }
                let next = self.star_or_test()?;
                tend = next.span().end;
                elements.push(next);
            }
            let rpar = self.expect_op(")")?;
            return Ok(Expression::Paren(Box::new(Paren {
                inner: Some(Expression::Tuple(Tuple {
                    elements,
                    span: Span::new(tstart, tend),
                })),
                span: Span::new(lpar.start, rpar.end),
            })));
        }
        let rpar = self.expect_op(")")?;
        Ok(Expression::Paren(Box::new(Paren {
            inner: Some(first),
            span: Span::new(lpar.start, rpar.end),
        })))
    }

    fn list_atom(&mut self) -> Result<Expression> {
        let lbr = self.expect_op("[")?;
        if self.at_op("]") {
            let rbr = self.bump().span;
            return Ok(Expression::List(List {
                elements: Vec::new(),
                span: Span::new(lbr.start, rbr.end),
            }));
        }
        let first = self.star_or_test()?;
        if self.at_name("for") || self.at_name("async") {
            let generators = self.comp_clauses()?;
            let rbr = self.expect_op("]")?;
            return Ok(Expression::ListComp(Box::new(Comp {
                element: first,
                generators,
                span: Span::new(lbr.start, rbr.end),
            })));
        }
        let mut elements = vec![first];
        while self.at_op(",") {
            self.bump();
            if self.at_op("]") {
                break;
            }
            elements.push(self.star_or_test()?);
        }
        let rbr = self.expect_op("]")?;
        Ok(Expression::List(List {
            elements,
            span: Span::new(lbr.start, rbr.end),
        }))
    }

    fn brace_atom(&mut self) -> Result<Expression> {
        let lbr = self.expect_op("{")?;
        if self.at_op("}") {
            let rbr = self.bump().span;
            return Ok(Expression::Dict(Dict {
                items: Vec::new(),
                span: Span::new(lbr.start, rbr.end),
            }));
        }
        if self.at_op("**") {
            return self.dict_rest(lbr, None);
        }
        let first = self.star_or_test()?;
        if self.at_op(":") {
            self.bump();
            let value = self.expression()?;
            if self.at_name("for") || self.at_name("async") {
                let generators = self.comp_clauses()?;
                let rbr = self.expect_op("}")?;
                return Ok(Expression::DictComp(Box::new(DictComp {
                    key: first,
                    value,
                    generators,
                    span: Span::new(lbr.start, rbr.end),
                })));
            }
            return self.dict_rest(
                lbr,
                Some(DictItem {
                    key: Some(first),
                    value,
                }),
            );
        }
        if self.at_name("for") || self.at_name("async") {
            let generators = self.comp_clauses()?;
            let rbr = self.expect_op("}")?;
            return Ok(Expression::SetComp(Box::new(Comp {
                element: first,
                generators,
                span: Span::new(lbr.start, rbr.end),
            })));
        }
        let mut elements = vec![first];
        while self.at_op(",") {
            self.bump();
            if self.at_op("}") {
                break;
            }
            elements.push(self.star_or_test()?);
        }
        let rbr = self.expect_op("}")?;
        Ok(Expression::Set(SetLit {
            elements,
            span: Span::new(lbr.start, rbr.end),
        }))
    }

    fn dict_rest(&mut self, lbr: Span, first: Option<DictItem>) -> Result<Expression> {
        let mut items = Vec::new();
        if let Some(item) = first {
            items.push(item);
        } else {
            // Positioned at the leading `**`.
            self.expect_op("**")?;
            let value = self.bitor_expr()?;
            items.push(DictItem { key: None, value });
        }
        while self.at_op(",") {
            self.bump();
            if self.at_op("}") {
                break;
            }
            if self.at_op("**") {
                self.bump();
                let value = self.bitor_expr()?;
                items.push(DictItem { key: None, value });
                continue;
            }
            let key = self.expression()?;
            self.expect_op(":")?;
            let value = self.expression()?;
            items.push(DictItem {
                key: Some(key),
                value,
            });
        }
        let rbr = self.expect_op("}")?;
        Ok(Expression::Dict(Dict {
            items,
            span: Span::new(lbr.start, rbr.end),
        }))
    }

    fn comp_clauses(&mut self) -> Result<Vec<Comprehension>> {
        let mut generators = Vec::new();
        loop {
            let is_async = if self.at_name("async") {
                self.bump();
                true
            } else {
                false
            };
            if !self.at_name("for") {
                if is_async {
                    return self.error("expected 'for' after 'async' in comprehension");
                }
                break;
            }
            self.bump();
            let target = self.target_list()?;
            self.expect_keyword("in")?;
            let iter = self.or_test()?;
            let mut ifs = Vec::new();
            while self.at_name("if") {
                self.bump();
                ifs.push(self.or_test()?);
            }
            generators.push(Comprehension {
                target,
                iter,
                ifs,
                is_async,
            });
        }
        if generators.is_empty() {
            return self.error("expected comprehension clause");
        }
        Ok(generators)
    }
}

fn classify_number(text: String, span: Span) -> Expression {
    let lower = text.to_ascii_lowercase();
    if lower.ends_with('j') {
        return Expression::Imaginary(Literal { value: text, span });
    }
    if lower.starts_with("0x") || lower.starts_with("0o") || lower.starts_with("0b") {
        return Expression::Int(Literal { value: text, span });
    }
    if lower.contains('.') || lower.contains('e') {
        return Expression::Float(Literal { value: text, span });
    }
    Expression::Int(Literal { value: text, span })
}

fn classify_string(text: String, span: Span) -> Expression {
    let prefix_len = text.find(|c| c == '\'' || c == '"').unwrap_or(0);
    let prefix = text[..prefix_len].to_ascii_lowercase();
    if prefix.contains('b') {
        Expression::Bytes(StrLit { value: text, span })
    } else if prefix.contains('f') || prefix.contains('t') {
        Expression::FString(StrLit { value: text, span })
    } else {
        Expression::Str(StrLit { value: text, span })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(src: &str) -> Module {
        parse(src).unwrap_or_else(|e| panic!("'{}' does not parse: {}", src, e))
    }

    fn only_stmt(module: &Module) -> &Statement {
        assert_eq!(module.body.len(), 1, "expected one statement");
        &module.body[0]
    }

    #[test]
    fn simple_assignment() {
        let module = parse_ok("x = 1\n");
        match only_stmt(&module) {
            Statement::Assign(assign) => {
                assert_eq!(assign.targets.len(), 1);
                match &assign.targets[0] {
                    Expression::Name(name) => assert_eq!(name.value, "x"),
                    other => panic!("expected Name target, got {:?}", other),
                }
                assert!(matches!(assign.value, Expression::Int(_)));
            }
            other => panic!("expected Assign, got {:?}", other),
        }
    }

    #[test]
    fn chained_assignment() {
        let module = parse_ok("a = b = 1\n");
        match only_stmt(&module) {
            Statement::Assign(assign) => assert_eq!(assign.targets.len(), 2),
            other => panic!("expected Assign, got {:?}", other),
        }
    }

    #[test]
    fn annotated_assignment() {
        let module = parse_ok("x: int = 5\n");
        match only_stmt(&module) {
            Statement::AnnAssign(ann) => {
                assert!(matches!(ann.target, Expression::Name(_)));
                assert!(ann.value.is_some());
            }
            other => panic!("expected AnnAssign, got {:?}", other),
        }
    }

    #[test]
    fn tuple_assignment() {
        let module = parse_ok("a, b = f()\n");
        match only_stmt(&module) {
            Statement::Assign(assign) => match &assign.targets[0] {
                Expression::Tuple(tuple) => assert_eq!(tuple.elements.len(), 2),
                other => panic!("expected Tuple target, got {:?}", other),
            },
            other => panic!("expected Assign, got {:?}", other),
        }
    }

    #[test]
    fn parenthesized_tuple_assignment() {
        let module = parse_ok("(a, b) = f()\n");
        match only_stmt(&module) {
            Statement::Assign(assign) => match &assign.targets[0] {
                Expression::Paren(paren) => {
                    assert!(matches!(paren.inner, Some(Expression::Tuple(_))))
                }
                other => panic!("expected Paren target, got {:?}", other),
            },
            other => panic!("expected Assign, got {:?}", other),
        }
    }

    #[test]
    fn augmented_assignment() {
        let module = parse_ok("x += 1\n");
        match only_stmt(&module) {
            Statement::AugAssign(aug) => assert_eq!(aug.op, "+="),
            other => panic!("expected AugAssign, got {:?}", other),
        }
    }

    #[test]
    fn attribute_target() {
        let module = parse_ok("self.x = 0\n");
        match only_stmt(&module) {
            Statement::Assign(assign) => match &assign.targets[0] {
                Expression::Attribute(attr) => {
                    assert_eq!(attr.attr, "x");
                    assert!(matches!(&attr.value, Expression::Name(n) if n.value == "self"));
                }
                other => panic!("expected Attribute target, got {:?}", other),
            },
            other => panic!("expected Assign, got {:?}", other),
        }
    }

    #[test]
    fn bare_minimum_funcdef() {
        parse_ok("def f(): ...\n");
    }

    #[test]
    fn funcdef_params_and_spans() {
        let src = "def g(a, b=1):\n    pass\n";
        let module = parse_ok(src);
        match only_stmt(&module) {
            Statement::FunctionDef(func) => {
                assert_eq!(func.name, "g");
                assert_eq!(func.params.params.len(), 2);
                let a = &func.params.params[0];
                assert_eq!(&src[a.span.start..a.span.end], "a");
                let b = &func.params.params[1];
                assert_eq!(&src[b.span.start..b.span.end], "b=1");
                assert_eq!(&src[func.colon_span.start..func.colon_span.end], ":");
                assert_eq!(&src[func.rpar_span.start..func.rpar_span.end], ")");
            }
            other => panic!("expected FunctionDef, got {:?}", other),
        }
    }

    #[test]
    fn funcdef_annotations() {
        let src = "def g(a: int, *args, **kwargs) -> str:\n    return ''\n";
        let module = parse_ok(src);
        match only_stmt(&module) {
            Statement::FunctionDef(func) => {
                assert!(func.params.params[0].annotation.is_some());
                assert_eq!(func.params.params[1].kind, ParamKind::Star);
                assert_eq!(func.params.params[2].kind, ParamKind::StarStar);
                let returns = func.returns.as_ref().expect("return annotation");
                assert_eq!(&src[returns.arrow_span.start..returns.arrow_span.end], "->");
            }
            other => panic!("expected FunctionDef, got {:?}", other),
        }
    }

    #[test]
    fn funcdef_marker_params() {
        let module = parse_ok("def g(a, /, b, *, c):\n    pass\n");
        match only_stmt(&module) {
            Statement::FunctionDef(func) => {
                let kinds: Vec<ParamKind> = func.params.params.iter().map(|p| p.kind).collect();
                assert_eq!(
                    kinds,
                    vec![
                        ParamKind::Positional,
                        ParamKind::SlashMarker,
                        ParamKind::Positional,
                        ParamKind::StarMarker,
                        ParamKind::Positional,
                    ]
                );
            }
            other => panic!("expected FunctionDef, got {:?}", other),
        }
    }

    #[test]
    fn decorated_method_in_class() {
        let src = "class C:\n    @staticmethod\n    def f(x):\n        return x\n";
        let module = parse_ok(src);
        match only_stmt(&module) {
            Statement::ClassDef(class) => {
                assert_eq!(class.name, "C");
                match &class.body[0] {
                    Statement::FunctionDef(func) => {
                        assert_eq!(func.decorators.len(), 1);
                    }
                    other => panic!("expected FunctionDef, got {:?}", other),
                }
            }
            other => panic!("expected ClassDef, got {:?}", other),
        }
    }

    #[test]
    fn for_loop_with_tuple_target() {
        let module = parse_ok("for k, v in items:\n    pass\n");
        match only_stmt(&module) {
            Statement::For(for_stmt) => {
                assert!(matches!(for_stmt.target, Expression::Tuple(_)));
            }
            other => panic!("expected For, got {:?}", other),
        }
    }

    #[test]
    fn with_as_target() {
        let module = parse_ok("with open(p) as f:\n    pass\n");
        match only_stmt(&module) {
            Statement::With(with_stmt) => {
                assert_eq!(with_stmt.items.len(), 1);
                assert!(with_stmt.items[0].target.is_some());
            }
            other => panic!("expected With, got {:?}", other),
        }
    }

    #[test]
    fn if_elif_else() {
        let module = parse_ok("if a:\n    x = 1\nelif b:\n    x = 2\nelse:\n    x = 3\n");
        match only_stmt(&module) {
            Statement::If(if_stmt) => {
                assert_eq!(if_stmt.body.len(), 1);
                match &if_stmt.orelse[0] {
                    Statement::If(elif) => assert_eq!(elif.orelse.len(), 1),
                    other => panic!("expected nested If, got {:?}", other),
                }
            }
            other => panic!("expected If, got {:?}", other),
        }
    }

    #[test]
    fn try_except_finally() {
        let module = parse_ok(
            "try:\n    x = 1\nexcept ValueError as e:\n    pass\nfinally:\n    y = 2\n",
        );
        match only_stmt(&module) {
            Statement::Try(try_stmt) => {
                assert_eq!(try_stmt.handlers.len(), 1);
                assert!(try_stmt.handlers[0].name.is_some());
                assert_eq!(try_stmt.finalbody.len(), 1);
            }
            other => panic!("expected Try, got {:?}", other),
        }
    }

    #[test]
    fn imports() {
        let module = parse_ok("import os.path as p\nfrom . import x\nfrom a.b import (c, d)\n");
        assert_eq!(module.body.len(), 3);
        match &module.body[1] {
            Statement::ImportFrom(imp) => {
                assert_eq!(imp.level, 1);
                assert!(imp.module.is_none());
            }
            other => panic!("expected ImportFrom, got {:?}", other),
        }
    }

    #[test]
    fn global_nonlocal() {
        let module = parse_ok("def f():\n    global a, b\n    nonlocal c\n");
        match only_stmt(&module) {
            Statement::FunctionDef(func) => {
                assert!(matches!(&func.body[0], Statement::Global(g) if g.names.len() == 2));
                assert!(matches!(&func.body[1], Statement::Nonlocal(n) if n.names.len() == 1));
            }
            other => panic!("expected FunctionDef, got {:?}", other),
        }
    }

    #[test]
    fn comprehensions() {
        for src in &[
            "xs = [i for i in range(10)]\n",
            "xs = {i for i in range(10) if i}\n",
            "xs = {k: v for k, v in items}\n",
            "xs = (i * 2 for i in ys)\n",
            "xs = [i for row in grid for i in row]\n",
        ] {
            parse_ok(src);
        }
    }

    #[test]
    fn comprehension_structure() {
        let module = parse_ok("xs = [i for i in ys if i > 0]\n");
        match only_stmt(&module) {
            Statement::Assign(assign) => match &assign.value {
                Expression::ListComp(comp) => {
                    assert_eq!(comp.generators.len(), 1);
                    assert_eq!(comp.generators[0].ifs.len(), 1);
                }
                other => panic!("expected ListComp, got {:?}", other),
            },
            other => panic!("expected Assign, got {:?}", other),
        }
    }

    #[test]
    fn expressions_parse() {
        for src in &[
            "x = a or b and not c\n",
            "x = 1 if p else 2\n",
            "x = lambda a, b=1: a + b\n",
            "x = y[1:2, ::3]\n",
            "x = f(a, b=1, *args, **kwargs)\n",
            "x = a.b.c(d)[0].e\n",
            "x = {'k': 1, **rest}\n",
            "x = (yield)\n",
            "x = a is not b\n",
            "x = a not in b\n",
            "x = -1 ** 2\n",
            "x = await f()\n",
            "x = b'raw' + 'one' 'two'\n",
            "x = t | u\n",
            "print(x, sep='')\n",
            "x = f(i for i in ys)\n",
        ] {
            parse_ok(src);
        }
    }

    #[test]
    fn walrus() {
        let module = parse_ok("y = (n := 10)\n");
        match only_stmt(&module) {
            Statement::Assign(assign) => match &assign.value {
                Expression::Paren(p) => {
                    assert!(matches!(p.inner, Some(Expression::NamedExpr(_))))
                }
                other => panic!("expected Paren, got {:?}", other),
            },
            other => panic!("expected Assign, got {:?}", other),
        }
    }

    #[test]
    fn starred_target() {
        let module = parse_ok("a, *rest = xs\n");
        match only_stmt(&module) {
            Statement::Assign(assign) => match &assign.targets[0] {
                Expression::Tuple(tuple) => {
                    assert!(matches!(tuple.elements[1], Expression::Starred(_)))
                }
                other => panic!("expected Tuple, got {:?}", other),
            },
            other => panic!("expected Assign, got {:?}", other),
        }
    }

    #[test]
    fn semicolon_statements() {
        let module = parse_ok("x = 1; y = 2\n");
        assert_eq!(module.body.len(), 2);
    }

    #[test]
    fn single_statement_with_no_trailing_newline() {
        parse_ok("x = 1");
    }

    #[test]
    fn syntax_error_reports_offset() {
        let err = parse("x = = 1\n").unwrap_err();
        match err {
            ParserError::Syntax { offset, .. } => assert_eq!(offset, 4),
            other => panic!("expected syntax error, got {:?}", other),
        }
    }

    #[test]
    fn keyword_as_identifier_is_error() {
        assert!(parse("def = 1\n").is_err());
        assert!(parse("x = class\n").is_err());
    }

    #[test]
    fn empty_module() {
        let module = parse_ok("");
        assert!(module.body.is_empty());
        let module = parse_ok("\n\n# just a comment\n");
        assert!(module.body.is_empty());
    }

    #[test]
    fn async_constructs() {
        parse_ok("async def f():\n    async with a as b:\n        async for i in xs:\n            await g()\n");
    }
}
