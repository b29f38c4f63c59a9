// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Tokenizer for Python source code.
//!
//! Produces a flat token stream with byte spans. Indentation is made explicit
//! through `Indent`/`Dedent` tokens; logical lines end with `Newline`. Newlines
//! inside brackets and after a trailing backslash are joined away, matching the
//! language's implicit and explicit line-joining rules. Comments never appear
//! in the stream; callers that care about them scan the raw source instead
//! (see the type-comment collector).

use memchr::memchr;
use thiserror::Error;

use hinttool_core::span::Span;

/// The kind of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokKind {
    /// Identifier or keyword.
    Name,
    /// Numeric literal (integer, float, or imaginary).
    Number,
    /// String literal, including prefix and quotes.
    Str,
    /// Operator or delimiter.
    Op,
    /// End of a logical line.
    Newline,
    /// Indentation increase at the start of a logical line.
    Indent,
    /// Indentation decrease at the start of a logical line.
    Dedent,
    /// End of input.
    EndMarker,
}

/// A single token with its source text and byte span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokKind,
    pub text: String,
    pub span: Span,
}

impl Token {
    fn new(kind: TokKind, text: impl Into<String>, start: usize, end: usize) -> Self {
        Token {
            kind,
            text: text.into(),
            span: Span::new(start, end),
        }
    }
}

/// Tokenizer error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokError {
    /// A string literal was not closed before the end of its line or the file.
    #[error("unterminated string literal starting at offset {0}")]
    UnterminatedString(usize),

    /// A dedent did not return to any enclosing indentation level.
    #[error("unindent does not match any outer indentation level at offset {0}")]
    InconsistentDedent(usize),

    /// A character that cannot start any token.
    #[error("invalid character {1:?} at offset {0}")]
    InvalidCharacter(usize, char),
}

/// Multi-character operators, longest first so greedy matching is correct.
const MULTI_OPS: &[&str] = &[
    "**=", "//=", ">>=", "<<=", "...", "->", ":=", "!=", ">=", "<=", "==", "+=", "-=", "*=",
    "/=", "%=", "@=", "&=", "|=", "^=", "**", "//", "<<", ">>",
];

const SINGLE_OPS: &[u8] = b"+-*/%@<>&|^~=()[]{},:.;";

/// Tab stops every 8 columns, as in the reference tokenizer.
const TAB_SIZE: usize = 8;

/// Tokenize Python source into a flat token stream.
///
/// The stream always ends with `EndMarker`, preceded by any `Dedent` tokens
/// needed to close open indentation levels.
pub fn tokenize(src: &str) -> Result<Vec<Token>, TokError> {
    Lexer::new(src).run()
}

struct Lexer<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
    bracket_depth: usize,
    indents: Vec<usize>,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        Lexer {
            src,
            bytes: src.as_bytes(),
            pos: 0,
            bracket_depth: 0,
            indents: vec![0],
            tokens: Vec::new(),
        }
    }

    fn run(mut self) -> Result<Vec<Token>, TokError> {
        loop {
            if !self.start_logical_line()? {
                break;
            }
            self.lex_logical_line()?;
            if self.pos >= self.bytes.len() {
                break;
            }
        }
        while self.indents.len() > 1 {
            self.indents.pop();
            let p = self.pos;
            self.tokens.push(Token::new(TokKind::Dedent, "", p, p));
        }
        let p = self.pos;
        self.tokens.push(Token::new(TokKind::EndMarker, "", p, p));
        Ok(self.tokens)
    }

    /// Handle indentation at the start of a logical line. Skips blank and
    /// comment-only lines. Returns false at end of input.
    fn start_logical_line(&mut self) -> Result<bool, TokError> {
        loop {
            if self.pos >= self.bytes.len() {
                return Ok(false);
            }
            let line_begin = self.pos;
            let mut col = 0usize;
            while self.pos < self.bytes.len() {
                match self.bytes[self.pos] {
                    b' ' => col += 1,
                    b'\t' => col = (col / TAB_SIZE) * TAB_SIZE + TAB_SIZE,
                    _ => break,
                }
                self.pos += 1;
            }
            if self.pos >= self.bytes.len() {
                return Ok(false);
            }
            match self.bytes[self.pos] {
                b'\n' => {
                    self.pos += 1;
                    continue;
                }
                b'\r' => {
                    self.pos += 1;
                    if self.pos < self.bytes.len() && self.bytes[self.pos] == b'\n' {
                        self.pos += 1;
                    }
                    continue;
                }
                b'#' => {
                    self.skip_comment();
                    if self.pos < self.bytes.len() {
                        self.pos += 1; // consume the newline
                    }
                    continue;
                }
                _ => {}
            }
            let current = *self.indents.last().unwrap_or(&0);
            if col > current {
                self.indents.push(col);
                self.tokens
                    .push(Token::new(TokKind::Indent, "", line_begin, self.pos));
            } else if col < current {
                while col < *self.indents.last().unwrap_or(&0) {
                    self.indents.pop();
                    self.tokens
                        .push(Token::new(TokKind::Dedent, "", line_begin, self.pos));
                }
                if col != *self.indents.last().unwrap_or(&0) {
                    return Err(TokError::InconsistentDedent(self.pos));
                }
            }
            return Ok(true);
        }
    }

    /// Lex tokens until the logical line ends (a `Newline` at bracket depth
    /// zero) or the input runs out.
    fn lex_logical_line(&mut self) -> Result<(), TokError> {
        let mut line_had_tokens = false;
        loop {
            while self.pos < self.bytes.len()
                && (self.bytes[self.pos] == b' ' || self.bytes[self.pos] == b'\t')
            {
                self.pos += 1;
            }
            if self.pos >= self.bytes.len() {
                if line_had_tokens {
                    let p = self.pos;
                    self.tokens.push(Token::new(TokKind::Newline, "", p, p));
                }
                return Ok(());
            }
            let start = self.pos;
            let b = self.bytes[self.pos];
            match b {
                b'\r' => {
                    self.pos += 1;
                }
                b'\n' => {
                    self.pos += 1;
                    if self.bracket_depth == 0 {
                        if line_had_tokens {
                            self.tokens
                                .push(Token::new(TokKind::Newline, "\n", start, self.pos));
                            return Ok(());
                        }
                        // Defensive: a line with no tokens only reaches here
                        // through comment skipping; treat it as blank.
                        return Ok(());
                    }
                    // Inside brackets: the newline joins implicitly.
                }
                b'#' => {
                    self.skip_comment();
                }
                b'\\' if self.peek_byte(1) == Some(b'\n') => {
                    self.pos += 2;
                }
                b'\\' if self.peek_byte(1) == Some(b'\r') => {
                    self.pos += 2;
                    if self.peek_byte(0) == Some(b'\n') {
                        self.pos += 1;
                    }
                }
                b'\'' | b'"' => {
                    self.lex_string(start, start)?;
                    line_had_tokens = true;
                }
                b'0'..=b'9' => {
                    self.lex_number();
                    line_had_tokens = true;
                }
                b'.' if self.peek_byte(1).is_some_and(|c| c.is_ascii_digit()) => {
                    self.lex_number();
                    line_had_tokens = true;
                }
                _ if is_ident_start_byte(b) => {
                    self.lex_name_or_prefixed_string(start)?;
                    line_had_tokens = true;
                }
                _ if b < 0x80 => {
                    if !self.lex_operator(start) {
                        let ch = self.char_at(start).unwrap_or('\u{fffd}');
                        return Err(TokError::InvalidCharacter(start, ch));
                    }
                    line_had_tokens = true;
                }
                _ => {
                    // Non-ASCII: identifiers may contain arbitrary non-ASCII
                    // letters; anything else is invalid.
                    match self.char_at(start) {
                        Some(ch) if ch.is_alphabetic() => {
                            self.lex_name_or_prefixed_string(start)?;
                            line_had_tokens = true;
                        }
                        Some(ch) => return Err(TokError::InvalidCharacter(start, ch)),
                        None => return Ok(()),
                    }
                }
            }
        }
    }

    fn peek_byte(&self, ahead: usize) -> Option<u8> {
        self.bytes.get(self.pos + ahead).copied()
    }

    fn char_at(&self, pos: usize) -> Option<char> {
        self.src.get(pos..).and_then(|s| s.chars().next())
    }

    fn skip_comment(&mut self) {
        match memchr(b'\n', &self.bytes[self.pos..]) {
            Some(off) => self.pos += off,
            None => self.pos = self.bytes.len(),
        }
    }

    fn lex_name_or_prefixed_string(&mut self, start: usize) -> Result<(), TokError> {
        while self.pos < self.bytes.len() {
            let b = self.bytes[self.pos];
            if b < 0x80 {
                if b == b'_' || b.is_ascii_alphanumeric() {
                    self.pos += 1;
                } else {
                    break;
                }
            } else {
                match self.char_at(self.pos) {
                    Some(ch) if ch.is_alphanumeric() => self.pos += ch.len_utf8(),
                    _ => break,
                }
            }
        }
        let text = &self.src[start..self.pos];
        if matches!(self.peek_byte(0), Some(b'\'') | Some(b'"')) && is_string_prefix(text) {
            let quote_start = self.pos;
            return self.lex_string(start, quote_start);
        }
        self.tokens
            .push(Token::new(TokKind::Name, text, start, self.pos));
        Ok(())
    }

    /// Lex a string literal; `start` includes any prefix, `quote_start` is the
    /// offset of the opening quote.
    fn lex_string(&mut self, start: usize, quote_start: usize) -> Result<(), TokError> {
        let quote = self.bytes[quote_start];
        self.pos = quote_start + 1;
        let triple = self.peek_byte(0) == Some(quote) && self.peek_byte(1) == Some(quote);
        if triple {
            self.pos += 2;
        }
        loop {
            if self.pos >= self.bytes.len() {
                return Err(TokError::UnterminatedString(start));
            }
            let b = self.bytes[self.pos];
            if b == b'\\' {
                self.pos += 1;
                match self.char_at(self.pos) {
                    Some(ch) => self.pos += ch.len_utf8(),
                    None => return Err(TokError::UnterminatedString(start)),
                }
                continue;
            }
            if b == quote {
                if !triple {
                    self.pos += 1;
                    break;
                }
                if self.peek_byte(1) == Some(quote) && self.peek_byte(2) == Some(quote) {
                    self.pos += 3;
                    break;
                }
                self.pos += 1;
                continue;
            }
            if b == b'\n' && !triple {
                return Err(TokError::UnterminatedString(start));
            }
            if b < 0x80 {
                self.pos += 1;
            } else {
                match self.char_at(self.pos) {
                    Some(ch) => self.pos += ch.len_utf8(),
                    None => return Err(TokError::UnterminatedString(start)),
                }
            }
        }
        let text = &self.src[start..self.pos];
        self.tokens
            .push(Token::new(TokKind::Str, text, start, self.pos));
        Ok(())
    }

    fn lex_number(&mut self) {
        let start = self.pos;
        let mut prev = 0u8;
        while self.pos < self.bytes.len() {
            let b = self.bytes[self.pos];
            let is_exp_sign = (b == b'+' || b == b'-')
                && (prev == b'e' || prev == b'E')
                && !self.src[start..self.pos].starts_with("0x")
                && !self.src[start..self.pos].starts_with("0X");
            if b.is_ascii_alphanumeric() || b == b'_' || b == b'.' || is_exp_sign {
                prev = b;
                self.pos += 1;
            } else {
                break;
            }
        }
        let text = &self.src[start..self.pos];
        self.tokens
            .push(Token::new(TokKind::Number, text, start, self.pos));
    }

    fn lex_operator(&mut self, start: usize) -> bool {
        for op in MULTI_OPS {
            if self.src[start..].starts_with(op) {
                self.pos = start + op.len();
                self.tokens.push(Token::new(TokKind::Op, *op, start, self.pos));
                return true;
            }
        }
        let b = self.bytes[start];
        if SINGLE_OPS.contains(&b) {
            match b {
                b'(' | b'[' | b'{' => self.bracket_depth += 1,
                b')' | b']' | b'}' => self.bracket_depth = self.bracket_depth.saturating_sub(1),
                _ => {}
            }
            self.pos = start + 1;
            let text = &self.src[start..self.pos];
            self.tokens.push(Token::new(TokKind::Op, text, start, self.pos));
            return true;
        }
        false
    }
}

fn is_ident_start_byte(b: u8) -> bool {
    b == b'_' || b.is_ascii_alphabetic()
}

/// Whether a name is a valid string-literal prefix (`r"..."`, `rb'...'`, etc.).
fn is_string_prefix(name: &str) -> bool {
    if name.is_empty() || name.len() > 2 {
        return false;
    }
    name.chars()
        .all(|c| matches!(c.to_ascii_lowercase(), 'r' | 'b' | 'u' | 'f' | 't'))
}

// ============================================================================
// Tests
// ============================================================================
