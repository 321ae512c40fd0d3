//! State-function lexer for the marker DSL.
//!
//! The lexer is a machine of state functions: each state does some amount of
//! scanning, emits zero or more tokens, and returns the next state (or `None`
//! to halt). Emitted tokens queue up and are drained by [`Lexer::next_token`],
//! which advances the machine only far enough to produce the next token, so
//! the lexer never runs ahead of its consumer.

use std::collections::VecDeque;

use tracing::trace;

use crate::{Position, Scanner, Token, TokenKind};

/// Comment delimiters that introduce a marker-bearing comment.
pub const COMMENT_DELIMITERS: [&str; 2] = ["//", "#"];

/// Runes that terminate an unquoted marker token.
const DELIMITERS: [char; 16] = [
    ':', '=', ' ', '"', '\'', '`', ',', '+', '{', '}', '[', ']', '(', ')', ';', '\n',
];

/// Runes that terminate a naked string literal.
const NAKED_DELIMITERS: [char; 15] = [
    ':', '=', ' ', '"', '\'', '`', ',', '+', '{', '}', '[', ']', '(', ')', '\n',
];

/// A lexer state: scans, emits, and names its successor.
#[derive(Clone, Copy)]
pub struct StateFn(pub fn(&mut Lexer<'_>) -> Option<StateFn>);

/// A lexer that produces marker tokens from comment-bearing source text.
pub struct Lexer<'src> {
    scan: Scanner<'src>,
    tokens: VecDeque<Token>,
    /// Suspended states for nested subparses (numeric literals).
    stack: Vec<StateFn>,
    state: Option<StateFn>,
    /// The most recently emitted token, for scope checks and error context.
    last: Option<Token>,
}

impl<'src> Lexer<'src> {
    /// Create a lexer over the given source text.
    pub fn new(source: &'src str) -> Self {
        Self {
            scan: Scanner::new(source),
            tokens: VecDeque::new(),
            stack: Vec::new(),
            state: Some(StateFn(lex)),
            last: None,
        }
    }

    /// Get the next token, advancing the state machine as far as needed.
    ///
    /// Returns `None` once the machine has halted and the queue is drained;
    /// an `Eof` token always precedes that.
    pub fn next_token(&mut self) -> Option<Token> {
        loop {
            if let Some(token) = self.tokens.pop_front() {
                return Some(token);
            }
            let StateFn(state) = self.state.take()?;
            self.state = state(self);
        }
    }

    /// Drive the machine to completion and collect every token.
    pub fn run(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token() {
            tokens.push(token);
        }
        tokens
    }

    /// Emit the pending buffer as a token of the given kind.
    fn emit(&mut self, kind: TokenKind) {
        let (value, start) = self.scan.take_buffer();
        trace!("emit {:?} at {}: {:?}", kind, start, value);
        let token = Token::new(kind, value, start);
        self.last = Some(token.clone());
        self.tokens.push_back(token);
    }

    /// Emit a token that consumed no input.
    fn emit_synthetic(&mut self, kind: TokenKind, value: &str) {
        let token = Token::new(kind, value, self.scan.position());
        trace!("emit synthetic {:?}: {:?}", kind, value);
        self.last = Some(token.clone());
        self.tokens.push_back(token);
    }

    /// Whether the most recently emitted token has the given kind.
    fn last_is(&self, kind: TokenKind) -> bool {
        self.last.as_ref().is_some_and(|token| token.kind == kind)
    }

    /// The diagnostic context: the last emitted value plus the pending buffer.
    fn context(&self) -> String {
        let mut context = self
            .last
            .as_ref()
            .map(|token| token.value.clone())
            .unwrap_or_default();
        context.push_str(self.scan.buffer());
        context
    }

    /// Emit an `Error` token with position and context, and halt.
    fn errorf(&mut self, message: &str) -> Option<StateFn> {
        let value = format!(
            "{message} [position: {}] near \"{}\"",
            self.scan.position(),
            self.context()
        );
        self.emit_synthetic(TokenKind::Error, &value);
        None
    }

    /// Emit an `Error` token without the context suffix, and halt.
    fn raw_errorf(&mut self, message: &str) -> Option<StateFn> {
        let value = format!("{message} [position: {}]", self.scan.position());
        self.emit_synthetic(TokenKind::Error, &value);
        None
    }

    /// Emit a `Warning` token with position and context, flush the buffer,
    /// and continue scanning the enclosing comment.
    fn warningf(&mut self, message: &str) -> Option<StateFn> {
        let value = format!(
            "{message} [position: {}] near \"{}\"",
            self.scan.position(),
            self.context()
        );
        self.emit_synthetic(TokenKind::Warning, &value);
        self.scan.flush();
        Some(StateFn(lex_comment))
    }

    /// Inside a backtick literal, after a newline: if the next line re-enters
    /// the comment stream, discard its leading whitespace and the comment
    /// delimiter so the literal body carries only the intended content.
    fn skip_comment_lead(&mut self) {
        if !self.scan.peeked_whitespaced(&COMMENT_DELIMITERS) {
            return;
        }
        self.scan.discard_until(&COMMENT_DELIMITERS);
        for delimiter in COMMENT_DELIMITERS {
            if self.scan.has_prefix(delimiter) {
                self.scan.discard_n(delimiter.chars().count());
                return;
            }
        }
    }

    fn at_comment_delimiter(&self) -> bool {
        COMMENT_DELIMITERS
            .iter()
            .any(|delimiter| self.scan.has_prefix(delimiter))
    }
}

/// Initial state: skim for a comment delimiter or a bare marker lead.
fn lex(l: &mut Lexer<'_>) -> Option<StateFn> {
    l.scan.strip_whitespace();
    if l.scan.is_eof() {
        if let Some(state) = l.stack.pop() {
            return Some(state);
        }
        l.emit_synthetic(TokenKind::Eof, "");
        return None;
    }
    if l.at_comment_delimiter() {
        return Some(StateFn(lex_comment_start));
    }
    if l.scan.has_prefix("+") {
        return Some(StateFn(lex_marker_start));
    }
    l.scan.discard();
    Some(StateFn(lex))
}

/// Emit the comment delimiter and move into the comment body.
fn lex_comment_start(l: &mut Lexer<'_>) -> Option<StateFn> {
    for delimiter in COMMENT_DELIMITERS {
        if l.scan.consumed(delimiter, &[]) {
            l.emit(TokenKind::Comment);
            return Some(StateFn(lex_comment));
        }
    }
    Some(StateFn(lex))
}

/// Scan a comment body for a marker lead.
fn lex_comment(l: &mut Lexer<'_>) -> Option<StateFn> {
    if l.scan.has_prefix("+") {
        return Some(StateFn(lex_marker_start));
    }
    match l.scan.peek() {
        None | Some('\n') => Some(StateFn(lex)),
        Some(_) => {
            l.scan.discard();
            Some(StateFn(lex_comment))
        }
    }
}

/// Consume the `+` lead; only a following letter makes it a marker.
///
/// The letter check defeats `++` in prose and `2+2=4` false positives.
fn lex_marker_start(l: &mut Lexer<'_>) -> Option<StateFn> {
    l.scan.consumed("+", &[]);
    match l.scan.peek() {
        Some(c) if c.is_alphabetic() => {
            l.emit(TokenKind::MarkerStart);
            Some(StateFn(lex_marker))
        }
        _ => {
            l.scan.flush();
            Some(StateFn(lex_comment))
        }
    }
}

/// Scan a scope segment or the first argument name.
fn lex_marker(l: &mut Lexer<'_>) -> Option<StateFn> {
    if !l.scan.consume_until(&DELIMITERS) {
        l.scan.backup();
        l.scan.flush();
        return Some(StateFn(lex_comment));
    }

    if l.scan.has_prefix(":") {
        l.emit(TokenKind::Scope);
        l.scan.consumed(":", &[]);
        l.emit(TokenKind::Separator);
        return Some(StateFn(lex_marker));
    }

    match l.scan.peek() {
        Some(' ') | Some('\n') | None => {
            if !l.last_is(TokenKind::Separator) {
                return l.warningf("marker without scope found");
            }
            l.emit(TokenKind::Arg);
            l.emit_synthetic(TokenKind::SyntheticBoolLiteral, "true");
            l.emit_synthetic(TokenKind::MarkerEnd, "\n");
            Some(StateFn(lex_comment))
        }
        Some('=') => {
            if !l.last_is(TokenKind::Separator) {
                return l.warningf("marker without scope found");
            }
            l.emit(TokenKind::Arg);
            l.scan.consumed("=", &[]);
            l.emit(TokenKind::ArgAssignment);
            Some(StateFn(lex_arg_value_initial))
        }
        _ => l.warningf("invalid marker found"),
    }
}

/// Scan an argument name after an argument delimiter.
fn lex_args(l: &mut Lexer<'_>) -> Option<StateFn> {
    if !l.scan.consume_until(&DELIMITERS) {
        l.scan.backup();
        l.scan.flush();
        return Some(StateFn(lex_comment));
    }

    match l.scan.peek() {
        Some(' ') | Some('\n') | None => {
            l.emit(TokenKind::Arg);
            l.emit_synthetic(TokenKind::SyntheticBoolLiteral, "true");
            l.emit_synthetic(TokenKind::MarkerEnd, "\n");
            Some(StateFn(lex_comment))
        }
        Some('=') => {
            l.emit(TokenKind::Arg);
            l.scan.consumed("=", &[]);
            l.emit(TokenKind::ArgAssignment);
            Some(StateFn(lex_arg_value_initial))
        }
        Some(',') => {
            l.emit(TokenKind::Arg);
            l.emit_synthetic(TokenKind::SyntheticBoolLiteral, "true");
            l.scan.consumed(",", &[]);
            l.emit(TokenKind::ArgDelimiter);
            Some(StateFn(lex_args))
        }
        _ => l.warningf("invalid marker found"),
    }
}

/// Dispatch on the first rune of an argument value.
///
/// Tried in order: quoted string, numeric, boolean, naked string.
fn lex_arg_value_initial(l: &mut Lexer<'_>) -> Option<StateFn> {
    match l.scan.peek() {
        Some('\'' | '"' | '`') => Some(StateFn(lex_string_literal)),
        Some(c) if c == '.' || c == '-' || c.is_ascii_digit() => {
            Some(StateFn(lex_numeric_literal))
        }
        _ if l.scan.peeked_whitespaced(&["true", "false"]) => Some(StateFn(lex_boolean_literal)),
        Some(c) if !NAKED_DELIMITERS.contains(&c) => Some(StateFn(lex_naked_string_literal)),
        _ => l.errorf("malformed argument"),
    }
}

/// Scan a quoted string literal.
///
/// Backtick-quoted literals may span newlines; when the next line re-enters a
/// comment stream its delimiter prefix is stripped from the body. A newline
/// inside a single- or double-quoted literal is unterminated.
fn lex_string_literal(l: &mut Lexer<'_>) -> Option<StateFn> {
    let Some(quote) = l.scan.peek() else {
        return l.errorf("malformed argument");
    };
    l.scan.next();
    l.emit(TokenKind::Quote);

    loop {
        match l.scan.peek() {
            None => return l.errorf("unmatched string delimiter"),
            Some(c) if c == quote => {
                l.emit(TokenKind::StringLiteral);
                l.scan.next();
                l.emit(TokenKind::Quote);
                return Some(StateFn(lex_more_args));
            }
            Some('\n') if quote != '`' => return l.errorf("unmatched string delimiter"),
            Some('\n') => {
                l.scan.next();
                l.skip_comment_lead();
            }
            Some(_) => {
                l.scan.next();
            }
        }
    }
}

/// Scan a numeric literal, deferring validation to the integer or float state.
fn lex_numeric_literal(l: &mut Lexer<'_>) -> Option<StateFn> {
    let mut is_float = false;
    while let Some(c) = l.scan.peek() {
        match c {
            '0'..='9' | '-' => {
                l.scan.next();
            }
            '.' | 'e' | 'E' => {
                is_float = true;
                l.scan.next();
            }
            _ => break,
        }
    }
    l.stack.push(StateFn(lex_more_args));
    if is_float {
        Some(StateFn(lex_float_literal))
    } else {
        Some(StateFn(lex_integer_literal))
    }
}

/// Validate and emit a float literal, then pop the suspended state.
fn lex_float_literal(l: &mut Lexer<'_>) -> Option<StateFn> {
    let text = l.scan.buffer().to_string();
    if text.parse::<f64>().is_err() {
        return l.errorf(&format!("unable to parse float value {text}"));
    }
    l.emit(TokenKind::FloatLiteral);
    l.stack.pop()
}

/// Validate and emit an integer literal, then pop the suspended state.
fn lex_integer_literal(l: &mut Lexer<'_>) -> Option<StateFn> {
    let text = l.scan.buffer().to_string();
    if text.parse::<i64>().is_err() {
        return l.errorf(&format!("unable to parse integer value {text}"));
    }
    l.emit(TokenKind::IntegerLiteral);
    l.stack.pop()
}

/// Scan a `true` or `false` literal after optional whitespace.
fn lex_boolean_literal(l: &mut Lexer<'_>) -> Option<StateFn> {
    if l.scan.consumed_whitespaced(&["true", "false"]) {
        l.emit(TokenKind::BoolLiteral);
        return Some(StateFn(lex_more_args));
    }
    l.raw_errorf("expected boolean value")
}

/// Scan an unquoted string literal.
fn lex_naked_string_literal(l: &mut Lexer<'_>) -> Option<StateFn> {
    l.scan.consume_until(&NAKED_DELIMITERS);
    l.emit(TokenKind::StringLiteral);
    Some(StateFn(lex_more_args))
}

/// After a value: another argument, the end of the marker, or an error.
fn lex_more_args(l: &mut Lexer<'_>) -> Option<StateFn> {
    if l.scan.consumed(",", &[]) {
        l.emit(TokenKind::ArgDelimiter);
        return Some(StateFn(lex_args));
    }
    match l.scan.peek() {
        Some(' ') | Some('\n') | None => {
            l.emit_synthetic(TokenKind::MarkerEnd, "\n");
            Some(StateFn(lex_comment))
        }
        _ => l.errorf("malformed marker"),
    }
}
