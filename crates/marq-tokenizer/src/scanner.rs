//! Rune-level scanner backing the marker lexer.

use crate::Position;

/// A buffered, UTF-8-aware reader over marker source text.
///
/// The scanner tracks two things on behalf of the lexer: the (line, column)
/// position of the read head, and the `buffer` of consumed-but-unemitted text
/// that becomes the next token's value. Consuming via [`Scanner::next`]
/// appends to the buffer; the `discard` family advances the position without
/// buffering, which is how stripped whitespace and comment continuation
/// prefixes disappear from token values.
#[derive(Clone)]
pub struct Scanner<'src> {
    /// The full source text.
    source: &'src str,
    /// The remaining source text (suffix of `source`).
    remaining: &'src str,
    /// Position of the next unread rune.
    pos: Position,
    /// Byte length of each completed line, for backing up across newlines.
    line_lengths: Vec<usize>,
    /// Consumed text pending emission.
    buffer: String,
    /// Position where `buffer` began.
    start: Position,
    /// The most recent rune read, for single-step backup.
    last: Option<LastRead>,
}

#[derive(Debug, Clone, Copy)]
struct LastRead {
    ch: char,
    buffered: bool,
}

impl<'src> Scanner<'src> {
    /// Create a scanner over the given source text.
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            remaining: source,
            pos: Position::start(),
            line_lengths: Vec::new(),
            buffer: String::new(),
            start: Position::start(),
            last: None,
        }
    }

    /// Byte offset of the read head.
    #[inline]
    fn offset(&self) -> usize {
        self.source.len() - self.remaining.len()
    }

    /// Check if the read head is at the end of input.
    #[inline]
    pub fn is_eof(&self) -> bool {
        self.remaining.is_empty()
    }

    /// Peek at the next rune without consuming it. `None` is end of input.
    #[inline]
    pub fn peek(&self) -> Option<char> {
        self.remaining.chars().next()
    }

    /// Peek at up to `n` runes without consuming them.
    pub fn peek_n(&self, n: usize) -> String {
        self.remaining.chars().take(n).collect()
    }

    /// Check if the remaining input starts with the given text.
    #[inline]
    pub fn has_prefix(&self, prefix: &str) -> bool {
        self.remaining.starts_with(prefix)
    }

    /// Advance over one rune, recording it for backup.
    fn advance(&mut self, buffered: bool) -> Option<char> {
        let ch = self.peek()?;
        let width = ch.len_utf8();
        self.remaining = &self.remaining[width..];

        if ch == '\n' {
            // Record the newline's column so backup can restore it.
            if self.line_lengths.len() < self.pos.line {
                self.line_lengths.push(self.pos.column);
            } else {
                self.line_lengths[self.pos.line - 1] = self.pos.column;
            }
            self.pos.line += 1;
            self.pos.column = 1;
        } else {
            self.pos.column += width;
        }

        self.last = Some(LastRead { ch, buffered });
        Some(ch)
    }

    /// Consume one rune, appending it to the pending buffer.
    pub fn next(&mut self) -> Option<char> {
        if self.buffer.is_empty() {
            self.start = self.pos;
        }
        let ch = self.advance(true)?;
        self.buffer.push(ch);
        Some(ch)
    }

    /// Undo the most recent `next` or `discard`. A single step only; a second
    /// backup without an intervening read is a no-op.
    pub fn backup(&mut self) {
        let Some(last) = self.last.take() else {
            return;
        };
        let width = last.ch.len_utf8();
        self.remaining = &self.source[self.offset() - width..];

        if self.pos.column <= width {
            // Crossed a line boundary; restore the recorded line length.
            self.pos.line -= 1;
            self.pos.column = self
                .line_lengths
                .get(self.pos.line - 1)
                .copied()
                .unwrap_or(1);
        } else {
            self.pos.column -= width;
        }

        if last.buffered {
            self.buffer.pop();
        }
        if self.buffer.is_empty() {
            self.start = self.pos;
        }
    }

    /// Advance over one rune without buffering it.
    pub fn discard(&mut self) {
        self.advance(false);
        if self.buffer.is_empty() {
            self.start = self.pos;
        }
    }

    /// Advance over `n` runes without buffering them.
    pub fn discard_n(&mut self, n: usize) {
        for _ in 0..n {
            self.discard();
        }
    }

    /// Discard runes until one of `stops` prefixes the input, or EOF.
    pub fn discard_until(&mut self, stops: &[&str]) {
        while !self.is_eof() && !stops.iter().any(|stop| self.has_prefix(stop)) {
            self.discard();
        }
    }

    /// Consume horizontal whitespace into the buffer.
    pub fn consume_whitespace(&mut self) {
        while matches!(self.peek(), Some(' ' | '\t')) {
            self.next();
        }
    }

    /// Discard whitespace (including newlines) without buffering it.
    pub fn strip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.discard();
        }
    }

    /// Consume runes until one of `exceptions` (or EOF) is next. The
    /// exception rune is not consumed. Returns whether anything was consumed.
    pub fn consume_until(&mut self, exceptions: &[char]) -> bool {
        let mut consumed = false;
        while let Some(ch) = self.peek() {
            if exceptions.contains(&ch) {
                break;
            }
            self.next();
            consumed = true;
        }
        consumed
    }

    /// Consume `token` if it prefixes the input and no `token` + exception
    /// string does. Returns whether the token was consumed.
    pub fn consumed(&mut self, token: &str, except: &[&str]) -> bool {
        if !self.has_prefix(token) {
            return false;
        }
        for exception in except {
            let mut guarded = String::with_capacity(token.len() + exception.len());
            guarded.push_str(token);
            guarded.push_str(exception);
            if self.has_prefix(&guarded) {
                return false;
            }
        }
        for _ in token.chars() {
            self.next();
        }
        true
    }

    /// Skip leading horizontal whitespace, then consume the first matching
    /// token. The whitespace is discarded, the token is buffered.
    pub fn consumed_whitespaced(&mut self, tokens: &[&str]) -> bool {
        let rest = self.remaining.trim_start_matches([' ', '\t']);
        let leading = self.remaining.len() - rest.len();
        for token in tokens {
            if rest.starts_with(token) {
                self.discard_n(leading);
                for _ in token.chars() {
                    self.next();
                }
                return true;
            }
        }
        false
    }

    /// The check of [`Scanner::consumed_whitespaced`], consuming nothing.
    pub fn peeked_whitespaced(&self, tokens: &[&str]) -> bool {
        let rest = self.remaining.trim_start_matches([' ', '\t']);
        tokens.iter().any(|token| rest.starts_with(token))
    }

    /// The pending (consumed but unemitted) text.
    #[inline]
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// The position where the pending buffer began.
    #[inline]
    pub fn start(&self) -> Position {
        self.start
    }

    /// The position of the next unread rune.
    #[inline]
    pub fn position(&self) -> Position {
        self.pos
    }

    /// Take the pending buffer and its start position, resetting both.
    pub fn take_buffer(&mut self) -> (String, Position) {
        let value = std::mem::take(&mut self.buffer);
        let start = self.start;
        self.start = self.pos;
        (value, start)
    }

    /// Drop the pending buffer without emitting it.
    pub fn flush(&mut self) {
        self.buffer.clear();
        self.start = self.pos;
    }
}
