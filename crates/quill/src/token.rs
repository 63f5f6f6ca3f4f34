// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Literal scanner for the expression mini-language.
//!
//! The [`Scanner`] walks a single expression span and classifies runs of
//! characters into [`Token`]s. It tracks quote state itself, so a `,`, `:`
//! or `|` inside a quoted literal never ends the current token and is never
//! seen by the separator-splitting helpers.

use crate::error::{QuillError, Result};

/// The kind of a scanned literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// `"text"` or `'text'`.
    QuotedString,
    /// Integer or float, optionally negative.
    Number,
    /// `true` or `false`.
    Boolean,
    /// `nil` or `null`.
    Nil,
    /// `name`, `a.b`, `a[0]`, `a["key"]`, `a[other.path]`.
    PropertyPath,
    /// `(start..end)`.
    Range,
}

/// A literal spelling plus its kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// What was scanned.
    pub kind: TokenKind,
    /// The exact source spelling, quotes included.
    pub text: String,
}

impl Token {
    fn new(kind: TokenKind, text: &str) -> Self {
        Self {
            kind,
            text: text.to_string(),
        }
    }
}

/// Character scanner over one expression span.
#[derive(Debug, Clone)]
pub struct Scanner<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    /// Creates a scanner positioned at the start of `input`.
    pub fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    /// The full input.
    pub fn input(&self) -> &'a str {
        self.input
    }

    /// Current byte offset.
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Rewinds or advances to an absolute offset previously returned by [`pos`](Self::pos).
    pub fn reset(&mut self, pos: usize) {
        self.pos = pos;
    }

    /// Unconsumed input.
    pub fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    /// True when all input has been consumed.
    pub fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// Next character without consuming it.
    pub fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    /// Consumes `c` if it is next.
    pub fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    /// Consumes `s` if the input continues with it.
    pub fn eat_str(&mut self, s: &str) -> bool {
        if self.rest().starts_with(s) {
            self.pos += s.len();
            true
        } else {
            false
        }
    }

    /// Skips ASCII and Unicode whitespace.
    pub fn skip_whitespace(&mut self) {
        let rest = self.rest();
        let trimmed = rest.trim_start();
        self.pos += rest.len() - trimmed.len();
    }

    fn error(&self, message: impl Into<String>) -> QuillError {
        QuillError::malformed(self.input, message)
    }

    /// Reads an identifier: a letter or `_`, then letters, digits, `_` or `-`.
    pub fn read_identifier(&mut self) -> Option<&'a str> {
        let rest = self.rest();
        let mut chars = rest.char_indices();
        match chars.next() {
            Some((_, c)) if c.is_alphabetic() || c == '_' => {}
            _ => return None,
        }
        let end = chars
            .find(|(_, c)| !(c.is_alphanumeric() || *c == '_' || *c == '-'))
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        self.pos += end;
        Some(&rest[..end])
    }

    /// Reads a quoted literal, returning its spelling with quotes.
    pub fn read_quoted(&mut self) -> Result<Option<&'a str>> {
        let rest = self.rest();
        let quote = match rest.chars().next() {
            Some(q @ ('"' | '\'')) => q,
            _ => return Ok(None),
        };
        let mut escaped = false;
        for (i, c) in rest.char_indices().skip(1) {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == quote {
                let end = i + c.len_utf8();
                self.pos += end;
                return Ok(Some(&rest[..end]));
            }
        }
        Err(self.error("unterminated string literal"))
    }

    /// Reads `-?digits(.digits)?`. A trailing `.` not followed by a digit is
    /// left unconsumed so that `1..5` scans as `1`.
    pub fn read_number(&mut self) -> Option<&'a str> {
        let rest = self.rest();
        let bytes = rest.as_bytes();
        let mut end = 0;
        if bytes.first() == Some(&b'-') {
            end = 1;
        }
        let digits_start = end;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
        if end == digits_start {
            return None;
        }
        if end + 1 < bytes.len() && bytes[end] == b'.' && bytes[end + 1].is_ascii_digit() {
            end += 1;
            while end < bytes.len() && bytes[end].is_ascii_digit() {
                end += 1;
            }
        }
        // `1abc` is not a number.
        if rest[end..]
            .chars()
            .next()
            .is_some_and(|c| c.is_alphabetic() || c == '_')
        {
            return None;
        }
        self.pos += end;
        Some(&rest[..end])
    }

    /// Reads a property path. Bracket segments may hold any value token.
    pub fn read_property_path(&mut self) -> Result<Option<&'a str>> {
        let start = self.pos;
        if self.peek() == Some('[') {
            self.read_bracket()?;
        } else if self.read_identifier().is_none() {
            return Ok(None);
        }
        loop {
            match self.peek() {
                Some('.') => {
                    let before = self.pos;
                    self.pos += 1;
                    if self.read_identifier().is_none() && self.read_digits().is_none() {
                        // `a..b` inside a range: the dot belongs to the range.
                        self.pos = before;
                        break;
                    }
                }
                Some('[') => self.read_bracket()?,
                _ => break,
            }
        }
        Ok(Some(&self.input[start..self.pos]))
    }

    /// Reads a run of ASCII digits.
    pub fn read_digits(&mut self) -> Option<&'a str> {
        let rest = self.rest();
        let end = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        if end == 0 {
            return None;
        }
        self.pos += end;
        Some(&rest[..end])
    }

    fn read_bracket(&mut self) -> Result<()> {
        self.eat('[');
        self.skip_whitespace();
        if self.read_value()?.is_none() {
            return Err(self.error("expected a value inside '[...]'"));
        }
        self.skip_whitespace();
        if !self.eat(']') {
            return Err(self.error("expected ']'"));
        }
        Ok(())
    }

    /// Reads `(start..end)`.
    pub fn read_range(&mut self) -> Result<Option<&'a str>> {
        if self.peek() != Some('(') {
            return Ok(None);
        }
        let start = self.pos;
        self.pos += 1;
        self.skip_whitespace();
        if self.read_value()?.is_none() {
            return Err(self.error("expected range start"));
        }
        self.skip_whitespace();
        if !self.eat_str("..") {
            return Err(self.error("expected '..' in range"));
        }
        self.skip_whitespace();
        if self.read_value()?.is_none() {
            return Err(self.error("expected range end"));
        }
        self.skip_whitespace();
        if !self.eat(')') {
            return Err(self.error("expected ')' to close range"));
        }
        Ok(Some(&self.input[start..self.pos]))
    }

    /// Reads one value token of any kind. Returns `Ok(None)` when the next
    /// characters cannot start a value; nothing is consumed in that case.
    pub fn read_value(&mut self) -> Result<Option<Token>> {
        if let Some(text) = self.read_quoted()? {
            return Ok(Some(Token::new(TokenKind::QuotedString, text)));
        }
        if let Some(text) = self.read_range()? {
            return Ok(Some(Token::new(TokenKind::Range, text)));
        }
        if let Some(text) = self.read_number() {
            return Ok(Some(Token::new(TokenKind::Number, text)));
        }
        if let Some(text) = self.read_property_path()? {
            let kind = match text {
                "true" | "false" => TokenKind::Boolean,
                "nil" | "null" => TokenKind::Nil,
                _ => TokenKind::PropertyPath,
            };
            return Ok(Some(Token::new(kind, text)));
        }
        Ok(None)
    }

    /// Advances to the next top-level occurrence of any char in `stops`
    /// (outside quotes, brackets and parentheses) without consuming it.
    /// Returns the stop char found, or `None` at end of input.
    pub fn skip_to(&mut self, stops: &[char]) -> Result<Option<char>> {
        let mut depth = 0usize;
        while let Some(c) = self.peek() {
            match c {
                '"' | '\'' => {
                    self.read_quoted()?;
                    continue;
                }
                '[' | '(' => depth += 1,
                ']' | ')' => depth = depth.saturating_sub(1),
                _ if depth == 0 && stops.contains(&c) => return Ok(Some(c)),
                _ => {}
            }
            self.pos += c.len_utf8();
        }
        Ok(None)
    }
}

/// Splits `input` on top-level occurrences of `sep`, honoring quotes.
pub fn split_top_level(input: &str, sep: char) -> Result<Vec<&str>> {
    let mut parts = Vec::new();
    let mut scanner = Scanner::new(input);
    let mut start = 0;
    while scanner.skip_to(&[sep])?.is_some() {
        parts.push(&input[start..scanner.pos()]);
        scanner.eat(sep);
        start = scanner.pos();
    }
    parts.push(&input[start..]);
    Ok(parts)
}
