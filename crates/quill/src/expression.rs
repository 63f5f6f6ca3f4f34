// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Single expressions: literals, property paths and ranges.
//!
//! An [`Expression`] is built from one scanned [`Token`] and keeps the
//! source spelling alongside the parsed form. Property paths are resolved
//! against the render [`Context`](crate::context::Context) at evaluation time,
//! never at parse time.

use crate::error::{QuillError, Result};
use crate::token::{Scanner, Token, TokenKind};
use serde_json::{Number, Value};
use std::fmt;

/// One step of a property path.
#[derive(Debug, Clone, PartialEq)]
pub enum PathSegment {
    /// `.name` or `["name"]`.
    Key(String),
    /// `.0` or `[0]`. Negative indices count from the end.
    Index(i64),
    /// `[other.path]`, evaluated before indexing.
    Dynamic(Expression),
}

/// The parsed form of an expression.
#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionKind {
    /// A string, number, boolean or nil literal.
    Literal(Value),
    /// A variable path, looked up in the context.
    Path(Vec<PathSegment>),
    /// `(start..end)`, inclusive on both ends.
    Range(Box<Expression>, Box<Expression>),
}

/// A literal or property path, with its source spelling.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    raw: String,
    kind: ExpressionKind,
}

impl Expression {
    /// Parses exactly one value expression; trailing text is an error.
    pub fn parse(text: &str) -> Result<Self> {
        let mut scanner = Scanner::new(text);
        scanner.skip_whitespace();
        let token = scanner
            .read_value()?
            .ok_or_else(|| QuillError::malformed(text, "expected a value"))?;
        scanner.skip_whitespace();
        if !scanner.is_eof() {
            return Err(QuillError::malformed(
                text,
                format!("unexpected '{}' after value", scanner.rest().trim()),
            ));
        }
        Self::from_token(&token)
    }

    /// Builds an expression from a scanned token.
    pub fn from_token(token: &Token) -> Result<Self> {
        let kind = match token.kind {
            TokenKind::QuotedString => ExpressionKind::Literal(Value::String(unquote(&token.text))),
            TokenKind::Number => ExpressionKind::Literal(parse_number(&token.text)?),
            TokenKind::Boolean => ExpressionKind::Literal(Value::Bool(token.text == "true")),
            TokenKind::Nil => ExpressionKind::Literal(Value::Null),
            TokenKind::PropertyPath => ExpressionKind::Path(parse_path(&token.text)?),
            TokenKind::Range => {
                let (start, end) = parse_range(&token.text)?;
                ExpressionKind::Range(Box::new(start), Box::new(end))
            }
        };
        Ok(Self {
            raw: token.text.clone(),
            kind,
        })
    }

    /// The source spelling, quotes included.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The parsed form.
    pub fn kind(&self) -> &ExpressionKind {
        &self.kind
    }

    /// The literal value, if this is a literal.
    pub fn as_literal(&self) -> Option<&Value> {
        match &self.kind {
            ExpressionKind::Literal(v) => Some(v),
            _ => None,
        }
    }

    /// True for a bare identifier path like `a` (no dots or brackets).
    pub fn is_identifier(&self, name: &str) -> bool {
        matches!(&self.kind, ExpressionKind::Path(segs)
            if matches!(segs.as_slice(), [PathSegment::Key(k)] if k == name))
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn unquote(text: &str) -> String {
    let inner = &text[1..text.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

fn parse_number(text: &str) -> Result<Value> {
    if let Ok(n) = text.parse::<i64>() {
        return Ok(Value::from(n));
    }
    text.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .ok_or_else(|| QuillError::malformed(text, "invalid number"))
}

fn parse_path(text: &str) -> Result<Vec<PathSegment>> {
    let mut scanner = Scanner::new(text);
    let mut segments = Vec::new();

    if let Some(name) = scanner.read_identifier() {
        segments.push(PathSegment::Key(name.to_string()));
    }
    while !scanner.is_eof() {
        if scanner.eat('.') {
            if let Some(name) = scanner.read_identifier() {
                segments.push(PathSegment::Key(name.to_string()));
            } else if let Some(digits) = scanner.read_digits() {
                let index = digits
                    .parse::<i64>()
                    .map_err(|_| QuillError::malformed(text, "invalid index"))?;
                segments.push(PathSegment::Index(index));
            } else {
                return Err(QuillError::malformed(text, "expected a property name after '.'"));
            }
        } else if scanner.eat('[') {
            scanner.skip_whitespace();
            let token = scanner
                .read_value()?
                .ok_or_else(|| QuillError::malformed(text, "expected a value inside '[...]'"))?;
            scanner.skip_whitespace();
            if !scanner.eat(']') {
                return Err(QuillError::malformed(text, "expected ']'"));
            }
            segments.push(bracket_segment(&token)?);
        } else {
            return Err(QuillError::malformed(text, "invalid property path"));
        }
    }
    Ok(segments)
}

fn bracket_segment(token: &Token) -> Result<PathSegment> {
    let inner = Expression::from_token(token)?;
    match inner.as_literal() {
        Some(Value::String(s)) => return Ok(PathSegment::Key(s.clone())),
        Some(Value::Number(n)) => {
            if let Some(index) = n.as_i64() {
                return Ok(PathSegment::Index(index));
            }
        }
        _ => {}
    }
    Ok(PathSegment::Dynamic(inner))
}

fn parse_range(text: &str) -> Result<(Expression, Expression)> {
    let mut scanner = Scanner::new(text);
    scanner.eat('(');
    scanner.skip_whitespace();
    let start = scanner
        .read_value()?
        .ok_or_else(|| QuillError::malformed(text, "expected range start"))?;
    scanner.skip_whitespace();
    scanner.eat_str("..");
    scanner.skip_whitespace();
    let end = scanner
        .read_value()?
        .ok_or_else(|| QuillError::malformed(text, "expected range end"))?;
    Ok((Expression::from_token(&start)?, Expression::from_token(&end)?))
}
