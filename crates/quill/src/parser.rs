// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Template markup parser.
//!
//! Parsing happens in two passes. The lexer splits the source into text,
//! `{{ output }}` and `{% tag %}` pieces; the [`TemplateParser`] then turns
//! them into [`Node`]s, handing each tag to the [`TagParser`] registered
//! for its name. Block tags pull their bodies from the same parser with
//! [`TemplateParser::parse_block`].
//!
//! A `-` just inside a delimiter (`{{-`, `-%}`) trims the whitespace of the
//! adjacent text.

use crate::ast::{Node, Tag, Template};
use crate::error::{QuillError, Result};
use crate::value::ValueExpression;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A `{% name args %}` piece as seen by a [`TagParser`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagToken<'a> {
    /// Tag name.
    pub name: &'a str,
    /// Everything after the name, trimmed.
    pub args: &'a str,
    /// Byte offset of the opening `{%`.
    pub offset: usize,
}

#[derive(Debug, Clone, Copy)]
enum Lexeme<'a> {
    Text(&'a str),
    Output { text: &'a str, offset: usize },
    Tag(TagToken<'a>),
}

/// Compiles a tag into its runtime form.
pub trait TagParser: Send + Sync {
    /// Parses `tag`. Block tags consume their body from `parser`.
    fn parse(&self, tag: &TagToken<'_>, parser: &mut TemplateParser<'_>) -> Result<Box<dyn Tag>>;
}

/// Name-to-parser mapping for tags.
#[derive(Clone, Default)]
pub struct TagRegistry {
    tags: HashMap<String, Arc<dyn TagParser>>,
}

impl TagRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the built-in tags.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        crate::tags::register_builtins(&mut registry);
        registry
    }

    /// Registers `parser` for tags named `name`.
    pub fn register(&mut self, name: impl Into<String>, parser: impl TagParser + 'static) {
        self.tags.insert(name.into(), Arc::new(parser));
    }

    /// Looks up a tag parser.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn TagParser>> {
        self.tags.get(name)
    }
}

impl fmt::Debug for TagRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.tags.keys().collect();
        names.sort();
        f.debug_struct("TagRegistry").field("tags", &names).finish()
    }
}

/// Parses `source` into a [`Template`].
pub fn parse_template(source: &str, tags: &TagRegistry) -> Result<Template> {
    let mut parser = TemplateParser::new(source, tags)?;
    let (nodes, _) = parser.parse_until(&[])?;
    Ok(Template::new(nodes))
}

/// Cursor over the lexed pieces of one template.
pub struct TemplateParser<'a> {
    source: &'a str,
    lexemes: Vec<Lexeme<'a>>,
    pos: usize,
    tags: &'a TagRegistry,
}

impl<'a> TemplateParser<'a> {
    /// Lexes `source` and positions the parser at its start.
    pub fn new(source: &'a str, tags: &'a TagRegistry) -> Result<Self> {
        Ok(Self {
            source,
            lexemes: lex(source)?,
            pos: 0,
            tags,
        })
    }

    /// Builds a parse error at `offset` of the template source.
    pub fn error(&self, offset: usize, message: impl Into<String>) -> QuillError {
        QuillError::parse_at(self.source, offset, message)
    }

    /// Parses nodes until a tag named in `ends` or the end of input.
    ///
    /// Returns the nodes and the terminating tag, which is consumed.
    pub fn parse_until(&mut self, ends: &[&str]) -> Result<(Vec<Node>, Option<TagToken<'a>>)> {
        let mut nodes = Vec::new();
        while let Some(lexeme) = self.lexemes.get(self.pos).copied() {
            self.pos += 1;
            match lexeme {
                Lexeme::Text(text) => nodes.push(Node::Text(text.to_string())),
                Lexeme::Output { text, .. } if text.trim().is_empty() => {}
                Lexeme::Output { text, .. } => nodes.push(Node::Output(ValueExpression::parse(text)?)),
                Lexeme::Tag(tag) if ends.contains(&tag.name) => return Ok((nodes, Some(tag))),
                Lexeme::Tag(tag) => {
                    let parser = match self.tags.get(tag.name) {
                        Some(parser) => Arc::clone(parser),
                        None if is_branch_or_end(tag.name) => {
                            return Err(self.error(tag.offset, format!("unexpected '{}'", tag.name)))
                        }
                        None => return Err(self.error(tag.offset, format!("unknown tag '{}'", tag.name))),
                    };
                    nodes.push(Node::Tag(parser.parse(&tag, self)?));
                }
            }
        }
        Ok((nodes, None))
    }

    /// Parses the body of the block opened by `opening` up to one of `ends`.
    pub fn parse_block(&mut self, opening: &TagToken<'_>, ends: &[&str]) -> Result<(Vec<Node>, TagToken<'a>)> {
        match self.parse_until(ends)? {
            (nodes, Some(end)) => Ok((nodes, end)),
            (_, None) => Err(self.error(
                opening.offset,
                format!("tag '{}' was never closed", opening.name),
            )),
        }
    }

    /// Discards everything up to and including the tag named `end`.
    pub fn skip_block(&mut self, opening: &TagToken<'_>, end: &str) -> Result<()> {
        while let Some(lexeme) = self.lexemes.get(self.pos).copied() {
            self.pos += 1;
            if matches!(lexeme, Lexeme::Tag(tag) if tag.name == end) {
                return Ok(());
            }
        }
        Err(self.error(
            opening.offset,
            format!("tag '{}' was never closed", opening.name),
        ))
    }

    /// Takes the next piece if it is literal text.
    pub fn next_text(&mut self) -> Option<&'a str> {
        match self.lexemes.get(self.pos) {
            Some(Lexeme::Text(text)) => {
                self.pos += 1;
                Some(text)
            }
            _ => None,
        }
    }
}

fn is_branch_or_end(name: &str) -> bool {
    name.starts_with("end") || matches!(name, "else" | "elsif")
}

fn lex(source: &str) -> Result<Vec<Lexeme<'_>>> {
    let mut lexemes = Vec::new();
    let mut pos = 0;
    let mut trim_next = false;

    while pos < source.len() {
        let Some(start) = find_open(source, pos) else {
            push_text(&mut lexemes, &source[pos..], trim_next, false);
            break;
        };
        let is_output = source[start..].starts_with("{{");
        let close = if is_output { "}}" } else { "%}" };
        let inner_start = start + 2;
        let end = find_close(source, inner_start, close).ok_or_else(|| {
            QuillError::parse_at(source, start, format!("'{}' was never closed", &source[start..inner_start]))
        })?;

        let mut inner = &source[inner_start..end];
        let trim_left = inner.starts_with('-');
        if trim_left {
            inner = &inner[1..];
        }
        let trim_right = inner.ends_with('-');
        if trim_right {
            inner = &inner[..inner.len() - 1];
        }

        push_text(&mut lexemes, &source[pos..start], trim_next, trim_left);
        trim_next = trim_right;
        pos = end + 2;

        if is_output {
            lexemes.push(Lexeme::Output { text: inner, offset: start });
            continue;
        }

        let inner = inner.trim();
        let name_end = inner
            .find(|c: char| !(c.is_alphanumeric() || c == '_'))
            .unwrap_or(inner.len());
        if name_end == 0 {
            return Err(QuillError::parse_at(source, start, "missing tag name"));
        }
        let tag = TagToken {
            name: &inner[..name_end],
            args: inner[name_end..].trim(),
            offset: start,
        };
        lexemes.push(Lexeme::Tag(tag));

        if tag.name == "raw" {
            let body_end = find_endraw(source, pos)
                .ok_or_else(|| QuillError::parse_at(source, start, "tag 'raw' was never closed"))?;
            let body = &source[pos..body_end];
            let body = if trim_next { body.trim_start() } else { body };
            let body = if source[body_end + 2..].starts_with('-') { body.trim_end() } else { body };
            lexemes.push(Lexeme::Text(body));
            pos = body_end;
            trim_next = false;
        }
    }

    Ok(lexemes)
}

fn push_text<'a>(lexemes: &mut Vec<Lexeme<'a>>, text: &'a str, trim_start: bool, trim_end: bool) {
    let text = if trim_start { text.trim_start() } else { text };
    let text = if trim_end { text.trim_end() } else { text };
    if !text.is_empty() {
        lexemes.push(Lexeme::Text(text));
    }
}

fn find_open(source: &str, from: usize) -> Option<usize> {
    let rest = &source[from..];
    match (rest.find("{{"), rest.find("{%")) {
        (Some(a), Some(b)) => Some(from + a.min(b)),
        (Some(a), None) | (None, Some(a)) => Some(from + a),
        (None, None) => None,
    }
}

/// Finds `close` outside quoted literals. A backslash escapes the next
/// character inside a literal.
fn find_close(source: &str, from: usize, close: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (i, c) in source[from..].char_indices() {
        match quote {
            Some(_) if escaped => escaped = false,
            Some(_) if c == '\\' => escaped = true,
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '"' || c == '\'' => quote = Some(c),
            None if source[from + i..].starts_with(close) => return Some(from + i),
            None => {}
        }
    }
    None
}

fn find_endraw(source: &str, from: usize) -> Option<usize> {
    let mut search = from;
    while let Some(found) = source[search..].find("{%") {
        let start = search + found;
        let inner = source[start + 2..].trim_start_matches('-').trim_start();
        if let Some(after) = inner.strip_prefix("endraw") {
            if !after.starts_with(|c: char| c.is_alphanumeric() || c == '_') {
                return Some(start);
            }
        }
        search = start + 2;
    }
    None
}
