// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

use crate::ast::{Node, Tag};
use crate::context::Context;
use crate::error::Result;
use crate::parser::{TagParser, TagToken, TemplateParser};
use crate::render::Renderer;
use crate::token::Scanner;
use crate::value::ValueExpression;
use async_trait::async_trait;
use serde_json::Value;

/// `{% assign name = value | filters %}`
#[derive(Debug)]
pub struct AssignTag {
    name: String,
    value: ValueExpression,
}

#[async_trait]
impl Tag for AssignTag {
    async fn render(&self, ctx: &mut Context, _out: &mut String, renderer: &Renderer<'_>) -> Result<()> {
        let value = renderer.evaluate(&self.value, ctx).await?;
        ctx.assign(self.name.clone(), value);
        Ok(())
    }
}

pub(crate) struct AssignParser;

impl TagParser for AssignParser {
    fn parse(&self, tag: &TagToken<'_>, parser: &mut TemplateParser<'_>) -> Result<Box<dyn Tag>> {
        let Some((name, value)) = tag.args.split_once('=') else {
            return Err(parser.error(tag.offset, "expected 'assign name = value'"));
        };
        let name = variable_name(name).ok_or_else(|| parser.error(tag.offset, "invalid variable name in 'assign'"))?;
        Ok(Box::new(AssignTag {
            name,
            value: ValueExpression::parse(value)?,
        }))
    }
}

/// `{% capture name %}...{% endcapture %}`
#[derive(Debug)]
pub struct CaptureTag {
    name: String,
    body: Vec<Node>,
}

#[async_trait]
impl Tag for CaptureTag {
    async fn render(&self, ctx: &mut Context, _out: &mut String, renderer: &Renderer<'_>) -> Result<()> {
        let mut captured = String::new();
        renderer.render_nodes(&self.body, ctx, &mut captured).await?;
        ctx.assign(self.name.clone(), Value::String(captured));
        Ok(())
    }
}

pub(crate) struct CaptureParser;

impl TagParser for CaptureParser {
    fn parse(&self, tag: &TagToken<'_>, parser: &mut TemplateParser<'_>) -> Result<Box<dyn Tag>> {
        let name = variable_name(tag.args).ok_or_else(|| parser.error(tag.offset, "invalid variable name in 'capture'"))?;
        let (body, _) = parser.parse_block(tag, &["endcapture"])?;
        Ok(Box::new(CaptureTag { name, body }))
    }
}

/// Accepts exactly one identifier, surrounding whitespace aside.
fn variable_name(text: &str) -> Option<String> {
    let text = text.trim();
    let mut scanner = Scanner::new(text);
    let name = scanner.read_identifier()?;
    scanner.is_eof().then(|| name.to_string())
}
