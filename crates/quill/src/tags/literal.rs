// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

use crate::ast::Tag;
use crate::context::Context;
use crate::error::Result;
use crate::parser::{TagParser, TagToken, TemplateParser};
use crate::render::Renderer;
use async_trait::async_trait;

/// Fixed text. `raw` keeps its body verbatim, `comment` keeps nothing.
#[derive(Debug)]
pub struct LiteralTag {
    text: String,
}

#[async_trait]
impl Tag for LiteralTag {
    async fn render(&self, _ctx: &mut Context, out: &mut String, _renderer: &Renderer<'_>) -> Result<()> {
        out.push_str(&self.text);
        Ok(())
    }
}

pub(crate) struct CommentParser;

impl TagParser for CommentParser {
    fn parse(&self, tag: &TagToken<'_>, parser: &mut TemplateParser<'_>) -> Result<Box<dyn Tag>> {
        parser.skip_block(tag, "endcomment")?;
        Ok(Box::new(LiteralTag { text: String::new() }))
    }
}

pub(crate) struct RawParser;

impl TagParser for RawParser {
    fn parse(&self, tag: &TagToken<'_>, parser: &mut TemplateParser<'_>) -> Result<Box<dyn Tag>> {
        let text = parser.next_text().unwrap_or_default().to_string();
        parser.parse_block(tag, &["endraw"])?;
        Ok(Box::new(LiteralTag { text }))
    }
}
