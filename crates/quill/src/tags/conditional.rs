// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

use crate::ast::{Node, Tag};
use crate::context::Context;
use crate::error::Result;
use crate::parser::{TagParser, TagToken, TemplateParser};
use crate::render::Renderer;
use crate::value::{is_truthy, ValueExpression};
use async_trait::async_trait;

#[derive(Debug)]
struct Branch {
    condition: ValueExpression,
    body: Vec<Node>,
}

/// `if` / `elsif` / `else`, and `unless` / `else`.
///
/// Conditions are value expressions tested for truthiness. For `unless`
/// the test is inverted.
#[derive(Debug)]
pub struct IfTag {
    branches: Vec<Branch>,
    otherwise: Vec<Node>,
    negate: bool,
}

#[async_trait]
impl Tag for IfTag {
    async fn render(&self, ctx: &mut Context, out: &mut String, renderer: &Renderer<'_>) -> Result<()> {
        for branch in &self.branches {
            let value = renderer.evaluate(&branch.condition, ctx).await?;
            if is_truthy(&value) != self.negate {
                return renderer.render_nodes(&branch.body, ctx, out).await;
            }
        }
        renderer.render_nodes(&self.otherwise, ctx, out).await
    }
}

pub(crate) struct IfParser {
    pub(crate) negate: bool,
}

impl IfParser {
    fn condition(&self, tag: &TagToken<'_>, parser: &TemplateParser<'_>) -> Result<ValueExpression> {
        if tag.args.is_empty() {
            return Err(parser.error(tag.offset, format!("'{}' requires a condition", tag.name)));
        }
        ValueExpression::parse(tag.args)
    }
}

impl TagParser for IfParser {
    fn parse(&self, tag: &TagToken<'_>, parser: &mut TemplateParser<'_>) -> Result<Box<dyn Tag>> {
        let end = if self.negate { "endunless" } else { "endif" };
        let ends = if self.negate {
            vec!["else", end]
        } else {
            vec!["elsif", "else", end]
        };

        let mut branches = Vec::new();
        let mut otherwise = Vec::new();
        let mut condition = self.condition(tag, parser)?;
        loop {
            let (body, next) = parser.parse_block(tag, &ends)?;
            branches.push(Branch { condition, body });
            match next.name {
                "elsif" => condition = self.condition(&next, parser)?,
                "else" => {
                    (otherwise, _) = parser.parse_block(tag, &[end])?;
                    break;
                }
                _ => break,
            }
        }

        Ok(Box::new(IfTag {
            branches,
            otherwise,
            negate: self.negate,
        }))
    }
}
