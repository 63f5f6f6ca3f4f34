// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

use crate::ast::{Node, Tag};
use crate::context::{Context, Scope};
use crate::error::Result;
use crate::expression::Expression;
use crate::parser::{TagParser, TagToken, TemplateParser};
use crate::render::Renderer;
use crate::token::Scanner;
use async_trait::async_trait;
use serde_json::{json, Value};

/// `{% for item in collection [reversed] %}...{% else %}...{% endfor %}`
///
/// Each iteration runs in its own scope frame holding the loop variable and
/// `forloop`. The frame is popped whether or not the body succeeds. The
/// `else` body renders when the collection is empty.
#[derive(Debug)]
pub struct ForTag {
    variable: String,
    collection: Expression,
    reversed: bool,
    body: Vec<Node>,
    otherwise: Vec<Node>,
}

#[async_trait]
impl Tag for ForTag {
    async fn render(&self, ctx: &mut Context, out: &mut String, renderer: &Renderer<'_>) -> Result<()> {
        let collection = renderer.evaluate_expression(&self.collection, ctx).await?;
        let mut items = iteration_items(collection);
        if self.reversed {
            items.reverse();
        }
        if items.is_empty() {
            return renderer.render_nodes(&self.otherwise, ctx, out).await;
        }

        let length = items.len();
        for (index0, item) in items.into_iter().enumerate() {
            let mut frame = Scope::new();
            frame.insert(self.variable.clone(), item);
            frame.insert(
                "forloop".to_string(),
                json!({
                    "index": index0 + 1,
                    "index0": index0,
                    "rindex": length - index0,
                    "rindex0": length - index0 - 1,
                    "first": index0 == 0,
                    "last": index0 + 1 == length,
                    "length": length,
                }),
            );

            ctx.push(frame);
            let result = renderer.render_nodes(&self.body, ctx, out).await;
            ctx.pop();
            result?;
        }
        Ok(())
    }
}

/// Objects iterate as `[key, value]` pairs; scalars as a single item.
fn iteration_items(collection: Value) -> Vec<Value> {
    match collection {
        Value::Array(items) => items,
        Value::Object(map) => map.into_iter().map(|(k, v)| json!([k, v])).collect(),
        Value::Null => Vec::new(),
        Value::String(s) if s.is_empty() => Vec::new(),
        other => vec![other],
    }
}

pub(crate) struct ForParser;

impl TagParser for ForParser {
    fn parse(&self, tag: &TagToken<'_>, parser: &mut TemplateParser<'_>) -> Result<Box<dyn Tag>> {
        let mut scanner = Scanner::new(tag.args);
        let variable = scanner
            .read_identifier()
            .ok_or_else(|| parser.error(tag.offset, "expected 'for item in collection'"))?
            .to_string();
        scanner.skip_whitespace();
        if scanner.read_identifier() != Some("in") {
            return Err(parser.error(tag.offset, "expected 'in' after the loop variable"));
        }
        scanner.skip_whitespace();
        let token = scanner
            .read_value()?
            .ok_or_else(|| parser.error(tag.offset, "expected a collection after 'in'"))?;
        let collection = Expression::from_token(&token)?;

        let mut reversed = false;
        loop {
            scanner.skip_whitespace();
            match scanner.read_identifier() {
                None if scanner.is_eof() => break,
                Some("reversed") => reversed = true,
                _ => {
                    let rest = scanner.rest().trim();
                    return Err(parser.error(tag.offset, format!("unexpected '{}' in 'for'", rest)));
                }
            }
        }

        let (body, next) = parser.parse_block(tag, &["else", "endfor"])?;
        let otherwise = if next.name == "else" {
            parser.parse_block(tag, &["endfor"])?.0
        } else {
            Vec::new()
        };

        Ok(Box::new(ForTag {
            variable,
            collection,
            reversed,
            body,
            otherwise,
        }))
    }
}
