// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Compiled node tree types.
//!
//! A [`Template`] is the unit the cache stores and the renderer walks. It is
//! immutable after parsing and shared read-only across renders.
//!
//! # Node Types
//!
//! - [`Node::Text`]: literal text copied to the output
//! - [`Node::Output`]: a `{{ value | filters }}` expression
//! - [`Node::Tag`]: a `{% tag %}` supplied by a [`Tag`] implementation

use crate::context::Context;
use crate::error::Result;
use crate::render::Renderer;
use crate::value::ValueExpression;
use async_trait::async_trait;
use std::fmt;

/// A compiled tag or block.
///
/// Tags run under the same suspend/resume contract as the rest of the tree:
/// pending values go through [`Renderer::settle`], and any scope frame a tag
/// pushes is popped before it returns, on the error path too.
#[async_trait]
pub trait Tag: Send + Sync + fmt::Debug {
    /// Renders the tag, appending to `out`.
    async fn render(&self, ctx: &mut Context, out: &mut String, renderer: &Renderer<'_>) -> Result<()>;
}

/// One node of a compiled template.
#[derive(Debug)]
pub enum Node {
    /// Literal text.
    Text(String),
    /// `{{ expression }}`.
    Output(ValueExpression),
    /// `{% tag %}` and any body it owns.
    Tag(Box<dyn Tag>),
}

/// A compiled template.
#[derive(Debug)]
pub struct Template {
    /// The template name or resolved path, when loaded by name.
    pub name: Option<String>,
    /// Top-level nodes in source order.
    pub nodes: Vec<Node>,
}

impl Template {
    /// Creates a template from already parsed nodes.
    pub fn new(nodes: Vec<Node>) -> Self {
        Self { name: None, nodes }
    }

    /// Sets the template name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}
