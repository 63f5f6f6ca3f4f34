// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Quill template engine for compiling and rendering templates.
//!
//! This module provides the core [`Engine`] type that handles the complete
//! template lifecycle: resolution, parsing, caching, and rendering.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use quill::{Engine, EngineOptions};
//!
//! let engine = Engine::with_options(EngineOptions {
//!     root: vec!["./views".into()],
//!     extname: ".liquid".into(),
//!     cache: 100.into(),
//!     ..Default::default()
//! });
//!
//! let html = engine.render_file_sync("hello", serde_json::json!({ "name": "World" }))?;
//! ```
//!
//! # Sync and Async Rendering
//!
//! Every render operation has two forms. The `async` form awaits filters
//! and variable sources that return pending values; the `_sync` form fails
//! with [`QuillError::SynchronousModeViolation`] as soon as one does. Both
//! run the same evaluator.
//!
//! # Caching
//!
//! Named templates go through the engine's [`TemplateCache`], chosen by the
//! `cache` option. Lookups that fail (missing source, parse error) are
//! never stored, so a template that appears later is picked up on the next
//! call.

use crate::ast::Template;
use crate::cache::{CacheOption, TemplateCache};
use crate::context::{Context, Scope};
use crate::error::{QuillError, Result};
use crate::filter::{Filter, FilterRegistry};
use crate::parser::{parse_template, TagParser, TagRegistry};
use crate::render;
#[cfg(feature = "filesystem")]
use crate::resolver::FileSystemResolver;
use crate::resolver::SourceReader;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;

/// Engine configuration.
///
/// Deserializable, so it can be loaded from a config file:
///
/// ```json
/// { "root": ["views"], "extname": ".liquid", "cache": 50, "strict_variables": true }
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    /// Template roots, searched in order.
    pub root: Vec<PathBuf>,
    /// Extension appended to template names that have none.
    pub extname: String,
    /// Compiled template retention policy.
    pub cache: CacheOption,
    /// Fail on undefined variables instead of rendering nil.
    pub strict_variables: bool,
    /// Variables visible to every render, below the render data.
    pub globals: Scope,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            root: vec![PathBuf::from(".")],
            extname: String::new(),
            cache: CacheOption::Disabled,
            strict_variables: false,
            globals: Scope::new(),
        }
    }
}

/// The template engine.
///
/// Holds the source reader, the compiled template cache and the filter and
/// tag registries. An engine is shared read-only between renders; each
/// render call gets its own [`Context`].
pub struct Engine<R: SourceReader> {
    reader: R,
    cache: Arc<dyn TemplateCache>,
    filters: FilterRegistry,
    tags: TagRegistry,
    globals: Arc<Scope>,
    strict_variables: bool,
}

#[cfg(feature = "filesystem")]
impl Engine<FileSystemResolver> {
    /// Creates an engine reading templates from `options.root`.
    pub fn with_options(options: EngineOptions) -> Self {
        let reader = FileSystemResolver::new(&options.root).with_extname(options.extname.clone());
        Self::new(reader, options)
    }
}

impl<R: SourceReader> Engine<R> {
    /// Creates an engine over `reader` with built-in filters and tags.
    ///
    /// `root` and `extname` in `options` are ignored here; they only
    /// configure the reader built by [`Engine::with_options`].
    pub fn new(reader: R, options: EngineOptions) -> Self {
        Self {
            reader,
            cache: options.cache.build(),
            filters: FilterRegistry::with_builtins(),
            tags: TagRegistry::with_builtins(),
            globals: Arc::new(options.globals),
            strict_variables: options.strict_variables,
        }
    }

    /// Creates an engine with a bounded in-memory cache.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let resolver = MemoryResourceResolver::new();
    /// let engine = Engine::with_memory_cache(resolver, 100);
    /// ```
    pub fn with_memory_cache(reader: R, cache_size: usize) -> Self {
        Self::new(
            reader,
            EngineOptions {
                cache: CacheOption::Bounded(cache_size),
                ..Default::default()
            },
        )
    }

    /// The source reader.
    pub fn reader(&self) -> &R {
        &self.reader
    }

    /// The compiled template cache.
    pub fn cache(&self) -> &dyn TemplateCache {
        self.cache.as_ref()
    }

    /// The filter registry.
    pub fn filters(&self) -> &FilterRegistry {
        &self.filters
    }

    /// Registers a filter, replacing any built-in of the same name.
    pub fn register_filter(&mut self, name: impl Into<String>, filter: impl Filter + 'static) {
        self.filters.register(name, filter);
    }

    /// Registers a tag, replacing any built-in of the same name.
    pub fn register_tag(&mut self, name: impl Into<String>, parser: impl TagParser + 'static) {
        self.tags.register(name, parser);
    }

    /// Compiles template text. Nothing is cached.
    pub fn parse(&self, text: &str) -> Result<Template> {
        tracing::debug!(len = text.len(), "compiling template");
        parse_template(text, &self.tags)
    }

    /// Compiles the named template, going through the cache.
    ///
    /// Each candidate identity from the reader is tried in order: a cached
    /// template for it wins, otherwise its source is read. The cache is
    /// checked before the source, so a cached template is served even after
    /// its source has changed or disappeared.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No candidate is cached or readable ([`QuillError::SourceNotFound`])
    /// - The markup does not parse
    ///
    /// Neither outcome is cached.
    pub fn parse_file_sync(&self, name: &str) -> Result<Arc<Template>> {
        for key in self.reader.candidates(name) {
            if let Some(template) = self.cached(&key) {
                return Ok(template);
            }
            match self.reader.read(&key) {
                Ok(source) => return self.compile_and_store(key, &source),
                Err(QuillError::SourceNotFound(_)) => continue,
                Err(err) => return Err(err),
            }
        }
        Err(QuillError::SourceNotFound(name.to_string()))
    }

    /// Async form of [`parse_file_sync`](Self::parse_file_sync). Sources are
    /// loaded with [`SourceReader::read_async`].
    pub async fn parse_file(&self, name: &str) -> Result<Arc<Template>> {
        for key in self.reader.candidates(name) {
            if let Some(template) = self.cached(&key) {
                return Ok(template);
            }
            match self.reader.read_async(&key).await {
                Ok(source) => return self.compile_and_store(key, &source),
                Err(QuillError::SourceNotFound(_)) => continue,
                Err(err) => return Err(err),
            }
        }
        Err(QuillError::SourceNotFound(name.to_string()))
    }

    fn cached(&self, key: &str) -> Option<Arc<Template>> {
        if self.cache.has(key) {
            if let Some(template) = self.cache.read(key) {
                tracing::debug!(key = %key, "template cache hit");
                return Some(template);
            }
        }
        tracing::debug!(key = %key, "template cache miss");
        None
    }

    fn compile_and_store(&self, key: String, source: &str) -> Result<Arc<Template>> {
        let template = self
            .parse(source)
            .map_err(|err| err.in_file(&key))?
            .with_name(key.clone());
        let template = Arc::new(template);

        self.cache.write(&key, Arc::clone(&template));
        tracing::debug!(key = %key, "stored compiled template");
        Ok(template)
    }

    /// Builds a render context from serializable data.
    ///
    /// The data must serialize to an object (or nil, for no variables).
    pub fn context<T: Serialize>(&self, data: T) -> Result<Context> {
        let scope = match serde_json::to_value(data)? {
            Value::Object(map) => map,
            Value::Null => Scope::new(),
            other => {
                return Err(QuillError::InvalidOption(format!(
                    "render data must be an object, got {}",
                    other
                )))
            }
        };
        Ok(Context::new(scope)
            .with_globals(Arc::clone(&self.globals))
            .with_strict_variables(self.strict_variables))
    }

    /// Renders `template` against `ctx`, awaiting pending values.
    pub async fn render_with(&self, template: &Template, ctx: &mut Context) -> Result<String> {
        render::render_async(&self.filters, template, ctx).await
    }

    /// Renders `template` against `ctx`, failing on pending values.
    pub fn render_with_sync(&self, template: &Template, ctx: &mut Context) -> Result<String> {
        render::render_sync(&self.filters, template, ctx)
    }

    /// Renders `template` with `data`, awaiting pending values.
    pub async fn render<T: Serialize>(&self, template: &Template, data: T) -> Result<String> {
        let mut ctx = self.context(data)?;
        self.render_with(template, &mut ctx).await
    }

    /// Renders `template` with `data` synchronously.
    pub fn render_sync<T: Serialize>(&self, template: &Template, data: T) -> Result<String> {
        let mut ctx = self.context(data)?;
        self.render_with_sync(template, &mut ctx)
    }

    /// Compiles and renders template text.
    pub async fn parse_and_render<T: Serialize>(&self, text: &str, data: T) -> Result<String> {
        let mut ctx = self.context(data)?;
        let template = self.parse(text)?;
        self.render_with(&template, &mut ctx).await
    }

    /// Compiles and renders template text synchronously.
    pub fn parse_and_render_sync<T: Serialize>(&self, text: &str, data: T) -> Result<String> {
        let template = self.parse(text)?;
        self.render_sync(&template, data)
    }

    /// Loads (through the cache) and renders the named template.
    pub async fn render_file<T: Serialize>(&self, name: &str, data: T) -> Result<String> {
        let mut ctx = self.context(data)?;
        let template = self.parse_file(name).await?;
        self.render_with(&template, &mut ctx).await
    }

    /// Loads (through the cache) and renders the named template synchronously.
    pub fn render_file_sync<T: Serialize>(&self, name: &str, data: T) -> Result<String> {
        let template = self.parse_file_sync(name)?;
        self.render_sync(&template, data)
    }
}

impl<R: SourceReader + std::fmt::Debug> std::fmt::Debug for Engine<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("reader", &self.reader)
            .field("cache", &self.cache)
            .field("filters", &self.filters)
            .field("tags", &self.tags)
            .finish()
    }
}
