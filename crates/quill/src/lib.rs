// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

// Warn on missing documentation for public items
#![warn(missing_docs)]
#![allow(clippy::result_large_err)]

//! # Quill
//!
//! Liquid-style template engine for Rust with one evaluator for both
//! synchronous and asynchronous rendering.
//!
//! ## Features
//!
//! - `{{ value | filter: arg, key: value }}` outputs with quote-aware parsing
//! - Filters and variable sources may return pending values, awaited in
//!   async mode and rejected in sync mode
//! - Pluggable filters and tags
//! - Compiled template cache: disabled, unbounded, LRU or custom
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use quill::{Engine, EngineOptions};
//!
//! let engine = Engine::with_options(EngineOptions {
//!     root: vec!["./views".into()],
//!     extname: ".liquid".into(),
//!     cache: true.into(),
//!     ..Default::default()
//! });
//!
//! let html = engine.render_file_sync("hello", serde_json::json!({ "name": "World" }))?;
//! let html = engine.render_file("hello", serde_json::json!({ "name": "World" })).await?;
//! ```

/// Compiled node tree types.
pub mod ast;
/// Compiled template caching.
pub mod cache;
/// Render-time variable scopes.
pub mod context;
/// Main template engine.
pub mod engine;
/// Error types and reporting.
pub mod error;
/// Parsed single expressions.
pub mod expression;
/// Filter invocations and registry.
pub mod filter;
/// Built-in filters.
pub mod filters;
/// In-memory source reader for tests and embedded templates.
pub mod memory_resolver;
/// Template markup parser.
pub mod parser;
/// The interpreter and its sync/async drivers.
pub mod render;
/// Settled and pending step results.
pub mod resolution;
/// Source lookup (filesystem).
pub mod resolver;
/// Built-in tags.
pub mod tags;
/// Literal scanner.
pub mod token;
/// Value expressions and value helpers.
pub mod value;

pub use ast::*;
pub use cache::*;
pub use context::*;
pub use engine::*;
pub use error::*;
pub use expression::*;
pub use filter::*;
pub use memory_resolver::MemoryResourceResolver;
pub use parser::*;
pub use render::{render_async, render_sync, run_sync, Renderer, MAX_RANGE_LEN};
pub use resolution::*;
pub use resolver::*;
pub use token::*;
pub use value::*;

// Re-export the data value type
pub use serde_json::Value;
