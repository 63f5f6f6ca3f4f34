// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Variable scope for one render call.
//!
//! A [`Context`] is a stack of scope frames over a shared globals frame.
//! Frame 0 holds the render data; block tags push a frame on entry and pop
//! it on exit. Lookups walk from the innermost frame outwards, then the
//! globals, then an optional deferred [`VariableSource`].

use crate::resolution::Resolution;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// One scope frame.
pub type Scope = Map<String, Value>;

/// A fallback for names no frame defines, typically backed by I/O.
///
/// Returning [`Resolution::Pending`] makes the lookup a suspension point.
pub trait VariableSource: Send + Sync {
    /// Resolves a top-level name, or `None` if the source doesn't know it.
    fn lookup(&self, name: &str) -> Option<Resolution>;
}

impl<F> VariableSource for F
where
    F: Fn(&str) -> Option<Resolution> + Send + Sync,
{
    fn lookup(&self, name: &str) -> Option<Resolution> {
        self(name)
    }
}

/// Scope stack owned by a single render call.
pub struct Context {
    frames: Vec<Scope>,
    globals: Arc<Scope>,
    source: Option<Arc<dyn VariableSource>>,
    strict_variables: bool,
}

impl Context {
    /// Creates a context whose bottom frame is `data`.
    pub fn new(data: Scope) -> Self {
        Self {
            frames: vec![data],
            globals: Arc::new(Scope::new()),
            source: None,
            strict_variables: false,
        }
    }

    /// Replaces the globals frame.
    pub fn with_globals(mut self, globals: Arc<Scope>) -> Self {
        self.globals = globals;
        self
    }

    /// Installs a deferred source consulted after every frame misses.
    pub fn with_source(mut self, source: Arc<dyn VariableSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Makes lookups of unknown names an error instead of nil.
    pub fn with_strict_variables(mut self, strict: bool) -> Self {
        self.strict_variables = strict;
        self
    }

    /// Whether unknown names are an error.
    pub fn strict_variables(&self) -> bool {
        self.strict_variables
    }

    /// Enters a nested block scope.
    pub fn push(&mut self, scope: Scope) {
        self.frames.push(scope);
    }

    /// Leaves the innermost block scope. The bottom frame is never popped.
    pub fn pop(&mut self) -> Option<Scope> {
        if self.frames.len() > 1 {
            self.frames.pop()
        } else {
            None
        }
    }

    /// Number of frames, the bottom frame included.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Sets `name` in the innermost frame.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        if let Some(frame) = self.frames.last_mut() {
            frame.insert(name.into(), value);
        }
    }

    /// Sets `name` in the bottom frame, so it outlives the current block.
    pub fn assign(&mut self, name: impl Into<String>, value: Value) {
        if let Some(frame) = self.frames.first_mut() {
            frame.insert(name.into(), value);
        }
    }

    /// Finds a top-level name in the frames, then the globals.
    pub fn find(&self, name: &str) -> Option<&Value> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.get(name))
            .or_else(|| self.globals.get(name))
    }

    /// Asks the deferred source for a name no frame defines.
    pub fn fetch(&self, name: &str) -> Option<Resolution> {
        self.source.as_ref().and_then(|source| source.lookup(name))
    }

    /// Convenience lookup of a dotted path over settled values only.
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut parts = path.split('.');
        let mut current = self.find(parts.next()?)?;
        for part in parts {
            current = match current {
                Value::Object(map) => map.get(part)?,
                Value::Array(items) => items.get(part.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("frames", &self.frames)
            .field("globals", &self.globals)
            .field("source", &self.source.is_some())
            .field("strict_variables", &self.strict_variables)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn scope(value: Value) -> Scope {
        match value {
            Value::Object(map) => map,
            _ => Scope::new(),
        }
    }

    #[test]
    fn lookup_simple() {
        let ctx = Context::new(scope(json!({ "a": 1 })));
        assert_eq!(ctx.find("a"), Some(&json!(1)));
        assert_eq!(ctx.find("b"), None);
    }

    #[test]
    fn lookup_nested() {
        let ctx = Context::new(scope(json!({ "a": { "b": [10, 20] } })));
        assert_eq!(ctx.get("a.b.1"), Some(&json!(20)));
        assert_eq!(ctx.get("a.c"), None);
        assert_eq!(ctx.get("x.y"), None);
    }

    #[test]
    fn inner_frames_shadow_outer_ones() {
        let mut ctx = Context::new(scope(json!({ "a": 1 })));
        ctx.push(scope(json!({ "a": 2 })));
        assert_eq!(ctx.find("a"), Some(&json!(2)));

        ctx.pop();
        assert_eq!(ctx.find("a"), Some(&json!(1)));
    }

    #[test]
    fn globals_sit_below_every_frame() {
        let globals = Arc::new(scope(json!({ "site": "docs", "a": 0 })));
        let ctx = Context::new(scope(json!({ "a": 1 }))).with_globals(globals);
        assert_eq!(ctx.find("site"), Some(&json!("docs")));
        assert_eq!(ctx.find("a"), Some(&json!(1)));
    }

    #[test]
    fn bottom_frame_is_never_popped() {
        let mut ctx = Context::new(Scope::new());
        assert!(ctx.pop().is_none());
        assert_eq!(ctx.depth(), 1);
    }

    #[test]
    fn assign_targets_the_bottom_frame() {
        let mut ctx = Context::new(Scope::new());
        ctx.push(Scope::new());
        ctx.assign("kept", json!(true));
        ctx.set("dropped", json!(true));
        ctx.pop();
        assert_eq!(ctx.find("kept"), Some(&json!(true)));
        assert_eq!(ctx.find("dropped"), None);
    }

    #[test]
    fn source_answers_only_when_asked() {
        let ctx = Context::new(Scope::new())
            .with_source(Arc::new(|name: &str| (name == "user").then(|| Resolution::Settled(json!("ana")))));
        assert!(ctx.find("user").is_none());
        assert!(matches!(ctx.fetch("user"), Some(Resolution::Settled(v)) if v == json!("ana")));
        assert!(ctx.fetch("other").is_none());
    }
}
