// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! The template interpreter.
//!
//! There is one evaluator, written as `async` code. Every step that may
//! suspend returns a [`Resolution`] and is funnelled through
//! [`Renderer::settle`]:
//!
//! - In [`RenderMode::Async`] a pending value is awaited in place.
//! - In [`RenderMode::Sync`] a pending value is an immediate
//!   [`QuillError::SynchronousModeViolation`].
//!
//! The synchronous driver, [`render_sync`], polls the evaluator exactly once
//! with a no-op waker. Since sync mode never awaits a pending value, the
//! evaluator finishes in that single poll; if a tag awaited something on
//! its own and the poll comes back `Pending`, that is a violation too.
//!
//! Nodes are evaluated strictly one after another, so output order never
//! depends on how many suspensions happened. An output node appends its
//! text only once its whole filter chain has settled.

use crate::ast::{Node, Template};
use crate::context::Context;
use crate::error::{QuillError, Result};
use crate::expression::{Expression, ExpressionKind, PathSegment};
use crate::filter::{FilterArgs, FilterRegistry};
use crate::resolution::{RenderMode, Resolution};
use crate::value::{property, write_output, ValueExpression};
use futures_util::future::BoxFuture;
use futures_util::task::noop_waker_ref;
use serde_json::{Map, Value};
use std::future::Future;
use std::pin::pin;
use std::task::{Context as TaskContext, Poll};

/// Evaluates node trees against a [`Context`].
#[derive(Debug, Clone, Copy)]
pub struct Renderer<'r> {
    filters: &'r FilterRegistry,
    mode: RenderMode,
}

impl<'r> Renderer<'r> {
    /// Creates a renderer over `filters` in the given mode.
    pub fn new(filters: &'r FilterRegistry, mode: RenderMode) -> Self {
        Self { filters, mode }
    }

    /// The active mode.
    pub fn mode(&self) -> RenderMode {
        self.mode
    }

    /// Turns a step result into a value, awaiting or rejecting pending ones.
    ///
    /// `at` describes the suspension point for error messages.
    pub async fn settle<F>(&self, step: Resolution, at: F) -> Result<Value>
    where
        F: FnOnce() -> String + Send,
    {
        match step {
            Resolution::Settled(value) => Ok(value),
            Resolution::Pending(pending) => match self.mode {
                RenderMode::Sync => Err(QuillError::SynchronousModeViolation { at: at() }),
                RenderMode::Async => {
                    tracing::trace!(at = %at(), "awaiting pending value");
                    pending.await
                }
            },
        }
    }

    /// Renders a whole template into a fresh string.
    pub async fn render(&self, template: &Template, ctx: &mut Context) -> Result<String> {
        let mut out = String::new();
        self.render_nodes(&template.nodes, ctx, &mut out).await?;
        Ok(out)
    }

    /// Renders `nodes` in order, appending to `out`.
    pub async fn render_nodes(&self, nodes: &[Node], ctx: &mut Context, out: &mut String) -> Result<()> {
        for node in nodes {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Output(expr) => {
                    let value = self.evaluate(expr, ctx).await?;
                    write_output(out, &value);
                }
                Node::Tag(tag) => tag.render(ctx, out, self).await?,
            }
        }
        Ok(())
    }

    /// Evaluates a value expression: the initial value, then each filter.
    pub async fn evaluate(&self, expr: &ValueExpression, ctx: &Context) -> Result<Value> {
        let mut value = self.evaluate_expression(expr.initial(), ctx).await?;

        for invocation in expr.filters() {
            let filter = self.filters.get(invocation.name())?;

            let mut positional = Vec::new();
            let mut named: Option<Map<String, Value>> = None;
            for arg in invocation.args() {
                let arg_value = self.evaluate_expression(arg.expression(), ctx).await?;
                match arg.key() {
                    Some(key) => {
                        named.get_or_insert_with(Map::new).insert(key.to_string(), arg_value);
                    }
                    None => positional.push(arg_value),
                }
            }
            let args = FilterArgs::new(positional, named);

            tracing::trace!(filter = invocation.name(), "applying filter");
            let step = filter.apply(value, &args)?;
            value = self
                .settle(step, || format!("filter '{}'", invocation.name()))
                .await?;
        }

        Ok(value)
    }

    /// Evaluates a single literal, path or range.
    pub fn evaluate_expression<'a>(
        &'a self,
        expr: &'a Expression,
        ctx: &'a Context,
    ) -> BoxFuture<'a, Result<Value>> {
        Box::pin(async move {
            match expr.kind() {
                ExpressionKind::Literal(value) => Ok(value.clone()),
                ExpressionKind::Path(segments) => self.lookup(expr, segments, ctx).await,
                ExpressionKind::Range(start, end) => {
                    let start = range_bound(&self.evaluate_expression(start, ctx).await?);
                    let end = range_bound(&self.evaluate_expression(end, ctx).await?);
                    range_items(start, end)
                }
            }
        })
    }

    async fn lookup(&self, expr: &Expression, segments: &[PathSegment], ctx: &Context) -> Result<Value> {
        let Some((first, rest)) = segments.split_first() else {
            return Ok(Value::Null);
        };
        let name = match first {
            PathSegment::Key(name) => name.clone(),
            PathSegment::Index(index) => index.to_string(),
            PathSegment::Dynamic(inner) => {
                crate::value::to_output(&self.evaluate_expression(inner, ctx).await?)
            }
        };

        let mut current = match ctx.find(&name) {
            Some(value) => value.clone(),
            None => match ctx.fetch(&name) {
                Some(step) => self.settle(step, || format!("variable '{}'", name)).await?,
                None if ctx.strict_variables() => {
                    return Err(QuillError::UndefinedVariable(expr.raw().to_string()))
                }
                None => Value::Null,
            },
        };

        for segment in rest {
            let key = match segment {
                PathSegment::Key(key) => Value::String(key.clone()),
                PathSegment::Index(index) => Value::from(*index),
                PathSegment::Dynamic(inner) => self.evaluate_expression(inner, ctx).await?,
            };
            current = property(&current, &key);
        }
        Ok(current)
    }
}

/// Upper limit on the number of items a range literal may produce.
pub const MAX_RANGE_LEN: u64 = 1_000_000;

fn range_items(start: i64, end: i64) -> Result<Value> {
    let len = (i128::from(end) - i128::from(start) + 1).max(0);
    if len > i128::from(MAX_RANGE_LEN) {
        return Err(QuillError::RangeTooLarge {
            start,
            end,
            limit: MAX_RANGE_LEN,
        });
    }
    Ok(Value::Array((start..=end).map(Value::from).collect()))
}

fn range_bound(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or_default(),
        Value::String(s) => s.trim().parse().unwrap_or_default(),
        _ => 0,
    }
}

/// Drives a future to completion in a single poll.
///
/// Used for synchronous mode: the evaluator never awaits a pending value in
/// that mode, so anything short of `Ready` means some step suspended anyway.
pub fn run_sync<T, F>(future: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    let mut future = pin!(future);
    let mut cx = TaskContext::from_waker(noop_waker_ref());
    match future.as_mut().poll(&mut cx) {
        Poll::Ready(result) => result,
        Poll::Pending => Err(QuillError::SynchronousModeViolation {
            at: "tag evaluation".to_string(),
        }),
    }
}

/// Renders `template` synchronously.
pub fn render_sync(filters: &FilterRegistry, template: &Template, ctx: &mut Context) -> Result<String> {
    let renderer = Renderer::new(filters, RenderMode::Sync);
    run_sync(renderer.render(template, ctx))
}

/// Renders `template`, awaiting pending values.
pub async fn render_async(filters: &FilterRegistry, template: &Template, ctx: &mut Context) -> Result<String> {
    Renderer::new(filters, RenderMode::Async).render(template, ctx).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Scope;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    fn scope(value: Value) -> Scope {
        match value {
            Value::Object(map) => map,
            _ => Scope::new(),
        }
    }

    fn eval_sync(filters: &FilterRegistry, text: &str, ctx: &Context) -> Result<Value> {
        let expr = ValueExpression::parse(text)?;
        let renderer = Renderer::new(filters, RenderMode::Sync);
        run_sync(renderer.evaluate(&expr, ctx))
    }

    #[test]
    fn chained_filters_see_the_previous_result() {
        let calls: Arc<Mutex<Vec<(String, Vec<Value>)>>> = Arc::default();
        let mut filters = FilterRegistry::new();

        let log = Arc::clone(&calls);
        filters.register("date", move |input: Value, args: &FilterArgs| {
            let mut call = vec![input];
            call.extend(args.to_values());
            log.lock().unwrap().push(("date".into(), call));
            Ok(Resolution::Settled(json!("y")))
        });
        let log = Arc::clone(&calls);
        filters.register("time", move |input: Value, args: &FilterArgs| {
            let mut call = vec![input];
            call.extend(args.to_values());
            log.lock().unwrap().push(("time".into(), call));
            Ok(Resolution::Settled(Value::Null))
        });

        let ctx = Context::new(scope(json!({ "foo": { "bar": "bar" } })));
        eval_sync(&filters, r#"foo.bar | date: "b" | time:2"#, &ctx).unwrap();

        let calls = calls.lock().unwrap();
        assert_eq!(calls[0], ("date".to_string(), vec![json!("bar"), json!("b")]));
        assert_eq!(calls[1], ("time".to_string(), vec![json!("y"), json!(2)]));
    }

    #[test]
    fn named_arguments_resolve_against_the_context() {
        let mut filters = FilterRegistry::new();
        filters.register("echo", |_: Value, args: &FilterArgs| {
            Ok(Resolution::Settled(Value::Array(args.to_values())))
        });
        let ctx = Context::new(scope(json!({ "a": "from-scope", "value2": 7 })));

        let v = eval_sync(&filters, "o | echo: a: a", &ctx).unwrap();
        assert_eq!(v, json!([{ "a": "from-scope" }]));

        let v = eval_sync(&filters, r#"o | echo: "test0", key1: "literal1", key2: value2"#, &ctx).unwrap();
        assert_eq!(v, json!(["test0", { "key1": "literal1", "key2": 7 }]));
    }

    #[test]
    fn unknown_filter_is_fatal() {
        let ctx = Context::new(Scope::new());
        let err = eval_sync(&FilterRegistry::new(), "x | nope", &ctx).unwrap_err();
        assert!(matches!(err, QuillError::UnknownFilter(name) if name == "nope"));
    }

    #[test]
    fn pending_filter_result_violates_sync_mode() {
        let mut filters = FilterRegistry::new();
        filters.register("later", |input: Value, _: &FilterArgs| {
            Ok(Resolution::pending(async move { Ok(input) }))
        });
        let ctx = Context::new(Scope::new());
        let err = eval_sync(&filters, "x | later", &ctx).unwrap_err();
        assert!(matches!(err, QuillError::SynchronousModeViolation { at } if at == "filter 'later'"));
    }

    #[test]
    fn pending_variable_violates_sync_mode() {
        let ctx = Context::new(Scope::new()).with_source(Arc::new(|_: &str| {
            Some(Resolution::pending(async { Ok(json!(1)) }))
        }));
        let err = eval_sync(&FilterRegistry::new(), "user.name", &ctx).unwrap_err();
        assert!(matches!(err, QuillError::SynchronousModeViolation { at } if at == "variable 'user'"));
    }

    #[test]
    fn strict_variables_reject_unknown_names() {
        let ctx = Context::new(Scope::new()).with_strict_variables(true);
        let err = eval_sync(&FilterRegistry::new(), "missing.path", &ctx).unwrap_err();
        assert!(matches!(err, QuillError::UndefinedVariable(name) if name == "missing.path"));
    }

    #[test]
    fn dynamic_segments_and_ranges() {
        let ctx = Context::new(scope(json!({ "k": "b", "m": { "b": 2 }, "n": 3 })));
        let filters = FilterRegistry::new();
        assert_eq!(eval_sync(&filters, "m[k]", &ctx).unwrap(), json!(2));
        assert_eq!(eval_sync(&filters, "(1..n)", &ctx).unwrap(), json!([1, 2, 3]));
    }

    #[test]
    fn oversized_range_is_rejected() {
        let ctx = Context::new(scope(json!({ "n": 10_000_000_000i64 })));
        let err = eval_sync(&FilterRegistry::new(), "(1..n)", &ctx).unwrap_err();
        assert!(matches!(err, QuillError::RangeTooLarge { end: 10_000_000_000, .. }));

        let ctx = Context::new(scope(json!({ "lo": i64::MIN, "hi": i64::MAX })));
        assert!(eval_sync(&FilterRegistry::new(), "(lo..hi)", &ctx).is_err());
        assert_eq!(eval_sync(&FilterRegistry::new(), "(hi..lo)", &ctx).unwrap(), json!([]));
    }

    #[test]
    fn single_poll_rejects_a_suspended_future() {
        let err = run_sync(async {
            futures_util::future::pending::<()>().await;
            Ok(())
        })
        .unwrap_err();
        assert!(matches!(err, QuillError::SynchronousModeViolation { .. }));
    }
}
