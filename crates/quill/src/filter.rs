// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Filter invocations and the filter registry.
//!
//! # Grammar
//!
//! ```text
//! filter   := name [ (':' | ',') argument (',' argument)* ]
//! argument := [ identifier ':' ] value
//! ```
//!
//! A span that starts with `identifier :` is a named argument; everything
//! else is positional. Positional and named arguments may be mixed and keep
//! their source order. Text between a value and the next top-level comma is
//! skipped, so `add: "foo" bar, 3` has two arguments.
//!
//! At call time positional values are passed in order and named values are
//! collected into one trailing mapping, see [`FilterArgs`].

use crate::error::{QuillError, Result};
use crate::expression::Expression;
use crate::resolution::Resolution;
use crate::token::Scanner;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// One argument of a filter call.
#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    /// `value`
    Positional(Expression),
    /// `key: value`
    Named(String, Expression),
}

impl Argument {
    /// The value expression, whatever the argument kind.
    pub fn expression(&self) -> &Expression {
        match self {
            Argument::Positional(expr) | Argument::Named(_, expr) => expr,
        }
    }

    /// The key of a named argument.
    pub fn key(&self) -> Option<&str> {
        match self {
            Argument::Named(key, _) => Some(key),
            Argument::Positional(_) => None,
        }
    }
}

/// A parsed `name: args` segment of a value expression.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterInvocation {
    name: String,
    args: Vec<Argument>,
}

impl FilterInvocation {
    /// Parses the text that follows a `|`.
    pub fn parse(text: &str) -> Result<Self> {
        let mut scanner = Scanner::new(text);
        scanner.skip_whitespace();
        let name = scanner
            .read_identifier()
            .ok_or_else(|| QuillError::malformed(text, "missing filter name"))?
            .to_string();

        let mut args = Vec::new();
        scanner.skip_whitespace();
        if scanner.is_eof() {
            return Ok(Self { name, args });
        }
        if !scanner.eat(':') && !scanner.eat(',') {
            return Err(QuillError::malformed(
                text,
                format!("expected ':' after filter name '{}'", name),
            ));
        }

        loop {
            scanner.skip_whitespace();
            match scanner.peek() {
                None => break,
                Some(':') => return Err(QuillError::malformed(text, "named argument with empty key")),
                Some(',') => return Err(QuillError::malformed(text, "empty argument")),
                _ => {}
            }

            let key = read_key(&mut scanner);
            scanner.skip_whitespace();
            let token = match scanner.read_value()? {
                Some(token) => token,
                None => {
                    let message = match &key {
                        Some(k) => format!("named argument '{}' has no value", k),
                        None => format!("unexpected '{}'", scanner.rest().trim()),
                    };
                    return Err(QuillError::malformed(text, message));
                }
            };
            let expr = Expression::from_token(&token)?;
            args.push(match key {
                Some(key) => Argument::Named(key, expr),
                None => Argument::Positional(expr),
            });

            if scanner.skip_to(&[','])?.is_none() {
                break;
            }
            scanner.eat(',');
        }

        Ok(Self { name, args })
    }

    /// Filter name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Arguments in source order.
    pub fn args(&self) -> &[Argument] {
        &self.args
    }
}

/// Consumes `identifier :` and returns the identifier, or consumes nothing.
fn read_key(scanner: &mut Scanner<'_>) -> Option<String> {
    let start = scanner.pos();
    if let Some(ident) = scanner.read_identifier() {
        scanner.skip_whitespace();
        if scanner.eat(':') {
            return Some(ident.to_string());
        }
    }
    scanner.reset(start);
    None
}

/// Evaluated arguments handed to a [`Filter`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterArgs {
    positional: Vec<Value>,
    named: Option<Map<String, Value>>,
}

impl FilterArgs {
    /// Builds arguments from evaluated values.
    pub fn new(positional: Vec<Value>, named: Option<Map<String, Value>>) -> Self {
        Self { positional, named }
    }

    /// Positional argument `index`.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.positional.get(index)
    }

    /// All positional arguments.
    pub fn positional(&self) -> &[Value] {
        &self.positional
    }

    /// Named argument `key`.
    pub fn named(&self, key: &str) -> Option<&Value> {
        self.named.as_ref().and_then(|named| named.get(key))
    }

    /// The trailing mapping of named arguments, if any were given.
    pub fn named_map(&self) -> Option<&Map<String, Value>> {
        self.named.as_ref()
    }

    /// Flattens to `[...positional, named?]`, the call shape of the filter.
    pub fn to_values(&self) -> Vec<Value> {
        let mut values = self.positional.clone();
        if let Some(named) = &self.named {
            values.push(Value::Object(named.clone()));
        }
        values
    }
}

/// A registered transformation applied to a value.
///
/// Returning [`Resolution::Pending`] makes the call a suspension point.
pub trait Filter: Send + Sync {
    /// Applies the filter to `input`.
    fn apply(&self, input: Value, args: &FilterArgs) -> Result<Resolution>;
}

impl<F> Filter for F
where
    F: Fn(Value, &FilterArgs) -> Result<Resolution> + Send + Sync,
{
    fn apply(&self, input: Value, args: &FilterArgs) -> Result<Resolution> {
        self(input, args)
    }
}

/// Name-to-implementation mapping for filters.
#[derive(Clone, Default)]
pub struct FilterRegistry {
    filters: HashMap<String, Arc<dyn Filter>>,
}

impl FilterRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the built-in filters.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        crate::filters::register_builtins(&mut registry);
        registry
    }

    /// Registers `filter` under `name`, replacing any previous one.
    pub fn register(&mut self, name: impl Into<String>, filter: impl Filter + 'static) {
        self.filters.insert(name.into(), Arc::new(filter));
    }

    /// Looks up a filter by exact name.
    pub fn get(&self, name: &str) -> Result<&Arc<dyn Filter>> {
        self.filters
            .get(name)
            .ok_or_else(|| QuillError::UnknownFilter(name.to_string()))
    }

    /// True if `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.filters.contains_key(name)
    }
}

impl fmt::Debug for FilterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.filters.keys().collect();
        names.sort();
        f.debug_struct("FilterRegistry").field("filters", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(args: &[Argument]) -> Vec<(Option<&str>, &str)> {
        args.iter().map(|a| (a.key(), a.expression().raw())).collect()
    }

    #[test]
    fn bare_name_has_no_arguments() {
        let f = FilterInvocation::parse(" upcase ").unwrap();
        assert_eq!(f.name(), "upcase");
        assert!(f.args().is_empty());
    }

    #[test]
    fn positional_literals_keep_spelling() {
        let f = FilterInvocation::parse(r#"add: 3, "foo""#).unwrap();
        assert_eq!(raw(f.args()), vec![(None, "3"), (None, "\"foo\"")]);
    }

    #[test]
    fn separators_inside_quotes_are_literal() {
        let f = FilterInvocation::parse(r#"add: ",:|", 3"#).unwrap();
        assert_eq!(raw(f.args()), vec![(None, "\",:|\""), (None, "3")]);
    }

    #[test]
    fn junk_after_a_value_is_skipped() {
        let f = FilterInvocation::parse(r#"add: "foo" bar, 3"#).unwrap();
        assert_eq!(raw(f.args()), vec![(None, "\"foo\""), (None, "3")]);
    }

    #[test]
    fn named_and_positional_arguments_keep_order() {
        let f = FilterInvocation::parse(r#"foo: test0, key1: "literal1", key2: value2"#).unwrap();
        assert_eq!(
            raw(f.args()),
            vec![(None, "test0"), (Some("key1"), "\"literal1\""), (Some("key2"), "value2")]
        );
    }

    #[test]
    fn key_and_value_may_share_a_spelling() {
        let f = FilterInvocation::parse("foo: a: a").unwrap();
        assert_eq!(f.args().len(), 1);
        assert_eq!(f.args()[0].key(), Some("a"));
        assert!(f.args()[0].expression().is_identifier("a"));

        let f = FilterInvocation::parse(r#"foo: a: "a""#).unwrap();
        assert_eq!(f.args()[0].key(), Some("a"));
        assert_eq!(f.args()[0].expression().as_literal(), Some(&Value::from("a")));
    }

    #[test]
    fn empty_name_is_malformed() {
        let err = FilterInvocation::parse("  : 3").unwrap_err();
        assert!(matches!(err, QuillError::MalformedFilterExpression { .. }));
    }

    #[test]
    fn empty_key_is_malformed() {
        let err = FilterInvocation::parse("foo: : 3").unwrap_err();
        assert!(matches!(err, QuillError::MalformedFilterExpression { .. }));
    }

    #[test]
    fn named_argument_without_value_is_malformed() {
        let err = FilterInvocation::parse("foo: key:").unwrap_err();
        assert!(err.to_string().contains("'key' has no value"));
    }

    #[test]
    fn named_arguments_trail_the_call_values() {
        let mut named = Map::new();
        named.insert("k".into(), Value::from(1));
        let args = FilterArgs::new(vec![Value::from("a")], Some(named));
        assert_eq!(args.to_values(), vec![Value::from("a"), serde_json::json!({ "k": 1 })]);
        assert_eq!(args.named("k"), Some(&Value::from(1)));
    }

    #[test]
    fn unknown_filter_lookup_fails() {
        let registry = FilterRegistry::new();
        assert!(matches!(registry.get("nope"), Err(QuillError::UnknownFilter(name)) if name == "nope"));
    }
}
