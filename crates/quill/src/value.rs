// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Value expressions and value helpers.
//!
//! A [`ValueExpression`] is an initial expression followed by a chain of
//! filters: `user.name | prepend: "Dear " | upcase`. It is parsed once at
//! compile time and re-evaluated on every render.

use crate::error::{QuillError, Result};
use crate::expression::Expression;
use crate::filter::FilterInvocation;
use crate::token::Scanner;
use serde_json::Value;

/// An initial value piped through zero or more filters.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueExpression {
    initial: Expression,
    filters: Vec<FilterInvocation>,
}

impl ValueExpression {
    /// Parses `initial | filter: args | filter ...`.
    ///
    /// Anything between the initial value and the first top-level `|` is
    /// ignored, so `foo,foo | add` starts from `foo`.
    pub fn parse(text: &str) -> Result<Self> {
        let mut scanner = Scanner::new(text);
        scanner.skip_whitespace();
        let token = scanner
            .read_value()?
            .ok_or_else(|| QuillError::malformed(text, "missing initial value"))?;
        let initial = Expression::from_token(&token)?;

        let mut filters = Vec::new();
        scanner.skip_to(&['|'])?;
        while scanner.eat('|') {
            let start = scanner.pos();
            scanner.skip_to(&['|'])?;
            let span = &text[start..scanner.pos()];
            filters.push(FilterInvocation::parse(span)?);
        }

        Ok(Self { initial, filters })
    }

    /// The initial expression.
    pub fn initial(&self) -> &Expression {
        &self.initial
    }

    /// Filters in application order.
    pub fn filters(&self) -> &[FilterInvocation] {
        &self.filters
    }
}

/// Liquid truthiness: only `nil` and `false` are falsy.
pub fn is_truthy(value: &Value) -> bool {
    !matches!(value, Value::Null | Value::Bool(false))
}

/// Renders a value as output text.
pub fn to_output(value: &Value) -> String {
    let mut out = String::new();
    write_output(&mut out, value);
    out
}

/// Appends the output text of `value` to `out`.
pub fn write_output(out: &mut String, value: &Value) {
    match value {
        Value::Null => {}
        Value::String(s) => out.push_str(s),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::Array(items) => items.iter().for_each(|item| write_output(out, item)),
        Value::Object(_) => out.push_str(&value.to_string()),
    }
}

/// Reads one property of a value. Missing properties are nil.
///
/// Arrays and strings answer `size`; arrays also answer `first` and
/// `last`. Negative array indices count from the end.
pub fn property(value: &Value, key: &Value) -> Value {
    match (value, key) {
        (Value::Object(map), Value::String(k)) => match map.get(k) {
            Some(v) => v.clone(),
            None if k == "size" => Value::from(map.len()),
            None => Value::Null,
        },
        (Value::Array(items), Value::Number(n)) => n
            .as_i64()
            .and_then(|i| {
                let idx = if i < 0 { items.len() as i64 + i } else { i };
                usize::try_from(idx).ok()
            })
            .and_then(|i| items.get(i).cloned())
            .unwrap_or(Value::Null),
        (Value::Array(items), Value::String(k)) => match k.as_str() {
            "size" => Value::from(items.len()),
            "first" => items.first().cloned().unwrap_or(Value::Null),
            "last" => items.last().cloned().unwrap_or(Value::Null),
            _ => Value::Null,
        },
        (Value::String(s), Value::String(k)) if k == "size" => Value::from(s.chars().count()),
        _ => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_bare_value() {
        let v = ValueExpression::parse("foo").unwrap();
        assert_eq!(v.initial().raw(), "foo");
        assert!(v.filters().is_empty());
    }

    #[test]
    fn comma_joined_alternates_are_ignored() {
        let v = ValueExpression::parse("foo,foo | add").unwrap();
        assert_eq!(v.initial().raw(), "foo");
        assert_eq!(v.filters().len(), 1);
        assert!(v.filters()[0].args().is_empty());
    }

    #[test]
    fn pipe_inside_quotes_does_not_split() {
        let v = ValueExpression::parse(r#"foo | add: "|", 3"#).unwrap();
        assert_eq!(v.filters().len(), 1);
        let args: Vec<_> = v.filters()[0].args().iter().map(|a| a.expression().raw()).collect();
        assert_eq!(args, vec!["\"|\"", "3"]);
    }

    #[test]
    fn chains_keep_order() {
        let v = ValueExpression::parse(r#"foo.bar | date: "b" | time:2"#).unwrap();
        let names: Vec<_> = v.filters().iter().map(|f| f.name()).collect();
        assert_eq!(names, vec!["date", "time"]);
    }

    #[test]
    fn parsing_is_idempotent() {
        let text = r#"o | foo: "test0", key1: "literal1", key2: value2 | bar"#;
        assert_eq!(ValueExpression::parse(text).unwrap(), ValueExpression::parse(text).unwrap());
    }

    #[test]
    fn empty_filter_segment_is_malformed() {
        assert!(matches!(
            ValueExpression::parse("foo | | upcase"),
            Err(QuillError::MalformedFilterExpression { .. })
        ));
    }

    #[test]
    fn output_text() {
        assert_eq!(to_output(&Value::Null), "");
        assert_eq!(to_output(&json!(["a", 1, null, true])), "a1true");
        assert_eq!(to_output(&json!(2.5)), "2.5");
        assert_eq!(to_output(&json!({ "k": 1 })), r#"{"k":1}"#);
    }

    #[test]
    fn property_access() {
        let list = json!([1, 2, 3]);
        assert_eq!(property(&list, &json!(-1)), json!(3));
        assert_eq!(property(&list, &json!("size")), json!(3));
        assert_eq!(property(&list, &json!("first")), json!(1));
        assert_eq!(property(&json!("héllo"), &json!("size")), json!(5));
        assert_eq!(property(&json!({ "size": "L" }), &json!("size")), json!("L"));
        assert_eq!(property(&json!(1), &json!("x")), Value::Null);
    }

    #[test]
    fn truthiness() {
        assert!(is_truthy(&json!(0)));
        assert!(is_truthy(&json!("")));
        assert!(!is_truthy(&json!(false)));
        assert!(!is_truthy(&Value::Null));
    }
}
