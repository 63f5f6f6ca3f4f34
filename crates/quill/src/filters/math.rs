// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Integer operands stay integers; anything else is computed as `f64`.
//! Numeric strings are accepted, other values count as 0.

use super::settled;
use crate::error::{QuillError, Result};
use crate::filter::FilterArgs;
use crate::resolution::Resolution;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    fn from_value(value: &Value) -> Number {
        match value {
            Value::Number(n) => match n.as_i64() {
                Some(i) => Number::Int(i),
                None => Number::Float(n.as_f64().unwrap_or_default()),
            },
            Value::String(s) => {
                let s = s.trim();
                s.parse::<i64>()
                    .map(Number::Int)
                    .or_else(|_| s.parse::<f64>().map(Number::Float))
                    .unwrap_or(Number::Int(0))
            }
            Value::Bool(true) => Number::Int(1),
            _ => Number::Int(0),
        }
    }

    fn as_f64(self) -> f64 {
        match self {
            Number::Int(i) => i as f64,
            Number::Float(f) => f,
        }
    }

    fn into_value(self) -> Value {
        match self {
            Number::Int(i) => Value::from(i),
            Number::Float(f) => serde_json::Number::from_f64(f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
        }
    }
}

fn operand(filter: &str, args: &FilterArgs) -> Result<Number> {
    args.get(0)
        .map(Number::from_value)
        .ok_or_else(|| QuillError::filter(filter, "missing operand"))
}

fn arithmetic(
    filter: &str,
    input: &Value,
    args: &FilterArgs,
    int: fn(i64, i64) -> Option<i64>,
    float: fn(f64, f64) -> f64,
) -> Result<Resolution> {
    let lhs = Number::from_value(input);
    let rhs = operand(filter, args)?;
    let result = match (lhs, rhs) {
        (Number::Int(a), Number::Int(b)) => int(a, b)
            .map(Number::Int)
            .ok_or_else(|| QuillError::filter(filter, "integer overflow"))?,
        (a, b) => Number::Float(float(a.as_f64(), b.as_f64())),
    };
    settled(result.into_value())
}

/// `plus: n`
pub fn plus(input: Value, args: &FilterArgs) -> Result<Resolution> {
    arithmetic("plus", &input, args, i64::checked_add, |a, b| a + b)
}

/// `minus: n`
pub fn minus(input: Value, args: &FilterArgs) -> Result<Resolution> {
    arithmetic("minus", &input, args, i64::checked_sub, |a, b| a - b)
}

/// `times: n`
pub fn times(input: Value, args: &FilterArgs) -> Result<Resolution> {
    arithmetic("times", &input, args, i64::checked_mul, |a, b| a * b)
}

/// `divided_by: n`. Integer division floors; dividing by zero is an error.
pub fn divided_by(input: Value, args: &FilterArgs) -> Result<Resolution> {
    if operand("divided_by", args)?.as_f64() == 0.0 {
        return Err(QuillError::filter("divided_by", "division by zero"));
    }
    arithmetic("divided_by", &input, args, floor_div, |a, b| a / b)
}

fn floor_div(a: i64, b: i64) -> Option<i64> {
    let quotient = a.checked_div(b)?;
    if a % b != 0 && (a < 0) != (b < 0) {
        Some(quotient - 1)
    } else {
        Some(quotient)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn call(f: fn(Value, &FilterArgs) -> Result<Resolution>, input: Value, arg: Value) -> Result<Value> {
        match f(input, &FilterArgs::new(vec![arg], None))? {
            Resolution::Settled(v) => Ok(v),
            Resolution::Pending(_) => unreachable!(),
        }
    }

    #[test]
    fn integers_stay_integers() {
        assert_eq!(call(plus, json!(1), json!(2)).unwrap(), json!(3));
        assert_eq!(call(minus, json!("5"), json!(2)).unwrap(), json!(3));
        assert_eq!(call(times, json!(4), json!(-2)).unwrap(), json!(-8));
        assert_eq!(call(divided_by, json!(7), json!(2)).unwrap(), json!(3));
        assert_eq!(call(divided_by, json!(7), json!(-2)).unwrap(), json!(-4));
    }

    #[test]
    fn floats_propagate() {
        assert_eq!(call(plus, json!(1.5), json!(1)).unwrap(), json!(2.5));
        assert_eq!(call(divided_by, json!(7), json!(2.0)).unwrap(), json!(3.5));
    }

    #[test]
    fn division_by_zero_fails() {
        let err = call(divided_by, json!(1), json!(0)).unwrap_err();
        assert!(matches!(err, QuillError::FilterError { filter, .. } if filter == "divided_by"));
    }
}
