// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

use super::settled;
use crate::error::Result;
use crate::filter::FilterArgs;
use crate::resolution::Resolution;
use crate::value::{property, to_output};
use serde_json::Value;

/// `size`: length of an array, string or object; 0 otherwise.
pub fn size(input: Value, _args: &FilterArgs) -> Result<Resolution> {
    let size = match &input {
        Value::Array(_) | Value::String(_) | Value::Object(_) => property(&input, &Value::from("size")),
        _ => Value::from(0),
    };
    settled(size)
}

/// `join: separator`. The separator defaults to a single space.
pub fn join(input: Value, args: &FilterArgs) -> Result<Resolution> {
    let separator = args.get(0).map(to_output).unwrap_or_else(|| " ".to_string());
    let joined = match &input {
        Value::Array(items) => items.iter().map(to_output).collect::<Vec<_>>().join(&separator),
        other => to_output(other),
    };
    settled(Value::String(joined))
}

/// `first`
pub fn first(input: Value, _args: &FilterArgs) -> Result<Resolution> {
    settled(property(&input, &Value::from("first")))
}

/// `last`
pub fn last(input: Value, _args: &FilterArgs) -> Result<Resolution> {
    settled(property(&input, &Value::from("last")))
}

/// `reverse`. Non-arrays pass through unchanged.
pub fn reverse(input: Value, _args: &FilterArgs) -> Result<Resolution> {
    match input {
        Value::Array(mut items) => {
            items.reverse();
            settled(Value::Array(items))
        }
        other => settled(other),
    }
}
