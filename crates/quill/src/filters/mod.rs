// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Built-in filters.
//!
//! All built-ins are synchronous: they return [`Resolution::Settled`].

/// Array filters.
pub mod array;
/// Arithmetic filters.
pub mod math;
/// String filters.
pub mod string;

use crate::error::{QuillError, Result};
use crate::filter::{FilterArgs, FilterRegistry};
use crate::resolution::Resolution;
use crate::value::to_output;
use serde_json::Value;

/// Registers every built-in filter in `registry`.
pub fn register_builtins(registry: &mut FilterRegistry) {
    registry.register("upcase", string::upcase);
    registry.register("downcase", string::downcase);
    registry.register("capitalize", string::capitalize);
    registry.register("append", string::append);
    registry.register("prepend", string::prepend);
    registry.register("strip", string::strip);
    registry.register("replace", string::replace);
    registry.register("split", string::split);
    registry.register("default", default);

    registry.register("size", array::size);
    registry.register("join", array::join);
    registry.register("first", array::first);
    registry.register("last", array::last);
    registry.register("reverse", array::reverse);

    registry.register("plus", math::plus);
    registry.register("minus", math::minus);
    registry.register("times", math::times);
    registry.register("divided_by", math::divided_by);
}

pub(crate) fn settled(value: Value) -> Result<Resolution> {
    Ok(Resolution::Settled(value))
}

/// Positional argument `index` as text, failing when it is absent.
pub(crate) fn string_arg(filter: &str, args: &FilterArgs, index: usize) -> Result<String> {
    args.get(index)
        .map(to_output)
        .ok_or_else(|| QuillError::filter(filter, format!("missing argument {}", index + 1)))
}

/// `default: fallback` replaces nil, false, `""` and `[]`.
///
/// With `allow_false: true`, `false` is kept.
pub fn default(input: Value, args: &FilterArgs) -> Result<Resolution> {
    let allow_false = args.named("allow_false").is_some_and(crate::value::is_truthy);
    let empty = match &input {
        Value::Null => true,
        Value::Bool(false) => !allow_false,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    };
    if empty {
        settled(args.get(0).cloned().unwrap_or(Value::Null))
    } else {
        settled(input)
    }
}
