// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

use super::{settled, string_arg};
use crate::error::Result;
use crate::filter::FilterArgs;
use crate::resolution::Resolution;
use crate::value::to_output;
use serde_json::Value;

/// `upcase`
pub fn upcase(input: Value, _args: &FilterArgs) -> Result<Resolution> {
    settled(Value::String(to_output(&input).to_uppercase()))
}

/// `downcase`
pub fn downcase(input: Value, _args: &FilterArgs) -> Result<Resolution> {
    settled(Value::String(to_output(&input).to_lowercase()))
}

/// `capitalize`: first character upper-cased, the rest lower-cased.
pub fn capitalize(input: Value, _args: &FilterArgs) -> Result<Resolution> {
    let text = to_output(&input);
    let mut chars = text.chars();
    let capitalized = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.as_str().to_lowercase().chars()).collect(),
        None => String::new(),
    };
    settled(Value::String(capitalized))
}

/// `append: suffix`
pub fn append(input: Value, args: &FilterArgs) -> Result<Resolution> {
    let suffix = string_arg("append", args, 0)?;
    settled(Value::String(to_output(&input) + &suffix))
}

/// `prepend: prefix`
pub fn prepend(input: Value, args: &FilterArgs) -> Result<Resolution> {
    let prefix = string_arg("prepend", args, 0)?;
    settled(Value::String(prefix + &to_output(&input)))
}

/// `strip`
pub fn strip(input: Value, _args: &FilterArgs) -> Result<Resolution> {
    settled(Value::String(to_output(&input).trim().to_string()))
}

/// `replace: from, to`. Every occurrence is replaced.
pub fn replace(input: Value, args: &FilterArgs) -> Result<Resolution> {
    let from = string_arg("replace", args, 0)?;
    let to = args.get(1).map(to_output).unwrap_or_default();
    settled(Value::String(to_output(&input).replace(&from, &to)))
}

/// `split: separator`. An empty separator splits into characters.
pub fn split(input: Value, args: &FilterArgs) -> Result<Resolution> {
    let separator = string_arg("split", args, 0)?;
    let text = to_output(&input);
    let parts: Vec<Value> = if separator.is_empty() {
        text.chars().map(|c| Value::String(c.to_string())).collect()
    } else {
        text.split(separator.as_str())
            .map(|part| Value::String(part.to_string()))
            .collect()
    };
    settled(Value::Array(parts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QuillError;
    use serde_json::json;

    fn call(f: fn(Value, &FilterArgs) -> Result<Resolution>, input: Value, args: Vec<Value>) -> Result<Value> {
        match f(input, &FilterArgs::new(args, None))? {
            Resolution::Settled(v) => Ok(v),
            Resolution::Pending(_) => unreachable!(),
        }
    }

    #[test]
    fn case_filters() {
        assert_eq!(call(upcase, json!("abc"), vec![]).unwrap(), json!("ABC"));
        assert_eq!(call(downcase, json!("AbC"), vec![]).unwrap(), json!("abc"));
        assert_eq!(call(capitalize, json!("hELLO world"), vec![]).unwrap(), json!("Hello world"));
        assert_eq!(call(capitalize, json!(""), vec![]).unwrap(), json!(""));
    }

    #[test]
    fn append_and_prepend() {
        assert_eq!(call(append, json!("a"), vec![json!(1)]).unwrap(), json!("a1"));
        assert_eq!(call(prepend, json!("a"), vec![json!("b")]).unwrap(), json!("ba"));
        assert!(matches!(
            call(append, json!("a"), vec![]),
            Err(QuillError::FilterError { filter, .. }) if filter == "append"
        ));
    }

    #[test]
    fn replace_and_split() {
        assert_eq!(call(replace, json!("a-b-c"), vec![json!("-"), json!("+")]).unwrap(), json!("a+b+c"));
        assert_eq!(call(split, json!("a,b"), vec![json!(",")]).unwrap(), json!(["a", "b"]));
        assert_eq!(call(split, json!("ab"), vec![json!("")]).unwrap(), json!(["a", "b"]));
        assert_eq!(call(strip, json!("  x \n"), vec![]).unwrap(), json!("x"));
    }
}
