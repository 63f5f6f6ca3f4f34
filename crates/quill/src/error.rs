// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Error types for the quill template engine.
//!
//! This module defines [`QuillError`], the main error enum, and helper types
//! for rich error reporting with source context.
//!
//! # Error Categories
//!
//! - **Parse errors**: invalid template markup or a malformed filter chain
//! - **Evaluation errors**: unknown filters, filter failures, strict lookups
//! - **Mode errors**: a pending value observed while rendering synchronously
//! - **Resolution errors**: template source not found or unreadable
//!
//! None of these are retried by the engine. Every one aborts the render call
//! that raised it.

use std::fmt;
use thiserror::Error;

/// Source context for enhanced error messages.
///
/// Captures a snippet of template source around an error location,
/// enabling messages with line numbers and a caret under the column.
#[derive(Debug, Clone)]
pub struct SourceContext {
    /// All lines from the source text.
    pub lines: Vec<String>,
    /// The line number where the error occurred (1-indexed).
    pub error_line: usize,
    /// The column number where the error occurred (1-indexed).
    pub error_column: usize,
    /// First line number of the snippet (1-indexed).
    pub snippet_start: usize,
    /// Last line number of the snippet (1-indexed).
    pub snippet_end: usize,
}

impl SourceContext {
    /// Creates a source context from source text and error location.
    ///
    /// Captures 3 lines before and after the error line.
    pub fn from_source(source: &str, line: usize, column: usize) -> Self {
        let lines: Vec<String> = source.lines().map(|l| l.to_string()).collect();
        let snippet_start = line.saturating_sub(3).max(1);
        let snippet_end = (line + 3).min(lines.len());

        Self {
            lines,
            error_line: line,
            error_column: column,
            snippet_start,
            snippet_end,
        }
    }

    /// Builds a context for a byte offset into `source`.
    pub fn at_offset(source: &str, offset: usize) -> Self {
        let (line, column) = line_col(source, offset);
        Self::from_source(source, line, column)
    }

    /// Formats the source snippet with line numbers and error indicator.
    ///
    /// ```text
    ///    4 | <ul>
    ///    5 |   {{ item | upcase
    ///      |   ^
    ///    6 | </ul>
    /// ```
    pub fn format_snippet(&self) -> String {
        let mut result = String::new();

        for line_num in self.snippet_start..=self.snippet_end {
            if line_num > self.lines.len() {
                break;
            }

            let line = &self.lines[line_num - 1];
            result.push_str(&format!("{:4} | {}\n", line_num, line));

            if line_num == self.error_line {
                result.push_str(&format!(
                    "     | {}^\n",
                    " ".repeat(self.error_column.saturating_sub(1))
                ));
            }
        }

        result
    }
}

impl fmt::Display for SourceContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_snippet())
    }
}

/// Helper struct for displaying optional source context.
pub struct OptSourceContextDisplay<'a>(pub &'a Option<SourceContext>);

impl fmt::Display for OptSourceContextDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(ctx) => write!(f, "{}", ctx),
            None => Ok(()),
        }
    }
}

/// Helper trait for formatting optional source context.
pub trait AsDisplay<'a> {
    /// Wraps self for Display formatting.
    fn as_display(&'a self) -> OptSourceContextDisplay<'a>;
}

impl<'a> AsDisplay<'a> for Option<SourceContext> {
    fn as_display(&'a self) -> OptSourceContextDisplay<'a> {
        OptSourceContextDisplay(self)
    }
}

/// Converts a byte offset into a 1-indexed (line, column) pair.
pub fn line_col(source: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(source.len());
    let before = &source[..offset];
    let line = before.matches('\n').count() + 1;
    let column = match before.rfind('\n') {
        Some(nl) => before[nl + 1..].chars().count() + 1,
        None => before.chars().count() + 1,
    };
    (line, column)
}

/// The main error type for quill operations.
#[derive(Error, Debug)]
pub enum QuillError {
    /// A filter name or named-argument key is empty or ill-formed.
    #[error("Malformed filter expression '{expression}': {message}")]
    MalformedFilterExpression {
        /// The offending expression text.
        expression: String,
        /// What was wrong with it.
        message: String,
    },

    /// A filter was invoked that is not in the registry.
    #[error("Unknown filter: {0}")]
    UnknownFilter(String),

    /// A pending value was observed while rendering in synchronous mode.
    #[error("Synchronous render observed a pending value at {at}")]
    SynchronousModeViolation {
        /// The suspension point (variable lookup, filter, tag).
        at: String,
    },

    /// The source reader could not locate the requested template.
    #[error("Template not found: {0}")]
    SourceNotFound(String),

    /// Template markup could not be parsed.
    #[error("Parse error in {file:?}: {message} at line {line}, column {column}\n{}", source_context.as_display())]
    ParseError {
        /// Description of the parse error.
        message: String,
        /// Line number where the error occurred.
        line: usize,
        /// Column number where the error occurred.
        column: usize,
        /// The template name, if known.
        file: Option<String>,
        /// Source context for rich error display.
        source_context: Option<SourceContext>,
    },

    /// A variable lookup failed while `strict_variables` is enabled.
    #[error("Undefined variable: {0}")]
    UndefinedVariable(String),

    /// A filter rejected its input or arguments.
    #[error("Filter '{filter}' failed: {message}")]
    FilterError {
        /// The filter name.
        filter: String,
        /// Error message.
        message: String,
    },

    /// A range literal would produce more items than allowed.
    #[error("Range ({start}..{end}) exceeds {limit} items")]
    RangeTooLarge {
        /// Evaluated lower bound.
        start: i64,
        /// Evaluated upper bound.
        end: i64,
        /// The maximum number of items.
        limit: u64,
    },

    /// File I/O error other than a missing template.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Render data or engine options could not be converted.
    #[error("Invalid option: {0}")]
    InvalidOption(String),
}

impl QuillError {
    /// Builds a [`QuillError::MalformedFilterExpression`].
    pub fn malformed(expression: &str, message: impl Into<String>) -> Self {
        QuillError::MalformedFilterExpression {
            expression: expression.trim().to_string(),
            message: message.into(),
        }
    }

    /// Builds a [`QuillError::FilterError`].
    pub fn filter(filter: &str, message: impl Into<String>) -> Self {
        QuillError::FilterError {
            filter: filter.to_string(),
            message: message.into(),
        }
    }

    /// Builds a [`QuillError::ParseError`] pointing at `offset` in `source`.
    pub fn parse_at(source: &str, offset: usize, message: impl Into<String>) -> Self {
        let (line, column) = line_col(source, offset);
        QuillError::ParseError {
            message: message.into(),
            line,
            column,
            file: None,
            source_context: Some(SourceContext::from_source(source, line, column)),
        }
    }

    /// Attaches a template name to a parse error. Other variants pass through.
    pub fn in_file(self, name: &str) -> Self {
        match self {
            QuillError::ParseError {
                message,
                line,
                column,
                source_context,
                ..
            } => QuillError::ParseError {
                message,
                line,
                column,
                file: Some(name.to_string()),
                source_context,
            },
            other => other,
        }
    }
}

impl From<serde_json::Error> for QuillError {
    fn from(err: serde_json::Error) -> Self {
        QuillError::InvalidOption(err.to_string())
    }
}

/// Convenience type alias for Results with [`QuillError`].
pub type Result<T> = std::result::Result<T, QuillError>;
