// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Settled-or-pending results of evaluation steps.
//!
//! Every step that may suspend (a deferred variable, a filter result, a
//! tag's own work) hands back a [`Resolution`]. The renderer decides what a
//! [`Resolution::Pending`] means based on the [`RenderMode`]: awaited in
//! [`RenderMode::Async`], rejected in [`RenderMode::Sync`].

use crate::error::Result;
use futures_util::future::BoxFuture;
use serde_json::Value;
use std::fmt;
use std::future::Future;

/// A value that is not available yet.
pub type PendingValue = BoxFuture<'static, Result<Value>>;

/// The outcome of one evaluation step.
pub enum Resolution {
    /// The value is available now.
    Settled(Value),
    /// The value must be awaited.
    Pending(PendingValue),
}

impl Resolution {
    /// Wraps a future as a pending resolution.
    pub fn pending<F>(future: F) -> Self
    where
        F: Future<Output = Result<Value>> + Send + 'static,
    {
        Resolution::Pending(Box::pin(future))
    }

    /// True if the value still has to be awaited.
    pub fn is_pending(&self) -> bool {
        matches!(self, Resolution::Pending(_))
    }
}

impl From<Value> for Resolution {
    fn from(value: Value) -> Self {
        Resolution::Settled(value)
    }
}

impl fmt::Debug for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolution::Settled(v) => f.debug_tuple("Settled").field(v).finish(),
            Resolution::Pending(_) => f.write_str("Pending(..)"),
        }
    }
}

/// How pending values are treated during a render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// Pending values are a [`SynchronousModeViolation`](crate::QuillError::SynchronousModeViolation).
    Sync,
    /// Pending values are awaited in place.
    Async,
}
