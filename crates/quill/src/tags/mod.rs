// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Built-in tags.

/// `assign` and `capture`.
pub mod assign;
/// `if` and `unless`.
pub mod conditional;
/// `for`.
pub mod for_loop;
/// `comment` and `raw`.
pub mod literal;

use crate::parser::TagRegistry;

pub use assign::{AssignTag, CaptureTag};
pub use conditional::IfTag;
pub use for_loop::ForTag;
pub use literal::LiteralTag;

/// Registers every built-in tag in `registry`.
pub fn register_builtins(registry: &mut TagRegistry) {
    registry.register("assign", assign::AssignParser);
    registry.register("capture", assign::CaptureParser);
    registry.register("if", conditional::IfParser { negate: false });
    registry.register("unless", conditional::IfParser { negate: true });
    registry.register("for", for_loop::ForParser);
    registry.register("comment", literal::CommentParser);
    registry.register("raw", literal::RawParser);
}
