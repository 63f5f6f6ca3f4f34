// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

use crate::error::{QuillError, Result};
use crate::resolver::{with_extname, SourceReader};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Memory-based source reader that stores templates in memory.
///
/// Clones share the same storage, so templates can be added or changed
/// after the reader has been handed to an engine.
#[derive(Debug, Clone, Default)]
pub struct MemoryResourceResolver {
    templates: Arc<Mutex<HashMap<String, String>>>,
    extname: String,
}

impl MemoryResourceResolver {
    /// Create a new memory resource resolver
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the extension appended to names that have none.
    pub fn with_extname(mut self, extname: impl Into<String>) -> Self {
        self.extname = extname.into();
        self
    }

    fn with_templates_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut HashMap<String, String>) -> R,
    {
        match self.templates.lock() {
            Ok(mut templates) => f(&mut templates),
            Err(poisoned) => f(&mut poisoned.into_inner()),
        }
    }

    /// Add or replace a template
    pub fn add_template(&self, path: &str, content: impl Into<String>) {
        let key = self.normalize(path);
        self.with_templates_mut(|templates| {
            templates.insert(key, content.into());
        });
    }

    /// Remove a template
    pub fn remove_template(&self, path: &str) {
        let key = self.normalize(path);
        self.with_templates_mut(|templates| {
            templates.remove(&key);
        });
    }

    /// Clear all templates
    pub fn clear(&self) {
        self.with_templates_mut(HashMap::clear);
    }

    /// `./a//b` and `/a/b` both become `a/b`, plus the extension if missing.
    fn normalize(&self, path: &str) -> String {
        let mut parts: Vec<&str> = Vec::new();
        for part in path.split('/') {
            match part {
                "" | "." => {}
                ".." => {
                    parts.pop();
                }
                other => parts.push(other),
            }
        }
        with_extname(&parts.join("/"), &self.extname)
    }
}

impl SourceReader for MemoryResourceResolver {
    fn candidates(&self, name: &str) -> Vec<String> {
        vec![self.normalize(name)]
    }

    fn read(&self, key: &str) -> Result<String> {
        self.with_templates_mut(|templates| templates.get(key).cloned())
            .ok_or_else(|| QuillError::SourceNotFound(key.to_string()))
    }
}
