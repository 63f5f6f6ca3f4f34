// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Compiled template caching.
//!
//! The engine keeps one cache per instance, keyed by the source identities
//! listed by [`SourceReader::candidates`](crate::SourceReader::candidates).
//!
//! # Cache Implementations
//!
//! - [`MemoryCache`]: In-memory LRU cache, bounded or unbounded
//! - [`NoOpCache`]: Never stores anything (caching disabled)
//!
//! # Custom Caches
//!
//! Implement the [`TemplateCache`] trait and pass it as
//! [`CacheOption::Custom`]. Whatever `has` and `read` return is taken as
//! is; the engine adds no eviction of its own.
//!
//! Caches never fail. A cache that cannot answer reports a miss.

use crate::ast::Template;
use lru::LruCache;
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

/// Storage for compiled templates.
pub trait TemplateCache: Send + Sync + fmt::Debug {
    /// True if `key` has an entry.
    fn has(&self, key: &str) -> bool;
    /// Retrieves the entry for `key`.
    fn read(&self, key: &str) -> Option<Arc<Template>>;
    /// Stores `template` under `key`.
    fn write(&self, key: &str, template: Arc<Template>);
}

/// In-memory LRU (Least Recently Used) cache.
///
/// A read promotes the entry to most recently used. When a bounded cache
/// is full, writing a new key evicts the least recently used entry first.
///
/// # Examples
///
/// ```rust,ignore
/// use quill::MemoryCache;
///
/// // Keep at most 100 compiled templates
/// let cache = MemoryCache::new(100);
/// ```
#[derive(Debug, Clone)]
pub struct MemoryCache {
    cache: Arc<Mutex<LruCache<String, Arc<Template>>>>,
}

impl MemoryCache {
    /// Creates a cache holding at most `capacity` templates (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self::from_lru(LruCache::new(capacity))
    }

    /// Creates a cache that never evicts.
    pub fn unbounded() -> Self {
        Self::from_lru(LruCache::unbounded())
    }

    fn from_lru(lru: LruCache<String, Arc<Template>>) -> Self {
        Self {
            cache: Arc::new(Mutex::new(lru)),
        }
    }

    /// Number of stored templates.
    pub fn len(&self) -> usize {
        self.cache.lock().map(|cache| cache.len()).unwrap_or(0)
    }

    /// True if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes every entry.
    pub fn clear(&self) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.clear();
        }
    }
}

impl TemplateCache for MemoryCache {
    fn has(&self, key: &str) -> bool {
        match self.cache.lock() {
            Ok(cache) => cache.contains(key),
            Err(_) => false,
        }
    }

    fn read(&self, key: &str) -> Option<Arc<Template>> {
        let mut cache = self.cache.lock().ok()?;
        cache.get(key).cloned()
    }

    fn write(&self, key: &str, template: Arc<Template>) {
        if let Ok(mut cache) = self.cache.lock() {
            if let Some((evicted, _)) = cache.push(key.to_string(), template) {
                if evicted != key {
                    tracing::debug!(key = %evicted, "evicted template from cache");
                }
            }
        }
    }
}

/// No-op cache that never stores or retrieves anything.
///
/// Every render recompiles from the source reader.
#[derive(Debug, Clone, Default)]
pub struct NoOpCache;

impl NoOpCache {
    /// Creates a new no-op cache.
    pub fn new() -> Self {
        Self
    }
}

impl TemplateCache for NoOpCache {
    fn has(&self, _key: &str) -> bool {
        false
    }

    fn read(&self, _key: &str) -> Option<Arc<Template>> {
        None
    }

    fn write(&self, _key: &str, _template: Arc<Template>) {}
}

/// The `cache` engine option.
///
/// Deserializes from `false` (disabled), `true` (unbounded) or an integer
/// (bounded LRU; zero or negative disables caching).
#[derive(Debug, Clone, Default)]
pub enum CacheOption {
    /// Recompile on every call.
    #[default]
    Disabled,
    /// Keep every compiled template for the life of the engine.
    Unbounded,
    /// Keep at most this many templates, evicting the least recently used.
    Bounded(usize),
    /// Delegate to a caller-supplied cache.
    Custom(Arc<dyn TemplateCache>),
}

impl CacheOption {
    /// Builds the cache this option describes.
    pub fn build(&self) -> Arc<dyn TemplateCache> {
        match self {
            CacheOption::Disabled | CacheOption::Bounded(0) => Arc::new(NoOpCache),
            CacheOption::Unbounded => Arc::new(MemoryCache::unbounded()),
            CacheOption::Bounded(capacity) => Arc::new(MemoryCache::new(*capacity)),
            CacheOption::Custom(cache) => Arc::clone(cache),
        }
    }
}

impl From<bool> for CacheOption {
    fn from(enabled: bool) -> Self {
        if enabled {
            CacheOption::Unbounded
        } else {
            CacheOption::Disabled
        }
    }
}

impl From<i64> for CacheOption {
    fn from(capacity: i64) -> Self {
        match usize::try_from(capacity) {
            Ok(capacity) if capacity > 0 => CacheOption::Bounded(capacity),
            _ => CacheOption::Disabled,
        }
    }
}

impl From<Arc<dyn TemplateCache>> for CacheOption {
    fn from(cache: Arc<dyn TemplateCache>) -> Self {
        CacheOption::Custom(cache)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawCacheOption {
    Flag(bool),
    Capacity(i64),
}

impl<'de> Deserialize<'de> for CacheOption {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match RawCacheOption::deserialize(deserializer)? {
            RawCacheOption::Flag(flag) => flag.into(),
            RawCacheOption::Capacity(capacity) => capacity.into(),
        })
    }
}
