// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

use quill::{CacheOption, Engine, EngineOptions, FileSystemResolver, QuillError, Template, TemplateCache};
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// Helper function to create an engine over a temporary root
fn create_engine(root: &Path, cache: CacheOption) -> Engine<FileSystemResolver> {
    init_tracing();
    Engine::with_options(EngineOptions {
        root: vec![root.to_path_buf()],
        extname: ".html".into(),
        cache,
        ..Default::default()
    })
}

fn write(root: &Path, name: &str, content: &str) {
    fs::write(root.join(name), content).unwrap();
}

#[test]
fn test_disabled_by_default() {
    let dir = TempDir::new().unwrap();
    let engine = create_engine(dir.path(), EngineOptions::default().cache);

    write(dir.path(), "foo.html", "foo");
    assert_eq!(engine.render_file_sync("foo", ()).unwrap(), "foo");
    write(dir.path(), "foo.html", "bar");
    assert_eq!(engine.render_file_sync("foo", ()).unwrap(), "bar");
}

#[test]
fn test_non_positive_capacity_disables_cache() {
    for capacity in [0i64, -1] {
        let dir = TempDir::new().unwrap();
        let engine = create_engine(dir.path(), capacity.into());

        write(dir.path(), "foo.html", "foo");
        assert_eq!(engine.render_file_sync("foo", ()).unwrap(), "foo");
        write(dir.path(), "foo.html", "bar");
        assert_eq!(engine.render_file_sync("foo", ()).unwrap(), "bar");
    }
}

#[test]
fn test_unbounded_cache_ignores_source_changes() {
    let dir = TempDir::new().unwrap();
    let engine = create_engine(dir.path(), true.into());

    write(dir.path(), "foo.html", "foo");
    assert_eq!(engine.render_file_sync("foo", ()).unwrap(), "foo");
    write(dir.path(), "foo.html", "bar");
    assert_eq!(engine.render_file_sync("foo", ()).unwrap(), "foo");
}

#[test]
fn test_unbounded_cache_serves_deleted_source() {
    let dir = TempDir::new().unwrap();
    let engine = create_engine(dir.path(), true.into());

    write(dir.path(), "foo.html", "foo");
    assert_eq!(engine.render_file_sync("foo", ()).unwrap(), "foo");
    fs::remove_file(dir.path().join("foo.html")).unwrap();
    assert_eq!(engine.render_file_sync("foo", ()).unwrap(), "foo");
}

#[tokio::test]
async fn test_unbounded_cache_serves_deleted_source_async() {
    let dir = TempDir::new().unwrap();
    let engine = create_engine(dir.path(), true.into());

    write(dir.path(), "foo.html", "foo");
    assert_eq!(engine.render_file("foo", ()).await.unwrap(), "foo");
    fs::remove_file(dir.path().join("foo.html")).unwrap();
    assert_eq!(engine.render_file("foo", ()).await.unwrap(), "foo");
}

#[tokio::test]
async fn test_unbounded_cache_ignores_source_changes_async() {
    let dir = TempDir::new().unwrap();
    let engine = create_engine(dir.path(), true.into());

    write(dir.path(), "foo.html", "foo");
    assert_eq!(engine.render_file("foo", ()).await.unwrap(), "foo");
    write(dir.path(), "foo.html", "bar");
    assert_eq!(engine.render_file("foo", ()).await.unwrap(), "foo");
}

#[test]
fn test_lru_evicts_least_recently_used() {
    let dir = TempDir::new().unwrap();
    let engine = create_engine(dir.path(), 2i64.into());

    write(dir.path(), "foo.html", "foo");
    write(dir.path(), "bar.html", "bar");
    write(dir.path(), "coo.html", "coo");
    let render = |name: &str| engine.render_file_sync(name, ()).unwrap();

    assert_eq!(render("foo"), "foo");
    assert_eq!(render("bar"), "bar");
    assert_eq!(render("foo"), "foo");
    assert_eq!(render("bar"), "bar");
    // foo is now the least recently used entry and gets evicted
    assert_eq!(render("coo"), "coo");

    write(dir.path(), "foo.html", "FOO");
    write(dir.path(), "coo.html", "COO");
    assert_eq!(render("foo"), "FOO");
    assert_eq!(render("coo"), "coo");
}

#[tokio::test]
async fn test_lru_evicts_least_recently_used_async() {
    let dir = TempDir::new().unwrap();
    let engine = create_engine(dir.path(), 2i64.into());

    write(dir.path(), "foo.html", "foo");
    write(dir.path(), "bar.html", "bar");
    write(dir.path(), "coo.html", "coo");
    for name in ["foo", "bar", "foo", "bar", "coo"] {
        assert_eq!(engine.render_file(name, ()).await.unwrap(), name);
    }

    write(dir.path(), "foo.html", "FOO");
    assert_eq!(engine.render_file("foo", ()).await.unwrap(), "FOO");
}

#[test]
fn test_missing_template_is_not_cached() {
    let dir = TempDir::new().unwrap();
    let engine = create_engine(dir.path(), true.into());

    let err = engine.render_file_sync("foo", ()).unwrap_err();
    assert!(matches!(err, QuillError::SourceNotFound(name) if name == "foo"));

    write(dir.path(), "foo.html", "foo");
    assert_eq!(engine.render_file_sync("foo", ()).unwrap(), "foo");
}

#[tokio::test]
async fn test_missing_template_is_not_cached_async() {
    let dir = TempDir::new().unwrap();
    let engine = create_engine(dir.path(), 10i64.into());

    assert!(matches!(
        engine.render_file("foo", ()).await,
        Err(QuillError::SourceNotFound(_))
    ));

    write(dir.path(), "foo.html", "foo");
    assert_eq!(engine.render_file("foo", ()).await.unwrap(), "foo");
}

/// Always answers with the last template written, whatever the key.
#[derive(Debug, Default)]
struct LastEntryCache {
    last: Mutex<Option<Arc<Template>>>,
    writes: AtomicUsize,
}

impl TemplateCache for LastEntryCache {
    fn has(&self, _key: &str) -> bool {
        self.last.lock().unwrap().is_some()
    }

    fn read(&self, _key: &str) -> Option<Arc<Template>> {
        self.last.lock().unwrap().clone()
    }

    fn write(&self, _key: &str, template: Arc<Template>) {
        self.writes.fetch_add(1, Ordering::SeqCst);
        *self.last.lock().unwrap() = Some(template);
    }
}

#[test]
fn test_custom_cache_is_authoritative() {
    let dir = TempDir::new().unwrap();
    let cache = Arc::new(LastEntryCache::default());
    let engine = create_engine(dir.path(), CacheOption::Custom(cache.clone()));

    write(dir.path(), "foo.html", "foo");
    write(dir.path(), "bar.html", "bar");
    write(dir.path(), "coo.html", "coo");

    assert_eq!(engine.render_file_sync("foo", ()).unwrap(), "foo");
    assert_eq!(engine.render_file_sync("bar", ()).unwrap(), "foo");
    assert_eq!(engine.render_file_sync("coo", ()).unwrap(), "foo");
    assert_eq!(cache.writes.load(Ordering::SeqCst), 1);
}

#[test]
fn test_custom_cache_answers_for_missing_sources() {
    let dir = TempDir::new().unwrap();
    let cache = Arc::new(LastEntryCache::default());
    let engine = create_engine(dir.path(), CacheOption::Custom(cache.clone()));

    write(dir.path(), "foo.html", "foo");
    assert_eq!(engine.render_file_sync("foo", ()).unwrap(), "foo");
    assert_eq!(engine.render_file_sync("never_written", ()).unwrap(), "foo");
    assert_eq!(cache.writes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_custom_cache_is_authoritative_async() {
    let dir = TempDir::new().unwrap();
    let cache = Arc::new(LastEntryCache::default());
    let engine = create_engine(dir.path(), CacheOption::Custom(cache.clone()));

    write(dir.path(), "foo.html", "foo");
    write(dir.path(), "bar.html", "bar");

    assert_eq!(engine.render_file("foo", ()).await.unwrap(), "foo");
    assert_eq!(engine.render_file("bar", ()).await.unwrap(), "foo");
    assert_eq!(engine.render_file("never_written", ()).await.unwrap(), "foo");
}

#[test]
fn test_cache_key_is_the_root_joined_path() {
    let dir = TempDir::new().unwrap();
    let engine = create_engine(dir.path(), true.into());
    write(dir.path(), "foo.html", "foo");

    // Both spellings resolve to the same file and share one entry.
    engine.render_file_sync("foo", ()).unwrap();
    write(dir.path(), "foo.html", "changed");
    assert_eq!(engine.render_file_sync("foo.html", ()).unwrap(), "foo");

    let key = quill::path_to_string(dir.path().join("foo.html"));
    assert!(engine.cache().has(&key));
}

#[test]
fn test_compiled_template_carries_its_key() {
    let dir = TempDir::new().unwrap();
    let engine = create_engine(dir.path(), 5i64.into());
    write(dir.path(), "page.html", "{{ x }}");

    let first = engine.parse_file_sync("page").unwrap();
    let second = engine.parse_file_sync("page").unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert!(first.name.as_deref().is_some_and(|name| name.ends_with("page.html")));
}
