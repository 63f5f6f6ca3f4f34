// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Template source lookup.
//!
//! This module provides the [`SourceReader`] trait and implementations
//! for locating and loading template text.
//!
//! # Reader Implementations
//!
//! - [`FileSystemResolver`]: Loads templates from one or more root directories
//! - [`MemoryResourceResolver`](crate::MemoryResourceResolver): Loads templates from in-memory storage
//!
//! Lookup happens in two steps so the engine can consult its cache in
//! between: [`SourceReader::candidates`] lists the source identities a
//! requested name may refer to, without touching the sources, and
//! [`SourceReader::read`] loads the text for one identity, reporting a
//! missing one as [`QuillError::SourceNotFound`].

use crate::error::{QuillError, Result};
use async_trait::async_trait;
use std::path::Path;
#[cfg(feature = "filesystem")]
use std::path::{Component, PathBuf};

/// Converts a Path to a normalized string with forward slashes.
/// On Windows, uses path components to rebuild with `/` separators.
#[inline]
pub fn path_to_string<P: AsRef<Path>>(path: P) -> String {
    #[cfg(windows)]
    {
        use std::path::Component;
        let mut result = String::new();
        for (i, component) in path.as_ref().components().enumerate() {
            if i > 0 && !result.ends_with('/') {
                result.push('/');
            }
            match component {
                Component::Prefix(p) => result.push_str(&p.as_os_str().to_string_lossy()),
                Component::RootDir => result.push('/'),
                Component::CurDir => result.push('.'),
                Component::ParentDir => result.push_str(".."),
                Component::Normal(s) => result.push_str(&s.to_string_lossy()),
            }
        }
        result
    }
    #[cfg(not(windows))]
    {
        path.as_ref().to_string_lossy().to_string()
    }
}

/// Appends `extname` when `name` has no extension of its own.
pub fn with_extname(name: &str, extname: &str) -> String {
    if extname.is_empty() || Path::new(name).extension().is_some() {
        name.to_string()
    } else {
        format!("{}{}", name, extname)
    }
}

/// Locates and loads template sources.
#[async_trait]
pub trait SourceReader: Send + Sync + 'static {
    /// Source identities `name` may refer to, in lookup order.
    ///
    /// Each identity doubles as a cache key. This must not depend on
    /// whether the source currently exists.
    fn candidates(&self, name: &str) -> Vec<String>;

    /// Loads the text for one identity from [`candidates`](Self::candidates).
    ///
    /// Fails with [`QuillError::SourceNotFound`] if nothing is there.
    fn read(&self, key: &str) -> Result<String>;

    /// Async form of [`read`](Self::read), used by the async engine entry
    /// points. Defaults to the blocking read.
    async fn read_async(&self, key: &str) -> Result<String> {
        self.read(key)
    }
}

/// Filesystem-based source reader.
///
/// Each root directory yields one candidate: the root joined with the
/// requested name, made absolute and lexically normalized. Names that
/// would escape their root yield no candidate, and a file reached through
/// a symlink outside its root is not found.
///
/// Reads are blocking, in both sync and async mode.
///
/// # Examples
///
/// ```rust,ignore
/// use quill::FileSystemResolver;
///
/// let reader = FileSystemResolver::new(["./views", "./partials"]).with_extname(".liquid");
/// let keys = reader.candidates("index"); // [".../views/index.liquid", ".../partials/index.liquid"]
/// ```
#[cfg(feature = "filesystem")]
#[derive(Debug, Clone)]
pub struct FileSystemResolver {
    /// Root directories, searched in order.
    pub roots: Vec<PathBuf>,
    /// Extension appended to names that have none, e.g. `".liquid"`.
    pub extname: String,
}

#[cfg(feature = "filesystem")]
impl FileSystemResolver {
    /// Creates a reader over the given roots.
    pub fn new<I, P>(roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        Self {
            roots: roots.into_iter().map(|p| p.as_ref().to_path_buf()).collect(),
            extname: String::new(),
        }
    }

    /// Sets the default extension.
    pub fn with_extname(mut self, extname: impl Into<String>) -> Self {
        self.extname = extname.into();
        self
    }

    fn absolute_roots(&self) -> impl Iterator<Item = PathBuf> + '_ {
        self.roots.iter().map(|root| normalize(&absolute(root)))
    }
}

#[cfg(feature = "filesystem")]
fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(_) => path.to_path_buf(),
    }
}

/// Resolves `.` and `..` without touching the filesystem.
#[cfg(feature = "filesystem")]
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component.as_os_str());
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(feature = "filesystem")]
impl SourceReader for FileSystemResolver {
    fn candidates(&self, name: &str) -> Vec<String> {
        let file = with_extname(name, &self.extname);
        let requested = Path::new(&file);

        if requested.is_absolute() {
            return vec![path_to_string(normalize(requested))];
        }

        self.absolute_roots()
            .filter_map(|root| {
                let candidate = normalize(&root.join(requested));
                if candidate.starts_with(&root) {
                    Some(path_to_string(candidate))
                } else {
                    tracing::debug!(name, root = %root.display(), "template path escapes its root");
                    None
                }
            })
            .collect()
    }

    fn read(&self, key: &str) -> Result<String> {
        let path = Path::new(key);
        if !path.is_file() {
            return Err(QuillError::SourceNotFound(key.to_string()));
        }

        if let Some(root) = self.absolute_roots().find(|root| path.starts_with(root)) {
            let contained = match (std::fs::canonicalize(path), std::fs::canonicalize(&root)) {
                (Ok(canonical), Ok(canonical_root)) => canonical.starts_with(canonical_root),
                _ => false,
            };
            if !contained {
                tracing::debug!(key, root = %root.display(), "template path escapes its root");
                return Err(QuillError::SourceNotFound(key.to_string()));
            }
        }

        tracing::debug!("Reading template source {:?}", path);
        std::fs::read_to_string(path).map_err(|err| match err.kind() {
            std::io::ErrorKind::NotFound => QuillError::SourceNotFound(key.to_string()),
            _ => QuillError::IoError(err),
        })
    }
}

#[cfg(all(test, feature = "filesystem"))]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_extname_only_when_missing() {
        assert_eq!(with_extname("page", ".liquid"), "page.liquid");
        assert_eq!(with_extname("page.html", ".liquid"), "page.html");
        assert_eq!(with_extname("page", ""), "page");
    }

    #[test]
    fn test_one_candidate_per_root_in_order() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        let reader = FileSystemResolver::new([first.path(), second.path()]).with_extname(".liquid");

        let keys = reader.candidates("./a");
        assert_eq!(
            keys,
            vec![
                path_to_string(first.path().join("a.liquid")),
                path_to_string(second.path().join("a.liquid")),
            ]
        );
    }

    #[test]
    fn test_candidates_do_not_require_the_file() {
        let root = TempDir::new().unwrap();
        let reader = FileSystemResolver::new([root.path()]);
        let keys = reader.candidates("nope.liquid");
        assert_eq!(keys.len(), 1);
        assert!(matches!(
            reader.read(&keys[0]),
            Err(QuillError::SourceNotFound(key)) if key == keys[0]
        ));
    }

    #[test]
    fn test_read_loads_the_source() {
        let root = TempDir::new().unwrap();
        fs::write(root.path().join("a.liquid"), "hello").unwrap();
        let reader = FileSystemResolver::new([root.path()]).with_extname(".liquid");
        let keys = reader.candidates("a");
        assert_eq!(reader.read(&keys[0]).unwrap(), "hello");
    }

    #[test]
    fn test_escaping_the_root_has_no_candidate() {
        let outer = TempDir::new().unwrap();
        let root = outer.path().join("views");
        fs::create_dir(&root).unwrap();
        fs::write(outer.path().join("secret.liquid"), "x").unwrap();
        let reader = FileSystemResolver::new([&root]);
        assert!(reader.candidates("../secret.liquid").is_empty());
        assert_eq!(reader.candidates("x/../../views/a.liquid").len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_out_of_the_root_is_not_found() {
        let outer = TempDir::new().unwrap();
        let root = outer.path().join("views");
        fs::create_dir(&root).unwrap();
        fs::write(outer.path().join("secret.liquid"), "x").unwrap();
        std::os::unix::fs::symlink(outer.path().join("secret.liquid"), root.join("link.liquid")).unwrap();

        let reader = FileSystemResolver::new([&root]);
        let keys = reader.candidates("link.liquid");
        assert!(matches!(reader.read(&keys[0]), Err(QuillError::SourceNotFound(_))));
    }
}
