//! File tree access for filedeck.
//!
//! This module provides the storage abstraction the web layer and the
//! preview engine sit on:
//! - Path-like file identifiers (`/photos/a.jpg`)
//! - The [`Drive`] trait (info, read, list, create, copy, move, remove, stats)
//! - A local directory implementation, [`LocalDrive`]

mod metadata;
mod storage;

use std::fs::File;
use std::path::PathBuf;

pub use metadata::{extension_of, FileKind, FileMetadata};
pub use storage::LocalDrive;

use crate::{FiledeckError, Result};

/// Maximum length for a file or folder name (in characters).
pub const MAX_FILENAME_LENGTH: usize = 255;

/// Name predicate used by [`ListConfig`].
pub type NameFilter = Box<dyn Fn(&str) -> bool + Send + Sync>;

/// Listing options.
#[derive(Default)]
pub struct ListConfig {
    /// Descend into sub folders.
    pub sub_folders: bool,
    /// Only entries whose name matches are returned (folders are still descended).
    pub include: Option<NameFilter>,
    /// Matching entries are neither returned nor descended.
    pub exclude: Option<NameFilter>,
}

impl ListConfig {
    /// Direct children of a folder, hidden entries excluded.
    pub fn browse() -> Self {
        Self {
            sub_folders: false,
            include: None,
            exclude: Some(Box::new(is_hidden)),
        }
    }

    /// Recursive case-insensitive name search, hidden entries excluded.
    pub fn search(text: &str) -> Self {
        let needle = text.to_lowercase();
        Self {
            sub_folders: true,
            include: Some(Box::new(move |name: &str| {
                name.to_lowercase().contains(&needle)
            })),
            exclude: Some(Box::new(is_hidden)),
        }
    }

    /// Browse or search depending on whether `text` is empty.
    pub fn for_query(text: Option<&str>) -> Self {
        match text.map(str::trim) {
            Some(text) if !text.is_empty() => Self::search(text),
            _ => Self::browse(),
        }
    }

    pub(crate) fn includes(&self, name: &str) -> bool {
        self.include.as_ref().map_or(true, |f| f(name))
    }

    pub(crate) fn excludes(&self, name: &str) -> bool {
        self.exclude.as_ref().map_or(false, |f| f(name))
    }
}

/// Whether a name is hidden (dot-prefixed, e.g. `.preview`).
pub fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

/// Space usage of the filesystem holding a drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriveStats {
    /// Bytes in use.
    pub used: u64,
    /// Bytes available.
    pub free: u64,
}

impl DriveStats {
    /// Capacity of the filesystem.
    pub fn total(&self) -> u64 {
        self.used + self.free
    }
}

/// Storage abstraction over a hierarchical file tree.
///
/// Identifiers are path-like strings rooted at `/`. Implementations may be
/// eventually consistent: an entry created through one call can be briefly
/// invisible to `info`.
pub trait Drive: Send + Sync {
    /// Metadata of an entry.
    fn info(&self, id: &str) -> Result<FileMetadata>;

    /// Open a file for reading.
    fn read(&self, id: &str) -> Result<File>;

    /// List a folder.
    fn list(&self, id: &str, config: &ListConfig) -> Result<Vec<FileMetadata>>;

    /// Create an empty file or a folder inside `parent`, returning its id.
    fn make(&self, parent: &str, name: &str, is_folder: bool) -> Result<String>;

    /// Replace the content of a file.
    fn write(&self, id: &str, content: &[u8]) -> Result<()>;

    /// Copy an entry into the `target` folder, returning the new id.
    fn copy(&self, id: &str, target: &str) -> Result<String>;

    /// Move an entry into `target` (empty: same folder) under `name`
    /// (empty: same name), returning the new id.
    fn move_to(&self, id: &str, target: &str, name: &str) -> Result<String>;

    /// Remove a file or a folder with its content.
    fn remove(&self, id: &str) -> Result<()>;

    /// Whether an entry exists.
    fn exists(&self, id: &str) -> bool;

    /// Location of an entry on the local filesystem.
    fn local_path(&self, id: &str) -> Result<PathBuf>;

    /// Space usage of the underlying filesystem.
    fn stats(&self) -> Result<DriveStats>;
}

/// Normalize an identifier to its canonical `/a/b` form.
///
/// A missing leading slash and repeated slashes are accepted; `.` and `..`
/// segments are rejected.
pub fn normalize_id(id: &str) -> Result<String> {
    let mut segments = Vec::new();
    for segment in id.split('/').filter(|s| !s.is_empty()) {
        validate_name(segment)?;
        segments.push(segment);
    }
    Ok(format!("/{}", segments.join("/")))
}

/// Validate a single entry name.
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(FiledeckError::Validation("name is empty".to_string()));
    }
    if name == "." || name == ".." {
        return Err(FiledeckError::Validation(format!("invalid name: {name}")));
    }
    if name.chars().count() > MAX_FILENAME_LENGTH {
        return Err(FiledeckError::Validation(format!(
            "name exceeds {MAX_FILENAME_LENGTH} characters"
        )));
    }
    if name.chars().any(|c| c == '/' || c == '\\' || c.is_control()) {
        return Err(FiledeckError::Validation(format!("invalid name: {name:?}")));
    }
    Ok(())
}

/// Join a canonical folder id and a child name.
pub fn join_id(parent: &str, name: &str) -> String {
    if parent == "/" {
        format!("/{name}")
    } else {
        format!("{parent}/{name}")
    }
}

/// Last segment of a canonical id (empty for the root).
pub fn id_name(id: &str) -> &str {
    id.rsplit('/').next().unwrap_or("")
}

/// Parent of a canonical id (the root is its own parent).
pub fn parent_id(id: &str) -> &str {
    match id.rfind('/') {
        Some(0) | None => "/",
        Some(pos) => &id[..pos],
    }
}
