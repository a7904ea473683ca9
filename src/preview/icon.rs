//! Static icon lookup used as the preview fallback.

use std::path::{Path, PathBuf};

use crate::file::FileMetadata;

/// Icon served when nothing more specific exists.
pub const DEFAULT_ICON: &str = "file.svg";

/// Extension hint used when the file itself could not be resolved.
pub const UNAVAILABLE_ICON: &str = "unavailable";

/// Size bucket used for preview fallbacks.
pub const DEFAULT_ICON_SIZE: &str = "big";

/// Strip every character outside `[A-Za-z0-9.]`.
pub fn sanitize(value: &str) -> String {
    value
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '.')
        .collect()
}

/// A sanitized path component that still means "here" or "up".
fn is_dots_only(value: &str) -> bool {
    value.chars().all(|c| c == '.')
}

/// Resolves icon names to files under `<root>/<size>/`.
#[derive(Debug, Clone)]
pub struct IconResolver {
    root: PathBuf,
}

impl IconResolver {
    /// Create a resolver over the icon root.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of icon `name` (with extension) in size bucket `size`.
    ///
    /// Falls back to `<size>/file.svg` when the icon does not exist, and to
    /// the `big` bucket when `size` names no bucket. Never leaves the icon
    /// root.
    pub fn resolve(&self, name: &str, size: &str) -> PathBuf {
        let size = sanitize(size);
        let bucket = if is_dots_only(&size) {
            self.root.join(DEFAULT_ICON_SIZE)
        } else {
            let bucket = self.root.join(size);
            if bucket.is_dir() {
                bucket
            } else {
                self.root.join(DEFAULT_ICON_SIZE)
            }
        };

        let name = sanitize(name);
        if !is_dots_only(&name) {
            let candidate = bucket.join(&name);
            if candidate.is_file() {
                return candidate;
            }
        }
        bucket.join(DEFAULT_ICON)
    }

    /// Icon for an extension hint such as `pdf`.
    pub fn for_extension(&self, extension: &str, size: &str) -> PathBuf {
        self.resolve(&format!("{extension}.svg"), size)
    }

    /// Fallback preview icon for a file, or the "unavailable" icon when the
    /// file could not be resolved at all.
    pub fn fallback(&self, info: Option<&FileMetadata>) -> PathBuf {
        let hint = match info {
            Some(info) => info.extension().unwrap_or_default(),
            None => UNAVAILABLE_ICON,
        };
        self.for_extension(hint, DEFAULT_ICON_SIZE)
    }
}
