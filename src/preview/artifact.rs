//! On-disk layout of cached previews.
//!
//! ```text
//! {source-parent}/
//! ├── a.jpg
//! └── .preview/
//!     ├── a.jpg___100x100.jpg      (ready)
//!     ├── a.jpg___214x163.jpg      (zero bytes: generation failed)
//!     └── report.pdf___214x163.png (ready, rendered remotely)
//! ```

use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;

/// Name of the hidden cache folder next to each source.
pub const PREVIEW_DIR: &str = ".preview";

/// Format the failure placeholder is written in.
pub const PLACEHOLDER_FORMAT: PreviewFormat = PreviewFormat::Jpeg;

/// Raster format of a stored preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewFormat {
    Jpeg,
    Png,
}

impl PreviewFormat {
    /// Probe order for cached artifacts.
    pub const ALL: [PreviewFormat; 2] = [PreviewFormat::Jpeg, PreviewFormat::Png];

    /// File extension, without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            PreviewFormat::Jpeg => "jpg",
            PreviewFormat::Png => "png",
        }
    }

    /// MIME type served for this format.
    pub fn content_type(&self) -> &'static str {
        match self {
            PreviewFormat::Jpeg => "image/jpeg",
            PreviewFormat::Png => "image/png",
        }
    }

    /// Format for a declared content type: exactly `image/png` is PNG,
    /// anything else (including a missing header) is JPEG.
    pub fn from_content_type(content_type: Option<&str>) -> Self {
        match content_type {
            Some("image/png") => PreviewFormat::Png,
            _ => PreviewFormat::Jpeg,
        }
    }
}

/// Cache state of one preview key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactState {
    /// A generated preview is stored at `path`.
    Ready { path: PathBuf, format: PreviewFormat },
    /// Generation failed before; do not retry.
    Unavailable,
    /// Never attempted.
    Missing,
}

/// Location of the artifact for a source file and a size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPath {
    folder: PathBuf,
    stem: String,
}

impl ArtifactPath {
    /// Artifact location for `source` at `width x height`.
    pub fn new(source: &Path, width: u32, height: u32) -> Self {
        let folder = source
            .parent()
            .unwrap_or_else(|| Path::new(""))
            .join(PREVIEW_DIR);
        let name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self {
            folder,
            stem: format!("{name}___{width}x{height}"),
        }
    }

    /// The `.preview` folder holding this artifact.
    pub fn folder(&self) -> &Path {
        &self.folder
    }

    /// File name without extension, e.g. `a.jpg___100x100`.
    pub fn stem(&self) -> &str {
        &self.stem
    }

    /// Final path for a format.
    pub fn path(&self, format: PreviewFormat) -> PathBuf {
        self.folder
            .join(format!("{}.{}", self.stem, format.extension()))
    }

    /// Scratch path a generator writes to before [`ArtifactPath::commit`].
    pub fn partial_path(&self, format: PreviewFormat) -> PathBuf {
        self.folder
            .join(format!("{}.{}.part", self.stem, format.extension()))
    }

    /// Look for a stored artifact, `.jpg` first, then `.png`.
    pub async fn probe(&self) -> ArtifactState {
        for format in PreviewFormat::ALL {
            let path = self.path(format);
            match fs::metadata(&path).await {
                Ok(meta) if meta.is_file() => {
                    return if meta.len() == 0 {
                        ArtifactState::Unavailable
                    } else {
                        ArtifactState::Ready { path, format }
                    };
                }
                _ => continue,
            }
        }
        ArtifactState::Missing
    }

    /// Create the `.preview` folder if needed.
    pub async fn ensure_folder(&self) -> io::Result<()> {
        fs::create_dir_all(&self.folder).await
    }

    /// Move a finished scratch file into place.
    pub async fn commit(&self, format: PreviewFormat) -> io::Result<PathBuf> {
        let path = self.path(format);
        fs::rename(self.partial_path(format), &path).await?;
        Ok(path)
    }

    /// Drop a scratch file left by a failed generator.
    pub async fn discard(&self, format: PreviewFormat) {
        let _ = fs::remove_file(self.partial_path(format)).await;
    }

    /// Record a permanent failure for this key.
    pub async fn mark_unavailable(&self) -> io::Result<()> {
        fs::write(self.path(PLACEHOLDER_FORMAT), []).await
    }
}
