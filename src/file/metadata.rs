//! File metadata as reported by a drive.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;
use utoipa::ToSchema;

/// Coarse file classification derived from the extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Folder,
    Image,
    Audio,
    Video,
    Document,
    Code,
    Archive,
    File,
}

const IMAGE_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "bmp", "webp", "tif", "tiff", "svg", "ico", "heic",
];
const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "ogg", "flac", "aac", "m4a", "wma"];
const VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "avi", "mkv", "mov", "webm", "wmv", "flv", "mpeg", "mpg",
];
const DOCUMENT_EXTENSIONS: &[&str] = &[
    "doc", "docx", "xls", "xlsx", "ppt", "pptx", "pdf", "odt", "ods", "odp", "rtf", "txt", "md",
    "csv",
];
const CODE_EXTENSIONS: &[&str] = &[
    "html", "htm", "js", "ts", "jsx", "tsx", "css", "scss", "json", "xml", "yml", "yaml", "toml",
    "go", "rs", "py", "java", "c", "cpp", "h", "hpp", "sh", "rb", "php", "sql",
];
const ARCHIVE_EXTENSIONS: &[&str] = &["zip", "rar", "7z", "tar", "gz", "bz2", "xz", "tgz"];

impl FileKind {
    /// Classify a regular file by its name.
    pub fn from_name(name: &str) -> Self {
        let Some(ext) = extension_of(name) else {
            return FileKind::File;
        };
        let ext = ext.to_ascii_lowercase();
        let ext = ext.as_str();

        if IMAGE_EXTENSIONS.contains(&ext) {
            FileKind::Image
        } else if AUDIO_EXTENSIONS.contains(&ext) {
            FileKind::Audio
        } else if VIDEO_EXTENSIONS.contains(&ext) {
            FileKind::Video
        } else if DOCUMENT_EXTENSIONS.contains(&ext) {
            FileKind::Document
        } else if CODE_EXTENSIONS.contains(&ext) {
            FileKind::Code
        } else if ARCHIVE_EXTENSIONS.contains(&ext) {
            FileKind::Archive
        } else {
            FileKind::File
        }
    }

    /// Lowercase name used in API responses.
    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::Folder => "folder",
            FileKind::Image => "image",
            FileKind::Audio => "audio",
            FileKind::Video => "video",
            FileKind::Document => "document",
            FileKind::Code => "code",
            FileKind::Archive => "archive",
            FileKind::File => "file",
        }
    }
}

/// Extension of a file name without the dot, if any.
pub fn extension_of(name: &str) -> Option<&str> {
    Path::new(name).extension().and_then(|s| s.to_str())
}

/// Metadata of a single entry in the file tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMetadata {
    /// Canonical identifier, e.g. `/photos/a.jpg`.
    pub id: String,
    /// Display name (last path segment).
    pub name: String,
    /// Size in bytes (0 for folders).
    pub size: u64,
    /// Entry classification.
    pub kind: FileKind,
    /// Last modification instant.
    pub modified: DateTime<Utc>,
}

impl FileMetadata {
    /// Whether this entry is a folder.
    pub fn is_folder(&self) -> bool {
        self.kind == FileKind::Folder
    }

    /// Extension of the display name, if any.
    pub fn extension(&self) -> Option<&str> {
        extension_of(&self.name)
    }
}
