//! Response DTOs for Web API.

use std::collections::BTreeMap;

use serde::Serialize;
use utoipa::ToSchema;

use crate::file::{DriveStats, FileMetadata};

/// Format of listing dates.
const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Generic API response wrapper.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a new API response.
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// One row of a folder listing.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FileEntry {
    pub id: String,
    /// Display name.
    pub value: String,
    /// Size in bytes, absent for folders.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// Modification time, UTC.
    pub date: String,
    /// `folder` or `file`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Visible children of a folder.
    #[serde(skip_serializing_if = "is_zero")]
    pub count: usize,
    /// Whether a folder has children to load.
    #[serde(skip_serializing_if = "is_false")]
    pub lazy: bool,
}

fn is_zero(value: &usize) -> bool {
    *value == 0
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl FileEntry {
    /// Build a listing row; `count` is only used for folders.
    pub fn new(info: &FileMetadata, count: usize) -> Self {
        let folder = info.is_folder();
        Self {
            id: info.id.clone(),
            value: info.name.clone(),
            size: if folder { None } else { Some(info.size) },
            date: info.modified.format(DATE_FORMAT).to_string(),
            kind: if folder { "folder" } else { "file" }.to_string(),
            count: if folder { count } else { 0 },
            lazy: folder && count > 0,
        }
    }
}

/// Identity of an entry after a mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ItemResult {
    pub id: String,
    pub name: String,
}

impl From<&FileMetadata> for ItemResult {
    fn from(info: &FileMetadata) -> Self {
        Self {
            id: info.id.clone(),
            name: info.name.clone(),
        }
    }
}

/// Folder statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct FolderInfo {
    /// Total size of all files below the folder.
    pub size: u64,
    /// Direct visible children.
    pub count: usize,
}

/// Pixel size and EXIF tags of an image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    /// EXIF field name to displayed value, empty when the image has none.
    pub exif: BTreeMap<String, String>,
}

/// Tags of an audio file. Missing tags are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct AudioInfo {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub year: String,
    pub genre: String,
}

/// Kind-specific details returned by `GET /info/:id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(untagged)]
pub enum MetaInfo {
    Folder(FolderInfo),
    Image(ImageInfo),
    Audio(AudioInfo),
}

/// Space usage of the file storage (`GET /info`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct StorageInfo {
    pub free: u64,
    pub total: u64,
    pub used: u64,
}

impl From<DriveStats> for StorageInfo {
    fn from(stats: DriveStats) -> Self {
        Self {
            free: stats.free,
            total: stats.total(),
            used: stats.used,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::FileKind;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn metadata(name: &str, kind: FileKind) -> FileMetadata {
        FileMetadata {
            id: format!("/{name}"),
            name: name.to_string(),
            size: 42,
            kind,
            modified: Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap(),
        }
    }

    #[test]
    fn test_file_entry_json() {
        let entry = FileEntry::new(&metadata("a.jpg", FileKind::Image), 3);
        assert_eq!(
            serde_json::to_value(&entry).unwrap(),
            json!({
                "id": "/a.jpg",
                "value": "a.jpg",
                "size": 42,
                "date": "2024-03-09 07:05:01",
                "type": "file"
            })
        );
    }

    #[test]
    fn test_folder_entry_json() {
        let entry = FileEntry::new(&metadata("photos", FileKind::Folder), 2);
        assert_eq!(
            serde_json::to_value(&entry).unwrap(),
            json!({
                "id": "/photos",
                "value": "photos",
                "date": "2024-03-09 07:05:01",
                "type": "folder",
                "count": 2,
                "lazy": true
            })
        );

        let empty = FileEntry::new(&metadata("empty", FileKind::Folder), 0);
        let value = serde_json::to_value(&empty).unwrap();
        assert!(value.get("count").is_none());
        assert!(value.get("lazy").is_none());
    }

    #[test]
    fn test_meta_info_untagged() {
        let info = MetaInfo::Image(ImageInfo {
            width: 640,
            height: 480,
            exif: BTreeMap::from([("Make".to_string(), "\"Canon\"".to_string())]),
        });
        assert_eq!(
            serde_json::to_value(&info).unwrap(),
            json!({"width": 640, "height": 480, "exif": {"Make": "\"Canon\""}})
        );

        let info = MetaInfo::Audio(AudioInfo {
            title: "Song".to_string(),
            ..AudioInfo::default()
        });
        assert_eq!(
            serde_json::to_value(&info).unwrap(),
            json!({"title": "Song", "artist": "", "album": "", "year": "", "genre": ""})
        );
    }

    #[test]
    fn test_storage_info_total() {
        let info = StorageInfo::from(DriveStats { used: 30, free: 70 });
        assert_eq!(
            serde_json::to_value(info).unwrap(),
            json!({"free": 70, "total": 100, "used": 30})
        );
    }
}
