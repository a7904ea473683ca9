//! Metadata info handlers.

use axum::{
    extract::{Path, State},
    Json,
};
use lofty::prelude::*;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path as FsPath;
use std::sync::Arc;

use crate::file::{is_hidden, Drive, FileKind, FileMetadata, ListConfig};
use crate::web::dto::{ApiResponse, AudioInfo, FolderInfo, ImageInfo, MetaInfo, StorageInfo};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;
use crate::Result;

/// Total size below a folder and its direct visible children.
fn folder_info(drive: &dyn Drive, id: &str) -> Result<FolderInfo> {
    let recursive = ListConfig {
        sub_folders: true,
        include: None,
        exclude: Some(Box::new(is_hidden)),
    };
    let size = drive
        .list(id, &recursive)?
        .iter()
        .filter(|item| !item.is_folder())
        .map(|item| item.size)
        .sum();
    let count = drive.list(id, &ListConfig::browse())?.len();

    Ok(FolderInfo { size, count })
}

/// EXIF fields of an image, keyed by field name.
///
/// A field present in several IFDs keeps its primary image value.
fn exif_tags(path: &FsPath) -> BTreeMap<String, String> {
    let mut tags = BTreeMap::new();
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "Cannot open image");
            return tags;
        }
    };

    match exif::Reader::new().read_from_container(&mut BufReader::new(file)) {
        Ok(exif) => {
            for field in exif.fields() {
                tags.entry(field.tag.to_string())
                    .or_insert_with(|| field.display_value().with_unit(&exif).to_string());
            }
        }
        Err(e) => tracing::debug!(path = %path.display(), error = %e, "No EXIF data"),
    }
    tags
}

/// Pixel size and EXIF tags, if the image header can be read.
fn image_info(drive: &dyn Drive, id: &str) -> Option<ImageInfo> {
    let path = drive.local_path(id).ok()?;
    match image::image_dimensions(&path) {
        Ok((width, height)) => Some(ImageInfo {
            width,
            height,
            exif: exif_tags(&path),
        }),
        Err(e) => {
            tracing::debug!(id, error = %e, "Cannot read image dimensions");
            None
        }
    }
}

fn text(value: Option<Cow<'_, str>>) -> String {
    value.map(Cow::into_owned).unwrap_or_default()
}

/// Title, artist, album, year and genre of an audio file.
fn audio_info(drive: &dyn Drive, id: &str) -> Option<AudioInfo> {
    let path = drive.local_path(id).ok()?;
    let tagged = match lofty::read_from_path(&path) {
        Ok(tagged) => tagged,
        Err(e) => {
            tracing::debug!(id, error = %e, "Cannot read audio tags");
            return None;
        }
    };

    let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) else {
        return Some(AudioInfo::default());
    };
    Some(AudioInfo {
        title: text(tag.title()),
        artist: text(tag.artist()),
        album: text(tag.album()),
        year: tag.year().map(|y| y.to_string()).unwrap_or_default(),
        genre: text(tag.genre()),
    })
}

/// Details for one resolved entry.
fn describe(drive: &dyn Drive, info: &FileMetadata) -> Result<Option<MetaInfo>> {
    Ok(match info.kind {
        FileKind::Folder => Some(MetaInfo::Folder(folder_info(drive, &info.id)?)),
        FileKind::Image => image_info(drive, &info.id).map(MetaInfo::Image),
        FileKind::Audio => audio_info(drive, &info.id).map(MetaInfo::Audio),
        _ => None,
    })
}

/// GET /info/:id - Kind-specific details of an entry.
///
/// Folders report their size and child count, images their pixel size and
/// EXIF tags, audio files their tags, everything else `null`.
#[utoipa::path(
    get,
    path = "/info/{id}",
    tag = "files",
    params(
        ("id" = String, Path, description = "File or folder ID")
    ),
    responses(
        (status = 200, description = "Details, or null", body = MetaInfo),
        (status = 404, description = "Entry not found")
    )
)]
pub async fn get_info(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> std::result::Result<Json<ApiResponse<Option<MetaInfo>>>, ApiError> {
    let info = state.previews.poller().resolve(&id).await?;

    let drive = state.drive.clone();
    let meta = tokio::task::spawn_blocking(move || describe(drive.as_ref(), &info))
        .await
        .map_err(|e| ApiError::internal(format!("Info task failed: {e}")))??;

    Ok(Json(ApiResponse::new(meta)))
}

/// GET /info - Space usage of the file storage.
#[utoipa::path(
    get,
    path = "/info",
    tag = "files",
    responses(
        (status = 200, description = "Free, total and used bytes", body = StorageInfo),
        (status = 500, description = "Usage unavailable")
    )
)]
pub async fn get_storage_info(
    State(state): State<Arc<AppState>>,
) -> std::result::Result<Json<ApiResponse<StorageInfo>>, ApiError> {
    let drive = state.drive.clone();
    let stats = tokio::task::spawn_blocking(move || drive.stats())
        .await
        .map_err(|e| ApiError::internal(format!("Info task failed: {e}")))??;

    Ok(Json(ApiResponse::new(StorageInfo::from(stats))))
}
