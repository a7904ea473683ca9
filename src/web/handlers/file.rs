//! File handlers for Web API.

use axum::{
    body::Body,
    extract::{Multipart, Path, Query, State},
    http::header,
    response::Response,
    Json,
};
use std::sync::Arc;
use tokio_util::io::ReaderStream;

use crate::file::{join_id, ListConfig};
use crate::web::dto::{
    ApiResponse, CreateRequest, DeleteRequest, DirectQuery, FileEntry, ItemResult, ListQuery,
    RenameRequest, TransferRequest, UploadQuery, ValidatedJson,
};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;

/// Generate a safe Content-Disposition header value.
///
/// Control characters are removed, quotes and backslashes replaced in the
/// plain `filename`, and non-ASCII names get an RFC 5987 `filename*`.
fn content_disposition_header(disposition: &str, filename: &str) -> String {
    let sanitized: String = filename
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| match c {
            '"' | '\\' => '_',
            _ => c,
        })
        .collect();

    if filename.is_ascii() && !filename.chars().any(|c| c.is_control() || c == '"' || c == '\\') {
        return format!("{}; filename=\"{}\"", disposition, filename);
    }

    let encoded = urlencoding::encode(filename);
    format!(
        "{}; filename=\"{}\"; filename*=UTF-8''{}",
        disposition, sanitized, encoded
    )
}

/// Listing rows for a folder, with child counts for sub folders.
fn list_entries(state: &AppState, id: &str, text: Option<&str>) -> Result<Vec<FileEntry>, ApiError> {
    let items = state.drive.list(id, &ListConfig::for_query(text))?;

    let entries = items
        .iter()
        .map(|item| {
            let count = if item.is_folder() {
                state
                    .drive
                    .list(&item.id, &ListConfig::browse())
                    .map(|children| children.len())
                    .unwrap_or(0)
            } else {
                0
            };
            FileEntry::new(item, count)
        })
        .collect();

    Ok(entries)
}

fn item_result(state: &AppState, id: &str) -> Result<ItemResult, ApiError> {
    let info = state.drive.info(id)?;
    Ok(ItemResult::from(&info))
}

/// GET /files - List the root folder.
#[utoipa::path(
    get,
    path = "/files",
    tag = "files",
    params(ListQuery),
    responses(
        (status = 200, description = "Root folder content", body = Vec<FileEntry>)
    )
)]
pub async fn list_root(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<Vec<FileEntry>>>, ApiError> {
    let entries = list_entries(&state, "/", query.text.as_deref())?;
    Ok(Json(ApiResponse::new(entries)))
}

/// GET /files/:id - List a folder.
#[utoipa::path(
    get,
    path = "/files/{id}",
    tag = "files",
    params(
        ("id" = String, Path, description = "Folder ID"),
        ListQuery
    ),
    responses(
        (status = 200, description = "Folder content", body = Vec<FileEntry>),
        (status = 404, description = "Folder not found")
    )
)]
pub async fn list_folder(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<Vec<FileEntry>>>, ApiError> {
    let entries = list_entries(&state, &id, query.text.as_deref())?;
    Ok(Json(ApiResponse::new(entries)))
}

/// PUT /files/:id - Rename an entry.
#[utoipa::path(
    put,
    path = "/files/{id}",
    tag = "files",
    params(
        ("id" = String, Path, description = "File or folder ID")
    ),
    request_body = RenameRequest,
    responses(
        (status = 200, description = "Renamed entry", body = ItemResult),
        (status = 400, description = "Unsupported operation"),
        (status = 404, description = "Entry not found"),
        (status = 409, description = "Name already taken")
    )
)]
pub async fn update_file(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<RenameRequest>,
) -> Result<Json<ApiResponse<ItemResult>>, ApiError> {
    if req.operation != "rename" {
        return Err(ApiError::bad_request("operation is not supported"));
    }

    let new_id = state.drive.move_to(&id, "", req.name.trim())?;
    tracing::info!(from = %id, to = %new_id, "Renamed entry");

    Ok(Json(ApiResponse::new(item_result(&state, &new_id)?)))
}

/// PUT /files - Move or copy entries into a folder.
#[utoipa::path(
    put,
    path = "/files",
    tag = "files",
    request_body = TransferRequest,
    responses(
        (status = 200, description = "New locations", body = Vec<ItemResult>),
        (status = 400, description = "Unsupported operation"),
        (status = 404, description = "Entry or target not found"),
        (status = 409, description = "Name already taken in target")
    )
)]
pub async fn transfer_files(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<TransferRequest>,
) -> Result<Json<ApiResponse<Vec<ItemResult>>>, ApiError> {
    let copy = match req.operation.as_str() {
        "move" => false,
        "copy" => true,
        _ => return Err(ApiError::bad_request("operation is not supported")),
    };

    let mut results = Vec::with_capacity(req.ids.len());
    for id in &req.ids {
        let new_id = if copy {
            state.drive.copy(id, &req.target)?
        } else {
            state.drive.move_to(id, &req.target, "")?
        };
        tracing::info!(
            operation = %req.operation,
            from = %id,
            to = %new_id,
            "Transferred entry"
        );
        results.push(item_result(&state, &new_id)?);
    }

    Ok(Json(ApiResponse::new(results)))
}

/// POST /files/:id - Create an empty file or a folder.
#[utoipa::path(
    post,
    path = "/files/{id}",
    tag = "files",
    params(
        ("id" = String, Path, description = "Parent folder ID")
    ),
    request_body = CreateRequest,
    responses(
        (status = 200, description = "Created entry", body = ItemResult),
        (status = 404, description = "Parent folder not found"),
        (status = 409, description = "Name already taken")
    )
)]
pub async fn create_file(
    State(state): State<Arc<AppState>>,
    Path(parent): Path<String>,
    ValidatedJson(req): ValidatedJson<CreateRequest>,
) -> Result<Json<ApiResponse<ItemResult>>, ApiError> {
    let is_folder = match req.kind.as_str() {
        "folder" => true,
        "file" => false,
        _ => return Err(ApiError::bad_request("type must be 'file' or 'folder'")),
    };

    let id = state.drive.make(&parent, req.name.trim(), is_folder)?;
    tracing::info!(id = %id, is_folder, "Created entry");

    Ok(Json(ApiResponse::new(item_result(&state, &id)?)))
}

/// DELETE /files - Remove entries.
#[utoipa::path(
    delete,
    path = "/files",
    tag = "files",
    request_body = DeleteRequest,
    responses(
        (status = 200, description = "Removed IDs", body = Vec<String>),
        (status = 404, description = "Entry not found")
    )
)]
pub async fn delete_files(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<DeleteRequest>,
) -> Result<Json<ApiResponse<Vec<String>>>, ApiError> {
    let mut removed = Vec::with_capacity(req.ids.len());
    for id in req.ids {
        state.drive.remove(&id)?;
        tracing::info!(id = %id, "Removed entry");
        removed.push(id);
    }

    Ok(Json(ApiResponse::new(removed)))
}

/// GET /direct - Stream file content.
#[utoipa::path(
    get,
    path = "/direct",
    tag = "files",
    params(DirectQuery),
    responses(
        (status = 200, description = "File content", content_type = "application/octet-stream"),
        (status = 404, description = "File not found")
    )
)]
pub async fn direct_download(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DirectQuery>,
) -> Result<Response<Body>, ApiError> {
    let info = state.drive.info(&query.id)?;
    if info.is_folder() {
        return Err(ApiError::unprocessable(format!("{} is a folder", info.id)));
    }
    let file = state.drive.read(&info.id)?;

    let content_type = mime_guess::from_path(&info.name)
        .first_or_octet_stream()
        .to_string();
    let disposition = if query.download.is_some() {
        "attachment"
    } else {
        "inline"
    };

    let stream = ReaderStream::new(tokio::fs::File::from_std(file));
    Response::builder()
        .header(header::CONTENT_TYPE, content_type)
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition_header(disposition, &info.name),
        )
        .header(header::CONTENT_LENGTH, info.size)
        .body(Body::from_stream(stream))
        .map_err(|e| {
            tracing::error!("Failed to build response: {}", e);
            ApiError::internal("Failed to build response")
        })
}

/// POST /upload - Upload a file.
///
/// Request body: multipart/form-data with a "file" field and an optional
/// "name" field. A name containing `/` creates the intermediate folders.
#[utoipa::path(
    post,
    path = "/upload",
    tag = "files",
    params(UploadQuery),
    responses(
        (status = 200, description = "File uploaded", body = ItemResult),
        (status = 400, description = "No file provided"),
        (status = 409, description = "Name already taken"),
        (status = 413, description = "File too large")
    )
)]
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    Query(query): Query<UploadQuery>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<ItemResult>>, ApiError> {
    let mut file_name: Option<String> = None;
    let mut name: Option<String> = None;
    let mut content: Option<Vec<u8>> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::error!("Failed to read multipart field: {}", e);
        ApiError::bad_request("Invalid multipart data")
    })? {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "file" => {
                file_name = field.file_name().map(|s| s.to_string());
                content = Some(
                    field
                        .bytes()
                        .await
                        .map_err(|e| {
                            tracing::error!("Failed to read file content: {}", e);
                            ApiError::bad_request("Failed to read file")
                        })?
                        .to_vec(),
                );
            }
            "name" => {
                name = Some(field.text().await.map_err(|e| {
                    tracing::error!("Failed to read name: {}", e);
                    ApiError::bad_request("Invalid name")
                })?);
            }
            _ => {}
        }
    }

    let content = content.ok_or_else(|| ApiError::bad_request("No file provided"))?;
    if content.len() > state.max_upload_size {
        let max_mb = state.max_upload_size / 1024 / 1024;
        return Err(ApiError::payload_too_large(format!(
            "File too large (max {}MB)",
            max_mb
        )));
    }

    let name = name
        .filter(|n| !n.trim().is_empty())
        .or(file_name)
        .ok_or_else(|| ApiError::bad_request("No file name provided"))?;
    let mut segments: Vec<&str> = name.split('/').filter(|s| !s.is_empty()).collect();
    let leaf = segments
        .pop()
        .ok_or_else(|| ApiError::bad_request("No file name provided"))?;

    let mut base = query.id.unwrap_or_else(|| "/".to_string());
    for folder in segments {
        let candidate = join_id(&base, folder);
        base = if state.drive.exists(&candidate) {
            candidate
        } else {
            state.drive.make(&base, folder, true)?
        };
    }

    let id = state.drive.make(&base, leaf, false)?;
    if let Err(e) = state.drive.write(&id, &content) {
        let _ = state.drive.remove(&id);
        return Err(e.into());
    }
    tracing::info!(id = %id, size = content.len(), "Uploaded file");

    Ok(Json(ApiResponse::new(item_result(&state, &id)?)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_disposition_ascii() {
        assert_eq!(
            content_disposition_header("attachment", "report.pdf"),
            "attachment; filename=\"report.pdf\""
        );
        assert_eq!(
            content_disposition_header("inline", "a b.txt"),
            "inline; filename=\"a b.txt\""
        );
    }

    #[test]
    fn test_content_disposition_escapes() {
        let header = content_disposition_header("attachment", "evil\"\r\nname.txt");
        assert!(!header.contains('\r'));
        assert!(!header.contains('\n'));
        assert!(header.starts_with("attachment; filename=\"evil_name.txt\""));
        assert!(header.contains("filename*=UTF-8''evil%22%0D%0Aname.txt"));
    }

    #[test]
    fn test_content_disposition_unicode() {
        let header = content_disposition_header("inline", "写真.jpg");
        assert_eq!(
            header,
            "inline; filename=\"写真.jpg\"; filename*=UTF-8''%E5%86%99%E7%9C%9F.jpg"
        );
    }
}
