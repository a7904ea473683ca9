//! Preview and icon handlers.
//!
//! Neither endpoint answers with a JSON error: whatever goes wrong, the
//! client gets an image it can put in the layout.

use axum::{
    body::Body,
    extract::{Path, Query, Request, State},
    http::header,
    response::{IntoResponse, Response},
};
use std::path::Path as FsPath;
use std::sync::Arc;
use tower::ServiceExt;
use tower_http::services::ServeFile;

use crate::preview::{parse_dimension, PreviewOutcome, DEFAULT_HEIGHT, DEFAULT_WIDTH};
use crate::web::dto::PreviewQuery;
use crate::web::handlers::AppState;

/// Served when even the generic icon is missing from the icon set.
const BUILTIN_ICON: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="48" height="48" viewBox="0 0 48 48"><path d="M12 4h16l10 10v30H12z" fill="#e0e0e0" stroke="#9e9e9e"/></svg>"##;

/// Serve a file from disk, honoring conditional and range headers.
async fn serve_path(path: &FsPath, request: Request) -> Response {
    if !path.is_file() {
        tracing::warn!(path = %path.display(), "Icon missing, serving built-in icon");
        return ([(header::CONTENT_TYPE, "image/svg+xml")], BUILTIN_ICON).into_response();
    }

    match ServeFile::new(path).oneshot(request).await {
        Ok(response) => response.map(Body::new),
        Err(never) => match never {},
    }
}

/// GET /preview - Thumbnail of a file.
#[utoipa::path(
    get,
    path = "/preview",
    tag = "preview",
    params(PreviewQuery),
    responses(
        (status = 200, description = "JPEG or PNG preview, or an SVG icon", content_type = "image/*")
    )
)]
pub async fn get_preview(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PreviewQuery>,
    request: Request,
) -> Response {
    let id = query.id.as_deref().map(str::trim).filter(|id| !id.is_empty());

    let outcome = match id {
        Some(id) => {
            let width = parse_dimension(query.width.as_deref(), DEFAULT_WIDTH);
            let height = parse_dimension(query.height.as_deref(), DEFAULT_HEIGHT);
            state.previews.preview(id, width, height).await
        }
        None => PreviewOutcome::Icon(state.previews.icons().fallback(None)),
    };

    if let PreviewOutcome::Artifact { path, .. } = &outcome {
        tracing::debug!(path = %path.display(), "Serving preview");
    }
    serve_path(outcome.path(), request).await
}

/// GET /icons/:size/:name - Static icon asset.
#[utoipa::path(
    get,
    path = "/icons/{size}/{name}",
    tag = "preview",
    params(
        ("size" = String, Path, description = "Size bucket, e.g. big"),
        ("name" = String, Path, description = "Icon file name, e.g. pdf.svg")
    ),
    responses(
        (status = 200, description = "Icon", content_type = "image/svg+xml")
    )
)]
pub async fn get_icon(
    State(state): State<Arc<AppState>>,
    Path((size, name)): Path<(String, String)>,
    request: Request,
) -> Response {
    let path = state.previews.icons().resolve(&name, &size);
    serve_path(&path, request).await
}
