//! Router configuration for Web API.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use super::dto::{
    AudioInfo, CreateRequest, DeleteRequest, FileEntry, FolderInfo, ImageInfo, ItemResult,
    MetaInfo, RenameRequest, StorageInfo, TransferRequest,
};
use super::handlers::{
    create_file, delete_files, direct_download, get_icon, get_info, get_preview,
    get_storage_info, list_folder, list_root, transfer_files, update_file, upload_file, AppState,
};
use super::middleware::create_cors_layer;

/// Room for multipart boundaries and the `name` field on top of the file.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// OpenAPI document of the Web API.
#[derive(OpenApi)]
#[openapi(
    info(title = "filedeck", description = "Web file manager API"),
    paths(
        super::handlers::file::list_root,
        super::handlers::file::list_folder,
        super::handlers::file::update_file,
        super::handlers::file::transfer_files,
        super::handlers::file::create_file,
        super::handlers::file::delete_files,
        super::handlers::file::direct_download,
        super::handlers::file::upload_file,
        super::handlers::info::get_info,
        super::handlers::info::get_storage_info,
        super::handlers::preview::get_preview,
        super::handlers::preview::get_icon,
    ),
    components(schemas(
        FileEntry,
        ItemResult,
        FolderInfo,
        ImageInfo,
        AudioInfo,
        MetaInfo,
        StorageInfo,
        RenameRequest,
        TransferRequest,
        CreateRequest,
        DeleteRequest,
    )),
    tags(
        (name = "files", description = "File tree operations"),
        (name = "preview", description = "Thumbnails and icons")
    )
)]
pub struct ApiDoc;

/// Create the main API router.
pub fn create_router(app_state: Arc<AppState>, cors_origins: &[String]) -> Router {
    let body_limit = app_state.max_upload_size + MULTIPART_OVERHEAD;

    let file_routes = Router::new()
        .route(
            "/files",
            get(list_root).put(transfer_files).delete(delete_files),
        )
        .route(
            "/files/:id",
            get(list_folder).put(update_file).post(create_file),
        )
        .route("/direct", get(direct_download))
        .route("/upload", post(upload_file))
        .route("/info", get(get_storage_info))
        .route("/info/:id", get(get_info));

    let preview_routes = Router::new()
        .route("/preview", get(get_preview))
        .route("/icons/:size/:name", get(get_icon));

    Router::new()
        .merge(file_routes)
        .merge(preview_routes)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(cors_origins)),
        )
        .with_state(app_state)
}

/// Create a health check router.
pub fn create_health_router() -> Router {
    Router::new().route("/health", get(health_check))
}

/// Health check handler.
async fn health_check() -> &'static str {
    "OK"
}

/// Create the router serving the OpenAPI document.
pub fn create_openapi_router() -> Router {
    Router::new().route("/api-docs/openapi.json", get(openapi_json))
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
