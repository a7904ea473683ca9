//! Web API Preview Tests
//!
//! Integration tests for `/preview` and `/icons`.

mod common;

use std::fs;
use std::time::Duration;

use axum::http::{header, StatusCode};
use common::{icon_content, spawn_renderer, TestEnv};

fn content_type(response: &axum_test::TestResponse) -> String {
    response
        .header(header::CONTENT_TYPE)
        .to_str()
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn test_preview_generates_once_and_caches() {
    let env = TestEnv::new();
    env.write_jpeg("photos/a.jpg", 320, 240);
    let (server, state) = env.server();

    let first = server
        .get("/preview?id=%2Fphotos%2Fa.jpg&width=100&height=100")
        .await;
    first.assert_status_ok();
    assert_eq!(content_type(&first), "image/jpeg");

    let artifact = env.path("photos/.preview/a.jpg___100x100.jpg");
    assert!(artifact.is_file());
    let thumb = image::load_from_memory(first.as_bytes()).unwrap();
    assert_eq!((thumb.width(), thumb.height()), (100, 100));
    let modified = fs::metadata(&artifact).unwrap().modified().unwrap();

    let second = server
        .get("/preview?id=%2Fphotos%2Fa.jpg&width=100&height=100")
        .await;
    second.assert_status_ok();
    assert_eq!(second.as_bytes(), first.as_bytes());
    assert_eq!(fs::metadata(&artifact).unwrap().modified().unwrap(), modified);
    assert_eq!(state.previews.generation_count(), 1);

    // The cache folder stays out of listings.
    let listing: serde_json::Value = server.get("/files/%2Fphotos").await.json();
    assert_eq!(listing["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_preview_default_dimensions() {
    let env = TestEnv::new();
    env.write_jpeg("a.jpg", 400, 300);
    let (server, state) = env.server();

    let omitted = server.get("/preview?id=%2Fa.jpg").await;
    let garbage = server.get("/preview?id=%2Fa.jpg&width=abc&height=0").await;

    omitted.assert_status_ok();
    garbage.assert_status_ok();
    assert_eq!(omitted.as_bytes(), garbage.as_bytes());
    assert!(env.path(".preview/a.jpg___214x163.jpg").is_file());
    assert_eq!(state.previews.generation_count(), 1);

    let thumb = image::load_from_memory(omitted.as_bytes()).unwrap();
    assert_eq!((thumb.width(), thumb.height()), (214, 163));
}

#[tokio::test]
async fn test_preview_over_dimension_limit() {
    let env = TestEnv::new();
    env.write_jpeg("a.jpg", 50, 50);
    let (server, state) = env.server();

    let response = server.get("/preview?id=%2Fa.jpg&width=3000").await;

    response.assert_status_ok();
    assert_eq!(content_type(&response), "image/svg+xml");
    assert_eq!(response.text(), icon_content("jpg.svg"));
    assert!(!env.path(".preview").exists());
    assert_eq!(state.previews.generation_count(), 0);
}

#[tokio::test]
async fn test_preview_over_size_limit() {
    let env = TestEnv::new();
    env.mkdir("photos");
    fs::File::create(env.path("photos/huge.jpg"))
        .unwrap()
        .set_len(60_000_000)
        .unwrap();
    let (server, _) = env.server();

    let response = server.get("/preview?id=%2Fphotos%2Fhuge.jpg").await;

    response.assert_status_ok();
    assert_eq!(response.text(), icon_content("jpg.svg"));
    assert!(!env.path("photos/.preview").exists());
}

#[tokio::test]
async fn test_preview_failure_placeholder() {
    let env = TestEnv::new();
    env.write("broken.jpg", b"not really a jpeg");
    let (server, _) = env.server();

    let first = server.get("/preview?id=%2Fbroken.jpg&width=64&height=64").await;
    first.assert_status_ok();
    assert_eq!(first.text(), icon_content("jpg.svg"));

    let placeholder = env.path(".preview/broken.jpg___64x64.jpg");
    assert_eq!(fs::metadata(&placeholder).unwrap().len(), 0);

    // Fixing the source does not trigger a retry.
    env.write_jpeg("broken.jpg", 80, 80);
    let second = server.get("/preview?id=%2Fbroken.jpg&width=64&height=64").await;
    assert_eq!(second.text(), icon_content("jpg.svg"));
    assert_eq!(fs::metadata(&placeholder).unwrap().len(), 0);
}

#[tokio::test]
async fn test_preview_unknown_or_missing_id() {
    let env = TestEnv::new();
    let (server, _) = env.server();

    let response = server.get("/preview?id=%2Fnope.jpg").await;
    response.assert_status_ok();
    assert_eq!(response.text(), icon_content("unavailable.svg"));

    let response = server.get("/preview").await;
    response.assert_status_ok();
    assert_eq!(response.text(), icon_content("unavailable.svg"));
}

#[tokio::test]
async fn test_preview_folder_and_root_stay_on_disk_untouched() {
    let env = TestEnv::new();
    env.write_jpeg("photos/a.jpg", 20, 20);
    let (server, state) = env.server();

    let response = server.get("/preview?id=%2Fphotos").await;
    response.assert_status_ok();
    assert_eq!(response.text(), icon_content("file.svg"));

    let response = server.get("/preview?id=%2F").await;
    response.assert_status_ok();
    assert_eq!(response.text(), icon_content("file.svg"));

    let root_name = env.root().file_name().unwrap().to_string_lossy().into_owned();
    let outside = env
        .root()
        .parent()
        .unwrap()
        .join(".preview")
        .join(format!("{root_name}___214x163.jpg"));
    assert!(!outside.exists());
    assert!(!env.path(".preview").exists());
    assert!(!env.path("photos/.preview").exists());
    assert_eq!(state.previews.generation_count(), 0);
}

#[tokio::test]
async fn test_preview_document_without_service() {
    let env = TestEnv::new();
    env.write("docs/report.pdf", b"%PDF-1.4");
    let (server, _) = env.server();

    let response = server.get("/preview?id=%2Fdocs%2Freport.pdf").await;

    assert_eq!(response.text(), icon_content("pdf.svg"));
    assert!(env.path("docs/.preview/report.pdf___214x163.jpg").is_file());
}

#[tokio::test]
async fn test_preview_via_rendering_service() {
    let renderer = spawn_renderer(Duration::ZERO).await;
    let env = TestEnv::new().with_service(&renderer.url());
    env.write("docs/report.pdf", b"%PDF-1.4 some content");
    let (server, _) = env.server();

    let response = server
        .get("/preview?id=%2Fdocs%2Freport.pdf&width=120&height=90")
        .await;

    response.assert_status_ok();
    assert_eq!(content_type(&response), "image/png");
    assert_eq!(response.as_bytes().as_ref(), renderer.body.as_slice());
    assert!(env.path("docs/.preview/report.pdf___120x90.png").is_file());

    let again = server
        .get("/preview?id=%2Fdocs%2Freport.pdf&width=120&height=90")
        .await;
    assert_eq!(again.as_bytes(), response.as_bytes());
    assert_eq!(renderer.requests(), 1);
}

#[tokio::test]
async fn test_preview_service_failure_placeholder() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let env = TestEnv::new().with_service(&format!("http://{addr}/render"));
    env.write("docs/report.pdf", b"%PDF-1.4");
    let (server, _) = env.server();

    let response = server.get("/preview?id=%2Fdocs%2Freport.pdf").await;

    response.assert_status_ok();
    assert_eq!(response.text(), icon_content("pdf.svg"));
    let placeholder = env.path("docs/.preview/report.pdf___214x163.jpg");
    assert_eq!(fs::metadata(placeholder).unwrap().len(), 0);
}

#[tokio::test]
async fn test_icons() {
    let env = TestEnv::new();
    let (server, _) = env.server();

    let response = server.get("/icons/big/pdf.svg").await;
    response.assert_status_ok();
    assert_eq!(content_type(&response), "image/svg+xml");
    assert_eq!(response.text(), icon_content("pdf.svg"));

    let response = server.get("/icons/big/doc.svg").await;
    assert_eq!(response.text(), icon_content("file.svg"));
}

#[tokio::test]
async fn test_icons_sanitize_traversal() {
    let env = TestEnv::new();
    fs::write(env.icons_root().join("secret.svg"), "secret").unwrap();
    let (server, _) = env.server();

    let response = server.get("/icons/big/..%2F..%2Fetc%2Fpasswd").await;
    response.assert_status_ok();
    assert_eq!(response.text(), icon_content("file.svg"));

    let response = server.get("/icons/..%2F/secret.svg").await;
    response.assert_status_ok();
    assert_ne!(response.text(), "secret");
}

#[tokio::test]
async fn test_icons_unknown_size_bucket() {
    let env = TestEnv::new();
    let (server, _) = env.server();

    let response = server.get("/icons/..big/pdf.svg").await;
    response.assert_status_ok();
    assert_eq!(response.text(), icon_content("pdf.svg"));

    let response = server.get("/icons/small/pdf.svg").await;
    assert_eq!(response.text(), icon_content("pdf.svg"));
}

#[tokio::test]
async fn test_icons_missing_set() {
    let env = TestEnv::new();
    fs::remove_dir_all(env.icons_root().join("big")).unwrap();
    let (server, _) = env.server();

    let response = server.get("/icons/small/pdf.svg").await;

    response.assert_status(StatusCode::OK);
    assert_eq!(content_type(&response), "image/svg+xml");
    let body = response.text();
    assert!(body.starts_with("<svg"));
    assert!(body.contains("fill=\"#e0e0e0\""));
    assert!(body.ends_with("</svg>"));
}
