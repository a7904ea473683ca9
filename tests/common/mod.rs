//! Test helpers for the Web API integration tests.
//!
//! Provides a temporary file tree, a temporary icon set and an axum-test
//! server wired to both.

#![allow(dead_code)]

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Multipart, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::Router;
use axum_test::TestServer;
use image::{ImageBuffer, Rgb};
use tempfile::TempDir;
use tokio::net::TcpListener;

use filedeck::web::handlers::AppState;
use filedeck::web::router::create_router;
use filedeck::Config;

/// Icons written into every test icon set.
pub const ICONS: [&str; 4] = ["file.svg", "jpg.svg", "pdf.svg", "unavailable.svg"];

/// Content of a test icon, distinct per name.
pub fn icon_content(name: &str) -> String {
    format!("<svg id=\"{name}\"/>")
}

/// Temporary file tree and icon set.
pub struct TestEnv {
    files: TempDir,
    icons: TempDir,
    pub config: Config,
}

impl TestEnv {
    pub fn new() -> Self {
        let files = TempDir::new().expect("Failed to create file root");
        let icons = TempDir::new().expect("Failed to create icon root");

        let big = icons.path().join("big");
        fs::create_dir_all(&big).unwrap();
        for name in ICONS {
            fs::write(big.join(name), icon_content(name)).unwrap();
        }

        let mut config = Config::default();
        config.files.root = files.path().to_string_lossy().into_owned();
        config.files.max_upload_size_mb = 1;
        config.preview.icons_path = icons.path().to_string_lossy().into_owned();
        config.preview.poll_interval_ms = 10;
        config.preview.poll_timeout_secs = 0;

        Self {
            files,
            icons,
            config,
        }
    }

    /// Use an external rendering service.
    pub fn with_service(mut self, url: &str) -> Self {
        self.config.preview.service_url = url.to_string();
        self
    }

    pub fn root(&self) -> &Path {
        self.files.path()
    }

    pub fn icons_root(&self) -> &Path {
        self.icons.path()
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.root().join(rel)
    }

    pub fn write(&self, rel: &str, content: &[u8]) {
        let path = self.path(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    pub fn write_jpeg(&self, rel: &str, width: u32, height: u32) {
        let path = self.path(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        let img: ImageBuffer<Rgb<u8>, Vec<u8>> =
            ImageBuffer::from_fn(width, height, |x, y| Rgb([x as u8, y as u8, 128]));
        img.save(path).unwrap();
    }

    pub fn mkdir(&self, rel: &str) {
        fs::create_dir_all(self.path(rel)).unwrap();
    }

    /// Build the application state and a test server over this environment.
    pub fn server(&self) -> (TestServer, Arc<AppState>) {
        let state =
            Arc::new(AppState::from_config(&self.config).expect("Failed to create app state"));
        let router = create_router(state.clone(), &self.config.server.cors_origins);
        let server = TestServer::new(router).expect("Failed to create test server");
        (server, state)
    }
}

/// URL path segment for a file id.
pub fn encode_id(id: &str) -> String {
    urlencoding::encode(id).into_owned()
}

/// Stand-in for the external rendering service.
pub struct FakeRenderer {
    pub addr: SocketAddr,
    pub requests: AtomicUsize,
    pub body: Vec<u8>,
    delay: Duration,
}

impl FakeRenderer {
    pub fn url(&self) -> String {
        format!("http://{}/render", self.addr)
    }

    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

async fn render(State(renderer): State<Arc<FakeRenderer>>, mut multipart: Multipart) -> impl IntoResponse {
    let mut has_file = false;
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        let _ = field.bytes().await;
        has_file |= name == "file";
    }
    renderer.requests.fetch_add(1, Ordering::SeqCst);
    tokio::time::sleep(renderer.delay).await;

    if !has_file {
        return (StatusCode::BAD_REQUEST, Vec::new()).into_response();
    }
    ([(header::CONTENT_TYPE, "image/png")], renderer.body.clone()).into_response()
}

/// Start a rendering service answering with a fixed PNG body.
pub async fn spawn_renderer(delay: Duration) -> Arc<FakeRenderer> {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let mut body = Vec::new();
    let img: ImageBuffer<Rgb<u8>, Vec<u8>> = ImageBuffer::from_pixel(8, 8, Rgb([1, 2, 3]));
    img.write_to(&mut std::io::Cursor::new(&mut body), image::ImageFormat::Png)
        .unwrap();

    let renderer = Arc::new(FakeRenderer {
        addr,
        requests: AtomicUsize::new(0),
        body,
        delay,
    });
    let app = Router::new()
        .route("/render", post(render))
        .with_state(renderer.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    renderer
}
