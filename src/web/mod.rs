//! Web API module for filedeck.
//!
//! JSON endpoints for browsing and editing the file tree, plus the image
//! endpoints (`/preview`, `/icons`) backed by the preview engine.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod server;

pub use error::ApiError;
pub use handlers::AppState;
pub use router::create_router;
pub use server::WebServer;
