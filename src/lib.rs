//! filedeck - web file manager backend
//!
//! A JSON API over a directory tree, with a thumbnail preview engine that
//! caches generated previews next to their sources.

pub mod config;
pub mod error;
pub mod file;
pub mod logging;
pub mod preview;
pub mod web;

pub use config::Config;
pub use error::{FiledeckError, Result};
pub use file::{Drive, FileKind, FileMetadata, LocalDrive};
pub use preview::{PreviewOutcome, PreviewService};
pub use web::WebServer;
