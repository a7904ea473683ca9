//! API handlers for the Web UI.

pub mod file;
pub mod info;
pub mod preview;

pub use file::*;
pub use info::*;
pub use preview::*;

use std::sync::Arc;

use crate::config::Config;
use crate::file::{Drive, LocalDrive};
use crate::preview::PreviewService;
use crate::Result;

/// Application state shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    /// File tree.
    pub drive: Arc<dyn Drive>,
    /// Preview engine bound to the same drive.
    pub previews: PreviewService,
    /// Upload limit in bytes.
    pub max_upload_size: usize,
}

impl AppState {
    /// Create the state over an existing drive.
    pub fn new(drive: Arc<dyn Drive>, config: &Config) -> Result<Self> {
        let previews = PreviewService::new(drive.clone(), &config.preview)?;
        Ok(Self {
            drive,
            previews,
            max_upload_size: config.files.max_upload_bytes(),
        })
    }

    /// Create the state over a local drive at the configured root.
    pub fn from_config(config: &Config) -> Result<Self> {
        let drive = LocalDrive::new(&config.files.root)?;
        tracing::info!("File storage initialized at: {}", config.files.root);
        Self::new(Arc::new(drive), config)
    }
}
