//! Configuration module for filedeck.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::{FiledeckError, Result};

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// CORS allowed origins.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3200
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: vec![],
        }
    }
}

/// File tree configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct FilesConfig {
    /// Root directory of the managed file tree.
    #[serde(default = "default_root")]
    pub root: String,
    /// Maximum upload size in megabytes.
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size_mb: u64,
}

fn default_root() -> String {
    "data/files".to_string()
}

fn default_max_upload_size() -> u64 {
    10
}

impl FilesConfig {
    /// Upload limit in bytes.
    pub fn max_upload_bytes(&self) -> usize {
        (self.max_upload_size_mb * 1024 * 1024) as usize
    }
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            max_upload_size_mb: default_max_upload_size(),
        }
    }
}

/// Preview engine configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PreviewConfig {
    /// URL of the external rendering service. Empty disables remote rendering.
    #[serde(default)]
    pub service_url: String,
    /// Directory holding the `<size>/<name>.svg` icon set.
    #[serde(default = "default_icons_path")]
    pub icons_path: String,
    /// Sources larger than this are never rendered.
    #[serde(default = "default_max_source_bytes")]
    pub max_source_bytes: u64,
    /// Largest accepted width or height.
    #[serde(default = "default_max_dimension")]
    pub max_dimension: u32,
    /// Metadata poll interval in milliseconds.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
    /// Metadata poll deadline in seconds.
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_secs: u64,
    /// Total request timeout for the rendering service in seconds.
    #[serde(default = "default_service_timeout")]
    pub service_timeout_secs: u64,
}

fn default_icons_path() -> String {
    "icons".to_string()
}

fn default_max_source_bytes() -> u64 {
    50 * 1000 * 1000
}

fn default_max_dimension() -> u32 {
    2000
}

fn default_poll_interval() -> u64 {
    100
}

fn default_poll_timeout() -> u64 {
    10
}

fn default_service_timeout() -> u64 {
    60
}

impl PreviewConfig {
    /// Whether an external rendering service is configured.
    pub fn has_service(&self) -> bool {
        !self.service_url.trim().is_empty()
    }

    /// Metadata poll interval.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Metadata poll deadline.
    pub fn poll_timeout(&self) -> Duration {
        Duration::from_secs(self.poll_timeout_secs)
    }

    /// Rendering service request timeout.
    pub fn service_timeout(&self) -> Duration {
        Duration::from_secs(self.service_timeout_secs)
    }
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            service_url: String::new(),
            icons_path: default_icons_path(),
            max_source_bytes: default_max_source_bytes(),
            max_dimension: default_max_dimension(),
            poll_interval_ms: default_poll_interval(),
            poll_timeout_secs: default_poll_timeout(),
            service_timeout_secs: default_service_timeout(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/filedeck.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// File tree configuration.
    #[serde(default)]
    pub files: FilesConfig,
    /// Preview engine configuration.
    #[serde(default)]
    pub preview: PreviewConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(FiledeckError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| FiledeckError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `FILEDECK_ROOT`: root of the managed file tree
    /// - `FILEDECK_PREVIEW_URL`: external rendering service URL
    /// - `FILEDECK_PORT`: listen port
    pub fn apply_env_overrides(&mut self) {
        if let Ok(root) = std::env::var("FILEDECK_ROOT") {
            if !root.is_empty() {
                self.files.root = root;
            }
        }
        if let Ok(url) = std::env::var("FILEDECK_PREVIEW_URL") {
            self.preview.service_url = url;
        }
        if let Ok(port) = std::env::var("FILEDECK_PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!("Ignoring invalid FILEDECK_PORT value: {}", port),
            }
        }
    }

    /// Validate the configuration.
    ///
    /// Returns an error if:
    /// - the preview service URL is set but is not an http(s) URL
    /// - a preview limit or the poll interval is zero
    pub fn validate(&self) -> Result<()> {
        if self.preview.has_service() {
            let url = url::Url::parse(self.preview.service_url.trim()).map_err(|e| {
                FiledeckError::Config(format!("invalid preview service URL: {e}"))
            })?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(FiledeckError::Config(format!(
                    "unsupported preview service scheme: {}",
                    url.scheme()
                )));
            }
        }
        if self.preview.max_source_bytes == 0 || self.preview.max_dimension == 0 {
            return Err(FiledeckError::Config(
                "preview limits must be greater than zero".to_string(),
            ));
        }
        if self.preview.poll_interval_ms == 0 {
            return Err(FiledeckError::Config(
                "poll_interval_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
