//! Thumbnail preview engine.
//!
//! A preview request flows through:
//! - [`MetadataPoller`]: resolves the file id, riding out a lagging drive
//! - [`ArtifactPath`]: locates the cached artifact under `.preview/`
//! - [`Generator`]: local Lanczos resize or the remote rendering service
//! - [`IconResolver`]: the fallback whenever no real preview can be served
//!
//! [`PreviewService`] ties these together.

mod artifact;
mod error;
mod flight;
mod icon;
mod local;
mod poller;
mod remote;
mod service;

pub use artifact::{ArtifactPath, ArtifactState, PreviewFormat, PLACEHOLDER_FORMAT, PREVIEW_DIR};
pub use error::PreviewError;
pub use flight::{FlightGuard, InFlight};
pub use icon::{sanitize, IconResolver, DEFAULT_ICON, DEFAULT_ICON_SIZE, UNAVAILABLE_ICON};
pub use local::generate_thumbnail;
pub use poller::MetadataPoller;
pub use remote::RemoteRenderer;
pub use service::{Generator, PreviewLimits, PreviewOutcome, PreviewService};

/// Width used when the request carries none (or an unusable one).
pub const DEFAULT_WIDTH: u32 = 214;

/// Height used when the request carries none (or an unusable one).
pub const DEFAULT_HEIGHT: u32 = 163;

/// Identity of a cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PreviewKey {
    /// Canonical file id.
    pub id: String,
    /// Requested width.
    pub width: u32,
    /// Requested height.
    pub height: u32,
}

impl PreviewKey {
    /// Create a key for `id` at `width x height`.
    pub fn new(id: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            id: id.into(),
            width,
            height,
        }
    }
}

/// Parse a dimension query value, falling back to `default` when the value
/// is absent, not a number, or zero.
pub fn parse_dimension(value: Option<&str>, default: u32) -> u32 {
    value
        .and_then(|v| v.trim().parse::<u32>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(default)
}
