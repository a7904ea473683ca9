use thiserror::Error;

use crate::file::FileKind;

/// Why a preview could not be generated.
///
/// Every variant ends up as a placeholder artifact; none of them is retried.
#[derive(Error, Debug)]
pub enum PreviewError {
    #[error("failed to decode source image: {0}")]
    Decode(#[source] image::ImageError),

    #[error("failed to encode thumbnail: {0}")]
    Encode(#[source] image::ImageError),

    #[error("preview service request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("preview service returned {0}")]
    Status(u16),

    #[error("preview service returned an empty body")]
    EmptyBody,

    #[error("failed to persist preview: {0}")]
    Persist(#[from] std::io::Error),

    #[error("failed to read source: {0}")]
    Source(String),

    #[error("no generator for {} files", .0.as_str())]
    Unsupported(FileKind),

    #[error("generation task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
