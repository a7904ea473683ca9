//! Client for an external rendering service.
//!
//! The service receives a multipart form with `width`, `height`, `name` and
//! the `file` content, and answers with the rendered image. The file part is
//! fed through an in-memory pipe: a background task copies the source into
//! the write half while reqwest drains the read half onto the wire, so the
//! source is never held in memory as a whole and a slow upstream throttles
//! the copy. The response body is streamed to disk the same way.

use std::time::Duration;

use futures::StreamExt;
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, Response};
use tokio::io::{AsyncRead, AsyncWriteExt};
use tokio_util::io::ReaderStream;
use url::Url;

use super::{ArtifactPath, PreviewError, PreviewFormat};
use crate::{FiledeckError, Result};

/// Bytes buffered between the source reader and the request body.
const PIPE_CAPACITY: usize = 64 * 1024;

/// Connect timeout for the rendering service.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// User agent sent to the rendering service.
const USER_AGENT: &str = concat!("filedeck/", env!("CARGO_PKG_VERSION"));

/// Remote preview renderer.
#[derive(Debug, Clone)]
pub struct RemoteRenderer {
    client: Client,
    endpoint: Url,
}

impl RemoteRenderer {
    /// Create a renderer posting to `endpoint`.
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self> {
        let endpoint = Url::parse(endpoint.trim())
            .map_err(|e| FiledeckError::Config(format!("invalid preview service URL: {e}")))?;

        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| FiledeckError::Config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { client, endpoint })
    }

    /// URL the form is posted to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Send `source` to the service and store the answer as the artifact.
    ///
    /// The artifact extension follows the response content type: exactly
    /// `image/png` gives `.png`, anything else `.jpg`.
    pub async fn render<R>(
        &self,
        source: R,
        target: &ArtifactPath,
        name: &str,
        width: u32,
        height: u32,
    ) -> std::result::Result<PreviewFormat, PreviewError>
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        let (mut pipe_writer, pipe_reader) = tokio::io::duplex(PIPE_CAPACITY);
        let pump = tokio::spawn(async move {
            let mut source = source;
            let copied = tokio::io::copy(&mut source, &mut pipe_writer).await;
            // EOF for the request body, also after a failed read.
            let _ = pipe_writer.shutdown().await;
            copied
        });

        let file = Part::stream(Body::wrap_stream(ReaderStream::new(pipe_reader)))
            .file_name(name.to_string());
        let form = Form::new()
            .text("width", width.to_string())
            .text("height", height.to_string())
            .text("name", name.to_string())
            .part("file", file);

        let response = match self
            .client
            .post(self.endpoint.clone())
            .multipart(form)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                pump.abort();
                return Err(e.into());
            }
        };

        let status = response.status();
        if !status.is_success() {
            pump.abort();
            return Err(PreviewError::Status(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok());
        let format = PreviewFormat::from_content_type(content_type);

        let persisted = persist(response, target, format).await;
        let sent = match pump.await {
            Ok(Ok(bytes)) => Ok(bytes),
            Ok(Err(e)) => Err(PreviewError::Source(e.to_string())),
            Err(e) => Err(PreviewError::Task(e)),
        };

        match (persisted, sent) {
            (Ok(written), Ok(sent)) => {
                let path = target.commit(format).await?;
                tracing::debug!(
                    sent,
                    written,
                    path = %path.display(),
                    "Stored remote preview"
                );
                Ok(format)
            }
            (Err(e), _) | (_, Err(e)) => {
                target.discard(format).await;
                Err(e)
            }
        }
    }
}

/// Stream a response body into the artifact's scratch file.
async fn persist(
    response: Response,
    target: &ArtifactPath,
    format: PreviewFormat,
) -> std::result::Result<u64, PreviewError> {
    let mut file = tokio::fs::File::create(target.partial_path(format)).await?;
    let mut body = response.bytes_stream();
    let mut written = 0u64;

    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;

    if written == 0 {
        return Err(PreviewError::EmptyBody);
    }
    Ok(written)
}
