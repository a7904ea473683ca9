//! Preview orchestration: cache lookup, generator dispatch and fallbacks.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::config::PreviewConfig;
use crate::file::{Drive, FileKind, FileMetadata};
use crate::Result;

use super::{
    generate_thumbnail, ArtifactPath, ArtifactState, IconResolver, InFlight, MetadataPoller,
    PreviewError, PreviewFormat, PreviewKey, RemoteRenderer,
};

/// How a missing artifact gets produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Generator {
    /// Send the source to the rendering service.
    Remote,
    /// Resize locally.
    Local,
    /// Nothing can render this kind; a placeholder is stored.
    None,
}

impl Generator {
    /// Pick the generator for a file kind.
    ///
    /// Folders never get one. A configured service takes every other kind;
    /// without it only images are rendered, locally.
    pub fn select(service_configured: bool, kind: FileKind) -> Self {
        match kind {
            FileKind::Folder => Generator::None,
            _ if service_configured => Generator::Remote,
            FileKind::Image => Generator::Local,
            _ => Generator::None,
        }
    }
}

/// Cost ceilings checked on every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviewLimits {
    pub max_source_bytes: u64,
    pub max_dimension: u32,
}

impl PreviewLimits {
    /// Whether a source of `source_bytes` may be previewed at `width x height`.
    /// Both ceilings are inclusive.
    pub fn allows(&self, source_bytes: u64, width: u32, height: u32) -> bool {
        source_bytes <= self.max_source_bytes
            && width <= self.max_dimension
            && height <= self.max_dimension
    }
}

impl From<&PreviewConfig> for PreviewLimits {
    fn from(config: &PreviewConfig) -> Self {
        Self {
            max_source_bytes: config.max_source_bytes,
            max_dimension: config.max_dimension,
        }
    }
}

/// What the preview endpoint serves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewOutcome {
    /// A generated preview.
    Artifact { path: PathBuf, format: PreviewFormat },
    /// An SVG icon standing in for the preview.
    Icon(PathBuf),
}

impl PreviewOutcome {
    /// File to serve.
    pub fn path(&self) -> &Path {
        match self {
            PreviewOutcome::Artifact { path, .. } => path,
            PreviewOutcome::Icon(path) => path,
        }
    }
}

/// Preview engine bound to one drive and one configuration.
#[derive(Clone)]
pub struct PreviewService {
    drive: Arc<dyn Drive>,
    poller: MetadataPoller,
    icons: IconResolver,
    remote: Option<RemoteRenderer>,
    limits: PreviewLimits,
    flights: Arc<InFlight>,
    generated: Arc<AtomicUsize>,
}

impl PreviewService {
    /// Create a preview service over `drive`.
    ///
    /// Fails when the rendering service URL cannot be used.
    pub fn new(drive: Arc<dyn Drive>, config: &PreviewConfig) -> Result<Self> {
        let remote = if config.has_service() {
            Some(RemoteRenderer::new(
                &config.service_url,
                config.service_timeout(),
            )?)
        } else {
            None
        };

        let poller = MetadataPoller::new(drive.clone())
            .with_timing(config.poll_interval(), config.poll_timeout());

        Ok(Self {
            drive,
            poller,
            icons: IconResolver::new(&config.icons_path),
            remote,
            limits: PreviewLimits::from(config),
            flights: Arc::new(InFlight::new()),
            generated: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// Icon set used for fallbacks.
    pub fn icons(&self) -> &IconResolver {
        &self.icons
    }

    /// Poller shared with the info endpoint.
    pub fn poller(&self) -> &MetadataPoller {
        &self.poller
    }

    /// Cost ceilings in effect.
    pub fn limits(&self) -> PreviewLimits {
        self.limits
    }

    /// Generator used for files of `kind`.
    pub fn generator_for(&self, kind: FileKind) -> Generator {
        Generator::select(self.remote.is_some(), kind)
    }

    /// Number of previews generated successfully since startup.
    pub fn generation_count(&self) -> usize {
        self.generated.load(Ordering::Relaxed)
    }

    /// Preview for `id` at `width x height`.
    ///
    /// Always yields something servable. Generation runs in its own task, so
    /// dropping this future does not abort it and the cache still gets
    /// populated.
    pub async fn preview(&self, id: &str, width: u32, height: u32) -> PreviewOutcome {
        let info = match self.poller.resolve(id).await {
            Ok(info) => info,
            Err(e) => {
                tracing::debug!(id, error = %e, "Preview source unavailable");
                return PreviewOutcome::Icon(self.icons.fallback(None));
            }
        };
        let icon = || PreviewOutcome::Icon(self.icons.fallback(Some(&info)));

        // Folders never get an artifact, and the root has no parent inside
        // the drive to hold a cache folder.
        if info.is_folder() {
            return icon();
        }

        if !self.limits.allows(info.size, width, height) {
            tracing::debug!(
                id = %info.id,
                size = info.size,
                width,
                height,
                "Preview request over limits"
            );
            return icon();
        }

        let source = match self.drive.local_path(&info.id) {
            Ok(source) => source,
            Err(e) => {
                tracing::warn!(id = %info.id, error = %e, "Cannot locate preview source");
                return icon();
            }
        };
        let artifact = ArtifactPath::new(&source, width, height);

        match artifact.probe().await {
            ArtifactState::Ready { path, format } => {
                return PreviewOutcome::Artifact { path, format };
            }
            ArtifactState::Unavailable => return icon(),
            ArtifactState::Missing => {}
        }

        let key = PreviewKey::new(info.id.clone(), width, height);
        let task = tokio::spawn(self.clone().generate(key, info.clone(), source, artifact));

        match task.await {
            Ok(ArtifactState::Ready { path, format }) => PreviewOutcome::Artifact { path, format },
            Ok(_) => icon(),
            Err(e) => {
                tracing::error!(id = %info.id, error = %e, "Preview task failed");
                icon()
            }
        }
    }

    /// Produce the artifact for `key` unless someone else already did.
    async fn generate(
        self,
        key: PreviewKey,
        info: FileMetadata,
        source: PathBuf,
        artifact: ArtifactPath,
    ) -> ArtifactState {
        let _flight = self.flights.acquire(key.clone()).await;

        // A previous holder of the key may have finished meanwhile.
        let state = artifact.probe().await;
        if state != ArtifactState::Missing {
            return state;
        }

        match self.dispatch(&key, &info, &source, &artifact).await {
            Ok(format) => {
                self.generated.fetch_add(1, Ordering::Relaxed);
                let path = artifact.path(format);
                tracing::info!(
                    id = %key.id,
                    width = key.width,
                    height = key.height,
                    path = %path.display(),
                    "Preview generated"
                );
                ArtifactState::Ready { path, format }
            }
            Err(e) => {
                tracing::warn!(
                    id = %key.id,
                    width = key.width,
                    height = key.height,
                    error = %e,
                    "Preview generation failed"
                );
                if let Err(e) = artifact.mark_unavailable().await {
                    tracing::warn!(id = %key.id, error = %e, "Failed to store preview placeholder");
                }
                ArtifactState::Unavailable
            }
        }
    }

    async fn dispatch(
        &self,
        key: &PreviewKey,
        info: &FileMetadata,
        source: &Path,
        artifact: &ArtifactPath,
    ) -> std::result::Result<PreviewFormat, PreviewError> {
        artifact.ensure_folder().await?;

        match (self.generator_for(info.kind), &self.remote) {
            (Generator::Remote, Some(remote)) => {
                let file = self
                    .drive
                    .read(&info.id)
                    .map_err(|e| PreviewError::Source(e.to_string()))?;
                remote
                    .render(
                        tokio::fs::File::from_std(file),
                        artifact,
                        &info.name,
                        key.width,
                        key.height,
                    )
                    .await
            }
            (Generator::Local, _) => {
                generate_thumbnail(source, key.width, key.height, artifact).await
            }
            _ => Err(PreviewError::Unsupported(info.kind)),
        }
    }
}
