//! Bounded metadata polling.
//!
//! A drive may not yet show an entry that was created or renamed a moment
//! ago (an upload immediately followed by a preview request is the common
//! case). The poller retries `Drive::info` at a fixed interval until it
//! succeeds or a deadline passes.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{sleep, Instant};

use crate::file::{Drive, FileMetadata};
use crate::Result;

/// Delay between two attempts.
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Time after which the last failure is returned.
pub const POLL_TIMEOUT: Duration = Duration::from_secs(10);

/// Resolves file ids with fixed-interval retry.
#[derive(Clone)]
pub struct MetadataPoller {
    drive: Arc<dyn Drive>,
    interval: Duration,
    timeout: Duration,
}

impl MetadataPoller {
    pub fn new(drive: Arc<dyn Drive>) -> Self {
        Self {
            drive,
            interval: POLL_INTERVAL,
            timeout: POLL_TIMEOUT,
        }
    }

    /// Override the retry interval and deadline.
    pub fn with_timing(mut self, interval: Duration, timeout: Duration) -> Self {
        self.interval = interval;
        self.timeout = timeout;
        self
    }

    /// Metadata for `id`, or the last error once the deadline has passed.
    ///
    /// Waiting suspends only the calling task; dropping the future cancels
    /// the loop. `Drive::info` is called inline and must answer from local
    /// metadata (one `stat` for [`LocalDrive`](crate::file::LocalDrive)).
    pub async fn resolve(&self, id: &str) -> Result<FileMetadata> {
        let deadline = Instant::now() + self.timeout;
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            match self.drive.info(id) {
                Ok(info) => {
                    if attempts > 1 {
                        tracing::debug!(id, attempts, "Metadata resolved after retry");
                    }
                    return Ok(info);
                }
                Err(e) if Instant::now() >= deadline => {
                    tracing::debug!(id, attempts, error = %e, "Metadata unavailable");
                    return Err(e);
                }
                Err(_) => sleep(self.interval).await,
            }
        }
    }
}
