//! Single-flight registry for preview generation.
//!
//! The first request for a key holds the key's lock while it generates;
//! concurrent requests for the same key queue on that lock and re-probe the
//! cache once they get it. Entries are removed when the last holder is done,
//! so the map only ever contains keys with work in progress.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use super::PreviewKey;

/// In-process map of keys currently being generated.
#[derive(Debug, Default)]
pub struct InFlight {
    slots: Mutex<HashMap<PreviewKey, Arc<AsyncMutex<()>>>>,
}

impl InFlight {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive ownership of `key`.
    pub async fn acquire(self: &Arc<Self>, key: PreviewKey) -> FlightGuard {
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
            slots.entry(key.clone()).or_default().clone()
        };
        let permit = slot.lock_owned().await;

        FlightGuard {
            registry: Arc::clone(self),
            key,
            permit: Some(permit),
        }
    }

    /// Number of keys with a holder or waiters.
    pub fn len(&self) -> usize {
        self.slots.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Exclusive ownership of one key; released on drop.
pub struct FlightGuard {
    registry: Arc<InFlight>,
    key: PreviewKey,
    permit: Option<OwnedMutexGuard<()>>,
}

impl FlightGuard {
    /// Key this guard holds.
    pub fn key(&self) -> &PreviewKey {
        &self.key
    }
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        let mut slots = self
            .registry
            .slots
            .lock()
            .unwrap_or_else(|e| e.into_inner());

        if let Some(permit) = self.permit.take() {
            let slot = OwnedMutexGuard::mutex(&permit);
            // The map and this permit are the only references: nobody waits.
            if Arc::strong_count(slot) == 2 {
                slots.remove(&self.key);
            }
            drop(permit);
        }
    }
}
