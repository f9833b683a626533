//! Background autosave loop.
//!
//! An `AtomicBool` write flag is checked on a timer, cleared before writing
//! so a write landing mid-flush is not lost. Serialization uses the exact
//! binary layout in `engine::persistence`.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use tokio::select;
use tokio::time::sleep;
use tokio_graceful::ShutdownGuard;

use crate::engine::{persistence, VectorStore};

pub struct PersistenceTask {
    store: Arc<VectorStore>,
    path: std::path::PathBuf,
    interval: Duration,
}

impl PersistenceTask {
    pub fn new(store: Arc<VectorStore>, path: std::path::PathBuf, interval_ms: u64) -> Self {
        Self {
            store,
            path,
            interval: Duration::from_millis(interval_ms),
        }
    }

    async fn has_potential_write(&self) -> bool {
        sleep(self.interval).await;
        self.store.dirty.load(Ordering::SeqCst)
    }

    #[tracing::instrument(skip(self, shutdown_guard))]
    pub async fn monitor(&self, shutdown_guard: ShutdownGuard) {
        loop {
            select! {
                _ = shutdown_guard.cancelled() => {
                    self.flush();
                    break;
                }
                has_potential_write = self.has_potential_write() => {
                    if has_potential_write {
                        self.store.dirty.compare_exchange(true, false, Ordering::SeqCst, Ordering::SeqCst).ok();
                        self.flush();
                    } else {
                        tracing::debug!("no potential writes happened during persistence interval");
                    }
                }
            }
        }
    }

    fn flush(&self) {
        let records = self.store.snapshot();
        match persistence::save(&self.path, &records) {
            Ok(()) => tracing::debug!(count = records.len(), "persisted store to disk"),
            Err(e) => tracing::error!(error = %e, "failed to persist store"),
        }
    }
}
