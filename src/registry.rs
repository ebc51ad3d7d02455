use std::collections::HashMap;
use tokio::sync::{Mutex, MutexGuard};
use tokio::task::AbortHandle;
use tokio_util::sync::CancellationToken;
use tracing::trace;

/// Handles on one streaming worker.
#[derive(Debug)]
pub struct WorkerHandle {
    pub id: u64,
    pub cancel: CancellationToken,
    pub abort: AbortHandle,
}

pub type Workers = HashMap<String, WorkerHandle>;

/// Instances that currently own a streaming worker, keyed by instance name.
#[derive(Debug, Default)]
pub struct ObservedInstances {
    workers: Mutex<Workers>,
}

impl ObservedInstances {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exclusive access for a reconciliation pass.
    pub async fn lock(&self) -> MutexGuard<'_, Workers> {
        self.workers.lock().await
    }

    /// Drop the entry for `name`, but only if it still belongs to worker `id`.
    pub async fn release(&self, name: &str, id: u64) -> bool {
        let mut guard = self.workers.lock().await;
        match guard.get(name) {
            Some(handle) if handle.id == id => {
                guard.remove(name);
                trace!("Released instance {} (worker {})", name, id);
                true
            }
            _ => false,
        }
    }

    pub async fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.workers.lock().await.keys().cloned().collect();
        names.sort();
        names
    }

    pub async fn active_count(&self) -> usize {
        self.workers
            .lock()
            .await
            .values()
            .filter(|h| !h.abort.is_finished())
            .count()
    }

    /// Ask every worker to stop at its next read. Returns the names asked.
    pub async fn cancel_all(&self) -> Vec<String> {
        let guard = self.workers.lock().await;
        let mut names = Vec::with_capacity(guard.len());
        for (name, handle) in guard.iter() {
            handle.cancel.cancel();
            names.push(name.clone());
        }
        names.sort();
        names
    }

    /// Abort whatever is still registered and forget it. Returns the names aborted.
    pub async fn abort_all(&self) -> Vec<String> {
        let mut guard = self.workers.lock().await;
        let mut names = Vec::with_capacity(guard.len());
        for (name, handle) in guard.drain() {
            handle.cancel.cancel();
            handle.abort.abort();
            names.push(name);
        }
        names.sort();
        names
    }
}
