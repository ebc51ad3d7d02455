use crate::config::CollectorConfig;
use crate::directory::InstanceDirectory;
use crate::registry::{ObservedInstances, WorkerHandle};
use crate::sink::LogSink;
use crate::streamer::Streamer;
use crate::types::CollectorError;
use crate::utils::log_file_name;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, trace, warn};

/// Keeps one log streamer running per live instance of a deployment.
///
/// Call [`Collector::reconcile`] periodically to pick up new instances and
/// [`Collector::drain`] once at teardown.
pub struct Collector {
    directory: Arc<dyn InstanceDirectory>,
    folder: PathBuf,
    pub(crate) registry: Arc<ObservedInstances>,
    pub(crate) tracker: TaskTracker,
    next_worker_id: AtomicU64,
}

impl Collector {
    /// Create a collector writing under `config.folder()`, creating that folder now.
    pub fn new(
        config: CollectorConfig,
        directory: Arc<dyn InstanceDirectory>,
    ) -> Result<Self, CollectorError> {
        let folder = config.folder();
        std::fs::create_dir_all(&folder).map_err(|source| CollectorError::OutputDir {
            path: folder.clone(),
            source,
        })?;
        info!("Collecting instance logs into {}", folder.display());

        Ok(Self {
            directory,
            folder,
            registry: Arc::new(ObservedInstances::new()),
            tracker: TaskTracker::new(),
            next_worker_id: AtomicU64::new(1),
        })
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    /// One reconciliation pass: start a streamer for every instance not yet observed.
    ///
    /// Returns how many streamers were started. A failing directory query skips
    /// the pass; the next call retries.
    pub async fn reconcile(&self) -> usize {
        if self.tracker.is_closed() {
            debug!("Collector is draining, skipping reconciliation");
            return 0;
        }

        let instances = match self.directory.list_instances().await {
            Ok(instances) => instances,
            Err(e) => {
                warn!("Could not list instances, retrying on next pass: {}", e);
                return 0;
            }
        };

        // Held across spawn and insert so a streamer that ends at once
        // cannot release itself before it is registered.
        let mut workers = self.registry.lock().await;
        // drain() closes the tracker before it takes this lock
        if self.tracker.is_closed() {
            debug!("Collector started draining during the pass, dropping its result");
            return 0;
        }
        let mut started = 0;
        for instance in instances {
            let name = instance.name().to_string();
            if workers.contains_key(&name) {
                trace!("Instance {} already observed", name);
                continue;
            }

            let id = self.next_worker_id.fetch_add(1, Ordering::Relaxed);
            let cancel = CancellationToken::new();
            let sink = LogSink::new(self.folder.join(log_file_name(&name)));
            let streamer = Streamer::new(instance, sink, cancel.clone(), self.registry.clone(), id);
            let handle = self.tracker.spawn(streamer.run());

            debug!("Observing instance {} (worker {})", name, id);
            workers.insert(
                name,
                WorkerHandle {
                    id,
                    cancel,
                    abort: handle.abort_handle(),
                },
            );
            started += 1;
        }

        if started > 0 {
            debug!(
                "Started {} new streamer(s), {} instance(s) observed",
                started,
                workers.len()
            );
        }
        started
    }

    /// Names of the instances that currently own a streamer, sorted.
    pub async fn observed_instances(&self) -> Vec<String> {
        self.registry.names().await
    }

    /// Number of streamers still running.
    pub async fn active_workers(&self) -> usize {
        self.registry.active_count().await
    }
}
