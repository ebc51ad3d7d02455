use crate::collector::Collector;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Time cancelled streamers get to close their files before being aborted.
const CANCEL_GRACE: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrainReport {
    /// Every streamer finished on its own before the deadline.
    pub completed_naturally: bool,
    /// Instances whose streamer was cut off at the deadline.
    pub forced: Vec<String>,
    pub elapsed: Duration,
}

impl Collector {
    /// Stop the collector, letting running streamers finish for at most `timeout`.
    ///
    /// Streamers still running at the deadline are cancelled, then aborted. Lines
    /// already written stay in their files. On return no streamer is running and
    /// no instance is observed.
    pub async fn drain(&self, timeout: Duration) -> DrainReport {
        let started = Instant::now();
        self.tracker.close();

        let pending = self.observed_instances().await;
        if !pending.is_empty() {
            info!(
                "Draining {} log streamer(s), waiting up to {:?}",
                pending.len(),
                timeout
            );
        }

        let completed_naturally = tokio::time::timeout(timeout, self.tracker.wait())
            .await
            .is_ok();

        let mut forced = Vec::new();
        if !completed_naturally {
            let outstanding = self.registry.cancel_all().await;
            warn!(
                "Drain deadline of {:?} reached, cutting off {} streamer(s): {}",
                timeout,
                outstanding.len(),
                outstanding.join(", ")
            );

            if tokio::time::timeout(CANCEL_GRACE, self.tracker.wait())
                .await
                .is_err()
            {
                debug!("Streamers still running after cancellation, aborting them");
            }
            self.registry.abort_all().await;
            forced = outstanding;
        }

        let report = DrainReport {
            completed_naturally,
            forced,
            elapsed: started.elapsed(),
        };
        info!(
            "Log collector drained in {:?} ({} forced)",
            report.elapsed,
            report.forced.len()
        );
        report
    }
}
