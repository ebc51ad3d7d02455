use crate::collector::Collector;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Run a reconciliation pass now and then every `interval` until `shutdown` fires.
pub fn spawn_reconcile_loop(
    collector: Arc<Collector>,
    interval: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // A slow pass pushes the next one back instead of bunching them up
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    debug!("Reconciliation loop stopped");
                    break;
                }
                _ = ticker.tick() => {
                    if collector.reconcile().await > 0 {
                        debug!("{} log streamer(s) running", collector.active_workers().await);
                    }
                }
            }
        }
    })
}
