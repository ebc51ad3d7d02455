use crate::registry::ObservedInstances;
use crate::sink::LogSink;
use crate::types::Instance;
use futures::stream::StreamExt;
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamerState {
    Started,
    Streaming,
    Completed,
    Cancelled,
    Failed,
}

impl fmt::Display for StreamerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamerState::Started => write!(f, "started"),
            StreamerState::Streaming => write!(f, "streaming"),
            StreamerState::Completed => write!(f, "completed"),
            StreamerState::Cancelled => write!(f, "cancelled"),
            StreamerState::Failed => write!(f, "failed"),
        }
    }
}

/// How a streamer ended, with the number of lines it managed to write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamOutcome {
    Completed { lines: usize },
    Cancelled { lines: usize },
    Failed { lines: usize, reason: String },
}

impl StreamOutcome {
    pub fn state(&self) -> StreamerState {
        match self {
            StreamOutcome::Completed { .. } => StreamerState::Completed,
            StreamOutcome::Cancelled { .. } => StreamerState::Cancelled,
            StreamOutcome::Failed { .. } => StreamerState::Failed,
        }
    }

    pub fn lines(&self) -> usize {
        match self {
            StreamOutcome::Completed { lines }
            | StreamOutcome::Cancelled { lines }
            | StreamOutcome::Failed { lines, .. } => *lines,
        }
    }
}

/// Follows one instance's log feed into its file.
pub struct Streamer {
    instance: Arc<dyn Instance>,
    sink: LogSink,
    cancel: CancellationToken,
    registry: Arc<ObservedInstances>,
    worker_id: u64,
    state: StreamerState,
}

impl Streamer {
    pub fn new(
        instance: Arc<dyn Instance>,
        sink: LogSink,
        cancel: CancellationToken,
        registry: Arc<ObservedInstances>,
        worker_id: u64,
    ) -> Self {
        Self {
            instance,
            sink,
            cancel,
            registry,
            worker_id,
            state: StreamerState::Started,
        }
    }

    /// Stream until the feed ends, fails or is cancelled, then release the registry entry.
    pub async fn run(mut self) -> StreamOutcome {
        let name = self.instance.name().to_string();
        debug!(
            "Streaming logs of {}/{} to {}",
            self.instance.namespace(),
            name,
            self.sink.path().display()
        );

        let (state, failure) = self.follow().await;
        let lines = match self.sink.close().await {
            Ok(lines) => lines,
            Err(e) => {
                warn!("Failed to close log file of {}: {}", name, e);
                0
            }
        };
        let outcome = match (state, failure) {
            (StreamerState::Cancelled, _) => StreamOutcome::Cancelled { lines },
            (_, Some(reason)) => StreamOutcome::Failed { lines, reason },
            _ => StreamOutcome::Completed { lines },
        };

        match &outcome {
            StreamOutcome::Failed { lines, reason } => {
                debug!("Stopped streaming {} after {} lines: {}", name, lines, reason)
            }
            other => debug!(
                "Finished streaming {} ({}, {} lines)",
                name,
                other.state(),
                other.lines()
            ),
        }

        self.registry.release(&name, self.worker_id).await;
        outcome
    }

    // Borrows self so `run` can still close the sink afterwards.
    async fn follow(&mut self) -> (StreamerState, Option<String>) {
        let instance = Arc::clone(&self.instance);
        let opened = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            opened = instance.observe_log() => Some(opened),
        };
        let Some(opened) = opened else {
            return self.transition(StreamerState::Cancelled, None);
        };
        let mut feed = match opened {
            Ok(feed) => feed,
            Err(e) => {
                let reason = format!("could not open log feed: {}", e);
                return self.transition(StreamerState::Failed, Some(reason));
            }
        };
        self.transition(StreamerState::Streaming, None);

        loop {
            let next = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => None,
                next = feed.next() => Some(next),
            };
            let Some(next) = next else {
                return self.transition(StreamerState::Cancelled, None);
            };
            match next {
                Some(Ok(line)) => {
                    if let Err(e) = self.sink.append_line(&line).await {
                        let reason =
                            format!("could not write {}: {}", self.sink.path().display(), e);
                        return self.transition(StreamerState::Failed, Some(reason));
                    }
                }
                Some(Err(e)) => {
                    let reason = format!("log feed broke: {}", e);
                    return self.transition(StreamerState::Failed, Some(reason));
                }
                None => return self.transition(StreamerState::Completed, None),
            }
        }
    }

    fn transition(
        &mut self,
        next: StreamerState,
        failure: Option<String>,
    ) -> (StreamerState, Option<String>) {
        trace!("{}: {} -> {}", self.instance.name(), self.state, next);
        self.state = next;
        (next, failure)
    }
}
