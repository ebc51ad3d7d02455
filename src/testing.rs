//! In-memory stand-ins for the platform, shared by the unit tests.

use crate::directory::InstanceDirectory;
use crate::types::{DirectoryError, FeedError, Instance, LogFeed};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

#[derive(Debug, Clone, Copy)]
enum Ending {
    Complete,
    Error,
    Hang,
}

/// Instance whose feed waits `delay`, emits its lines, then ends as configured.
#[derive(Debug, Clone)]
pub struct FakeInstance {
    name: String,
    lines: Vec<String>,
    delay: Duration,
    ending: Ending,
    fail_open: bool,
}

impl FakeInstance {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            lines: Vec::new(),
            delay: Duration::ZERO,
            ending: Ending::Complete,
            fail_open: false,
        }
    }

    /// The scenario instance: its single line is its own name.
    pub fn echoing(name: &str, delay: Duration) -> Self {
        Self::new(name).lines(&[name]).delay(delay)
    }

    pub fn lines(mut self, lines: &[&str]) -> Self {
        self.lines = lines.iter().map(|l| l.to_string()).collect();
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn error_after(mut self) -> Self {
        self.ending = Ending::Error;
        self
    }

    pub fn hang(mut self) -> Self {
        self.ending = Ending::Hang;
        self
    }

    pub fn fail_open(mut self) -> Self {
        self.fail_open = true;
        self
    }
}

#[async_trait]
impl Instance for FakeInstance {
    fn name(&self) -> &str {
        &self.name
    }

    fn namespace(&self) -> &str {
        "test"
    }

    async fn observe_log<'a>(&'a self) -> Result<LogFeed<'a>, FeedError> {
        if self.fail_open {
            return Err(FeedError::Unavailable(format!("{} is gone", self.name)));
        }

        let lines = self.lines.clone();
        let delay = self.delay;
        let body = stream::once(async move {
            tokio::time::sleep(delay).await;
            stream::iter(lines.into_iter().map(Ok))
        })
        .flatten();

        let tail: LogFeed<'static> = match self.ending {
            Ending::Complete => stream::empty().boxed(),
            Ending::Error => stream::once(async {
                Err(FeedError::Unavailable("connection reset".to_string()))
            })
            .boxed(),
            Ending::Hang => stream::pending().boxed(),
        };
        Ok(body.chain(tail).boxed())
    }
}

/// Instance fed line by line from the test through a channel.
pub struct ChannelInstance {
    name: String,
    rx: Mutex<Option<mpsc::Receiver<Result<String, FeedError>>>>,
}

impl ChannelInstance {
    pub fn new(name: &str) -> (Self, mpsc::Sender<Result<String, FeedError>>) {
        let (tx, rx) = mpsc::channel(16);
        let instance = Self {
            name: name.to_string(),
            rx: Mutex::new(Some(rx)),
        };
        (instance, tx)
    }
}

#[async_trait]
impl Instance for ChannelInstance {
    fn name(&self) -> &str {
        &self.name
    }

    fn namespace(&self) -> &str {
        "test"
    }

    async fn observe_log<'a>(&'a self) -> Result<LogFeed<'a>, FeedError> {
        let rx = self.rx.lock().unwrap().take();
        match rx {
            Some(rx) => Ok(ReceiverStream::new(rx).boxed()),
            None => Err(FeedError::Unavailable("feed already consumed".to_string())),
        }
    }
}

/// Directory answering with a fixed instance set, optionally failing some calls first.
#[derive(Default)]
pub struct FakeDirectory {
    instances: Mutex<Vec<Arc<dyn Instance>>>,
    failures: Mutex<VecDeque<String>>,
    calls: Mutex<usize>,
    delay: Mutex<Duration>,
}

impl FakeDirectory {
    pub fn with(instances: Vec<Arc<dyn Instance>>) -> Arc<Self> {
        let directory = Self::default();
        *directory.instances.lock().unwrap() = instances;
        Arc::new(directory)
    }

    pub fn set(&self, instances: Vec<Arc<dyn Instance>>) {
        *self.instances.lock().unwrap() = instances;
    }

    pub fn fail_next(&self, reason: &str) {
        self.failures.lock().unwrap().push_back(reason.to_string());
    }

    /// Make every listing take `delay` before answering.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl InstanceDirectory for FakeDirectory {
    async fn list_instances(&self) -> Result<Vec<Arc<dyn Instance>>, DirectoryError> {
        *self.calls.lock().unwrap() += 1;
        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if let Some(reason) = self.failures.lock().unwrap().pop_front() {
            return Err(DirectoryError::Api(kube::Error::Service(reason.into())));
        }
        Ok(self.instances.lock().unwrap().clone())
    }
}

pub fn echoing(names: &[&str], delay: Duration) -> Vec<Arc<dyn Instance>> {
    names
        .iter()
        .map(|name| Arc::new(FakeInstance::echoing(name, delay)) as Arc<dyn Instance>)
        .collect()
}

/// Wait until `path` holds `lines` lines, for at most two seconds.
pub async fn wait_for_lines(path: &Path, lines: usize) -> bool {
    for _ in 0..200 {
        if let Ok(content) = tokio::fs::read_to_string(path).await
            && content.lines().count() >= lines
        {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

pub fn read_log(folder: &Path, name: &str) -> Option<String> {
    std::fs::read_to_string(folder.join(format!("{}.log", name))).ok()
}
