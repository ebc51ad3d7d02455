use async_trait::async_trait;
use futures::stream::BoxStream;
use thiserror::Error;

/// A continuous, non-restartable sequence of log lines. Dropping it unsubscribes.
pub type LogFeed<'a> = BoxStream<'a, Result<String, FeedError>>;

/// One running application process of the deployment.
#[async_trait]
pub trait Instance: Send + Sync {
    fn name(&self) -> &str;

    fn namespace(&self) -> &str;

    /// Open the instance's live log feed.
    async fn observe_log<'a>(&'a self) -> Result<LogFeed<'a>, FeedError>;
}

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("kubernetes API request failed: {0}")]
    Api(#[from] kube::Error),
}

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("kubernetes API request failed: {0}")]
    Api(#[from] kube::Error),

    #[error("log stream read failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("log feed unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum CollectorError {
    #[error("failed to create log folder {}: {source}", path.display())]
    OutputDir {
        path: std::path::PathBuf,
        source: std::io::Error,
    },
}
