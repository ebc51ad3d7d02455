use crate::types::{DirectoryError, Instance};
use async_trait::async_trait;
use std::sync::Arc;

/// Source of truth for which instances currently exist.
///
/// Implementations must query the platform on every call; the collector relies on
/// seeing fresh state on each reconciliation pass.
#[async_trait]
pub trait InstanceDirectory: Send + Sync {
    async fn list_instances(&self) -> Result<Vec<Arc<dyn Instance>>, DirectoryError>;
}
