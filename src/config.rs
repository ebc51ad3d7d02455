use crate::cli::Cli;
use std::path::PathBuf;

pub const DEFAULT_OUTPUT_ROOT: &str = "instances";

/// Where the collector writes its files.
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    pub output_root: PathBuf,
    /// Distinguishes concurrent scenarios sharing one output root.
    pub log_folder_name: String,
}

impl CollectorConfig {
    pub fn new(output_root: impl Into<PathBuf>, log_folder_name: impl Into<String>) -> Self {
        Self {
            output_root: output_root.into(),
            log_folder_name: log_folder_name.into(),
        }
    }

    /// Config for a CLI run; the folder defaults to the namespace being collected.
    pub fn from_cli(cli: &Cli, namespace: &str) -> Self {
        Self::new(
            cli.output_dir.clone(),
            cli.log_folder.as_deref().unwrap_or(namespace),
        )
    }

    pub fn folder(&self) -> PathBuf {
        self.output_root.join(&self.log_folder_name)
    }
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self::new(DEFAULT_OUTPUT_ROOT, "default")
    }
}
