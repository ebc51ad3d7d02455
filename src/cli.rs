use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "instance-log-collector")]
#[command(about = "Collect the logs of every pod in a namespace into one file per pod")]
pub struct Cli {
    /// Namespace (defaults to the namespace of the current context)
    #[arg(short = 'n', long)]
    pub namespace: Option<String>,

    /// Context
    #[arg(long)]
    pub context: Option<String>,

    /// Label selector narrowing which pods are collected
    #[arg(short = 'l', long)]
    pub selector: Option<String>,

    /// Container name (defaults to the first container of each pod)
    #[arg(short = 'c', long)]
    pub container: Option<String>,

    /// Lines of history to fetch when a pod's stream opens
    #[arg(long)]
    pub tail: Option<i64>,

    /// Ask the API server to prefix every line with its timestamp
    #[arg(long)]
    pub timestamps: bool,

    /// Root directory for collected logs
    #[arg(
        short = 'o',
        long,
        env = "INSTANCE_LOGS_OUTPUT_DIRECTORY",
        default_value = crate::config::DEFAULT_OUTPUT_ROOT
    )]
    pub output_dir: PathBuf,

    /// Folder under the output root (defaults to the namespace)
    #[arg(long)]
    pub log_folder: Option<String>,

    /// Seconds between two discovery passes
    #[arg(long, default_value_t = 5)]
    pub interval: u64,

    /// Milliseconds to wait for streams to finish at teardown
    #[arg(long, default_value_t = 5000)]
    pub drain_timeout: u64,

    /// Seconds to collect before tearing down (default: until Ctrl-C)
    #[arg(long)]
    pub duration: Option<u64>,

    /// Do not dump namespace events at teardown
    #[arg(long)]
    pub no_events: bool,

    /// Verbose logging
    #[arg(short = 'v', long)]
    pub verbose: bool,
}
