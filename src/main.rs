mod cli;
mod collector;
mod config;
mod directory;
mod drain;
mod events;
mod kubernetes;
mod registry;
mod scheduler;
mod sink;
mod streamer;
#[cfg(test)]
mod testing;
mod types;
mod utils;

use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use cli::Cli;
use collector::Collector;
use config::CollectorConfig;
use kubernetes::{PodDirectory, StreamOptions};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if cli.interval == 0 {
        anyhow::bail!("--interval must be at least one second");
    }

    let client = kubernetes::create_client(cli.context.as_deref()).await?;
    let namespace = cli
        .namespace
        .clone()
        .unwrap_or_else(|| client.default_namespace().to_string());

    let directory = PodDirectory::new(
        client.clone(),
        &namespace,
        cli.selector.clone(),
        StreamOptions {
            container: cli.container.clone(),
            tail_lines: cli.tail,
            timestamps: cli.timestamps,
        },
    );
    let config = CollectorConfig::from_cli(&cli, &namespace);
    let collector = Arc::new(
        Collector::new(config, Arc::new(directory)).context("Failed to start log collector")?,
    );

    info!("Launch instances log collector on namespace {}", namespace);
    let shutdown = CancellationToken::new();
    let reconcile_loop = scheduler::spawn_reconcile_loop(
        collector.clone(),
        Duration::from_secs(cli.interval),
        shutdown.clone(),
    );

    wait_for_teardown(cli.duration).await?;

    info!("Release log collector");
    shutdown.cancel();
    if let Err(e) = reconcile_loop.await {
        warn!("Reconciliation loop ended abnormally: {}", e);
    }
    let report = collector
        .drain(Duration::from_millis(cli.drain_timeout))
        .await;
    if !report.completed_naturally {
        info!("Logs may be incomplete for: {}", report.forced.join(", "));
    }

    if !cli.no_events {
        info!("Store namespace events");
        match kubernetes::list_events(client, &namespace).await {
            Ok(records) => {
                match events::write_events_table(collector.folder(), &namespace, &records).await {
                    Ok(path) => info!("Wrote {} event(s) to {}", records.len(), path.display()),
                    Err(e) => warn!("Could not write namespace events: {}", e),
                }
            }
            Err(e) => warn!("Could not list namespace events: {}", e),
        }
    }

    Ok(())
}

async fn wait_for_teardown(duration: Option<u64>) -> anyhow::Result<()> {
    match duration {
        Some(secs) => {
            tokio::select! {
                res = tokio::signal::ctrl_c() => res?,
                _ = tokio::time::sleep(Duration::from_secs(secs)) => {
                    info!("Collection window of {}s elapsed", secs);
                }
            }
        }
        None => tokio::signal::ctrl_c().await?,
    }
    Ok(())
}
