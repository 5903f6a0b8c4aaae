/*!

This is the command line interface for running the cluster lifecycle end-to-end tests against an
Open Cluster Management hub.

!*/

mod create;
mod destroy;
mod detach;
mod import;
mod metrics;

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Builder;
use lifecycle_model::lifecycle::Settle;
use lifecycle_model::{LifecycleManager, Options};
use log::LevelFilter;
use std::path::PathBuf;

/// The command line interface for running cluster lifecycle tests against a hub.
#[derive(Debug, Parser)]
#[clap(author, version, about)]
struct Args {
    /// Set logging verbosity [trace|debug|info|warn|error]. If the environment variable `RUST_LOG`
    /// is present, it overrides the default logging behavior. See https://docs.rs/env_logger/latest
    #[clap(long = "log-level", default_value = "info")]
    log_level: LevelFilter,
    /// Path to the options file describing the hub, the managed clusters and the cloud
    /// credentials.
    #[clap(long = "options", short = 'o')]
    options: PathBuf,
    /// Do not wait for the hub to settle between steps.
    #[clap(long = "skip-settle")]
    skip_settle: bool,
    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, Parser)]
enum Command {
    /// Create clusters on cloud providers with Hive and import them.
    Create(create::Create),
    /// Destroy the clusters created by `create`.
    Destroy(destroy::Destroy),
    /// Import the managed clusters listed in the options file.
    Import(import::Import),
    /// Check that the hub imported itself as `local-cluster`.
    ImportHub(import::ImportHub),
    /// Detach the managed clusters listed in the options file.
    Detach(detach::Detach),
    /// Check the managed cluster metrics reported by the hub.
    Metrics(metrics::Metrics),
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logger(args.log_level);
    if let Err(e) = run(args).await {
        eprintln!("{:?}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    let options = Options::load(&args.options).context(format!(
        "Unable to load options from '{}'",
        args.options.display()
    ))?;
    let mut manager = LifecycleManager::from_options(options)
        .await
        .context("Unable to create a client for the hub")?;
    if args.skip_settle {
        manager = manager.with_settle(Settle::NONE);
    }
    match args.command {
        Command::Create(create) => create.run(manager).await,
        Command::Destroy(destroy) => destroy.run(manager).await,
        Command::Import(import) => import.run(manager).await,
        Command::ImportHub(import_hub) => import_hub.run(manager).await,
        Command::Detach(detach) => detach.run(manager).await,
        Command::Metrics(metrics) => metrics.run(manager).await,
    }
}

/// Initialize the logger with the value passed by `--log-level` (or its default) when the
/// `RUST_LOG` environment variable is not present. If present, the `RUST_LOG` environment variable
/// overrides `--log-level`/`level`.
fn init_logger(level: LevelFilter) {
    match std::env::var(env_logger::DEFAULT_FILTER_ENV).ok() {
        Some(_) => {
            // RUST_LOG exists; env_logger will use it.
            Builder::from_default_env().init();
        }
        None => {
            // RUST_LOG does not exist; use default log level for this crate and the scenarios.
            Builder::new()
                .filter(Some(env!("CARGO_CRATE_NAME")), level)
                .filter(Some("lifecycle_model"), level)
                .init();
        }
    }
}
