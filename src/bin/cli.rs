//! Threat collector CLI
//!
//! Local execution entry point.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use threat_collector::{
    config::{load_settings, load_sources},
    error::Result,
    models::{Config, Source},
    pipeline::{Collector, CycleReport, Scheduler},
    services::{SourceRouter, select_strategy},
    storage::{ContentStore, LocalStorage, PersistenceGateway},
};
use tokio_util::sync::CancellationToken;

/// Threat-intelligence collector
#[derive(Parser, Debug)]
#[command(
    name = "collector",
    version,
    about = "Collects, scores and stores threat-intelligence content"
)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Collect on the configured interval until interrupted
    Run,

    /// Run a single collection cycle and exit
    Once,

    /// Validate configuration and sources, then show each source's strategy
    Validate,
}

/// Initialize logging. `RUST_LOG` wins over the configured level.
fn init_logging(level: &str, verbose: bool) {
    let level = if verbose { "debug" } else { level };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let settings = load_settings(cli.config.as_deref())?;
    init_logging(&settings.config.logging.level, cli.verbose);
    settings.log_fallback(cli.config.as_deref());
    let config = settings.config;

    log::info!("Threat collector starting...");
    let sources = load_sources(&config)?;
    log::info!(
        "Loaded {} sources from {}",
        sources.len(),
        config.sources_file.display()
    );

    match cli.command {
        Command::Validate => validate(&config, &sources),
        Command::Once => {
            let (collector, store) = build_collector(&config, sources).await?;
            let report = collector.collect().await;
            log_summary(&report);
            store.close().await?;
            Ok(())
        }
        Command::Run => run(&config, sources).await,
    }
}

async fn build_collector(
    config: &Config,
    sources: Vec<Source>,
) -> Result<(Collector, Arc<LocalStorage>)> {
    let store = Arc::new(
        LocalStorage::open_with_retry(&config.storage.dir, config.storage.connect_attempts)
            .await?,
    );
    let router = SourceRouter::new(&config.acquisition)?;
    if config.acquisition.use_proxy {
        log::info!("Routing traffic through {}", config.acquisition.proxy_addr);
    }
    let gateway = PersistenceGateway::new(store.clone());
    Ok((Collector::new(sources, router, gateway), store))
}

async fn run(config: &Config, sources: Vec<Source>) -> Result<()> {
    let (collector, store) = build_collector(config, sources).await?;
    let shutdown = CancellationToken::new();

    let mut scheduler = Scheduler::new(Arc::new(collector), config.scheduler.interval());
    let mut records = scheduler.subscribe();
    scheduler.start(&shutdown)?;

    tokio::spawn(async move {
        while records.changed().await.is_ok() {
            if let Some(record) = records.borrow_and_update().as_ref() {
                log::debug!(
                    "Cycle {} started {} took {:.1?}",
                    record.sequence,
                    record.started_at.to_rfc3339(),
                    record.duration
                );
            }
        }
    });

    wait_for_signal().await;
    log::info!("Shutdown requested, finishing current cycle...");
    shutdown.cancel();
    scheduler.stop().await;

    store.close().await?;
    log::info!("Done!");
    Ok(())
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::terminate()) {
        Ok(mut term) => {
            tokio::select! {
                _ = wait_for_ctrl_c() => {}
                _ = term.recv() => {}
            }
        }
        Err(e) => {
            log::warn!("Cannot listen for SIGTERM: {}", e);
            wait_for_ctrl_c().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    wait_for_ctrl_c().await;
}

async fn wait_for_ctrl_c() {
    signal_received(tokio::signal::ctrl_c().await);
}

/// Log a listener that could not be installed. Returns whether a signal
/// actually arrived.
fn signal_received(result: std::io::Result<()>) -> bool {
    match result {
        Ok(()) => true,
        Err(e) => {
            log::error!("Cannot listen for Ctrl-C, shutting down: {}", e);
            false
        }
    }
}

fn validate(config: &Config, sources: &[Source]) -> Result<()> {
    log::info!("Validating configuration...");
    log::info!("✓ Config OK (interval {:?})", config.scheduler.interval());
    for source in sources {
        log::info!(
            "  {} -> {} [{}]",
            source.name,
            source.url,
            select_strategy(&source.url)
        );
    }
    log::info!("All validations passed!");
    Ok(())
}

fn log_summary(report: &CycleReport) {
    log::info!(
        "Visited {} sources: {} inserted, {} duplicates, {} errors",
        report.sources_visited,
        report.successes,
        report.duplicates,
        report.errors
    );
    for outcome in &report.outcomes {
        log::debug!(
            "  [{}] {} ({}) {}",
            outcome.source_name,
            outcome.url,
            outcome.score,
            outcome.status
        );
    }
}
