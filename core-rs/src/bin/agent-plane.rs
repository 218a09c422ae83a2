//! agent-plane - dataspace agent plane runner
//!
//! Loads the YAML configuration, seeds the quad store and keeps the
//! catalog mirror current until interrupted.

use agent_plane::{
    logging, AgentConfig, CatalogSynchronizer, LoggingSeedErrorHandler, ManagementCatalogClient,
    PredicateTable, QuadStore,
};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "agent-plane")]
#[command(version = "1.3.19")]
#[command(about = "Dataspace agent plane", long_about = None)]
struct Cli {
    /// Configuration file (YAML)
    #[arg(long, short = 'c', default_value = "agent-plane.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Seed the store and synchronize catalogs on schedule until Ctrl-C
    Run,
    /// Seed the store, synchronize every participant once and print the report
    SyncOnce,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AgentConfig::load(&cli.config)
        .with_context(|| format!("Could not load configuration from {}", cli.config.display()))?;
    logging::init(&config.logging)?;

    let store = Arc::new(QuadStore::open(&config.store, &LoggingSeedErrorHandler)?);
    let predicates = Arc::new(PredicateTable::standard());

    match cli.command {
        Commands::Run => run(&config, store, predicates).await,
        Commands::SyncOnce => sync_once(&config, store, predicates).await,
    }
}

fn synchronizer(
    config: &AgentConfig,
    store: Arc<QuadStore>,
    predicates: Arc<PredicateTable>,
) -> Result<CatalogSynchronizer> {
    let client = ManagementCatalogClient::from_config(&config.synchronization)
        .context("Catalog synchronization needs a management API client")?;
    Ok(CatalogSynchronizer::new(
        store,
        Arc::new(client),
        predicates,
        &config.synchronization,
    ))
}

async fn run(config: &AgentConfig, store: Arc<QuadStore>, predicates: Arc<PredicateTable>) -> Result<()> {
    let synchronizer = if config.synchronization.is_enabled() {
        let synchronizer = synchronizer(config, store.clone(), predicates)?;
        synchronizer.start()?;
        Some(synchronizer)
    } else {
        info!("Catalog synchronization disabled");
        None
    };

    info!(quads = store.len()?, "Agent plane ready, press Ctrl-C to stop");
    tokio::signal::ctrl_c()
        .await
        .context("Could not listen for Ctrl-C")?;

    info!("Received shutdown signal, exiting gracefully");
    if let Some(synchronizer) = synchronizer {
        synchronizer.shutdown_and_wait().await;
    }
    Ok(())
}

async fn sync_once(config: &AgentConfig, store: Arc<QuadStore>, predicates: Arc<PredicateTable>) -> Result<()> {
    let synchronizer = synchronizer(config, store.clone(), predicates)?;
    let report = synchronizer.run_now().await;

    println!("{}", serde_json::to_string_pretty(&report)?);
    info!(quads = store.len()?, failures = report.failures(), "Synchronization pass complete");
    Ok(())
}
