//! ArcPool settlement node: entry point.
//!
//! Loads configuration from a TOML file or defaults, restores the pool from
//! its store and serves the HTTP API until interrupted.

mod api;
mod config;
mod state;
mod storage;

use anyhow::Context;
use arcpool_ledger::{LedgerStore, MemoryStore, PoolService, SystemClock};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use config::ArcPoolConfig;
use state::NodeState;
use storage::RocksStore;

/// ArcPool Settlement Node
#[derive(Parser, Debug)]
#[command(name = "arcpool-node", version, about = "ArcPool settlement node")]
struct Args {
    /// Path to the configuration file (TOML).
    #[arg(short, long, default_value = "arcpool.toml")]
    config: PathBuf,

    /// Override the API port.
    #[arg(long)]
    api_port: Option<u16>,

    /// Override the data directory.
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(long)]
    log_level: Option<String>,

    /// Generate a default config file and exit.
    #[arg(long)]
    init: bool,
}

fn init_tracing(level: &str, format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    if format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn open_store(config: &ArcPoolConfig) -> anyhow::Result<Box<dyn LedgerStore>> {
    if config.storage.in_memory {
        tracing::warn!("storage.in_memory is set; ledger state will not survive a restart");
        return Ok(Box::new(MemoryStore::new()));
    }
    let path = &config.storage.data_dir;
    let store = RocksStore::open(path)
        .with_context(|| format!("opening ledger store at {}", path.display()))?;
    Ok(Box::new(store))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("received shutdown signal");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Handle --init flag
    if args.init {
        let config = ArcPoolConfig::default();
        config.save(&args.config)?;
        println!("wrote default config to {}", args.config.display());
        return Ok(());
    }

    // Load configuration
    let mut config = ArcPoolConfig::load(&args.config)?;

    // Apply CLI overrides
    if let Some(api_port) = args.api_port {
        config.api.port = api_port;
    }
    if let Some(ref data_dir) = args.data_dir {
        config.storage.data_dir = data_dir.clone();
    }
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }

    init_tracing(&config.logging.level, &config.logging.format);
    tracing::info!("ArcPool node v{}", env!("CARGO_PKG_VERSION"));

    let store = open_store(&config)?;
    let service = PoolService::open(&config.pool, store, Box::new(SystemClock))
        .context("opening pool")?;
    let status = service.pool_status();
    tracing::info!(
        total_assets = status.total,
        available = status.available,
        utilized = status.utilized,
        paused = status.paused,
        signer = %service.trusted_signer(),
        "pool ready"
    );

    let state = Arc::new(NodeState::new(service));
    api::start_api_server(config.api_socket_addr()?, state, shutdown_signal()).await?;

    tracing::info!("ArcPool node exited cleanly");
    Ok(())
}
