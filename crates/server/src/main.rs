//! Cellar Server
//!
//! Serves the storefront protocol over TCP from an in-memory store.

use anyhow::{Context, Result};
use cellar_server::{SeedData, Store, StoreServer};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tokio::signal;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Cellar Server - storefront backend
#[derive(Parser, Debug)]
#[command(name = "cellar-server")]
#[command(author = "Cellar Team")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Reference server for the Cellar storefront", long_about = None)]
struct Args {
    /// Bind address for the TCP listener
    #[arg(short, long, default_value = "127.0.0.1:4316")]
    bind: String,

    /// JSON file with accounts and wines (built-in data when omitted)
    #[arg(short, long)]
    seed: Option<PathBuf>,

    /// Seconds a connection may stay silent before it is closed
    #[arg(long, default_value_t = 30)]
    idle_timeout_secs: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Setup logging
    setup_logging(&args.log_level)?;

    info!("Starting Cellar Server v{}", env!("CARGO_PKG_VERSION"));

    let bind_addr: SocketAddr = args
        .bind
        .parse()
        .with_context(|| format!("Invalid bind address: {}", args.bind))?;

    let seed = match &args.seed {
        Some(path) => SeedData::from_file(path)?,
        None => SeedData::builtin(),
    };
    let store = Store::from_seed(&seed).context("Failed to load seed data")?;

    let server = StoreServer::bind(bind_addr, store)
        .await?
        .with_idle_timeout(Duration::from_secs(args.idle_timeout_secs));
    server.run_until(shutdown_signal()).await?;

    info!("Shutdown complete");
    Ok(())
}

/// Completes on Ctrl+C, or SIGTERM on unix
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm = match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(sigterm) => sigterm,
            Err(e) => {
                tracing::warn!("Failed to setup SIGTERM handler: {}", e);
                let _ = signal::ctrl_c().await;
                return;
            }
        };
        tokio::select! {
            _ = signal::ctrl_c() => info!("Received Ctrl+C, shutting down..."),
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        }
    }

    #[cfg(not(unix))]
    {
        let _ = signal::ctrl_c().await;
        info!("Received Ctrl+C, shutting down...");
    }
}

/// Setup logging with tracing
fn setup_logging(level: &str) -> Result<()> {
    let log_level = level.parse::<Level>().unwrap_or(Level::INFO);

    let filter = EnvFilter::builder()
        .with_default_directive(log_level.into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    Ok(())
}
