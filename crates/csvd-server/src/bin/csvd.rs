//! csvd Server Daemon
//!
//! The `csvd` binary is the csvd server process that:
//! - Opens the table store (in memory or backed by a data directory)
//! - Starts the HTTP server for client connections
//! - Handles graceful shutdown on SIGTERM/SIGINT
//!
//! # Usage
//!
//! ```bash
//! # Start server with default settings (port 3737, memory only)
//! csvd
//!
//! # Persist tables under a data directory
//! csvd --data-dir /var/lib/csvd
//!
//! # Start on custom port
//! csvd --port 8080
//!
//! # Use configuration file
//! csvd --config /etc/csvd/csvd.toml
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use csvd_core::TableStore;
use csvd_server::config::ServerConfig;
use csvd_server::http::{HttpOptions, HttpServer};

/// csvd Server Daemon
#[derive(Parser, Debug)]
#[command(
    name = "csvd",
    version,
    about = "csvd named-table server",
    long_about = "csvd stores numeric tables by name and serves them as CSV over HTTP.\n\n\
                  This daemon opens the table store and listens for client connections."
)]
struct Args {
    /// Host address to bind to
    #[arg(short = 'H', long, env = "CSVD_HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short = 'p', long, env = "CSVD_PORT")]
    port: Option<u16>,

    /// Data directory for persistent storage
    #[arg(short = 'd', long, value_name = "DIR", env = "CSVD_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Configuration file path
    #[arg(short = 'c', long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Run in memory-only mode (no persistence)
    #[arg(long)]
    memory: bool,

    /// Largest accepted request body in MB
    #[arg(long, env = "CSVD_MAX_BODY_MB")]
    max_body_mb: Option<usize>,

    /// Log every request at info level
    #[arg(long)]
    log_requests: bool,

    /// Enable verbose logging
    #[arg(short = 'v', long)]
    verbose: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info", env = "CSVD_LOG_LEVEL")]
    log_level: String,

    /// Print configuration and exit
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    init_logging(&args);

    // Load configuration
    let config = load_config(&args)?;

    // Print config and exit if requested
    if args.print_config {
        println!("{}", config.to_toml()?);
        return Ok(());
    }

    info!("csvd v{}", env!("CARGO_PKG_VERSION"));

    run_server(config).await
}

fn init_logging(args: &Args) {
    let level = if args.verbose {
        "debug"
    } else {
        args.log_level.as_str()
    };

    let filter = EnvFilter::try_new(format!("csvd={level},csvd_server={level},csvd_core={level}"))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}

fn load_config(args: &Args) -> Result<ServerConfig> {
    // Start with defaults
    let mut config = if let Some(path) = &args.config {
        ServerConfig::from_file(path).context("Failed to load config file")?
    } else {
        ServerConfig::default()
    };

    // Override with command-line arguments
    if let Some(host) = &args.host {
        config.host = host.clone();
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(dir) = &args.data_dir {
        config.data_dir = Some(dir.clone());
    }
    if args.memory {
        config.memory_mode = true;
    }
    if let Some(mb) = args.max_body_mb {
        config.max_body_mb = mb;
    }
    if args.log_requests {
        config.request_logging = true;
    }

    Ok(config)
}

async fn run_server(config: ServerConfig) -> Result<()> {
    let store_config = config.store_config();
    match &store_config.data_dir {
        Some(dir) => info!("Data directory: {}", dir.display()),
        None => info!("Starting in memory-only mode (tables will not be persisted)"),
    }

    let store = TableStore::open(store_config).context("Failed to open table store")?;
    let store = Arc::new(store);

    let addr: SocketAddr = config
        .socket_addr()
        .parse()
        .context("Invalid server address")?;

    info!("Server configuration:");
    info!("  Listen address: {}", addr);
    info!("  Max body: {} MB", config.max_body_mb);
    info!("  Tables loaded: {}", store.len());

    let server = HttpServer::new(store.clone(), addr).with_options(HttpOptions::from(&config));

    info!("Press Ctrl+C to shutdown");
    if let Err(e) = server.serve_with_shutdown(shutdown_signal()).await {
        error!("Server error: {}", e);
        return Err(anyhow::anyhow!("Server error: {}", e));
    }

    info!("Shutting down gracefully...");
    let stats = store.stats();
    if stats.table_count > 0 && store.data_dir().is_none() {
        warn!(
            "Discarding {} in-memory tables ({} rows)",
            stats.table_count, stats.total_rows
        );
    }

    info!("Server stopped. Goodbye!");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
