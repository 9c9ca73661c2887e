//! csvd load generator
//!
//! Drives a running csvd server with synthetic tables.
//!
//! # Usage
//!
//! ```bash
//! # Upload one 100-row frame under a generated name
//! csvd-load frame --rows 100
//!
//! # Ten concurrent writers, each to its own random name, then read back
//! csvd-load writers --writers 10 --rows 10 --verify
//! ```

use std::process::ExitCode;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tokio::task::JoinSet;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use csvd_client::{workload, Client, ClientConfig};
use csvd_core::{Table, TableName};

/// csvd load generator
#[derive(Parser, Debug)]
#[command(name = "csvd-load", version, about = "Generate traffic against a csvd server")]
struct Args {
    /// Server host
    #[arg(short = 'H', long, default_value = "localhost", env = "CSVD_HOST")]
    host: String,

    /// Server port
    #[arg(short = 'p', long, default_value_t = 3737, env = "CSVD_PORT")]
    port: u16,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 60)]
    timeout_secs: u64,

    /// Enable verbose logging
    #[arg(short = 'v', long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// POST one minute-indexed `val1`/`val2` table to `/frame`
    Frame {
        /// Number of rows
        #[arg(long, default_value_t = 100)]
        rows: usize,

        /// Fetch the table back and compare
        #[arg(long)]
        verify: bool,
    },

    /// Concurrent writers, each storing a `value` table under a random name
    Writers {
        /// Number of concurrent writers
        #[arg(short = 'n', long, default_value_t = 10)]
        writers: usize,

        /// Rows per table
        #[arg(long, default_value_t = 10)]
        rows: usize,

        /// Fetch every table back and compare
        #[arg(long)]
        verify: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let args = Args::parse();

    init_logging(args.verbose);

    let config = ClientConfig::new()
        .host(args.host.clone())
        .port(args.port)
        .request_timeout(Duration::from_secs(args.timeout_secs));
    let client = Client::new(config).context("Failed to create client")?;

    match args.command {
        Command::Frame { rows, verify } => run_frame(&client, rows, verify).await,
        Command::Writers {
            writers,
            rows,
            verify,
        } => run_writers(Arc::new(client), writers, rows, verify).await,
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("csvd_load=debug,csvd_client=debug")
    } else {
        EnvFilter::new("csvd_load=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();
}

async fn run_frame(client: &Client, rows: usize, verify: bool) -> Result<()> {
    let table = workload::random_frame(&mut rand::thread_rng(), rows)?;

    let start = Instant::now();
    let name = client
        .upload_frame(&table)
        .await
        .context("POST /frame failed")?;
    info!("Stored {} rows as '{}' in {:?}", rows, name, start.elapsed());
    println!("{}", name);

    if verify {
        check_round_trip(client, &name, &table).await?;
        info!("Verified '{}'", name);
    }
    Ok(())
}

async fn run_writers(client: Arc<Client>, writers: usize, rows: usize, verify: bool) -> Result<()> {
    let jobs: Vec<(TableName, Table)> = {
        let mut rng = rand::thread_rng();
        (0..writers)
            .map(|_| {
                let name = workload::random_name(&mut rng);
                workload::random_series(&mut rng, rows).map(|table| (name, table))
            })
            .collect::<Result<_, _>>()?
    };

    let start = Instant::now();
    let mut tasks = JoinSet::new();
    for (name, table) in jobs {
        let client = client.clone();
        tasks.spawn(async move {
            client
                .write_table(name.as_str(), &table)
                .await
                .with_context(|| format!("write '{}' failed", name))?;
            debug!("Wrote '{}'", name);

            if verify {
                check_round_trip(&client, &name, &table).await?;
            }
            Ok::<_, anyhow::Error>(name)
        });
    }

    let mut failures = 0usize;
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Ok(name)) => println!("{}", name),
            Ok(Err(e)) => {
                error!("{:#}", e);
                failures += 1;
            }
            Err(e) => {
                error!("writer task failed: {}", e);
                failures += 1;
            }
        }
    }

    info!(
        "{} writers finished in {:?}, {} failed",
        writers,
        start.elapsed(),
        failures
    );

    let stats = client.stats();
    debug!(
        "requests={} failed={} sent={}B received={}B",
        stats.requests, stats.failed_requests, stats.bytes_sent, stats.bytes_received
    );

    if failures > 0 {
        bail!("{} of {} writers failed", failures, writers);
    }
    Ok(())
}

async fn check_round_trip(client: &Client, name: &TableName, expected: &Table) -> Result<()> {
    let fetched = client
        .read_table(name.as_str())
        .await
        .with_context(|| format!("GET '{}' failed", name))?;
    if &fetched != expected {
        bail!("table '{}' read back differs from what was written", name);
    }
    Ok(())
}
