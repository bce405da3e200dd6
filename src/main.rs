//! Transaction broadcaster CLI.
//!
//! Broadcasts a price transaction to the node and waits for a final status.
//!
//! ```text
//! tx-broadcaster --symbol ETH --price 4500
//! tx-broadcaster --config client.toml --symbol BTC --price 67000 --max-wait 30
//! ```
//!
//! Status transitions go to stdout, logs to stderr. Exit code is 0 once a
//! terminal status is reached (whatever it is), 1 on any error, 130 when
//! interrupted.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use clap::Parser;

use tx_broadcaster::config::{self, ClientConfig};
use tx_broadcaster::observability::logging;
use tx_broadcaster::transaction::{
    BroadcastAndWaitError, PollPolicy, TransactionClient, TransactionStatus,
};

#[derive(Parser)]
#[command(name = "tx-broadcaster")]
#[command(about = "Broadcast a transaction and monitor its status", long_about = None)]
struct Cli {
    /// TOML configuration file; flags below override it.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Asset symbol, e.g. BTC.
    #[arg(long)]
    symbol: String,

    /// Quote price (uint64 on the node).
    #[arg(long)]
    price: u64,

    /// Unix timestamp; defaults to now.
    #[arg(long)]
    timestamp: Option<u64>,

    /// Node base URL.
    #[arg(long)]
    base_url: Option<String>,

    /// Per-request timeout (s).
    #[arg(long)]
    timeout: Option<f64>,

    /// Retry attempts on transient failures.
    #[arg(long)]
    max_retries: Option<u32>,

    /// Initial backoff delay (s).
    #[arg(long)]
    backoff: Option<f64>,

    /// Seconds between status checks.
    #[arg(long)]
    poll_interval: Option<f64>,

    /// Maximum seconds to wait for a terminal status.
    #[arg(long)]
    max_wait: Option<f64>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    /// Apply command-line overrides on top of a loaded config.
    fn apply(&self, config: &mut ClientConfig) {
        if let Some(url) = &self.base_url {
            config.node.base_url = url.clone();
        }
        if let Some(secs) = self.timeout {
            config.timeouts.request_ms = secs_to_ms(secs);
        }
        if let Some(retries) = self.max_retries {
            config.retries.max_retries = retries;
        }
        if let Some(secs) = self.backoff {
            config.retries.backoff_base_ms = secs_to_ms(secs);
        }
        if let Some(secs) = self.poll_interval {
            config.polling.interval_ms = secs_to_ms(secs);
        }
        if let Some(secs) = self.max_wait {
            config.polling.max_wait_ms = secs_to_ms(secs);
        }
        if let Some(level) = &self.log_level {
            config.observability.log_level = level.clone();
        }
    }
}

/// Negative and NaN inputs become 0 and fail validation.
fn secs_to_ms(secs: f64) -> u64 {
    (secs * 1000.0).round() as u64
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => match config::load_config(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load {}: {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        },
        None => ClientConfig::default(),
    };
    cli.apply(&mut config);

    // A second subscriber can only come from an embedding test harness.
    let _ = logging::init_logging(&config.observability.log_level);

    let client = match TransactionClient::new(&config) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let timestamp = cli.timestamp.unwrap_or_else(unix_now);
    let policy = PollPolicy::from(&config.polling);
    println!(
        "Broadcasting {} @ {} (timestamp={})",
        cli.symbol, cli.price, timestamp
    );

    let started = Instant::now();
    let mut print_status = |status: TransactionStatus| {
        println!(
            "[+{:>6.1}s] status -> {}",
            started.elapsed().as_secs_f64(),
            status
        );
    };

    let outcome = tokio::select! {
        outcome = client.broadcast_and_wait(
            &cli.symbol,
            cli.price,
            timestamp,
            policy,
            Some(&mut print_status),
        ) => outcome,
        _ = tokio::signal::ctrl_c() => {
            eprintln!("Interrupted");
            return ExitCode::from(130);
        }
    };

    match outcome {
        Ok((result, status)) => {
            println!(
                "Transaction {} finalized with status: {}",
                result.tx_hash, status
            );
            ExitCode::SUCCESS
        }
        Err(e @ BroadcastAndWaitError::Finality { .. }) if e.inner().is_timeout() => {
            tracing::error!(error = %e, "Finality timeout");
            eprintln!("Timed out while waiting for confirmation: {}", e.inner());
            ExitCode::FAILURE
        }
        Err(e) => {
            tracing::error!(
                stage = ?e.stage(),
                kind = %e.kind(),
                error = %e,
                cause = %e.inner(),
                "Request failed"
            );
            eprintln!("Request failed: {}: {}", e, e.inner());
            ExitCode::FAILURE
        }
    }
}
