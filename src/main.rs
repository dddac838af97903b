//! Multi-chain balance sweeper (v1)
//!
//! Watches one account's native balance on several EVM chains and sweeps
//! the spendable remainder to a fixed address whenever it changes.
//!
//! # Architecture Overview
//!
//! ```text
//!   ┌──────────────────────────────────────────────────────────────┐
//!   │                        BALANCE SWEEPER                        │
//!   │                                                               │
//!   │  ┌─────────┐    ┌──────────────┐   one task per chain         │
//!   │  │ config  │───▶│ orchestrator │──┬──────────────┬─────────┐  │
//!   │  │ + .env  │    └──────────────┘  ▼              ▼         ▼  │
//!   │  └─────────┘               ┌─────────────┐ ┌──────────┐  ...  │
//!   │                            │  monitor    │ │ monitor  │       │
//!   │                            │ Idle/Sweep  │ │          │       │
//!   │                            └──────┬──────┘ └──────────┘       │
//!   │                                   ▼                           │
//!   │                            ┌─────────────┐   ┌────────────┐   │
//!   │                            │   sweep     │──▶│ blockchain │───┼──▶ JSON-RPC node
//!   │                            │  operation  │   │ tx/wallet  │   │
//!   │                            └─────────────┘   └────────────┘   │
//!   └──────────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use alloy::primitives::utils::format_ether;
use clap::Parser;

use balance_sweeper::config::{load_config, resolve_from_env, Settings};
use balance_sweeper::lifecycle::{wait_for_signal, Shutdown};
use balance_sweeper::observability::init_logging;
use balance_sweeper::Orchestrator;

#[derive(Parser, Debug)]
#[command(name = "balance-sweeper")]
#[command(version, about = "Sweep native balances on several chains to one address", long_about = None)]
struct Args {
    /// Path to a TOML config file (built-in chain table when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    log_level: Option<String>,

    /// Validate configuration and credentials, then exit
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let config = match load_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            init_logging(args.log_level.as_deref().unwrap_or("info"));
            tracing::error!("Failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    init_logging(
        args.log_level
            .as_deref()
            .unwrap_or(&config.observability.log_level),
    );
    tracing::info!("balance-sweeper v{} starting", env!("CARGO_PKG_VERSION"));

    let settings = match resolve_from_env(&config) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };
    log_settings(&settings);

    if args.check {
        tracing::info!("Configuration OK");
        return ExitCode::SUCCESS;
    }

    let orchestrator = Orchestrator::connect(&settings).await;
    let shutdown = Shutdown::new();

    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        wait_for_signal().await;
        tracing::info!("Shutting down balance monitors");
        signal_shutdown.trigger();
    });

    orchestrator.run(&shutdown).await;

    tracing::info!("Shutdown complete");
    ExitCode::SUCCESS
}

fn log_settings(settings: &Settings) {
    tracing::info!(
        account = %settings.account.address(),
        sweep_address = %settings.sweep_address,
        chains = settings.chains.len(),
        "Configuration loaded"
    );
    for chain in &settings.chains {
        tracing::info!(
            chain = %chain.name,
            ticker = %chain.ticker,
            chain_id = ?chain.chain_id,
            interval_secs = chain.poll_interval.as_secs(),
            min_sweep = %format_ether(chain.min_sweep),
            gas_limit = chain.gas_limit,
            sweep_on_startup = chain.sweep_on_startup,
            "Chain configured"
        );
    }
}
