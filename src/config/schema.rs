//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the sweeper.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the sweeper.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SweeperConfig {
    /// Monitored chains, one balance monitor each.
    pub chains: Vec<ChainConfig>,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            chains: default_chains(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Per-chain configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChainConfig {
    /// Chain identifier for logging (e.g., "Sepolia").
    pub name: String,

    /// Native currency ticker (e.g., "ETH").
    pub ticker: String,

    /// Whether a monitor is started for this chain.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// JSON-RPC endpoint URL. `${VAR}` placeholders are expanded from the environment.
    pub rpc_url: String,

    /// Failover JSON-RPC endpoint URLs, tried in order.
    #[serde(default)]
    pub failover_urls: Vec<String>,

    /// Expected chain ID. Queried from the node when unset.
    #[serde(default)]
    pub chain_id: Option<u64>,

    /// Balance polling interval in seconds.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Minimum sweepable balance, in whole native units (e.g., "0.0001").
    #[serde(default = "default_min_sweep")]
    pub min_sweep: String,

    /// Gas limit for a plain value transfer.
    #[serde(default = "default_gas_limit")]
    pub gas_limit: u64,

    /// Run one unconditional sweep before the first balance check.
    #[serde(default)]
    pub sweep_on_startup: bool,

    /// RPC request timeout in seconds.
    #[serde(default = "default_rpc_timeout_secs")]
    pub rpc_timeout_secs: u64,

    /// Keep the old baseline after a failed sweep so the next tick retries it.
    #[serde(default)]
    pub rearm_on_failure: bool,
}

impl ChainConfig {
    /// Build a chain entry with default tuning values.
    pub fn new(name: &str, ticker: &str, rpc_url: &str) -> Self {
        Self {
            name: name.to_string(),
            ticker: ticker.to_string(),
            enabled: true,
            rpc_url: rpc_url.to_string(),
            failover_urls: Vec::new(),
            chain_id: None,
            poll_interval_secs: default_poll_interval_secs(),
            min_sweep: default_min_sweep(),
            gas_limit: default_gas_limit(),
            sweep_on_startup: false,
            rpc_timeout_secs: default_rpc_timeout_secs(),
            rearm_on_failure: false,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_poll_interval_secs() -> u64 {
    15
}

fn default_min_sweep() -> String {
    "0.0001".to_string()
}

/// Gas used by a plain native-currency transfer.
pub const DEFAULT_TRANSFER_GAS: u64 = 21_000;

fn default_gas_limit() -> u64 {
    DEFAULT_TRANSFER_GAS
}

fn default_rpc_timeout_secs() -> u64 {
    10
}

/// Built-in chain table used when no config file is given.
pub fn default_chains() -> Vec<ChainConfig> {
    let mut mainnet = ChainConfig::new(
        "Mainnet",
        "ETH",
        "https://mainnet.infura.io/v3/${MAINNET_INFURA_API_KEY}",
    );
    mainnet.enabled = false;
    mainnet.chain_id = Some(1);

    let mut sepolia = ChainConfig::new(
        "Sepolia",
        "ETH",
        "https://sepolia.infura.io/v3/${SEPOLIA_INFURA_API_KEY}",
    );
    sepolia.chain_id = Some(11_155_111);

    let mut polygon = ChainConfig::new(
        "Polygon",
        "MATIC",
        "https://polygon-mainnet.infura.io/v3/${MAINNET_INFURA_API_KEY}",
    );
    polygon.chain_id = Some(137);
    polygon.sweep_on_startup = true;

    let mut base = ChainConfig::new("Base", "baseETH", "https://mainnet.base.org");
    base.enabled = false;
    base.chain_id = Some(8453);

    let mut sepolia_base = ChainConfig::new("SepoliaBase", "SepBaseETH", "https://sepolia.base.org");
    sepolia_base.chain_id = Some(84_532);
    sepolia_base.sweep_on_startup = true;

    vec![mainnet, sepolia, polygon, base, sepolia_base]
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
