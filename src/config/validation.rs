//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Resolve credentials and `${VAR}` placeholders from the environment
//! - Validate value ranges (intervals > 0, gas limit > 0, parsable thresholds)
//! - Detect duplicate chain names
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Environment access goes through a lookup function so validation stays pure
//! - Runs before any chain connection is attempted

use std::collections::HashSet;
use std::time::Duration;

use alloy::primitives::utils::parse_ether;
use alloy::primitives::{Address, U256};
use thiserror::Error;
use url::Url;

use crate::blockchain::wallet::Account;
use crate::config::schema::{ChainConfig, SweeperConfig};

/// Environment variable holding the hex-encoded signing key.
pub const PRIVATE_KEY_ENV_VAR: &str = "PRIVATE_KEY";

/// Environment variable holding the destination address.
pub const SWEEP_ADDRESS_ENV_VAR: &str = "SWEEP_ADDRESS";

/// A single semantic configuration problem.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing required environment variable(s): {}", .0.join(", "))]
    MissingEnv(Vec<String>),

    #[error("invalid PRIVATE_KEY: {0}")]
    InvalidPrivateKey(String),

    #[error("invalid SWEEP_ADDRESS '{0}'")]
    InvalidSweepAddress(String),

    #[error("duplicate chain name '{0}'")]
    DuplicateChain(String),

    #[error("chain '{0}': poll_interval_secs must be greater than zero")]
    ZeroPollInterval(String),

    #[error("chain '{0}': rpc_timeout_secs must be greater than zero")]
    ZeroRpcTimeout(String),

    #[error("chain '{0}': gas_limit must be greater than zero")]
    ZeroGasLimit(String),

    #[error("chain '{chain}': invalid min_sweep '{value}'")]
    InvalidMinSweep { chain: String, value: String },

    #[error("chain '{chain}': invalid RPC URL '{url}': {reason}")]
    InvalidUrl {
        chain: String,
        url: String,
        reason: String,
    },

    #[error("no enabled chains configured")]
    NoEnabledChains,
}

/// Validated runtime settings for one chain.
#[derive(Debug, Clone)]
pub struct ChainSettings {
    pub name: String,
    pub ticker: String,
    /// Primary URL first, then failovers.
    pub rpc_urls: Vec<Url>,
    pub chain_id: Option<u64>,
    pub poll_interval: Duration,
    /// Minimum sweepable balance in wei.
    pub min_sweep: U256,
    pub gas_limit: u64,
    pub sweep_on_startup: bool,
    pub rpc_timeout: Duration,
    pub rearm_on_failure: bool,
}

/// Everything the sweeper needs to start, fully resolved.
#[derive(Debug, Clone)]
pub struct Settings {
    pub account: Account,
    pub sweep_address: Address,
    pub chains: Vec<ChainSettings>,
}

/// Validate the configuration and resolve it against the environment.
///
/// `lookup` returns the value of an environment variable; empty values count
/// as missing.
pub fn validate_config<F>(config: &SweeperConfig, lookup: F) -> Result<Settings, Vec<ValidationError>>
where
    F: Fn(&str) -> Option<String>,
{
    let lookup = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
    let mut errors = Vec::new();
    let mut missing = Vec::new();

    let private_key = lookup(PRIVATE_KEY_ENV_VAR);
    if private_key.is_none() {
        missing.push(PRIVATE_KEY_ENV_VAR.to_string());
    }
    let sweep_address = lookup(SWEEP_ADDRESS_ENV_VAR);
    if sweep_address.is_none() {
        missing.push(SWEEP_ADDRESS_ENV_VAR.to_string());
    }

    let mut seen = HashSet::new();
    for chain in &config.chains {
        if !seen.insert(chain.name.as_str()) {
            errors.push(ValidationError::DuplicateChain(chain.name.clone()));
        }
    }

    let mut chains = Vec::new();
    for chain in config.chains.iter().filter(|c| c.enabled) {
        if let Some(settings) = validate_chain(chain, &lookup, &mut missing, &mut errors) {
            chains.push(settings);
        }
    }
    if config.chains.iter().all(|c| !c.enabled) {
        errors.push(ValidationError::NoEnabledChains);
    }

    let account = private_key.and_then(|key| match Account::from_private_key(&key) {
        Ok(account) => Some(account),
        Err(e) => {
            errors.push(ValidationError::InvalidPrivateKey(e.to_string()));
            None
        }
    });

    let sweep_address = sweep_address.and_then(|raw| match raw.trim().parse::<Address>() {
        Ok(address) => Some(address),
        Err(_) => {
            errors.push(ValidationError::InvalidSweepAddress(raw));
            None
        }
    });

    if !missing.is_empty() {
        missing.dedup();
        errors.insert(0, ValidationError::MissingEnv(missing));
    }

    match (account, sweep_address) {
        (Some(account), Some(sweep_address)) if errors.is_empty() => Ok(Settings {
            account,
            sweep_address,
            chains,
        }),
        _ => Err(errors),
    }
}

fn validate_chain<F>(
    chain: &ChainConfig,
    lookup: &F,
    missing: &mut Vec<String>,
    errors: &mut Vec<ValidationError>,
) -> Option<ChainSettings>
where
    F: Fn(&str) -> Option<String>,
{
    let error_count = errors.len();

    if chain.poll_interval_secs == 0 {
        errors.push(ValidationError::ZeroPollInterval(chain.name.clone()));
    }
    if chain.rpc_timeout_secs == 0 {
        errors.push(ValidationError::ZeroRpcTimeout(chain.name.clone()));
    }
    if chain.gas_limit == 0 {
        errors.push(ValidationError::ZeroGasLimit(chain.name.clone()));
    }

    let min_sweep = parse_min_sweep(&chain.min_sweep);
    if min_sweep.is_none() {
        errors.push(ValidationError::InvalidMinSweep {
            chain: chain.name.clone(),
            value: chain.min_sweep.clone(),
        });
    }

    let mut rpc_urls = Vec::new();
    for template in std::iter::once(&chain.rpc_url).chain(chain.failover_urls.iter()) {
        let expanded = match expand_env(template, lookup) {
            Ok(expanded) => expanded,
            Err(names) => {
                for name in names {
                    if !missing.contains(&name) {
                        missing.push(name);
                    }
                }
                continue;
            }
        };
        match expanded.parse::<Url>() {
            Ok(url) => rpc_urls.push(url),
            Err(e) => errors.push(ValidationError::InvalidUrl {
                chain: chain.name.clone(),
                // Report the template so resolved API keys stay out of logs.
                url: template.clone(),
                reason: e.to_string(),
            }),
        }
    }

    if errors.len() > error_count || rpc_urls.len() != chain.failover_urls.len() + 1 {
        return None;
    }

    Some(ChainSettings {
        name: chain.name.clone(),
        ticker: chain.ticker.clone(),
        rpc_urls,
        chain_id: chain.chain_id,
        poll_interval: Duration::from_secs(chain.poll_interval_secs),
        min_sweep: min_sweep?,
        gas_limit: chain.gas_limit,
        sweep_on_startup: chain.sweep_on_startup,
        rpc_timeout: Duration::from_secs(chain.rpc_timeout_secs),
        rearm_on_failure: chain.rearm_on_failure,
    })
}

/// Parse a decimal amount of whole native units into wei.
pub fn parse_min_sweep(value: &str) -> Option<U256> {
    let value = value.trim();
    if value.is_empty() || value.starts_with('-') {
        return None;
    }
    parse_ether(value).ok()
}

/// Expand `${VAR}` placeholders, or return the names of unset variables.
pub fn expand_env<F>(template: &str, lookup: &F) -> Result<String, Vec<String>>
where
    F: Fn(&str) -> Option<String>,
{
    let mut out = String::with_capacity(template.len());
    let mut missing: Vec<String> = Vec::new();
    let mut rest = template;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            out.push_str(&rest[start..]);
            rest = "";
            break;
        };
        let name = &after[..end];
        match lookup(name) {
            Some(value) => out.push_str(&value),
            None if !missing.iter().any(|m| m == name) => missing.push(name.to_string()),
            None => {}
        }
        rest = &after[end + 1..];
    }
    out.push_str(rest);

    if missing.is_empty() {
        Ok(out)
    } else {
        Err(missing)
    }
}
