//! Chain endpoint: the RPC surface a balance monitor needs.
//!
//! # Responsibilities
//! - Connect to JSON-RPC endpoints (primary + failovers)
//! - Query native balance, gas price, nonce and chain id
//! - Broadcast signed raw transactions
//! - Bound every call with the chain's RPC timeout
//! - Keep provider URLs (and the API keys in them) out of error text

use alloy::primitives::{keccak256, Address, Bytes, TxHash, U256};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::transports::RpcError;
use async_trait::async_trait;
use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use url::Url;

use crate::blockchain::types::{ChainError, ChainResult};
use crate::config::ChainSettings;

/// Node operations used by a sweep. Stateless across calls.
#[async_trait]
pub trait ChainEndpoint: Send + Sync {
    /// Native balance of `address` in wei.
    async fn balance(&self, address: Address) -> ChainResult<U256>;

    /// Current gas price in wei.
    async fn gas_price(&self) -> ChainResult<u128>;

    /// Next nonce for `address`.
    async fn nonce(&self, address: Address) -> ChainResult<u64>;

    /// Chain id used for EIP-155 signing.
    async fn chain_id(&self) -> ChainResult<u64>;

    /// Submit an EIP-2718 encoded signed transaction.
    ///
    /// `Submission` means a node rejected the transaction; `Network` means
    /// no node could be reached and nothing is known to have been accepted.
    async fn broadcast(&self, raw_tx: Bytes) -> ChainResult<TxHash>;
}

/// JSON-RPC endpoint with failover support.
#[derive(Clone)]
pub struct RpcEndpoint {
    /// Chain name, for logging.
    chain: String,
    /// List of providers (primary + failovers).
    providers: Vec<Arc<dyn Provider + Send + Sync>>,
    /// Configured chain id, if any.
    chain_id: Option<u64>,
    /// Request timeout duration.
    timeout_duration: Duration,
}

impl RpcEndpoint {
    /// Create an endpoint for one chain.
    ///
    /// Connection is lazy; a configured chain id is verified up front but a
    /// mismatch or unreachable node only produces a warning.
    pub async fn connect(settings: &ChainSettings) -> Self {
        let providers = settings
            .rpc_urls
            .iter()
            .map(|url| {
                Arc::new(ProviderBuilder::new().connect_http(url.clone()))
                    as Arc<dyn Provider + Send + Sync>
            })
            .collect();

        let endpoint = Self {
            chain: settings.name.clone(),
            providers,
            chain_id: settings.chain_id,
            timeout_duration: settings.rpc_timeout,
        };

        match endpoint.verify_chain_id().await {
            Ok(()) => {
                tracing::info!(
                    chain = %settings.name,
                    providers = settings.rpc_urls.len(),
                    "Chain endpoint initialized"
                );
            }
            Err(e) => {
                tracing::warn!(
                    chain = %settings.name,
                    error = %e,
                    "Chain endpoint initialized but chain verification failed"
                );
            }
        }

        endpoint
    }

    /// Verify the connected chain ID matches configuration.
    pub async fn verify_chain_id(&self) -> ChainResult<()> {
        let Some(expected) = self.chain_id else {
            return Ok(());
        };
        let actual = self.remote_chain_id().await?;
        if actual != expected {
            return Err(ChainError::ChainMismatch { expected, actual });
        }
        Ok(())
    }

    async fn remote_chain_id(&self) -> ChainResult<u64> {
        self.with_failover("get chain id", |provider| provider.get_chain_id())
            .await
    }

    /// Run `call` against each provider in turn until one answers in time.
    async fn with_failover<T, E, F, Fut>(&self, what: &str, call: F) -> ChainResult<T>
    where
        F: Fn(&Arc<dyn Provider + Send + Sync>) -> Fut,
        Fut: IntoFuture<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let mut last_error = String::from("no providers configured");
        for (i, provider) in self.providers.iter().enumerate() {
            match timeout(self.timeout_duration, call(provider)).await {
                Ok(Ok(result)) => return Ok(result),
                Ok(Err(e)) => {
                    let error = redact_urls(&e.to_string());
                    tracing::warn!(chain = %self.chain, provider_idx = i, error = %error, "RPC error");
                    last_error = format!("provider {}: {}", i, error);
                }
                Err(_) => {
                    tracing::warn!(chain = %self.chain, provider_idx = i, "RPC timeout");
                    last_error = format!("provider {}: timeout after {:?}", i, self.timeout_duration);
                }
            }
        }
        Err(ChainError::Network(format!(
            "All providers failed to {}: {}",
            what, last_error
        )))
    }
}

#[async_trait]
impl ChainEndpoint for RpcEndpoint {
    async fn balance(&self, address: Address) -> ChainResult<U256> {
        self.with_failover("get balance", |provider| provider.get_balance(address))
            .await
    }

    async fn gas_price(&self) -> ChainResult<u128> {
        self.with_failover("get gas price", |provider| provider.get_gas_price())
            .await
    }

    async fn nonce(&self, address: Address) -> ChainResult<u64> {
        self.with_failover("get transaction count", |provider| {
            provider.get_transaction_count(address).pending()
        })
        .await
    }

    async fn chain_id(&self) -> ChainResult<u64> {
        match self.chain_id {
            Some(id) => Ok(id),
            None => self.remote_chain_id().await,
        }
    }

    async fn broadcast(&self, raw_tx: Bytes) -> ChainResult<TxHash> {
        // A node's rejection is final. Transport failures move on to the next
        // provider; resending the same signed bytes cannot double-spend.
        let mut last_error = String::from("no providers configured");
        for (i, provider) in self.providers.iter().enumerate() {
            match timeout(self.timeout_duration, provider.send_raw_transaction(&raw_tx)).await {
                Ok(Ok(pending)) => return Ok(*pending.tx_hash()),
                Ok(Err(RpcError::ErrorResp(payload))) => {
                    if is_already_known(&payload.message) {
                        tracing::info!(chain = %self.chain, provider_idx = i, "Transaction already known to node");
                        return Ok(keccak256(&raw_tx));
                    }
                    return Err(ChainError::Submission(redact_urls(&payload.message)));
                }
                Ok(Err(e)) => {
                    let error = redact_urls(&e.to_string());
                    tracing::warn!(chain = %self.chain, provider_idx = i, error = %error, "Broadcast failed");
                    last_error = format!("provider {}: {}", i, error);
                }
                Err(_) => {
                    tracing::warn!(chain = %self.chain, provider_idx = i, "Broadcast timeout");
                    last_error = format!("provider {}: timeout after {:?}", i, self.timeout_duration);
                }
            }
        }
        Err(ChainError::Network(format!(
            "All providers failed to send transaction: {}",
            last_error
        )))
    }
}

/// Node replies meaning the transaction is already in its pool.
fn is_already_known(message: &str) -> bool {
    let message = message.to_ascii_lowercase();
    message.contains("already known") || message.contains("known transaction")
}

/// Reduce every URL in `text` to its scheme, host and port.
///
/// Provider URLs carry API keys in their path or query, and HTTP client
/// errors quote the full request URL.
fn redact_urls(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(idx) = rest.find("://") {
        let start = rest[..idx]
            .char_indices()
            .rev()
            .take_while(|&(_, c)| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
            .last()
            .map_or(idx, |(i, _)| i);
        let end = rest[idx..]
            .find(|c: char| c.is_whitespace() || matches!(c, ')' | '(' | '"' | '\'' | '<' | '>' | ','))
            .map_or(rest.len(), |offset| idx + offset);

        out.push_str(&rest[..start]);
        match Url::parse(&rest[start..end]) {
            Ok(url) => {
                out.push_str(url.scheme());
                out.push_str("://");
                out.push_str(url.host_str().unwrap_or_default());
                if let Some(port) = url.port() {
                    out.push_str(&format!(":{}", port));
                }
            }
            Err(_) => out.push_str("<url>"),
        }
        rest = &rest[end..];
    }
    out.push_str(rest);
    out
}

impl std::fmt::Debug for RpcEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcEndpoint")
            .field("chain", &self.chain)
            .field("providers", &self.providers.len())
            .field("chain_id", &self.chain_id)
            .field("timeout", &self.timeout_duration)
            .finish()
    }
}
