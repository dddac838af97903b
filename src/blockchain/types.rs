//! Chain-specific types and error definitions.

use std::time::SystemTime;

use alloy::primitives::{Address, TxHash, U256};
use serde::Serialize;
use thiserror::Error;

/// Errors that can occur during blockchain operations.
#[derive(Debug, Clone, Error)]
pub enum ChainError {
    /// No node could be reached, or a read failed.
    #[error("Network error: {0}")]
    Network(String),

    /// The node rejected a broadcast transaction.
    #[error("Submission rejected: {0}")]
    Submission(String),

    /// Transaction could not be built or signed.
    #[error("Signing error: {0}")]
    Signing(String),

    /// Invalid private key format or derivation error.
    #[error("Wallet error: {0}")]
    Wallet(String),

    /// Chain configuration mismatch.
    #[error("Chain ID mismatch: expected {expected}, got {actual}")]
    ChainMismatch { expected: u64, actual: u64 },
}

impl ChainError {
    /// True when nothing reached the chain, so the attempt can be repeated.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ChainError::Network(_))
    }
}

/// Result type for blockchain operations.
pub type ChainResult<T> = Result<T, ChainError>;

/// One balance observation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceSnapshot {
    pub chain: String,
    /// Amount in wei.
    pub amount: U256,
    pub observed_at: SystemTime,
}

impl BalanceSnapshot {
    pub fn now(chain: &str, amount: U256) -> Self {
        Self {
            chain: chain.to_string(),
            amount,
            observed_at: SystemTime::now(),
        }
    }
}

/// A sweep transaction as logged before broadcast.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub from: Address,
    pub to: Address,
    pub value: U256,
    pub gas: u64,
    pub gas_price: u128,
    pub nonce: u64,
    pub chain_id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<TxHash>,
}
