//! Blockchain integration subsystem.
//!
//! # Data Flow
//! ```text
//! Environment Variables (private key, RPC URLs)
//!     → wallet.rs (key loading, signing)
//!     → client.rs (RPC reads and broadcast with timeouts)
//!     → transaction.rs (sweep decision, transfer request)
//! ```
//!
//! # Security Constraints
//! - Private keys ONLY from environment variables
//! - Never log private keys or sensitive data
//! - All RPC calls have configurable timeouts
//! - Graceful degradation when a chain is unreachable

pub mod client;
pub mod transaction;
pub mod types;
pub mod wallet;

pub use client::{ChainEndpoint, RpcEndpoint};
pub use transaction::{decide, SweepDecision, TransactionBuilder};
pub use types::{BalanceSnapshot, ChainError, ChainResult, TransactionRecord};
pub use wallet::{Account, SignedTransaction};
