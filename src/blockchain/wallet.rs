//! The swept account and transaction signing.
//!
//! # Security
//! - The private key is loaded ONLY from the environment
//! - Keys are never logged or serialized
//! - The same key and address are used on every chain

use alloy::eips::eip2718::Encodable2718;
use alloy::network::{EthereumWallet, TransactionBuilder};
use alloy::primitives::{keccak256, Address, Bytes, TxHash};
use alloy::rpc::types::TransactionRequest;
use alloy::signers::local::PrivateKeySigner;

use crate::blockchain::types::{ChainError, ChainResult};

/// A signed transaction ready for broadcast.
#[derive(Debug, Clone)]
pub struct SignedTransaction {
    /// EIP-2718 encoded bytes.
    pub raw: Bytes,
    /// Hash of the encoded transaction.
    pub hash: TxHash,
}

/// The keypair-derived account shared read-only by all chains.
#[derive(Clone)]
pub struct Account {
    address: Address,
    wallet: EthereumWallet,
}

impl Account {
    /// Create an account from a hex-encoded private key string.
    ///
    /// # Arguments
    /// * `private_key_hex` - Hex string (with or without 0x prefix)
    pub fn from_private_key(private_key_hex: &str) -> ChainResult<Self> {
        let key_hex = private_key_hex.trim();
        let key_hex = key_hex.strip_prefix("0x").unwrap_or(key_hex);

        let signer: PrivateKeySigner = key_hex
            .parse()
            .map_err(|e| ChainError::Wallet(format!("Invalid private key format: {}", e)))?;

        Ok(Self::from_signer(signer))
    }

    pub fn from_signer(signer: PrivateKeySigner) -> Self {
        Self {
            address: signer.address(),
            wallet: EthereumWallet::from(signer),
        }
    }

    /// Get the account's address.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Sign a fully populated transaction request.
    ///
    /// The request must carry nonce, gas price, gas limit and chain id.
    pub async fn sign(&self, request: TransactionRequest) -> ChainResult<SignedTransaction> {
        let envelope = request
            .build(&self.wallet)
            .await
            .map_err(|e| ChainError::Signing(e.to_string()))?;

        let raw: Bytes = envelope.encoded_2718().into();
        let hash = keccak256(&raw);
        Ok(SignedTransaction { raw, hash })
    }
}

impl std::fmt::Debug for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Account")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}
