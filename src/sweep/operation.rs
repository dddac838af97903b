//! One sweep attempt on one chain.

use std::sync::Arc;

use alloy::primitives::utils::format_ether;
use alloy::primitives::{Address, TxHash, U256};

use crate::blockchain::client::ChainEndpoint;
use crate::blockchain::transaction::{SweepDecision, TransactionBuilder};
use crate::blockchain::types::{ChainError, ChainResult};
use crate::blockchain::wallet::Account;
use crate::config::ChainSettings;

/// Result of a sweep attempt. Failures are values, never propagated.
#[derive(Debug, Clone)]
pub enum SweepOutcome {
    NoOp,
    InsufficientAfterGas,
    Swept(TxHash),
    Failed(ChainError),
}

/// Performs sweeps for a single chain.
#[derive(Clone)]
pub struct SweepOperation {
    chain: Arc<ChainSettings>,
    endpoint: Arc<dyn ChainEndpoint>,
    account: Account,
    builder: TransactionBuilder,
}

impl SweepOperation {
    pub fn new(
        chain: Arc<ChainSettings>,
        endpoint: Arc<dyn ChainEndpoint>,
        account: Account,
        sweep_address: Address,
    ) -> Self {
        let builder = TransactionBuilder::new(account.address(), sweep_address, chain.gas_limit);
        Self {
            chain,
            endpoint,
            account,
            builder,
        }
    }

    pub fn chain(&self) -> Arc<ChainSettings> {
        Arc::clone(&self.chain)
    }

    pub fn endpoint(&self) -> Arc<dyn ChainEndpoint> {
        Arc::clone(&self.endpoint)
    }

    /// Address being swept.
    pub fn address(&self) -> Address {
        self.account.address()
    }

    /// Run one sweep attempt and log its outcome.
    pub async fn run(&self) -> SweepOutcome {
        let outcome = match self.try_sweep().await {
            Ok(outcome) => outcome,
            Err(e) => SweepOutcome::Failed(e),
        };

        let chain = &self.chain.name;
        match &outcome {
            SweepOutcome::NoOp => tracing::info!(chain = %chain, "No funds to sweep"),
            SweepOutcome::InsufficientAfterGas => {
                tracing::info!(chain = %chain, "Not enough balance to cover gas fees")
            }
            SweepOutcome::Swept(hash) => {
                tracing::info!(chain = %chain, tx_hash = %hash, "Transaction successful")
            }
            SweepOutcome::Failed(e) => tracing::error!(chain = %chain, error = %e, "Error sweeping funds"),
        }
        outcome
    }

    async fn try_sweep(&self) -> ChainResult<SweepOutcome> {
        let address = self.account.address();
        let balance = self.endpoint.balance(address).await?;
        tracing::info!(
            chain = %self.chain.name,
            balance = %format_ether(balance),
            ticker = %self.chain.ticker,
            "Balance"
        );

        if balance < self.chain.min_sweep {
            return Ok(SweepOutcome::NoOp);
        }

        let gas_price = self.endpoint.gas_price().await?;
        let value = match self.builder.decide(balance, gas_price, self.chain.min_sweep) {
            SweepDecision::NoFunds => return Ok(SweepOutcome::NoOp),
            SweepDecision::InsufficientAfterGas { fee } => {
                tracing::debug!(chain = %self.chain.name, fee = %fee, "Gas fee exceeds balance");
                return Ok(SweepOutcome::InsufficientAfterGas);
            }
            SweepDecision::Transfer { value, .. } => value,
        };

        let nonce = self.endpoint.nonce(address).await?;
        let chain_id = self.endpoint.chain_id().await?;
        self.submit(value, gas_price, nonce, chain_id).await
    }

    async fn submit(
        &self,
        value: U256,
        gas_price: u128,
        nonce: u64,
        chain_id: u64,
    ) -> ChainResult<SweepOutcome> {
        let mut record = self.builder.record(value, gas_price, nonce, chain_id);
        tracing::info!(
            chain = %self.chain.name,
            tx = %serde_json::to_string(&record).unwrap_or_default(),
            "Transaction object"
        );

        let signed = self.account.sign(TransactionBuilder::request(&record)).await?;
        tracing::info!(chain = %self.chain.name, tx_hash = %signed.hash, "Signed transaction");

        let hash = self.endpoint.broadcast(signed.raw).await?;
        if hash != signed.hash {
            tracing::warn!(
                chain = %self.chain.name,
                local = %signed.hash,
                remote = %hash,
                "Node reported a different transaction hash"
            );
        }
        record.hash = Some(hash);
        tracing::debug!(
            chain = %self.chain.name,
            tx = %serde_json::to_string(&record).unwrap_or_default(),
            "Sweep record"
        );
        Ok(SweepOutcome::Swept(hash))
    }
}

impl std::fmt::Debug for SweepOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SweepOperation")
            .field("chain", &self.chain.name)
            .field("builder", &self.builder)
            .finish()
    }
}
