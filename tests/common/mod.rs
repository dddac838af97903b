//! Shared utilities for integration testing: a scripted in-memory chain.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use alloy::primitives::{keccak256, Address, Bytes, TxHash, U256};
use async_trait::async_trait;

use balance_sweeper::blockchain::{Account, ChainEndpoint, ChainError, ChainResult};
use balance_sweeper::config::ChainSettings;
use balance_sweeper::sweep::{BalanceMonitor, SweepOperation};

// Anvil's first account.
pub const TEST_PRIVATE_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

pub const GWEI: u128 = 1_000_000_000;

/// 1 ether in wei.
pub fn ether() -> U256 {
    U256::from(1_000_000_000_000_000_000u128)
}

/// Default threshold: 0.0001 ether.
pub fn min_sweep() -> U256 {
    U256::from(100_000_000_000_000u64)
}

pub fn sweep_address() -> Address {
    Address::repeat_byte(0x5e)
}

pub fn account() -> Account {
    Account::from_private_key(TEST_PRIVATE_KEY).unwrap()
}

pub fn chain_settings(name: &str) -> ChainSettings {
    ChainSettings {
        name: name.to_string(),
        ticker: "ETH".to_string(),
        rpc_urls: vec!["http://127.0.0.1:8545".parse().unwrap()],
        chain_id: Some(31337),
        poll_interval: Duration::from_millis(20),
        min_sweep: min_sweep(),
        gas_limit: 21_000,
        sweep_on_startup: false,
        rpc_timeout: Duration::from_secs(1),
        rearm_on_failure: false,
    }
}

pub fn operation(settings: ChainSettings, endpoint: Arc<MockEndpoint>) -> SweepOperation {
    SweepOperation::new(Arc::new(settings), endpoint, account(), sweep_address())
}

pub fn monitor(settings: ChainSettings, endpoint: Arc<MockEndpoint>) -> BalanceMonitor {
    BalanceMonitor::new(operation(settings, endpoint))
}

#[derive(Default)]
struct MockState {
    /// Scripted balance read results, consumed front first.
    script: VecDeque<ChainResult<U256>>,
    balance: U256,
    gas_price: u128,
    nonce: u64,
    /// Balance left after a successful broadcast.
    residual: U256,
    /// Error returned by every broadcast until cleared.
    broadcast_error: Option<ChainError>,
    fail_gas_price: bool,
    broadcast_delay: Duration,
    raw_txs: Vec<Bytes>,
}

/// In-memory chain endpoint with failure injection.
#[derive(Default)]
pub struct MockEndpoint {
    state: Mutex<MockState>,
    balance_reads: AtomicUsize,
    gas_price_reads: AtomicUsize,
    broadcasts_in_flight: AtomicUsize,
    max_concurrent_broadcasts: AtomicUsize,
}

impl MockEndpoint {
    pub fn new(balance: U256) -> Arc<Self> {
        let endpoint = Self::default();
        {
            let mut state = endpoint.state.lock().unwrap();
            state.balance = balance;
            state.gas_price = 20 * GWEI;
        }
        Arc::new(endpoint)
    }

    pub fn set_balance(&self, balance: U256) {
        self.state.lock().unwrap().balance = balance;
    }

    pub fn set_gas_price(&self, gas_price: u128) {
        self.state.lock().unwrap().gas_price = gas_price;
    }

    /// Queue results returned by the next balance reads.
    pub fn script_balances(&self, results: Vec<ChainResult<U256>>) {
        self.state.lock().unwrap().script.extend(results);
    }

    pub fn fail_next_balance_read(&self) {
        self.script_balances(vec![Err(ChainError::Network("connection reset".into()))]);
    }

    pub fn set_residual(&self, residual: U256) {
        self.state.lock().unwrap().residual = residual;
    }

    /// Node answers every broadcast with a rejection.
    pub fn reject_broadcasts(&self, reason: &str) {
        self.state.lock().unwrap().broadcast_error = Some(ChainError::Submission(reason.to_string()));
    }

    /// No node can be reached for broadcasts.
    pub fn drop_broadcasts(&self, reason: &str) {
        self.state.lock().unwrap().broadcast_error = Some(ChainError::Network(reason.to_string()));
    }

    pub fn accept_broadcasts(&self) {
        self.state.lock().unwrap().broadcast_error = None;
    }

    pub fn fail_gas_price(&self, fail: bool) {
        self.state.lock().unwrap().fail_gas_price = fail;
    }

    pub fn set_broadcast_delay(&self, delay: Duration) {
        self.state.lock().unwrap().broadcast_delay = delay;
    }

    pub fn balance_reads(&self) -> usize {
        self.balance_reads.load(Ordering::SeqCst)
    }

    pub fn gas_price_reads(&self) -> usize {
        self.gas_price_reads.load(Ordering::SeqCst)
    }

    /// Accepted broadcasts.
    pub fn broadcasts(&self) -> usize {
        self.state.lock().unwrap().raw_txs.len()
    }

    pub fn raw_txs(&self) -> Vec<Bytes> {
        self.state.lock().unwrap().raw_txs.clone()
    }

    pub fn max_concurrent_broadcasts(&self) -> usize {
        self.max_concurrent_broadcasts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChainEndpoint for MockEndpoint {
    async fn balance(&self, _address: Address) -> ChainResult<U256> {
        self.balance_reads.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().unwrap();
        match state.script.pop_front() {
            Some(result) => result,
            None => Ok(state.balance),
        }
    }

    async fn gas_price(&self) -> ChainResult<u128> {
        self.gas_price_reads.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock().unwrap();
        if state.fail_gas_price {
            return Err(ChainError::Network("gas price unavailable".into()));
        }
        Ok(state.gas_price)
    }

    async fn nonce(&self, _address: Address) -> ChainResult<u64> {
        Ok(self.state.lock().unwrap().nonce)
    }

    async fn chain_id(&self) -> ChainResult<u64> {
        Ok(31337)
    }

    async fn broadcast(&self, raw_tx: Bytes) -> ChainResult<TxHash> {
        let in_flight = self.broadcasts_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_concurrent_broadcasts.fetch_max(in_flight, Ordering::SeqCst);

        let delay = self.state.lock().unwrap().broadcast_delay;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let result = {
            let mut state = self.state.lock().unwrap();
            match state.broadcast_error.clone() {
                Some(error) => Err(error),
                None => {
                    let hash = keccak256(&raw_tx);
                    state.raw_txs.push(raw_tx);
                    state.balance = state.residual;
                    state.nonce += 1;
                    Ok(hash)
                }
            }
        };

        self.broadcasts_in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}
