//! Per-chain balance monitor.
//!
//! # States
//! - Idle: no sweep running, ticks read the balance
//! - Sweeping: one sweep attempt in flight, ticks are skipped
//!
//! # State Transitions
//! ```text
//! Idle → Sweeping: balance differs from the baseline (or startup sweep)
//! Sweeping → Idle: sweep attempt finished, whatever its outcome
//! ```
//!
//! The baseline becomes the balance read *before* the sweep started; it is
//! not re-read afterwards. The sweep's own debit shows up as a change on a
//! later tick and resolves to a no-op. A sweep that failed without reaching
//! any node keeps the old baseline, so the next tick tries again.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use alloy::primitives::utils::format_ether;
use alloy::primitives::{Address, U256};
use tokio::sync::broadcast;
use tokio::time::{self, MissedTickBehavior};

use crate::blockchain::client::ChainEndpoint;
use crate::blockchain::types::{BalanceSnapshot, ChainResult};
use crate::config::ChainSettings;
use crate::sweep::operation::{SweepOperation, SweepOutcome};

type SweepFuture = Pin<Box<dyn Future<Output = SweepOutcome> + Send>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Sweeping,
}

/// What a balance observation means for the monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// First successful read; recorded as the baseline.
    Baseline(U256),
    Unchanged,
    /// Balance moved; the monitor is now `Sweeping`.
    Changed { previous: U256, current: U256 },
}

/// Change-detection state owned by one monitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorState {
    previous_balance: Option<U256>,
    phase: Phase,
    /// Balance that triggered the in-flight sweep.
    pending_baseline: Option<U256>,
    rearm_on_failure: bool,
}

impl MonitorState {
    pub fn new(rearm_on_failure: bool) -> Self {
        Self {
            previous_balance: None,
            phase: Phase::Idle,
            pending_baseline: None,
            rearm_on_failure,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn previous_balance(&self) -> Option<U256> {
        self.previous_balance
    }

    /// Record a balance read taken while `Idle`.
    pub fn observe(&mut self, balance: U256) -> Observation {
        debug_assert_eq!(self.phase, Phase::Idle);
        match self.previous_balance {
            None => {
                self.previous_balance = Some(balance);
                Observation::Baseline(balance)
            }
            Some(previous) if previous == balance => Observation::Unchanged,
            Some(previous) => {
                self.phase = Phase::Sweeping;
                self.pending_baseline = Some(balance);
                Observation::Changed {
                    previous,
                    current: balance,
                }
            }
        }
    }

    /// Enter `Sweeping` for the unconditional startup sweep.
    pub fn begin_startup_sweep(&mut self) {
        self.phase = Phase::Sweeping;
        self.pending_baseline = None;
    }

    /// Return to `Idle` after a sweep attempt.
    ///
    /// The baseline advances to the pre-sweep balance unless the attempt
    /// never reached a node, or it failed and the chain rearms on failure.
    pub fn finish_sweep(&mut self, outcome: &SweepOutcome) {
        let retry = match outcome {
            SweepOutcome::Failed(e) => self.rearm_on_failure || e.is_retryable(),
            _ => false,
        };
        if let Some(balance) = self.pending_baseline.take() {
            if !retry {
                self.previous_balance = Some(balance);
            }
        }
        self.phase = Phase::Idle;
    }
}

/// Result of a single polling tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickResult {
    /// A sweep was in flight.
    Skipped,
    /// The balance read failed; state unchanged.
    ReadFailed,
    Observed(Observation),
}

/// Polls one chain and sweeps on balance changes.
pub struct BalanceMonitor {
    chain: Arc<ChainSettings>,
    endpoint: Arc<dyn ChainEndpoint>,
    address: Address,
    operation: SweepOperation,
    state: MonitorState,
    in_flight: Option<SweepFuture>,
}

impl BalanceMonitor {
    pub fn new(operation: SweepOperation) -> Self {
        let chain = operation.chain();
        let state = MonitorState::new(chain.rearm_on_failure);
        Self {
            chain,
            endpoint: operation.endpoint(),
            address: operation.address(),
            operation,
            state,
            in_flight: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.chain.name
    }

    pub fn state(&self) -> &MonitorState {
        &self.state
    }

    /// Run the startup sweep (if configured) and read the initial baseline.
    pub async fn initialize(&mut self) {
        if self.chain.sweep_on_startup {
            tracing::info!(chain = %self.chain.name, "Running startup sweep");
            self.state.begin_startup_sweep();
            let outcome = self.operation.run().await;
            self.state.finish_sweep(&outcome);
        }

        match self.read_balance().await {
            Ok(snapshot) => {
                self.state.observe(snapshot.amount);
                tracing::info!(
                    chain = %self.chain.name,
                    balance = %format_ether(snapshot.amount),
                    ticker = %self.chain.ticker,
                    "Initial balance"
                );
            }
            Err(e) => {
                tracing::error!(
                    chain = %self.chain.name,
                    error = %e,
                    "Initial balance read failed; baseline set on next successful poll"
                );
            }
        }
    }

    /// Handle one polling tick. A detected change starts a sweep without
    /// awaiting it; use [`Self::complete_sweep`] to drive it to completion.
    pub async fn tick(&mut self) -> TickResult {
        if self.state.phase() == Phase::Sweeping {
            tracing::info!(chain = %self.chain.name, "Sweep in progress, skipping balance check");
            return TickResult::Skipped;
        }

        let snapshot = match self.read_balance().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!(chain = %self.chain.name, error = %e, "Balance check failed");
                return TickResult::ReadFailed;
            }
        };

        let observation = self.state.observe(snapshot.amount);
        match observation {
            Observation::Baseline(balance) => {
                tracing::info!(
                    chain = %self.chain.name,
                    balance = %format_ether(balance),
                    ticker = %self.chain.ticker,
                    "Baseline balance established"
                );
            }
            Observation::Unchanged => {
                tracing::debug!(chain = %self.chain.name, "Balance unchanged");
            }
            Observation::Changed { current, .. } => {
                tracing::info!(
                    chain = %self.chain.name,
                    balance = %format_ether(current),
                    ticker = %self.chain.ticker,
                    "Balance changed"
                );
                let operation = self.operation.clone();
                self.in_flight = Some(Box::pin(async move { operation.run().await }));
            }
        }
        TickResult::Observed(observation)
    }

    /// Await the in-flight sweep, if any, and return to `Idle`.
    pub async fn complete_sweep(&mut self) -> Option<SweepOutcome> {
        let outcome = self.in_flight.take()?.await;
        self.state.finish_sweep(&outcome);
        Some(outcome)
    }

    /// Run the polling loop until shutdown.
    ///
    /// The sweep runs inside this task, concurrently with the ticker, so
    /// ticks that land while `Sweeping` are observed and skipped.
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            chain = %self.chain.name,
            interval_secs = self.chain.poll_interval.as_secs_f64(),
            "Balance monitor starting"
        );

        self.initialize().await;

        let mut ticker = time::interval_at(
            time::Instant::now() + self.chain.poll_interval,
            self.chain.poll_interval,
        );
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.tick().await;
                }
                outcome = wait_for(&mut self.in_flight), if self.in_flight.is_some() => {
                    self.in_flight = None;
                    self.state.finish_sweep(&outcome);
                }
                _ = shutdown.recv() => {
                    if self.in_flight.is_some() {
                        tracing::info!(chain = %self.chain.name, "Waiting for in-flight sweep before exit");
                        self.complete_sweep().await;
                    }
                    tracing::info!(chain = %self.chain.name, "Balance monitor received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    // Borrows only the fields it needs: the in-flight sweep makes the
    // monitor `!Sync`, so `&self` must not be held across an await.
    fn read_balance(&self) -> impl Future<Output = ChainResult<BalanceSnapshot>> + Send + 'static {
        let endpoint = Arc::clone(&self.endpoint);
        let chain = Arc::clone(&self.chain);
        let address = self.address;
        async move {
            let amount = endpoint.balance(address).await?;
            Ok(BalanceSnapshot::now(&chain.name, amount))
        }
    }
}

async fn wait_for(slot: &mut Option<SweepFuture>) -> SweepOutcome {
    match slot {
        Some(sweep) => sweep.await,
        None => std::future::pending().await,
    }
}

impl std::fmt::Debug for BalanceMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BalanceMonitor")
            .field("chain", &self.chain.name)
            .field("address", &self.address)
            .field("state", &self.state)
            .field("in_flight", &self.in_flight.is_some())
            .finish()
    }
}
