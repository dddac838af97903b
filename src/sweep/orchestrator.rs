//! Runs one balance monitor per enabled chain.

use std::sync::Arc;

use tokio::task::JoinSet;

use crate::blockchain::client::{ChainEndpoint, RpcEndpoint};
use crate::config::Settings;
use crate::lifecycle::Shutdown;
use crate::sweep::monitor::BalanceMonitor;
use crate::sweep::operation::SweepOperation;

/// Owns the lifetime of every chain's monitor task.
#[derive(Debug)]
pub struct Orchestrator {
    monitors: Vec<BalanceMonitor>,
}

impl Orchestrator {
    /// Build from pre-constructed monitors.
    pub fn new(monitors: Vec<BalanceMonitor>) -> Self {
        Self { monitors }
    }

    /// Connect an RPC endpoint for every configured chain.
    pub async fn connect(settings: &Settings) -> Self {
        let mut monitors = Vec::with_capacity(settings.chains.len());
        for chain in &settings.chains {
            let endpoint: Arc<dyn ChainEndpoint> = Arc::new(RpcEndpoint::connect(chain).await);
            let operation = SweepOperation::new(
                Arc::new(chain.clone()),
                endpoint,
                settings.account.clone(),
                settings.sweep_address,
            );
            monitors.push(BalanceMonitor::new(operation));
        }
        Self::new(monitors)
    }

    pub fn chain_names(&self) -> Vec<&str> {
        self.monitors.iter().map(|m| m.name()).collect()
    }

    /// Spawn every monitor and wait until all of them have stopped.
    ///
    /// Monitors only stop once `shutdown` is triggered. A monitor that panics
    /// is logged; the others keep running.
    pub async fn run(self, shutdown: &Shutdown) {
        let mut tasks = JoinSet::new();
        for monitor in self.monitors {
            let name = monitor.name().to_string();
            let rx = shutdown.subscribe();
            tasks.spawn(async move {
                monitor.run(rx).await;
                name
            });
        }

        tracing::info!(monitors = tasks.len(), "All balance monitors started");

        while let Some(result) = tasks.join_next().await {
            match result {
                Ok(name) => tracing::info!(chain = %name, "Balance monitor stopped"),
                Err(e) => tracing::error!(error = %e, "Balance monitor task failed"),
            }
        }
    }
}
