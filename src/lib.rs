//! Multi-chain native balance sweeper library.

pub mod blockchain;
pub mod config;
pub mod lifecycle;
pub mod observability;
pub mod sweep;

pub use config::{Settings, SweeperConfig};
pub use lifecycle::Shutdown;
pub use sweep::Orchestrator;
