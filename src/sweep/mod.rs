//! Sweep subsystem.
//!
//! # Data Flow
//! ```text
//! Orchestrator (one task per chain, JoinSet)
//!     → BalanceMonitor (poll, detect change, Idle/Sweeping guard)
//!     → SweepOperation (read, decide, sign, broadcast)
//!     → blockchain::transaction (decision + transfer request)
//!     → blockchain::client (broadcast)
//! ```
//!
//! # Design Decisions
//! - No state is shared between chains
//! - At most one sweep in flight per chain
//! - Every per-chain failure ends as a log line at the monitor boundary

pub mod monitor;
pub mod operation;
pub mod orchestrator;

pub use monitor::{BalanceMonitor, MonitorState, Observation, Phase, TickResult};
pub use operation::{SweepOperation, SweepOutcome};
pub use orchestrator::Orchestrator;
