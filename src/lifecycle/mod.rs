//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     .env → config → validate → connect endpoints → spawn monitors
//!
//! Shutdown (shutdown.rs):
//!     Signal received → broadcast → monitors finish in-flight sweep → exit 0
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → trigger shutdown
//! ```
//!
//! # Design Decisions
//! - Fail fast: any configuration error is fatal before any chain is contacted
//! - Monitors never stop on their own; only a signal ends the process normally

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
pub use signals::wait_for_signal;
