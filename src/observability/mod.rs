//! Observability subsystem.
//!
//! Log lines are the only operational surface: one per poll, decision,
//! transaction object, broadcast hash and error, each tagged with the chain.

pub mod logging;

pub use logging::init_logging;
