//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! .env (dotenvy) + optional config file (TOML)
//!     → loader.rs (parse & deserialize, or built-in chain table)
//!     → validation.rs (env resolution & semantic checks)
//!     → Settings (validated, immutable)
//!     → one ChainSettings handed to each balance monitor
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no reload
//! - All tuning fields have defaults to allow minimal configs
//! - Secrets come only from the environment, never from the file

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, resolve_from_env, ConfigError};
pub use schema::{ChainConfig, ObservabilityConfig, SweeperConfig};
pub use validation::{validate_config, ChainSettings, Settings, ValidationError};
