//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! environment variables
//!     → loader.rs (read once, validate)
//!     → ProxyConfig (validated, immutable)
//!     → shared via Arc to the request pipeline
//! ```
//!
//! # Design Decisions
//! - Config is read exactly once at startup; the pipeline never touches the
//!   environment
//! - Empty variables behave as unset
//! - Validation failures abort startup with a descriptive error

pub mod loader;
pub mod schema;

pub use loader::{load_from_env, ConfigError};
pub use schema::{ListenerConfig, ObservabilityConfig, ProxyConfig};
