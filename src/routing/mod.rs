//! URL translation subsystem.
//!
//! # Data Flow
//! ```text
//! inbound request URL + X-Real-Origin + ProxyConfig
//!     → context.rs (RequestContext)
//!     → upstream target, public cache key, origin substitution
//! ```
//!
//! # Design Decisions
//! - Translation is a pure function of (config, request); no global state
//! - The public self URL is real-origin aware, so cache keys stay stable
//!   across multiple trusted front doors

pub mod context;

pub use context::RequestContext;
