//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, histograms)
//!
//! Per request:
//!     → timing.rs (phase durations → server-timing header)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//!     → Clients (server-timing diagnostics)
//! ```
//!
//! # Design Decisions
//! - Structured logging via the tracing crate
//! - Request ID flows through all log lines
//! - The phase timer is per-request state, not global

pub mod logging;
pub mod metrics;
pub mod timing;
