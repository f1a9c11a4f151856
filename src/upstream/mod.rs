//! Upstream fetch subsystem.
//!
//! # Design Decisions
//! - The transport sits behind a trait so tests can run the full pipeline
//!   against a deterministic fake
//! - Redirects are surfaced, never followed; the proxy rewrites `Location`
//!   itself
//! - No retries, no proxy-imposed timeouts; whatever the transport does is
//!   inherited

pub mod client;

pub use client::{HttpUpstream, UpstreamClient, UpstreamRequest, UpstreamResponse};
