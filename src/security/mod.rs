//! Security subsystem.
//!
//! # Design Decisions
//! - One static bearer token gates all inbound traffic; no other schemes
//! - The gate runs first, so rejected requests never reach the cache or
//!   the upstream

pub mod auth;
