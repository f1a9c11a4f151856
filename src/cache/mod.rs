//! Response caching subsystem.
//!
//! # Data Flow
//! ```text
//! Response Assembler
//!     → store.rs (CacheStore.set: TTL from Cache-Control, serde_json blob)
//!     → KvStore (["cache", <public URL>] → bytes)
//!
//! Request Handler
//!     → store.rs (CacheStore.get: decode, expiry check)
//!     → fresh CacheEntry or miss
//! ```
//!
//! # Design Decisions
//! - No eviction beyond TTL comparison; stale blobs simply stop matching
//! - Storage faults and corrupt blobs degrade to misses, never to errors
//! - The clock is injected so expiry is deterministic under test

pub mod entry;
pub mod store;

pub use entry::CacheEntry;
pub use store::{CacheStore, Clock, KvStore, MemoryStore, SystemClock};
