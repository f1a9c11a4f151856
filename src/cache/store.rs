//! Cache persistence against a key-value store.
//!
//! The storage engine is behind the [`KvStore`] trait; the proxy only relies
//! on its get/set contract. Reads tolerate missing, stale, and corrupt blobs
//! by reporting a miss, so storage trouble degrades to upstream fetches
//! instead of failed requests.

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::cache::entry::{max_age_ms, CacheEntry};
use crate::error::ProxyError;
use crate::http::response::ResponseProps;

/// Key prefix under which response snapshots live.
const CACHE_PREFIX: &str = "cache";

/// Get/set contract of the external key-value service. Keys are composite
/// paths; values are opaque blobs.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &[String]) -> Result<Option<Vec<u8>>, ProxyError>;
    async fn set(&self, key: &[String], value: Vec<u8>) -> Result<(), ProxyError>;
}

/// In-process store backed by a concurrent map. Last write for a key wins;
/// concurrent writers are not coordinated.
#[derive(Default)]
pub struct MemoryStore {
    inner: DashMap<Vec<String>, Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored blobs.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Whether a blob exists under the given key.
    pub fn contains(&self, key: &[String]) -> bool {
        self.inner.contains_key(key)
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &[String]) -> Result<Option<Vec<u8>>, ProxyError> {
        Ok(self.inner.get(key).map(|entry| entry.value().clone()))
    }

    async fn set(&self, key: &[String], value: Vec<u8>) -> Result<(), ProxyError> {
        self.inner.insert(key.to_vec(), value);
        Ok(())
    }
}

/// Time source for expiry decisions.
pub trait Clock: Send + Sync {
    /// Milliseconds since the UNIX epoch.
    fn now_ms(&self) -> u64;
}

/// Wall-clock time.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }
}

/// TTL-gated read/write of response snapshots.
pub struct CacheStore {
    kv: Arc<dyn KvStore>,
    clock: Arc<dyn Clock>,
}

impl CacheStore {
    pub fn new(kv: Arc<dyn KvStore>, clock: Arc<dyn Clock>) -> Self {
        Self { kv, clock }
    }

    /// Look up a fresh entry for the given public URL.
    ///
    /// Missing, expired, and undecodable blobs are all misses; storage
    /// errors are logged and reported as misses too.
    pub async fn get(&self, url: &str) -> Option<CacheEntry> {
        let blob = match self.kv.get(&Self::key(url)).await {
            Ok(blob) => blob?,
            Err(e) => {
                tracing::warn!(error = %e, url, "Cache read failed");
                return None;
            }
        };
        let entry: CacheEntry = match serde_json::from_slice(&blob) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(error = %e, url, "Discarding undecodable cache entry");
                return None;
            }
        };
        entry.is_fresh(self.clock.now_ms()).then_some(entry)
    }

    /// Snapshot a response, with freshness taken from its `Cache-Control`
    /// header. Whether the response should be cached at all is the caller's
    /// decision.
    pub async fn set(&self, url: &str, props: &ResponseProps) -> Result<(), ProxyError> {
        let expires = self.clock.now_ms() + max_age_ms(props.header_str("cache-control"));
        let blob = serde_json::to_vec(&props.to_entry(expires))?;
        self.kv.set(&Self::key(url), blob).await
    }

    fn key(url: &str) -> Vec<String> {
        vec![CACHE_PREFIX.to_string(), url.to_string()]
    }
}
