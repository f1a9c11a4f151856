//! Serialized cache entries.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Default freshness when a response carries no usable `max-age`.
pub const DEFAULT_MAX_AGE_SECS: u64 = 600;

/// Snapshot of a proxied response as stored in the key-value store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Public-facing URL the response was served for.
    pub url: String,

    /// Buffered response body.
    pub body: String,

    /// Header pairs after deny-list filtering and origin rewriting.
    pub headers: HashMap<String, String>,

    /// HTTP status code.
    pub status: u16,

    /// Reason phrase.
    #[serde(rename = "statusText")]
    pub status_text: String,

    /// Absolute expiry, milliseconds since the UNIX epoch.
    pub expires: u64,
}

impl CacheEntry {
    /// True while the entry may still be served. Expiry is purely
    /// comparison-based; nothing deletes stale blobs.
    pub fn is_fresh(&self, now_ms: u64) -> bool {
        self.expires > now_ms
    }
}

/// Milliseconds of freshness granted by a `Cache-Control` header value.
///
/// Reads the `max-age` directive; absent or non-numeric values fall back to
/// [`DEFAULT_MAX_AGE_SECS`].
pub fn max_age_ms(cache_control: Option<&str>) -> u64 {
    cache_control
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .find_map(|directive| {
            let (name, value) = directive.split_once('=')?;
            name.trim()
                .eq_ignore_ascii_case("max-age")
                .then(|| value.trim().parse::<u64>().ok())
                .flatten()
        })
        .unwrap_or(DEFAULT_MAX_AGE_SECS)
        * 1000
}
