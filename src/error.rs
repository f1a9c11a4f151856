//! Crate-wide error types.

use thiserror::Error;

/// Errors surfaced by the proxy pipeline.
///
/// The handler maps these to responses: `Upstream` becomes 502, everything
/// else becomes an empty 500. No variant is allowed to crash the handler.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// The outbound request to the upstream origin failed at transport level.
    #[error("upstream request failed: {0}")]
    Upstream(String),

    /// The cache backend rejected a get or set.
    #[error("cache store error: {0}")]
    Cache(String),

    /// A cache entry could not be (de)serialized.
    #[error("cache entry serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    /// A response could not be assembled from its parts.
    #[error("response assembly failed: {0}")]
    Assembly(String),
}

impl From<reqwest::Error> for ProxyError {
    fn from(err: reqwest::Error) -> Self {
        ProxyError::Upstream(err.to_string())
    }
}
