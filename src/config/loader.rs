//! Configuration loading from the environment.

use std::env;

use thiserror::Error;
use url::Url;

use crate::config::schema::{ListenerConfig, ObservabilityConfig, ProxyConfig};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("UPSTREAM_ORIGIN is required")]
    MissingUpstreamOrigin,

    #[error("UPSTREAM_ORIGIN is not a valid http(s) origin: {0}")]
    InvalidUpstreamOrigin(String),
}

/// Load and validate configuration from the process environment.
pub fn load_from_env() -> Result<ProxyConfig, ConfigError> {
    load(|name| env::var(name).ok())
}

/// Load configuration from an arbitrary variable source.
///
/// Empty values count as unset, so clearing a variable behaves the same as
/// removing it. `CACHE` and `METRICS` enable their feature only on the exact
/// value `"true"`; an unparsable `CACHE_CLIENT_REDIRECT` disables redirect
/// caching rather than failing startup.
pub fn load(lookup: impl Fn(&str) -> Option<String>) -> Result<ProxyConfig, ConfigError> {
    let nonempty = |name: &str| lookup(name).filter(|value| !value.is_empty());

    let upstream_origin = nonempty("UPSTREAM_ORIGIN").ok_or(ConfigError::MissingUpstreamOrigin)?;
    let parsed = Url::parse(&upstream_origin)
        .map_err(|_| ConfigError::InvalidUpstreamOrigin(upstream_origin.clone()))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(ConfigError::InvalidUpstreamOrigin(upstream_origin));
    }

    let cache_client_redirect_secs = nonempty("CACHE_CLIENT_REDIRECT")
        .and_then(|value| value.parse().ok())
        .unwrap_or(0);

    Ok(ProxyConfig {
        listener: ListenerConfig {
            bind_address: nonempty("BIND_ADDRESS")
                .unwrap_or_else(|| ListenerConfig::default().bind_address),
        },
        base_path: nonempty("BASE_PATH").unwrap_or_default(),
        cache_enabled: lookup("CACHE").as_deref() == Some("true"),
        upstream_origin,
        auth_token: nonempty("AUTH_TOKEN"),
        upstream_auth_token: nonempty("UPSTREAM_AUTH_TOKEN"),
        cache_client_redirect_secs,
        observability: ObservabilityConfig {
            metrics_enabled: lookup("METRICS").as_deref() == Some("true"),
            metrics_address: nonempty("METRICS_ADDRESS")
                .unwrap_or_else(|| ObservabilityConfig::default().metrics_address),
        },
    })
}
