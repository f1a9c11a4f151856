//! Configuration schema definitions.
//!
//! The configuration is built once at startup and shared read-only through
//! the pipeline; nothing reads the environment per request.

/// Root configuration for the caching proxy.
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// URL prefix the proxy is mounted under. Empty when mounted at the root.
    pub base_path: String,

    /// Whether upstream responses are cached.
    pub cache_enabled: bool,

    /// Origin whose content is mirrored (e.g. "https://registry.npmjs.org").
    pub upstream_origin: String,

    /// Inbound bearer token requirement. `None` disables the auth gate.
    pub auth_token: Option<String>,

    /// Bearer token injected on outbound upstream requests.
    pub upstream_auth_token: Option<String>,

    /// Seconds of `Cache-Control: public, max-age=<n>` applied to redirect
    /// responses that carry no cache-control of their own. Zero disables it.
    pub cache_client_redirect_secs: u64,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            base_path: String::new(),
            cache_enabled: false,
            upstream_origin: String::new(),
            auth_token: None,
            upstream_auth_token: None,
            cache_client_redirect_secs: 0,
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone)]
pub struct ListenerConfig {
    /// Bind address (e.g. "0.0.0.0:8000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8000".to_string(),
        }
    }
}

/// Observability settings.
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    /// Whether the Prometheus exporter is started.
    pub metrics_enabled: bool,

    /// Bind address for the metrics endpoint.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9100".to_string(),
        }
    }
}
