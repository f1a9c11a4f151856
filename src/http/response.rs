//! Response assembly.
//!
//! # Responsibilities
//! - Apply default-open CORS when the upstream sent no policy
//! - Trigger the cache write for eligible responses (awaited)
//! - Apply the configured client-side cache TTL to redirects
//! - Attach the `server-timing` phase trace
//! - Suppress bodies on statuses that must not carry one

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Response, StatusCode};
use std::collections::HashMap;

use crate::cache::{CacheEntry, CacheStore};
use crate::config::ProxyConfig;
use crate::error::ProxyError;
use crate::observability::metrics;
use crate::observability::timing::PhaseTimer;

/// Statuses that must not carry a body, per HTTP semantics.
pub const NULL_BODY_STATUS: [u16; 5] = [101, 103, 204, 205, 304];

const SERVER_TIMING: HeaderName = HeaderName::from_static("server-timing");

/// Uniform shape for live upstream responses and rehydrated cache entries.
#[derive(Debug, Clone)]
pub struct ResponseProps {
    /// Public-facing URL this response answers; doubles as the cache key.
    pub url: String,
    pub body: String,
    pub headers: HeaderMap,
    pub status: StatusCode,
    pub status_text: String,
}

impl ResponseProps {
    /// First value of `name`, when it is valid UTF-8.
    pub fn header_str(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// Snapshot for cache storage.
    pub fn to_entry(&self, expires: u64) -> CacheEntry {
        let headers: HashMap<String, String> = self
            .headers
            .iter()
            .filter_map(|(name, value)| {
                Some((name.as_str().to_string(), value.to_str().ok()?.to_string()))
            })
            .collect();
        CacheEntry {
            url: self.url.clone(),
            body: self.body.clone(),
            headers,
            status: self.status.as_u16(),
            status_text: self.status_text.clone(),
            expires,
        }
    }
}

impl TryFrom<CacheEntry> for ResponseProps {
    type Error = ProxyError;

    /// Rehydrate a stored entry. Header pairs that no longer parse are
    /// dropped; an out-of-range status fails the conversion.
    fn try_from(entry: CacheEntry) -> Result<Self, ProxyError> {
        let status = StatusCode::from_u16(entry.status)
            .map_err(|e| ProxyError::Assembly(e.to_string()))?;
        let mut headers = HeaderMap::with_capacity(entry.headers.len());
        for (name, value) in &entry.headers {
            if let (Ok(name), Ok(value)) = (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                headers.insert(name, value);
            }
        }
        Ok(Self {
            url: entry.url,
            body: entry.body,
            headers,
            status,
            status_text: entry.status_text,
        })
    }
}

/// 300 ≤ status < 400.
pub fn is_redirect(status: StatusCode) -> bool {
    status.is_redirection()
}

/// 200 ≤ status < 300.
pub fn is_ok(status: StatusCode) -> bool {
    status.is_success()
}

/// Assemble the final client response.
///
/// `cache` carries the store when a write should be attempted; eligibility
/// (2xx or 3xx) is checked here, so 4xx/5xx are never written. The write
/// happens before the redirect cache-control and timing headers are added,
/// so cached entries exclude both.
pub async fn finalize_response(
    mut props: ResponseProps,
    timer: &mut PhaseTimer,
    config: &ProxyConfig,
    cache: Option<&CacheStore>,
) -> Result<Response<Body>, ProxyError> {
    if !props.headers.contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN) {
        props.headers.insert(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        );
    }

    let redirect = is_redirect(props.status);
    if let Some(cache) = cache {
        if is_ok(props.status) || redirect {
            timer.mark("cache-write");
            cache.set(&props.url, &props).await?;
            timer.measure("cache-write");
            metrics::record_cache_event("write");
        }
    }

    if config.cache_client_redirect_secs > 0
        && redirect
        && !props.headers.contains_key(header::CACHE_CONTROL)
    {
        let value = format!("public, max-age={}", config.cache_client_redirect_secs);
        props.headers.insert(
            header::CACHE_CONTROL,
            HeaderValue::from_str(&value).map_err(|e| ProxyError::Assembly(e.to_string()))?,
        );
    }

    timer.measure("total");
    let timing = HeaderValue::from_str(&timer.header_value())
        .map_err(|e| ProxyError::Assembly(e.to_string()))?;
    props.headers.insert(SERVER_TIMING, timing);

    let body = if NULL_BODY_STATUS.contains(&props.status.as_u16()) {
        Body::empty()
    } else {
        Body::from(props.body)
    };
    let mut response = Response::new(body);
    *response.status_mut() = props.status;
    *response.headers_mut() = props.headers;
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{MemoryStore, SystemClock};
    use std::sync::Arc;

    fn props(status: StatusCode, pairs: &[(&str, &str)]) -> ResponseProps {
        let mut headers = HeaderMap::new();
        for (name, value) in pairs {
            headers.insert(
                HeaderName::from_bytes(name.as_bytes()).unwrap(),
                HeaderValue::from_str(value).unwrap(),
            );
        }
        ResponseProps {
            url: "https://registry.test/ms".into(),
            body: r#"{"name":"ms"}"#.into(),
            headers,
            status,
            status_text: status.canonical_reason().unwrap_or_default().into(),
        }
    }

    fn memory_cache() -> (CacheStore, Arc<MemoryStore>) {
        let kv = Arc::new(MemoryStore::new());
        (CacheStore::new(kv.clone(), Arc::new(SystemClock)), kv)
    }

    async fn body_string(response: Response<Body>) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn cors_defaults_to_open() {
        let mut timer = PhaseTimer::new();
        let response = finalize_response(
            props(StatusCode::OK, &[]),
            &mut timer,
            &ProxyConfig::default(),
            None,
        )
        .await
        .unwrap();
        assert_eq!(
            response.headers().get("access-control-allow-origin").unwrap(),
            "*"
        );
    }

    #[tokio::test]
    async fn existing_cors_policy_is_kept() {
        let mut timer = PhaseTimer::new();
        let response = finalize_response(
            props(
                StatusCode::OK,
                &[("access-control-allow-origin", "https://registry.test")],
            ),
            &mut timer,
            &ProxyConfig::default(),
            None,
        )
        .await
        .unwrap();
        assert_eq!(
            response.headers().get("access-control-allow-origin").unwrap(),
            "https://registry.test"
        );
    }

    #[tokio::test]
    async fn redirects_get_the_configured_cache_control() {
        let config = ProxyConfig {
            cache_client_redirect_secs: 3600,
            ..ProxyConfig::default()
        };
        let mut timer = PhaseTimer::new();
        let response = finalize_response(
            props(StatusCode::FOUND, &[("location", "https://registry.test/x")]),
            &mut timer,
            &config,
            None,
        )
        .await
        .unwrap();
        assert_eq!(
            response.headers().get("cache-control").unwrap(),
            "public, max-age=3600"
        );
    }

    #[tokio::test]
    async fn upstream_cache_control_is_not_overwritten() {
        let config = ProxyConfig {
            cache_client_redirect_secs: 3600,
            ..ProxyConfig::default()
        };
        let mut timer = PhaseTimer::new();
        let response = finalize_response(
            props(
                StatusCode::FOUND,
                &[
                    ("location", "https://registry.test/x"),
                    ("cache-control", "no-store"),
                ],
            ),
            &mut timer,
            &config,
            None,
        )
        .await
        .unwrap();
        assert_eq!(response.headers().get("cache-control").unwrap(), "no-store");
    }

    #[tokio::test]
    async fn successful_responses_are_written_to_the_cache() {
        let (cache, kv) = memory_cache();
        let mut timer = PhaseTimer::new();
        finalize_response(
            props(StatusCode::OK, &[]),
            &mut timer,
            &ProxyConfig::default(),
            Some(&cache),
        )
        .await
        .unwrap();
        assert!(kv.contains(&[
            "cache".to_string(),
            "https://registry.test/ms".to_string()
        ]));
    }

    #[tokio::test]
    async fn error_responses_are_never_cached() {
        let (cache, kv) = memory_cache();
        let mut timer = PhaseTimer::new();
        let response = finalize_response(
            props(StatusCode::NOT_FOUND, &[]),
            &mut timer,
            &ProxyConfig::default(),
            Some(&cache),
        )
        .await
        .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(kv.is_empty());
    }

    #[tokio::test]
    async fn cached_entries_exclude_the_timing_header() {
        let (cache, _) = memory_cache();
        let mut timer = PhaseTimer::new();
        finalize_response(
            props(StatusCode::OK, &[]),
            &mut timer,
            &ProxyConfig::default(),
            Some(&cache),
        )
        .await
        .unwrap();
        let entry = cache.get("https://registry.test/ms").await.unwrap();
        assert!(!entry.headers.contains_key("server-timing"));
    }

    #[tokio::test]
    async fn bodiless_statuses_are_suppressed() {
        for status in [101u16, 103, 204, 205, 304] {
            let mut timer = PhaseTimer::new();
            let response = finalize_response(
                props(StatusCode::from_u16(status).unwrap(), &[]),
                &mut timer,
                &ProxyConfig::default(),
                None,
            )
            .await
            .unwrap();
            assert_eq!(body_string(response).await, "", "status {status}");
        }
    }

    #[tokio::test]
    async fn timing_header_lists_recorded_phases() {
        let mut timer = PhaseTimer::new();
        timer.mark("total");
        timer.marker("cache-miss");
        let response = finalize_response(
            props(StatusCode::OK, &[]),
            &mut timer,
            &ProxyConfig::default(),
            None,
        )
        .await
        .unwrap();
        let value = response
            .headers()
            .get("server-timing")
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(value.contains("cache-miss"), "got {value}");
        assert!(value.contains("total"), "got {value}");
        assert_eq!(body_string(response).await, r#"{"name":"ms"}"#);
    }

    #[test]
    fn cache_entry_round_trips_through_props() {
        let original = props(StatusCode::OK, &[("content-type", "application/json")]);
        let rebuilt = ResponseProps::try_from(original.to_entry(42)).unwrap();
        assert_eq!(rebuilt.url, original.url);
        assert_eq!(rebuilt.body, original.body);
        assert_eq!(rebuilt.status, original.status);
        assert_eq!(rebuilt.status_text, original.status_text);
        assert_eq!(rebuilt.headers, original.headers);
    }
}
