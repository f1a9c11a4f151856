//! URL translation for one request.
//!
//! Computes the self/upstream/public URLs a request resolves to, and the
//! origin substitution applied to response header values. This is what makes
//! responses appear to originate from the proxy's own public address.

use url::Url;

use crate::config::ProxyConfig;

/// Per-request URL translation derived from the config and inbound request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Mount prefix wrapped as `/<value>/`, consecutive slashes collapsed.
    pub base_path: String,

    /// Upstream origin with exactly one trailing slash.
    pub upstream_origin: String,

    /// This listener's origin plus base path.
    pub self_origin_actual: String,

    /// Externally visible origin plus base path. Differs from
    /// `self_origin_actual` when a trusted front door sends `X-Real-Origin`.
    pub self_origin_final: String,

    /// Fully resolved outbound target for this request.
    pub upstream_url: Url,

    /// Request URL as seen from the public origin; used as the cache key.
    pub public_self_url: String,
}

impl RequestContext {
    /// Derive the translation for one request.
    ///
    /// `real_origin` is the raw `X-Real-Origin` header value; when absent or
    /// unparsable the request's own origin is used.
    pub fn new(
        config: &ProxyConfig,
        request_url: &Url,
        real_origin: Option<&str>,
    ) -> Result<Self, url::ParseError> {
        let base_path = collapse_slashes(&format!("/{}/", config.base_path));
        let upstream_origin = normalize_origin(&config.upstream_origin);

        let self_origin = request_url.origin().ascii_serialization();
        let final_origin = real_origin
            .and_then(|value| Url::parse(value).ok())
            .map(|url| url.origin().ascii_serialization())
            .unwrap_or_else(|| self_origin.clone());

        let self_origin_actual = format!("{self_origin}{base_path}");
        let self_origin_final = format!("{final_origin}{base_path}");

        // Strip the mount prefix once, then resolve what remains against the
        // upstream origin. An unmatched prefix leaves the URL absolute, and
        // join() passes absolute inputs through untouched.
        let stripped = request_url.as_str().replacen(&self_origin_actual, "", 1);
        let upstream_url = Url::parse(&upstream_origin)?.join(&stripped)?;

        let public_self_url = request_url
            .as_str()
            .replacen(&self_origin, &final_origin, 1);

        Ok(Self {
            base_path,
            upstream_origin,
            self_origin_actual,
            self_origin_final,
            upstream_url,
            public_self_url,
        })
    }

    /// Replace every occurrence of the upstream origin with the public self
    /// origin, ignoring ASCII case. Applied to all response header values,
    /// not just `Location`, since any value could embed the origin.
    pub fn replace_origin(&self, value: &str) -> String {
        replace_all_ignore_ascii_case(value, &self.upstream_origin, &self.self_origin_final)
    }
}

/// Collapse runs of `/` into a single slash.
fn collapse_slashes(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut previous_slash = false;
    for c in path.chars() {
        if c == '/' {
            if previous_slash {
                continue;
            }
            previous_slash = true;
        } else {
            previous_slash = false;
        }
        out.push(c);
    }
    out
}

/// Normalize an origin to exactly one trailing slash. Idempotent for values
/// configured with or without one.
fn normalize_origin(origin: &str) -> String {
    format!("{}/", origin.trim_end_matches('/'))
}

/// Global case-insensitive substring replacement. ASCII case only, which
/// covers URL origins.
fn replace_all_ignore_ascii_case(haystack: &str, needle: &str, replacement: &str) -> String {
    if needle.is_empty() {
        return haystack.to_string();
    }
    let haystack_lower = haystack.to_ascii_lowercase();
    let needle_lower = needle.to_ascii_lowercase();
    let mut out = String::with_capacity(haystack.len());
    let mut position = 0;
    while let Some(found) = haystack_lower[position..].find(&needle_lower) {
        let at = position + found;
        out.push_str(&haystack[position..at]);
        out.push_str(replacement);
        position = at + needle.len();
    }
    out.push_str(&haystack[position..]);
    out
}
