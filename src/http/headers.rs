//! Header filtering and rewriting.
//!
//! Header collections are rebuilt by folding every (name, value) pair
//! through an ordered chain of transforms. A transform may pass the pair
//! through, rewrite it, or drop it; a drop removes the pair before later
//! transforms run.

use axum::http::{HeaderMap, HeaderName, HeaderValue};

use crate::routing::RequestContext;

/// Headers never forwarded in either direction: hop-by-hop, infrastructure,
/// and cache-diagnostic headers.
pub const DENY_HEADERS: [&str; 19] = [
    "access-control-expose-headers",
    "age",
    "date",
    "alt-svc",
    "cf-cache-status",
    "cf-ray",
    "content-length",
    "host",
    "nel",
    "report-to",
    "server",
    "via",
    "x-amz-cf-id",
    "x-amz-cf-pop",
    "x-cache",
    "x-content-source",
    "x-debug",
    "x-forwarded-for",
    "x-real-origin",
];

/// One step of the header pipeline. Names arrive lowercased.
pub trait HeaderTransform {
    /// Return the pair (possibly rewritten), or `None` to drop it.
    fn apply(&self, name: &str, value: &str) -> Option<(String, String)>;
}

/// Drops every name in [`DENY_HEADERS`].
pub struct DenyList;

impl HeaderTransform for DenyList {
    fn apply(&self, name: &str, value: &str) -> Option<(String, String)> {
        if DENY_HEADERS.contains(&name) {
            None
        } else {
            Some((name.to_string(), value.to_string()))
        }
    }
}

/// Rewrites the upstream origin to the public self origin in every value.
/// Response path only; `Location` is the common case but any value could
/// embed the origin.
pub struct OriginRewrite<'a> {
    pub ctx: &'a RequestContext,
}

impl HeaderTransform for OriginRewrite<'_> {
    fn apply(&self, name: &str, value: &str) -> Option<(String, String)> {
        Some((name.to_string(), self.ctx.replace_origin(value)))
    }
}

/// Rebuild a header map by running every pair through `transforms` in order.
///
/// Pairs with non-UTF-8 values are dropped, as are rewritten pairs that no
/// longer form a valid header. Duplicate names keep the last value.
pub fn clone_headers(headers: &HeaderMap, transforms: &[&dyn HeaderTransform]) -> HeaderMap {
    let mut out = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let Ok(value) = value.to_str() else { continue };
        let mut pair = Some((name.as_str().to_string(), value.to_string()));
        for transform in transforms {
            match pair {
                Some((n, v)) => pair = transform.apply(&n, &v),
                None => break,
            }
        }
        if let Some((n, v)) = pair {
            if let (Ok(n), Ok(v)) = (HeaderName::from_bytes(n.as_bytes()), HeaderValue::from_str(&v))
            {
                out.insert(n, v);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProxyConfig;
    use url::Url;

    fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(
                HeaderName::from_bytes(name.as_bytes()).unwrap(),
                HeaderValue::from_str(value).unwrap(),
            );
        }
        map
    }

    fn context() -> RequestContext {
        let config = ProxyConfig {
            upstream_origin: "https://registry.npmjs.org".into(),
            ..ProxyConfig::default()
        };
        let url = Url::parse("https://registry.test/ms").unwrap();
        RequestContext::new(&config, &url, None).unwrap()
    }

    #[test]
    fn deny_list_drops_infrastructure_headers() {
        let input = headers(&[
            ("host", "registry.test"),
            ("content-length", "42"),
            ("x-real-origin", "https://registry.another"),
            ("accept", "application/json"),
        ]);
        let out = clone_headers(&input, &[&DenyList]);
        assert_eq!(out.len(), 1);
        assert_eq!(out.get("accept").unwrap(), "application/json");
    }

    #[test]
    fn origin_rewrite_applies_to_every_header() {
        let ctx = context();
        let input = headers(&[
            ("location", "https://registry.npmjs.org/ms@2.1.3"),
            ("link", "<https://registry.npmjs.org/ms>; rel=\"canonical\""),
        ]);
        let out = clone_headers(&input, &[&DenyList, &OriginRewrite { ctx: &ctx }]);
        assert_eq!(
            out.get("location").unwrap(),
            "https://registry.test/ms@2.1.3"
        );
        assert_eq!(
            out.get("link").unwrap(),
            "<https://registry.test/ms>; rel=\"canonical\""
        );
    }

    #[test]
    fn dropped_pairs_skip_later_transforms() {
        struct Panicking;
        impl HeaderTransform for Panicking {
            fn apply(&self, _: &str, _: &str) -> Option<(String, String)> {
                panic!("transform ran after a drop");
            }
        }
        let input = headers(&[("date", "Mon, 01 Jan 2024 00:00:00 GMT")]);
        let out = clone_headers(&input, &[&DenyList, &Panicking]);
        assert!(out.is_empty());
    }

    #[test]
    fn untouched_headers_survive_unchanged() {
        let ctx = context();
        let input = headers(&[("access-control-allow-methods", "GET")]);
        let out = clone_headers(&input, &[&DenyList, &OriginRewrite { ctx: &ctx }]);
        assert_eq!(out.get("access-control-allow-methods").unwrap(), "GET");
    }
}
