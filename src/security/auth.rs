//! Inbound bearer-token gate.
//!
//! When a token is configured, requests must present exactly
//! `Authorization: Bearer <token>`; anything else is rejected before the
//! pipeline touches the cache or the upstream.

use axum::http::{header, HeaderMap};

/// True when the request may proceed.
pub fn authorize(required_token: Option<&str>, headers: &HeaderMap) -> bool {
    let Some(token) = required_token else {
        return true;
    };
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value == format!("Bearer {token}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with_authorization(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn no_configured_token_passes_everything() {
        assert!(authorize(None, &HeaderMap::new()));
        assert!(authorize(None, &headers_with_authorization("Bearer whatever")));
    }

    #[test]
    fn exact_bearer_match_passes() {
        assert!(authorize(
            Some("abcd"),
            &headers_with_authorization("Bearer abcd")
        ));
    }

    #[test]
    fn missing_or_wrong_token_is_rejected() {
        assert!(!authorize(Some("abcd"), &HeaderMap::new()));
        assert!(!authorize(
            Some("abcd"),
            &headers_with_authorization("Bearer wxyz")
        ));
        // scheme must match too
        assert!(!authorize(
            Some("abcd"),
            &headers_with_authorization("bearer abcd")
        ));
        assert!(!authorize(Some("abcd"), &headers_with_authorization("abcd")));
    }
}
