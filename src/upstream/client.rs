//! Outbound transport to the upstream origin.

use async_trait::async_trait;
use axum::body::Bytes;
use axum::http::{HeaderMap, Method, StatusCode};

use crate::error::ProxyError;

/// One buffered outbound request.
#[derive(Debug, Clone)]
pub struct UpstreamRequest {
    pub method: Method,
    pub url: String,
    /// Headers after deny-list filtering, with the upstream bearer token
    /// already applied when configured.
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Fully buffered response from the upstream origin.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub status_text: String,
    pub headers: HeaderMap,
    pub body: String,
}

/// Outbound HTTP client.
///
/// Implementations never follow redirects, so 3xx responses come back
/// intact for `Location` rewriting. Bodies are buffered as text, which caps
/// practical response size to available memory.
#[async_trait]
pub trait UpstreamClient: Send + Sync {
    async fn fetch(&self, request: UpstreamRequest) -> Result<UpstreamResponse, ProxyError>;
}

/// Production transport backed by reqwest.
pub struct HttpUpstream {
    client: reqwest::Client,
}

impl HttpUpstream {
    pub fn new() -> Result<Self, ProxyError> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl UpstreamClient for HttpUpstream {
    async fn fetch(&self, request: UpstreamRequest) -> Result<UpstreamResponse, ProxyError> {
        let response = self
            .client
            .request(request.method, &request.url)
            .headers(request.headers)
            .body(request.body)
            .send()
            .await?;

        let status = response.status();
        let status_text = status.canonical_reason().unwrap_or_default().to_string();
        let headers = response.headers().clone();
        let body = response.text().await?;

        Ok(UpstreamResponse {
            status,
            status_text,
            headers,
            body,
        })
    }
}
