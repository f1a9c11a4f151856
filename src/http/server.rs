//! HTTP server setup and request orchestration.
//!
//! # Responsibilities
//! - Create the axum Router with the catch-all proxy handler
//! - Wire up middleware (tracing, request ID)
//! - Drive the pipeline: auth gate → URL translation → cache read →
//!   header filtering → upstream fetch → response assembly
//! - Observability (metrics, correlation IDs)

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, Request, Response, StatusCode},
    routing::any,
    Router,
};
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use url::Url;

use crate::cache::{CacheStore, MemoryStore, SystemClock};
use crate::config::ProxyConfig;
use crate::error::ProxyError;
use crate::http::headers::{clone_headers, DenyList, OriginRewrite};
use crate::http::request::{RequestIdLayer, X_REQUEST_ID};
use crate::http::response::{finalize_response, ResponseProps};
use crate::observability::metrics;
use crate::observability::timing::PhaseTimer;
use crate::routing::RequestContext;
use crate::security::auth;
use crate::upstream::{HttpUpstream, UpstreamClient, UpstreamRequest};

/// Application state injected into the handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ProxyConfig>,
    pub cache: Arc<CacheStore>,
    pub upstream: Arc<dyn UpstreamClient>,
}

/// HTTP server for the caching proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    /// Create a server with the default collaborators: a reqwest transport
    /// and an in-process memory store.
    pub fn new(config: ProxyConfig) -> Result<Self, ProxyError> {
        let cache = Arc::new(CacheStore::new(
            Arc::new(MemoryStore::new()),
            Arc::new(SystemClock),
        ));
        let upstream: Arc<dyn UpstreamClient> = Arc::new(HttpUpstream::new()?);
        Ok(Self::with_collaborators(config, cache, upstream))
    }

    /// Create a server with an injected cache store and upstream transport.
    pub fn with_collaborators(
        config: ProxyConfig,
        cache: Arc<CacheStore>,
        upstream: Arc<dyn UpstreamClient>,
    ) -> Self {
        let state = AppState {
            config: Arc::new(config.clone()),
            cache,
            upstream,
        };
        let router = Self::build_router(state);
        Self { router, config }
    }

    /// Build the axum router: one catch-all handler for any method and path.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(state)
            .layer(RequestIdLayer)
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server on the given listener until ctrl-c.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream_origin = %self.config.upstream_origin,
            cache_enabled = self.config.cache_enabled,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    /// The router, for driving the pipeline in-process.
    pub fn router(&self) -> Router {
        self.router.clone()
    }
}

/// Main proxy handler.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response<Body> {
    let start_time = Instant::now();
    let mut timer = PhaseTimer::new();
    timer.mark("total");

    let request_id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown")
        .to_string();
    let method = request.method().clone();
    let method_str = method.to_string();
    let config = Arc::clone(&state.config);

    if !auth::authorize(config.auth_token.as_deref(), request.headers()) {
        tracing::warn!(request_id = %request_id, "Rejected request without valid bearer token");
        metrics::record_request(&method_str, 401, "none", start_time);
        return empty_status(StatusCode::UNAUTHORIZED);
    }

    let Some(self_url) = request_url(&request) else {
        tracing::warn!(request_id = %request_id, "Request URL could not be determined");
        metrics::record_request(&method_str, 400, "none", start_time);
        return empty_status(StatusCode::BAD_REQUEST);
    };
    let real_origin = request
        .headers()
        .get("x-real-origin")
        .and_then(|value| value.to_str().ok());
    let ctx = match RequestContext::new(&config, &self_url, real_origin) {
        Ok(ctx) => ctx,
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "URL translation failed");
            metrics::record_request(&method_str, 500, "none", start_time);
            return empty_status(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        upstream_url = %ctx.upstream_url,
        public_self_url = %ctx.public_self_url,
        "Proxying request"
    );

    if config.cache_enabled {
        timer.mark("cache-read");
        let hit = state.cache.get(&ctx.public_self_url).await;
        timer.measure("cache-read");
        match hit.map(ResponseProps::try_from) {
            Some(Ok(props)) => {
                timer.marker("cache-hit");
                metrics::record_cache_event("hit");
                tracing::debug!(request_id = %request_id, url = %ctx.public_self_url, "Serving from cache");
                let result = finalize_response(props, &mut timer, &config, None).await;
                return respond(result, &request_id, &method_str, "hit", start_time);
            }
            Some(Err(e)) => {
                tracing::warn!(request_id = %request_id, error = %e, "Cached response unusable; fetching upstream");
                timer.marker("cache-miss");
                metrics::record_cache_event("miss");
            }
            None => {
                timer.marker("cache-miss");
                metrics::record_cache_event("miss");
            }
        }
    }

    let (parts, body) = request.into_parts();
    let body_bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(request_id = %request_id, error = %e, "Failed to buffer request body");
            metrics::record_request(&method_str, 400, "none", start_time);
            return empty_status(StatusCode::BAD_REQUEST);
        }
    };

    let mut upstream_headers = clone_headers(&parts.headers, &[&DenyList]);
    if let Some(token) = config.upstream_auth_token.as_deref() {
        match HeaderValue::from_str(&format!("Bearer {token}")) {
            Ok(value) => {
                upstream_headers.insert(header::AUTHORIZATION, value);
            }
            Err(e) => {
                tracing::error!(request_id = %request_id, error = %e, "Upstream auth token is not a valid header value");
            }
        }
    }

    timer.mark("upstream");
    let fetched = state
        .upstream
        .fetch(UpstreamRequest {
            method,
            url: ctx.upstream_url.to_string(),
            headers: upstream_headers,
            body: body_bytes,
        })
        .await;
    timer.measure("upstream");

    let upstream_response = match fetched {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(
                request_id = %request_id,
                error = %e,
                upstream_url = %ctx.upstream_url,
                "Upstream request failed"
            );
            metrics::record_request(&method_str, 502, "none", start_time);
            return empty_status(StatusCode::BAD_GATEWAY);
        }
    };

    let headers = clone_headers(
        &upstream_response.headers,
        &[&DenyList, &OriginRewrite { ctx: &ctx }],
    );
    let props = ResponseProps {
        url: ctx.public_self_url.clone(),
        body: upstream_response.body,
        headers,
        status: upstream_response.status,
        status_text: upstream_response.status_text,
    };

    let cache = config.cache_enabled.then(|| state.cache.as_ref());
    let cache_outcome = if config.cache_enabled { "miss" } else { "none" };
    let result = finalize_response(props, &mut timer, &config, cache).await;
    respond(result, &request_id, &method_str, cache_outcome, start_time)
}

/// Convert the assembly result into the final response; any assembly
/// failure becomes an empty 500.
fn respond(
    result: Result<Response<Body>, ProxyError>,
    request_id: &str,
    method: &str,
    cache_outcome: &str,
    start_time: Instant,
) -> Response<Body> {
    match result {
        Ok(response) => {
            metrics::record_request(
                method,
                response.status().as_u16(),
                cache_outcome,
                start_time,
            );
            response
        }
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Response assembly failed");
            metrics::record_request(method, 500, cache_outcome, start_time);
            empty_status(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

fn empty_status(status: StatusCode) -> Response<Body> {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = status;
    response
}

/// Absolute URL of the inbound request.
///
/// axum URIs are origin-form, so the origin is rebuilt from
/// `x-forwarded-proto` (default http) and `Host`, unless the client sent an
/// absolute-form request line.
fn request_url(request: &Request<Body>) -> Option<Url> {
    if request.uri().scheme().is_some() {
        return Url::parse(&request.uri().to_string()).ok();
    }
    let host = request.headers().get(header::HOST)?.to_str().ok()?;
    let scheme = request
        .headers()
        .get("x-forwarded-proto")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("http");
    let path_and_query = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    Url::parse(&format!("{scheme}://{host}{path_and_query}")).ok()
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl+C handler");
    }
    tracing::info!("Shutdown signal received");
}
