//! Caching reverse proxy binary.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────┐
//!                    │                CACHING PROXY                  │
//!                    │                                               │
//!  Client Request    │  ┌──────┐   ┌─────────┐   ┌───────────────┐  │
//!  ──────────────────┼─▶│ http │──▶│security │──▶│   routing     │  │
//!                    │  │server│   │auth gate│   │URL translation│  │
//!                    │  └──────┘   └─────────┘   └──────┬────────┘  │
//!                    │                                   │           │
//!                    │              ┌────────┐           ▼           │
//!                    │              │ cache  │◀── hit? ──┬─ miss     │
//!                    │              │ store  │           │           │
//!                    │              └────┬───┘           ▼           │
//!  Client Response   │  ┌──────────┐    │        ┌─────────────┐    │
//!  ◀─────────────────┼──│ response │◀───┴────────│  upstream   │◀───┼── Origin
//!                    │  │ assembly │             │   fetch     │    │
//!                    │  └──────────┘             └─────────────┘    │
//!                    │                                               │
//!                    │  config · observability (logs, metrics,      │
//!                    │  server-timing) · header filtering           │
//!                    └──────────────────────────────────────────────┘
//! ```

use tokio::net::TcpListener;

use cache_proxy::config;
use cache_proxy::observability::{logging, metrics};
use cache_proxy::HttpServer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_logging();

    tracing::info!("cache-proxy v0.1.0 starting");

    let config = config::load_from_env()?;

    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream_origin = %config.upstream_origin,
        base_path = %config.base_path,
        cache_enabled = config.cache_enabled,
        auth_required = config.auth_token.is_some(),
        "Configuration loaded"
    );

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let local_addr = listener.local_addr()?;

    tracing::info!(
        address = %local_addr,
        "Listening for connections"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let server = HttpServer::new(config)?;
    server.run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
