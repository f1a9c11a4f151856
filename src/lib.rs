//! Caching reverse proxy fronting a single upstream origin.
//!
//! Requests are rewritten so responses appear to originate from the proxy's
//! own public address, upstream responses may be cached with a TTL taken
//! from their cache directives, and redirect `Location` headers are
//! rewritten so clients keep traversing the proxy.

// Core pipeline
pub mod config;
pub mod http;
pub mod routing;

// Collaborators
pub mod cache;
pub mod upstream;

// Cross-cutting concerns
pub mod error;
pub mod observability;
pub mod security;

pub use config::ProxyConfig;
pub use error::ProxyError;
pub use http::HttpServer;
