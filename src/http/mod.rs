//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (axum setup, catch-all proxy handler)
//!     → request.rs (request ID)
//!     → security::auth (bearer gate)
//!     → routing::context (URL translation)
//!     → cache / upstream
//!     → headers.rs (deny list, origin rewrite)
//!     → response.rs (assembly: CORS, cache write, timing, body rules)
//!     → Send to client
//! ```

pub mod headers;
pub mod request;
pub mod response;
pub mod server;

pub use request::{RequestIdLayer, X_REQUEST_ID};
pub use server::HttpServer;
