//! Relay gateway library.
//!
//! Exposes compiled-in endpoint units over HTTP, forwarding each request to
//! the remote service with the caller's session cookies and address.

// Request pipeline
pub mod cookie;
pub mod context;
pub mod dispatch;
pub mod registry;
pub mod upstream;

// Serving
pub mod cache;
pub mod endpoints;
pub mod http;
pub mod net;

// Cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod observability;

pub use config::schema::GatewayConfig;
pub use dispatch::{Dispatcher, Envelope, HandlerResult};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use registry::{Registry, Unit};
