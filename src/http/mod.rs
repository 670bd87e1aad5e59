//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, one route per registry entry)
//!     → request.rs (request ID)
//!     → cors.rs (CORS headers, OPTIONS preflight short-circuit)
//!     → extract.rs (query, JSON/form/multipart body, cookie header, peer)
//!     → dispatch::Dispatcher
//!     → response.rs (envelope → JSON response with Set-Cookie)
//!     → Send to client
//! ```
//!
//! `GET`/`HEAD` requests matching a file in the public directory are served
//! from disk before any route is consulted.

pub mod cors;
pub mod error;
pub mod extract;
pub mod request;
pub mod response;
pub mod server;

pub use cors::{cors_middleware, CorsPolicy};
pub use error::GatewayError;
pub use request::{GatewayRequestId, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
