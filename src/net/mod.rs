//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → plain: axum::serve on a tokio TcpListener
//!     → tls.rs: rustls handshake via axum-server
//!     → Hand off to HTTP layer (secure flag set for every request)
//! ```

pub mod tls;

pub use tls::load_tls_config;
