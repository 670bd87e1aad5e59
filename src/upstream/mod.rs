//! Upstream call subsystem.
//!
//! # Data Flow
//! ```text
//! handler
//!     → OutboundCaller (injects caller ip into CallOptions)
//!     → Upstream::send (client.rs: HTTP to the remote service)
//!     → Envelope (resolved on 200, rejected otherwise)
//! ```
//!
//! # Design Decisions
//! - Options are a struct with an explicit ip field, never a positional slot
//! - No retries; each call is sent at most once
//! - Timeouts are opt-in per deployment, none by default

pub mod client;

use futures_util::future::BoxFuture;
use serde_json::{Map, Value};

use crate::cookie::CookieJar;
use crate::dispatch::HandlerResult;

pub use client::{settle, HttpUpstream, UpstreamError};

/// Transport used by handlers to reach the remote service.
pub trait Upstream: Send + Sync + 'static {
    fn send(&self, request: UpstreamRequest) -> BoxFuture<'static, HandlerResult>;
}

/// Per-call options.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallOptions {
    /// Session cookies presented to the upstream.
    pub cookie: CookieJar,
    /// The inbound caller's IP, filled in by `OutboundCaller`.
    pub ip: Option<String>,
    /// Caller-supplied address that takes precedence over `ip`.
    pub real_ip: Option<String>,
}

impl CallOptions {
    /// The address to report upstream.
    pub fn forwarded_ip(&self) -> Option<&str> {
        self.real_ip.as_deref().or(self.ip.as_deref())
    }
}

/// One call to the remote service.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpstreamRequest {
    /// Absolute path resolved against the upstream base URL.
    pub path: String,
    /// Form fields.
    pub data: Map<String, Value>,
    pub options: CallOptions,
}

impl UpstreamRequest {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    pub fn data(mut self, data: Map<String, Value>) -> Self {
        self.data.extend(data);
        self
    }

    pub fn cookie(mut self, jar: CookieJar) -> Self {
        self.options.cookie = jar;
        self
    }

    pub fn real_ip(mut self, real_ip: Option<String>) -> Self {
        self.options.real_ip = real_ip;
        self
    }

    pub fn ip(mut self, ip: impl Into<String>) -> Self {
        self.options.ip = Some(ip.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forwarded_ip_prefers_real_ip() {
        let request = UpstreamRequest::new("/api/x").ip("10.0.0.1");
        assert_eq!(request.options.forwarded_ip(), Some("10.0.0.1"));

        let request = request.real_ip(Some("1.2.3.4".into()));
        assert_eq!(request.options.forwarded_ip(), Some("1.2.3.4"));
    }
}
