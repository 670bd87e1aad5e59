//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Host used when neither the config file nor the environment names one.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Port used when neither the config file nor the environment names one.
pub const DEFAULT_PORT: u16 = 3000;

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (host, port, TLS).
    pub listener: ListenerConfig,

    /// Cross-origin settings.
    pub cors: CorsConfig,

    /// Response cache settings.
    pub cache: CacheConfig,

    /// Remote service the endpoint handlers call.
    pub upstream: UpstreamConfig,

    /// Route overrides for handler units.
    pub routes: RoutesConfig,

    /// Static asset directory served ahead of dynamic routes.
    pub static_files: StaticFilesConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Request limits.
    pub security: SecurityConfig,
}

impl GatewayConfig {
    /// The `host:port` pair to bind, falling back to the built-in defaults.
    pub fn bind_address(&self) -> String {
        let host = self.listener.host.as_deref().unwrap_or(DEFAULT_HOST);
        let port = self.listener.port.unwrap_or(DEFAULT_PORT);
        if host.contains(':') && !host.starts_with('[') {
            format!("[{host}]:{port}")
        } else {
            format!("{host}:{port}")
        }
    }
}

/// Listener configuration.
///
/// `host` and `port` stay `None` until set by the config file or the
/// environment so that precedence can be resolved after loading.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ListenerConfig {
    /// Interface to listen on.
    pub host: Option<String>,

    /// Port to listen on.
    pub port: Option<u16>,

    /// Optional TLS configuration. When present every connection is secure.
    pub tls: Option<TlsConfig>,
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

/// Cross-origin configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct CorsConfig {
    /// Fixed `Access-Control-Allow-Origin` value. When unset the caller's
    /// `Origin` header is reflected.
    pub allow_origin: Option<String>,
}

/// Response cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Enable the response cache.
    pub enabled: bool,

    /// Time-to-live of every entry in seconds.
    pub ttl_secs: u64,
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: 120,
        }
    }
}

/// Upstream service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL every handler path is resolved against.
    pub base_url: String,

    /// Optional per-call timeout in seconds. No timeout when unset.
    pub timeout_secs: Option<u64>,

    /// User-Agent sent with upstream calls.
    pub user_agent: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "https://music.163.com".to_string(),
            timeout_secs: None,
            user_agent: concat!("relay-gateway/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Route override configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RoutesConfig {
    /// Unit identifier → route. Merged over the built-in overrides.
    pub overrides: BTreeMap<String, String>,
}

/// Static file configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StaticFilesConfig {
    /// Serve files from `dir`.
    pub enabled: bool,

    /// Public asset directory.
    pub dir: String,
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: "public".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

/// Request limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum body size in bytes (JSON, form and multipart).
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 50 * 1024 * 1024, // 50MB, uploads included
        }
    }
}
