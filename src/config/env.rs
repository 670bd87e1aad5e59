//! Environment-derived configuration.
//!
//! `PORT`, `HOST` and `CORS_ALLOW_ORIGIN` fill listener and CORS settings
//! that the config file left unset.

use crate::config::schema::GatewayConfig;

pub const PORT: &str = "PORT";
pub const HOST: &str = "HOST";
pub const CORS_ALLOW_ORIGIN: &str = "CORS_ALLOW_ORIGIN";

/// Values read from the process environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvConfig {
    pub port: Option<u16>,
    pub host: Option<String>,
    pub cors_allow_origin: Option<String>,
}

impl EnvConfig {
    /// Read from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read through an arbitrary lookup function.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = non_empty(PORT).and_then(|raw| match raw.trim().parse() {
            Ok(port) => Some(port),
            Err(_) => {
                tracing::warn!(value = %raw, "Ignoring invalid PORT");
                None
            }
        });

        Self {
            port,
            host: non_empty(HOST),
            cors_allow_origin: non_empty(CORS_ALLOW_ORIGIN),
        }
    }

    /// Fill fields the explicit configuration did not set.
    pub fn apply(&self, config: &mut GatewayConfig) {
        if config.listener.port.is_none() {
            config.listener.port = self.port;
        }
        if config.listener.host.is_none() {
            config.listener.host = self.host.clone();
        }
        if config.cors.allow_origin.is_none() {
            config.cors.allow_origin = self.cors_allow_origin.clone();
        }
    }
}
