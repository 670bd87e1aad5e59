//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, path from GATEWAY_CONFIG)
//!     → loader.rs (parse & deserialize)
//!     → env.rs (PORT / HOST / CORS_ALLOW_ORIGIN fill unset fields)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → shared with the HTTP server at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no hot reload
//! - Explicit configuration ranks above environment values
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod env;
pub mod loader;
pub mod schema;
pub mod validation;

pub use env::EnvConfig;
pub use loader::{load_config, resolve_config, ConfigError};
pub use schema::{
    CacheConfig, CorsConfig, GatewayConfig, ListenerConfig, ObservabilityConfig, RoutesConfig,
    SecurityConfig, StaticFilesConfig, TlsConfig, UpstreamConfig,
};
