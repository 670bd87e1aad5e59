//! Relay gateway
//!
//! An HTTP gateway that turns each compiled-in endpoint unit into a route and
//! relays the call to the remote service.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌──────────────────────────────────────────────────┐
//!                        │                    GATEWAY                       │
//!                        │                                                  │
//!   Client Request       │  ┌─────────┐   ┌─────────┐   ┌──────────────┐    │
//!   ─────────────────────┼─▶│  http   │──▶│ extract │──▶│  dispatch    │    │
//!                        │  │ + cors  │   │ inbound │   │ cookie/ctx   │    │
//!                        │  └─────────┘   └─────────┘   └──────┬───────┘    │
//!                        │                                     │            │
//!                        │              ┌───────┐              ▼            │
//!                        │              │ cache │◀──▶  ┌──────────────┐     │
//!                        │              └───────┘      │   handler    │     │
//!                        │                             │  (registry)  │     │
//!                        │                             └──────┬───────┘     │
//!                        │                                    ▼             │
//!   Client Response      │  ┌──────────┐              ┌──────────────┐      │
//!   ◀────────────────────┼──│ envelope │◀─────────────│   upstream   │◀─────┼── Remote
//!                        │  │ response │              │    client    │      │   Service
//!                        │  └──────────┘              └──────────────┘      │
//!                        │                                                  │
//!                        │  config · observability · lifecycle · net/tls    │
//!                        └──────────────────────────────────────────────────┘
//! ```

use tokio::net::TcpListener;

use relay_gateway::config::{resolve_config, EnvConfig};
use relay_gateway::lifecycle::Shutdown;
use relay_gateway::net::load_tls_config;
use relay_gateway::observability::{logging, metrics};
use relay_gateway::HttpServer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let log_filter = logging::init(logging::DEFAULT_LEVEL);
    let config = resolve_config(&EnvConfig::from_env())?;
    if let Some(handle) = &log_filter {
        logging::set_level(handle, &config.observability.log_level);
    }

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "relay-gateway starting");
    tracing::info!(
        bind_address = %config.bind_address(),
        upstream = %config.upstream.base_url,
        cache_enabled = config.cache.enabled,
        tls = config.listener.tls.is_some(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let tls = match &config.listener.tls {
        Some(tls) => Some(load_tls_config(tls).await?),
        None => None,
    };

    let listener = TcpListener::bind(config.bind_address()).await?;
    let server = HttpServer::from_config(config)?;

    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    shutdown.trigger_on_signal();

    match tls {
        Some(tls) => server.run_tls(listener, tls, receiver).await?,
        None => server.run(listener, receiver).await?,
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
