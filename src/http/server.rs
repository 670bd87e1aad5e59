//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with one route per registry entry
//! - Wire up middleware (request ID, tracing, CORS, body limit)
//! - Serve static files ahead of the registered routes
//! - Bind server to listener (plain or TLS)
//! - Purge expired cache entries in the background

use axum::{
    extract::{DefaultBodyLimit, Request, State},
    middleware,
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use axum_server::tls_rustls::RustlsConfig;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::cache::ResponseCache;
use crate::config::GatewayConfig;
use crate::dispatch::{Dispatcher, Envelope};
use crate::endpoints;
use crate::http::cors::{cors_middleware, CorsPolicy};
use crate::http::extract::read_inbound;
use crate::http::request::GatewayRequestId;
use crate::registry::{builtin_overrides, Registry, RouteEntry};
use crate::upstream::{HttpUpstream, Upstream, UpstreamError};

/// How long in-flight TLS connections get to finish after shutdown.
const TLS_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    /// Every connection is TLS.
    pub secure: bool,
    pub max_body_size: usize,
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
    cache: Option<ResponseCache>,
}

impl HttpServer {
    /// Build the server with the compiled-in endpoints and the HTTP upstream.
    pub fn from_config(config: GatewayConfig) -> Result<Self, UpstreamError> {
        let upstream = Arc::new(HttpUpstream::new(&config.upstream)?);

        let mut overrides = builtin_overrides();
        overrides.extend(config.routes.overrides.clone());
        let registry = Registry::from_units(endpoints::units(), &overrides);

        Ok(Self::new(config, registry, upstream))
    }

    /// Build the server around an explicit registry and upstream.
    pub fn new(config: GatewayConfig, registry: Registry, upstream: Arc<dyn Upstream>) -> Self {
        let cache = config
            .cache
            .enabled
            .then(|| ResponseCache::new(config.cache.ttl()));

        let state = AppState {
            dispatcher: Arc::new(Dispatcher::new(upstream, cache.clone())),
            secure: config.listener.tls.is_some(),
            max_body_size: config.security.max_body_size,
        };

        let router = Self::build_router(&config, &registry, state);
        Self {
            router,
            config,
            cache,
        }
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// With static files enabled, `GET`/`HEAD` requests are first looked up
    /// in the public directory and only reach the routes when no file exists.
    fn build_router(config: &GatewayConfig, registry: &Registry, state: AppState) -> Router {
        let mut routes = Router::new();
        for entry in registry.entries() {
            let path = entry.route().to_string();
            let entry = Arc::clone(entry);
            routes = routes.route(
                &path,
                any(move |State(state): State<AppState>, request: Request| {
                    let entry = Arc::clone(&entry);
                    async move { gateway_handler(state, entry, request).await }
                }),
            );
        }
        let routes = routes
            .fallback(|| async { Envelope::not_found() })
            .with_state(state);

        let app = if config.static_files.enabled {
            let assets = ServeDir::new(&config.static_files.dir)
                .call_fallback_on_method_not_allowed(true)
                .fallback(routes);
            Router::new().fallback_service(assets)
        } else {
            routes
        };

        app.layer(DefaultBodyLimit::max(config.security.max_body_size))
            .layer(middleware::from_fn_with_state(
                CorsPolicy::new(config.cors.allow_origin.as_deref()),
                cors_middleware,
            ))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(GatewayRequestId))
    }

    /// The fully layered router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn cache(&self) -> Option<&ResponseCache> {
        self.cache.as_ref()
    }

    /// Run the server on a plain TCP listener until shutdown is signalled.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, tls = false, "HTTP server starting");

        if let Some(cache) = self.cache.clone() {
            spawn_cache_purger(cache, shutdown.resubscribe());
        }

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Run the server with TLS on `listener` until shutdown is signalled.
    pub async fn run_tls(
        self,
        listener: TcpListener,
        tls: RustlsConfig,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, tls = true, "HTTP server starting");

        if let Some(cache) = self.cache.clone() {
            spawn_cache_purger(cache, shutdown.resubscribe());
        }

        let handle = axum_server::Handle::new();
        let drain = handle.clone();
        tokio::spawn(async move {
            let _ = shutdown.recv().await;
            drain.graceful_shutdown(Some(TLS_DRAIN_TIMEOUT));
        });

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum_server::from_tcp_rustls(listener.into_std()?, tls)
            .handle(handle)
            .serve(app)
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Extract the inbound request and dispatch it to `entry`.
async fn gateway_handler(state: AppState, entry: Arc<RouteEntry>, request: Request) -> Response {
    let inbound = match read_inbound(request, state.secure, state.max_body_size).await {
        Ok(inbound) => inbound,
        Err(e) => return e.into_response(),
    };

    state.dispatcher.dispatch(&entry, inbound).await.into_response()
}

/// Drop expired cache entries once per TTL until shutdown.
fn spawn_cache_purger(cache: ResponseCache, mut shutdown: broadcast::Receiver<()>) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(cache.ttl());
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let removed = cache.purge_expired();
                    if removed > 0 {
                        tracing::debug!(removed, remaining = cache.len(), "Purged expired cache entries");
                    }
                }
                _ = shutdown.recv() => {
                    tracing::debug!("Cache purger exiting");
                    break;
                }
            }
        }
    });
}
