//! Structured logging.
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - `RUST_LOG` overrides the configured level
//! - The subscriber is installed before configuration loads; the configured
//!   level is applied afterwards through a reload handle

use tracing_subscriber::{
    layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter, Registry,
};

/// Level used until configuration has been read.
pub const DEFAULT_LEVEL: &str = "info";

/// Default directive applied next to the configured level.
const HTTP_DIRECTIVE: &str = "tower_http=debug";

/// Handle for swapping the active filter.
pub type FilterHandle = reload::Handle<EnvFilter, Registry>;

/// Build the filter from `RUST_LOG`, falling back to `level`.
pub fn filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("relay_gateway={level},{HTTP_DIRECTIVE}").into())
}

/// Install the global subscriber at `level`.
///
/// Returns `None` when a subscriber is already installed.
pub fn init(level: &str) -> Option<FilterHandle> {
    let (filter, handle) = reload::Layer::new(filter(level));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .ok()
        .map(|()| handle)
}

/// Switch the running subscriber to `level`.
pub fn set_level(handle: &FilterHandle, level: &str) {
    if let Err(e) = handle.reload(filter(level)) {
        tracing::warn!(level = %level, error = %e, "Failed to apply configured log level");
    }
}
