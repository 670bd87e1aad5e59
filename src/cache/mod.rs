//! Short-lived response cache.
//!
//! # Responsibilities
//! - Derive a canonical key from method, path and the parameter bag
//! - Serve stored 200 replies until their TTL expires
//! - Purge expired entries in the background
//!
//! # Design Decisions
//! - Concurrent map, no locks held across awaits
//! - Writers to the same key race harmlessly; the last write wins
//! - No explicit invalidation and no stampede protection

use axum::http::Method;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::context::ParamBag;
use crate::dispatch::Envelope;
use crate::observability::metrics;

/// Canonical identity of a request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Method, path and every parameter. Parameter keys are kept sorted by
    /// the bag, so equal bags produce equal keys.
    pub fn derive(method: &Method, path: &str, params: &ParamBag) -> Self {
        let params = serde_json::to_string(params).unwrap_or_default();
        Self(format!("{method} {path} {params}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone)]
struct CachedReply {
    envelope: Envelope,
    stored_at: Instant,
}

/// Thread-safe TTL cache of rendered replies.
#[derive(Debug, Clone)]
pub struct ResponseCache {
    inner: Arc<DashMap<CacheKey, CachedReply>>,
    ttl: Duration,
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Fetch a live entry. Expired entries are removed and reported as a miss.
    pub fn lookup(&self, key: &CacheKey) -> Option<Envelope> {
        let expired = match self.inner.get(key) {
            Some(entry) if entry.stored_at.elapsed() < self.ttl => {
                metrics::record_cache_event("hit");
                return Some(entry.envelope.clone());
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            self.inner.remove_if(key, |_, entry| entry.stored_at.elapsed() >= self.ttl);
            metrics::record_cache_size(self.inner.len());
        }
        metrics::record_cache_event("miss");
        None
    }

    /// Store a reply. Only status 200 is accepted; returns whether it was stored.
    pub fn store(&self, key: CacheKey, envelope: &Envelope) -> bool {
        if envelope.status != 200 {
            return false;
        }
        self.inner.insert(
            key,
            CachedReply {
                envelope: envelope.clone(),
                stored_at: Instant::now(),
            },
        );
        metrics::record_cache_event("store");
        metrics::record_cache_size(self.inner.len());
        true
    }

    /// Drop every expired entry, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        let before = self.inner.len();
        self.inner.retain(|_, entry| entry.stored_at.elapsed() < self.ttl);
        let removed = before.saturating_sub(self.inner.len());
        metrics::record_cache_size(self.inner.len());
        removed
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
