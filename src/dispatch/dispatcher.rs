//! Per-request dispatch to a bound handler.

use axum::http::Method;
use serde_json::{Map, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use crate::cache::{CacheKey, ResponseCache};
use crate::context::{self, client_ip, OutboundCaller, UploadedFile};
use crate::cookie;
use crate::dispatch::envelope::{Envelope, HandlerResult, LOGIN_REQUIRED_MSG};
use crate::observability::metrics;
use crate::registry::RouteEntry;
use crate::upstream::Upstream;

/// Parameter that suppresses Set-Cookie propagation.
pub const NO_COOKIE_KEY: &str = "noCookie";

/// Everything the dispatcher needs from one inbound HTTP request.
#[derive(Debug, Clone)]
pub struct Inbound {
    pub method: Method,
    /// Request path without the query string.
    pub path: String,
    /// Path and query as received, used for logging.
    pub original_url: String,
    pub query: Map<String, Value>,
    pub body: Map<String, Value>,
    pub files: Vec<(String, UploadedFile)>,
    pub cookie_header: Option<String>,
    pub peer: Option<SocketAddr>,
    /// The connection is TLS.
    pub secure: bool,
}

impl Inbound {
    pub fn new(method: Method, original_url: impl Into<String>) -> Self {
        let original_url = original_url.into();
        let path = original_url
            .split_once('?')
            .map_or(original_url.as_str(), |(path, _)| path)
            .to_string();

        Self {
            method,
            path,
            original_url,
            query: Map::new(),
            body: Map::new(),
            files: Vec::new(),
            cookie_header: None,
            peer: None,
            secure: false,
        }
    }
}

/// How a request ended, for logging and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Ok,
    Error,
    Cached,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Ok => "ok",
            Outcome::Error => "error",
            Outcome::Cached => "cached",
        }
    }
}

/// Binds inbound requests to handlers and interprets their results.
#[derive(Clone)]
pub struct Dispatcher {
    upstream: Arc<dyn Upstream>,
    cache: Option<ResponseCache>,
}

impl Dispatcher {
    pub fn new(upstream: Arc<dyn Upstream>, cache: Option<ResponseCache>) -> Self {
        Self { upstream, cache }
    }

    pub fn cache(&self) -> Option<&ResponseCache> {
        self.cache.as_ref()
    }

    /// Dispatch one request to `entry`'s handler and produce the reply.
    ///
    /// The returned envelope's `cookie` holds the final Set-Cookie lines.
    pub async fn dispatch(&self, entry: &RouteEntry, inbound: Inbound) -> Envelope {
        let started = Instant::now();
        let url = decode_url(&inbound.original_url);

        let jar = inbound
            .cookie_header
            .as_deref()
            .map(cookie::decode)
            .unwrap_or_default();
        let params = context::build(inbound.query, inbound.body, inbound.files, jar);

        let cache_key = match &self.cache {
            Some(_) if !params.has_files() => {
                Some(CacheKey::derive(&inbound.method, &inbound.path, &params))
            }
            _ => None,
        };
        if let (Some(cache), Some(key)) = (&self.cache, &cache_key) {
            if let Some(reply) = cache.lookup(key) {
                tracing::debug!(path = %url, outcome = Outcome::Cached.as_str(), "Served from cache");
                metrics::record_request(entry.route(), Outcome::Cached.as_str(), started);
                return reply;
            }
        }

        let no_cookie = params.is_truthy(NO_COOKIE_KEY);
        let caller = OutboundCaller::new(self.upstream.clone(), client_ip(inbound.peer));

        let settled = entry.handler().call(params, caller).await;
        let (reply, outcome) = interpret(settled, no_cookie, inbound.secure);

        match outcome {
            Outcome::Ok => tracing::info!(path = %url, status = reply.status, outcome = outcome.as_str(), "Request handled"),
            _ => tracing::warn!(path = %url, status = reply.status, outcome = outcome.as_str(), "Request failed"),
        }
        metrics::record_request(entry.route(), outcome.as_str(), started);

        if outcome == Outcome::Ok {
            if let (Some(cache), Some(key)) = (&self.cache, cache_key) {
                cache.store(key, &reply);
            }
        }

        reply
    }
}

/// Turn a settled handler result into the reply to send.
///
/// A rejection without a body collapses to the fixed 404 envelope. A
/// rejection whose `body.code` is 301 gets the login-required message.
/// Cookies are propagated unless `no_cookie` is set.
pub fn interpret(settled: HandlerResult, no_cookie: bool, secure: bool) -> (Envelope, Outcome) {
    let (mut envelope, outcome) = match settled {
        Ok(envelope) => (envelope, Outcome::Ok),
        Err(envelope) if !envelope.has_body() => return (Envelope::not_found(), Outcome::Error),
        Err(mut envelope) => {
            if envelope.requires_login() {
                if let Some(body) = envelope.body.as_object_mut() {
                    body.insert("msg".to_string(), Value::from(LOGIN_REQUIRED_MSG));
                }
            }
            (envelope, Outcome::Error)
        }
    };

    envelope.cookie = if no_cookie {
        Vec::new()
    } else {
        cookie::encode(&envelope.cookie, secure)
    };

    (envelope, outcome)
}

fn decode_url(raw: &str) -> String {
    urlencoding::decode(raw).map_or_else(|_| raw.to_string(), |s| s.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ParamBag;
    use crate::registry::{Registry, Unit};
    use futures_util::future::BoxFuture;
    use serde_json::json;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct NoUpstream;

    impl Upstream for NoUpstream {
        fn send(&self, _request: crate::upstream::UpstreamRequest) -> BoxFuture<'static, HandlerResult> {
            Box::pin(async { HandlerResult::Err(Envelope::new(502, Value::Null)) })
        }
    }

    fn entry_for(handler: impl crate::dispatch::Handler) -> Arc<RouteEntry> {
        let registry = Registry::from_units(vec![Unit::new("test_route", handler)], &BTreeMap::new());
        registry.lookup("/test/route").cloned().unwrap()
    }

    fn settle_with(result: HandlerResult) -> impl crate::dispatch::Handler {
        move |_: ParamBag, _: OutboundCaller| {
            let result = result.clone();
            async move { result }
        }
    }

    #[test]
    fn test_rejection_without_body_is_not_found() {
        let (reply, outcome) = interpret(Err(Envelope::new(400, Value::Null)), false, false);
        assert_eq!(outcome, Outcome::Error);
        assert_eq!(reply.status, 404);
        assert_eq!(reply.body, json!({"code": 404, "data": null, "msg": "Not Found"}));
    }

    #[test]
    fn test_login_required_rewrite() {
        let rejected = Envelope::new(301, json!({"code": "301", "msg": "old"}))
            .with_cookies(vec!["a=b".into()]);
        let (reply, outcome) = interpret(Err(rejected), false, false);

        assert_eq!(outcome, Outcome::Error);
        assert_eq!(reply.status, 301);
        assert_eq!(reply.body["msg"], LOGIN_REQUIRED_MSG);
        assert_eq!(reply.cookie, vec!["a=b".to_string()]);
    }

    #[test]
    fn test_other_rejection_passes_through() {
        let rejected = Envelope::new(502, json!({"code": 502, "msg": "upstream"}))
            .with_cookies(vec!["a=b".into()]);
        let (reply, _) = interpret(Err(rejected), false, true);
        assert_eq!(reply.status, 502);
        assert_eq!(reply.body["msg"], "upstream");
        assert_eq!(reply.cookie, vec!["a=b; SameSite=None; Secure".to_string()]);
    }

    #[test]
    fn test_success_cookie_handling() {
        let ok = Envelope::ok(json!({"code": 200})).with_cookies(vec!["s=1; Path=/".into()]);

        let (reply, outcome) = interpret(Ok(ok.clone()), false, false);
        assert_eq!(outcome, Outcome::Ok);
        assert_eq!(reply.cookie, vec!["s=1; Path=/".to_string()]);

        let (reply, _) = interpret(Ok(ok.clone()), false, true);
        assert_eq!(reply.cookie, vec!["s=1; Path=/; SameSite=None; Secure".to_string()]);

        let (reply, _) = interpret(Ok(ok), true, true);
        assert!(reply.cookie.is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_builds_context_from_inbound() {
        let entry = entry_for(|params: ParamBag, caller: OutboundCaller| async move {
            HandlerResult::Ok(Envelope::ok(json!({
                "cookie": params.cookie_jar(),
                "id": params.value("id"),
                "ip": caller.ip(),
            })))
        });
        let dispatcher = Dispatcher::new(Arc::new(NoUpstream), None);

        let mut inbound = Inbound::new(Method::GET, "/test/route?id=5");
        inbound.query.insert("id".into(), json!("5"));
        inbound.cookie_header = Some("MUSIC_U=abc; os=pc".into());
        inbound.peer = Some("[::ffff:10.0.0.9]:4444".parse().unwrap());

        let reply = dispatcher.dispatch(&entry, inbound).await;
        assert_eq!(reply.status, 200);
        assert_eq!(
            reply.body,
            json!({"cookie": {"MUSIC_U": "abc", "os": "pc"}, "id": "5", "ip": "10.0.0.9"})
        );
    }

    #[tokio::test]
    async fn test_no_cookie_flag_suppresses_set_cookie() {
        let entry = entry_for(settle_with(Ok(
            Envelope::ok(json!({"code": 200})).with_cookies(vec!["a=b".into()])
        )));
        let dispatcher = Dispatcher::new(Arc::new(NoUpstream), None);

        let mut inbound = Inbound::new(Method::POST, "/test/route");
        inbound.body.insert("noCookie".into(), json!(true));
        let reply = dispatcher.dispatch(&entry, inbound).await;
        assert!(reply.cookie.is_empty());

        let reply = dispatcher.dispatch(&entry, Inbound::new(Method::POST, "/test/route")).await;
        assert_eq!(reply.cookie, vec!["a=b".to_string()]);
    }

    #[tokio::test]
    async fn test_cache_absorbs_repeated_requests() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let entry = entry_for(move |_: ParamBag, _: OutboundCaller| {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            async move { HandlerResult::Ok(Envelope::ok(json!({"code": 200, "n": n}))) }
        });
        let cache = ResponseCache::new(Duration::from_millis(100));
        let dispatcher = Dispatcher::new(Arc::new(NoUpstream), Some(cache));

        let request = || {
            let mut inbound = Inbound::new(Method::GET, "/test/route?id=1");
            inbound.query.insert("id".into(), json!("1"));
            inbound
        };

        let first = dispatcher.dispatch(&entry, request()).await;
        let second = dispatcher.dispatch(&entry, request()).await;
        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_millis(150)).await;
        let third = dispatcher.dispatch(&entry, request()).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(third.body["n"], 1);
    }

    #[tokio::test]
    async fn test_rejections_are_not_cached() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let entry = entry_for(move |_: ParamBag, _: OutboundCaller| {
            counter.fetch_add(1, Ordering::SeqCst);
            async move { HandlerResult::Err(Envelope::new(400, json!({"code": 400}))) }
        });
        let dispatcher =
            Dispatcher::new(Arc::new(NoUpstream), Some(ResponseCache::new(Duration::from_secs(60))));

        dispatcher.dispatch(&entry, Inbound::new(Method::GET, "/test/route")).await;
        dispatcher.dispatch(&entry, Inbound::new(Method::GET, "/test/route")).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_inbound_splits_path() {
        let inbound = Inbound::new(Method::GET, "/search?keywords=%E6%B5%B7");
        assert_eq!(inbound.path, "/search");
        assert_eq!(decode_url(&inbound.original_url), "/search?keywords=海");
    }
}
