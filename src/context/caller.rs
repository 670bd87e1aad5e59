//! Outbound-call wrapper handed to every handler.

use futures_util::future::BoxFuture;
use std::sync::Arc;

use crate::dispatch::HandlerResult;
use crate::upstream::{Upstream, UpstreamRequest};

/// Performs upstream calls on behalf of one inbound request.
///
/// Every call carries the caller's observed IP in its options.
#[derive(Clone)]
pub struct OutboundCaller {
    upstream: Arc<dyn Upstream>,
    ip: Option<String>,
}

impl OutboundCaller {
    pub fn new(upstream: Arc<dyn Upstream>, ip: Option<String>) -> Self {
        Self { upstream, ip }
    }

    /// The caller's IP injected into outbound calls.
    pub fn ip(&self) -> Option<&str> {
        self.ip.as_deref()
    }

    pub fn call(&self, mut request: UpstreamRequest) -> BoxFuture<'static, HandlerResult> {
        request.options.ip = self.ip.clone();
        self.upstream.send(request)
    }
}

impl std::fmt::Debug for OutboundCaller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutboundCaller").field("ip", &self.ip).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::Envelope;
    use serde_json::json;

    struct EchoOptions;

    impl Upstream for EchoOptions {
        fn send(&self, request: UpstreamRequest) -> BoxFuture<'static, HandlerResult> {
            Box::pin(async move {
                HandlerResult::Ok(Envelope::ok(json!({
                    "path": request.path,
                    "ip": request.options.ip,
                })))
            })
        }
    }

    #[tokio::test]
    async fn test_ip_injected_into_call() {
        let caller = OutboundCaller::new(Arc::new(EchoOptions), Some("10.1.2.3".into()));
        let request = UpstreamRequest::new("/api/x").ip("overwritten");

        let reply = caller.call(request).await.unwrap();
        assert_eq!(reply.body, json!({"path": "/api/x", "ip": "10.1.2.3"}));
    }
}
