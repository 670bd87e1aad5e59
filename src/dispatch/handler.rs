//! The endpoint handler collaborator interface.

use futures_util::future::BoxFuture;
use std::future::Future;

use crate::context::{OutboundCaller, ParamBag};
use crate::dispatch::envelope::HandlerResult;

/// An endpoint bound to a route.
///
/// Receives the request's parameter bag and a caller for upstream work, and
/// settles exactly once with a success or rejection envelope.
pub trait Handler: Send + Sync + 'static {
    fn call(&self, params: ParamBag, caller: OutboundCaller) -> BoxFuture<'static, HandlerResult>;
}

impl<F, Fut> Handler for F
where
    F: Fn(ParamBag, OutboundCaller) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn call(&self, params: ParamBag, caller: OutboundCaller) -> BoxFuture<'static, HandlerResult> {
        Box::pin(self(params, caller))
    }
}
