//! Declarative upstream forwarders.

use futures_util::future::BoxFuture;
use serde_json::Value;

use crate::context::{OutboundCaller, ParamBag};
use crate::dispatch::{Handler, HandlerResult};
use crate::upstream::UpstreamRequest;

/// Parameter that overrides the address reported upstream.
pub const REAL_IP_KEY: &str = "realIP";

/// One upstream form field and where it comes from.
#[derive(Debug, Clone)]
pub struct Field {
    name: &'static str,
    source: &'static str,
    default: Option<&'static str>,
}

impl Field {
    /// A field read from the parameter of the same name.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            source: name,
            default: None,
        }
    }

    /// Read the value from a differently named parameter.
    pub fn from(mut self, source: &'static str) -> Self {
        self.source = source;
        self
    }

    pub fn default_value(mut self, default: &'static str) -> Self {
        self.default = Some(default);
        self
    }
}

/// A handler that posts selected parameters to a fixed upstream path.
#[derive(Debug, Clone)]
pub struct Forward {
    path: &'static str,
    fields: Vec<Field>,
}

impl Forward {
    pub fn new(path: &'static str) -> Self {
        Self {
            path,
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Build the upstream call for one request.
    pub fn request(&self, params: &ParamBag) -> UpstreamRequest {
        let mut request = UpstreamRequest::new(self.path)
            .cookie(params.cookie_jar())
            .real_ip(params.string(REAL_IP_KEY));

        for field in &self.fields {
            let value = params
                .value(field.source)
                .filter(|v| !v.is_null())
                .cloned()
                .or_else(|| field.default.map(Value::from));
            if let Some(value) = value {
                request = request.field(field.name, value);
            }
        }

        request
    }
}

impl Handler for Forward {
    fn call(&self, params: ParamBag, caller: OutboundCaller) -> BoxFuture<'static, HandlerResult> {
        caller.call(self.request(&params))
    }
}
