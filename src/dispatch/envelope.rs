//! The uniform result shape shared by handlers and the dispatcher.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Message written into `body.msg` when the upstream reports code 301.
pub const LOGIN_REQUIRED_MSG: &str = "需要登录";

/// A handler's settled result: `{status, body, cookie}`.
///
/// `body` is `Value::Null` when the handler produced none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub status: u16,

    #[serde(default)]
    pub body: Value,

    /// Raw Set-Cookie lines, in order.
    #[serde(default)]
    pub cookie: Vec<String>,
}

/// Success and rejection carry the same envelope; rejection is the
/// handler's explicit failure signal.
pub type HandlerResult = Result<Envelope, Envelope>;

impl Envelope {
    pub fn new(status: u16, body: Value) -> Self {
        Self {
            status,
            body,
            cookie: Vec::new(),
        }
    }

    /// A 200 envelope.
    pub fn ok(body: Value) -> Self {
        Self::new(200, body)
    }

    pub fn with_cookies(mut self, cookie: Vec<String>) -> Self {
        self.cookie = cookie;
        self
    }

    /// The fixed reply for a rejection that carried no body.
    pub fn not_found() -> Self {
        Self::new(404, json!({ "code": 404, "data": null, "msg": "Not Found" }))
    }

    pub fn has_body(&self) -> bool {
        !self.body.is_null()
    }

    /// The `body.code` field, if the body is an object carrying one.
    pub fn code(&self) -> Option<&Value> {
        self.body.get("code")
    }

    /// True when `body.code` is 301, as a number or a string.
    pub fn requires_login(&self) -> bool {
        match self.code() {
            Some(Value::Number(n)) => n.as_f64() == Some(301.0),
            Some(Value::String(s)) => s.trim() == "301",
            _ => false,
        }
    }
}
