//! HTTP transport to the remote service.

use futures_util::future::BoxFuture;
use reqwest::header::{COOKIE, SET_COOKIE};
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::config::UpstreamConfig;
use crate::cookie::{strip_domain, to_header};
use crate::dispatch::{Envelope, HandlerResult};
use crate::upstream::{Upstream, UpstreamRequest};

/// `body.code` values the remote service uses for non-error replies.
const SUCCESS_CODES: &[i64] = &[201, 302, 400, 502, 800, 801, 802, 803];

/// Error type for building the upstream client.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("invalid upstream base URL: {0}")]
    BaseUrl(#[from] url::ParseError),

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Sends form-encoded POSTs to the configured base URL.
#[derive(Debug, Clone)]
pub struct HttpUpstream {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpUpstream {
    pub fn new(config: &UpstreamConfig) -> Result<Self, UpstreamError> {
        let base_url = Url::parse(&config.base_url)?;

        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.clone());
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            client: builder.build()?,
            base_url,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }
}

impl Upstream for HttpUpstream {
    fn send(&self, request: UpstreamRequest) -> BoxFuture<'static, HandlerResult> {
        let client = self.client.clone();
        let url = self.base_url.join(&request.path);

        Box::pin(async move {
            let url = url.map_err(|e| transport_failure(&e))?;
            let form: Vec<(String, String)> = request
                .data
                .iter()
                .filter_map(|(key, value)| Some((key.clone(), form_value(value)?)))
                .collect();

            let mut outbound = client.post(url.clone()).form(&form);
            if !request.options.cookie.is_empty() {
                outbound = outbound.header(COOKIE, to_header(&request.options.cookie));
            }
            if let Some(ip) = request.options.forwarded_ip() {
                outbound = outbound.header("X-Real-IP", ip).header("X-Forwarded-For", ip);
            }

            tracing::debug!(url = %url, fields = form.len(), "Calling upstream");

            let response = outbound.send().await.map_err(|e| {
                tracing::error!(url = %url, error = %e, "Upstream error");
                transport_failure(&e)
            })?;

            let status = response.status().as_u16();
            let cookie = response
                .headers()
                .get_all(SET_COOKIE)
                .iter()
                .filter_map(|v| v.to_str().ok())
                .map(strip_domain)
                .collect();
            let bytes = response.bytes().await.map_err(|e| transport_failure(&e))?;

            let body = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes)
                    .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
            };

            settle(status, body, cookie)
        })
    }
}

/// Turn an upstream reply into a resolved or rejected envelope.
///
/// The status is taken from `body.code` when present, else the HTTP status.
/// Codes the service uses for informational replies count as 200; anything
/// outside 100..600 becomes 400. Only 200 resolves.
pub fn settle(http_status: u16, body: Value, cookie: Vec<String>) -> HandlerResult {
    let code = body.get("code").and_then(|code| match code {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    });

    let mut status = code.unwrap_or(i64::from(http_status));
    if code.is_some_and(|c| SUCCESS_CODES.contains(&c)) {
        status = 200;
    }
    let status = if 100 < status && status < 600 {
        status as u16
    } else {
        400
    };

    let envelope = Envelope {
        status,
        body,
        cookie,
    };
    if status == 200 {
        Ok(envelope)
    } else {
        Err(envelope)
    }
}

fn transport_failure(err: &dyn std::fmt::Display) -> Envelope {
    Envelope::new(502, json!({ "code": 502, "msg": err.to_string() }))
}

fn form_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(_) | Value::Number(_) => Some(value.to_string()),
        Value::Array(_) | Value::Object(_) => Some(value.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settle_uses_body_code() {
        let ok = settle(200, json!({"code": 200, "data": 1}), vec!["a=b".into()]).unwrap();
        assert_eq!(ok.status, 200);
        assert_eq!(ok.cookie, vec!["a=b".to_string()]);

        let err = settle(200, json!({"code": 301, "msg": "need login"}), Vec::new()).unwrap_err();
        assert_eq!(err.status, 301);

        let err = settle(200, json!({"code": "405"}), Vec::new()).unwrap_err();
        assert_eq!(err.status, 405);
    }

    #[test]
    fn test_settle_informational_codes_resolve() {
        for code in [201, 302, 400, 502, 800, 803] {
            let env = settle(200, json!({ "code": code }), Vec::new()).unwrap();
            assert_eq!(env.status, 200);
        }
    }

    #[test]
    fn test_settle_falls_back_to_http_status() {
        assert_eq!(settle(200, Value::Null, Vec::new()).unwrap().status, 200);
        assert_eq!(settle(503, json!("busy"), Vec::new()).unwrap_err().status, 503);
        assert_eq!(settle(200, json!({"code": -460}), Vec::new()).unwrap_err().status, 400);
    }

    #[test]
    fn test_form_value() {
        assert_eq!(form_value(&json!("x")).as_deref(), Some("x"));
        assert_eq!(form_value(&json!(3)).as_deref(), Some("3"));
        assert_eq!(form_value(&json!(true)).as_deref(), Some("true"));
        assert_eq!(form_value(&json!([1, 2])).as_deref(), Some("[1,2]"));
        assert_eq!(form_value(&Value::Null), None);
    }

    #[test]
    fn test_new_rejects_bad_base_url() {
        let config = UpstreamConfig {
            base_url: "not a url".into(),
            ..Default::default()
        };
        assert!(matches!(HttpUpstream::new(&config), Err(UpstreamError::BaseUrl(_))));
    }
}
