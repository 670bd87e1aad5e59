//! Envelope rendering.
//!
//! # Design Decisions
//! - Always `application/json; charset=utf-8`
//! - One `Set-Cookie` header per envelope cookie line, in order
//! - A null body is sent as an empty body

use axum::body::Body;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::dispatch::Envelope;

pub const JSON_UTF8: &str = "application/json; charset=utf-8";

impl IntoResponse for Envelope {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or_else(|_| {
            tracing::warn!(status = self.status, "Handler produced an invalid status code");
            StatusCode::INTERNAL_SERVER_ERROR
        });

        let body = if self.body.is_null() {
            Body::empty()
        } else {
            match serde_json::to_vec(&self.body) {
                Ok(bytes) => Body::from(bytes),
                Err(e) => {
                    tracing::error!(error = %e, "Failed to serialize response body");
                    return StatusCode::INTERNAL_SERVER_ERROR.into_response();
                }
            }
        };

        let mut response = Response::new(body);
        *response.status_mut() = status;

        let headers = response.headers_mut();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(JSON_UTF8));
        for line in &self.cookie {
            match HeaderValue::from_str(line) {
                Ok(value) => {
                    headers.append(header::SET_COOKIE, value);
                }
                Err(_) => tracing::warn!(cookie = %line, "Dropping unrepresentable Set-Cookie line"),
            }
        }

        response
    }
}
