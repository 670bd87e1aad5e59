//! Errors raised before a request reaches its handler.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::{json, Value};
use thiserror::Error;

use crate::dispatch::Envelope;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("invalid JSON body: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid multipart body: {message}")]
    Multipart { status: StatusCode, message: String },

    #[error("failed to read request body: {0}")]
    Body(String),
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::Multipart { status, .. } => *status,
            GatewayError::Json(_) | GatewayError::Body(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl From<GatewayError> for Envelope {
    fn from(err: GatewayError) -> Self {
        let status = err.status().as_u16();
        Envelope::new(
            status,
            json!({ "code": status, "data": Value::Null, "msg": err.to_string() }),
        )
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        tracing::warn!(error = %self, "Rejected request body");
        Envelope::from(self).into_response()
    }
}
