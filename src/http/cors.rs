//! Cross-origin headers and preflight handling.
//!
//! # Design Decisions
//! - Headers apply to every path except `/` and paths containing a `.`
//!   (static assets)
//! - The allow-origin is the configured value, else the caller's `Origin`,
//!   else `*`
//! - `OPTIONS` is answered with 204 and never reaches a handler

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode};
use axum::middleware::Next;
use axum::response::Response;

use crate::http::response::JSON_UTF8;

const ALLOW_HEADERS: &str = "X-Requested-With,Content-Type";
const ALLOW_METHODS: &str = "PUT,POST,GET,DELETE,OPTIONS";

/// Cross-origin policy shared by every request.
#[derive(Debug, Clone, Default)]
pub struct CorsPolicy {
    allow_origin: Option<HeaderValue>,
}

impl CorsPolicy {
    pub fn new(allow_origin: Option<&str>) -> Self {
        let allow_origin = allow_origin.and_then(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS allow-origin");
                None
            }
        });
        Self { allow_origin }
    }

    /// Whether CORS headers are attached for `path`.
    pub fn applies_to(path: &str) -> bool {
        path != "/" && !path.contains('.')
    }

    fn headers(&self, origin: Option<&HeaderValue>) -> HeaderMap {
        let origin = self
            .allow_origin
            .clone()
            .or_else(|| origin.cloned())
            .unwrap_or_else(|| HeaderValue::from_static("*"));

        let mut headers = HeaderMap::new();
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
            HeaderValue::from_static("true"),
        );
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin);
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOW_HEADERS),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOW_METHODS),
        );
        headers
    }
}

/// Attach CORS headers and short-circuit preflight requests.
pub async fn cors_middleware(
    State(policy): State<CorsPolicy>,
    request: Request,
    next: Next,
) -> Response {
    let cors = CorsPolicy::applies_to(request.uri().path())
        .then(|| policy.headers(request.headers().get(header::ORIGIN)));

    let mut response = if request.method() == Method::OPTIONS {
        let mut response = Response::new(Body::empty());
        *response.status_mut() = StatusCode::NO_CONTENT;
        response
    } else {
        next.run(request).await
    };

    if let Some(cors) = cors {
        let headers = response.headers_mut();
        headers.extend(cors);
        if !headers.contains_key(header::CONTENT_TYPE) {
            headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(JSON_UTF8));
        }
    }

    response
}
