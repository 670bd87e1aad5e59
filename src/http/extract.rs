//! Inbound request extraction.
//!
//! # Responsibilities
//! - Parse the query string (repeated keys become arrays)
//! - Parse JSON, urlencoded and multipart bodies
//! - Collect the raw cookie header and the peer address

use axum::body::Body;
use axum::extract::{ConnectInfo, FromRequest, Multipart, Request};
use axum::http::header;
use serde_json::{Map, Value};
use std::net::SocketAddr;
use url::form_urlencoded;

use crate::context::UploadedFile;
use crate::dispatch::Inbound;
use crate::http::error::GatewayError;

/// Read everything the dispatcher needs out of `request`.
pub async fn read_inbound(
    request: Request,
    secure: bool,
    body_limit: usize,
) -> Result<Inbound, GatewayError> {
    let original_url = request
        .uri()
        .path_and_query()
        .map_or_else(|| request.uri().path().to_string(), |pq| pq.as_str().to_string());

    let mut inbound = Inbound::new(request.method().clone(), original_url);
    inbound.secure = secure;
    inbound.query = parse_urlencoded(request.uri().query().unwrap_or_default().as_bytes());
    inbound.cookie_header = cookie_header(&request);
    inbound.peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);

    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    if content_type.starts_with("multipart/form-data") {
        read_multipart(request, &mut inbound).await?;
        return Ok(inbound);
    }

    let bytes = axum::body::to_bytes(request.into_body(), body_limit)
        .await
        .map_err(|e| GatewayError::Body(e.to_string()))?;

    if content_type.starts_with("application/json") {
        inbound.body = parse_json_object(&bytes)?;
    } else if content_type.starts_with("application/x-www-form-urlencoded") {
        inbound.body = parse_urlencoded(&bytes);
    }

    Ok(inbound)
}

async fn read_multipart(request: Request<Body>, inbound: &mut Inbound) -> Result<(), GatewayError> {
    let mut multipart = Multipart::from_request(request, &()).await.map_err(|rejection| {
        GatewayError::Multipart {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    })?;

    let field_error = |e: axum::extract::multipart::MultipartError| GatewayError::Multipart {
        status: e.status(),
        message: e.body_text(),
    };

    while let Some(field) = multipart.next_field().await.map_err(field_error)? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        match field.file_name().map(str::to_string) {
            Some(file_name) => {
                let mimetype = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field.bytes().await.map_err(field_error)?;
                inbound.files.push((name, UploadedFile::new(file_name, mimetype, data)));
            }
            None => {
                let text = field.text().await.map_err(field_error)?;
                insert_repeated(&mut inbound.body, name, text);
            }
        }
    }

    Ok(())
}

/// The raw `Cookie` header; multiple headers are joined with `; `.
fn cookie_header(request: &Request) -> Option<String> {
    let values: Vec<&str> = request
        .headers()
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .collect();
    (!values.is_empty()).then(|| values.join("; "))
}

/// Parse `a=1&b=2&a=3` into `{a: ["1", "3"], b: "2"}`.
pub fn parse_urlencoded(raw: &[u8]) -> Map<String, Value> {
    let mut fields = Map::new();
    for (key, value) in form_urlencoded::parse(raw) {
        insert_repeated(&mut fields, key.into_owned(), value.into_owned());
    }
    fields
}

fn insert_repeated(fields: &mut Map<String, Value>, key: String, value: String) {
    match fields.get_mut(&key) {
        Some(Value::Array(values)) => values.push(Value::String(value)),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, Value::String(value)]);
        }
        None => {
            fields.insert(key, Value::String(value));
        }
    }
}

/// A JSON body contributes fields only when it is an object.
fn parse_json_object(bytes: &[u8]) -> Result<Map<String, Value>, GatewayError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Map::new());
    }
    match serde_json::from_slice(bytes)? {
        Value::Object(map) => Ok(map),
        _ => Ok(Map::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    #[test]
    fn test_parse_urlencoded() {
        let fields = parse_urlencoded(b"id=1&ids=2&ids=3&ids=4&q=%E6%B5%B7+x");
        assert_eq!(fields["id"], json!("1"));
        assert_eq!(fields["ids"], json!(["2", "3", "4"]));
        assert_eq!(fields["q"], json!("海 x"));
        assert!(parse_urlencoded(b"").is_empty());
    }

    #[tokio::test]
    async fn test_read_json_body() {
        let request = axum::http::Request::builder()
            .method(Method::POST)
            .uri("/song/url?id=1")
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::COOKIE, "a=1")
            .header(header::COOKIE, "b=2")
            .body(Body::from(r#"{"br": 320000, "id": "9"}"#))
            .unwrap();

        let inbound = read_inbound(request, true, 1024).await.unwrap();
        assert_eq!(inbound.path, "/song/url");
        assert_eq!(inbound.original_url, "/song/url?id=1");
        assert_eq!(inbound.query["id"], json!("1"));
        assert_eq!(inbound.body["br"], json!(320000));
        assert_eq!(inbound.cookie_header.as_deref(), Some("a=1; b=2"));
        assert!(inbound.secure);
        assert!(inbound.peer.is_none());
    }

    #[tokio::test]
    async fn test_read_form_body() {
        let request = axum::http::Request::builder()
            .method(Method::POST)
            .uri("/login")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("phone=123&password=x"))
            .unwrap();

        let inbound = read_inbound(request, false, 1024).await.unwrap();
        assert_eq!(inbound.body["phone"], json!("123"));
        assert!(inbound.cookie_header.is_none());
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let request = axum::http::Request::builder()
            .method(Method::POST)
            .uri("/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();

        let err = read_inbound(request, false, 1024).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_read_multipart_body() {
        let boundary = "X-BOUNDARY";
        let body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"id\"\r\n\r\n42\r\n\
             --{b}\r\nContent-Disposition: form-data; name=\"imgFile\"; filename=\"a.png\"\r\n\
             Content-Type: image/png\r\n\r\nPNGDATA\r\n--{b}--\r\n",
            b = boundary
        );
        let request = axum::http::Request::builder()
            .method(Method::POST)
            .uri("/avatar/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap();

        let inbound = read_inbound(request, false, 1024 * 1024).await.unwrap();
        assert_eq!(inbound.body["id"], json!("42"));
        assert_eq!(inbound.files.len(), 1);
        let (field, file) = &inbound.files[0];
        assert_eq!(field, "imgFile");
        assert_eq!(file.name, "a.png");
        assert_eq!(file.mimetype, "image/png");
        assert_eq!(&file.data[..], b"PNGDATA");
        assert_eq!(file.size, 7);
    }
}
