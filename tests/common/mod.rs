//! Shared utilities for integration tests.

#![allow(dead_code)]

use axum::extract::{Form, State};
use axum::http::{header, HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use futures_util::future::BoxFuture;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

use relay_gateway::dispatch::HandlerResult;
use relay_gateway::upstream::{Upstream, UpstreamRequest};

/// A request as seen by the mock service.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub path: String,
    pub form: HashMap<String, String>,
    pub cookie: Option<String>,
    pub real_ip: Option<String>,
    pub forwarded_for: Option<String>,
}

/// A canned reply.
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: u16,
    pub body: Value,
    pub set_cookie: Vec<&'static str>,
}

impl Reply {
    pub fn json(body: Value) -> Self {
        Self {
            status: 200,
            body,
            set_cookie: Vec::new(),
        }
    }

    pub fn with_cookie(mut self, line: &'static str) -> Self {
        self.set_cookie.push(line);
        self
    }
}

#[derive(Clone, Default)]
struct MockState {
    replies: Arc<BTreeMap<String, Reply>>,
    seen: Arc<Mutex<Vec<Recorded>>>,
}

/// Handle to a running mock service.
pub struct MockService {
    pub addr: SocketAddr,
    seen: Arc<Mutex<Vec<Recorded>>>,
}

impl MockService {
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.seen.lock().unwrap().clone()
    }
}

/// Start a mock remote service on an ephemeral port. Paths without a canned
/// reply answer 404 with a JSON body.
pub async fn start_mock_service(replies: Vec<(&str, Reply)>) -> MockService {
    let state = MockState {
        replies: Arc::new(
            replies
                .into_iter()
                .map(|(path, reply)| (path.to_string(), reply))
                .collect(),
        ),
        seen: Arc::default(),
    };
    let seen = Arc::clone(&state.seen);

    let app = Router::new().fallback(mock_handler).with_state(state);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockService { addr, seen }
}

async fn mock_handler(
    State(state): State<MockState>,
    uri: Uri,
    headers: HeaderMap,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    let text = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    state.seen.lock().unwrap().push(Recorded {
        path: uri.path().to_string(),
        form,
        cookie: text(header::COOKIE),
        real_ip: text(header::HeaderName::from_static("x-real-ip")),
        forwarded_for: text(header::HeaderName::from_static("x-forwarded-for")),
    });

    let Some(reply) = state.replies.get(uri.path()).cloned() else {
        return (
            StatusCode::NOT_FOUND,
            axum::Json(json!({"code": 404, "msg": "no such api"})),
        )
            .into_response();
    };

    let mut response = (
        StatusCode::from_u16(reply.status).unwrap(),
        axum::Json(reply.body),
    )
        .into_response();
    for line in reply.set_cookie {
        response
            .headers_mut()
            .append(header::SET_COOKIE, line.parse().unwrap());
    }
    response
}

/// In-process upstream that counts calls and returns a fixed result.
#[derive(Clone)]
pub struct FixedUpstream {
    result: HandlerResult,
    pub calls: Arc<Mutex<Vec<UpstreamRequest>>>,
}

impl FixedUpstream {
    pub fn new(result: HandlerResult) -> Self {
        Self {
            result,
            calls: Arc::default(),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl Upstream for FixedUpstream {
    fn send(&self, request: UpstreamRequest) -> BoxFuture<'static, HandlerResult> {
        self.calls.lock().unwrap().push(request);
        let result = self.result.clone();
        Box::pin(async move { result })
    }
}
