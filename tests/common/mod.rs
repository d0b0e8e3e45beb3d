//! Shared helpers: an in-process SerpAPI stand-in and request builders.

#![allow(dead_code)]

use axum::{
    Json, Router,
    body::Body,
    extract::{Query, State},
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::Value;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

use ebay_search_proxy::{ProxyConfig, build_router, state::AppState};

/// What the mock upstream answers with.
#[derive(Clone)]
pub struct MockReply {
    pub status: StatusCode,
    pub body: Value,
    pub delay: Duration,
}

impl MockReply {
    pub fn ok(body: Value) -> Self {
        Self {
            status: StatusCode::OK,
            body,
            delay: Duration::ZERO,
        }
    }
}

/// Everything the mock upstream saw.
#[derive(Clone, Default)]
pub struct Recorded {
    pub queries: Arc<Mutex<Vec<HashMap<String, String>>>>,
    pub user_agents: Arc<Mutex<Vec<String>>>,
}

impl Recorded {
    pub fn calls(&self) -> usize {
        self.queries.lock().unwrap().len()
    }

    pub fn last_query(&self) -> HashMap<String, String> {
        self.queries.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

#[derive(Clone)]
struct MockState {
    reply: MockReply,
    recorded: Recorded,
}

async fn mock_search(
    State(state): State<MockState>,
    Query(query): Query<HashMap<String, String>>,
    request: Request<Body>,
) -> Response {
    let ua = request
        .headers()
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    state.recorded.queries.lock().unwrap().push(query);
    state.recorded.user_agents.lock().unwrap().push(ua);

    if !state.reply.delay.is_zero() {
        tokio::time::sleep(state.reply.delay).await;
    }
    (state.reply.status, Json(state.reply.body)).into_response()
}

/// Start a mock SerpAPI on an ephemeral port, returning its search URL.
pub async fn start_mock_upstream(reply: MockReply) -> (String, Recorded) {
    let recorded = Recorded::default();
    let app = Router::new()
        .route("/search", get(mock_search))
        .with_state(MockState {
            reply,
            recorded: recorded.clone(),
        });

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    (format!("http://{addr}/search"), recorded)
}

pub fn test_config(upstream_url: &str) -> ProxyConfig {
    ProxyConfig {
        serpapi_key: Some("test-key".to_string()),
        upstream_url: upstream_url.to_string(),
        ..ProxyConfig::default()
    }
}

pub fn app_with(config: ProxyConfig) -> Router {
    build_router(Arc::new(AppState::new(config).unwrap()))
}

pub fn search_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/")
        .header("content-type", "application/json")
        .header("origin", "https://puckgenius.com")
        .header("x-forwarded-for", "203.0.113.10")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
