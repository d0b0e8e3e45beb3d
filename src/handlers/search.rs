use axum::{
    Json,
    body::{Body, to_bytes},
    extract::{ConnectInfo, State},
    http::{Method, Request, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::error::SearchError;
use crate::metrics::{RATE_LIMITED_TOTAL, REQUEST_TOTAL};
use crate::models::SearchRequest;
use crate::rate_limit::client_ip;
use crate::sanitize::sanitize_response;
use crate::state::AppState;

// Widget payloads are a handful of filters
const MAX_BODY_BYTES: usize = 64 * 1024;

pub async fn search_handler(State(state): State<Arc<AppState>>, request: Request<Body>) -> Response {
    let origin = request.headers().get(header::ORIGIN).cloned();

    let mut response = if request.method() == Method::OPTIONS {
        StatusCode::OK.into_response()
    } else {
        match run_search(&state, request).await {
            Ok(body) => Json(body).into_response(),
            Err(err) => err.into_response(),
        }
    };

    state.cors.apply(origin.as_ref(), response.headers_mut());
    response
}

async fn run_search(state: &AppState, request: Request<Body>) -> Result<Value, SearchError> {
    if request.method() != Method::POST {
        return Err(SearchError::MethodNotAllowed);
    }
    REQUEST_TOTAL.inc();

    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let ip = client_ip(request.headers(), peer);

    if !state.rate_limiter.check(&ip) {
        RATE_LIMITED_TOTAL.inc();
        tracing::warn!(client = %ip, "Rate limit exceeded");
        return Err(SearchError::RateLimited {
            retry_after: state.rate_limiter.retry_after_secs(),
        });
    }

    if !state.upstream.is_configured() {
        return Err(SearchError::MissingApiKey);
    }

    let body = to_bytes(request.into_body(), MAX_BODY_BYTES)
        .await
        .map_err(|_| SearchError::InvalidBody)?;
    let search = SearchRequest::from_body(&body)?;

    tracing::info!(client = %ip, keyword = search.keyword().unwrap_or_default(), "Searching eBay");

    let results = state.upstream.search(&search).await?;
    Ok(sanitize_response(results))
}
