//! eBay search proxy: validates widget searches, forwards them to SerpAPI and
//! returns results with a uniform `price` string and no `shipping` field.

pub mod config;
pub mod cors;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod rate_limit;
pub mod sanitize;
pub mod state;
pub mod upstream;

use axum::{
    Router,
    routing::{any, get},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::handlers::{health_handler, metrics_handler, search_handler};
use crate::state::AppState;

pub use config::{Args, ProxyConfig};
pub use error::SearchError;

// Search route takes every method so OPTIONS and 405s still get CORS headers
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", any(search_handler))
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
