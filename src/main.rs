use clap::Parser; // for cli
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ebay_search_proxy::{Args, build_router, state::AppState};

// this is main async function with tokio
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // .env is optional, real environment wins
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ebay_search_proxy=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // parse cli arguments
    let args = Args::parse();
    let addr = args.bind_address();
    let config = args.into_config();

    if config.serpapi_key.is_none() {
        tracing::warn!("SERPAPI_KEY is not set, searches will fail with 500");
    }
    tracing::info!(
        upstream = %config.upstream_url,
        allowed_origins = ?config.allowed_origins,
        rate_limit = config.rate_limit,
        rate_window_secs = config.rate_window.as_secs(),
        upstream_timeout_secs = config.upstream_timeout.as_secs(),
        "Configuration loaded"
    );

    let state = Arc::new(AppState::new(config)?);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %listener.local_addr()?, "Search proxy listening");

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
