use crate::config::ProxyConfig;
use crate::cors::CorsPolicy;
use crate::error::SearchError;
use crate::rate_limit::RateLimiter;
use crate::upstream::SerpClient;
// app's shared state

pub struct AppState {
    pub upstream: SerpClient,
    pub cors: CorsPolicy,
    pub rate_limiter: RateLimiter, // per-IP fixed window, scoped to this state
}

impl AppState {
    pub fn new(config: ProxyConfig) -> Result<Self, SearchError> {
        Ok(Self {
            upstream: SerpClient::new(
                config.upstream_url,
                config.serpapi_key,
                config.upstream_timeout,
            )?,
            cors: CorsPolicy::new(config.allowed_origins),
            rate_limiter: RateLimiter::new(
                config.rate_limit,
                config.rate_window,
                config.max_tracked_clients,
            ),
        })
    }
}
