use lazy_static::lazy_static;
use prometheus::{Counter, Gauge, Histogram, register_counter, register_gauge, register_histogram};


lazy_static! {
    pub static ref REQUEST_TOTAL: Counter =
        register_counter!("ebay_search_requests_total", "Total number of search requests").unwrap();
    pub static ref RATE_LIMITED_TOTAL: Counter =
        register_counter!("ebay_search_rate_limited_total", "Requests rejected by the rate limiter").unwrap();
    pub static ref UPSTREAM_FAILURES: Counter =
        register_counter!("ebay_search_upstream_failures_total", "Failed or rejected SerpAPI calls").unwrap();
    pub static ref UPSTREAM_LATENCY: Histogram = register_histogram!(
        "ebay_search_upstream_latency_seconds",
        "SerpAPI round-trip latency in seconds"
    )
    .unwrap();
    pub static ref TRACKED_CLIENTS: Gauge =
        register_gauge!("ebay_search_tracked_clients", "Client IPs currently tracked by the rate limiter").unwrap();
}
