use clap::Parser;
use std::time::Duration;

pub const DEFAULT_UPSTREAM_URL: &str = "https://serpapi.com/search";

// Origins allowed when ALLOWED_ORIGINS is not set
pub const DEFAULT_ALLOWED_ORIGINS: [&str; 4] = [
    "https://puckgenius.com",
    "https://www.puckgenius.com",
    "http://localhost:3000",
    "http://localhost:5173",
];

// CLI argument structure, every flag can also come from the environment
#[derive(Parser, Debug, Clone)]
#[command(name = "ebay-search-proxy")]
#[command(about = "CORS-aware proxy between the eBay widget and SerpAPI")]
pub struct Args {
    // Port to run the server on
    #[arg(short, long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    // Interface to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    // SerpAPI secret, checked per request so a missing key is a 500, not a crash
    #[arg(long, env = "SERPAPI_KEY", hide_env_values = true)]
    pub serpapi_key: Option<String>,

    // Comma-separated CORS allow-list
    // Example: "https://puckgenius.com,http://localhost:3000"
    #[arg(long, env = "ALLOWED_ORIGINS")]
    pub allowed_origins: Option<String>,

    // Upstream search endpoint
    #[arg(long, env = "SERPAPI_URL", default_value = DEFAULT_UPSTREAM_URL)]
    pub upstream_url: String,

    // Upstream timeout in seconds
    #[arg(long, default_value_t = 10)]
    pub upstream_timeout: u64,

    // Rate limit max requests per window
    #[arg(long, default_value_t = 30)]
    pub rate_limit: u32,

    // Rate limit window in seconds
    #[arg(long, default_value_t = 60)]
    pub rate_window: u64,

    // Tracked client count above which expired entries get swept
    #[arg(long, default_value_t = 1000)]
    pub max_tracked_clients: usize,
}

impl Args {
    pub fn into_config(self) -> ProxyConfig {
        ProxyConfig {
            serpapi_key: self.serpapi_key.filter(|k| !k.trim().is_empty()),
            allowed_origins: parse_origins(self.allowed_origins.as_deref()),
            upstream_url: self.upstream_url,
            upstream_timeout: Duration::from_secs(self.upstream_timeout),
            rate_limit: self.rate_limit,
            rate_window: Duration::from_secs(self.rate_window),
            max_tracked_clients: self.max_tracked_clients,
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Runtime settings for the search service, independent of how they were sourced.
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub serpapi_key: Option<String>,
    pub allowed_origins: Vec<String>,
    pub upstream_url: String,
    pub upstream_timeout: Duration,
    pub rate_limit: u32,
    pub rate_window: Duration,
    pub max_tracked_clients: usize,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            serpapi_key: None,
            allowed_origins: parse_origins(None),
            upstream_url: DEFAULT_UPSTREAM_URL.to_string(),
            upstream_timeout: Duration::from_secs(10),
            rate_limit: 30,
            rate_window: Duration::from_secs(60),
            max_tracked_clients: 1000,
        }
    }
}

// Split a comma-separated list, falling back to the defaults when nothing usable is left
pub fn parse_origins(raw: Option<&str>) -> Vec<String> {
    let origins: Vec<String> = raw
        .unwrap_or_default()
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect();

    if origins.is_empty() {
        DEFAULT_ALLOWED_ORIGINS.iter().map(|s| s.to_string()).collect()
    } else {
        origins
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origins_fall_back_to_defaults() {
        assert_eq!(parse_origins(None).len(), 4);
        assert_eq!(parse_origins(Some(" , ")).len(), 4);
    }

    #[test]
    fn origins_are_trimmed() {
        let origins = parse_origins(Some("https://a.example , https://b.example,"));
        assert_eq!(origins, vec!["https://a.example", "https://b.example"]);
    }

    #[test]
    fn blank_api_key_is_treated_as_missing() {
        let args = Args::parse_from([
            "ebay-search-proxy",
            "--serpapi-key",
            "  ",
            "--rate-window",
            "5",
        ]);
        let config = args.into_config();
        assert!(config.serpapi_key.is_none());
        assert_eq!(config.rate_window, Duration::from_secs(5));
    }
}
