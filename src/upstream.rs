//! SerpAPI client for the eBay engine.

use std::time::{Duration, Instant};

use reqwest::{Client, Url};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::error::SearchError;
use crate::metrics::{UPSTREAM_FAILURES, UPSTREAM_LATENCY};
use crate::models::SearchRequest;

pub const USER_AGENT: &str = "eBay-Widget/1.0";
const ENGINE: &str = "ebay";
const EBAY_DOMAIN: &str = "ebay.com";

#[derive(Debug, Clone)]
pub struct SerpClient {
    http_client: Client,
    base_url: Url,
    api_key: Option<String>,
    timeout: Duration,
}

impl SerpClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, SearchError> {
        let base_url = base_url.into();
        let base_url = Url::parse(&base_url)
            .map_err(|e| SearchError::InvalidUpstreamUrl(format!("{base_url}: {e}")))?;
        let http_client = Client::builder().user_agent(USER_AGENT).build()?;

        Ok(Self {
            http_client,
            base_url,
            api_key,
            timeout,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Builds the GET URL: fixed parameters first, then the caller's filters.
    pub fn search_url(&self, request: &SearchRequest) -> Result<Url, SearchError> {
        let api_key = self.api_key.as_deref().ok_or(SearchError::MissingApiKey)?;
        let mut url = self.base_url.clone();

        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("engine", ENGINE)
                .append_pair("api_key", api_key)
                .append_pair("ebay_domain", EBAY_DOMAIN);
            for (key, value) in request.forwarded_params() {
                query.append_pair(&key, &value);
            }
        }

        Ok(url)
    }

    /// Runs one search; no retries, the caller repeats on failure.
    #[instrument(skip_all, fields(keyword = request.keyword().unwrap_or_default()))]
    pub async fn search(&self, request: &SearchRequest) -> Result<Value, SearchError> {
        let url = self.search_url(request)?;
        let start = Instant::now();

        let result = match tokio::time::timeout(self.timeout, self.fetch(url)).await {
            Ok(result) => result,
            Err(_) => Err(SearchError::Timeout),
        };

        UPSTREAM_LATENCY.observe(start.elapsed().as_secs_f64());
        if result.is_err() {
            UPSTREAM_FAILURES.inc();
        }
        result
    }

    async fn fetch(&self, url: Url) -> Result<Value, SearchError> {
        debug!(url = %self.base_url, "Sending search request to SerpAPI");

        let response = self.http_client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                SearchError::Timeout
            } else {
                SearchError::Network(e)
            }
        })?;

        let status = response.status();
        debug!(status = %status, "Received response from SerpAPI");

        if !status.is_success() {
            return Err(SearchError::UpstreamStatus {
                status: status.as_u16(),
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| SearchError::InvalidResponse(format!("JSON parse error: {e}")))?;

        // SerpAPI reports bad searches as 200 with an error field
        if let Some(message) = upstream_error(&body) {
            return Err(SearchError::UpstreamRejected(message));
        }

        Ok(body)
    }
}

// A null or blank `error` field is not a rejection
fn upstream_error(body: &Value) -> Option<String> {
    match body.get("error")? {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client(key: Option<&str>) -> SerpClient {
        SerpClient::new(
            "https://serpapi.com/search",
            key.map(str::to_string),
            Duration::from_secs(10),
        )
        .unwrap()
    }

    #[test]
    fn url_carries_fixed_and_forwarded_params() {
        let request = SearchRequest::from_value(json!({
            "_nkw": "hockey jersey",
            "category_id": 2536,
        }))
        .unwrap();

        let url = client(Some("secret")).search_url(&request).unwrap();
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        assert_eq!(url.host_str(), Some("serpapi.com"));
        assert_eq!(url.path(), "/search");
        assert_eq!(&pairs[..3], &[
            ("engine".to_string(), "ebay".to_string()),
            ("api_key".to_string(), "secret".to_string()),
            ("ebay_domain".to_string(), "ebay.com".to_string()),
        ]);
        assert!(pairs.contains(&("_nkw".to_string(), "hockey jersey".to_string())));
        assert!(pairs.contains(&("category_id".to_string(), "2536".to_string())));
    }

    #[test]
    fn only_meaningful_error_fields_reject() {
        assert_eq!(
            upstream_error(&json!({"error": "Invalid API key."})),
            Some("Invalid API key.".to_string())
        );
        assert_eq!(
            upstream_error(&json!({"error": {"code": 1}})),
            Some(r#"{"code":1}"#.to_string())
        );
        assert_eq!(upstream_error(&json!({"error": null})), None);
        assert_eq!(upstream_error(&json!({"error": "  "})), None);
        assert_eq!(upstream_error(&json!({"organic_results": []})), None);
    }

    #[test]
    fn rejects_unparseable_base_url() {
        let result = SerpClient::new("not a url", None, Duration::from_secs(1));
        assert!(matches!(result, Err(SearchError::InvalidUpstreamUrl(_))));
    }

    #[test]
    fn missing_key_is_reported_before_any_call() {
        let request = SearchRequest::from_value(json!({"_nkw": "x"})).unwrap();
        let client = client(None);
        assert!(!client.is_configured());
        assert!(matches!(client.search_url(&request), Err(SearchError::MissingApiKey)));
    }
}
