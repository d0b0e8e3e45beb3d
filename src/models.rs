use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::SearchError;

// Parameters the proxy always sets itself
pub const RESERVED_PARAMS: [&str; 3] = ["engine", "api_key", "ebay_domain"];

/// Caller-supplied eBay search filters (`_nkw`, `category_id`, ...).
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    params: Map<String, Value>,
}

impl SearchRequest {
    /// Parses a raw request body, which must be a JSON object naming a
    /// keyword or a category.
    pub fn from_body(body: &[u8]) -> Result<Self, SearchError> {
        let value: Value = serde_json::from_slice(body).map_err(|_| SearchError::InvalidBody)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, SearchError> {
        let Value::Object(params) = value else {
            return Err(SearchError::InvalidBody);
        };

        let request = Self { params };
        if !request.has_value("_nkw") && !request.has_value("category_id") {
            return Err(SearchError::MissingSearchTerms);
        }
        Ok(request)
    }

    fn has_value(&self, key: &str) -> bool {
        match self.params.get(key) {
            Some(Value::String(s)) => !s.trim().is_empty(),
            Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
            Some(Value::Bool(b)) => *b,
            _ => false,
        }
    }

    pub fn keyword(&self) -> Option<&str> {
        self.params.get("_nkw").and_then(Value::as_str)
    }

    /// Key/value pairs to append to the upstream query, sanitized.
    ///
    /// Null, empty and non-primitive values are skipped, as are keys that
    /// would override the fixed upstream parameters.
    pub fn forwarded_params(&self) -> Vec<(String, String)> {
        self.params
            .iter()
            .filter(|(key, _)| !RESERVED_PARAMS.contains(&key.as_str()))
            .filter_map(|(key, value)| {
                let raw = match value {
                    Value::String(s) => s.clone(),
                    Value::Number(n) => n.to_string(),
                    Value::Bool(b) => b.to_string(),
                    _ => return None,
                };
                let cleaned = sanitize_value(&raw);
                if cleaned.is_empty() {
                    None
                } else {
                    Some((key.clone(), cleaned))
                }
            })
            .collect()
    }
}

// Health endpoint response format
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
}

impl HealthResponse {
    pub fn healthy() -> Self {
        Self {
            status: "healthy",
            timestamp: Utc::now(),
        }
    }
}

// Keep only [A-Za-z0-9_\s.,()-]
pub fn sanitize_value(raw: &str) -> String {
    raw.chars()
        .filter(|c| {
            c.is_ascii_alphanumeric()
                || c.is_whitespace()
                || matches!(c, '_' | '.' | ',' | '(' | ')' | '-')
        })
        .collect()
}
