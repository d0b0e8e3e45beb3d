//! Failure kinds of the search pipeline and their HTTP mapping.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Invalid request body")]
    InvalidBody,

    #[error("Either search keyword (_nkw) or category_id is required")]
    MissingSearchTerms,

    #[error("Too many requests. Please try again later.")]
    RateLimited { retry_after: u64 },

    #[error("SerpAPI key not configured")]
    MissingApiKey,

    /// SerpAPI answered with an `error` field in its JSON body.
    #[error("SerpAPI error: {0}")]
    UpstreamRejected(String),

    #[error("SerpAPI request failed with status {status}")]
    UpstreamStatus { status: u16 },

    #[error("Request timeout - eBay search took too long. Please try again.")]
    Timeout,

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response from SerpAPI: {0}")]
    InvalidResponse(String),

    #[error("Invalid upstream URL {0}")]
    InvalidUpstreamUrl(String),
}

impl SearchError {
    pub fn status(&self) -> StatusCode {
        match self {
            SearchError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            SearchError::InvalidBody
            | SearchError::MissingSearchTerms
            | SearchError::UpstreamRejected(_) => StatusCode::BAD_REQUEST,
            SearchError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            SearchError::Timeout => StatusCode::REQUEST_TIMEOUT,
            SearchError::MissingApiKey
            | SearchError::UpstreamStatus { .. }
            | SearchError::Network(_)
            | SearchError::InvalidResponse(_)
            | SearchError::InvalidUpstreamUrl(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    // Failures that escaped the expected paths get the generic prefix
    fn is_unexpected(&self) -> bool {
        matches!(
            self,
            SearchError::UpstreamStatus { .. }
                | SearchError::Network(_)
                | SearchError::InvalidResponse(_)
                | SearchError::InvalidUpstreamUrl(_)
        )
    }
}

/// JSON body of every failed search.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(rename = "retryAfter", skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
}

impl From<&SearchError> for ErrorBody {
    fn from(err: &SearchError) -> Self {
        let error = if err.is_unexpected() {
            format!("Failed to search eBay products: {err}")
        } else {
            err.to_string()
        };
        let retry_after = match err {
            SearchError::RateLimited { retry_after } => Some(*retry_after),
            _ => None,
        };
        Self { error, retry_after }
    }
}

impl IntoResponse for SearchError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "Search request failed");
        } else {
            tracing::warn!(status = status.as_u16(), error = %self, "Search request rejected");
        }

        (status, Json(ErrorBody::from(&self))).into_response()
    }
}
