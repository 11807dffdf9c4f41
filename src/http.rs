//! Shared HTTP client for the hosted store and hosted auth
//!
//! One `reqwest::Client` per process, configured with connect and request
//! timeouts. Requests are never retried: a failed call surfaces to the
//! caller as-is.

use reqwest::{Client, Method, RequestBuilder};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Default connect timeout (10 seconds)
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("failed to build HTTP client: {0}")]
    Build(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("request failed: {0}")]
    Transport(String),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
}

#[derive(Clone)]
pub(crate) struct HttpClient {
    client: Arc<Client>,
    timeout: Duration,
}

impl HttpClient {
    pub fn new(timeout: Duration) -> Result<Self, HttpError> {
        let client = Client::builder()
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT.min(timeout))
            .timeout(timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .use_rustls_tls()
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;

        Ok(Self {
            client: Arc::new(client),
            timeout,
        })
    }

    pub fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.client.request(method, url)
    }

    /// Send a request and return the body of a successful response
    ///
    /// Non-2xx responses become `HttpError::Status` carrying the body text.
    pub async fn execute(&self, request: RequestBuilder, what: &str) -> Result<String, HttpError> {
        debug!(
            request = what,
            timeout_secs = self.timeout.as_secs(),
            "sending HTTP request"
        );

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                HttpError::Timeout(self.timeout)
            } else {
                HttpError::Transport(e.to_string())
            }
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| HttpError::Transport(format!("reading {} response: {}", what, e)))?;

        if status.is_success() {
            Ok(body)
        } else {
            debug!(
                request = what,
                status = status.as_u16(),
                "HTTP request failed"
            );
            Err(HttpError::Status {
                status: status.as_u16(),
                body,
            })
        }
    }
}

/// Pull a readable message out of an error body
///
/// The hosted API answers with `{"message": ...}` (REST) or
/// `{"msg": ...}` / `{"error_description": ...}` (auth); anything else is
/// returned trimmed.
pub(crate) fn error_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["message", "msg", "error_description", "error"] {
            if let Some(text) = value.get(key).and_then(|v| v.as_str()) {
                return text.to_string();
            }
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "empty response body".to_string()
    } else {
        trimmed.to_string()
    }
}
