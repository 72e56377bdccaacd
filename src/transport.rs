//! HTTP transport for the game server.
//!
//! [`Transport`] is the seam between sessions and the network. It offers a
//! blocking call for synchronous paths and an async call for Tokio tasks.
//! [`HttpTransport`] is the reqwest-backed implementation.

use crate::error::{ExplorerError, ExplorerResult};
use crate::protocol::Endpoint;
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{debug, error, instrument};

/// One JSON request/response exchange with the game server.
#[async_trait]
pub trait Transport: Send + Sync + fmt::Debug {
    /// Posts `body` to `endpoint`, blocking the calling thread.
    ///
    /// Implementations that cannot block inside an async runtime return a
    /// transport error there; use [`post`](Self::post) instead.
    fn post_blocking(&self, endpoint: Endpoint, body: &Value) -> ExplorerResult<Value>;

    /// Posts `body` to `endpoint` without blocking the runtime.
    async fn post(&self, endpoint: Endpoint, body: &Value) -> ExplorerResult<Value>;
}

/// reqwest-backed transport bound to one server URL.
///
/// The blocking client is built on first use so that a transport created
/// inside a Tokio runtime never constructs one unless asked to.
pub struct HttpTransport {
    base_url: String,
    timeout: Duration,
    client: reqwest::Client,
    blocking: OnceLock<reqwest::blocking::Client>,
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl HttpTransport {
    /// Creates a transport for `base_url`. Trailing slashes are stripped.
    #[instrument(skip(base_url), fields(base_url = %base_url.as_ref()))]
    pub fn new(base_url: impl AsRef<str>, timeout: Duration) -> ExplorerResult<Self> {
        let base_url = base_url.as_ref().trim_end_matches('/').to_string();
        let client = reqwest::Client::builder().timeout(timeout).build().map_err(|e| {
            error!(error = %e, "Failed to build HTTP client");
            ExplorerError::transport(format!("Failed to build HTTP client: {}", e))
        })?;
        debug!(base_url = %base_url, ?timeout, "Created HTTP transport");
        Ok(Self {
            base_url,
            timeout,
            client,
            blocking: OnceLock::new(),
        })
    }

    /// Base URL without trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Per-request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn url(&self, endpoint: Endpoint) -> String {
        format!("{}{}", self.base_url, endpoint.path())
    }

    fn blocking_client(&self) -> ExplorerResult<&reqwest::blocking::Client> {
        if let Some(client) = self.blocking.get() {
            return Ok(client);
        }
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| {
                error!(error = %e, "Failed to build blocking HTTP client");
                ExplorerError::transport(format!("Failed to build HTTP client: {}", e))
            })?;
        Ok(self.blocking.get_or_init(|| client))
    }
}

#[track_caller]
fn status_error(endpoint: Endpoint, status: reqwest::StatusCode) -> ExplorerError {
    error!(endpoint = endpoint.path(), status = %status, "Server returned error status");
    ExplorerError::transport(format!("{} returned HTTP {}", endpoint.path(), status))
}

#[track_caller]
fn parse_body(endpoint: Endpoint, text: &str) -> ExplorerResult<Value> {
    serde_json::from_str(text).map_err(|e| {
        error!(error = %e, response = %text, "Failed to parse JSON response");
        ExplorerError::protocol(format!("{} returned invalid JSON: {}", endpoint.path(), e))
    })
}

#[async_trait]
impl Transport for HttpTransport {
    #[instrument(skip(self, body), fields(url = %self.url(endpoint)))]
    fn post_blocking(&self, endpoint: Endpoint, body: &Value) -> ExplorerResult<Value> {
        if tokio::runtime::Handle::try_current().is_ok() {
            error!("Blocking request issued from inside an async runtime");
            return Err(ExplorerError::transport(format!(
                "Blocking {} request cannot run inside an async runtime; use the async API",
                endpoint.path()
            )));
        }
        debug!(body = %body, "Sending blocking request");
        let response = self
            .blocking_client()?
            .post(self.url(endpoint))
            .json(body)
            .send()
            .map_err(|e| {
                error!(error = %e, "HTTP request failed");
                ExplorerError::transport(format!("HTTP request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(endpoint, status));
        }

        let text = response.text().map_err(|e| {
            error!(error = %e, "Failed to read response body");
            ExplorerError::transport(format!("Failed to read response: {}", e))
        })?;
        debug!(response = %text, "Response body");
        parse_body(endpoint, &text)
    }

    #[instrument(skip(self, body), fields(url = %self.url(endpoint)))]
    async fn post(&self, endpoint: Endpoint, body: &Value) -> ExplorerResult<Value> {
        debug!(body = %body, "Sending request");
        let response = self
            .client
            .post(self.url(endpoint))
            .json(body)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "HTTP request failed");
                ExplorerError::transport(format!("HTTP request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(endpoint, status));
        }

        let text = response.text().await.map_err(|e| {
            error!(error = %e, "Failed to read response body");
            ExplorerError::transport(format!("Failed to read response: {}", e))
        })?;
        debug!(response = %text, "Response body");
        parse_body(endpoint, &text)
    }
}
