//! HTTP fetcher for direct asset URLs.
//!
//! [`Fetcher`] is the seam the worker pool talks to; [`HttpClient`] is the
//! reqwest-backed implementation. Non-200 statuses are returned as data so the
//! worker can tell throttling (429) apart from ordinary failures.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument};
use url::Url;

use super::constants::CONNECT_TIMEOUT_SECS;
use super::error::DownloadError;
use crate::user_agent::BROWSER_USER_AGENT;

/// Status and body of one GET.
///
/// The body is only read for 200 responses; it is empty otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl FetchResponse {
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// Issues single-shot GET requests for asset URLs.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetches `url`, failing with [`DownloadError::Timeout`] after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error for transport failures and unparseable URLs. HTTP error
    /// statuses are not errors here.
    async fn get(&self, url: &str, timeout: Duration) -> Result<FetchResponse, DownloadError>;
}

/// reqwest client presenting a desktop-browser identity.
///
/// Created once per run and shared by every worker for connection pooling.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient {
    /// Creates a client with the default connect timeout and gzip enabled.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the static
    /// configuration. This should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new() -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .gzip(true)
            .user_agent(BROWSER_USER_AGENT)
            .build()
            .expect("failed to build HTTP client with static configuration");
        Self { client }
    }
}

#[async_trait]
impl Fetcher for HttpClient {
    #[instrument(level = "debug", skip(self), fields(timeout_secs = timeout.as_secs()))]
    async fn get(&self, url: &str, timeout: Duration) -> Result<FetchResponse, DownloadError> {
        let parsed = Url::parse(url).map_err(|_| DownloadError::invalid_url(url))?;

        let response = self
            .client
            .get(parsed)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| map_transport_error(url, e))?;

        let status = response.status().as_u16();
        if status != 200 {
            debug!(status, "non-success response");
            return Ok(FetchResponse {
                status,
                body: Vec::new(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| map_transport_error(url, e))?;
        debug!(bytes = body.len(), "fetched asset");
        Ok(FetchResponse {
            status,
            body: body.to_vec(),
        })
    }
}

fn map_transport_error(url: &str, error: reqwest::Error) -> DownloadError {
    if error.is_timeout() {
        DownloadError::timeout(url)
    } else {
        DownloadError::network(url, error)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_response_is_ok_only_for_200() {
        let ok = FetchResponse {
            status: 200,
            body: vec![1],
        };
        let created = FetchResponse {
            status: 201,
            body: Vec::new(),
        };
        assert!(ok.is_ok());
        assert!(!created.is_ok());
    }

    #[tokio::test]
    async fn test_get_rejects_unparseable_url() {
        let client = HttpClient::new();
        let err = client
            .get("not a url", Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, DownloadError::InvalidUrl { .. }));
    }
}
