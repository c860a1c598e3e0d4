// # HTTP Fetcher
//
// This crate provides the reqwest-based transport for whatsmyip, plus
// entry points that race the default public echo services.
//
// ## Usage
//
// ```rust,ignore
// let outcome = whatsmyip_http::get().await?;
// println!("{} (from {})", outcome.ip, outcome.endpoint);
// ```
//
// ## Architecture
//
// `HttpFetcher` performs one GET per call and returns the body of any 2xx
// response. Parsing, racing and cancellation belong to `whatsmyip-core`;
// dropping a fetch future aborts its request.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::trace;
use whatsmyip_core::{Error, FetchError, Fetcher, QueryOutcome, RaceConfig, RaceCoordinator, Result};

/// User agent sent to echo services
const USER_AGENT: &str = concat!("whatsmyip/", env!("CARGO_PKG_VERSION"));

/// HTTP transport for race workers
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    /// HTTP client (connection pool shared by all workers)
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Create a fetcher whose requests give up after `timeout`
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// Create a fetcher around an existing client
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, endpoint: &str) -> std::result::Result<String, FetchError> {
        let response = self
            .client
            .get(endpoint)
            .send()
            .await
            .map_err(|e| FetchError::request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::body(e.to_string()))?;

        trace!(url = endpoint, bytes = body.len(), "Response received");
        Ok(body)
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

/// Build a coordinator over HTTP for the given configuration
///
/// The client timeout matches the configured per-request timeout.
pub fn coordinator(config: RaceConfig) -> Result<RaceCoordinator> {
    let fetcher = HttpFetcher::new(config.request_timeout())?;
    RaceCoordinator::new(Arc::new(fetcher), config)
}

/// Build a coordinator over HTTP racing the default endpoints
pub fn default_coordinator() -> Result<RaceCoordinator> {
    coordinator(RaceConfig::default())
}

/// Find the public address using the default endpoints
///
/// Builds a fresh coordinator per call; keep a [`RaceCoordinator`] around
/// instead when querying repeatedly.
pub async fn get() -> Result<QueryOutcome> {
    let outcome = default_coordinator()?.query().await?;
    Ok(outcome)
}
