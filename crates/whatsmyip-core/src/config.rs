//! Configuration types for whatsmyip
//!
//! A [`RaceConfig`] is owned by each coordinator. Queries never modify it.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

/// Public echo services queried when no endpoint list is configured
///
/// Each one answers a plain GET with either a bare address or lines of
/// `key=value` pairs containing `ip=<address>`.
pub const DEFAULT_ENDPOINTS: &[&str] = &[
    "https://cloudflare.com/cdn-cgi/trace",
    "https://checkip.amazonaws.com",
    "https://api.ipify.org",
    "https://icanhazip.com",
    "https://myexternalip.com/raw",
    "https://ipinfo.io/ip",
    "https://ipecho.net/plain",
    "https://ifconfig.me/ip",
    "https://ident.me",
    "https://whatismyip.akamai.com",
    "https://wgetip.com",
    "https://ip.tyk.nu",
];

/// Default upper bound for a single endpoint request
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

/// Race configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaceConfig {
    /// Endpoints to race against each other
    #[serde(default = "default_endpoints")]
    pub endpoints: Vec<String>,

    /// Per-request timeout (in milliseconds)
    ///
    /// This bounds the whole query: workers run concurrently, so a query
    /// that finds no address returns after roughly this long at most.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl RaceConfig {
    /// Create a configuration with the default endpoints and timeout
    pub fn new() -> Self {
        Self {
            endpoints: default_endpoints(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }

    /// Create a configuration racing the given endpoints
    pub fn with_endpoints<I, S>(endpoints: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            endpoints: endpoints.into_iter().map(Into::into).collect(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }

    /// Set the per-request timeout
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Per-request timeout as a [`Duration`]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Parse a configuration from JSON
    ///
    /// Missing fields take their defaults. The result is validated.
    pub fn from_json(json: &str) -> Result<Self, crate::Error> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, crate::Error> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.endpoints.is_empty() {
            return Err(crate::Error::config("No endpoints configured"));
        }

        let mut seen = HashSet::new();
        for endpoint in &self.endpoints {
            if endpoint.trim().is_empty() {
                return Err(crate::Error::config("Endpoint URL cannot be empty"));
            }
            if !endpoint.starts_with("https://") && !endpoint.starts_with("http://") {
                return Err(crate::Error::config(format!(
                    "Endpoint must use HTTP or HTTPS scheme: {}",
                    endpoint
                )));
            }
            if !seen.insert(endpoint.as_str()) {
                return Err(crate::Error::config(format!(
                    "Endpoint listed twice: {}",
                    endpoint
                )));
            }
        }

        if self.request_timeout_ms == 0 {
            return Err(crate::Error::config("Request timeout must be > 0"));
        }

        Ok(())
    }
}

impl Default for RaceConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn default_endpoints() -> Vec<String> {
    DEFAULT_ENDPOINTS.iter().map(|s| s.to_string()).collect()
}

fn default_request_timeout_ms() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_MS
}
