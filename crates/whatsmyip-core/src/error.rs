//! Error types for whatsmyip
//!
//! Per-endpoint failures ([`FetchError`]) never leave the coordinator; the only
//! error a query surfaces is [`QueryError::AllEndpointsFailed`].

use std::time::Duration;
use thiserror::Error;

/// Result type alias for whatsmyip operations
pub type Result<T> = std::result::Result<T, Error>;

/// Crate-level error type
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors (reading configuration files)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Query errors
    #[error(transparent)]
    Query(#[from] QueryError),

    /// HTTP client construction errors
    #[error("HTTP error: {0}")]
    Http(String),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }
}

/// A response body did not contain an address
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    /// No line of the body resolves to a valid IPv4/IPv6 literal
    #[error("no ip address found")]
    NoAddressFound,
}

/// Why a single endpoint produced no result
///
/// Internal to a race: these are logged at debug level and then dropped.
#[derive(Error, Debug)]
pub enum FetchError {
    /// The request could not be built or sent, or the transport failed
    #[error("request failed: {0}")]
    Request(String),

    /// The endpoint answered with a non-success status
    #[error("unexpected status {0}")]
    Status(u16),

    /// The response body could not be read
    #[error("failed to read body: {0}")]
    Body(String),

    /// The endpoint did not answer within the per-request timeout
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// The race was already decided
    #[error("cancelled")]
    Cancelled,

    /// The body was read but contained no address
    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl FetchError {
    /// Create a request error
    pub fn request(msg: impl Into<String>) -> Self {
        Self::Request(msg.into())
    }

    /// Create a body error
    pub fn body(msg: impl Into<String>) -> Self {
        Self::Body(msg.into())
    }

    /// Whether this failure came from cancellation rather than the endpoint
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Error returned by [`crate::RaceCoordinator::query`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// Every endpoint failed before any produced an address
    #[error("all requests failed ({attempted} endpoints tried)")]
    AllEndpointsFailed {
        /// Number of endpoints raced
        attempted: usize,
    },
}
