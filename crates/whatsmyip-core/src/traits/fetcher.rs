// # Fetcher Trait
//
// Defines how a race worker talks to one endpoint.
//
// ## Implementations
//
// - reqwest-based: `whatsmyip-http` crate
// - Scripted test doubles: `tests/common` in this crate
//
// ## Usage
//
// ```rust,ignore
// use whatsmyip_core::Fetcher;
//
// let body = fetcher.fetch("https://icanhazip.com").await?;
// let ip = whatsmyip_core::parse(&body)?;
// ```

use crate::error::FetchError;
use async_trait::async_trait;

/// Trait for endpoint transports
///
/// A fetcher performs a single GET and hands back the body text. It does
/// not parse, retry or time out on its own behalf: the coordinator wraps
/// every call in the per-request timeout and drops the future when the race
/// is decided, so implementations must release their resources on drop.
///
/// Implementations must be thread-safe; one instance is shared by all
/// workers of all concurrent queries.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch the body of `endpoint`
    ///
    /// # Returns
    ///
    /// - `Ok(String)`: The body of a successful response
    /// - `Err(FetchError)`: Transport failure, non-success status or unreadable body
    async fn fetch(&self, endpoint: &str) -> Result<String, FetchError>;

    /// Short name of the transport, used in logs
    fn name(&self) -> &'static str {
        "custom"
    }
}
