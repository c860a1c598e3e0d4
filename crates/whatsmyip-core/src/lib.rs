// # whatsmyip-core
//
// Core library for discovering the host's public IP address.
//
// ## Architecture Overview
//
// The answer comes from racing several public "echo" services against each
// other and keeping the first valid reply:
// - **parser**: Turns a plain-text response body into a canonical `IpAddr`
// - **Fetcher**: Trait for performing one GET against one endpoint
// - **RaceObserver**: Trait for receiving race outcome events (logging)
// - **RaceCoordinator**: Shuffles the endpoints, runs one worker per endpoint
//   and returns the first success while cancelling the rest
//
// ## Design Principles
//
// 1. **Transport-agnostic**: The HTTP client lives in `whatsmyip-http`
// 2. **No shared mutable state**: Every query shuffles a private copy of the endpoint list
// 3. **Bounded**: Every fetch carries a timeout, so a query always finishes
// 4. **Quiet by default**: Outcome events go to an injected observer, a no-op unless replaced

pub mod config;
pub mod error;
pub mod parser;
pub mod race;
pub mod traits;

// Re-export core types for convenience
pub use config::{DEFAULT_ENDPOINTS, RaceConfig};
pub use error::{Error, FetchError, ParseError, QueryError, Result};
pub use parser::parse;
pub use race::{QueryOutcome, RaceCoordinator};
pub use traits::{Fetcher, NoopObserver, RaceEvent, RaceObserver, TracingObserver};
