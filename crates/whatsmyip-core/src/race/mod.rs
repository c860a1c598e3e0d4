//! Race coordinator
//!
//! The RaceCoordinator is responsible for:
//! - Shuffling a private copy of the endpoint list for every query
//! - Spawning one worker per endpoint under a shared cancellation scope
//! - Draining worker reports in completion order
//! - Returning the first address and cancelling everything still running
//!
//! ## Architecture
//!
//! ```text
//!                      ┌──────────────────┐
//!                      │ RaceCoordinator  │
//!                      └──────────────────┘
//!                               │ shuffle + spawn
//!         ┌─────────────────────┼─────────────────────┐
//!         ▼                     ▼                     ▼
//!   ┌──────────┐          ┌──────────┐          ┌──────────┐
//!   │ Worker 0 │          │ Worker 1 │   ...    │ Worker n │
//!   └──────────┘          └──────────┘          └──────────┘
//!         │ fetch + parse       │                     │
//!         └─────────────────────┼─────────────────────┘
//!                               ▼
//!                      ┌──────────────────┐
//!                      │ JoinSet (fan-in) │──▶ first Ok wins, rest cancelled
//!                      └──────────────────┘
//! ```
//!
//! ## Cancellation
//!
//! Every worker holds a child of one per-query [`CancellationToken`]. The
//! token is cancelled on the first success and whenever the query future is
//! dropped. A winning query shuts the `JoinSet` down and waits for every
//! loser to stop before returning; a dropped query aborts whatever is left
//! when the set goes out of scope.

mod worker;

use crate::config::RaceConfig;
use crate::error::{QueryError, Result};
use crate::traits::{Fetcher, NoopObserver, RaceEvent, RaceObserver};
use rand::seq::SliceRandom;
use std::fmt;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};
use worker::{Report, Worker};

/// A successful query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryOutcome {
    /// The public address, in canonical form
    pub ip: IpAddr,
    /// The endpoint that produced it
    pub endpoint: String,
    /// How many reports arrived before the winner
    pub position: usize,
    /// Time from the start of the query to the winning report
    pub elapsed: Duration,
}

impl fmt::Display for QueryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (from {})", self.ip, self.endpoint)
    }
}

/// Races public echo services for the host's address
///
/// The coordinator is immutable once built and can be shared freely;
/// concurrent queries each work on their own shuffled copy of the
/// endpoint list.
#[derive(Clone)]
pub struct RaceCoordinator {
    /// Endpoints in configured order
    endpoints: Arc<[String]>,

    /// Upper bound for each endpoint request
    request_timeout: Duration,

    /// Transport shared by all workers
    fetcher: Arc<dyn Fetcher>,

    /// Receiver of one event per query
    observer: Arc<dyn RaceObserver>,
}

impl RaceCoordinator {
    /// Create a new coordinator
    ///
    /// # Parameters
    ///
    /// - `fetcher`: Transport used by every worker
    /// - `config`: Endpoints and timeout; validated here
    pub fn new(fetcher: Arc<dyn Fetcher>, config: RaceConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            request_timeout: config.request_timeout(),
            endpoints: config.endpoints.into(),
            fetcher,
            observer: Arc::new(NoopObserver),
        })
    }

    /// Replace the default no-op observer
    pub fn with_observer(mut self, observer: Arc<dyn RaceObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Endpoints in configured order
    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }

    /// Upper bound for each endpoint request
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Find the public address
    ///
    /// Every endpoint is queried concurrently and the first one to yield a
    /// valid address wins. Individual failures are only logged.
    ///
    /// # Returns
    ///
    /// - `Ok(QueryOutcome)`: The first address found and who reported it
    /// - `Err(QueryError::AllEndpointsFailed)`: No endpoint produced an address
    pub async fn query(&self) -> std::result::Result<QueryOutcome, QueryError> {
        let start = Instant::now();
        let order = self.shuffled_endpoints();
        let attempted = order.len();

        let scope = CancellationToken::new();
        let _cancel_on_exit = scope.clone().drop_guard();

        let mut workers = JoinSet::new();
        for endpoint in order {
            let worker = Worker::new(
                endpoint,
                Arc::clone(&self.fetcher),
                scope.child_token(),
                self.request_timeout,
            );
            workers.spawn(worker.run());
        }

        let mut position = 0;
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(Report {
                    endpoint,
                    result: Ok(ip),
                }) => {
                    let elapsed = start.elapsed();

                    // Losers must be gone before the caller sees the result.
                    scope.cancel();
                    workers.shutdown().await;

                    self.observer.observe(&RaceEvent::Succeeded {
                        ip,
                        endpoint: endpoint.clone(),
                        position,
                        elapsed,
                    });

                    return Ok(QueryOutcome {
                        ip,
                        endpoint,
                        position,
                        elapsed,
                    });
                }
                Ok(Report {
                    endpoint,
                    result: Err(e),
                }) => {
                    if e.is_cancelled() {
                        trace!(url = %endpoint, "Worker cancelled");
                    } else {
                        debug!(url = %endpoint, transport = self.fetcher.name(), "No address: {}", e);
                    }
                }
                Err(e) => {
                    warn!("Race worker did not complete: {}", e);
                }
            }
            position += 1;
        }

        self.observer.observe(&RaceEvent::AllFailed {
            attempted,
            elapsed: start.elapsed(),
        });
        Err(QueryError::AllEndpointsFailed { attempted })
    }

    /// A uniformly shuffled private copy of the endpoint list
    fn shuffled_endpoints(&self) -> Vec<String> {
        let mut order = self.endpoints.to_vec();
        order.shuffle(&mut rand::thread_rng());
        order
    }
}

impl fmt::Debug for RaceCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RaceCoordinator")
            .field("endpoints", &self.endpoints)
            .field("request_timeout", &self.request_timeout)
            .field("fetcher", &self.fetcher.name())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use async_trait::async_trait;
    use std::collections::HashMap;

    /// Answers from a fixed table; unknown endpoints fail
    struct TableFetcher(HashMap<&'static str, &'static str>);

    #[async_trait]
    impl Fetcher for TableFetcher {
        async fn fetch(&self, endpoint: &str) -> std::result::Result<String, FetchError> {
            self.0
                .get(endpoint)
                .map(|body| body.to_string())
                .ok_or_else(|| FetchError::request("connection refused"))
        }

        fn name(&self) -> &'static str {
            "table"
        }
    }

    fn coordinator(table: &[(&'static str, &'static str)], endpoints: &[&str]) -> RaceCoordinator {
        let fetcher = Arc::new(TableFetcher(table.iter().copied().collect()));
        let config = RaceConfig::with_endpoints(endpoints.iter().copied())
            .with_request_timeout(Duration::from_millis(200));
        RaceCoordinator::new(fetcher, config).expect("valid config")
    }

    #[test]
    fn rejects_invalid_config() {
        let fetcher = Arc::new(TableFetcher(HashMap::new()));
        let result = RaceCoordinator::new(fetcher, RaceConfig::with_endpoints(Vec::<String>::new()));
        assert!(matches!(result, Err(crate::Error::Config(_))));
    }

    #[test]
    fn shuffle_is_a_permutation_of_a_private_copy() {
        let endpoints = ["http://a.test", "http://b.test", "http://c.test", "http://d.test"];
        let race = coordinator(&[], &endpoints);

        for _ in 0..20 {
            let mut order = race.shuffled_endpoints();
            order.sort();
            assert_eq!(order, endpoints);
        }
        assert_eq!(race.endpoints(), endpoints);
    }

    #[tokio::test]
    async fn returns_address_with_its_endpoint() {
        let race = coordinator(
            &[("http://b.test", "fl=1\nip=203.0.113.5\n")],
            &["http://a.test", "http://b.test", "http://c.test"],
        );

        let outcome = race.query().await.expect("one endpoint answers");
        assert_eq!(outcome.ip.to_string(), "203.0.113.5");
        assert_eq!(outcome.endpoint, "http://b.test");
        assert_eq!(outcome.to_string(), "203.0.113.5 (from http://b.test)");
    }

    #[tokio::test]
    async fn single_unreachable_endpoint_fails() {
        let race = coordinator(&[], &["http://unreachable.test"]);

        let err = race.query().await.unwrap_err();
        assert_eq!(err, QueryError::AllEndpointsFailed { attempted: 1 });
    }

    #[tokio::test]
    async fn unparseable_bodies_count_as_failures() {
        let race = coordinator(
            &[("http://a.test", "<html>blocked</html>"), ("http://b.test", "")],
            &["http://a.test", "http://b.test"],
        );

        let err = race.query().await.unwrap_err();
        assert_eq!(err, QueryError::AllEndpointsFailed { attempted: 2 });
    }
}
