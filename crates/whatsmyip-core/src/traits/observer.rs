//! Race outcome events
//!
//! The coordinator reports exactly one event per query. What happens to it
//! is up to the observer handed to [`crate::RaceCoordinator::with_observer`];
//! by default nothing does.

use std::net::IpAddr;
use std::time::Duration;
use tracing::{debug, error};

/// Events emitted once per query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RaceEvent {
    /// An endpoint produced an address
    Succeeded {
        /// The winning address
        ip: IpAddr,
        /// The endpoint that produced it
        endpoint: String,
        /// How many reports arrived before the winner
        position: usize,
        /// Time since the query started
        elapsed: Duration,
    },

    /// Every endpoint failed
    AllFailed {
        /// Number of endpoints raced
        attempted: usize,
        /// Time since the query started
        elapsed: Duration,
    },
}

/// Receiver of race events
///
/// Called on the querying task, so implementations should not block.
pub trait RaceObserver: Send + Sync {
    /// Handle one event
    fn observe(&self, event: &RaceEvent);
}

/// Observer that drops every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl RaceObserver for NoopObserver {
    fn observe(&self, _event: &RaceEvent) {}
}

/// Observer that forwards events to `tracing`
///
/// Successes are logged at DEBUG, total failure at ERROR.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl RaceObserver for TracingObserver {
    fn observe(&self, event: &RaceEvent) {
        match event {
            RaceEvent::Succeeded {
                ip,
                endpoint,
                position,
                elapsed,
            } => {
                debug!(
                    %ip,
                    url = %endpoint,
                    pos = position,
                    elapsed = ?elapsed,
                    "Fetch completed"
                );
            }
            RaceEvent::AllFailed { attempted, elapsed } => {
                error!(attempted, elapsed = ?elapsed, "All requests failed");
            }
        }
    }
}
