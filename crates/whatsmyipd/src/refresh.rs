//! Periodic refresh of the cached IP
//!
//! The first refresh runs immediately; later ones follow the configured
//! interval. A failed refresh keeps the previous value.

use crate::cache::{CachedIp, IpCache};
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use whatsmyip_core::RaceCoordinator;

/// Run one query and store its result
///
/// # Returns
///
/// The new cache entry, or `None` if every endpoint failed
pub async fn refresh_once(race: &RaceCoordinator, cache: &IpCache) -> Option<CachedIp> {
    match race.query().await {
        Ok(outcome) => {
            let entry = cache.store(outcome.ip, outcome.endpoint).await;
            info!(
                "IP updated: {} at {} (from {})",
                entry.ip,
                entry.fetched_at.to_rfc3339(),
                entry.endpoint
            );
            Some(entry)
        }
        Err(e) => {
            warn!("Error fetching IP: {}", e);
            None
        }
    }
}

/// Refresh the cache every `every` until `shutdown` is cancelled
pub async fn run(
    race: RaceCoordinator,
    cache: IpCache,
    every: Duration,
    shutdown: CancellationToken,
) {
    info!("Starting IP refresh loop (interval={:?})", every);

    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => {}
        }

        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = refresh_once(&race, &cache) => {}
        }
    }

    info!("IP refresh loop stopped");
}
