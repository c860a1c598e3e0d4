//! Race Contract Test: Shared Configuration
//!
//! Constraints verified:
//! - Concurrent queries on one coordinator do not interfere
//! - Queries never reorder the configured endpoint list
//! - Every query starts with the full endpoint set

mod common;

use common::*;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_queries_share_one_coordinator() {
    let fetcher = Arc::new(ScriptedFetcher::new([
        (ENDPOINTS[0], Behavior::RespondAfter("192.0.2.10", Duration::from_millis(5))),
        (ENDPOINTS[1], Behavior::Refuse),
        (ENDPOINTS[2], Behavior::RespondAfter("192.0.2.10", Duration::from_millis(5))),
        (ENDPOINTS[3], Behavior::Refuse),
        (ENDPOINTS[4], Behavior::Respond("nothing useful")),
    ]));
    let race = Arc::new(race(&fetcher, &ENDPOINTS, Duration::from_secs(2)));

    let mut handles = Vec::new();
    for _ in 0..32 {
        let race = Arc::clone(&race);
        handles.push(tokio::spawn(async move { race.query().await }));
    }

    for handle in handles {
        let outcome = handle
            .await
            .expect("query task completes")
            .expect("query succeeds");
        assert_eq!(outcome.ip.to_string(), "192.0.2.10");
        assert!(outcome.endpoint == ENDPOINTS[0] || outcome.endpoint == ENDPOINTS[2]);
    }

    assert_eq!(race.endpoints(), ENDPOINTS);
}

#[tokio::test]
async fn every_query_starts_with_all_endpoints() {
    let fetcher = Arc::new(ScriptedFetcher::refusing());
    let race = race(&fetcher, &ENDPOINTS, Duration::from_secs(1));

    for round in 1..=3 {
        assert!(race.query().await.is_err());
        assert_eq!(fetcher.started(), ENDPOINTS.len() * round, "no endpoint is blacklisted");
    }

    let mut seen = fetcher.started_order();
    seen.sort();
    seen.dedup();
    assert_eq!(seen.len(), ENDPOINTS.len());
}
