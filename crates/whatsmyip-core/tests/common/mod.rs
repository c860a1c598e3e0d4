//! Test doubles and common utilities for race contract tests
//!
//! The scripted fetcher stands in for the network: each endpoint is told
//! how to behave, and atomic counters record what the race actually did.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use whatsmyip_core::traits::{Fetcher, RaceEvent, RaceObserver};
use whatsmyip_core::{FetchError, RaceConfig, RaceCoordinator};

/// How one scripted endpoint behaves
#[derive(Debug, Clone)]
pub enum Behavior {
    /// Answer immediately with this body
    Respond(&'static str),
    /// Answer with this body after a delay
    RespondAfter(&'static str, Duration),
    /// Fail immediately, like a closed port
    Refuse,
    /// Never answer, like a black-holed address
    Hang,
}

/// A Fetcher that follows a per-endpoint script
pub struct ScriptedFetcher {
    script: HashMap<String, Behavior>,
    /// What endpoints missing from the script do
    fallback: Behavior,
    /// Number of fetch() calls started
    started: Arc<AtomicUsize>,
    /// Number of fetch() calls that ran to the end of their script
    finished: Arc<AtomicUsize>,
    /// Endpoints in the order their fetch() started
    started_order: Arc<Mutex<Vec<String>>>,
}

impl ScriptedFetcher {
    pub fn new<I, S>(script: I) -> Self
    where
        I: IntoIterator<Item = (S, Behavior)>,
        S: Into<String>,
    {
        Self {
            script: script
                .into_iter()
                .map(|(endpoint, behavior)| (endpoint.into(), behavior))
                .collect(),
            fallback: Behavior::Refuse,
            started: Arc::new(AtomicUsize::new(0)),
            finished: Arc::new(AtomicUsize::new(0)),
            started_order: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A fetcher where every endpoint refuses the connection
    pub fn refusing() -> Self {
        Self::new(std::iter::empty::<(String, Behavior)>())
    }

    /// Make endpoints missing from the script behave like `fallback`
    pub fn with_fallback(mut self, fallback: Behavior) -> Self {
        self.fallback = fallback;
        self
    }

    /// Get the number of fetch() calls started so far
    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    /// Get the number of fetch() calls that completed their script
    pub fn finished(&self) -> usize {
        self.finished.load(Ordering::SeqCst)
    }

    /// Get the endpoints in the order their fetch() started
    pub fn started_order(&self) -> Vec<String> {
        self.started_order.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, endpoint: &str) -> Result<String, FetchError> {
        self.started.fetch_add(1, Ordering::SeqCst);
        self.started_order
            .lock()
            .unwrap()
            .push(endpoint.to_string());

        let behavior = self
            .script
            .get(endpoint)
            .cloned()
            .unwrap_or_else(|| self.fallback.clone());

        let result = match behavior {
            Behavior::Respond(body) => Ok(body.to_string()),
            Behavior::RespondAfter(body, delay) => {
                tokio::time::sleep(delay).await;
                Ok(body.to_string())
            }
            Behavior::Refuse => Err(FetchError::request("connection refused")),
            Behavior::Hang => std::future::pending().await,
        };

        self.finished.fetch_add(1, Ordering::SeqCst);
        result
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// An observer that keeps every event it sees
#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<RaceEvent>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<RaceEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl RaceObserver for RecordingObserver {
    fn observe(&self, event: &RaceEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

/// Helper to build a coordinator over a scripted fetcher
pub fn race(fetcher: &Arc<ScriptedFetcher>, endpoints: &[&str], timeout: Duration) -> RaceCoordinator {
    let config = RaceConfig::with_endpoints(endpoints.iter().copied()).with_request_timeout(timeout);
    RaceCoordinator::new(fetcher.clone(), config).expect("coordinator construction succeeds")
}

/// Endpoint names used across the contract tests
pub const ENDPOINTS: [&str; 5] = [
    "http://one.test/",
    "http://two.test/",
    "http://three.test/",
    "http://four.test/",
    "http://five.test/",
];
