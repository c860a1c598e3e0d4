// # IP Cache
//
// In-memory holder for the most recent query result.
//
// Nothing is persisted: after a restart the cache is empty until the first
// refresh completes, and `/ip` answers 503 until then.

use chrono::{DateTime, Utc};
use std::net::IpAddr;
use std::sync::Arc;
use tokio::sync::RwLock;

/// The last address found and where it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedIp {
    /// The public address, in canonical form
    pub ip: IpAddr,
    /// The endpoint that reported it
    pub endpoint: String,
    /// When the refresh that found it completed
    pub fetched_at: DateTime<Utc>,
}

/// Shared, cloneable cache of the current public IP
#[derive(Debug, Clone, Default)]
pub struct IpCache {
    inner: Arc<RwLock<Option<CachedIp>>>,
}

impl IpCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the cached entry, if a refresh has succeeded yet
    pub async fn get(&self) -> Option<CachedIp> {
        self.inner.read().await.clone()
    }

    /// Replace the cached entry, stamping it with the current time
    pub async fn store(&self, ip: IpAddr, endpoint: impl Into<String>) -> CachedIp {
        let entry = CachedIp {
            ip,
            endpoint: endpoint.into(),
            fetched_at: Utc::now(),
        };
        *self.inner.write().await = Some(entry.clone());
        entry
    }
}
