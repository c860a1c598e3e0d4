//! A single racer: one endpoint, one attempt

use crate::error::FetchError;
use crate::parser;
use crate::traits::Fetcher;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// What a worker hands back to the coordinator
#[derive(Debug)]
pub(crate) struct Report {
    /// The endpoint this worker raced
    pub(crate) endpoint: String,
    /// The parsed address, or why there is none
    pub(crate) result: Result<IpAddr, FetchError>,
}

/// One fetch-and-parse attempt bound to the query's cancellation scope
pub(crate) struct Worker {
    endpoint: String,
    fetcher: Arc<dyn Fetcher>,
    scope: CancellationToken,
    timeout: Duration,
}

impl Worker {
    pub(crate) fn new(
        endpoint: String,
        fetcher: Arc<dyn Fetcher>,
        scope: CancellationToken,
        timeout: Duration,
    ) -> Self {
        Self {
            endpoint,
            fetcher,
            scope,
            timeout,
        }
    }

    /// Run the attempt to completion and package the result
    pub(crate) async fn run(self) -> Report {
        let result = self.attempt().await;
        Report {
            endpoint: self.endpoint,
            result,
        }
    }

    async fn attempt(&self) -> Result<IpAddr, FetchError> {
        // Queued workers must not start a request for an already decided race
        if self.scope.is_cancelled() {
            return Err(FetchError::Cancelled);
        }

        let body = tokio::select! {
            biased;

            _ = self.scope.cancelled() => return Err(FetchError::Cancelled),

            fetched = tokio::time::timeout(self.timeout, self.fetcher.fetch(&self.endpoint)) => {
                fetched.map_err(|_| FetchError::Timeout(self.timeout))??
            }
        };

        Ok(parser::parse(&body)?)
    }
}
