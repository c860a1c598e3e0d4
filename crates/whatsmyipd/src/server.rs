//! HTTP surface: `GET /ip`

use crate::cache::IpCache;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

/// Build the router serving the cached IP
pub fn build_router(cache: IpCache) -> Router {
    Router::new()
        .route("/ip", get(current_ip))
        .with_state(cache)
}

async fn current_ip(State(cache): State<IpCache>) -> (StatusCode, String) {
    match cache.get().await {
        Some(entry) => (StatusCode::OK, format!("Current IP: {}\n", entry.ip)),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            "IP not available yet\n".to_string(),
        ),
    }
}

/// Serve until `shutdown` is cancelled
pub async fn serve(
    listener: TcpListener,
    cache: IpCache,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    axum::serve(listener, build_router(cache))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;
    Ok(())
}
