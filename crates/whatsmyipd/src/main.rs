// # whatsmyipd - public IP daemon
//
// Thin integration layer around `whatsmyip-core`:
// 1. Reading configuration from environment variables
// 2. Initializing logging and the runtime
// 3. Refreshing the public IP periodically into an in-memory cache
// 4. Serving the cached IP at `GET /ip`
//
// All racing and parsing logic lives in `whatsmyip-core`.
//
// ## Configuration
//
// ### Logging
// - `APP_ENV`: local|dev|development → debug; test|staging → info;
//   prod|production → off; unset → info; anything else → off
// - `WHATSMYIP_LOG_LEVEL`: trace|debug|info|warn|error|off, overrides `APP_ENV`
//
// ### Server
// - `WHATSMYIP_LISTEN_ADDR`: Address to serve on (default 127.0.0.1:8080)
// - `WHATSMYIP_REFRESH_SECS`: Seconds between refreshes (default 86400)
//
// ### Race
// - `WHATSMYIP_CONFIG_FILE`: JSON race configuration
// - `WHATSMYIP_ENDPOINTS`: Comma-separated endpoint URLs (overrides the file)
// - `WHATSMYIP_TIMEOUT_SECS`: Per-request timeout (overrides the file)
//
// ## Example
//
// ```bash
// export APP_ENV=dev
// export WHATSMYIP_LISTEN_ADDR=0.0.0.0:8080
// export WHATSMYIP_REFRESH_SECS=3600
//
// whatsmyipd
// curl http://localhost:8080/ip
// ```

mod cache;
mod refresh;
mod server;

use anyhow::{Context, Result};
use std::env;
use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::level_filters::LevelFilter;
use tracing::{error, info, warn};
use tracing_subscriber::FmtSubscriber;
use whatsmyip_core::{RaceConfig, TracingObserver};

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

use cache::IpCache;

/// Default address for the HTTP server
const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8080";

/// Default refresh interval: once a day
const DEFAULT_REFRESH_SECS: u64 = 24 * 60 * 60;

/// How long shutdown may take before tasks are abandoned
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum DaemonExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<DaemonExitCode> for ExitCode {
    fn from(code: DaemonExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
#[derive(Debug)]
struct Config {
    log_level: LevelFilter,
    listen_addr: SocketAddr,
    refresh_interval: Duration,
    race: RaceConfig,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let log_level = match lookup("WHATSMYIP_LOG_LEVEL") {
            Some(level) => parse_log_level(&level)?,
            None => level_for_app_env(lookup("APP_ENV").as_deref()),
        };

        let listen_addr = lookup("WHATSMYIP_LISTEN_ADDR")
            .unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string());
        let listen_addr: SocketAddr = listen_addr
            .parse()
            .with_context(|| format!("WHATSMYIP_LISTEN_ADDR is not a socket address: {}", listen_addr))?;

        let refresh_secs = match lookup("WHATSMYIP_REFRESH_SECS") {
            Some(secs) => secs
                .parse()
                .with_context(|| format!("WHATSMYIP_REFRESH_SECS is not a number: {}", secs))?,
            None => DEFAULT_REFRESH_SECS,
        };

        let mut race = match lookup("WHATSMYIP_CONFIG_FILE") {
            Some(path) => RaceConfig::from_file(&path)
                .with_context(|| format!("Failed to load WHATSMYIP_CONFIG_FILE {}", path))?,
            None => RaceConfig::default(),
        };

        if let Some(endpoints) = lookup("WHATSMYIP_ENDPOINTS") {
            race.endpoints = endpoints
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        if let Some(secs) = lookup("WHATSMYIP_TIMEOUT_SECS") {
            let secs: u64 = secs
                .parse()
                .with_context(|| format!("WHATSMYIP_TIMEOUT_SECS is not a number: {}", secs))?;
            if !(1..=120).contains(&secs) {
                anyhow::bail!("WHATSMYIP_TIMEOUT_SECS must be between 1 and 120 seconds. Got: {}", secs);
            }
            race = race.with_request_timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            log_level,
            listen_addr,
            refresh_interval: Duration::from_secs(refresh_secs),
            race,
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        let refresh_secs = self.refresh_interval.as_secs();
        if !(60..=7 * DEFAULT_REFRESH_SECS).contains(&refresh_secs) {
            anyhow::bail!(
                "WHATSMYIP_REFRESH_SECS must be between 60 and {} seconds. Got: {}",
                7 * DEFAULT_REFRESH_SECS,
                refresh_secs
            );
        }

        self.race.validate().context("Invalid race configuration")?;

        for endpoint in &self.race.endpoints {
            if endpoint.starts_with("http://") {
                warn!(
                    "Endpoint {} uses HTTP (not HTTPS); its answer can be tampered with in transit",
                    endpoint
                );
            }
        }

        Ok(())
    }
}

/// Map `APP_ENV` to a log level
///
/// Production and unknown environments are silent.
fn level_for_app_env(app_env: Option<&str>) -> LevelFilter {
    let Some(app_env) = app_env else {
        return LevelFilter::INFO;
    };

    match app_env.to_lowercase().as_str() {
        "local" | "dev" | "development" => LevelFilter::DEBUG,
        "test" | "staging" => LevelFilter::INFO,
        _ => LevelFilter::OFF,
    }
}

fn parse_log_level(level: &str) -> Result<LevelFilter> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(LevelFilter::TRACE),
        "debug" => Ok(LevelFilter::DEBUG),
        "info" => Ok(LevelFilter::INFO),
        "warn" => Ok(LevelFilter::WARN),
        "error" => Ok(LevelFilter::ERROR),
        "off" => Ok(LevelFilter::OFF),
        _ => anyhow::bail!(
            "WHATSMYIP_LOG_LEVEL '{}' is not valid. \
            Valid levels: trace, debug, info, warn, error, off",
            level
        ),
    }
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return DaemonExitCode::ConfigError.into();
        }
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DaemonExitCode::ConfigError.into();
    }

    // Validate configuration
    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {:#}", e);
        return DaemonExitCode::ConfigError.into();
    }

    info!("Starting whatsmyipd");
    info!("Racing {} endpoint(s)", config.race.endpoints.len());

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DaemonExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        if let Err(e) = run_daemon(config).await {
            error!("Daemon error: {:#}", e);
            DaemonExitCode::RuntimeError
        } else {
            DaemonExitCode::CleanShutdown
        }
    });

    result.into()
}

/// Run the daemon
async fn run_daemon(config: Config) -> Result<()> {
    let race = whatsmyip_http::coordinator(config.race)?.with_observer(Arc::new(TracingObserver));
    let cache = IpCache::new();
    let shutdown = CancellationToken::new();

    let listener = TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.listen_addr))?;
    info!("Serving current IP on http://{}/ip", listener.local_addr()?);

    let refresher = tokio::spawn(refresh::run(
        race,
        cache.clone(),
        config.refresh_interval,
        shutdown.clone(),
    ));
    let mut server = tokio::spawn(server::serve(listener, cache, shutdown.clone()));

    tokio::select! {
        signal = wait_for_signal() => {
            info!("Received shutdown signal: {}", signal?);
        }
        served = &mut server => {
            shutdown.cancel();
            served.context("Server task panicked")??;
            anyhow::bail!("Server stopped unexpectedly");
        }
    }

    info!("Shutting down");
    shutdown.cancel();

    let drained = tokio::time::timeout(SHUTDOWN_GRACE, async {
        let refreshed = refresher.await;
        let served = server.await;
        (refreshed, served)
    })
    .await;

    match drained {
        Ok((refreshed, served)) => {
            refreshed.context("Refresh task panicked")?;
            served.context("Server task panicked")??;
            info!("Shutdown complete");
            Ok(())
        }
        Err(_) => Err(anyhow::anyhow!("Shutdown timeout after {:?}", SHUTDOWN_GRACE)),
    }
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
///
/// # Returns
///
/// Returns the name of the signal received.
#[cfg(unix)]
async fn wait_for_signal() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

/// Wait for shutdown signals (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_signal() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}
