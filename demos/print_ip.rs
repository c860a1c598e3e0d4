//! One-shot lookup of the public IP
//!
//! Races the default echo services once and prints the winner.
//! Pass endpoint URLs as arguments to race those instead:
//!
//! ```bash
//! cargo run --bin print_ip
//! cargo run --bin print_ip -- https://icanhazip.com https://ident.me
//! ```
//!
//! Set `DEMO_DEBUG=1` to log the race outcome.

use std::sync::Arc;

use anyhow::Result;
use whatsmyip_core::{RaceConfig, TracingObserver};

#[tokio::main]
async fn main() -> Result<()> {
    if std::env::var_os("DEMO_DEBUG").is_some() {
        tracing_subscriber::fmt()
            .with_max_level(tracing_subscriber::filter::LevelFilter::DEBUG)
            .init();
    }

    let endpoints: Vec<String> = std::env::args().skip(1).collect();
    let config = if endpoints.is_empty() {
        RaceConfig::default()
    } else {
        RaceConfig::with_endpoints(endpoints)
    };

    let race = whatsmyip_http::coordinator(config)?.with_observer(Arc::new(TracingObserver));
    let outcome = race.query().await?;

    println!("{}", outcome.ip);
    println!("source:  {}", outcome.endpoint);
    println!("elapsed: {:?}", outcome.elapsed);

    Ok(())
}
