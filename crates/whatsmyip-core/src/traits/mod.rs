//! Core traits for whatsmyip
//!
//! This module defines the seams between the race and the outside world.
//!
//! - [`Fetcher`]: Perform one GET against one endpoint
//! - [`RaceObserver`]: Receive race outcome events

pub mod fetcher;
pub mod observer;

pub use fetcher::Fetcher;
pub use observer::{NoopObserver, RaceEvent, RaceObserver, TracingObserver};
