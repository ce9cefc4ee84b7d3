//! Concurrent scraping engine.
//!
//! Terms fan out into subject workers, subject workers fan out into
//! class-detail aggregators. Every subject worker opens its own session
//! because the SIS carries search state per session; a global semaphore caps
//! how many sessions are open at once.

pub mod class;
pub mod run;
pub mod snapshot;
pub mod subject;
pub mod term;

use std::time::Duration;

/// Connection settings shared by every session opened during a run.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Base URL of the SIS self-service API.
    pub base_url: String,
    /// Maximum concurrent connections per session.
    pub limit_per_host: usize,
    /// Total per-request timeout.
    pub timeout: Duration,
}
