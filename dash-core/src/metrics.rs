//! # metrics
//!
//! process-wide statistics. Crates that do the actual work (registry, actions)
//! own their counters rather than centralizing them here.
use std::time::Instant;

use lazy_static::lazy_static;
use prometheus::{IntGauge, register_int_gauge};

lazy_static! {
    /// When the server started
    pub static ref START_TIME: Instant = Instant::now();

    /// server uptime
    pub static ref UPTIME: IntGauge = register_int_gauge!("uptime", "server uptime (seconds)").unwrap();

    /// # of requests currently being handled by the dashboard
    pub static ref IN_FLIGHT: IntGauge =
        register_int_gauge!("in_flight", "count of currently processing http requests").unwrap();
}

/// refresh `UPTIME` from `START_TIME`
pub fn update_uptime() {
    UPTIME.set(START_TIME.elapsed().as_secs() as i64);
}
