//! Metrics instrumentation for cname-wrr-dns.
//!
//! All metrics are prefixed with `cname_dns.`

use metrics::{counter, gauge, histogram};
use std::time::Instant;

/// Record a DNS query.
pub fn record_query(record_type: &str, result: QueryResult, duration: std::time::Duration) {
    let result_str = match result {
        QueryResult::Success => "success",
        QueryResult::NxDomain => "nxdomain",
        QueryResult::NoData => "nodata",
        QueryResult::Error => "error",
    };

    counter!("cname_dns.query.count", "type" => record_type.to_string(), "result" => result_str)
        .increment(1);
    histogram!("cname_dns.query.duration.seconds", "type" => record_type.to_string())
        .record(duration.as_secs_f64());
}

/// Query result type for metrics.
#[derive(Debug, Clone, Copy)]
pub enum QueryResult {
    /// Query returned records successfully.
    Success,
    /// Domain not found.
    NxDomain,
    /// Name exists but has nothing of the requested type.
    NoData,
    /// Query failed with an error.
    Error,
}

/// How an alias target was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMethod {
    /// Smooth weighted round-robin over the name's pool.
    Weighted,
    /// Weighted pool had nothing to offer; first record used.
    WeightedDefault,
    /// No weight entry; low-entropy shuffle.
    Shuffled,
}

impl SelectionMethod {
    /// Label used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            SelectionMethod::Weighted => "weighted",
            SelectionMethod::WeightedDefault => "weighted_default",
            SelectionMethod::Shuffled => "shuffled",
        }
    }
}

/// Record a target selection.
pub fn record_selection(method: SelectionMethod) {
    counter!("cname_dns.selection.count", "method" => method.as_str()).increment(1);
}

/// Record a pool being populated from an alias list.
pub fn record_pool_populated(candidates: usize) {
    counter!("cname_dns.pool.populate.count").increment(1);
    histogram!("cname_dns.pool.candidates").record(candidates as f64);
}

/// Record pools cleared by a reload.
pub fn record_pools_invalidated(count: usize) {
    counter!("cname_dns.pool.invalidated.count").increment(count as u64);
}

/// Record a weight file reload attempt.
pub fn record_weight_reload(success: bool) {
    let outcome = if success { "success" } else { "error" };
    counter!("cname_dns.weights.reload.count", "outcome" => outcome).increment(1);
}

/// Record selector state (call periodically or on change).
pub fn record_selector_counts(weights: usize, pools: usize) {
    gauge!("cname_dns.state.weights.count").set(weights as f64);
    gauge!("cname_dns.state.pools.count").set(pools as f64);
}

/// Record zone contents.
pub fn record_zone_counts(zone: &str, names: usize, records: usize) {
    gauge!("cname_dns.zone.names.count", "zone" => zone.to_string()).set(names as f64);
    gauge!("cname_dns.zone.records.count", "zone" => zone.to_string()).set(records as f64);
}

/// Record the SOA serial number.
pub fn record_serial(zone: &str, serial: u32) {
    gauge!("cname_dns.zone.serial", "zone" => zone.to_string()).set(serial as f64);
}

/// Helper for timing operations.
pub struct Timer {
    start: Instant,
}

impl Timer {
    /// Start a new timer.
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get elapsed duration since timer start.
    pub fn elapsed(&self) -> std::time::Duration {
        self.start.elapsed()
    }
}
