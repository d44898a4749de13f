//! Metrics definitions for history reconstruction.
//!
//! This module defines all metrics used throughout the service.
//! Metrics are collected using the `metrics` crate and can be exported
//! to Prometheus via `metrics-exporter-prometheus`.

use metrics::{counter, describe_counter, describe_histogram, histogram};
use std::time::Instant;

/// Initialize all metric descriptions.
/// Call this once at startup before any metrics are recorded.
pub fn init_metrics() {
    describe_counter!(
        "history_requests_total",
        "Total number of history requests, by result source"
    );
    describe_counter!(
        "history_fallbacks_total",
        "Total number of history requests served from the synthetic dataset"
    );
    describe_counter!(
        "transactions_decoded_total",
        "Total number of transactions decoded into history records"
    );
    describe_counter!(
        "transactions_skipped_total",
        "Total number of listed signatures left out of history, by reason"
    );
    describe_histogram!(
        "history_fetch_duration_seconds",
        "Time taken to reconstruct a history page in seconds"
    );
    describe_counter!(
        "ledger_rpc_errors_total",
        "Total number of failed ledger RPC calls, by method"
    );
}

/// Record a served history request.
///
/// # Arguments
/// * `source` - Where the result came from ("live" or "fallback")
pub fn record_history_request(source: &str) {
    counter!("history_requests_total", "source" => source.to_string()).increment(1);
}

/// Record a request answered with synthetic data.
pub fn record_fallback() {
    counter!("history_fallbacks_total").increment(1);
}

/// Record decoded transactions.
pub fn record_transactions_decoded(count: u64) {
    counter!("transactions_decoded_total").increment(count);
}

/// Record a skipped signature.
///
/// # Arguments
/// * `reason` - Short skip reason tag (e.g. "fetch_failed", "no_balance_change")
pub fn record_transaction_skipped(reason: &str) {
    counter!("transactions_skipped_total", "reason" => reason.to_string()).increment(1);
}

/// Record history reconstruction duration.
pub fn record_fetch_duration(duration_secs: f64) {
    histogram!("history_fetch_duration_seconds").record(duration_secs);
}

/// Record a failed ledger RPC call.
///
/// # Arguments
/// * `method` - RPC method name
pub fn record_rpc_error(method: &str) {
    counter!("ledger_rpc_errors_total", "method" => method.to_string()).increment(1);
}

/// A timer that automatically records duration when dropped.
pub struct FetchTimer {
    start: Instant,
}

impl FetchTimer {
    /// Start a new fetch timer.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for FetchTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for FetchTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        record_fetch_duration(duration);
    }
}
