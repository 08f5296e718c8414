// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Metrics instrumentation for the search gateway.
//!
//! Uses the `metrics` crate for backend-agnostic metrics collection.
//! The embedding process is responsible for choosing the exporter (Prometheus, OTEL, etc.)
//!
//! # Metric Naming Convention
//! - `search_gateway_` prefix for all metrics
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Labels
//! - `endpoint`: search, index, create_index, hello
//! - `operation`: search, upsert, delete, core_status, create_core, unload_core, schema
//! - `action`: upload, merge, mergeOrUpload, delete
//! - `kind`: error envelope kind (unsupported_param, odata_parse_fail, ...)
//! - `outcome`: success, failure

use metrics::{counter, gauge, histogram};
use std::time::{Duration, Instant};

/// Record an inbound request and the status it was answered with
pub fn record_request(endpoint: &str, status: u16) {
    counter!(
        "search_gateway_requests_total",
        "endpoint" => endpoint.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record a request rejected with an error envelope
pub fn record_request_error(kind: &str) {
    counter!(
        "search_gateway_request_errors_total",
        "kind" => kind.to_string()
    )
    .increment(1);
}

/// Record backend call latency
pub fn record_backend_latency(operation: &str, duration: Duration) {
    histogram!(
        "search_gateway_backend_seconds",
        "operation" => operation.to_string()
    )
    .record(duration.as_secs_f64());
}

/// Record a failed backend call by failure class
pub fn record_backend_error(operation: &str, error_type: &str) {
    counter!(
        "search_gateway_backend_errors_total",
        "operation" => operation.to_string(),
        "error_type" => error_type.to_string()
    )
    .increment(1);
}

/// Record how many hits a search reported
pub fn record_search_results(total: u64) {
    histogram!("search_gateway_search_results").record(total as f64);
}

/// Record per-document indexing outcomes
pub fn record_indexed_documents(action: &str, outcome: &str, count: usize) {
    counter!(
        "search_gateway_indexed_documents_total",
        "action" => action.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(count as u64);
}

/// Record a retry scheduled after a failed attempt
pub fn record_retry(operation: &str) {
    counter!(
        "search_gateway_retries_total",
        "operation" => operation.to_string()
    )
    .increment(1);
}

/// Record a bootstrap attempt
pub fn record_bootstrap(outcome: &str) {
    counter!(
        "search_gateway_bootstrap_total",
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// Set the number of indexes being served
pub fn set_registered_indexes(count: usize) {
    gauge!("search_gateway_registered_indexes").set(count as f64);
}

/// Set backend request permits currently in use
pub fn set_backend_in_flight(count: usize) {
    gauge!("search_gateway_backend_in_flight").set(count as f64);
}

/// A timing guard that records backend latency on drop
pub struct LatencyTimer {
    operation: &'static str,
    start: Instant,
}

impl LatencyTimer {
    /// Start a new latency timer
    pub fn new(operation: &'static str) -> Self {
        Self {
            operation,
            start: Instant::now(),
        }
    }
}

impl Drop for LatencyTimer {
    fn drop(&mut self) {
        record_backend_latency(self.operation, self.start.elapsed());
    }
}
