//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by function, status
//! - `gateway_request_duration_seconds` (histogram): latency by function
//! - `gateway_ledger_submissions_total` (counter): broadcasts by outcome
//! - `gateway_ledger_health` (gauge): 1=reachable, 0=unreachable
//! - `gateway_record_failures_total` (counter): failed table writes by table

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record a finished function call.
pub fn record_request(function: &'static str, status: u16, start: Instant) {
    ::metrics::counter!(
        "gateway_requests_total",
        "function" => function,
        "status" => status.to_string()
    )
    .increment(1);
    ::metrics::histogram!("gateway_request_duration_seconds", "function" => function)
        .record(start.elapsed().as_secs_f64());
}

/// Record the outcome of a transaction broadcast.
pub fn record_ledger_submission(accepted: bool) {
    let outcome = if accepted { "accepted" } else { "rejected" };
    ::metrics::counter!("gateway_ledger_submissions_total", "outcome" => outcome).increment(1);
}

pub fn record_ledger_health(healthy: bool) {
    ::metrics::gauge!("gateway_ledger_health").set(if healthy { 1.0 } else { 0.0 });
}

/// Record a table write that failed after a confirmed transaction.
pub fn record_record_failure(table: &str) {
    ::metrics::counter!("gateway_record_failures_total", "table" => table.to_string()).increment(1);
}
