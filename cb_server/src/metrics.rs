//! Prometheus metrics for the bracket server.
//!
//! Metrics are exposed in Prometheus text format by a dedicated listener,
//! started only when `METRICS_BIND` is configured. Without an installed
//! recorder every call below is a no-op.
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use cb_server::metrics;
//! use std::net::SocketAddr;
//!
//! let addr: SocketAddr = "127.0.0.1:9090".parse().unwrap();
//! metrics::init_metrics(addr).unwrap();
//!
//! metrics::http_requests_total("POST", "/api/torneios/{id}/sorteio", 200);
//! ```

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Initialize Prometheus metrics exporter.
///
/// Metrics will be available at `http://<addr>/metrics`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {}", e))
}

// ============================================================================
// HTTP Metrics
// ============================================================================

/// Record HTTP request.
///
/// `path` should be the route template so ids do not explode label cardinality.
pub fn http_requests_total(method: &str, path: &str, status: u16) {
    metrics::counter!("http_requests_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record HTTP request duration in milliseconds.
pub fn http_request_duration_ms(method: &str, path: &str, duration_ms: f64) {
    metrics::histogram!("http_request_duration_ms",
        "method" => method.to_string(),
        "path" => path.to_string()
    )
    .record(duration_ms);
}

// ============================================================================
// Bracket Metrics
// ============================================================================

/// Increment draws counter, labelled by initial phase.
pub fn draws_total(initial_phase: &str) {
    metrics::counter!("draws_total", "phase" => initial_phase.to_string()).increment(1);
}

/// Add byes granted by a draw.
pub fn byes_total(count: usize) {
    metrics::counter!("byes_total").increment(count as u64);
}

/// Increment results recorded counter.
pub fn results_recorded_total() {
    metrics::counter!("results_recorded_total").increment(1);
}

/// Increment tournaments finalized counter.
pub fn tournaments_finalized_total() {
    metrics::counter!("tournaments_finalized_total").increment(1);
}

/// Add competitors registered through CSV import.
pub fn competitors_imported_total(count: usize) {
    metrics::counter!("competitors_imported_total").increment(count as u64);
}
