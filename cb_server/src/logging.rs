//! Structured logging configuration.
//!
//! The library logs through the `log` facade; the subscriber installed here
//! bridges those records so draw and advancement logs carry the same format
//! as request logs.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "info,sqlx=warn,hyper=warn";

/// Initialize structured logging
///
/// Log levels are configurable via the `RUST_LOG` env var.
///
/// # Example
///
/// ```no_run
/// use cb_server::logging;
///
/// #[tokio::main]
/// async fn main() {
///     logging::init();
///     tracing::info!("Server starting");
/// }
/// ```
pub fn init() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::info!("Structured logging initialized");
}

/// Log a bracket lifecycle event with structured data
///
/// # Example
///
/// ```
/// use cb_server::logging::log_bracket_event;
///
/// log_bracket_event("draw", 7, Some("quartas"), "4 matches, 1 bye");
/// ```
pub fn log_bracket_event(event_type: &str, tournament_id: i64, phase: Option<&str>, message: &str) {
    tracing::info!(
        event_type = event_type,
        tournament_id = tournament_id,
        phase = phase,
        "BRACKET: {}",
        message
    );
}

/// Log API request/response
///
/// Server errors are raised to warn level.
pub fn log_api_request(method: &str, path: &str, status_code: u16, duration_ms: u64) {
    if status_code >= 500 {
        tracing::warn!(
            http_method = method,
            http_path = path,
            http_status = status_code,
            duration_ms = duration_ms,
            "API request failed"
        );
    } else {
        tracing::info!(
            http_method = method,
            http_path = path,
            http_status = status_code,
            duration_ms = duration_ms,
            "API request completed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_bracket_event() {
        // Just ensure it doesn't panic
        log_bracket_event("draw", 1, Some("final"), "1 match");
        log_bracket_event("finalized", 1, None, "champion 3");
    }

    #[test]
    fn test_log_api_request() {
        log_api_request("GET", "/api/torneios", 200, 12);
        log_api_request("PATCH", "/api/partidas/4", 500, 30);
    }

    #[test]
    fn test_default_filter_parses() {
        assert!(EnvFilter::try_new(DEFAULT_FILTER).is_ok());
    }
}
