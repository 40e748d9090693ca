//! Prometheus metrics for monitoring tournament server health and activity.
//!
//! Metrics are rendered in Prometheus text format at `/metrics` on the main
//! router, and optionally on a standalone exporter listener.
//!
//! # Metrics Categories
//!
//! - **HTTP Metrics**: Request counts, duration, status codes
//! - **Tournament Metrics**: Brackets generated, results recorded, rounds advanced
//! - **Contention Metrics**: Conflicts by kind, busy rejections
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use sd_server::metrics;
//!
//! # async fn example() -> Result<(), String> {
//! let handle = metrics::install(None)?;
//!
//! metrics::http_requests_total("POST", "/api/v1/teams", 201);
//! println!("{}", handle.render());
//! # Ok(())
//! # }
//! ```

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use sports_day::{ResultOutcome, Sport, TournamentError};
use std::{net::SocketAddr, time::Instant};

/// Install the global Prometheus recorder.
///
/// With `listener` set, the exporter also serves scrapes on that address;
/// this must then be called from within a tokio runtime.
pub fn install(listener: Option<SocketAddr>) -> Result<PrometheusHandle, String> {
    let Some(addr) = listener else {
        return PrometheusBuilder::new()
            .install_recorder()
            .map_err(|e| format!("Failed to install Prometheus recorder: {}", e));
    };

    let (recorder, exporter) = PrometheusBuilder::new()
        .with_http_listener(addr)
        .build()
        .map_err(|e| format!("Failed to build Prometheus exporter: {}", e))?;
    let handle = recorder.handle();
    metrics::set_global_recorder(recorder)
        .map_err(|e| format!("Failed to install Prometheus recorder: {}", e))?;

    tokio::spawn(async move {
        if let Err(e) = exporter.await {
            tracing::error!("Prometheus exporter stopped: {:?}", e);
        }
    });
    Ok(handle)
}

/// A handle that renders metrics without touching the global recorder.
pub fn detached_handle() -> PrometheusHandle {
    PrometheusBuilder::new().build_recorder().handle()
}

/// Count and time every request by method, matched route and status.
pub async fn track_http(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    // Route templates keep label cardinality bounded.
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(request).await;

    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
    http_requests_total(&method, &path, response.status().as_u16());
    http_request_duration_ms(&method, &path, elapsed_ms);
    response
}

// ============================================================================
// HTTP Metrics
// ============================================================================

/// Record HTTP request.
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
// Tournament Metrics
// ============================================================================

/// Increment brackets generated counter.
pub fn brackets_generated_total(sport: Sport) {
    metrics::counter!("brackets_generated_total", "sport" => sport.as_str()).increment(1);
}

/// Count a recorded result and any advancement it caused.
pub fn result_recorded(outcome: &ResultOutcome) {
    match outcome {
        ResultOutcome::Unchanged => {}
        ResultOutcome::Recorded { .. } => {
            metrics::counter!("results_recorded_total").increment(1);
        }
        ResultOutcome::Advanced { .. } => {
            metrics::counter!("results_recorded_total").increment(1);
            metrics::counter!("rounds_advanced_total").increment(1);
        }
        ResultOutcome::Champion { .. } => {
            metrics::counter!("results_recorded_total").increment(1);
            metrics::counter!("champions_decided_total").increment(1);
        }
    }
}

// ============================================================================
// Contention Metrics
// ============================================================================

/// Count conflicts and busy rejections; other errors are not contention.
pub fn tournament_error(operation: &'static str, err: &TournamentError) {
    match err {
        TournamentError::Conflict(conflict) => {
            metrics::counter!("conflicts_total",
                "operation" => operation,
                "kind" => conflict.kind()
            )
            .increment(1);
        }
        TournamentError::Busy(_) => {
            metrics::counter!("busy_rejections_total", "operation" => operation).increment(1);
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sports_day::ConflictError;

    #[test]
    fn test_recording_without_recorder_is_noop() {
        http_requests_total("GET", "/health", 200);
        http_request_duration_ms("GET", "/health", 1.5);
        brackets_generated_total(Sport::Cricket);
        result_recorded(&ResultOutcome::Advanced {
            next_round: 2,
            matches: 1,
        });
        tournament_error(
            "create_team",
            &ConflictError::DuplicateTeamName {
                name: "Strikers".to_string(),
            }
            .into(),
        );
    }

    #[test]
    fn test_detached_handle_renders() {
        let handle = detached_handle();
        http_requests_total("GET", "/health", 200);
        // The global counter never reaches a detached recorder.
        assert!(!handle.render().contains("http_requests_total"));
    }
}
