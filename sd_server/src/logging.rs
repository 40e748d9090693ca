//! Structured logging configuration.
//!
//! The tournament library logs through the `log` facade; the subscriber
//! installed here picks those records up alongside the server's own
//! `tracing` events.

use sports_day::TournamentError;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize structured logging
///
/// Log levels come from `RUST_LOG`, defaulting to `info,sqlx=warn,hyper=warn`.
///
/// # Example
///
/// ```no_run
/// use sd_server::logging;
///
/// #[tokio::main]
/// async fn main() {
///     logging::init();
///     tracing::info!("Server starting");
/// }
/// ```
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn,hyper=warn"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::info!("Structured logging initialized");
}

/// Log a rejected or failed tournament mutation with structured fields.
///
/// Conflicts and busy signals are expected under concurrent admin edits and
/// log at `warn`; anything internal logs at `error` with full detail.
///
/// # Example
///
/// ```
/// use sd_server::logging::log_tournament_error;
/// use sports_day::{ConflictError, TournamentError};
///
/// let err = TournamentError::from(ConflictError::DuplicateTeamName {
///     name: "Strikers".to_string(),
/// });
/// log_tournament_error("create_team", &err);
/// ```
pub fn log_tournament_error(operation: &str, err: &TournamentError) {
    match err {
        TournamentError::Conflict(conflict) => tracing::warn!(
            operation = operation,
            conflict_kind = conflict.kind(),
            "CONFLICT: {}",
            conflict
        ),
        TournamentError::Busy(reason) => tracing::warn!(
            operation = operation,
            reason = %reason,
            "BUSY: request rejected"
        ),
        TournamentError::Database(_) | TournamentError::Inconsistent(_) => tracing::error!(
            operation = operation,
            error = %err,
            "Internal tournament error"
        ),
        TournamentError::Validation(_) | TournamentError::NotFound { .. } => tracing::debug!(
            operation = operation,
            error = %err,
            "Request rejected"
        ),
    }
}

/// Log performance metric
///
/// Anything over a second is reported as slow.
///
/// # Example
///
/// ```
/// use sd_server::logging::log_performance;
/// use std::time::Instant;
///
/// let start = Instant::now();
/// // ... do work ...
/// let duration = start.elapsed().as_millis() as u64;
/// log_performance("generate_bracket", duration, Some("cricket"));
/// ```
pub fn log_performance(operation: &str, duration_ms: u64, metadata: Option<&str>) {
    if duration_ms > 1000 {
        tracing::warn!(
            operation = operation,
            duration_ms = duration_ms,
            metadata = metadata,
            "PERFORMANCE: Slow operation"
        );
    } else {
        tracing::debug!(
            operation = operation,
            duration_ms = duration_ms,
            metadata = metadata,
            "Performance metric"
        );
    }
}

/// Log a completed API request
pub fn log_api_request(method: &str, path: &str, status_code: u16, duration_ms: u64) {
    tracing::info!(
        http_method = method,
        http_path = path,
        http_status = status_code,
        duration_ms = duration_ms,
        "API request completed"
    );
}
