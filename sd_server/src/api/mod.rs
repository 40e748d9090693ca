//! HTTP API for the sports day server.
//!
//! # Modules
//!
//! - [`auth`]: admin login
//! - [`brackets`]: bracket view, generation, reset and match results
//! - [`teams`]: team formation
//! - [`students`]: roster management
//! - [`middleware`]: admin capability check for mutating endpoints
//! - [`request_id`]: request correlation
//!
//! # Endpoints Overview
//!
//! ```text
//! GET    /health                              - Health check (public)
//! GET    /metrics                             - Prometheus metrics (public)
//! POST   /api/v1/auth/login                   - Admin login (public)
//! GET    /api/v1/brackets/{sport}             - View bracket (public)
//! POST   /api/v1/brackets/{sport}/generate    - Generate bracket (admin)
//! DELETE /api/v1/brackets/{sport}             - Reset bracket (admin)
//! PUT    /api/v1/matches/{match_id}/result    - Record result (admin)
//! GET    /api/v1/teams/sport/{sport}          - List teams (public)
//! POST   /api/v1/teams                        - Create team (admin)
//! GET    /api/v1/teams/{team_id}              - Get team (public)
//! PUT    /api/v1/teams/{team_id}              - Update team (admin)
//! DELETE /api/v1/teams/{team_id}              - Delete team (admin)
//! GET    /api/v1/students                     - List students (admin)
//! POST   /api/v1/students                     - Register student (admin)
//! PUT    /api/v1/students/{student_id}        - Update student (admin)
//! DELETE /api/v1/students/{student_id}        - Delete student (admin)
//! GET    /api/v1/students/available/{sport}   - Unassigned students (admin)
//! ```
//!
//! # CORS
//!
//! Browsers may call the API from the local frontend dev servers and from
//! `FRONTEND_URL` when configured.

pub mod auth;
pub mod brackets;
pub mod error;
pub mod middleware;
pub mod request_id;
pub mod students;
pub mod teams;

use axum::{
    Router,
    extract::State,
    http::{
        HeaderValue, Method, StatusCode,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    response::{IntoResponse, Json},
    routing::{delete, get, post, put},
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::json;
use sports_day::{BracketManager, Sport, TeamManager, db::StudentRepository};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};

use self::error::ApiError;

/// Origins of the frontend dev servers.
const DEV_ORIGINS: [&str; 2] = ["http://localhost:3000", "http://localhost:5000"];

/// Application state shared across all HTTP handlers.
///
/// Cloned per request; everything inside is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub team_manager: Arc<TeamManager>,
    pub bracket_manager: Arc<BracketManager>,
    pub students: Arc<dyn StudentRepository>,
    pub admin_auth: Arc<auth::AdminAuth>,
    pub pool: Arc<PgPool>,
    pub metrics: PrometheusHandle,
}

/// Create the complete API router with all endpoints and middleware.
///
/// # Example
///
/// ```rust,no_run
/// # use sd_server::api::{create_router, AppState};
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// # let state: AppState = unimplemented!();
/// let app = create_router(state, Some("https://sports.example.edu"));
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:5000").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```
pub fn create_router(state: AppState, frontend_url: Option<&str>) -> Router {
    let v1_routes = create_v1_router(&state);

    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(render_metrics))
        .nest("/api/v1", v1_routes)
        .layer(axum::middleware::from_fn(crate::metrics::track_http))
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
        .layer(cors_layer(frontend_url))
        .with_state(state)
}

fn create_v1_router(state: &AppState) -> Router<AppState> {
    let admin =
        || axum::middleware::from_fn_with_state(state.clone(), middleware::admin_middleware);

    let bracket_routes = Router::new()
        .route(
            "/brackets/{sport}",
            get(brackets::get_bracket).merge(delete(brackets::reset_bracket).route_layer(admin())),
        )
        .route(
            "/brackets/{sport}/generate",
            post(brackets::generate_bracket).route_layer(admin()),
        )
        .route(
            "/matches/{match_id}/result",
            put(brackets::record_result).route_layer(admin()),
        );

    let team_routes = Router::new()
        .route("/teams", post(teams::create_team).route_layer(admin()))
        .route("/teams/sport/{sport}", get(teams::list_teams))
        .route(
            "/teams/{team_id}",
            get(teams::get_team).merge(
                put(teams::update_team)
                    .delete(teams::delete_team)
                    .route_layer(admin()),
            ),
        );

    // The whole roster is admin-only.
    let student_routes = Router::new()
        .route(
            "/students",
            get(students::list_students).post(students::create_student),
        )
        .route(
            "/students/{student_id}",
            put(students::update_student).delete(students::delete_student),
        )
        .route(
            "/students/available/{sport}",
            get(students::list_available),
        )
        .route_layer(admin());

    Router::new()
        .route("/auth/login", post(auth::login))
        .merge(bracket_routes)
        .merge(team_routes)
        .merge(student_routes)
}

/// Parse a sport tag from a URL segment.
pub(crate) fn parse_sport(tag: &str) -> Result<Sport, ApiError> {
    tag.parse::<Sport>()
        .map_err(|e| ApiError::Tournament(e.into()))
}

fn cors_layer(frontend_url: Option<&str>) -> CorsLayer {
    let origins: Vec<HeaderValue> = DEV_ORIGINS
        .into_iter()
        .chain(frontend_url)
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
}

/// Health check endpoint for monitoring and load balancers.
///
/// Returns `200 OK` when the database answers, `503 Service Unavailable`
/// otherwise.
///
/// ```bash
/// curl http://localhost:5000/health
/// # {"status":"healthy","version":"1.0.0","database":true,"timestamp":"2025-11-22T10:30:00Z"}
/// ```
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let db_healthy = sqlx::query("SELECT 1")
        .execute(&*state.pool)
        .await
        .is_ok();

    let status_code = if db_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = json!({
        "status": if db_healthy { "healthy" } else { "unhealthy" },
        "version": env!("CARGO_PKG_VERSION"),
        "database": db_healthy,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (status_code, Json(response))
}

async fn render_metrics(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
