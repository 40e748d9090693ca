//! Sports day tournament server.
//!
//! Opens the database pool, builds the team and bracket managers on it and
//! serves the HTTP API until Ctrl+C, then drains and closes the pool.

use std::{net::SocketAddr, sync::Arc};

use anyhow::Error;
use pico_args::Arguments;
use sd_server::{
    api,
    config::{CliOverrides, ServerConfig},
    logging, metrics,
};
use sports_day::{
    BracketManager, TeamManager,
    db::{Database, PgStudentRepository},
};
use tracing::{error, info};

const HELP: &str = "\
Run the sports day tournament server

USAGE:
  sd_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:5000]
  --db-url     URL         Database connection string  [default: env DATABASE_URL or postgres://postgres@localhost/college_sports_day]

FLAGS:
  --migrate                Apply database migrations before serving
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND              Server bind address (e.g., 0.0.0.0:5000)
  DATABASE_URL             PostgreSQL connection string
  ADMIN_PASSWORD           Admin login password (required)
  JWT_SECRET               Admin token signing secret (required)
  FRONTEND_URL             Extra allowed CORS origin
  METRICS_BIND             Standalone Prometheus listener
  (See .env.example for all configuration options)
";

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let overrides = CliOverrides {
        bind: pargs.opt_value_from_str::<_, SocketAddr>("--bind")?,
        database_url: pargs.opt_value_from_str("--db-url")?,
        migrate: pargs.contains("--migrate"),
    };

    logging::init();

    let config = ServerConfig::from_env(overrides)?;
    info!("Starting sports day server at {}", config.bind);

    let metrics_handle = metrics::install(config.metrics_bind).map_err(anyhow::Error::msg)?;
    if let Some(addr) = config.metrics_bind {
        info!("Prometheus exporter listening on {}", addr);
    }

    let db = Database::new(&config.database)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to connect to database: {}", e))?;
    info!("Database connected successfully");

    if config.run_migrations {
        db.migrate()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to apply migrations: {}", e))?;
        info!("Database migrations applied");
    }

    let pool = Arc::new(db.pool().clone());
    let locking = config.database.lock_settings();

    let api_state = api::AppState {
        team_manager: Arc::new(TeamManager::new(pool.clone()).with_lock_settings(locking)),
        bracket_manager: Arc::new(BracketManager::new(pool.clone()).with_lock_settings(locking)),
        students: Arc::new(PgStudentRepository::new(pool.clone()).with_lock_settings(locking)),
        admin_auth: Arc::new(api::auth::AdminAuth::new(&config.security)),
        pool,
        metrics: metrics_handle,
    };

    let app = api::create_router(api_state, config.frontend_url.as_deref());

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", config.bind, e))?;

    info!(
        "Server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    info!("Shutting down server...");
    db.close().await;

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}
