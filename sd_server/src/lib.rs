//! HTTP server for the sports day tournament.
//!
//! Wraps the [`sports_day`] engine in an axum API with admin authentication,
//! request correlation, structured logging and Prometheus metrics.

pub mod api;
pub mod config;
pub mod logging;
pub mod metrics;
