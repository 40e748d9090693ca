//! Admin capability check for mutating endpoints.
//!
//! Apply to a route's admin-only methods:
//!
//! ```rust,no_run
//! use axum::{Router, routing::{delete, get}, middleware};
//! # use sd_server::api::middleware::admin_middleware;
//! # use sd_server::api::AppState;
//! # async fn show() {}
//! # async fn remove() {}
//! # let state: AppState = unimplemented!();
//!
//! let routes: Router<AppState> = Router::new().route(
//!     "/things/{id}",
//!     get(show).merge(
//!         delete(remove).route_layer(middleware::from_fn_with_state(state.clone(), admin_middleware)),
//!     ),
//! );
//! # let _ = routes;
//! ```

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use super::{AppState, error::ApiError};

/// Require a valid admin bearer token.
///
/// - **Missing header / bad format / invalid or expired token**: `401 Unauthorized`
/// - **Valid token without the admin role**: `403 Forbidden`
/// - **Success**: the [`AdminClaims`](super::auth::AdminClaims) go into request extensions
pub async fn admin_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(ApiError::Unauthorized("Missing bearer token"))?;

    let claims = state.admin_auth.verify_token(token).map_err(|e| {
        tracing::warn!(event_type = "invalid_token", "SECURITY: {}", e);
        ApiError::Unauthorized("Invalid or expired token")
    })?;

    if !claims.is_admin() {
        tracing::warn!(event_type = "forbidden", sub = %claims.sub, "SECURITY: Non-admin token");
        return Err(ApiError::Forbidden);
    }

    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}
