//! Admin authentication.
//!
//! Sports day has a single admin role guarded by a shared password. Logging
//! in exchanges that password for a signed bearer token that the admin
//! middleware checks on every mutating route.
//!
//! # Example
//!
//! ```bash
//! curl -X POST http://localhost:5000/api/v1/auth/login \
//!   -H "Content-Type: application/json" \
//!   -d '{"password": "..."}'
//! ```

use axum::{Json, extract::State};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

use super::{AppState, error::ApiError};
use crate::config::SecurityConfig;

/// Role claim carried by admin tokens
pub const ADMIN_ROLE: &str = "admin";

/// Claims of an admin bearer token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminClaims {
    pub sub: String,
    pub role: String,
    pub exp: i64,
    pub iat: i64,
}

impl AdminClaims {
    pub fn is_admin(&self) -> bool {
        self.role == ADMIN_ROLE
    }
}

/// Admin credential check and token issuing
#[derive(Clone)]
pub struct AdminAuth {
    password: String,
    jwt_secret: String,
    token_ttl: Duration,
}

impl AdminAuth {
    pub fn new(security: &SecurityConfig) -> Self {
        Self {
            password: security.admin_password.clone(),
            jwt_secret: security.jwt_secret.clone(),
            token_ttl: Duration::hours(security.token_ttl_hours),
        }
    }

    /// Compare in constant time.
    pub fn check_password(&self, candidate: &str) -> bool {
        self.password.as_bytes().ct_eq(candidate.as_bytes()).into()
    }

    /// Sign a token for the admin role.
    pub fn issue_token(&self) -> Result<(String, AdminClaims), jsonwebtoken::errors::Error> {
        let now = Utc::now();
        let claims = AdminClaims {
            sub: "admin".to_string(),
            role: ADMIN_ROLE.to_string(),
            exp: (now + self.token_ttl).timestamp(),
            iat: now.timestamp(),
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )?;
        Ok((token, claims))
    }

    /// Verify signature and expiry, returning the claims.
    pub fn verify_token(&self, token: &str) -> Result<AdminClaims, jsonwebtoken::errors::Error> {
        let token_data = decode::<AdminClaims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginPayload {
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: &'static str,
    pub expires_at: i64,
}

/// Exchange the admin password for a bearer token.
///
/// # Errors
///
/// - `401 Unauthorized`: wrong password
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Result<Json<LoginResponse>, ApiError> {
    if !state.admin_auth.check_password(&payload.password) {
        tracing::warn!(event_type = "failed_login", "SECURITY: Invalid admin password attempt");
        return Err(ApiError::Unauthorized("Invalid password"));
    }

    let (token, claims) = state
        .admin_auth
        .issue_token()
        .map_err(|e| ApiError::Internal(format!("token signing failed: {e}")))?;

    tracing::info!("Admin logged in");
    Ok(Json(LoginResponse {
        token,
        token_type: "Bearer",
        expires_at: claims.exp,
    }))
}
