//! Mapping from tournament errors to HTTP responses.
//!
//! | Error | Status | Retry |
//! |---|---|---|
//! | validation | 400 | no |
//! | missing/invalid token | 401 | no |
//! | not an admin | 403 | no |
//! | not found | 404 | no |
//! | conflict | 409 | after refreshing |
//! | busy | 503 + `Retry-After` | as is |
//! | internal | 500 | no |

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header::RETRY_AFTER},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use sports_day::TournamentError;

use crate::{logging, metrics};

/// Seconds a client should wait before retrying a busy response.
const BUSY_RETRY_AFTER_SECS: u32 = 1;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<&'static str>,
    pub retryable: bool,
}

/// Error returned by every handler
#[derive(Debug)]
pub enum ApiError {
    Tournament(TournamentError),
    Unauthorized(&'static str),
    Forbidden,
    Internal(String),
}

impl ApiError {
    /// Wrap a core error, logging it and counting contention.
    pub fn tournament(operation: &'static str, err: TournamentError) -> Self {
        logging::log_tournament_error(operation, &err);
        metrics::tournament_error(operation, &err);
        ApiError::Tournament(err)
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Tournament(err) => match err {
                TournamentError::Validation(_) => StatusCode::BAD_REQUEST,
                TournamentError::Conflict(_) => StatusCode::CONFLICT,
                TournamentError::Busy(_) => StatusCode::SERVICE_UNAVAILABLE,
                TournamentError::NotFound { .. } => StatusCode::NOT_FOUND,
                TournamentError::Inconsistent(_) | TournamentError::Database(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> ErrorResponse {
        match self {
            ApiError::Tournament(err) => ErrorResponse {
                error: err.client_message(),
                kind: match err {
                    TournamentError::Conflict(conflict) => Some(conflict.kind()),
                    TournamentError::Busy(_) => Some("busy"),
                    _ => None,
                },
                retryable: err.is_retryable(),
            },
            ApiError::Unauthorized(message) => ErrorResponse {
                error: (*message).to_string(),
                kind: None,
                retryable: false,
            },
            ApiError::Forbidden => ErrorResponse {
                error: "Admin access required".to_string(),
                kind: None,
                retryable: false,
            },
            ApiError::Internal(detail) => {
                tracing::error!(detail = %detail, "Internal server error");
                ErrorResponse {
                    error: "Internal server error".to_string(),
                    kind: None,
                    retryable: false,
                }
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let mut response = (status, Json(self.body())).into_response();
        if status == StatusCode::SERVICE_UNAVAILABLE {
            response
                .headers_mut()
                .insert(RETRY_AFTER, HeaderValue::from(BUSY_RETRY_AFTER_SECS));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sports_day::{ConflictError, ValidationError};

    #[test]
    fn test_status_mapping() {
        let cases = [
            (
                ApiError::Tournament(ValidationError::EmptyTeamName.into()),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::Tournament(ConflictError::ResultLocked { match_id: 3 }.into()),
                StatusCode::CONFLICT,
            ),
            (
                ApiError::Tournament(TournamentError::Busy("lock".into())),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                ApiError::Tournament(TournamentError::NotFound { entity: "team", id: 4 }),
                StatusCode::NOT_FOUND,
            ),
            (
                ApiError::Tournament(TournamentError::Inconsistent("x".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (ApiError::Unauthorized("no token"), StatusCode::UNAUTHORIZED),
            (ApiError::Forbidden, StatusCode::FORBIDDEN),
        ];

        for (err, status) in cases {
            assert_eq!(err.status(), status, "{err:?}");
        }
    }

    #[test]
    fn test_conflict_body_is_retryable() {
        let err = ApiError::Tournament(
            ConflictError::StudentAlreadyAssigned {
                student_ids: vec![7],
            }
            .into(),
        );
        let body = err.body();
        assert!(body.retryable);
        assert_eq!(body.kind, Some("student_already_assigned"));
    }

    #[test]
    fn test_busy_response_has_retry_after() {
        let response = ApiError::Tournament(TournamentError::Busy("pool".into())).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.headers().get(RETRY_AFTER).unwrap(), "1");
    }

    #[test]
    fn test_internal_detail_not_exposed() {
        let body = ApiError::Tournament(TournamentError::Inconsistent(
            "match 9 completed without winner".into(),
        ))
        .body();
        assert_eq!(body.error, "Internal server error");
        assert!(!body.retryable);
    }
}
