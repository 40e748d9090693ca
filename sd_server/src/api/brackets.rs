//! Bracket API handlers.
//!
//! Viewing a bracket is public; generating, resetting and recording results
//! need an admin token.
//!
//! # Examples
//!
//! View the cricket bracket:
//! ```bash
//! curl http://localhost:5000/api/v1/brackets/cricket
//! ```
//!
//! Record a result:
//! ```bash
//! curl -X PUT http://localhost:5000/api/v1/matches/12/result \
//!   -H "Authorization: Bearer TOKEN" \
//!   -H "Content-Type: application/json" \
//!   -d '{"winner_id": 4}'
//! ```

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use sports_day::{
    BracketMatch, BracketSummary, ResultOutcome, Sport,
    bracket::{BracketGenerated, MatchId},
    team::TeamId,
};
use std::time::Instant;

use super::{AppState, error::ApiError, parse_sport, request_id::RequestId};
use crate::{logging, metrics};

#[derive(Debug, Serialize)]
pub struct BracketResponse {
    pub sport: Sport,
    pub summary: BracketSummary,
    pub matches: Vec<BracketMatch>,
}

#[derive(Debug, Deserialize)]
pub struct RecordResultRequest {
    pub winner_id: TeamId,
}

#[derive(Debug, Serialize)]
pub struct RecordResultResponse {
    pub match_id: MatchId,
    #[serde(flatten)]
    pub outcome: ResultOutcome,
}

#[derive(Debug, Serialize)]
pub struct ResetResponse {
    pub sport: Sport,
    pub removed_matches: u64,
}

/// Every match of a sport's bracket, by round and match number.
///
/// # Response
///
/// ```json
/// {
///   "sport": "cricket",
///   "summary": {"rounds": 2, "current_round": 2, "champion": null, "champion_name": null},
///   "matches": [
///     {"id": 1, "sport": "cricket", "round": 1, "match_number": 1,
///      "team1_id": 3, "team2_id": 4, "winner_id": 3, "is_completed": true,
///      "team1_name": "A", "team2_name": "B", "winner_name": "A"}
///   ]
/// }
/// ```
pub async fn get_bracket(
    State(state): State<AppState>,
    Path(sport): Path<String>,
) -> Result<Json<BracketResponse>, ApiError> {
    let sport = parse_sport(&sport)?;
    let matches = state
        .bracket_manager
        .get_bracket(sport)
        .await
        .map_err(|e| ApiError::tournament("get_bracket", e))?;

    Ok(Json(BracketResponse {
        sport,
        summary: BracketSummary::from_matches(&matches),
        matches,
    }))
}

/// Replace the sport's bracket with a fresh round 1.
///
/// # Errors
///
/// - `400 Bad Request`: unknown sport or fewer than 2 teams
/// - `503 Service Unavailable`: bracket busy, retry shortly
pub async fn generate_bracket(
    State(state): State<AppState>,
    Path(sport): Path<String>,
) -> Result<(StatusCode, Json<BracketGenerated>), ApiError> {
    let sport = parse_sport(&sport)?;
    let start = Instant::now();

    let generated = state
        .bracket_manager
        .generate_bracket(sport)
        .await
        .map_err(|e| ApiError::tournament("generate_bracket", e))?;

    logging::log_performance(
        "generate_bracket",
        start.elapsed().as_millis() as u64,
        Some(sport.as_str()),
    );
    metrics::brackets_generated_total(sport);
    Ok((StatusCode::CREATED, Json(generated)))
}

/// Delete every match of the sport.
pub async fn reset_bracket(
    State(state): State<AppState>,
    Path(sport): Path<String>,
    request_id: RequestId,
) -> Result<Json<ResetResponse>, ApiError> {
    let sport = parse_sport(&sport)?;
    let removed_matches = state
        .bracket_manager
        .reset_bracket(sport)
        .await
        .map_err(|e| ApiError::tournament("reset_bracket", e))?;

    tracing::warn!(
        request_id = request_id.as_str(),
        sport = sport.as_str(),
        removed_matches,
        "Bracket reset by admin"
    );
    Ok(Json(ResetResponse {
        sport,
        removed_matches,
    }))
}

/// Record a match winner, advancing the bracket when the round completes.
///
/// # Response
///
/// ```json
/// {"match_id": 12, "outcome": "advanced", "next_round": 2, "matches": 2}
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: the winner is not playing in the match
/// - `404 Not Found`: no such match
/// - `409 Conflict`: the result already fed the next round
/// - `503 Service Unavailable`: bracket busy, retry shortly
pub async fn record_result(
    State(state): State<AppState>,
    Path(match_id): Path<MatchId>,
    Json(payload): Json<RecordResultRequest>,
) -> Result<Json<RecordResultResponse>, ApiError> {
    let outcome = state
        .bracket_manager
        .record_result(match_id, payload.winner_id)
        .await
        .map_err(|e| ApiError::tournament("record_result", e))?;

    metrics::result_recorded(&outcome);
    Ok(Json(RecordResultResponse { match_id, outcome }))
}
