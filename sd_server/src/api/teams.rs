//! Team API handlers.
//!
//! # Examples
//!
//! Form a team:
//! ```bash
//! curl -X POST http://localhost:5000/api/v1/teams \
//!   -H "Authorization: Bearer TOKEN" \
//!   -H "Content-Type: application/json" \
//!   -d '{"name": "EEE Strikers", "sport": "cricket", "member_ids": [1, 2, 3]}'
//! ```

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use sports_day::{NewTeam, Team, TeamUpdate, team::TeamId};

use super::{AppState, error::ApiError, parse_sport};

/// Teams of a sport in creation order, with members.
pub async fn list_teams(
    State(state): State<AppState>,
    Path(sport): Path<String>,
) -> Result<Json<Vec<Team>>, ApiError> {
    let sport = parse_sport(&sport)?;
    let teams = state
        .team_manager
        .list_teams(sport)
        .await
        .map_err(|e| ApiError::tournament("list_teams", e))?;
    Ok(Json(teams))
}

pub async fn get_team(
    State(state): State<AppState>,
    Path(team_id): Path<TeamId>,
) -> Result<Json<Team>, ApiError> {
    let team = state
        .team_manager
        .get_team(team_id)
        .await
        .map_err(|e| ApiError::tournament("get_team", e))?;
    Ok(Json(team))
}

/// Form a team.
///
/// # Errors
///
/// - `400 Bad Request`: blank name, repeated or ineligible member
/// - `404 Not Found`: unknown student
/// - `409 Conflict`: a member is already on a team of this sport, or the
///   name is taken; refresh and retry
/// - `503 Service Unavailable`: busy, retry shortly
pub async fn create_team(
    State(state): State<AppState>,
    Json(payload): Json<NewTeam>,
) -> Result<(StatusCode, Json<Team>), ApiError> {
    let team = state
        .team_manager
        .create_team(payload)
        .await
        .map_err(|e| ApiError::tournament("create_team", e))?;
    Ok((StatusCode::CREATED, Json(team)))
}

/// Rename a team and replace its members. The sport cannot change.
pub async fn update_team(
    State(state): State<AppState>,
    Path(team_id): Path<TeamId>,
    Json(payload): Json<TeamUpdate>,
) -> Result<Json<Team>, ApiError> {
    let team = state
        .team_manager
        .update_team(team_id, payload)
        .await
        .map_err(|e| ApiError::tournament("update_team", e))?;
    Ok(Json(team))
}

/// Delete a team that no bracket match references.
pub async fn delete_team(
    State(state): State<AppState>,
    Path(team_id): Path<TeamId>,
) -> Result<StatusCode, ApiError> {
    state
        .team_manager
        .delete_team(team_id)
        .await
        .map_err(|e| ApiError::tournament("delete_team", e))?;
    Ok(StatusCode::NO_CONTENT)
}
