//! Student roster API handlers (admin only).

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Serialize;
use sports_day::{
    TournamentError,
    roster::{NewStudent, Student, StudentId},
};

use super::{AppState, error::ApiError, parse_sport};

#[derive(Debug, Serialize)]
pub struct CreatedStudent {
    pub id: StudentId,
}

pub async fn list_students(State(state): State<AppState>) -> Result<Json<Vec<Student>>, ApiError> {
    let students = state
        .students
        .list_students()
        .await
        .map_err(|e| ApiError::tournament("list_students", e))?;
    Ok(Json(students))
}

/// Students registered for the sport who are on no team for it.
pub async fn list_available(
    State(state): State<AppState>,
    Path(sport): Path<String>,
) -> Result<Json<Vec<Student>>, ApiError> {
    let sport = parse_sport(&sport)?;
    let students = state
        .students
        .list_available(sport)
        .await
        .map_err(|e| ApiError::tournament("list_available", e))?;
    Ok(Json(students))
}

pub async fn create_student(
    State(state): State<AppState>,
    Json(payload): Json<NewStudent>,
) -> Result<(StatusCode, Json<CreatedStudent>), ApiError> {
    let id = state
        .students
        .create_student(&payload)
        .await
        .map_err(|e| ApiError::tournament("create_student", e))?;
    Ok((StatusCode::CREATED, Json(CreatedStudent { id })))
}

/// Replace a student's details.
///
/// Revoking a sport the student already plays for is a `409 Conflict`.
pub async fn update_student(
    State(state): State<AppState>,
    Path(student_id): Path<StudentId>,
    Json(payload): Json<NewStudent>,
) -> Result<Json<Student>, ApiError> {
    state
        .students
        .update_student(student_id, &payload)
        .await
        .map_err(|e| ApiError::tournament("update_student", e))?;

    let student = state
        .students
        .find_by_id(student_id)
        .await
        .map_err(|e| ApiError::tournament("update_student", e))?
        .ok_or_else(|| {
            ApiError::tournament(
                "update_student",
                TournamentError::NotFound {
                    entity: "student",
                    id: student_id,
                },
            )
        })?;
    Ok(Json(student))
}

pub async fn delete_student(
    State(state): State<AppState>,
    Path(student_id): Path<StudentId>,
) -> Result<StatusCode, ApiError> {
    state
        .students
        .delete_student(student_id)
        .await
        .map_err(|e| ApiError::tournament("delete_student", e))?;
    Ok(StatusCode::NO_CONTENT)
}
