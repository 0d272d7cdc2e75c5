// src/handlers/quiz.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{error::AppError, services::attempts::AttemptService, utils::jwt::Claims};

/// Returns the quiz as a student sees it: questions and options, no answer key.
/// Requires enrollment in the owning course (or being its instructor).
pub async fn get_quiz(
    State(service): State<AttemptService>,
    Extension(claims): Extension<Claims>,
    Path(quiz_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = service.quiz_for_student(claims.user_id()?, quiz_id).await?;
    Ok(Json(quiz))
}

/// Starts a new attempt on the quiz for the calling student.
///
/// * 403 if the student is not enrolled in the course.
/// * 409 if the student already has a passing attempt.
pub async fn start_attempt(
    State(service): State<AttemptService>,
    Extension(claims): Extension<Claims>,
    Path(quiz_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let attempt = service.start_attempt(claims.user_id()?, quiz_id).await?;
    Ok((StatusCode::CREATED, Json(attempt)))
}

/// Lists all attempts on a quiz with pass statistics.
/// Instructor of the owning course only.
pub async fn get_results(
    State(service): State<AttemptService>,
    Extension(claims): Extension<Claims>,
    Path(quiz_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let results = service.quiz_results(claims.user_id()?, quiz_id).await?;
    Ok(Json(results))
}
