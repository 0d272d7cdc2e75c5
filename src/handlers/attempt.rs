// src/handlers/attempt.rs

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    error::AppError,
    models::attempt::{HistoryParams, SubmitResponsesRequest},
    services::attempts::AttemptService,
    utils::jwt::Claims,
};

/// Lists the caller's attempts, newest first.
/// Optional `?quiz_id=` narrows the list to one quiz.
pub async fn list_attempts(
    State(service): State<AttemptService>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<HistoryParams>,
) -> Result<impl IntoResponse, AppError> {
    let history = service
        .attempt_history(claims.user_id()?, params.quiz_id)
        .await?;
    Ok(Json(history))
}

/// Retrieves one attempt with its responses (owner or course instructor).
pub async fn get_attempt(
    State(service): State<AttemptService>,
    Extension(claims): Extension<Claims>,
    Path(attempt_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let detail = service.attempt_detail(claims.user_id()?, attempt_id).await?;
    Ok(Json(detail))
}

/// Records answers on an open attempt. Nothing is graded yet.
pub async fn submit_responses(
    State(service): State<AttemptService>,
    Extension(claims): Extension<Claims>,
    Path(attempt_id): Path<i64>,
    Json(req): Json<SubmitResponsesRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let receipt = service
        .submit_responses(claims.user_id()?, attempt_id, &req.responses)
        .await?;
    Ok(Json(receipt))
}

/// Grades and closes the attempt. Questions never answered score zero.
pub async fn close_attempt(
    State(service): State<AttemptService>,
    Extension(claims): Extension<Claims>,
    Path(attempt_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let closed = service.close_attempt(claims.user_id()?, attempt_id).await?;
    Ok(Json(closed))
}

/// Records the final answers and closes the attempt atomically.
pub async fn submit_and_close(
    State(service): State<AttemptService>,
    Extension(claims): Extension<Claims>,
    Path(attempt_id): Path<i64>,
    Json(req): Json<SubmitResponsesRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let closed = service
        .submit_and_close(claims.user_id()?, attempt_id, &req.responses)
        .await?;
    Ok(Json(closed))
}
