// src/handlers/health.rs

use axum::{Json, extract::State, response::IntoResponse};
use sqlx::SqlitePool;

use crate::error::AppError;

/// Liveness check. Fails with 500 when the database is unreachable.
pub async fn health(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    sqlx::query("SELECT 1").execute(&pool).await?;
    Ok(Json(serde_json::json!({ "status": "ok" })))
}
