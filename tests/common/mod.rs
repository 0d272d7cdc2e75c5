// tests/common/mod.rs
#![allow(dead_code)]

use std::{path::Path, str::FromStr};

use quizzes::{
    db,
    models::attempt::SubmittedResponse,
    services::{attempts::AttemptService, roster::SqlCourseRoster},
};
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use std::sync::Arc;

pub const INSTRUCTOR: i64 = 900;
pub const STUDENT: i64 = 1;
pub const OTHER_STUDENT: i64 = 2;
pub const OUTSIDER: i64 = 3;

/// Fresh in-memory database with migrations applied.
/// A single connection keeps the in-memory database alive for the pool's lifetime.
pub async fn test_pool() -> SqlitePool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .expect("valid sqlite url")
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .expect("Failed to open in-memory database");

    db::migrate(&pool).await.expect("Failed to migrate database");
    pool
}

/// File-backed database opened the way the server opens it, with several connections.
pub async fn file_pool(dir: &Path, max_connections: u32) -> SqlitePool {
    let url = format!("sqlite://{}", dir.join("quizzes.db").display());
    let pool = db::connect(&url, max_connections)
        .await
        .expect("Failed to open database file");

    db::migrate(&pool).await.expect("Failed to migrate database");
    pool
}

pub fn service(pool: &SqlitePool) -> AttemptService {
    AttemptService::new(pool.clone(), Arc::new(SqlCourseRoster::new(pool.clone())))
}

/// Course owned by `INSTRUCTOR` with `STUDENT` and `OTHER_STUDENT` enrolled.
pub async fn seed_course(pool: &SqlitePool) -> i64 {
    let course_id = sqlx::query("INSERT INTO courses (title, instructor_id) VALUES (?, ?)")
        .bind("Rust Foundations")
        .bind(INSTRUCTOR)
        .execute(pool)
        .await
        .unwrap()
        .last_insert_rowid();

    for student in [STUDENT, OTHER_STUDENT] {
        enroll(pool, course_id, student).await;
    }

    course_id
}

pub async fn enroll(pool: &SqlitePool, course_id: i64, student_id: i64) {
    sqlx::query("INSERT INTO course_students (course_id, student_id) VALUES (?, ?)")
        .bind(course_id)
        .bind(student_id)
        .execute(pool)
        .await
        .unwrap();
}

pub async fn seed_quiz(pool: &SqlitePool, course_id: i64, pass: Option<f64>) -> i64 {
    let module_id = sqlx::query("INSERT INTO modules (course_id, title) VALUES (?, ?)")
        .bind(course_id)
        .bind("Ownership")
        .execute(pool)
        .await
        .unwrap()
        .last_insert_rowid();

    sqlx::query(
        "INSERT INTO quizzes (module_id, title, time_limit, required_score_to_pass) VALUES (?, ?, ?, ?)",
    )
    .bind(module_id)
    .bind("Ownership check")
    .bind(15_i64)
    .bind(pass)
    .execute(pool)
    .await
    .unwrap()
    .last_insert_rowid()
}

/// Inserts a question and its candidate answers; returns (question id, answer ids).
pub async fn add_question(
    pool: &SqlitePool,
    quiz_id: i64,
    question_type: &str,
    points: i64,
    order: i64,
    answers: &[(&str, bool)],
) -> (i64, Vec<i64>) {
    let question_id = sqlx::query(
        "INSERT INTO questions (quiz_id, text, question_type, points, display_order) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(quiz_id)
    .bind(format!("Question {}", order))
    .bind(question_type)
    .bind(points)
    .bind(order)
    .execute(pool)
    .await
    .unwrap()
    .last_insert_rowid();

    let mut answer_ids = Vec::new();
    for (text, is_correct) in answers {
        let id = sqlx::query("INSERT INTO answers (question_id, text, is_correct) VALUES (?, ?, ?)")
            .bind(question_id)
            .bind(*text)
            .bind(*is_correct)
            .execute(pool)
            .await
            .unwrap()
            .last_insert_rowid();
        answer_ids.push(id);
    }

    (question_id, answer_ids)
}

/// Single-select question whose first option is correct.
pub async fn add_single_select(pool: &SqlitePool, quiz_id: i64, order: i64) -> (i64, Vec<i64>) {
    add_question(
        pool,
        quiz_id,
        "single_select",
        1,
        order,
        &[("right", true), ("wrong", false)],
    )
    .await
}

pub fn pick(question_id: i64, selected: &[i64]) -> SubmittedResponse {
    SubmittedResponse {
        question_id,
        selected: selected.to_vec(),
        text: String::new(),
    }
}

pub fn type_in(question_id: i64, text: &str) -> SubmittedResponse {
    SubmittedResponse {
        question_id,
        selected: vec![],
        text: text.to_string(),
    }
}
