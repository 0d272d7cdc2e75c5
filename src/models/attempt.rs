// src/models/attempt.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::services::error::IntegrityError;

/// Represents the 'quiz_attempts' table in the database.
#[derive(Debug, Clone, FromRow)]
pub struct AttemptRow {
    pub id: i64,
    pub student_id: i64,
    pub quiz_id: i64,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub score: Option<f64>,
    pub passed: bool,
}

/// Lifecycle position of an attempt. `Closed` carries the final verdict so the
/// score can never be observed without its end timestamp and pass flag.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AttemptState {
    Open,
    Closed {
        ended_at: DateTime<Utc>,
        score_pct: f64,
        passed: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attempt {
    pub id: i64,
    pub student_id: i64,
    pub quiz_id: i64,
    pub started_at: DateTime<Utc>,
    #[serde(flatten)]
    pub state: AttemptState,
}

impl Attempt {
    pub fn is_open(&self) -> bool {
        matches!(self.state, AttemptState::Open)
    }
}

impl TryFrom<AttemptRow> for Attempt {
    type Error = IntegrityError;

    fn try_from(row: AttemptRow) -> Result<Self, Self::Error> {
        let state = match (row.end_time, row.score) {
            (None, None) => AttemptState::Open,
            (Some(ended_at), Some(score_pct)) => AttemptState::Closed {
                ended_at,
                score_pct,
                passed: row.passed,
            },
            _ => return Err(IntegrityError::CorruptAttempt { attempt_id: row.id }),
        };

        Ok(Attempt {
            id: row.id,
            student_id: row.student_id,
            quiz_id: row.quiz_id,
            started_at: row.start_time,
            state,
        })
    }
}

/// History entry for an attempt. Score fields stay empty while it is open.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttemptSummary {
    pub attempt_id: i64,
    pub student_id: i64,
    pub quiz_id: i64,
    pub score_pct: Option<f64>,
    pub passed: Option<bool>,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl From<&Attempt> for AttemptSummary {
    fn from(attempt: &Attempt) -> Self {
        let (score_pct, passed, ended_at) = match attempt.state {
            AttemptState::Open => (None, None, None),
            AttemptState::Closed {
                ended_at,
                score_pct,
                passed,
            } => (Some(score_pct), Some(passed), Some(ended_at)),
        };

        AttemptSummary {
            attempt_id: attempt.id,
            student_id: attempt.student_id,
            quiz_id: attempt.quiz_id,
            score_pct,
            passed,
            started_at: attempt.started_at,
            ended_at,
        }
    }
}

/// One student answer as submitted.
///
/// `selected` holds candidate-answer ids for choice questions, `text` the
/// free-text value. Either may be omitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct SubmittedResponse {
    pub question_id: i64,
    #[serde(default)]
    #[validate(length(max = 100))]
    pub selected: Vec<i64>,
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub text: String,
}

/// DTO for submitting responses to an open attempt.
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitResponsesRequest {
    #[serde(default)]
    #[validate(length(max = 500), nested)]
    pub responses: Vec<SubmittedResponse>,
}

/// Acknowledges which questions were recorded. Correctness is withheld until closure.
#[derive(Debug, Serialize)]
pub struct SubmissionReceipt {
    pub attempt_id: i64,
    pub recorded: Vec<i64>,
}

/// Represents the 'question_responses' table in the database.
#[derive(Debug, Clone, FromRow)]
pub struct ResponseRow {
    pub id: i64,
    pub question_id: i64,
    pub text_response: String,
    pub is_correct: bool,
}

#[derive(Debug, Clone, FromRow)]
pub struct SelectionRow {
    pub response_id: i64,
    pub answer_id: i64,
}

/// A persisted response. `is_correct` is only disclosed once the attempt is closed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordedResponse {
    pub question_id: i64,
    pub selected: Vec<i64>,
    pub text: String,
    pub is_correct: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct AttemptDetail {
    #[serde(flatten)]
    pub summary: AttemptSummary,
    pub responses: Vec<RecordedResponse>,
}

/// Instructor report over every attempt of one quiz.
#[derive(Debug, Serialize)]
pub struct QuizResults {
    pub quiz_id: i64,
    pub total_attempts: usize,
    pub open_attempts: usize,
    pub passed_attempts: usize,
    /// Percentage of all attempts that passed. Open attempts count as not passed.
    pub pass_rate: f64,
    /// Mean score of closed attempts.
    pub average_score: f64,
    pub attempts: Vec<AttemptSummary>,
}

/// Query parameters for listing the caller's attempts.
#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    pub quiz_id: Option<i64>,
}
