// src/services/attempts.rs

//! Attempt lifecycle: `Open` on start, `Closed` exactly once when graded.
//!
//! Every mutating operation re-reads the attempt inside a transaction while
//! holding the (student, quiz) guard from [`AttemptLocks`]. Closure writes the
//! score, the verdict and the end timestamp in a single conditional UPDATE.

use std::{
    collections::{BTreeSet, HashMap, HashSet},
    sync::Arc,
};

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};

use crate::{
    models::{
        attempt::{
            Attempt, AttemptDetail, AttemptRow, AttemptState, AttemptSummary, QuizResults,
            RecordedResponse, ResponseRow, SelectionRow, SubmissionReceipt, SubmittedResponse,
        },
        quiz::{PublicQuiz, QuestionKind},
    },
    services::{
        error::{AttemptError, EligibilityError, IntegrityError, StateError, ValidationError},
        evaluator::evaluate,
        grading::{GradingPolicy, Verdict, aggregate, grade_questions},
        locks::AttemptLocks,
        question_bank::{QuizBank, load_quiz},
        roster::CourseRoster,
    },
};

/// Final outcome of a closed attempt.
#[derive(Debug, Clone, Serialize)]
pub struct ClosedAttempt {
    pub attempt_id: i64,
    pub quiz_id: i64,
    pub ended_at: DateTime<Utc>,
    #[serde(flatten)]
    pub verdict: Verdict,
}

#[derive(Clone)]
pub struct AttemptService {
    pool: SqlitePool,
    roster: Arc<dyn CourseRoster>,
    locks: Arc<AttemptLocks>,
}

impl AttemptService {
    pub fn new(pool: SqlitePool, roster: Arc<dyn CourseRoster>) -> Self {
        Self {
            pool,
            roster,
            locks: Arc::new(AttemptLocks::default()),
        }
    }

    /// Opens a new attempt for an enrolled student who has not yet passed the quiz.
    ///
    /// A previous failed attempt does not block a new one.
    pub async fn start_attempt(&self, student_id: i64, quiz_id: i64) -> Result<Attempt, AttemptError> {
        let bank = self.load_bank(quiz_id).await?;
        let course_id = bank.quiz.course_id;

        if !self.roster.is_enrolled(student_id, course_id).await? {
            tracing::warn!(
                "Student {} tried to start quiz {} without enrollment in course {}",
                student_id,
                quiz_id,
                course_id
            );
            return Err(EligibilityError::NotEnrolled {
                student_id,
                course_id,
            }
            .into());
        }

        let _guard = self.locks.acquire(student_id, quiz_id).await;
        let mut tx = self.pool.begin_with("BEGIN IMMEDIATE").await?;

        let already_passed = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM quiz_attempts
                WHERE student_id = ? AND quiz_id = ? AND passed = 1
            )
            "#,
        )
        .bind(student_id)
        .bind(quiz_id)
        .fetch_one(&mut *tx)
        .await?;

        if already_passed {
            tracing::info!("Student {} has already passed quiz {}", student_id, quiz_id);
            return Err(EligibilityError::AlreadyPassed {
                student_id,
                quiz_id,
            }
            .into());
        }

        let started_at = Utc::now();
        let id = sqlx::query(
            "INSERT INTO quiz_attempts (student_id, quiz_id, start_time) VALUES (?, ?, ?)",
        )
        .bind(student_id)
        .bind(quiz_id)
        .bind(started_at)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        tx.commit().await?;

        tracing::info!(
            "Attempt {} started by student {} on quiz {}",
            id,
            student_id,
            quiz_id
        );

        Ok(Attempt {
            id,
            student_id,
            quiz_id,
            started_at,
            state: AttemptState::Open,
        })
    }

    /// Records responses on an open attempt without grading it.
    ///
    /// The whole submission is validated before anything is written: a
    /// question listed twice, a question outside the quiz, a question already
    /// answered earlier, or an option foreign to its question rejects it all.
    pub async fn submit_responses(
        &self,
        student_id: i64,
        attempt_id: i64,
        responses: &[SubmittedResponse],
    ) -> Result<SubmissionReceipt, AttemptError> {
        let attempt = self.owned_attempt(student_id, attempt_id).await?;
        if !attempt.is_open() {
            return Err(StateError::NotOpen { attempt_id }.into());
        }
        let bank = self.load_bank(attempt.quiz_id).await?;

        let _guard = self.locks.acquire(student_id, attempt.quiz_id).await;
        let mut tx = self.pool.begin_with("BEGIN IMMEDIATE").await?;
        let recorded = record_responses(&mut tx, attempt_id, &bank, responses).await?;
        tx.commit().await?;

        tracing::info!(
            "Recorded {} responses on attempt {}",
            recorded.len(),
            attempt_id
        );

        Ok(SubmissionReceipt {
            attempt_id,
            recorded,
        })
    }

    /// Grades and closes an open attempt. Never recomputes a closed one.
    pub async fn close_attempt(
        &self,
        student_id: i64,
        attempt_id: i64,
    ) -> Result<ClosedAttempt, AttemptError> {
        let attempt = self.owned_attempt(student_id, attempt_id).await?;
        if !attempt.is_open() {
            tracing::warn!("Attempt {} is already closed", attempt_id);
            return Err(IntegrityError::AlreadyClosed { attempt_id }.into());
        }
        let bank = self.load_bank(attempt.quiz_id).await?;

        let _guard = self.locks.acquire(student_id, attempt.quiz_id).await;
        let mut tx = self.pool.begin_with("BEGIN IMMEDIATE").await?;
        let closed = finalize(&mut tx, attempt_id, &bank).await?;
        tx.commit().await?;

        log_closed(&closed);
        Ok(closed)
    }

    /// Records the final responses and closes the attempt in one transaction.
    pub async fn submit_and_close(
        &self,
        student_id: i64,
        attempt_id: i64,
        responses: &[SubmittedResponse],
    ) -> Result<ClosedAttempt, AttemptError> {
        let attempt = self.owned_attempt(student_id, attempt_id).await?;
        if !attempt.is_open() {
            return Err(StateError::NotOpen { attempt_id }.into());
        }
        let bank = self.load_bank(attempt.quiz_id).await?;

        let _guard = self.locks.acquire(student_id, attempt.quiz_id).await;
        let mut tx = self.pool.begin_with("BEGIN IMMEDIATE").await?;
        record_responses(&mut tx, attempt_id, &bank, responses).await?;
        let closed = finalize(&mut tx, attempt_id, &bank).await?;
        tx.commit().await?;

        log_closed(&closed);
        Ok(closed)
    }

    /// Lists a student's attempts, newest first, optionally for one quiz.
    pub async fn attempt_history(
        &self,
        student_id: i64,
        quiz_id: Option<i64>,
    ) -> Result<Vec<AttemptSummary>, AttemptError> {
        let rows = sqlx::query_as::<_, AttemptRow>(
            r#"
            SELECT id, student_id, quiz_id, start_time, end_time, score, passed
            FROM quiz_attempts
            WHERE student_id = ? AND (? IS NULL OR quiz_id = ?)
            ORDER BY start_time DESC, id DESC
            "#,
        )
        .bind(student_id)
        .bind(quiz_id)
        .bind(quiz_id)
        .fetch_all(&self.pool)
        .await?;

        summarize(rows)
    }

    /// An attempt with its recorded responses.
    ///
    /// Visible to the student who owns it and to the instructor of the quiz's
    /// course. Per-question correctness is withheld while the attempt is open.
    pub async fn attempt_detail(
        &self,
        viewer_id: i64,
        attempt_id: i64,
    ) -> Result<AttemptDetail, AttemptError> {
        let attempt = {
            let mut conn = self.pool.acquire().await?;
            fetch_attempt(&mut conn, attempt_id).await?
        };

        if attempt.student_id != viewer_id && !self.is_instructor(viewer_id, attempt.quiz_id).await? {
            return Err(StateError::NotOwner {
                attempt_id,
                user_id: viewer_id,
            }
            .into());
        }

        let rows = sqlx::query_as::<_, ResponseRow>(
            r#"
            SELECT r.id, r.question_id, r.text_response, r.is_correct
            FROM question_responses r
            JOIN questions q ON q.id = r.question_id
            WHERE r.attempt_id = ?
            ORDER BY q.display_order, r.id
            "#,
        )
        .bind(attempt_id)
        .fetch_all(&self.pool)
        .await?;

        let selections = sqlx::query_as::<_, SelectionRow>(
            r#"
            SELECT s.response_id, s.answer_id
            FROM response_selections s
            JOIN question_responses r ON r.id = s.response_id
            WHERE r.attempt_id = ?
            ORDER BY s.answer_id
            "#,
        )
        .bind(attempt_id)
        .fetch_all(&self.pool)
        .await?;

        let mut selected_by_response: HashMap<i64, Vec<i64>> = HashMap::new();
        for s in selections {
            selected_by_response
                .entry(s.response_id)
                .or_default()
                .push(s.answer_id);
        }

        let reveal = !attempt.is_open();
        let responses = rows
            .into_iter()
            .map(|r| RecordedResponse {
                question_id: r.question_id,
                selected: selected_by_response.remove(&r.id).unwrap_or_default(),
                text: r.text_response,
                is_correct: reveal.then_some(r.is_correct),
            })
            .collect();

        Ok(AttemptDetail {
            summary: AttemptSummary::from(&attempt),
            responses,
        })
    }

    /// Instructor report: every attempt on the quiz plus pass statistics.
    ///
    /// The pass rate counts open attempts as not passed; the average score
    /// only covers closed ones.
    pub async fn quiz_results(
        &self,
        viewer_id: i64,
        quiz_id: i64,
    ) -> Result<QuizResults, AttemptError> {
        if !self.is_instructor(viewer_id, quiz_id).await? {
            return Err(AttemptError::Forbidden {
                user_id: viewer_id,
                quiz_id,
            });
        }

        let rows = sqlx::query_as::<_, AttemptRow>(
            r#"
            SELECT id, student_id, quiz_id, start_time, end_time, score, passed
            FROM quiz_attempts
            WHERE quiz_id = ?
            ORDER BY start_time DESC, id DESC
            "#,
        )
        .bind(quiz_id)
        .fetch_all(&self.pool)
        .await?;

        let attempts = summarize(rows)?;
        let scores: Vec<f64> = attempts.iter().filter_map(|a| a.score_pct).collect();
        let passed_attempts = attempts.iter().filter(|a| a.passed == Some(true)).count();

        let pass_rate = if attempts.is_empty() {
            0.0
        } else {
            passed_attempts as f64 * 100.0 / attempts.len() as f64
        };
        let average_score = if scores.is_empty() {
            0.0
        } else {
            scores.iter().sum::<f64>() / scores.len() as f64
        };

        Ok(QuizResults {
            quiz_id,
            total_attempts: attempts.len(),
            open_attempts: attempts.len() - scores.len(),
            passed_attempts,
            pass_rate,
            average_score,
            attempts,
        })
    }

    /// The take-quiz view for an enrolled student (or the course instructor).
    pub async fn quiz_for_student(
        &self,
        viewer_id: i64,
        quiz_id: i64,
    ) -> Result<PublicQuiz, AttemptError> {
        let bank = self.load_bank(quiz_id).await?;
        let course_id = bank.quiz.course_id;

        let allowed = self.roster.is_enrolled(viewer_id, course_id).await?
            || self.roster.instructor_of(course_id).await? == Some(viewer_id);

        if !allowed {
            return Err(EligibilityError::NotEnrolled {
                student_id: viewer_id,
                course_id,
            }
            .into());
        }

        Ok(bank.public_view())
    }

    async fn load_bank(&self, quiz_id: i64) -> Result<QuizBank, AttemptError> {
        let mut conn = self.pool.acquire().await?;
        load_quiz(&mut conn, quiz_id).await
    }

    async fn owned_attempt(&self, student_id: i64, attempt_id: i64) -> Result<Attempt, AttemptError> {
        let mut conn = self.pool.acquire().await?;
        let attempt = fetch_attempt(&mut conn, attempt_id).await?;

        if attempt.student_id != student_id {
            tracing::warn!(
                "User {} tried to act on attempt {} owned by {}",
                student_id,
                attempt_id,
                attempt.student_id
            );
            return Err(StateError::NotOwner {
                attempt_id,
                user_id: student_id,
            }
            .into());
        }

        Ok(attempt)
    }

    async fn is_instructor(&self, user_id: i64, quiz_id: i64) -> Result<bool, AttemptError> {
        let course_id = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT m.course_id
            FROM quizzes q
            JOIN modules m ON m.id = q.module_id
            WHERE q.id = ?
            "#,
        )
        .bind(quiz_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AttemptError::QuizNotFound(quiz_id))?;

        Ok(self.roster.instructor_of(course_id).await? == Some(user_id))
    }
}

async fn fetch_attempt(conn: &mut SqliteConnection, attempt_id: i64) -> Result<Attempt, AttemptError> {
    let row = sqlx::query_as::<_, AttemptRow>(
        r#"
        SELECT id, student_id, quiz_id, start_time, end_time, score, passed
        FROM quiz_attempts
        WHERE id = ?
        "#,
    )
    .bind(attempt_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(AttemptError::AttemptNotFound(attempt_id))?;

    Ok(Attempt::try_from(row)?)
}

fn summarize(rows: Vec<AttemptRow>) -> Result<Vec<AttemptSummary>, AttemptError> {
    let mut summaries = Vec::with_capacity(rows.len());
    for row in rows {
        let attempt = Attempt::try_from(row)?;
        summaries.push(AttemptSummary::from(&attempt));
    }
    Ok(summaries)
}

/// Validates and evaluates a submission, then persists one response per question.
/// Returns the ids of the questions recorded.
async fn record_responses(
    conn: &mut SqliteConnection,
    attempt_id: i64,
    bank: &QuizBank,
    responses: &[SubmittedResponse],
) -> Result<Vec<i64>, AttemptError> {
    if !fetch_attempt(&mut *conn, attempt_id).await?.is_open() {
        return Err(StateError::NotOpen { attempt_id }.into());
    }

    let mut seen = HashSet::new();
    let mut evaluated = Vec::with_capacity(responses.len());

    for response in responses {
        let question_id = response.question_id;
        if !seen.insert(question_id) {
            return Err(ValidationError::DuplicateResponse { question_id }.into());
        }

        let question = bank
            .question(question_id)
            .ok_or(ValidationError::UnknownQuestion {
                question_id,
                quiz_id: bank.quiz.id,
            })?;

        let is_correct = evaluate(question, response)?;
        evaluated.push((question, response, is_correct));
    }

    let answered = sqlx::query_scalar::<_, i64>(
        "SELECT question_id FROM question_responses WHERE attempt_id = ?",
    )
    .bind(attempt_id)
    .fetch_all(&mut *conn)
    .await?;

    if let Some(question_id) = answered.into_iter().find(|id| seen.contains(id)) {
        return Err(ValidationError::AlreadyAnswered { question_id }.into());
    }

    let mut recorded = Vec::with_capacity(evaluated.len());
    for (question, response, is_correct) in evaluated {
        let text = match question.kind {
            QuestionKind::FreeText { .. } => response.text.trim(),
            _ => "",
        };

        let response_id =
            insert_response(&mut *conn, attempt_id, question.id, text, is_correct).await?;

        let selected: BTreeSet<i64> = response.selected.iter().copied().collect();
        for answer_id in selected {
            sqlx::query("INSERT INTO response_selections (response_id, answer_id) VALUES (?, ?)")
                .bind(response_id)
                .bind(answer_id)
                .execute(&mut *conn)
                .await?;
        }

        recorded.push(question.id);
    }

    Ok(recorded)
}

async fn insert_response(
    conn: &mut SqliteConnection,
    attempt_id: i64,
    question_id: i64,
    text: &str,
    is_correct: bool,
) -> Result<i64, AttemptError> {
    let result = sqlx::query(
        r#"
        INSERT INTO question_responses (attempt_id, question_id, text_response, is_correct)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(attempt_id)
    .bind(question_id)
    .bind(text)
    .bind(is_correct)
    .execute(&mut *conn)
    .await
    .map_err(|e| {
        let duplicate = e
            .as_database_error()
            .is_some_and(|db| db.is_unique_violation());
        if duplicate {
            AttemptError::from(ValidationError::AlreadyAnswered { question_id })
        } else {
            AttemptError::from(e)
        }
    })?;

    Ok(result.last_insert_rowid())
}

/// Grades every quiz question against the recorded responses and closes the attempt.
async fn finalize(
    conn: &mut SqliteConnection,
    attempt_id: i64,
    bank: &QuizBank,
) -> Result<ClosedAttempt, AttemptError> {
    let attempt = fetch_attempt(&mut *conn, attempt_id).await?;
    if !attempt.is_open() {
        return Err(IntegrityError::AlreadyClosed { attempt_id }.into());
    }

    let recorded: HashMap<i64, bool> = sqlx::query_as::<_, (i64, bool)>(
        "SELECT question_id, is_correct FROM question_responses WHERE attempt_id = ?",
    )
    .bind(attempt_id)
    .fetch_all(&mut *conn)
    .await?
    .into_iter()
    .collect();

    let graded = grade_questions(&bank.questions, &recorded);

    // unanswered questions are kept as empty, incorrect responses
    for item in graded.iter().filter(|g| !recorded.contains_key(&g.question_id)) {
        insert_response(&mut *conn, attempt_id, item.question_id, "", false).await?;
    }

    let verdict = aggregate(&GradingPolicy::for_quiz(&bank.quiz), &graded);
    let ended_at = Utc::now();

    let updated = sqlx::query(
        r#"
        UPDATE quiz_attempts
        SET end_time = ?, score = ?, passed = ?
        WHERE id = ? AND end_time IS NULL
        "#,
    )
    .bind(ended_at)
    .bind(verdict.score_pct)
    .bind(verdict.passed)
    .bind(attempt_id)
    .execute(&mut *conn)
    .await?
    .rows_affected();

    if updated != 1 {
        return Err(IntegrityError::AlreadyClosed { attempt_id }.into());
    }

    Ok(ClosedAttempt {
        attempt_id,
        quiz_id: attempt.quiz_id,
        ended_at,
        verdict,
    })
}

fn log_closed(closed: &ClosedAttempt) {
    tracing::info!(
        "Attempt {} on quiz {} closed: {}/{} points, score {:.2}%, passed={}",
        closed.attempt_id,
        closed.quiz_id,
        closed.verdict.earned_points,
        closed.verdict.total_points,
        closed.verdict.score_pct,
        closed.verdict.passed
    );
}
