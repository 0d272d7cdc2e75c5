// src/services/question_bank.rs

//! Read side of the quiz catalog.
//!
//! Rows are assembled into tagged [`QuestionKind`] variants once, at load
//! time, and checked against the bank invariants so the evaluator never has
//! to deal with an ungradable question.

use std::collections::{HashMap, HashSet};

use sqlx::SqliteConnection;

use crate::{
    config::DEFAULT_PASS_PERCENTAGE,
    models::quiz::{
        CandidateAnswer, CandidateRow, Modality, PublicOption, PublicQuestion, PublicQuiz,
        Question, QuestionKind, QuestionRow, Quiz, QuizRow,
    },
    services::{
        error::{AttemptError, IntegrityError},
        grading::GradingPolicy,
    },
};

/// A quiz and its questions, ordered by display order.
#[derive(Debug, Clone)]
pub struct QuizBank {
    pub quiz: Quiz,
    pub questions: Vec<Question>,
}

impl QuizBank {
    pub fn from_rows(
        quiz: QuizRow,
        questions: Vec<QuestionRow>,
        candidates: Vec<CandidateRow>,
    ) -> Result<Self, IntegrityError> {
        let threshold = quiz.required_score_to_pass.unwrap_or(DEFAULT_PASS_PERCENTAGE);
        let policy = GradingPolicy::new(threshold).ok_or(IntegrityError::InvalidPassThreshold {
            quiz_id: quiz.id,
            value: threshold,
        })?;

        let mut by_question: HashMap<i64, Vec<CandidateAnswer>> = HashMap::new();
        for row in candidates {
            by_question.entry(row.question_id).or_default().push(CandidateAnswer {
                id: row.id,
                text: row.text,
                is_correct: row.is_correct,
            });
        }

        let mut seen_orders = HashSet::new();
        let mut assembled = Vec::with_capacity(questions.len());

        for row in questions {
            let malformed = |reason: String| IntegrityError::MalformedQuestion {
                question_id: row.id,
                reason,
            };

            let modality: Modality = row.question_type.parse().map_err(malformed)?;

            let points = u32::try_from(row.points)
                .ok()
                .filter(|p| *p > 0)
                .ok_or_else(|| malformed(format!("point weight {} is not positive", row.points)))?;

            let display_order = u32::try_from(row.display_order)
                .map_err(|_| malformed(format!("display order {} is negative", row.display_order)))?;

            if !seen_orders.insert(display_order) {
                return Err(malformed(format!(
                    "display order {} is used twice in quiz {}",
                    display_order, row.quiz_id
                )));
            }

            let kind = assemble_kind(modality, by_question.remove(&row.id).unwrap_or_default())
                .map_err(malformed)?;

            assembled.push(Question {
                id: row.id,
                quiz_id: row.quiz_id,
                text: row.text,
                points,
                display_order,
                kind,
            });
        }

        assembled.sort_by_key(|q| q.display_order);

        Ok(QuizBank {
            quiz: Quiz {
                id: quiz.id,
                module_id: quiz.module_id,
                course_id: quiz.course_id,
                title: quiz.title,
                description: quiz.description,
                time_limit_minutes: u32::try_from(quiz.time_limit).unwrap_or(0),
                required_pass_percentage: policy.required_pass_percentage(),
            },
            questions: assembled,
        })
    }

    pub fn question(&self, question_id: i64) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == question_id)
    }

    /// The take-quiz payload. Correctness flags and accepted free-text answers are dropped.
    pub fn public_view(&self) -> PublicQuiz {
        PublicQuiz {
            id: self.quiz.id,
            title: self.quiz.title.clone(),
            description: self.quiz.description.clone(),
            time_limit_minutes: self.quiz.time_limit_minutes,
            required_pass_percentage: self.quiz.required_pass_percentage,
            questions: self
                .questions
                .iter()
                .map(|q| PublicQuestion {
                    id: q.id,
                    modality: q.kind.modality(),
                    text: q.text.clone(),
                    points: q.points,
                    order: q.display_order,
                    options: q
                        .kind
                        .candidates()
                        .iter()
                        .map(|c| PublicOption {
                            id: c.id,
                            text: c.text.clone(),
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}

fn assemble_kind(
    modality: Modality,
    candidates: Vec<CandidateAnswer>,
) -> Result<QuestionKind, String> {
    if candidates.is_empty() {
        return Err("question has no candidate answers".to_string());
    }

    let correct = candidates.iter().filter(|c| c.is_correct).count();

    match modality {
        Modality::MultipleSelect => {
            if correct == 0 {
                return Err("multiple-select question has no correct answer".to_string());
            }
            Ok(QuestionKind::MultipleSelect { candidates })
        }
        Modality::SingleSelect | Modality::TrueFalse => {
            if correct != 1 {
                return Err(format!(
                    "{} question must have exactly one correct answer, found {}",
                    modality, correct
                ));
            }
            if modality == Modality::SingleSelect {
                Ok(QuestionKind::SingleSelect { candidates })
            } else {
                Ok(QuestionKind::TrueFalse { candidates })
            }
        }
        Modality::FreeText => {
            let accepted: Vec<String> = candidates
                .into_iter()
                .filter(|c| c.is_correct && !c.text.trim().is_empty())
                .map(|c| c.text)
                .collect();
            if accepted.is_empty() {
                return Err("free-text question has no accepted answer".to_string());
            }
            Ok(QuestionKind::FreeText { accepted })
        }
    }
}

/// Loads a quiz with its questions and candidate answers.
pub async fn load_quiz(
    conn: &mut SqliteConnection,
    quiz_id: i64,
) -> Result<QuizBank, AttemptError> {
    let quiz = sqlx::query_as::<_, QuizRow>(
        r#"
        SELECT
            q.id,
            q.module_id,
            m.course_id,
            q.title,
            q.description,
            q.time_limit,
            q.required_score_to_pass
        FROM quizzes q
        JOIN modules m ON m.id = q.module_id
        WHERE q.id = ?
        "#,
    )
    .bind(quiz_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(AttemptError::QuizNotFound(quiz_id))?;

    let questions = sqlx::query_as::<_, QuestionRow>(
        r#"
        SELECT id, quiz_id, text, question_type, points, display_order
        FROM questions
        WHERE quiz_id = ?
        ORDER BY display_order, id
        "#,
    )
    .bind(quiz_id)
    .fetch_all(&mut *conn)
    .await?;

    let candidates = sqlx::query_as::<_, CandidateRow>(
        r#"
        SELECT a.id, a.question_id, a.text, a.is_correct
        FROM answers a
        JOIN questions q ON q.id = a.question_id
        WHERE q.quiz_id = ?
        ORDER BY a.id
        "#,
    )
    .bind(quiz_id)
    .fetch_all(&mut *conn)
    .await?;

    let bank = QuizBank::from_rows(quiz, questions, candidates).map_err(|e| {
        tracing::error!("Quiz {} failed bank validation: {}", quiz_id, e);
        e
    })?;

    Ok(bank)
}
