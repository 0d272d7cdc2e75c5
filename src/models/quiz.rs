// src/models/quiz.rs

use std::{fmt, str::FromStr};

use serde::Serialize;
use sqlx::FromRow;

/// Row from the `quizzes` table joined with the owning module's course.
#[derive(Debug, Clone, FromRow)]
pub struct QuizRow {
    pub id: i64,
    pub module_id: i64,
    pub course_id: i64,
    pub title: String,
    pub description: String,
    /// Advisory time limit in minutes. Not enforced by the engine.
    pub time_limit: i64,
    pub required_score_to_pass: Option<f64>,
}

/// Represents the 'questions' table in the database.
#[derive(Debug, Clone, FromRow)]
pub struct QuestionRow {
    pub id: i64,
    pub quiz_id: i64,
    pub text: String,
    /// Modality tag, see [`Modality`].
    pub question_type: String,
    pub points: i64,
    pub display_order: i64,
}

/// Represents the 'answers' table in the database.
#[derive(Debug, Clone, FromRow)]
pub struct CandidateRow {
    pub id: i64,
    pub question_id: i64,
    pub text: String,
    pub is_correct: bool,
}

/// Quiz metadata once its threshold has been resolved and checked.
#[derive(Debug, Clone, Serialize)]
pub struct Quiz {
    pub id: i64,
    pub module_id: i64,
    pub course_id: i64,
    pub title: String,
    pub description: String,
    pub time_limit_minutes: u32,
    pub required_pass_percentage: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Modality {
    MultipleSelect,
    SingleSelect,
    TrueFalse,
    FreeText,
}

impl Modality {
    pub fn as_str(self) -> &'static str {
        match self {
            Modality::MultipleSelect => "multiple_select",
            Modality::SingleSelect => "single_select",
            Modality::TrueFalse => "true_false",
            Modality::FreeText => "free_text",
        }
    }
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Modality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "multiple_select" => Ok(Modality::MultipleSelect),
            "single_select" => Ok(Modality::SingleSelect),
            "true_false" => Ok(Modality::TrueFalse),
            "free_text" => Ok(Modality::FreeText),
            other => Err(format!("unknown question type '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateAnswer {
    pub id: i64,
    pub text: String,
    pub is_correct: bool,
}

/// Answer format of a question together with the data needed to grade it.
#[derive(Debug, Clone, PartialEq)]
pub enum QuestionKind {
    /// Correct only when exactly the correct-flagged set is selected.
    MultipleSelect { candidates: Vec<CandidateAnswer> },
    SingleSelect { candidates: Vec<CandidateAnswer> },
    TrueFalse { candidates: Vec<CandidateAnswer> },
    /// Accepted strings, matched case-insensitively after trimming.
    FreeText { accepted: Vec<String> },
}

impl QuestionKind {
    pub fn modality(&self) -> Modality {
        match self {
            QuestionKind::MultipleSelect { .. } => Modality::MultipleSelect,
            QuestionKind::SingleSelect { .. } => Modality::SingleSelect,
            QuestionKind::TrueFalse { .. } => Modality::TrueFalse,
            QuestionKind::FreeText { .. } => Modality::FreeText,
        }
    }

    /// Selectable options. Free-text questions have none.
    pub fn candidates(&self) -> &[CandidateAnswer] {
        match self {
            QuestionKind::MultipleSelect { candidates }
            | QuestionKind::SingleSelect { candidates }
            | QuestionKind::TrueFalse { candidates } => candidates,
            QuestionKind::FreeText { .. } => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Question {
    pub id: i64,
    pub quiz_id: i64,
    pub text: String,
    pub points: u32,
    pub display_order: u32,
    pub kind: QuestionKind,
}

/// DTO for sending a quiz to a student (excludes correctness and accepted answers).
#[derive(Debug, Serialize)]
pub struct PublicQuiz {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub time_limit_minutes: u32,
    pub required_pass_percentage: f64,
    pub questions: Vec<PublicQuestion>,
}

#[derive(Debug, Serialize)]
pub struct PublicQuestion {
    pub id: i64,
    #[serde(rename = "type")]
    pub modality: Modality,
    pub text: String,
    pub points: u32,
    pub order: u32,
    pub options: Vec<PublicOption>,
}

#[derive(Debug, Serialize)]
pub struct PublicOption {
    pub id: i64,
    pub text: String,
}
