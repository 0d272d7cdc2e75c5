// src/services/error.rs

//! Failure taxonomy of the attempt engine.
//!
//! Errors are grouped by what the caller can do about them: eligibility
//! failures are user-correctable, state failures indicate client misuse,
//! validation failures reject a submission before anything is persisted, and
//! integrity failures abort the operation outright.

use thiserror::Error;

/// The student may not start an attempt on this quiz.
#[derive(Debug, Error, PartialEq)]
pub enum EligibilityError {
    #[error("student {student_id} is not enrolled in course {course_id}")]
    NotEnrolled { student_id: i64, course_id: i64 },

    #[error("student {student_id} has already passed quiz {quiz_id}")]
    AlreadyPassed { student_id: i64, quiz_id: i64 },
}

/// The attempt exists but cannot be used by this caller in its current state.
#[derive(Debug, Error, PartialEq)]
pub enum StateError {
    #[error("attempt {attempt_id} is not open")]
    NotOpen { attempt_id: i64 },

    #[error("attempt {attempt_id} does not belong to user {user_id}")]
    NotOwner { attempt_id: i64, user_id: i64 },
}

/// A submitted response is malformed with respect to the question bank.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("answer {candidate_id} is not an option of question {question_id}")]
    UnknownCandidate { question_id: i64, candidate_id: i64 },

    #[error("question {question_id} expects a free-text answer, not selected options")]
    SelectionNotAllowed { question_id: i64 },

    #[error("question {question_id} is not part of quiz {quiz_id}")]
    UnknownQuestion { question_id: i64, quiz_id: i64 },

    #[error("question {question_id} appears more than once in the submission")]
    DuplicateResponse { question_id: i64 },

    #[error("question {question_id} has already been answered in this attempt")]
    AlreadyAnswered { question_id: i64 },
}

#[derive(Debug, Error, PartialEq)]
pub enum IntegrityError {
    #[error("attempt {attempt_id} is already closed")]
    AlreadyClosed { attempt_id: i64 },

    #[error("question {question_id} is malformed: {reason}")]
    MalformedQuestion { question_id: i64, reason: String },

    #[error("quiz {quiz_id} has an invalid pass threshold {value}")]
    InvalidPassThreshold { quiz_id: i64, value: f64 },

    #[error("attempt {attempt_id} has a partially recorded closure")]
    CorruptAttempt { attempt_id: i64 },
}

#[derive(Debug, Error)]
pub enum AttemptError {
    #[error(transparent)]
    Eligibility(#[from] EligibilityError),

    #[error(transparent)]
    State(#[from] StateError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Integrity(#[from] IntegrityError),

    #[error("user {user_id} may not view quiz {quiz_id}")]
    Forbidden { user_id: i64, quiz_id: i64 },

    #[error("quiz {0} not found")]
    QuizNotFound(i64),

    #[error("attempt {0} not found")]
    AttemptNotFound(i64),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}
