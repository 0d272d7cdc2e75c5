// src/services/grading.rs

use std::collections::HashMap;

use serde::Serialize;

use crate::models::quiz::{Question, Quiz};

/// Pass threshold applied by [`aggregate`]. Point weights come from the questions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradingPolicy {
    required_pass_percentage: f64,
}

impl GradingPolicy {
    /// Returns `None` unless the threshold lies in `[0, 100]`.
    pub fn new(required_pass_percentage: f64) -> Option<Self> {
        (0.0..=100.0)
            .contains(&required_pass_percentage)
            .then_some(Self {
                required_pass_percentage,
            })
    }

    /// Quizzes are only constructed with a checked threshold.
    pub fn for_quiz(quiz: &Quiz) -> Self {
        Self {
            required_pass_percentage: quiz.required_pass_percentage,
        }
    }

    pub fn required_pass_percentage(&self) -> f64 {
        self.required_pass_percentage
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GradedQuestion {
    pub question_id: i64,
    pub points: u32,
    pub correct: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Verdict {
    pub earned_points: u64,
    pub total_points: u64,
    pub score_pct: f64,
    pub passed: bool,
}

/// Pairs every question of the quiz with its recorded correctness.
///
/// A question with no recorded response is graded incorrect and earns nothing.
/// Leaving a question unanswered is never an error.
pub fn grade_questions(questions: &[Question], recorded: &HashMap<i64, bool>) -> Vec<GradedQuestion> {
    questions
        .iter()
        .map(|q| GradedQuestion {
            question_id: q.id,
            points: q.points,
            correct: recorded.get(&q.id).copied().unwrap_or(false),
        })
        .collect()
}

/// Combines graded questions into a weighted percentage and a verdict.
///
/// A quiz without points scores 0. Meeting the threshold exactly passes.
pub fn aggregate(policy: &GradingPolicy, graded: &[GradedQuestion]) -> Verdict {
    let total_points: u64 = graded.iter().map(|g| u64::from(g.points)).sum();
    let earned_points: u64 = graded
        .iter()
        .filter(|g| g.correct)
        .map(|g| u64::from(g.points))
        .sum();

    let score_pct = if total_points > 0 {
        earned_points as f64 * 100.0 / total_points as f64
    } else {
        0.0
    };

    Verdict {
        earned_points,
        total_points,
        score_pct,
        passed: score_pct >= policy.required_pass_percentage,
    }
}
