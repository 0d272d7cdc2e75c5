// src/services/evaluator.rs

use std::collections::BTreeSet;

use crate::{
    models::{
        attempt::SubmittedResponse,
        quiz::{CandidateAnswer, Question, QuestionKind},
    },
    services::error::ValidationError,
};

/// Decides whether a submitted response answers the question correctly.
///
/// Pure: no persistence, no clock. Selected ids that are not options of the
/// question are rejected rather than graded as wrong.
///
/// * Multiple-select: the selection must equal the correct-flagged set.
/// * Single-select / true-false: exactly one id, and it is the correct one.
/// * Free-text: trimmed, case-insensitive exact match against any accepted answer.
pub fn evaluate(question: &Question, response: &SubmittedResponse) -> Result<bool, ValidationError> {
    let selected: BTreeSet<i64> = response.selected.iter().copied().collect();

    match &question.kind {
        QuestionKind::MultipleSelect { candidates } => {
            ensure_known(question.id, candidates, &selected)?;
            let correct: BTreeSet<i64> = candidates
                .iter()
                .filter(|c| c.is_correct)
                .map(|c| c.id)
                .collect();
            Ok(selected == correct)
        }
        QuestionKind::SingleSelect { candidates } | QuestionKind::TrueFalse { candidates } => {
            ensure_known(question.id, candidates, &selected)?;
            if selected.len() != 1 {
                return Ok(false);
            }
            Ok(candidates
                .iter()
                .any(|c| c.is_correct && selected.contains(&c.id)))
        }
        QuestionKind::FreeText { accepted } => {
            if !selected.is_empty() {
                return Err(ValidationError::SelectionNotAllowed {
                    question_id: question.id,
                });
            }
            Ok(matches_accepted(&response.text, accepted))
        }
    }
}

fn ensure_known(
    question_id: i64,
    candidates: &[CandidateAnswer],
    selected: &BTreeSet<i64>,
) -> Result<(), ValidationError> {
    match selected
        .iter()
        .find(|id| !candidates.iter().any(|c| c.id == **id))
    {
        Some(&candidate_id) => Err(ValidationError::UnknownCandidate {
            question_id,
            candidate_id,
        }),
        None => Ok(()),
    }
}

fn matches_accepted(submitted: &str, accepted: &[String]) -> bool {
    let answer = submitted.trim().to_lowercase();
    accepted
        .iter()
        .any(|expected| expected.trim().to_lowercase() == answer)
}
