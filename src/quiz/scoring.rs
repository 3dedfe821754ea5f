//! Quiz grading

use crate::quiz::{OPTION_KEYS, QuizQuestion};
use serde::{Deserialize, Serialize};

/// Outcome for one question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionResult {
    /// Normalized letter the student picked, if any
    pub selected: Option<String>,
    pub correct_answer: String,
    pub selected_text: Option<String>,
    pub correct_text: Option<String>,
    pub is_correct: bool,
}

/// Outcome for a whole quiz
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizScore {
    pub correct: usize,
    pub total: usize,
    pub results: Vec<QuestionResult>,
}

/// Reduce a selection like `"b. Joule"` or `" C "` to its option letter
pub fn normalize_selection(selection: &str) -> Option<String> {
    let letter = selection
        .split('.')
        .next()
        .unwrap_or_default()
        .trim()
        .to_uppercase();
    OPTION_KEYS.contains(&letter.as_str()).then_some(letter)
}

/// Grade `selections` against `questions`, position by position
///
/// Missing selections count as wrong. Questions whose answer key is not
/// among their options can never be answered correctly.
pub fn score_quiz(questions: &[QuizQuestion], selections: &[Option<String>]) -> QuizScore {
    let results: Vec<QuestionResult> = questions
        .iter()
        .enumerate()
        .map(|(i, question)| {
            let selected = selections
                .get(i)
                .and_then(|s| s.as_deref())
                .and_then(normalize_selection);
            let correct_answer = question.correct_answer.trim().to_uppercase();
            let is_correct = question.is_answerable()
                && selected.as_deref() == Some(correct_answer.as_str());

            QuestionResult {
                selected_text: selected
                    .as_ref()
                    .and_then(|key| question.options.get(key).cloned()),
                correct_text: question.options.get(&correct_answer).cloned(),
                selected,
                correct_answer,
                is_correct,
            }
        })
        .collect();

    QuizScore {
        correct: results.iter().filter(|r| r.is_correct).count(),
        total: questions.len(),
        results,
    }
}
