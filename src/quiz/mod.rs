//! Quiz data model, parsing and scoring
//!
//! Quizzes arrive from the language model as free text in the
//! `Q<n>. … A. … D. … Answer: X` layout. The parser is deliberately lenient;
//! [`QuizQuestion::validate`] reports what a strict consumer should reject.

pub mod parser;
pub mod scoring;

pub use parser::QuizParser;
pub use scoring::{QuestionResult, QuizScore, normalize_selection, score_quiz};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Option letters in display order
pub const OPTION_KEYS: [&str; 4] = ["A", "B", "C", "D"];

/// One multiple-choice question
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub question: String,

    /// Option letter (A–D) to option text
    pub options: BTreeMap<String, String>,

    /// Letter of the correct option; empty when the model gave none
    #[serde(rename = "answer", alias = "correct_answer")]
    pub correct_answer: String,
}

/// Problems found in a parsed question
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizIssue {
    /// Fewer or more than four options were found
    OptionCount(usize),
    /// No `Answer:` line was found
    MissingAnswer,
    /// The answer letter has no matching option
    AnswerNotAmongOptions(String),
}

impl std::fmt::Display for QuizIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuizIssue::OptionCount(n) => write!(f, "expected 4 options, found {}", n),
            QuizIssue::MissingAnswer => write!(f, "no answer key"),
            QuizIssue::AnswerNotAmongOptions(key) => {
                write!(f, "answer key {} is not among the options", key)
            }
        }
    }
}

impl QuizQuestion {
    /// Everything wrong with this question; empty when well formed
    pub fn validate(&self) -> Vec<QuizIssue> {
        let mut issues = Vec::new();
        if self.options.len() != OPTION_KEYS.len() {
            issues.push(QuizIssue::OptionCount(self.options.len()));
        }
        if self.correct_answer.is_empty() {
            issues.push(QuizIssue::MissingAnswer);
        } else if !self.options.contains_key(&self.correct_answer) {
            issues.push(QuizIssue::AnswerNotAmongOptions(self.correct_answer.clone()));
        }
        issues
    }

    pub fn is_well_formed(&self) -> bool {
        self.validate().is_empty()
    }

    /// Whether the answer key can ever be matched by a selection
    pub fn is_answerable(&self) -> bool {
        self.options.contains_key(&self.correct_answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(options: &[(&str, &str)], answer: &str) -> QuizQuestion {
        QuizQuestion {
            question: "What is the SI unit of force?".to_string(),
            options: options
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            correct_answer: answer.to_string(),
        }
    }

    #[test]
    fn test_well_formed_question() {
        let q = question(&[("A", "Newton"), ("B", "Joule"), ("C", "Watt"), ("D", "Pascal")], "A");
        assert!(q.is_well_formed());
        assert!(q.is_answerable());
    }

    #[test]
    fn test_answer_not_among_options() {
        let q = question(&[("A", "Newton"), ("B", "Joule"), ("C", "Watt")], "D");
        let issues = q.validate();
        assert!(issues.contains(&QuizIssue::OptionCount(3)));
        assert!(issues.contains(&QuizIssue::AnswerNotAmongOptions("D".to_string())));
        assert!(!q.is_answerable());
    }

    #[test]
    fn test_missing_answer() {
        let q = question(&[("A", "1"), ("B", "2"), ("C", "3"), ("D", "4")], "");
        assert_eq!(q.validate(), vec![QuizIssue::MissingAnswer]);
    }

    #[test]
    fn test_serializes_answer_field() {
        let q = question(&[("A", "Newton")], "A");
        let json = serde_json::to_value(&q).unwrap();
        assert_eq!(json["answer"], "A");
        assert_eq!(json["options"]["A"], "Newton");

        let back: QuizQuestion = serde_json::from_str(
            r#"{"question": "q", "options": {"A": "x"}, "correct_answer": "A"}"#,
        )
        .unwrap();
        assert_eq!(back.correct_answer, "A");
    }
}
