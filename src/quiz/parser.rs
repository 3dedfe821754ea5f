//! Quiz text parser
//!
//! Splits model output into question blocks at each `Q<n>.` marker that
//! opens a line (a `Q` inside question or option text never does), then
//! reads each block as: question body up to the first `A.` option marker,
//! options `A.`–`D.` each running to the next marker or `Answer:`, and the
//! answer letter from `Answer: X`. Text before the first block (preambles,
//! conversational replies) is ignored.

use crate::error::{Result, TutorError};
use crate::quiz::QuizQuestion;
use regex::Regex;
use std::collections::BTreeMap;

const ANSWER_LABEL: &str = "Answer:";

/// Lenient parser for the quiz text layout
pub struct QuizParser {
    block_regex: Regex,
    option_regex: Regex,
    answer_regex: Regex,
}

impl QuizParser {
    pub fn new() -> Result<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern)
                .map_err(|e| TutorError::Generic(format!("Failed to compile quiz regex: {}", e)))
        };

        Ok(Self {
            block_regex: compile(r"(?m)^[ \t]*Q[ \t]*\d+[ \t]*[.):]")?,
            option_regex: compile(r"(?:^|\s)([A-D])\.")?,
            answer_regex: compile(r"Answer:\s*([A-D])")?,
        })
    }

    /// Parse every block; malformed blocks are logged and skipped
    pub fn parse(&self, raw_text: &str) -> Vec<QuizQuestion> {
        let starts: Vec<(usize, usize)> = self
            .block_regex
            .find_iter(raw_text)
            .map(|m| (m.start(), m.end()))
            .collect();

        let mut questions = Vec::new();
        for (i, &(_, body_start)) in starts.iter().enumerate() {
            let body_end = starts.get(i + 1).map(|&(start, _)| start).unwrap_or(raw_text.len());
            let block = &raw_text[body_start..body_end];

            match self.parse_block(block) {
                Ok(question) => {
                    for issue in question.validate() {
                        log::warn!("Quiz question {}: {}", i + 1, issue);
                    }
                    questions.push(question);
                }
                Err(e) => log::warn!("Skipping quiz block {}: {}", i + 1, e),
            }
        }

        questions
    }

    /// Parse a single block (the text following a `Q<n>.` marker)
    pub fn parse_block(&self, block: &str) -> Result<QuizQuestion> {
        let answer_pos = block.find(ANSWER_LABEL).unwrap_or(block.len());

        // (letter, marker start, text start)
        let markers: Vec<(&str, usize, usize)> = self
            .option_regex
            .captures_iter(&block[..answer_pos])
            .filter_map(|caps| {
                let letter = caps.get(1)?;
                Some((letter.as_str(), letter.start(), letter.end() + 1))
            })
            .collect();

        let first_a = markers
            .iter()
            .position(|(letter, _, _)| *letter == "A")
            .ok_or_else(|| TutorError::QuizParseSkip("no option A found".to_string()))?;

        let question = block[..markers[first_a].1].trim().to_string();

        let mut options = BTreeMap::new();
        let option_markers = &markers[first_a..];
        for (i, &(letter, _, text_start)) in option_markers.iter().enumerate() {
            let text_end = option_markers
                .get(i + 1)
                .map(|&(_, start, _)| start)
                .unwrap_or(answer_pos);
            options
                .entry(letter.to_string())
                .or_insert_with(|| block[text_start..text_end].trim().to_string());
        }

        let correct_answer = self
            .answer_regex
            .captures(block)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .unwrap_or_default();

        Ok(QuizQuestion {
            question,
            options,
            correct_answer,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIVE_QUESTIONS: &str = "\
Q1. What is the SI unit of force?
A. Newton
B. Joule
C. Watt
D. Pascal
Answer: A

Q2. Which quantity is a vector?
A. Speed
B. Mass
C. Velocity
D. Time
Answer: C

Q3. What is the acceleration due to gravity near Earth's surface?
A. 1.6 m/s²
B. 9.8 m/s²
C. 3.0 m/s²
D. 15 m/s²
Answer: B

Q4. Which law states that every action has an equal and opposite reaction?
A. Newton's first law
B. Newton's second law
C. Newton's third law
D. Hooke's law
Answer: C

Q5. What does the slope of a velocity-time graph represent?
A. Displacement
B. Distance
C. Speed
D. Acceleration
Answer: D
";

    fn parser() -> QuizParser {
        QuizParser::new().unwrap()
    }

    #[test]
    fn test_parse_five_well_formed_questions() {
        let questions = parser().parse(FIVE_QUESTIONS);
        assert_eq!(questions.len(), 5);
        for q in &questions {
            assert_eq!(q.options.len(), 4);
            assert!(["A", "B", "C", "D"].contains(&q.correct_answer.as_str()));
            assert!(q.is_well_formed());
        }

        assert_eq!(questions[0].question, "What is the SI unit of force?");
        assert_eq!(questions[0].options["A"], "Newton");
        assert_eq!(questions[2].options["B"], "9.8 m/s²");
        assert_eq!(questions[4].correct_answer, "D");
    }

    #[test]
    fn test_parse_empty_text() {
        assert!(parser().parse("").is_empty());
    }

    #[test]
    fn test_parse_is_deterministic() {
        let p = parser();
        assert_eq!(p.parse(FIVE_QUESTIONS), p.parse(FIVE_QUESTIONS));
    }

    #[test]
    fn test_fewer_blocks_than_requested_are_not_padded() {
        let raw = "Here is your quiz.\n\nQ1. What is 2+2?\nA. 3\nB. 4\nC. 5\nD. 6\nAnswer: B\n\nQ2. What is 3+3?\nA. 6\nB. 7\nC. 8\nD. 9\nAnswer: A\n";
        let questions = parser().parse(raw);
        assert_eq!(questions.len(), 2);
        assert_eq!(questions[1].question, "What is 3+3?");
    }

    #[test]
    fn test_conversational_reply_yields_nothing() {
        let raw = "Hello! Quizzes are a great way to revise. Which chapter would you like to practise?";
        assert!(parser().parse(raw).is_empty());
    }

    #[test]
    fn test_missing_answer_defaults_to_empty() {
        let questions = parser().parse("Q1. Pick one\nA. x\nB. y\nC. z\nD. w\n");
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].correct_answer, "");
        assert_eq!(questions[0].options["D"], "w");
    }

    #[test]
    fn test_incomplete_options_are_kept() {
        let questions = parser().parse("Q1. Pick one\nA. x\nB. y\nAnswer: D");
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].options.len(), 2);
        assert_eq!(questions[0].correct_answer, "D");
        assert!(!questions[0].is_answerable());
    }

    #[test]
    fn test_block_without_options_is_skipped() {
        let raw = "Q1. Broken block with no options\nQ2. Real one\nA. a\nB. b\nC. c\nD. d\nAnswer: C";
        let questions = parser().parse(raw);
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].question, "Real one");
    }

    #[test]
    fn test_inline_options_and_words_ending_in_option_letters() {
        let raw = "Q1. Which molecule carries genetic information in DNA. viruses? A. RNA. B. DNA C. ATP D. NADH Answer: B";
        let questions = parser().parse(raw);
        assert_eq!(questions.len(), 1);
        assert_eq!(
            questions[0].question,
            "Which molecule carries genetic information in DNA. viruses?"
        );
        assert_eq!(questions[0].options["A"], "RNA.");
        assert_eq!(questions[0].options["B"], "DNA");
        assert_eq!(questions[0].options["D"], "NADH");
        assert_eq!(questions[0].correct_answer, "B");
    }

    #[test]
    fn test_words_starting_with_q_do_not_split_blocks() {
        let raw = "Q1. Quartz is mostly made of which compound?\nA. Quicklime\nB. Silica\nC. Salt\nD. Sugar\nAnswer: B";
        let questions = parser().parse(raw);
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].options["A"], "Quicklime");
    }

    #[test]
    fn test_symbol_q_inside_question_stays_in_question() {
        let raw = "Q1. A capacitor holds charge Q. What happens to its energy if the voltage doubles?\nA. Halves\nB. Unchanged\nC. Quadruples\nD. Doubles\nAnswer: C";
        let questions = parser().parse(raw);
        assert_eq!(questions.len(), 1);
        assert_eq!(
            questions[0].question,
            "A capacitor holds charge Q. What happens to its energy if the voltage doubles?"
        );
        assert_eq!(questions[0].correct_answer, "C");
        assert!(questions[0].is_well_formed());
    }

    #[test]
    fn test_symbol_q_inside_option_stays_in_option() {
        let raw = "Q1. Two identical spheres with charges Q and 3Q touch. What charge does each carry?\nA. Q/2\nB. 2Q.\nC. 3Q\nD. 4Q\nAnswer: B";
        let questions = parser().parse(raw);
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].options["A"], "Q/2");
        assert_eq!(questions[0].options["B"], "2Q.");
        assert_eq!(questions[0].options["D"], "4Q");
        assert_eq!(questions[0].correct_answer, "B");
        assert!(questions[0].is_answerable());
    }
}
