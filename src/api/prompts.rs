//! Prompt construction for answering and quiz generation

use crate::text::Chunk;
use serde::{Deserialize, Serialize};

/// Speaker of a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn label(&self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Assistant => "Assistant",
        }
    }
}

/// One turn of the conversation transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
}

impl ConversationTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Shared fallback policy for casual and out-of-syllabus input
const FALLBACK_RULES: &str = "\
- If the student's message is casual conversation (a greeting, thanks, small talk), reply briefly and warmly like a teacher would, then invite them back to the subject.
- If the question belongs to the subject but the context below does not cover it, say clearly that it is beyond the scope of the syllabus for this grade instead of guessing.";

/// Render the transcript as one `Role: content` line per turn
pub fn render_transcript(history: &[ConversationTurn]) -> String {
    history
        .iter()
        .map(|turn| format!("{}: {}", turn.role.label(), turn.content.trim()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Join retrieved chunks into the context block
pub fn render_context(chunks: &[Chunk]) -> String {
    chunks
        .iter()
        .map(|chunk| chunk.text.trim())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Prompt for answering a student question from retrieved context
pub fn answer_prompt(
    grade: &str,
    subject: &str,
    history: &[ConversationTurn],
    chunks: &[Chunk],
    question: &str,
) -> String {
    let transcript = render_transcript(history);
    let transcript = if transcript.is_empty() {
        "(no previous messages)".to_string()
    } else {
        transcript
    };

    format!(
        "You are a friendly and patient tutor for Grade {grade} {subject} students.\n\n\
         Conversation so far:\n{transcript}\n\n\
         Answer the student's question using only the textbook context below.\n\
         {FALLBACK_RULES}\n\n\
         Context:\n{context}\n\n\
         Question: {question}\n\
         Answer:",
        context = render_context(chunks),
        question = question.trim(),
    )
}

/// Prompt requesting `num_questions` multiple-choice questions in the quiz grammar
pub fn quiz_prompt(
    grade: &str,
    subject: &str,
    chapter: Option<&str>,
    chunks: &[Chunk],
    num_questions: usize,
) -> String {
    let scope = match chapter {
        Some(chapter) => format!("the chapter \"{chapter}\""),
        None => "this subject".to_string(),
    };

    format!(
        "You are a tutor preparing a quiz for Grade {grade} {subject} students on {scope}.\n\n\
         Using only the textbook context below, write exactly {num_questions} multiple-choice questions.\n\
         Use exactly this format for every question, with no other text:\n\n\
         Q1. <question text>\n\
         A. <option>\n\
         B. <option>\n\
         C. <option>\n\
         D. <option>\n\
         Answer: <A, B, C or D>\n\n\
         Number the questions Q1, Q2, Q3 and so on. Do not start any question or option with the letter Q followed by a number.\n\
         {FALLBACK_RULES}\n\n\
         Context:\n{context}\n",
        context = render_context(chunks),
    )
}
