//! Tutor - retrieval-augmented question answering
//!
//! Failures never reach the caller: a missing index, a failed model call or
//! an unusable response all degrade to [`AnswerResult::fallback`].

use crate::api::prompts::{ConversationTurn, answer_prompt};
use crate::api::retriever::{RetrievalFilter, Retriever};
use crate::config::{MAX_EXCERPT_CHARS, RetrievalConfig};
use crate::error::{Result, TutorError};
use crate::ml::LanguageModel;
use crate::text::Chunk;
use crate::utils::truncate_chars;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// Answer returned when anything in the pipeline fails
pub const FALLBACK_ANSWER: &str = "Sorry, an error occurred while generating your answer.";

/// Where part of an answer came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceCitation {
    pub filename: String,
    pub page_number: u32,
    pub excerpt: String,
}

impl SourceCitation {
    /// Cite a chunk, keeping at most `excerpt_chars` characters of its text
    pub fn from_chunk(chunk: &Chunk, excerpt_chars: usize) -> Self {
        let filename = Path::new(&chunk.source_file)
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| chunk.source_file.clone());

        Self {
            filename,
            page_number: chunk.page_number,
            excerpt: truncate_chars(&chunk.text, excerpt_chars).to_string(),
        }
    }
}

/// Answer text plus its citations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerResult {
    pub answer: String,
    pub sources: Vec<SourceCitation>,
}

impl AnswerResult {
    pub fn fallback() -> Self {
        Self {
            answer: FALLBACK_ANSWER.to_string(),
            sources: Vec::new(),
        }
    }
}

/// Answers student questions from the textbook index
pub struct Tutor {
    retriever: Option<Retriever>,
    llm: Arc<dyn LanguageModel>,
    answer_k: usize,
    excerpt_chars: usize,
}

impl Tutor {
    pub fn new(retriever: Retriever, llm: Arc<dyn LanguageModel>, config: &RetrievalConfig) -> Self {
        Self {
            retriever: Some(retriever),
            llm,
            answer_k: config.answer_k,
            excerpt_chars: config.excerpt_chars.min(MAX_EXCERPT_CHARS),
        }
    }

    /// A tutor whose index could not be loaded; every answer is the fallback
    pub fn without_index(llm: Arc<dyn LanguageModel>, config: &RetrievalConfig) -> Self {
        Self {
            retriever: None,
            llm,
            answer_k: config.answer_k,
            excerpt_chars: config.excerpt_chars.min(MAX_EXCERPT_CHARS),
        }
    }

    /// Answer `question` for the given grade and subject
    pub async fn answer(
        &self,
        question: &str,
        grade: &str,
        subject: &str,
        history: &[ConversationTurn],
    ) -> AnswerResult {
        log::info!("Question for Grade {} {}: {}", grade, subject, question);

        match self.try_answer(question, grade, subject, history).await {
            Ok(result) => result,
            Err(e) => {
                log::error!("RAG pipeline failed: {}", e);
                AnswerResult::fallback()
            }
        }
    }

    async fn try_answer(
        &self,
        question: &str,
        grade: &str,
        subject: &str,
        history: &[ConversationTurn],
    ) -> Result<AnswerResult> {
        let retriever = self
            .retriever
            .as_ref()
            .ok_or_else(|| TutorError::IndexUnavailable("no index loaded".to_string()))?;

        let filter = RetrievalFilter::new(grade, subject);
        let chunks = retriever.retrieve(question, &filter, self.answer_k).await?;

        if chunks.is_empty() {
            log::warn!("No indexed content for Grade {} {}", grade, filter.subject);
            return Ok(AnswerResult {
                answer: beyond_syllabus(grade, subject),
                sources: Vec::new(),
            });
        }

        let prompt = answer_prompt(grade, &filter.subject, history, &chunks, question);
        log::debug!("Answer prompt:\n{}", prompt);

        let raw = self.llm.complete(&prompt).await?;
        let answer = extract_answer(&raw)?;

        let sources = chunks
            .iter()
            .map(|chunk| SourceCitation::from_chunk(chunk, self.excerpt_chars))
            .collect();

        Ok(AnswerResult { answer, sources })
    }
}

/// Reply used when nothing is indexed for the requested grade and subject
pub fn beyond_syllabus(grade: &str, subject: &str) -> String {
    format!(
        "That question is beyond the scope of the syllabus I have for Grade {} {}, so I can't answer it from the textbook.",
        grade, subject
    )
}

/// Pull the answer text out of a completion, dropping an echoed "Answer:" label
fn extract_answer(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    let answer = trimmed
        .strip_prefix("Answer:")
        .map(str::trim)
        .unwrap_or(trimmed);

    if answer.is_empty() {
        return Err(TutorError::ModelInvocation("Model returned an empty answer".to_string()));
    }
    Ok(answer.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_citation_truncates_excerpt() {
        let chunk = Chunk {
            text: "x".repeat(1000),
            grade: "11".to_string(),
            subject: "physics".to_string(),
            chapter: "chapter1".to_string(),
            source_file: "data/grade_11/physics/chapter1.pdf".to_string(),
            page_number: 7,
        };
        let citation = SourceCitation::from_chunk(&chunk, 300);
        assert_eq!(citation.filename, "chapter1.pdf");
        assert_eq!(citation.page_number, 7);
        assert_eq!(citation.excerpt.chars().count(), 300);
    }

    #[test]
    fn test_extract_answer() {
        assert_eq!(extract_answer("  Answer: Mass times acceleration. ").unwrap(), "Mass times acceleration.");
        assert_eq!(extract_answer("Inertia.").unwrap(), "Inertia.");
        assert!(extract_answer("Answer:   ").is_err());
    }

    #[test]
    fn test_fallback() {
        let fallback = AnswerResult::fallback();
        assert!(fallback.answer.starts_with("Sorry, an error occurred"));
        assert!(fallback.sources.is_empty());
    }
}
