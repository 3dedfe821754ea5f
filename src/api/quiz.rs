//! QuizGenerator - chapter-scoped multiple-choice quiz generation

use crate::api::prompts::quiz_prompt;
use crate::api::retriever::{RetrievalFilter, Retriever};
use crate::api::tutor::beyond_syllabus;
use crate::config::RetrievalConfig;
use crate::error::{Result, TutorError};
use crate::ml::LanguageModel;
use crate::quiz::{QuizParser, QuizQuestion};
use std::sync::Arc;

/// Raw quiz text returned when generation fails
pub const QUIZ_ERROR_TEXT: &str = "Error generating quiz.";

/// Generates quiz text from retrieved chapter content
pub struct QuizGenerator {
    retriever: Option<Retriever>,
    llm: Arc<dyn LanguageModel>,
    parser: QuizParser,
    quiz_k: usize,
}

impl QuizGenerator {
    pub fn new(retriever: Retriever, llm: Arc<dyn LanguageModel>, config: &RetrievalConfig) -> Result<Self> {
        Ok(Self {
            retriever: Some(retriever),
            llm,
            parser: QuizParser::new()?,
            quiz_k: config.quiz_k,
        })
    }

    /// A generator whose index could not be loaded; every quiz is the error text
    pub fn without_index(llm: Arc<dyn LanguageModel>, config: &RetrievalConfig) -> Result<Self> {
        Ok(Self {
            retriever: None,
            llm,
            parser: QuizParser::new()?,
            quiz_k: config.quiz_k,
        })
    }

    /// Raw model output for a quiz of `num_questions` questions
    ///
    /// When `chapter` is `None` the quiz draws on the whole subject.
    pub async fn generate_quiz(
        &self,
        grade: &str,
        subject: &str,
        chapter: Option<&str>,
        num_questions: usize,
    ) -> String {
        log::info!(
            "Quiz request: Grade {} {} chapter {:?} ({} questions)",
            grade,
            subject,
            chapter,
            num_questions
        );

        match self.try_generate(grade, subject, chapter, num_questions).await {
            Ok(text) => text,
            Err(e) => {
                log::error!("Quiz generation failed: {}", e);
                QUIZ_ERROR_TEXT.to_string()
            }
        }
    }

    /// Generate and parse a quiz
    pub async fn quiz(
        &self,
        grade: &str,
        subject: &str,
        chapter: Option<&str>,
        num_questions: usize,
    ) -> Vec<QuizQuestion> {
        let raw = self.generate_quiz(grade, subject, chapter, num_questions).await;
        self.parser.parse(&raw)
    }

    async fn try_generate(
        &self,
        grade: &str,
        subject: &str,
        chapter: Option<&str>,
        num_questions: usize,
    ) -> Result<String> {
        if num_questions == 0 {
            return Err(TutorError::Config("num_questions must be positive".to_string()));
        }

        let retriever = self
            .retriever
            .as_ref()
            .ok_or_else(|| TutorError::IndexUnavailable("no index loaded".to_string()))?;

        let mut filter = RetrievalFilter::new(grade, subject);
        if let Some(chapter) = chapter {
            filter = filter.with_chapter(chapter);
        }

        let query = chapter.unwrap_or(filter.subject.as_str()).to_string();
        let chunks = retriever.retrieve(&query, &filter, self.quiz_k).await?;

        if chunks.is_empty() {
            log::warn!("No indexed content for quiz filter {:?}", filter);
            return Ok(beyond_syllabus(grade, subject));
        }

        let prompt = quiz_prompt(grade, &filter.subject, chapter, &chunks, num_questions);
        log::debug!("Quiz prompt:\n{}", prompt);

        self.llm.complete(&prompt).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::retriever::VectorIndex;
    use crate::ml::{Embedder, HashingEmbedder};
    use crate::storage::IndexEntry;
    use crate::text::Chunk;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Returns a canned reply and records the prompts it was given
    struct ScriptedModel {
        reply: Result<String>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedModel {
        fn replying(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(reply.to_string()),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                reply: Err(TutorError::ModelInvocation("quota exceeded".to_string())),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl LanguageModel for ScriptedModel {
        async fn complete(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(e) => Err(TutorError::ModelInvocation(e.to_string())),
            }
        }
    }

    async fn retriever() -> Retriever {
        let embedder = HashingEmbedder::new(128);
        let chunks = vec![
            Chunk {
                text: "Motion in a straight line: displacement, velocity and acceleration.".to_string(),
                grade: "11".to_string(),
                subject: "physics".to_string(),
                chapter: "chapter1".to_string(),
                source_file: "data/grade_11/physics/chapter1.pdf".to_string(),
                page_number: 1,
            },
            Chunk {
                text: "Work, energy and power.".to_string(),
                grade: "11".to_string(),
                subject: "physics".to_string(),
                chapter: "chapter2".to_string(),
                source_file: "data/grade_11/physics/chapter2.pdf".to_string(),
                page_number: 1,
            },
        ];
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = embedder.embed_documents(&texts).await.unwrap();
        let entries = chunks
            .into_iter()
            .zip(vectors)
            .map(|(chunk, vector)| IndexEntry { vector, chunk })
            .collect();
        let index = VectorIndex::from_entries(entries, embedder.model_id());
        Retriever::new(Arc::new(index), Arc::new(embedder)).unwrap()
    }

    const TWO_QUESTIONS: &str = "Q1. What is velocity?\nA. Rate of change of displacement\nB. Mass\nC. Force\nD. Energy\nAnswer: A\n\nQ2. Unit of acceleration?\nA. m/s\nB. m/s²\nC. N\nD. J\nAnswer: B\n";

    #[tokio::test]
    async fn test_quiz_uses_chapter_context() {
        let model = ScriptedModel::replying(TWO_QUESTIONS);
        let generator = QuizGenerator::new(retriever().await, model.clone(), &RetrievalConfig::default()).unwrap();

        let questions = generator.quiz("11", "Physics", Some("chapter1"), 3).await;
        assert_eq!(questions.len(), 2);

        let prompts = model.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("exactly 3 multiple-choice questions"));
        assert!(prompts[0].contains("Motion in a straight line"));
        assert!(!prompts[0].contains("Work, energy and power"));
    }

    #[tokio::test]
    async fn test_unknown_chapter_is_beyond_syllabus() {
        let model = ScriptedModel::replying(TWO_QUESTIONS);
        let generator = QuizGenerator::new(retriever().await, model.clone(), &RetrievalConfig::default()).unwrap();

        let raw = generator.generate_quiz("11", "physics", Some("chapter9"), 5).await;
        assert!(raw.contains("beyond the scope of the syllabus"));
        assert_eq!(model.calls(), 0);
        assert!(generator.quiz("11", "physics", Some("chapter9"), 5).await.is_empty());
    }

    #[tokio::test]
    async fn test_model_failure_returns_error_text() {
        let generator =
            QuizGenerator::new(retriever().await, ScriptedModel::failing(), &RetrievalConfig::default()).unwrap();
        let raw = generator.generate_quiz("11", "physics", Some("chapter1"), 5).await;
        assert_eq!(raw, QUIZ_ERROR_TEXT);
    }

    #[tokio::test]
    async fn test_missing_index_returns_error_text() {
        let model = ScriptedModel::replying(TWO_QUESTIONS);
        let generator = QuizGenerator::without_index(model.clone(), &RetrievalConfig::default()).unwrap();
        assert_eq!(generator.generate_quiz("11", "physics", None, 5).await, QUIZ_ERROR_TEXT);
        assert!(generator.quiz("11", "physics", None, 5).await.is_empty());
        assert_eq!(model.calls(), 0);
    }
}
