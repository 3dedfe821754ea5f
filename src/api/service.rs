//! Request-level entry points
//!
//! [`TutorService`] wires the configured embedder, language model and index
//! into a [`Tutor`] and a [`QuizGenerator`] and exposes them through
//! serializable request and response types.

use crate::api::prompts::ConversationTurn;
use crate::api::quiz::QuizGenerator;
use crate::api::retriever::{RetrievalFilter, Retriever, ScoredChunk};
use crate::api::tutor::{SourceCitation, Tutor};
use crate::config::Config;
use crate::error::{Result, TutorError};
use crate::ml::{LanguageModel, build_embedder, build_language_model};
use crate::quiz::QuizQuestion;
use crate::storage::Topic;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A student question
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskRequest {
    pub question: String,
    pub grade: String,
    pub subject: String,
    #[serde(default)]
    pub history: Vec<ConversationTurn>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AskResponse {
    pub answer: String,
    pub sources: Vec<SourceCitation>,
}

/// A quiz request; `topic` names a chapter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizRequest {
    pub grade: String,
    pub subject: String,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub num_questions: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizResponse {
    pub quiz: Vec<QuizQuestion>,
}

pub struct TutorService {
    retriever: Option<Retriever>,
    tutor: Tutor,
    quiz_generator: QuizGenerator,
    default_questions: usize,
}

impl TutorService {
    /// Build the service from configuration
    ///
    /// An index that cannot be opened is logged and the service keeps
    /// running: answers and quizzes then degrade to their fallbacks.
    pub fn from_config(config: &Config) -> Result<Self> {
        let embedder = build_embedder(&config.embedding, &config.llm);
        let llm = build_language_model(&config.llm);

        let retriever = match Retriever::open(&config.index_path, embedder) {
            Ok(retriever) => Some(retriever),
            Err(e) => {
                log::error!("Index {} unavailable: {}", config.index_path.display(), e);
                None
            }
        };

        Self::with_parts(retriever, llm, config)
    }

    /// Assemble the service from already constructed parts
    pub fn with_parts(
        retriever: Option<Retriever>,
        llm: Arc<dyn LanguageModel>,
        config: &Config,
    ) -> Result<Self> {
        let (tutor, quiz_generator) = match &retriever {
            Some(retriever) => (
                Tutor::new(retriever.clone(), llm.clone(), &config.retrieval),
                QuizGenerator::new(retriever.clone(), llm, &config.retrieval)?,
            ),
            None => (
                Tutor::without_index(llm.clone(), &config.retrieval),
                QuizGenerator::without_index(llm, &config.retrieval)?,
            ),
        };

        Ok(Self {
            retriever,
            tutor,
            quiz_generator,
            default_questions: config.quiz.num_questions,
        })
    }

    pub fn has_index(&self) -> bool {
        self.retriever.is_some()
    }

    pub async fn ask(&self, request: &AskRequest) -> AskResponse {
        let result = self
            .tutor
            .answer(&request.question, &request.grade, &request.subject, &request.history)
            .await;

        AskResponse {
            answer: result.answer,
            sources: result.sources,
        }
    }

    /// Generate a quiz, keeping only questions whose answer key is among their options
    pub async fn quiz(&self, request: &QuizRequest) -> QuizResponse {
        let num_questions = request.num_questions.unwrap_or(self.default_questions);
        let questions = self
            .quiz_generator
            .quiz(
                &request.grade,
                &request.subject,
                request.topic.as_deref(),
                num_questions,
            )
            .await;

        let generated = questions.len();
        let quiz: Vec<QuizQuestion> = questions.into_iter().filter(|q| q.is_answerable()).collect();
        if quiz.len() < generated {
            log::warn!(
                "Dropped {} quiz questions with an unusable answer key",
                generated - quiz.len()
            );
        }

        QuizResponse { quiz }
    }

    /// Filtered similarity search with scores
    pub async fn search(&self, query: &str, filter: &RetrievalFilter, k: usize) -> Result<Vec<ScoredChunk>> {
        self.loaded()?.retrieve_scored(query, filter, k).await
    }

    /// Grades, subjects and chapters present in the index
    pub fn topics(&self) -> Result<Vec<Topic>> {
        Ok(self.loaded()?.index().topics())
    }

    fn loaded(&self) -> Result<&Retriever> {
        self.retriever
            .as_ref()
            .ok_or_else(|| TutorError::IndexUnavailable("no index loaded".to_string()))
    }
}
