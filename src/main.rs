//! textbook-tutor CLI application
//!
//! Command-line interface for the textbook-tutor library.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use textbook_tutor::ml::build_embedder;
use textbook_tutor::{
    AskRequest, Config, ConversationTurn, DocumentIngestor, IndexBuilder, QuizRequest,
    RetrievalFilter, TutorService,
};

#[derive(Parser)]
#[command(name = "textbook-tutor")]
#[command(about = "A retrieval-augmented tutor that answers questions and writes quizzes from textbooks")]
#[command(version)]
struct Cli {
    /// JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest the textbook tree and (re)build the similarity index
    BuildIndex {
        /// Root directory laid out as grade_<N>/<subject>/<chapter>.pdf
        #[arg(short, long)]
        data_dir: Option<PathBuf>,

        /// Output index file (SQLite database)
        #[arg(short, long)]
        index: Option<PathBuf>,
    },

    /// Ask the tutor a question
    Ask {
        #[arg(short, long)]
        grade: String,

        #[arg(short, long)]
        subject: String,

        /// Conversation history file (JSON: [{"role": "user", "content": "..."}])
        #[arg(long)]
        history: Option<PathBuf>,

        /// The student's question
        question: String,
    },

    /// Generate a multiple-choice quiz
    Quiz {
        #[arg(short, long)]
        grade: String,

        #[arg(short, long)]
        subject: String,

        /// Chapter to draw questions from
        #[arg(short, long)]
        topic: Option<String>,

        /// Number of questions to request
        #[arg(short = 'n', long)]
        num_questions: Option<usize>,
    },

    /// Search the index without calling the language model
    Search {
        #[arg(short, long)]
        grade: String,

        #[arg(short, long)]
        subject: String,

        #[arg(long)]
        chapter: Option<String>,

        /// Search query
        query: String,

        /// Number of results to return
        #[arg(short = 'k', long, default_value = "4")]
        top_k: usize,
    },

    /// List the grades, subjects and chapters in the index
    Topics,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    env_logger::init();

    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Commands::BuildIndex { data_dir, index } => {
            if let Some(data_dir) = data_dir {
                config.data_dir = data_dir;
            }
            if let Some(index) = index {
                config.index_path = index;
            }
            build_index_command(&config).await?;
        }
        Commands::Ask {
            grade,
            subject,
            history,
            question,
        } => {
            let history = match history {
                Some(path) => load_history(&path)?,
                None => Vec::new(),
            };
            let service = TutorService::from_config(&config)?;
            let response = service
                .ask(&AskRequest {
                    question,
                    grade,
                    subject,
                    history,
                })
                .await;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Commands::Quiz {
            grade,
            subject,
            topic,
            num_questions,
        } => {
            let service = TutorService::from_config(&config)?;
            let response = service
                .quiz(&QuizRequest {
                    grade,
                    subject,
                    topic,
                    num_questions,
                })
                .await;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Commands::Search {
            grade,
            subject,
            chapter,
            query,
            top_k,
        } => {
            search_command(&config, grade, subject, chapter, query, top_k).await?;
        }
        Commands::Topics => {
            let service = TutorService::from_config(&config)?;
            println!("{}", serde_json::to_string_pretty(&service.topics()?)?);
        }
    }

    Ok(())
}

async fn build_index_command(config: &Config) -> anyhow::Result<()> {
    println!("📚 Ingesting textbooks from {}...", config.data_dir.display());

    let ingestor = DocumentIngestor::new(config.chunking.clone())?;
    let report = ingestor
        .ingest_dir(&config.data_dir)
        .with_context(|| format!("Failed to ingest {}", config.data_dir.display()))?;

    println!(
        "📄 {} files processed, {} skipped, {} chunks",
        report.files_processed,
        report.files_skipped,
        report.chunks.len()
    );

    let embedder = build_embedder(&config.embedding, &config.llm);
    let stats = IndexBuilder::new(embedder, config.embedding.batch_size)
        .with_progress(true)
        .build(&report.chunks, &config.index_path)
        .await
        .with_context(|| format!("Failed to build index {}", config.index_path.display()))?;

    println!("✅ Index build complete!");
    println!("   📊 Chunks: {}", stats.total_chunks);
    println!("   📐 Dimension: {}", stats.dimension);
    println!("   ⏱️  Time: {:.2}s", stats.processing_time);
    println!("   📋 Index: {} ({} bytes)", config.index_path.display(), stats.index_file_size);

    Ok(())
}

async fn search_command(
    config: &Config,
    grade: String,
    subject: String,
    chapter: Option<String>,
    query: String,
    top_k: usize,
) -> anyhow::Result<()> {
    println!("🔍 Searching for: \"{}\"", query);

    let service = TutorService::from_config(config)?;
    let mut filter = RetrievalFilter::new(grade, subject);
    if let Some(chapter) = chapter {
        filter = filter.with_chapter(chapter);
    }

    let results = service.search(&query, &filter, top_k).await?;

    if results.is_empty() {
        println!("❌ No results found");
        return Ok(());
    }

    println!("📋 Found {} results:", results.len());
    println!();

    for (i, result) in results.iter().enumerate() {
        println!(
            "{}. Score: {:.3} ({} p.{})",
            i + 1,
            result.score,
            result.chunk.source_file,
            result.chunk.page_number
        );
        println!("   {}", textbook_tutor::utils::truncate_chars(&result.chunk.text, 300));
        println!();
    }

    Ok(())
}

fn load_history(path: &Path) -> anyhow::Result<Vec<ConversationTurn>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read history file {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Invalid conversation history in {}", path.display()))
}
