//! Concierge binary - composition root.
//!
//! 1. Load `.env` and configuration
//! 2. Open SQLite for contact details and appointments
//! 3. Load, split and embed the document corpus
//! 4. Build the LLM client and chatbot
//! 5. Run the terminal chat loop

mod cli;
mod console;

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use clap::Parser;

use concierge_chat::ChatBot;
use concierge_core::config::ConciergeConfig;
use concierge_core::ConciergeError;
use concierge_llm::OpenAiCompatibleClient;
use concierge_storage::Database;
use concierge_vector::{
    DocumentLoader, DocumentStore, DynEmbeddingService, HashEmbedding, OnnxEmbeddingService,
    RecursiveTextSplitter,
};

use cli::{expand_home, CliArgs};
use console::{Console, LineSource};

/// Build the configured embedding backend.
fn embedding_backend(config: &ConciergeConfig) -> Result<Arc<dyn DynEmbeddingService>, ConciergeError> {
    match config.embedding.backend.as_str() {
        "onnx" => {
            let dir = expand_home(&config.embedding.model_dir);
            let service = OnnxEmbeddingService::from_directory(&dir)?;
            tracing::info!(model_dir = %dir.display(), "ONNX embedding model loaded");
            Ok(Arc::new(service))
        }
        "hash" => Ok(Arc::new(HashEmbedding::new(config.embedding.dimensions))),
        other => Err(ConciergeError::Config(format!(
            "unknown embedding backend: {}",
            other
        ))),
    }
}

/// Load every document under `dir` into a fresh store.
async fn build_store(config: &ConciergeConfig, dir: &Path) -> Result<DocumentStore, ConciergeError> {
    let splitter =
        RecursiveTextSplitter::new(config.documents.chunk_size, config.documents.chunk_overlap)?;
    let store = DocumentStore::new(embedding_backend(config)?, splitter);

    let documents = DocumentLoader::new(dir, &config.documents.extensions).load()?;
    if documents.is_empty() {
        tracing::warn!(dir = %dir.display(), "No documents found; answers will lack context");
    }
    let report = store.ingest(&documents).await?;
    tracing::info!(
        documents = report.documents,
        chunks = report.chunks,
        "Document store ready"
    );
    Ok(store)
}

/// Read lines from `input` and answer them until `quit` or end of input.
///
/// A failed turn is reported to the user and the loop carries on.
async fn chat_loop<S, W>(bot: &ChatBot, input: &S, out: &mut W) -> std::io::Result<()>
where
    S: LineSource + ?Sized,
    W: Write,
{
    writeln!(out, "Chatbot initialized. Type 'quit' to exit.")?;

    loop {
        write!(out, "You: ")?;
        out.flush()?;
        let Some(line) = input.next_line().await? else {
            break;
        };

        let query = line.trim();
        if query.eq_ignore_ascii_case("quit") {
            break;
        }
        if query.is_empty() {
            continue;
        }

        match bot.process_query(query).await {
            Ok(reply) => writeln!(out, "Bot: {}", reply)?,
            Err(e) => {
                tracing::warn!(error = %e, "Turn failed");
                writeln!(
                    out,
                    "Bot: I encountered an error processing your query. Please try again. Error: {}",
                    e
                )?;
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let args = CliArgs::parse();

    // Config.
    let config_file = args.resolve_config_path();
    let mut config = ConciergeConfig::load_or_default(&config_file);
    args.apply(&mut config);
    config.validate()?;

    // Tracing: RUST_LOG wins over flag and config.
    let level = args.resolve_log_level(&config.general.log_level);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&level)),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Starting concierge v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration resolved");

    // Storage.
    let data_dir = expand_home(&config.general.data_dir);
    if let Err(e) = std::fs::create_dir_all(&data_dir) {
        tracing::error!(path = %data_dir.display(), error = %e, "Failed to create data directory");
        return Err(e.into());
    }
    let db_path = data_dir.join("concierge.db");
    let db = Arc::new(Database::new(&db_path)?);
    tracing::info!(path = %db_path.display(), "SQLite database opened");

    // Documents.
    let documents_dir = args.resolve_documents_dir(&config.documents.dir);
    let store = Arc::new(build_store(&config, &documents_dir).await?);

    // LLM.
    let llm = Arc::new(OpenAiCompatibleClient::from_config(&config.llm)?);
    tracing::info!(
        provider = %config.llm.provider,
        model = %config.llm.model,
        "LLM client ready"
    );

    let console = Console::new();
    let bot = ChatBot::new(&config, db, store, llm, Arc::new(console.clone()));

    chat_loop(&bot, &console, &mut std::io::stdout()).await?;
    tracing::info!("Goodbye");
    Ok(())
}
