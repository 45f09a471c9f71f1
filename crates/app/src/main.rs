use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use pdf_chat_core::{
    discover_pdf_files, read_upload, ChatEngine, ChatMode, GenerationOptions, InMemoryVectorIndex,
    IngestionReport, NgramLanguageModel, PdfUpload, RetrievalCoordinator, RetrievalOptions,
    SentenceEmbedder,
};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "pdf-chat", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Directory holding the local embedding model artifact.
    #[arg(long, env = "PDF_CHAT_EMBEDDING_MODEL")]
    embedding_model: PathBuf,

    /// Path to the local language model weights file.
    #[arg(long, env = "PDF_CHAT_LANGUAGE_MODEL")]
    language_model: PathBuf,

    /// Number of nearest pages assembled into the context string.
    #[arg(long, default_value = "3")]
    top_k: usize,

    /// Decoding length bound for free-form generation.
    #[arg(long, default_value = "200")]
    max_new_tokens: usize,

    /// Sampling temperature for free-form generation.
    #[arg(long, default_value = "0.7")]
    temperature: f32,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive session: upload the given PDFs, then chat.
    Chat {
        /// PDF files or folders to ingest before the first query.
        pdfs: Vec<PathBuf>,
    },
    /// Ingest PDFs and answer a single query.
    Query {
        /// Query to answer from the indexed pages.
        #[arg(long)]
        query: String,
        /// PDF files or folders to ingest.
        pdfs: Vec<PathBuf>,
    },
    /// Free-form generation from a raw prompt, no retrieval involved.
    Generate {
        /// Prompt passed verbatim to the language model.
        #[arg(long)]
        prompt: String,
    },
}

type Engine = ChatEngine<SentenceEmbedder, InMemoryVectorIndex, NgramLanguageModel>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_version = env!("CARGO_PKG_VERSION");

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();

    // Both models load exactly once, before any input is accepted; a bad
    // path is fatal here rather than mid-session.
    let embedder = SentenceEmbedder::load(&cli.embedding_model).with_context(|| {
        format!(
            "failed to load embedding model from {}",
            cli.embedding_model.display()
        )
    })?;
    let generator = NgramLanguageModel::load(&cli.language_model).with_context(|| {
        format!(
            "failed to load language model from {}",
            cli.language_model.display()
        )
    })?;

    let retrieval = RetrievalCoordinator::with_options(
        embedder,
        InMemoryVectorIndex::new(),
        RetrievalOptions { top_k: cli.top_k },
    );
    let mut engine = ChatEngine::with_options(
        retrieval,
        generator,
        GenerationOptions {
            max_new_tokens: cli.max_new_tokens,
            temperature: cli.temperature,
        },
    );

    info!(
        version = app_version,
        started_at = %Utc::now().to_rfc3339(),
        "pdf-chat boot"
    );

    match cli.command {
        Command::Chat { pdfs } => {
            if !pdfs.is_empty() {
                upload_paths(&engine, &pdfs).await?;
            }
            run_chat_loop(&mut engine).await?;
        }
        Command::Query { query, pdfs } => {
            upload_paths(&engine, &pdfs).await?;
            engine.set_mode(ChatMode::ChatWithPdfs);
            let entry = engine
                .submit(&query)
                .await
                .map_err(|error| anyhow::anyhow!(error.to_string()))?;
            println!("{}", entry.response);
        }
        Command::Generate { prompt } => {
            engine.set_mode(ChatMode::AskAnything);
            let entry = engine
                .submit(&prompt)
                .await
                .map_err(|error| anyhow::anyhow!(error.to_string()))?;
            println!("{}", entry.response);
        }
    }

    Ok(())
}

/// Collects uploads from file and folder arguments and hands them to the
/// engine. Unreadable and unparseable files are warned about and
/// skipped; the batch keeps going.
async fn upload_paths(engine: &Engine, paths: &[PathBuf]) -> anyhow::Result<IngestionReport> {
    let mut uploads: Vec<PdfUpload> = Vec::new();

    for path in paths {
        if path.is_dir() {
            for pdf in discover_pdf_files(path) {
                read_into(&mut uploads, &pdf);
            }
        } else {
            read_into(&mut uploads, path);
        }
    }

    let report = engine
        .upload(&uploads)
        .await
        .map_err(|error| anyhow::anyhow!(error.to_string()))?;

    for skipped in &report.skipped_files {
        warn!(name = %skipped.name, reason = %skipped.reason, "skipped pdf");
    }

    if report.is_empty() {
        println!("0 pages indexed (no readable PDF content in this batch)");
    } else {
        info!(page_count = report.pages.len(), "indexed upload batch");
        println!(
            "{} pages indexed at {}",
            report.pages.len(),
            Utc::now().to_rfc3339()
        );
    }

    Ok(report)
}

fn read_into(uploads: &mut Vec<PdfUpload>, path: &Path) {
    match read_upload(path) {
        Ok(upload) => uploads.push(upload),
        Err(error) => warn!(path = %path.display(), reason = %error, "skipped unreadable file"),
    }
}

async fn run_chat_loop(engine: &mut Engine) -> anyhow::Result<()> {
    println!("mode: {}", engine.mode().label());
    println!("commands: :mode ask|chat|compare, :upload <path>, :transcript, :reset, :quit");

    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();

        if line.is_empty() {
            continue;
        }

        if let Some(command) = line.strip_prefix(':') {
            if !handle_command(engine, command).await? {
                break;
            }
            continue;
        }

        match engine.submit(line).await {
            Ok(entry) => println!("{}", entry.response),
            // Per-query failures are shown inline; the session, its
            // transcript, and the index all survive.
            Err(error) => eprintln!("error: {error}"),
        }
    }

    Ok(())
}

async fn handle_command(engine: &mut Engine, command: &str) -> anyhow::Result<bool> {
    let mut parts = command.split_whitespace();
    match parts.next() {
        Some("quit") => return Ok(false),
        Some("reset") => {
            engine.reset();
            println!("transcript cleared");
        }
        Some("transcript") => {
            for entry in engine.session().transcript() {
                println!("[{}] user: {}", entry.asked_at.to_rfc3339(), entry.query);
                println!("bot: {}", entry.response);
            }
        }
        Some("mode") => match parts.next() {
            Some("ask") => set_mode(engine, ChatMode::AskAnything),
            Some("chat") => set_mode(engine, ChatMode::ChatWithPdfs),
            Some("compare") => set_mode(engine, ChatMode::ComparePdfs),
            _ => println!("usage: :mode ask|chat|compare"),
        },
        Some("upload") => {
            let paths: Vec<PathBuf> = parts.map(PathBuf::from).collect();
            if paths.is_empty() {
                println!("usage: :upload <path> [path ...]");
            } else {
                upload_paths(engine, &paths).await?;
            }
        }
        _ => println!("unknown command: :{command}"),
    }

    Ok(true)
}

fn set_mode(engine: &mut Engine, mode: ChatMode) {
    engine.set_mode(mode);
    println!("mode: {}", mode.label());
}
