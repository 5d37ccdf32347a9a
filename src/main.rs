use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use pdf_keyword_indexer::cache::{KeywordCache, MemoryCache};
use pdf_keyword_indexer::config::Config;
use pdf_keyword_indexer::events::{next_event, Notifier};
use pdf_keyword_indexer::index::indexed_page_count;
use pdf_keyword_indexer::llm::{OllamaBackend, DEFAULT_PROMPT};
use pdf_keyword_indexer::orchestrator::index_pages;
use pdf_keyword_indexer::pdf::{extract_pdf, validate_pdf_path, PdfExtractParser};
use pdf_keyword_indexer::{
    format_index, Divider, IndexerError, JobQueue, KeywordExtractor, Orchestrator, OutputFormat,
};

/// pdf_keyword_indexer — Build a page-indexed keyword list from a PDF document.
///
/// Every page is sent to a local LLM (via Ollama) that extracts technical
/// terms; the results are merged into a sorted "keyword: [pages]" index.
#[derive(Parser)]
#[command(name = "pdf_keyword_indexer")]
#[command(version = "0.1.0")]
#[command(about = "Extract and index keywords from a PDF document using AI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract keywords from a PDF and print or save the index
    Index {
        /// Path to the PDF file
        #[arg(value_name = "FILE_PATH")]
        file_path: PathBuf,

        /// Output file path (prints to stdout when omitted)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Custom system prompt
        #[arg(long)]
        prompt: Option<String>,

        /// Output format: plain (txt) or structured (json)
        #[arg(long, default_value = "plain")]
        format: OutputFormat,

        /// Page divider (e.g. 9 means 9 original pages = 1 indexed page)
        #[arg(long)]
        divider: Option<Divider>,

        /// Keep extracted keywords in memory only, skipping the on-disk cache
        #[arg(long)]
        no_cache: bool,
    },

    /// Run extraction as a background job and stream its events as JSON lines
    Job {
        /// Path to the PDF file
        #[arg(value_name = "FILE_PATH")]
        file_path: PathBuf,

        /// Custom system prompt
        #[arg(long)]
        prompt: Option<String>,

        /// Page divider (e.g. 9 means 9 original pages = 1 indexed page)
        #[arg(long)]
        divider: Option<Divider>,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();

    let result = match cli.command {
        Commands::Index {
            file_path,
            output,
            prompt,
            format,
            divider,
            no_cache,
        } => {
            let options = IndexOptions {
                output,
                prompt,
                format,
                divider,
                no_cache,
            };
            index_command(&config, &file_path, options).await
        }
        Commands::Job {
            file_path,
            prompt,
            divider,
        } => job_command(&config, &file_path, prompt, divider).await,
    };

    if let Err(e) = result {
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }
}

struct IndexOptions {
    output: Option<PathBuf>,
    prompt: Option<String>,
    format: OutputFormat,
    divider: Option<Divider>,
    no_cache: bool,
}

fn build_extractor(config: &Config, no_cache: bool) -> Result<KeywordExtractor> {
    let backend = OllamaBackend::from_config(config)?;
    let cache: Arc<dyn KeywordCache> = if no_cache {
        Arc::new(MemoryCache::new())
    } else {
        config.open_cache()?
    };
    Ok(KeywordExtractor::new(Arc::new(backend), cache))
}

async fn index_command(config: &Config, file_path: &Path, options: IndexOptions) -> Result<()> {
    validate_pdf_path(file_path)?;

    println!("  Processing PDF: {}", file_path.display());
    if let Some(d) = options.divider {
        println!(
            "  Using page divider: {} (every {} original pages = 1 indexed page)",
            d, d
        );
    }
    println!();

    let extractor = build_extractor(config, options.no_cache)?;

    let path = file_path.to_path_buf();
    let document = tokio::task::spawn_blocking(move || extract_pdf(&PdfExtractParser, &path))
        .await
        .context("Page extraction task panicked")??;
    let pages = document.pages;

    if pages.is_empty() {
        return Err(IndexerError::NoContent(file_path.display().to_string()).into());
    }
    println!("  Found {} pages with text content", pages.len());

    let progress = ProgressBar::new(pages.len() as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("  [{bar:40}] {pos}/{len} pages")
            .context("Invalid progress bar template")?,
    );

    let prompt = options.prompt.as_deref().unwrap_or(DEFAULT_PROMPT);
    let index = index_pages(&extractor, &pages, prompt, options.divider, |done, _| {
        progress.set_position(done as u64);
    })
    .await;
    progress.finish();
    println!();

    println!("  Extraction completed! Found {} unique keywords.", index.len());
    if let Some(d) = options.divider {
        println!(
            "  Original pages: {} → Indexed pages: {}",
            document.page_count,
            indexed_page_count(document.page_count, Some(d))
        );
    }

    let content = format_index(&index, options.format)?;

    match options.output {
        Some(output) => {
            std::fs::write(&output, &content)
                .with_context(|| format!("Failed to write index to {}", output.display()))?;
            println!("  Index saved to: {}", output.display());
        }
        None => {
            println!();
            println!("{}", content);
        }
    }

    Ok(())
}

async fn job_command(
    config: &Config,
    file_path: &Path,
    prompt: Option<String>,
    divider: Option<Divider>,
) -> Result<()> {
    validate_pdf_path(file_path)?;

    // The job deletes its source when done, so hand it a private copy.
    let staged = stage_copy(file_path)?;

    let extractor = build_extractor(config, false)?;
    let orchestrator = Orchestrator::new(Arc::new(PdfExtractParser), extractor, Arc::new(Notifier::new()));
    let queue = JobQueue::new(Arc::new(orchestrator));

    let mut job = queue.submit(staged, prompt, divider);
    eprintln!("  Session: {}", job.session_id);

    while let Some(event) = next_event(&mut job.events).await {
        println!("{}", serde_json::to_string(&event)?);
        if event.is_terminal() {
            break;
        }
    }

    job.handle
        .await
        .context("Indexing job panicked")??;

    Ok(())
}

fn stage_copy(file_path: &Path) -> Result<PathBuf> {
    let staged = tempfile::Builder::new()
        .prefix("pdf-index-")
        .suffix(".pdf")
        .tempfile()
        .context("Failed to create temporary file")?;

    std::fs::copy(file_path, staged.path())
        .with_context(|| format!("Failed to copy {}", file_path.display()))?;

    let path = staged
        .into_temp_path()
        .keep()
        .context("Failed to keep temporary file")?;
    Ok(path)
}
