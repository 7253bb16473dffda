use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use civic_digest::config::{self, SummaryMethod};
use civic_digest::extraction::PdfSource;
use civic_digest::summarization::ModelHandle;
use civic_digest::{DocumentPipeline, SummaryRequest, logging};
use clap::{Parser, Subcommand};
use futures_util::{StreamExt, stream};
use serde::Serialize;
use walkdir::WalkDir;

#[derive(Parser)]
#[command(
    name = "civic-digest",
    about = "Summarize government PDFs and web pages into short digests"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Summarize a PDF and/or web page.
    Summarize {
        /// PDF URL or local path.
        #[arg(long)]
        pdf: Option<String>,
        /// Web page URL.
        #[arg(long)]
        url: Option<String>,
        /// Sentences for extractive methods; token hint for abstractive.
        #[arg(long)]
        length: Option<usize>,
        /// abstractive, extractive-weighted, or extractive-basic.
        #[arg(long, value_parser = parse_method)]
        method: Option<SummaryMethod>,
    },
    /// Summarize meeting documents, preferring the agenda narrative.
    Agenda {
        /// Agenda and memo PDFs, tried in order.
        #[arg(required = true)]
        sources: Vec<String>,
        /// Meeting date as it should read in the summary.
        #[arg(long)]
        date: String,
        /// Topics used when nothing more specific is found.
        #[arg(long, value_delimiter = ',', default_value = "Budget,Contracts,Procurement,Finance")]
        fallback_topics: Vec<String>,
    },
    /// Summarize every PDF under a directory, one JSON line per document.
    Batch {
        /// Directory to walk.
        dir: PathBuf,
        /// abstractive, extractive-weighted, or extractive-basic.
        #[arg(long, value_parser = parse_method)]
        method: Option<SummaryMethod>,
    },
}

#[derive(Serialize)]
struct BatchLine<'a> {
    path: String,
    content_hash: String,
    summary: &'a str,
    key_phrases: &'a [String],
}

fn parse_method(value: &str) -> Result<SummaryMethod, String> {
    value
        .parse()
        .map_err(|_| format!("unknown summary method '{value}'"))
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = config::init_config().context("Failed to load configuration")?;
    logging::init_tracing();
    tracing::debug!(
        summary_method = ?config.summary_method,
        provider = ?config.summarization_provider,
        model = %config.summarization_model,
        toolkit = ?config.nlp_toolkit,
        "Loaded configuration"
    );

    let model = Arc::new(ModelHandle::load(config).await);
    let pipeline = DocumentPipeline::from_config(config, model)
        .context("Failed to construct document pipeline")?;

    match cli.command {
        Command::Summarize {
            pdf,
            url,
            length,
            method,
        } => {
            if pdf.is_none() && url.is_none() {
                bail!("provide --pdf and/or --url");
            }
            let request = SummaryRequest {
                pdf: pdf.as_deref().map(PdfSource::parse),
                web_url: url,
                summary_length: length,
                method,
            };
            let result = pipeline.extract_and_summarize(&request).await;
            print_json(&result)?;
        }
        Command::Agenda {
            sources,
            date,
            fallback_topics,
        } => {
            let sources: Vec<PdfSource> = sources.iter().map(|s| PdfSource::parse(s)).collect();
            let meeting = pipeline
                .summarize_meeting(&sources, &date, &fallback_topics)
                .await;
            print_json(&meeting)?;
        }
        Command::Batch { dir, method } => {
            run_batch(&pipeline, &dir, method, config.fetch_concurrency).await?;
        }
    }

    tracing::info!(metrics = ?pipeline.metrics(), "Finished");
    Ok(())
}

async fn run_batch(
    pipeline: &DocumentPipeline,
    dir: &Path,
    method: Option<SummaryMethod>,
    concurrency: usize,
) -> Result<()> {
    if !dir.is_dir() {
        bail!("{} is not a directory", dir.display());
    }
    let paths = collect_pdfs(dir)?;
    tracing::info!(documents = paths.len(), concurrency, "Starting batch");

    let mut results = stream::iter(paths)
        .map(|path| async move {
            let request = SummaryRequest {
                pdf: Some(PdfSource::Path(path.clone())),
                method,
                ..SummaryRequest::default()
            };
            (path, pipeline.extract_and_summarize(&request).await)
        })
        .buffer_unordered(concurrency.max(1));

    while let Some((path, result)) = results.next().await {
        let line = BatchLine {
            path: path.display().to_string(),
            content_hash: result.content_hash(),
            summary: &result.summary,
            key_phrases: &result.key_phrases,
        };
        print_json(&line)?;
    }
    Ok(())
}

fn collect_pdfs(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in WalkDir::new(dir) {
        let entry = entry.map_err(|err| anyhow!("Failed to walk {}: {err}", dir.display()))?;
        let is_pdf = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
        if entry.file_type().is_file() && is_pdf {
            paths.push(entry.into_path());
        }
    }
    paths.sort();
    Ok(paths)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let line = serde_json::to_string(value).context("Failed to serialize output")?;
    println!("{line}");
    Ok(())
}
