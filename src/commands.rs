use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::config::{Config, get_config_dir};
use crate::database::{Database, NewVideoLink};
use crate::enrichment::{EnrichmentSynchronizer, RunOutcome, video_id_from_url};
use crate::pipeline::DocumentPipeline;

/// Ingest a paginated text file (pages delimited by form feeds)
pub async fn ingest_document(path: &Path, title: Option<String>) -> Result<()> {
    let config_dir = get_config_dir()?;
    let config = Config::load(&config_dir)?;
    let database = Database::initialize_from_config_dir(&config_dir)
        .await
        .context("Failed to initialize database")?;

    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read document file: {}", path.display()))?;
    let pages = split_pages(&text);

    let title = title.unwrap_or_else(|| {
        path.file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "untitled".to_string())
    });

    info!("Ingesting '{}' from {}", title, path.display());

    let pipeline = DocumentPipeline::new(database, config.chunking);
    let report = pipeline.ingest(&title, &pages).await?;

    println!("Ingested '{}' (document id {})", title, report.document_id);
    println!(
        "  {} page(s), {} with header boilerplate",
        report.pages, report.pages_with_headers
    );
    println!("  {} chunk(s) written", report.chunks);
    match report.canonical_version {
        Some(version) => println!("  Canonical version: {version}"),
        None => println!("  Canonical version: none found"),
    }

    Ok(())
}

/// Run one enrichment pass over pending video links
pub async fn enrich() -> Result<()> {
    let config_dir = get_config_dir()?;
    let config = Config::load(&config_dir)?;
    let database = Database::initialize_from_config_dir(&config_dir)
        .await
        .context("Failed to initialize database")?;

    let pending = database.video_link_counts().await?.pending;
    if pending == 0 {
        println!("No video links need enrichment.");
        return Ok(());
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {msg}").context("Invalid progress template")?,
    );
    spinner.set_message(format!("Enriching {pending} pending video link(s)..."));
    spinner.enable_steady_tick(Duration::from_millis(120));

    let synchronizer = EnrichmentSynchronizer::new(database, config.enrichment);
    let outcome = synchronizer.run().await?;
    spinner.finish_and_clear();

    match outcome {
        RunOutcome::Completed(stats) => {
            println!(
                "Enrichment complete: {} processed, {} enriched, {} failed",
                stats.processed, stats.enriched, stats.failed
            );
        }
        RunOutcome::SkippedDisabled => {
            println!("Enrichment is disabled in the configuration.");
        }
        RunOutcome::SkippedMissingCredentials => {
            println!(
                "Enrichment skipped: credentials are not configured. Run `docpipe config` to set them."
            );
        }
    }

    Ok(())
}

/// Register a video link discovered by an upstream extraction stage
pub async fn add_link(
    url: String,
    video_id: Option<String>,
    document_id: Option<i64>,
) -> Result<()> {
    let config_dir = get_config_dir()?;
    let database = Database::initialize_from_config_dir(&config_dir)
        .await
        .context("Failed to initialize database")?;

    let video_id = video_id
        .or_else(|| video_id_from_url(&url))
        .context("Could not determine a video id; pass one with --video-id")?;

    let link = database
        .create_video_link(NewVideoLink {
            document_id,
            url,
            video_id,
        })
        .await?;

    println!(
        "Added video link {} (video {}), queued for enrichment",
        link.id, link.video_id
    );
    Ok(())
}

/// List ingested documents
pub async fn list_documents() -> Result<()> {
    let config_dir = get_config_dir()?;
    let database = Database::initialize_from_config_dir(&config_dir)
        .await
        .context("Failed to initialize database")?;

    let documents = database.list_documents().await?;
    if documents.is_empty() {
        println!("No documents ingested yet.");
        return Ok(());
    }

    for document in documents {
        let version = document
            .canonical_version
            .unwrap_or_else(|| "unversioned".to_string());
        println!(
            "{:>4}  {}  ({version}, {} pages, {} chunks)",
            document.id, document.title, document.page_count, document.chunk_count
        );
    }
    Ok(())
}

/// Show pipeline and enrichment state
pub async fn show_status() -> Result<()> {
    let config_dir = get_config_dir()?;
    let database = Database::initialize_from_config_dir(&config_dir)
        .await
        .context("Failed to initialize database")?;

    let documents = database.list_documents().await?;
    let chunk_count = database.count_chunks().await?;
    let counts = database.video_link_counts().await?;

    println!("Documents: {}", documents.len());
    println!("Chunks: {chunk_count}");
    println!("Video links:");
    println!("  Pending enrichment: {}", counts.pending);
    println!("  Enriched: {}", counts.enriched);
    println!("  Pending with errors: {}", counts.failed);

    Ok(())
}

/// Split raw document text into pages on form-feed characters
fn split_pages(text: &str) -> Vec<String> {
    let mut pages: Vec<String> = text.split('\x0c').map(str::to_string).collect();
    while pages.last().is_some_and(|page| page.trim().is_empty()) {
        pages.pop();
    }
    pages
}
