use clap::{Parser, Subcommand};
use docpipe::Result;
use docpipe::commands::{add_link, enrich, ingest_document, list_documents, show_status};
use docpipe::config::{run_interactive_config, show_config};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "docpipe")]
#[command(about = "Document ingestion pipeline with chunking, version detection, and video enrichment")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure chunking and video enrichment settings
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
    /// Ingest a paginated text document (pages delimited by form feeds)
    Ingest {
        /// Path to the document file
        file: PathBuf,
        /// Optional document title, defaults to the file name
        #[arg(long)]
        title: Option<String>,
    },
    /// Register a video link for later enrichment
    AddLink {
        /// Player URL of the video
        url: String,
        /// External video identifier, derived from the URL when omitted
        #[arg(long)]
        video_id: Option<String>,
        /// Document this link belongs to
        #[arg(long)]
        document: Option<i64>,
    },
    /// Fetch metadata for video links that still need enrichment
    Enrich,
    /// List ingested documents
    List,
    /// Show pipeline and enrichment status
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Config { show } => {
            if show {
                show_config()?;
            } else {
                run_interactive_config()?;
            }
        }
        Commands::Ingest { file, title } => {
            ingest_document(&file, title).await?;
        }
        Commands::AddLink {
            url,
            video_id,
            document,
        } => {
            add_link(url, video_id, document).await?;
        }
        Commands::Enrich => {
            enrich().await?;
        }
        Commands::List => {
            list_documents().await?;
        }
        Commands::Status => {
            show_status().await?;
        }
    }

    Ok(())
}
