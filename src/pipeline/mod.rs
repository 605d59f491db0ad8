// Document ingestion pipeline: header extraction, version detection,
// chunking, and persistence for one document per run


use anyhow::Result;
use tracing::{debug, info};

use crate::chunker::{Chunk, ChunkingConfig, chunk_text};
use crate::database::{Database, DocumentQueries, ChunkQueries, NewChunkRecord, NewDocument};
use crate::extractor::{PageExtract, extract_page_header};
use crate::versions::{scan_revision_lines, select_canonical};

/// Summary of one ingestion run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    pub document_id: i64,
    pub pages: usize,
    pub pages_with_headers: usize,
    pub chunks: usize,
    pub canonical_version: Option<String>,
}

/// Sequential, single-pass pipeline over one document's pages
pub struct DocumentPipeline {
    database: Database,
    chunking: ChunkingConfig,
}

impl DocumentPipeline {
    #[inline]
    pub fn new(database: Database, chunking: ChunkingConfig) -> Self {
        Self { database, chunking }
    }

    /// Ingest one document: strip page headers, pick the canonical version,
    /// chunk the cleaned body, and persist document and chunk rows.
    pub async fn ingest(&self, title: &str, pages: &[String]) -> Result<IngestReport> {
        info!("Ingesting document '{}' ({} pages)", title, pages.len());

        let extracts: Vec<PageExtract> = pages
            .iter()
            .enumerate()
            .map(|(index, raw)| extract_page_header(index, raw))
            .collect();
        let pages_with_headers = extracts.iter().filter(|e| e.header.is_some()).count();

        let mut candidates = Vec::new();
        for page in pages {
            candidates.extend(scan_revision_lines(page));
        }
        let canonical_version = select_canonical(&candidates).map(|c| c.raw.clone());

        let (body, page_spans) = assemble_body(&extracts);
        let chunks: Vec<Chunk> = chunk_text(&body, &self.chunking).collect();
        debug!(
            "Document '{}': {} chars of body text, {} chunks",
            title,
            body.chars().count(),
            chunks.len()
        );

        let document = DocumentQueries::create(
            self.database.pool(),
            NewDocument {
                title: title.to_string(),
                canonical_version: canonical_version.clone(),
                page_count: pages.len() as i64,
                chunk_count: chunks.len() as i64,
            },
        )
        .await?;

        for chunk in &chunks {
            let (page_start, page_end) = page_range_for(&page_spans, chunk);
            let source = extracts.get(page_start).filter(|e| e.header.is_some());

            ChunkQueries::create(
                self.database.pool(),
                NewChunkRecord {
                    document_id: document.id,
                    chunk_index: chunk.index as i64,
                    content: chunk.text.clone(),
                    char_len: chunk.char_len as i64,
                    header: source.and_then(|e| e.header.clone()),
                    model_identifiers: source
                        .map(|e| e.model_identifiers.clone())
                        .unwrap_or_default(),
                    page_start: page_start as i64,
                    page_end: page_end as i64,
                },
            )
            .await?;
        }

        info!(
            "Ingested document '{}' as id {} ({} chunks, version {:?})",
            title,
            document.id,
            chunks.len(),
            canonical_version
        );

        Ok(IngestReport {
            document_id: document.id,
            pages: pages.len(),
            pages_with_headers,
            chunks: chunks.len(),
            canonical_version,
        })
    }
}

/// Join cleaned page bodies into one text, recording each page's byte span
fn assemble_body(extracts: &[PageExtract]) -> (String, Vec<std::ops::Range<usize>>) {
    let mut body = String::new();
    let mut spans = Vec::with_capacity(extracts.len());

    for extract in extracts {
        if !body.is_empty() {
            body.push_str("\n\n");
        }
        let start = body.len();
        let trimmed = extract.body.trim_matches('\n');
        body.push_str(trimmed);
        spans.push(start..body.len());
    }

    (body, spans)
}

/// First and last page overlapping the chunk's span
fn page_range_for(page_spans: &[std::ops::Range<usize>], chunk: &Chunk) -> (usize, usize) {
    let mut first = None;
    let mut last = 0;

    for (index, span) in page_spans.iter().enumerate() {
        let overlaps = span.start < chunk.span.end && chunk.span.start < span.end;
        if overlaps {
            if first.is_none() {
                first = Some(index);
            }
            last = index;
        }
    }

    let first = first.unwrap_or(0);
    (first, last.max(first))
}
