
use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use super::models::{ChunkRecord, Document, NewChunkRecord, NewDocument, NewVideoLink, VideoLink};

pub struct DocumentQueries;

impl DocumentQueries {
    #[inline]
    pub async fn create(pool: &SqlitePool, new_document: NewDocument) -> Result<Document> {
        let now = Utc::now().naive_utc();
        let id = sqlx::query(
            "INSERT INTO documents (title, canonical_version, page_count, chunk_count, created_date)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&new_document.title)
        .bind(&new_document.canonical_version)
        .bind(new_document.page_count)
        .bind(new_document.chunk_count)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to create document")?
        .last_insert_rowid();

        Self::get_by_id(pool, id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to retrieve created document"))
    }

    #[inline]
    pub async fn get_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Document>> {
        sqlx::query_as::<_, Document>(
            "SELECT id, title, canonical_version, page_count, chunk_count, created_date
             FROM documents WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get document by id")
    }

    #[inline]
    pub async fn list_all(pool: &SqlitePool) -> Result<Vec<Document>> {
        sqlx::query_as::<_, Document>(
            "SELECT id, title, canonical_version, page_count, chunk_count, created_date
             FROM documents ORDER BY created_date DESC",
        )
        .fetch_all(pool)
        .await
        .context("Failed to list documents")
    }
}

pub struct ChunkQueries;

impl ChunkQueries {
    #[inline]
    pub async fn create(pool: &SqlitePool, new_chunk: NewChunkRecord) -> Result<ChunkRecord> {
        let now = Utc::now().naive_utc();
        let model_identifiers = if new_chunk.model_identifiers.is_empty() {
            None
        } else {
            Some(
                serde_json::to_string(&new_chunk.model_identifiers)
                    .context("Failed to serialize model identifiers")?,
            )
        };

        let id = sqlx::query(
            "INSERT INTO chunks (document_id, chunk_index, content, char_len, header,
                                 model_identifiers, page_start, page_end, created_date)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(new_chunk.document_id)
        .bind(new_chunk.chunk_index)
        .bind(&new_chunk.content)
        .bind(new_chunk.char_len)
        .bind(&new_chunk.header)
        .bind(&model_identifiers)
        .bind(new_chunk.page_start)
        .bind(new_chunk.page_end)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to create chunk")?
        .last_insert_rowid();

        sqlx::query_as::<_, ChunkRecord>(
            "SELECT id, document_id, chunk_index, content, char_len, header,
                    model_identifiers, page_start, page_end, created_date
             FROM chunks WHERE id = ?",
        )
        .bind(id)
        .fetch_one(pool)
        .await
        .context("Failed to retrieve created chunk")
    }

    #[inline]
    pub async fn list_by_document(pool: &SqlitePool, document_id: i64) -> Result<Vec<ChunkRecord>> {
        sqlx::query_as::<_, ChunkRecord>(
            "SELECT id, document_id, chunk_index, content, char_len, header,
                    model_identifiers, page_start, page_end, created_date
             FROM chunks WHERE document_id = ? ORDER BY chunk_index ASC",
        )
        .bind(document_id)
        .fetch_all(pool)
        .await
        .context("Failed to list chunks for document")
    }

    #[inline]
    pub async fn count_all(pool: &SqlitePool) -> Result<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM chunks")
            .fetch_one(pool)
            .await
            .context("Failed to count chunks")
    }
}

/// Aggregate counts over the video_links table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VideoLinkCounts {
    pub pending: i64,
    pub enriched: i64,
    pub failed: i64,
}

pub struct VideoLinkQueries;

impl VideoLinkQueries {
    #[inline]
    pub async fn create(pool: &SqlitePool, new_link: NewVideoLink) -> Result<VideoLink> {
        let now = Utc::now().naive_utc();
        let id = sqlx::query(
            "INSERT INTO video_links (document_id, url, video_id, needs_enrichment, created_date)
             VALUES (?, ?, ?, 1, ?)",
        )
        .bind(new_link.document_id)
        .bind(&new_link.url)
        .bind(&new_link.video_id)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to create video link")?
        .last_insert_rowid();

        debug!("Created video link {} for video {}", id, new_link.video_id);

        Self::get_by_id(pool, id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to retrieve created video link"))
    }

    #[inline]
    pub async fn get_by_id(pool: &SqlitePool, id: i64) -> Result<Option<VideoLink>> {
        sqlx::query_as::<_, VideoLink>(
            "SELECT id, document_id, url, video_id, needs_enrichment, enrichment_error,
                    enriched_at, metadata, created_date
             FROM video_links WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get video link by id")
    }

    /// Next batch of records still needing enrichment, keyed past `after_id`
    /// so a run never revisits a record it already attempted
    #[inline]
    pub async fn list_pending(
        pool: &SqlitePool,
        after_id: i64,
        limit: i64,
    ) -> Result<Vec<VideoLink>> {
        sqlx::query_as::<_, VideoLink>(
            "SELECT id, document_id, url, video_id, needs_enrichment, enrichment_error,
                    enriched_at, metadata, created_date
             FROM video_links
             WHERE needs_enrichment = 1 AND id > ?
             ORDER BY id ASC
             LIMIT ?",
        )
        .bind(after_id)
        .bind(limit)
        .fetch_all(pool)
        .await
        .context("Failed to list pending video links")
    }

    /// Record a successful enrichment: flip the flag, clear the error,
    /// stamp the time, and store the merged metadata
    #[inline]
    pub async fn mark_enriched(pool: &SqlitePool, id: i64, metadata_json: &str) -> Result<()> {
        let now = Utc::now().naive_utc();
        sqlx::query(
            "UPDATE video_links
             SET needs_enrichment = 0, enrichment_error = NULL, enriched_at = ?, metadata = ?
             WHERE id = ?",
        )
        .bind(now)
        .bind(metadata_json)
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to mark video link as enriched")?;

        Ok(())
    }

    /// Record a failed enrichment attempt; the flag stays set so the record
    /// is retried on a future run
    #[inline]
    pub async fn mark_failed(pool: &SqlitePool, id: i64, error_message: &str) -> Result<()> {
        sqlx::query(
            "UPDATE video_links SET enrichment_error = ? WHERE id = ?",
        )
        .bind(error_message)
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to record video link error")?;

        Ok(())
    }

    #[inline]
    pub async fn counts(pool: &SqlitePool) -> Result<VideoLinkCounts> {
        let pending = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM video_links WHERE needs_enrichment = 1",
        )
        .fetch_one(pool)
        .await
        .context("Failed to count pending video links")?;

        let enriched = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM video_links WHERE needs_enrichment = 0",
        )
        .fetch_one(pool)
        .await
        .context("Failed to count enriched video links")?;

        let failed = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM video_links
             WHERE needs_enrichment = 1 AND enrichment_error IS NOT NULL",
        )
        .fetch_one(pool)
        .await
        .context("Failed to count failed video links")?;

        Ok(VideoLinkCounts {
            pending,
            enriched,
            failed,
        })
    }
}
