
use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Document {
    pub id: i64,
    pub title: String,
    pub canonical_version: Option<String>,
    pub page_count: i64,
    pub chunk_count: i64,
    pub created_date: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDocument {
    pub title: String,
    pub canonical_version: Option<String>,
    pub page_count: i64,
    pub chunk_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ChunkRecord {
    pub id: i64,
    pub document_id: i64,
    pub chunk_index: i64,
    pub content: String,
    pub char_len: i64,
    /// Header boilerplate of the first source page, when one was detected
    pub header: Option<String>,
    /// JSON array of model identifier strings
    pub model_identifiers: Option<String>,
    pub page_start: i64,
    pub page_end: i64,
    pub created_date: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewChunkRecord {
    pub document_id: i64,
    pub chunk_index: i64,
    pub content: String,
    pub char_len: i64,
    pub header: Option<String>,
    pub model_identifiers: Vec<String>,
    pub page_start: i64,
    pub page_end: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct VideoLink {
    pub id: i64,
    pub document_id: Option<i64>,
    pub url: String,
    pub video_id: String,
    pub needs_enrichment: bool,
    pub enrichment_error: Option<String>,
    pub enriched_at: Option<NaiveDateTime>,
    /// JSON object of enrichment metadata, populated after a successful fetch
    pub metadata: Option<String>,
    pub created_date: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewVideoLink {
    pub document_id: Option<i64>,
    pub url: String,
    pub video_id: String,
}

impl ChunkRecord {
    /// Model identifiers parsed from the stored JSON array
    #[inline]
    pub fn model_identifier_list(&self) -> Result<Vec<String>> {
        match &self.model_identifiers {
            Some(raw) => {
                serde_json::from_str(raw).context("Failed to parse model identifiers JSON")
            }
            None => Ok(Vec::new()),
        }
    }
}

impl VideoLink {
    #[inline]
    pub fn is_pending(&self) -> bool {
        self.needs_enrichment
    }

    #[inline]
    pub fn is_enriched(&self) -> bool {
        !self.needs_enrichment && self.enriched_at.is_some()
    }

    /// Metadata parsed from the stored JSON object
    #[inline]
    pub fn metadata_map(&self) -> Result<Map<String, Value>> {
        match &self.metadata {
            Some(raw) => {
                let value: Value =
                    serde_json::from_str(raw).context("Failed to parse video metadata JSON")?;
                match value {
                    Value::Object(map) => Ok(map),
                    _ => Ok(Map::new()),
                }
            }
            None => Ok(Map::new()),
        }
    }
}
