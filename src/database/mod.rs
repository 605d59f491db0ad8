use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use tracing::{debug, info};


pub mod models;
pub mod queries;

pub use models::{
    ChunkRecord, Document, NewChunkRecord, NewDocument, NewVideoLink, VideoLink,
};
pub use queries::{ChunkQueries, DocumentQueries, VideoLinkCounts, VideoLinkQueries};

pub type DbPool = Pool<Sqlite>;

#[derive(Debug, Clone)]
pub struct Database {
    pool: DbPool,
}

impl Database {
    pub async fn new<P: AsRef<Path>>(database_path: P) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(database_path)
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(10)
            .connect_with(options)
            .await
            .context("Failed to create database connection pool")?;

        let database = Self { pool };
        database.run_migrations().await?;

        Ok(database)
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    pub async fn run_migrations(&self) -> Result<()> {
        info!("Running database migrations");

        sqlx::migrate!("src/database/migrations")
            .run(&self.pool)
            .await
            .context("Failed to run schema migration")?;

        debug!("Database migrations completed successfully");
        Ok(())
    }

    pub async fn initialize_from_config_dir(config_dir: &Path) -> Result<Self> {
        let db_path = config_dir.join("docpipe.db");

        std::fs::create_dir_all(config_dir).with_context(|| {
            format!(
                "Failed to create config directory: {}",
                config_dir.display()
            )
        })?;

        Self::new(db_path).await
    }

    // Document operations
    pub async fn list_documents(&self) -> Result<Vec<Document>> {
        DocumentQueries::list_all(&self.pool).await
    }

    pub async fn get_document_by_id(&self, id: i64) -> Result<Option<Document>> {
        DocumentQueries::get_by_id(&self.pool, id).await
    }

    // Chunk operations
    pub async fn get_chunks_for_document(&self, document_id: i64) -> Result<Vec<ChunkRecord>> {
        ChunkQueries::list_by_document(&self.pool, document_id).await
    }

    pub async fn count_chunks(&self) -> Result<i64> {
        ChunkQueries::count_all(&self.pool).await
    }

    // Video link operations
    pub async fn create_video_link(&self, new_link: NewVideoLink) -> Result<VideoLink> {
        VideoLinkQueries::create(&self.pool, new_link).await
    }

    pub async fn video_link_counts(&self) -> Result<VideoLinkCounts> {
        VideoLinkQueries::counts(&self.pool).await
    }
}
