// Video link enrichment: batch synchronization of pending records against
// the external video CMS API


pub mod client;

use anyhow::{Context, Result};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::EnrichmentConfig;
use crate::database::{Database, VideoLink, VideoLinkQueries};
use client::{AccessToken, VideoCloudClient, VideoMetadata};

/// Outcome of one enrichment run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed(RunStats),
    SkippedDisabled,
    SkippedMissingCredentials,
}

/// Per-run processing statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunStats {
    pub processed: usize,
    pub enriched: usize,
    pub failed: usize,
}

/// Processes pending video links in batches, one pass per run.
///
/// Holds no state beyond the run: cross-run retry relies entirely on the
/// persisted `needs_enrichment` flag, so a crash mid-batch leaves unprocessed
/// records correctly flagged for the next run.
pub struct EnrichmentSynchronizer {
    database: Database,
    config: EnrichmentConfig,
    endpoint_override: Option<(String, String)>,
}

impl EnrichmentSynchronizer {
    #[inline]
    pub fn new(database: Database, config: EnrichmentConfig) -> Self {
        Self {
            database,
            config,
            endpoint_override: None,
        }
    }

    /// Point the API client at alternate endpoints, used by tests
    #[inline]
    pub fn with_endpoints(mut self, oauth_url: &str, cms_url: &str) -> Self {
        self.endpoint_override = Some((oauth_url.to_string(), cms_url.to_string()));
        self
    }

    /// Run one enrichment pass over all pending video links.
    ///
    /// Token acquisition failure aborts the run before any record is touched.
    /// Per-record fetch failures are recorded on the individual link and never
    /// abort the batch.
    pub async fn run(&self) -> Result<RunOutcome> {
        if !self.config.enabled {
            info!("Video enrichment is disabled, skipping run");
            return Ok(RunOutcome::SkippedDisabled);
        }

        if !self.config.has_credentials() {
            warn!("Video enrichment credentials are not configured, skipping run");
            return Ok(RunOutcome::SkippedMissingCredentials);
        }

        let client = self.build_client()?;
        let token = client
            .request_token()
            .context("Aborting enrichment run: could not obtain access token")?;

        let batch_size = i64::from(self.config.batch_size);
        let mut stats = RunStats::default();
        let mut last_id = 0;

        loop {
            let batch =
                VideoLinkQueries::list_pending(self.database.pool(), last_id, batch_size).await?;
            if batch.is_empty() {
                break;
            }

            debug!("Processing batch of {} pending video link(s)", batch.len());
            for link in &batch {
                self.process_link(&client, &token, link, &mut stats).await?;
            }
            last_id = batch.last().map(|link| link.id).unwrap_or(last_id);

            if (batch.len() as i64) < batch_size {
                break;
            }
            if self.config.rate_limit_delay_secs > 0.0 {
                tokio::time::sleep(Duration::from_secs_f64(self.config.rate_limit_delay_secs))
                    .await;
            }
        }

        info!(
            "Enrichment run complete: {} processed, {} enriched, {} failed",
            stats.processed, stats.enriched, stats.failed
        );
        Ok(RunOutcome::Completed(stats))
    }

    fn build_client(&self) -> Result<VideoCloudClient> {
        let client = VideoCloudClient::new(&self.config)?;
        match &self.endpoint_override {
            Some((oauth_url, cms_url)) => client.with_endpoints(oauth_url, cms_url),
            None => Ok(client),
        }
    }

    async fn process_link(
        &self,
        client: &VideoCloudClient,
        token: &AccessToken,
        link: &VideoLink,
        stats: &mut RunStats,
    ) -> Result<()> {
        stats.processed += 1;

        match client.fetch_video(&token.access_token, &link.video_id) {
            Ok(metadata) => {
                let merged = merged_metadata_json(link, &metadata)?;
                VideoLinkQueries::mark_enriched(self.database.pool(), link.id, &merged).await?;
                info!("Enriched video link {} (video {})", link.id, link.video_id);
                stats.enriched += 1;
            }
            Err(error) => {
                let message = format!("{error:#}");
                warn!(
                    "Failed to enrich video link {} (video {}): {}",
                    link.id, link.video_id, message
                );
                VideoLinkQueries::mark_failed(self.database.pool(), link.id, &message).await?;
                stats.failed += 1;
            }
        }

        Ok(())
    }
}

/// Merge freshly fetched metadata over whatever the record already holds
fn merged_metadata_json(link: &VideoLink, metadata: &VideoMetadata) -> Result<String> {
    let mut map = link.metadata_map().unwrap_or_default();
    for (key, value) in metadata.to_metadata_value() {
        map.insert(key, value);
    }
    serde_json::to_string(&map).context("Failed to serialize merged metadata")
}

/// Extract a video identifier from a player URL.
///
/// Recognizes `videoId`/`video_id` query parameters and falls back to a
/// purely numeric final path segment.
pub fn video_id_from_url(raw: &str) -> Option<String> {
    let parsed = Url::parse(raw).ok()?;

    if let Some((_, value)) = parsed
        .query_pairs()
        .find(|(key, _)| key == "videoId" || key == "video_id")
    {
        if !value.is_empty() {
            return Some(value.into_owned());
        }
    }

    parsed
        .path_segments()?
        .filter(|segment| !segment.is_empty())
        .next_back()
        .filter(|segment| segment.chars().all(|c| c.is_ascii_digit()))
        .map(str::to_string)
}
