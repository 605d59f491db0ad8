
use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;
use url::form_urlencoded;

use crate::config::EnrichmentConfig;

const DEFAULT_OAUTH_TOKEN_URL: &str = "https://oauth.brightcove.com/v4/access_token";
const DEFAULT_CMS_API_URL: &str = "https://cms.api.brightcove.com/v1";
/// Retries for a single rate-limited record within one run
const MAX_RATE_LIMIT_RETRIES: u32 = 4;
const ERROR_BODY_PREVIEW_CHARS: usize = 200;

/// Blocking client for the video CMS API
#[derive(Debug, Clone)]
pub struct VideoCloudClient {
    oauth_url: Url,
    cms_url: Url,
    account_id: String,
    client_id: String,
    client_secret: String,
    agent: ureq::Agent,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    pub token_type: Option<String>,
    pub expires_in: Option<u64>,
}

/// Metadata for one video as returned by the CMS API
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VideoMetadata {
    pub id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    /// Duration in milliseconds
    pub duration: Option<i64>,
    pub state: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub images: Map<String, Value>,
}

impl VideoCloudClient {
    #[inline]
    pub fn new(config: &EnrichmentConfig) -> Result<Self> {
        let oauth_url =
            Url::parse(DEFAULT_OAUTH_TOKEN_URL).context("Failed to parse OAuth token URL")?;
        let cms_url = Url::parse(DEFAULT_CMS_API_URL).context("Failed to parse CMS API URL")?;

        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(config.api_timeout_secs)))
            .http_status_as_error(false)
            .build()
            .into();

        Ok(Self {
            oauth_url,
            cms_url,
            account_id: config.account_id.clone(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            agent,
        })
    }

    /// Override both API endpoints, used to point the client at a test server
    #[inline]
    pub fn with_endpoints(mut self, oauth_url: &str, cms_url: &str) -> Result<Self> {
        self.oauth_url = Url::parse(oauth_url).context("Failed to parse OAuth endpoint")?;
        self.cms_url = Url::parse(cms_url).context("Failed to parse CMS endpoint")?;
        Ok(self)
    }

    #[inline]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .into();
        self
    }

    /// Obtain an OAuth2 access token via the client-credentials grant
    #[inline]
    pub fn request_token(&self) -> Result<AccessToken> {
        debug!("Requesting access token from {}", self.oauth_url);

        let body = form_urlencoded::Serializer::new(String::new())
            .append_pair("grant_type", "client_credentials")
            .append_pair("client_id", &self.client_id)
            .append_pair("client_secret", &self.client_secret)
            .finish();

        let mut response = self
            .agent
            .post(self.oauth_url.as_str())
            .header("Content-Type", "application/x-www-form-urlencoded")
            .send(&body)
            .context("Token request failed")?;

        let status = response.status();
        let text = response
            .body_mut()
            .read_to_string()
            .context("Failed to read token response body")?;

        if !status.is_success() {
            return Err(anyhow::anyhow!(
                "Token endpoint returned HTTP {}: {}",
                status.as_u16(),
                preview(&text)
            ));
        }

        let token: AccessToken =
            serde_json::from_str(&text).context("Failed to parse token response")?;
        debug!(
            "Obtained access token (type {:?}, expires in {:?}s)",
            token.token_type, token.expires_in
        );
        Ok(token)
    }

    /// Fetch metadata for one video, retrying rate-limited responses with
    /// exponential backoff (1s, 2s, 4s, 8s). A `Retry-After` header overrides
    /// the computed delay. Exhausted retries and every other failure surface
    /// as an error for the caller to record on the video link.
    pub fn fetch_video(&self, access_token: &str, video_id: &str) -> Result<VideoMetadata> {
        let url = format!(
            "{}/accounts/{}/videos/{}",
            self.cms_url.as_str().trim_end_matches('/'),
            self.account_id,
            video_id
        );

        let mut attempt: u32 = 0;
        loop {
            debug!("Fetching video {} from {}", video_id, url);

            let mut response = self
                .agent
                .get(&url)
                .header("Authorization", &format!("Bearer {access_token}"))
                .call()
                .with_context(|| format!("Request for video {video_id} failed"))?;

            let status = response.status();
            if status.is_success() {
                let text = response
                    .body_mut()
                    .read_to_string()
                    .context("Failed to read video response body")?;
                return serde_json::from_str(&text)
                    .context("Failed to parse video metadata response");
            }

            if status.as_u16() == 429 && attempt < MAX_RATE_LIMIT_RETRIES {
                attempt += 1;
                let delay = response
                    .headers()
                    .get("retry-after")
                    .and_then(|value| value.to_str().ok())
                    .and_then(parse_retry_after)
                    .unwrap_or_else(|| backoff_delay(attempt));
                warn!(
                    "Rate limited fetching video {}, waiting {:?} (attempt {}/{})",
                    video_id, delay, attempt, MAX_RATE_LIMIT_RETRIES
                );
                std::thread::sleep(delay);
                continue;
            }

            let text = response.body_mut().read_to_string().unwrap_or_default();
            return Err(anyhow::anyhow!(
                "Video API returned HTTP {} for video {}: {}",
                status.as_u16(),
                video_id,
                preview(&text)
            ));
        }
    }
}

impl VideoMetadata {
    /// Flatten the response into a metadata object suitable for merging into
    /// a video link record
    #[inline]
    pub fn to_metadata_value(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("video_id".to_string(), Value::String(self.id.clone()));
        if let Some(name) = &self.name {
            map.insert("name".to_string(), Value::String(name.clone()));
        }
        if let Some(description) = &self.description {
            map.insert(
                "description".to_string(),
                Value::String(description.clone()),
            );
        }
        if let Some(duration) = self.duration {
            map.insert("duration_ms".to_string(), Value::from(duration));
        }
        if let Some(state) = &self.state {
            map.insert("state".to_string(), Value::String(state.clone()));
        }
        if let Some(created_at) = &self.created_at {
            map.insert("created_at".to_string(), Value::String(created_at.clone()));
        }
        if let Some(updated_at) = &self.updated_at {
            map.insert("updated_at".to_string(), Value::String(updated_at.clone()));
        }
        if !self.tags.is_empty() {
            map.insert(
                "tags".to_string(),
                Value::Array(self.tags.iter().cloned().map(Value::String).collect()),
            );
        }
        if !self.images.is_empty() {
            map.insert("images".to_string(), Value::Object(self.images.clone()));
        }
        map
    }
}

/// Exponential backoff delay for rate-limit retry `attempt` (1-based)
fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_secs(1 << (attempt.saturating_sub(1)))
}

/// Parse a `Retry-After` header value given in seconds
fn parse_retry_after(raw: &str) -> Option<Duration> {
    raw.trim().parse::<u64>().ok().map(Duration::from_secs)
}

fn preview(body: &str) -> String {
    if body.chars().count() <= ERROR_BODY_PREVIEW_CHARS {
        body.to_string()
    } else {
        let truncated: String = body.chars().take(ERROR_BODY_PREVIEW_CHARS).collect();
        format!("{truncated}...")
    }
}
