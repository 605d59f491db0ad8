
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::chunker::ChunkingConfig;

pub const ENV_ACCOUNT_ID: &str = "DOCPIPE_ACCOUNT_ID";
pub const ENV_CLIENT_ID: &str = "DOCPIPE_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "DOCPIPE_CLIENT_SECRET";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub enrichment: EnrichmentConfig,
    #[serde(skip)]
    pub base_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EnrichmentConfig {
    pub enabled: bool,
    pub account_id: String,
    pub client_id: String,
    pub client_secret: String,
    pub api_timeout_secs: u64,
    pub batch_size: u32,
    pub rate_limit_delay_secs: f64,
}

impl Default for EnrichmentConfig {
    #[inline]
    fn default() -> Self {
        Self {
            enabled: true,
            account_id: String::new(),
            client_id: String::new(),
            client_secret: String::new(),
            api_timeout_secs: 30,
            batch_size: 10,
            rate_limit_delay_secs: 1.0,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration directory not found or could not be created")]
    DirectoryError,
    #[error("Invalid chunk size: {0} (must be between 250 and 4000 characters)")]
    InvalidChunkSize(usize),
    #[error("Invalid batch size: {0} (must be between 1 and 1000)")]
    InvalidBatchSize(u32),
    #[error("Invalid API timeout: {0} (must be between 1 and 300 seconds)")]
    InvalidApiTimeout(u64),
    #[error("Invalid rate limit delay: {0} (must be between 0 and 60 seconds)")]
    InvalidRateLimitDelay(f64),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl Config {
    /// Load configuration from `config.toml` in the given directory.
    ///
    /// A missing file yields defaults. Credential environment variables
    /// (`DOCPIPE_ACCOUNT_ID`, `DOCPIPE_CLIENT_ID`, `DOCPIPE_CLIENT_SECRET`)
    /// take precedence over file values.
    #[inline]
    pub fn load<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_path = config_dir.as_ref().join("config.toml");

        let mut config = if config_path.exists() {
            let content = fs::read_to_string(&config_path).with_context(|| {
                format!("Failed to read config file: {}", config_path.display())
            })?;
            let config: Config = toml::from_str(&content).with_context(|| {
                format!("Failed to parse config file: {}", config_path.display())
            })?;
            config
        } else {
            Config::default()
        };
        config.base_dir = config_dir.as_ref().to_path_buf();

        config.apply_env_overrides();
        config
            .validate()
            .with_context(|| "Configuration validation failed")?;

        Ok(config)
    }

    #[inline]
    pub fn save(&self) -> Result<()> {
        self.validate()
            .context("Configuration validation failed before saving")?;

        fs::create_dir_all(&self.base_dir).with_context(|| {
            format!(
                "Failed to create config directory: {}",
                self.base_dir.display()
            )
        })?;

        let config_path = self.config_file_path();
        let content = toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        fs::write(&config_path, content)
            .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(account_id) = env::var(ENV_ACCOUNT_ID) {
            self.enrichment.account_id = account_id;
        }
        if let Ok(client_id) = env::var(ENV_CLIENT_ID) {
            self.enrichment.client_id = client_id;
        }
        if let Ok(client_secret) = env::var(ENV_CLIENT_SECRET) {
            self.enrichment.client_secret = client_secret;
        }
    }

    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(250..=4000).contains(&self.chunking.chunk_size) {
            return Err(ConfigError::InvalidChunkSize(self.chunking.chunk_size));
        }
        self.enrichment.validate()
    }

    #[inline]
    pub fn config_file_path(&self) -> PathBuf {
        self.base_dir.join("config.toml")
    }

    /// Get the path for the SQLite database
    #[inline]
    pub fn database_path(&self) -> PathBuf {
        self.base_dir.join("docpipe.db")
    }
}

impl Default for Config {
    #[inline]
    fn default() -> Self {
        Self {
            chunking: ChunkingConfig::default(),
            enrichment: EnrichmentConfig::default(),
            base_dir: PathBuf::new(),
        }
    }
}

impl EnrichmentConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 || self.batch_size > 1000 {
            return Err(ConfigError::InvalidBatchSize(self.batch_size));
        }

        if !(1..=300).contains(&self.api_timeout_secs) {
            return Err(ConfigError::InvalidApiTimeout(self.api_timeout_secs));
        }

        if !(0.0..=60.0).contains(&self.rate_limit_delay_secs) {
            return Err(ConfigError::InvalidRateLimitDelay(
                self.rate_limit_delay_secs,
            ));
        }

        Ok(())
    }

    /// Whether all credentials required for API access are present
    #[inline]
    pub fn has_credentials(&self) -> bool {
        !self.account_id.trim().is_empty()
            && !self.client_id.trim().is_empty()
            && !self.client_secret.trim().is_empty()
    }
}
