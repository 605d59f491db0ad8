use anyhow::{Context, Result};
use console::style;
use dialoguer::{Confirm, Input, Password};

use super::get_config_dir;
use super::settings::{Config, EnrichmentConfig};

/// Walk the user through chunking and enrichment settings, then save.
#[inline]
pub fn run_interactive_config() -> Result<()> {
    eprintln!("{}", style("docpipe configuration setup").bold().cyan());
    eprintln!();

    let config_dir = get_config_dir().context("Failed to locate config directory")?;
    let mut config = load_existing_config(&config_dir)?;

    eprintln!("{}", style("Chunking").bold().yellow());
    let chunk_size: usize = Input::new()
        .with_prompt("Target chunk size (characters)")
        .default(config.chunking.chunk_size)
        .interact_text()?;
    config.chunking.chunk_size = chunk_size;

    eprintln!();
    eprintln!("{}", style("Video enrichment").bold().yellow());
    eprintln!("Credentials for the video CMS API (leave blank to disable enrichment).");
    configure_enrichment(&mut config.enrichment)?;

    eprintln!();
    if Confirm::new()
        .with_prompt("Save configuration?")
        .default(true)
        .interact()?
    {
        config.save().context("Failed to save configuration")?;
        eprintln!("{}", style("Configuration saved.").green());
        eprintln!(
            "Config file: {}",
            style(config.config_file_path().display()).cyan()
        );
    } else {
        eprintln!("Configuration not saved.");
    }

    Ok(())
}

/// Print the current configuration with secrets masked
#[inline]
pub fn show_config() -> Result<()> {
    let config_dir = get_config_dir().context("Failed to locate config directory")?;
    let config = Config::load(&config_dir).context("Failed to load configuration")?;

    eprintln!("{}", style("Current configuration").bold().cyan());
    eprintln!();

    eprintln!("{}", style("Chunking:").bold().yellow());
    eprintln!(
        "  Target chunk size: {}",
        style(config.chunking.chunk_size).cyan()
    );

    eprintln!();
    eprintln!("{}", style("Enrichment:").bold().yellow());
    eprintln!("  Enabled: {}", style(config.enrichment.enabled).cyan());
    eprintln!(
        "  Account ID: {}",
        style(mask_unless_empty(&config.enrichment.account_id)).cyan()
    );
    eprintln!(
        "  Client ID: {}",
        style(mask_unless_empty(&config.enrichment.client_id)).cyan()
    );
    eprintln!(
        "  Client secret: {}",
        style(if config.enrichment.client_secret.is_empty() {
            "(not set)"
        } else {
            "********"
        })
        .cyan()
    );
    eprintln!(
        "  API timeout: {}s",
        style(config.enrichment.api_timeout_secs).cyan()
    );
    eprintln!(
        "  Batch size: {}",
        style(config.enrichment.batch_size).cyan()
    );
    eprintln!(
        "  Rate limit delay: {}s",
        style(config.enrichment.rate_limit_delay_secs).cyan()
    );

    eprintln!();
    eprintln!(
        "Config file: {}",
        style(config.config_file_path().display()).dim()
    );

    Ok(())
}

fn load_existing_config(config_dir: &std::path::Path) -> Result<Config> {
    Config::load(config_dir).map_or_else(
        |_| {
            eprintln!(
                "{}",
                style("No existing configuration found. Using defaults.").yellow()
            );
            let mut config = Config::default();
            config.base_dir = config_dir.to_path_buf();
            Ok(config)
        },
        |config| {
            eprintln!("{}", style("Found existing configuration.").green());
            Ok(config)
        },
    )
}

fn configure_enrichment(enrichment: &mut EnrichmentConfig) -> Result<()> {
    enrichment.enabled = Confirm::new()
        .with_prompt("Enable video enrichment?")
        .default(enrichment.enabled)
        .interact()?;

    if !enrichment.enabled {
        return Ok(());
    }

    enrichment.account_id = Input::new()
        .with_prompt("Account ID")
        .default(enrichment.account_id.clone())
        .allow_empty(true)
        .interact_text()?;

    enrichment.client_id = Input::new()
        .with_prompt("Client ID")
        .default(enrichment.client_id.clone())
        .allow_empty(true)
        .interact_text()?;

    let secret: String = Password::new()
        .with_prompt("Client secret (blank to keep current)")
        .allow_empty_password(true)
        .interact()?;
    if !secret.is_empty() {
        enrichment.client_secret = secret;
    }

    enrichment.batch_size = Input::new()
        .with_prompt("Batch size")
        .default(enrichment.batch_size)
        .interact_text()?;

    Ok(())
}

fn mask_unless_empty(value: &str) -> String {
    if value.is_empty() {
        "(not set)".to_string()
    } else {
        value.to_string()
    }
}
