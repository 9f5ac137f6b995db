//! Configuration validation

use crate::Config;
use shoal_core::{Error, Result};

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_server(config)?;
    validate_assets(config)?;
    validate_precompression(config)?;
    validate_logging(config)?;

    Ok(())
}

fn validate_server(config: &Config) -> Result<()> {
    if config.server.shutdown_timeout.is_zero() {
        return Err(Error::Config("shutdown_timeout must be > 0".to_string()));
    }

    if config.server.shutdown_timeout.as_secs() > 300 {
        tracing::warn!("shutdown_timeout is very high (>5 minutes)");
    }

    Ok(())
}

fn validate_assets(config: &Config) -> Result<()> {
    let assets = &config.assets;

    if assets.root.as_os_str().is_empty() {
        return Err(Error::Config("assets.root cannot be empty".to_string()));
    }

    if !assets.mount.starts_with('/') {
        return Err(Error::Config(format!(
            "assets.mount must start with '/': {}",
            assets.mount
        )));
    }

    if !assets.root.is_dir() {
        tracing::warn!(
            root = %assets.root.display(),
            "Asset root is not a directory, every request will fall through"
        );
    }

    Ok(())
}

fn validate_precompression(config: &Config) -> Result<()> {
    if config.precompression.enabled && config.precompression.max_size == 0 {
        return Err(Error::Config(
            "precompression.max_size must be > 0 when precompression is enabled".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(config: &Config) -> Result<()> {
    let level = config.logging.level.to_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        return Err(Error::Config(format!(
            "Invalid log level: {} (expected one of {})",
            config.logging.level,
            LOG_LEVELS.join(", ")
        )));
    }

    Ok(())
}
