//! Configuration types

use serde::{Deserialize, Serialize};
use shoal_precompress::PrecompressConfig;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,

    /// Static asset location
    #[serde(default)]
    pub assets: AssetsConfig,

    /// Pre-compression of served assets
    #[serde(default)]
    pub precompression: PrecompressConfig,

    /// Logging
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    /// Listen address
    pub listen: SocketAddr,

    /// Graceful shutdown timeout (wait for in-flight requests)
    #[serde(default = "default_shutdown_timeout", with = "humantime_serde")]
    pub shutdown_timeout: Duration,
}

/// Static asset configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssetsConfig {
    /// Directory files are served from
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// URL prefix the directory is mounted under
    #[serde(default = "default_mount")]
    pub mount: String,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            mount: default_mount(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

pub(crate) fn default_shutdown_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_root() -> PathBuf {
    PathBuf::from("public")
}

fn default_mount() -> String {
    "/".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}
