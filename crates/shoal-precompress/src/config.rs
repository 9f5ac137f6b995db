//! Configuration for pre-compressed serving

use crate::cache::DEFAULT_MAX_SIZE;
use serde::{Deserialize, Serialize};

/// Pre-compression configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PrecompressConfig {
    /// Serve through the payload cache; when off, files are served directly
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Largest resource, in bytes, admitted into the cache
    #[serde(default = "default_max_size")]
    pub max_size: u64,
}

impl Default for PrecompressConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            max_size: default_max_size(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_max_size() -> u64 {
    DEFAULT_MAX_SIZE
}
