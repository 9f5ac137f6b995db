//! Configuration builder

use crate::types::{default_shutdown_timeout, AssetsConfig, Config, LoggingConfig, ServerConfig};
use shoal_core::{Error, Result};
use shoal_precompress::PrecompressConfig;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Builder for constructing configuration programmatically
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    server: Option<ServerConfig>,
    assets: AssetsConfig,
    precompression: PrecompressConfig,
    logging: LoggingConfig,
}

impl ConfigBuilder {
    /// Create a new configuration builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set server configuration
    pub fn server(mut self, server: ServerConfig) -> Self {
        self.server = Some(server);
        self
    }

    /// Set listen address
    pub fn listen(mut self, addr: SocketAddr) -> Self {
        let server = self.server.get_or_insert_with(|| ServerConfig {
            listen: addr,
            shutdown_timeout: default_shutdown_timeout(),
        });
        server.listen = addr;
        self
    }

    /// Set the asset root directory
    pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
        self.assets.root = root.into();
        self
    }

    /// Set the URL prefix assets are mounted under
    pub fn mount(mut self, mount: impl Into<String>) -> Self {
        self.assets.mount = mount.into();
        self
    }

    /// Set pre-compression configuration
    pub fn precompression(mut self, precompression: PrecompressConfig) -> Self {
        self.precompression = precompression;
        self
    }

    /// Set logging configuration
    pub fn logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = logging;
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<Config> {
        let server = self
            .server
            .ok_or_else(|| Error::Config("server is required".to_string()))?;

        Ok(Config {
            server,
            assets: self.assets,
            precompression: self.precompression,
            logging: self.logging,
        })
    }
}
