//! Server configuration.
//!
//! This module provides configuration management for the csvd server.

use std::path::{Path, PathBuf};

use anyhow::Result;
use csvd_core::StoreConfig;
use serde::{Deserialize, Serialize};

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory holding one CSV file per table.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    /// Run in memory-only mode, ignoring `data_dir`.
    #[serde(default)]
    pub memory_mode: bool,

    /// Largest accepted request body in MB.
    #[serde(default = "default_max_body_mb")]
    pub max_body_mb: usize,

    /// Maximum attempts when generating a name for `/frame`.
    #[serde(default = "default_max_name_attempts")]
    pub max_name_attempts: usize,

    /// Log every request at info level instead of debug.
    #[serde(default)]
    pub request_logging: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3737
}

fn default_max_body_mb() -> usize {
    64
}

fn default_max_name_attempts() -> usize {
    csvd_core::config::MAX_NAME_ATTEMPTS
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            data_dir: None,
            memory_mode: false,
            max_body_mb: default_max_body_mb(),
            max_name_attempts: default_max_name_attempts(),
            request_logging: false,
        }
    }
}

impl ServerConfig {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Saves configuration to a file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = self.to_toml()?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Converts configuration to TOML string.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Returns the socket address.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns the body limit in bytes.
    pub fn max_body_bytes(&self) -> usize {
        self.max_body_mb.saturating_mul(1024 * 1024)
    }

    /// Returns the store configuration this server config implies.
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            data_dir: if self.memory_mode {
                None
            } else {
                self.data_dir.clone()
            },
            max_name_attempts: self.max_name_attempts,
        }
    }

    /// Creates a builder for configuration.
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::new()
    }
}

/// Builder for server configuration.
#[derive(Default)]
pub struct ServerConfigBuilder {
    config: ServerConfig,
}

impl ServerConfigBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the host.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// Sets the port.
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Sets the data directory.
    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.data_dir = Some(dir.into());
        self
    }

    /// Enables memory mode.
    pub fn memory_mode(mut self, enabled: bool) -> Self {
        self.config.memory_mode = enabled;
        self
    }

    /// Sets the body limit in MB.
    pub fn max_body_mb(mut self, mb: usize) -> Self {
        self.config.max_body_mb = mb;
        self
    }

    /// Sets the name generation attempt limit.
    pub fn max_name_attempts(mut self, attempts: usize) -> Self {
        self.config.max_name_attempts = attempts;
        self
    }

    /// Enables per-request info logging.
    pub fn request_logging(mut self, enabled: bool) -> Self {
        self.config.request_logging = enabled;
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> ServerConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3737);
        assert_eq!(config.max_body_mb, 64);
        assert!(!config.memory_mode);
        assert!(config.data_dir.is_none());
    }

    #[test]
    fn test_builder() {
        let config = ServerConfig::builder()
            .host("localhost")
            .port(5433)
            .memory_mode(true)
            .max_body_mb(8)
            .build();

        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 5433);
        assert!(config.memory_mode);
        assert_eq!(config.max_body_bytes(), 8 * 1024 * 1024);
        assert_eq!(config.socket_addr(), "localhost:5433");
    }

    #[test]
    fn test_to_toml() {
        let config = ServerConfig::default();
        let toml = config.to_toml().unwrap();
        assert!(toml.contains("host"));
        assert!(toml.contains("port"));
        assert!(toml.contains("max_body_mb"));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: ServerConfig = toml::from_str("port = 4000\n").unwrap();
        assert_eq!(config.port, 4000);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.max_name_attempts, 64);
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");

        let config = ServerConfig::builder()
            .host("testhost")
            .port(9999)
            .data_dir("/var/lib/csvd")
            .build();

        config.save(&path).unwrap();

        let loaded = ServerConfig::from_file(&path).unwrap();
        assert_eq!(loaded.host, "testhost");
        assert_eq!(loaded.port, 9999);
        assert_eq!(loaded.data_dir, Some(PathBuf::from("/var/lib/csvd")));
    }

    #[test]
    fn test_store_config() {
        let config = ServerConfig::builder().data_dir("/data/csvd").build();
        assert_eq!(
            config.store_config().data_dir,
            Some(PathBuf::from("/data/csvd"))
        );

        let config = ServerConfig::builder()
            .data_dir("/data/csvd")
            .memory_mode(true)
            .build();
        assert!(!config.store_config().is_persistent());
    }
}
