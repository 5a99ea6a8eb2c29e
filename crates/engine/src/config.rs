//! Connection configuration via `redisugar.toml`
//!
//! A config file describes one store endpoint and the client's pool and
//! timeout settings. Missing fields fall back to defaults, so an empty file
//! is a valid config pointing at a local store.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use sugar_core::{Error, Result};
use sugar_wire::WireOptions;

use crate::registry::Endpoint;

/// Conventional config file name
pub const CONFIG_FILE_NAME: &str = "redisugar.toml";

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    6379
}

fn default_pool_size() -> usize {
    4
}

fn default_connect_timeout_ms() -> u64 {
    2000
}

fn default_io_timeout_ms() -> u64 {
    5000
}

/// Client configuration loaded from `redisugar.toml`.
///
/// # Example
///
/// ```toml
/// host = "127.0.0.1"
/// port = 6379
/// db = 0
/// pool_size = 4
/// connect_timeout_ms = 2000
/// io_timeout_ms = 5000
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SugarConfig {
    /// Store host name or address
    #[serde(default = "default_host")]
    pub host: String,
    /// Store TCP port
    #[serde(default = "default_port")]
    pub port: u16,
    /// Logical database index
    #[serde(default)]
    pub db: u32,
    /// Idle connections kept per endpoint
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,
    /// Connect timeout in milliseconds
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Socket read/write timeout in milliseconds
    #[serde(default = "default_io_timeout_ms")]
    pub io_timeout_ms: u64,
}

impl Default for SugarConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            db: 0,
            pool_size: default_pool_size(),
            connect_timeout_ms: default_connect_timeout_ms(),
            io_timeout_ms: default_io_timeout_ms(),
        }
    }
}

impl SugarConfig {
    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# redisugar client configuration
#
# Store endpoint. One gateway is created per distinct (host, port, db).
host = "127.0.0.1"
port = 6379
db = 0

# Idle connections kept for reuse (default: 4)
pool_size = 4

# Timeouts in milliseconds
connect_timeout_ms = 2000
io_timeout_ms = 5000
"#
    }

    /// Check field ranges.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for an empty host, port 0, a zero pool size or a
    /// zero timeout.
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(Error::invalid("host must not be empty"));
        }
        if self.port == 0 {
            return Err(Error::invalid("port must not be 0"));
        }
        if self.pool_size == 0 {
            return Err(Error::invalid("pool_size must be at least 1"));
        }
        if self.connect_timeout_ms == 0 || self.io_timeout_ms == 0 {
            return Err(Error::invalid("timeouts must be greater than 0"));
        }
        Ok(())
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Serialization(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: SugarConfig = toml::from_str(&content).map_err(|e| {
            Error::Serialization(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Write the default config file if it does not already exist.
    ///
    /// Returns `Ok(())` whether the file was created or already existed.
    pub fn write_default_if_missing(path: &Path) -> Result<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml()).map_err(|e| {
                Error::Serialization(format!(
                    "Failed to write default config file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Serialization(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content).map_err(|e| {
            Error::Serialization(format!(
                "Failed to write config file '{}': {}",
                path.display(),
                e
            ))
        })
    }

    /// Registry key for this config
    pub fn endpoint(&self) -> Endpoint {
        Endpoint {
            host: self.host.clone(),
            port: self.port,
            db: self.db,
        }
    }

    /// Transport options for this config
    pub fn wire_options(&self) -> WireOptions {
        WireOptions {
            host: self.host.clone(),
            port: self.port,
            db: self.db,
            pool_size: self.pool_size,
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            io_timeout: Duration::from_millis(self.io_timeout_ms),
        }
    }
}
