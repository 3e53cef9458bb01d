//! Runtime configuration.
//!
//! Values come from three layers, later ones winning: compiled-in defaults,
//! an optional YAML file named by `COINVAULT_CONFIG`, and the `LISTEN`
//! environment variable for the bind address.

use anyhow::Context;
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8080";
pub const DEFAULT_MAX_HEADER_BYTES: usize = 64 * 1024;
pub const DEFAULT_MAX_BODY_BYTES: usize = 8 * 1024 * 1024;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub http: HttpConfig,
}

/// Listener settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the listener binds to (e.g. "127.0.0.1:8080")
    pub listen_addr: String,
    /// Serve each connection on its own task instead of one at a time
    pub concurrent: bool,
    /// Max time to wait for request bytes; absent means wait forever
    pub read_timeout_ms: Option<u64>,
    /// Max time to spend writing a response; absent means wait forever
    pub write_timeout_ms: Option<u64>,
    /// Stop the listener after this long without a new connection
    pub idle_timeout_ms: Option<u64>,
}

/// Request parsing and error-reporting settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub max_header_bytes: usize,
    /// Largest Content-Length accepted; larger requests get a 400
    pub max_body_bytes: usize,
    /// Reject bodies shorter than their Content-Length instead of truncating
    pub strict_body_length: bool,
    /// Include the underlying error text in 500 responses
    pub expose_error_details: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
            concurrent: false,
            read_timeout_ms: None,
            write_timeout_ms: None,
            idle_timeout_ms: None,
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            max_header_bytes: DEFAULT_MAX_HEADER_BYTES,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            strict_body_length: false,
            expose_error_details: true,
        }
    }
}

impl ServerConfig {
    pub fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout_ms.map(Duration::from_millis)
    }

    pub fn write_timeout(&self) -> Option<Duration> {
        self.write_timeout_ms.map(Duration::from_millis)
    }

    pub fn idle_timeout(&self) -> Option<Duration> {
        self.idle_timeout_ms.map(Duration::from_millis)
    }
}

impl Config {
    /// Loads defaults, then the YAML file from `COINVAULT_CONFIG` if set,
    /// then applies the `LISTEN` override.
    pub fn load() -> anyhow::Result<Self> {
        let mut cfg = match std::env::var("COINVAULT_CONFIG") {
            Ok(path) => {
                let raw = std::fs::read_to_string(&path)
                    .with_context(|| format!("failed to read config file {}", path))?;
                Self::from_yaml_str(&raw)
                    .with_context(|| format!("invalid config file {}", path))?
            }
            Err(_) => Self::default(),
        };

        if let Ok(addr) = std::env::var("LISTEN") {
            cfg.server.listen_addr = addr;
        }

        Ok(cfg)
    }

    pub fn from_yaml_str(raw: &str) -> anyhow::Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        let cfg = serde_yaml::from_str(raw)?;
        Ok(cfg)
    }
}
