//! Configuration schema for viewercount
//!
//! Configuration is read from `~/.config/viewercount/config.toml` when it
//! exists; every key has a default.

use serde::{Deserialize, Serialize};

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// HTTP server settings
    pub server: ServerConfig,

    /// Session tracking limits
    pub sessions: SessionsConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Production mode hides the debug endpoint and per-request logging
    pub production: bool,

    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            production: false,
            log_format: "text".to_string(),
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Allowed cross-origin sources; entries may contain `*` wildcards
    pub cors_origins: Vec<String>,

    /// Maximum accepted request body size
    pub body_limit_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
            cors_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:8000".to_string(),
            ],
            body_limit_bytes: 10 * 1024 * 1024,
        }
    }
}

/// Session tracking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionsConfig {
    /// Idle time in milliseconds before a session expires
    pub timeout_ms: u64,

    /// Interval in milliseconds between background sweeps
    pub cleanup_interval_ms: u64,

    /// Maximum number of sessions tracked at once
    pub max_sessions: usize,

    /// Sessions evicted beyond the overflow once the cap is hit
    pub eviction_buffer: usize,

    /// Fraction of heartbeats that also sweep expired sessions (0.0 - 1.0)
    pub sweep_sample_rate: f64,

    /// Stored user agents are cut to this many characters
    pub user_agent_max_len: usize,
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 60_000,
            cleanup_interval_ms: 30_000,
            max_sessions: 10_000,
            eviction_buffer: 100,
            sweep_sample_rate: 0.1,
            user_agent_max_len: 100,
        }
    }
}
