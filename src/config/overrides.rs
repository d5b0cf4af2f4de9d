//! Environment and command-line overrides on top of the config file

use crate::config::schema::Config;
use crate::error::{ViewerError, ViewerResult};

/// Values that take precedence over the config file
///
/// `None` (or an empty list) leaves the file/default value in place.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub session_timeout_ms: Option<u64>,
    pub cleanup_interval_ms: Option<u64>,
    pub max_sessions: Option<usize>,
    pub eviction_buffer: Option<usize>,
    pub sweep_sample_rate: Option<f64>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub cors_origins: Vec<String>,
    pub production: bool,
    pub log_format: Option<String>,
}

impl ConfigOverrides {
    /// Write every set override into `config`
    pub fn apply(&self, config: &mut Config) {
        if let Some(v) = self.session_timeout_ms {
            config.sessions.timeout_ms = v;
        }
        if let Some(v) = self.cleanup_interval_ms {
            config.sessions.cleanup_interval_ms = v;
        }
        if let Some(v) = self.max_sessions {
            config.sessions.max_sessions = v;
        }
        if let Some(v) = self.eviction_buffer {
            config.sessions.eviction_buffer = v;
        }
        if let Some(v) = self.sweep_sample_rate {
            config.sessions.sweep_sample_rate = v;
        }
        if let Some(ref v) = self.host {
            config.server.host = v.clone();
        }
        if let Some(v) = self.port {
            config.server.port = v;
        }
        if !self.cors_origins.is_empty() {
            config.server.cors_origins = self
                .cors_origins
                .iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if self.production {
            config.general.production = true;
        }
        if let Some(ref v) = self.log_format {
            config.general.log_format = v.clone();
        }
    }
}

impl Config {
    /// Reject settings the registry or server cannot honour
    pub fn validate(&self) -> ViewerResult<()> {
        let s = &self.sessions;

        if s.timeout_ms == 0 {
            return Err(invalid("sessions.timeout_ms must be greater than 0"));
        }
        if s.cleanup_interval_ms == 0 {
            return Err(invalid("sessions.cleanup_interval_ms must be greater than 0"));
        }
        if s.max_sessions == 0 {
            return Err(invalid("sessions.max_sessions must be greater than 0"));
        }
        if s.eviction_buffer >= s.max_sessions {
            return Err(invalid(format!(
                "sessions.eviction_buffer ({}) must be smaller than sessions.max_sessions ({})",
                s.eviction_buffer, s.max_sessions
            )));
        }
        if !(0.0..=1.0).contains(&s.sweep_sample_rate) {
            return Err(invalid(format!(
                "sessions.sweep_sample_rate must be between 0 and 1, got {}",
                s.sweep_sample_rate
            )));
        }
        if !matches!(self.general.log_format.as_str(), "text" | "json") {
            return Err(invalid(format!(
                "general.log_format must be \"text\" or \"json\", got \"{}\"",
                self.general.log_format
            )));
        }

        Ok(())
    }
}

fn invalid(reason: impl Into<String>) -> ViewerError {
    ViewerError::InvalidConfig(reason.into())
}
