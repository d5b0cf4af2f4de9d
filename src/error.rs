//! Error types for viewercount
//!
//! All modules use `ViewerResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for viewercount operations
pub type ViewerResult<T> = Result<T, ViewerError>;

/// All errors that can occur in viewercount
#[derive(Error, Debug)]
pub enum ViewerError {
    // Caller errors
    #[error("Missing required field: {0}")]
    InvalidInput(&'static str),

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid configuration at {path}: {reason}")]
    ConfigParse { path: PathBuf, reason: String },

    #[error("Configuration file not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Server errors
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ViewerError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create an error for a missing or empty required field
    pub fn invalid_input(field: &'static str) -> Self {
        Self::InvalidInput(field)
    }

    /// Whether the caller caused the error and can fix it by retrying
    /// with different input
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::ConfigNotFound(_) => Some("Run: viewercount config init"),
            Self::Bind { .. } => Some("Pick a free port with --port or PORT"),
            Self::InvalidConfig(_) | Self::ConfigParse { .. } => {
                Some("Run: viewercount config show")
            }
            _ => None,
        }
    }
}
