//! CLI argument definitions using clap derive

use crate::config::ConfigOverrides;
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

/// viewercount - live viewer counter
///
/// Tracks how many clients are viewing a page from short-lived heartbeats,
/// entirely in memory.
#[derive(Parser, Debug)]
#[command(name = "viewercount")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "VIEWERCOUNT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Settings that override the configuration file
    #[command(flatten)]
    pub settings: SettingsArgs,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP API
    Serve,

    /// Show or initialize configuration
    Config(ConfigArgs),
}

/// Overrides applied on top of the configuration file
#[derive(Args, Debug, Default)]
pub struct SettingsArgs {
    /// Session timeout in milliseconds
    #[arg(long, global = true, env = "SESSION_TIMEOUT")]
    pub session_timeout: Option<u64>,

    /// Interval between background sweeps in milliseconds
    #[arg(long, global = true, env = "CLEANUP_INTERVAL")]
    pub cleanup_interval: Option<u64>,

    /// Maximum number of tracked sessions
    #[arg(long, global = true, env = "MAX_SESSIONS")]
    pub max_sessions: Option<usize>,

    /// Sessions evicted beyond the overflow when the cap is hit
    #[arg(long, global = true, env = "EVICTION_BUFFER")]
    pub eviction_buffer: Option<usize>,

    /// Fraction of heartbeats that also sweep expired sessions
    #[arg(long, global = true, env = "SWEEP_SAMPLE_RATE")]
    pub sweep_sample_rate: Option<f64>,

    /// Address to bind
    #[arg(long, global = true, env = "VIEWERCOUNT_HOST")]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short, long, global = true, env = "PORT")]
    pub port: Option<u16>,

    /// Allowed CORS origins (comma-separated, `*` wildcards allowed)
    #[arg(long, global = true, env = "CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Vec<String>,

    /// Production mode: disables the debug endpoint and request logging
    #[arg(long, global = true, env = "PRODUCTION")]
    pub production: bool,

    /// Log format: text or json
    #[arg(long, global = true, env = "LOG_FORMAT")]
    pub log_format: Option<String>,
}

impl From<&SettingsArgs> for ConfigOverrides {
    fn from(args: &SettingsArgs) -> Self {
        Self {
            session_timeout_ms: args.session_timeout,
            cleanup_interval_ms: args.cleanup_interval,
            max_sessions: args.max_sessions,
            eviction_buffer: args.eviction_buffer,
            sweep_sample_rate: args.sweep_sample_rate,
            host: args.host.clone(),
            port: args.port,
            cors_origins: args.cors_origins.clone(),
            production: args.production,
            log_format: args.log_format.clone(),
        }
    }
}

/// Arguments for the config command
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show effective configuration (file plus overrides)
    Show,

    /// Show configuration file path
    Path,

    /// Write the default configuration file
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },
}
