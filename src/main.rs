//! viewercount - live viewer counter
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use viewercount::cli::args::{ConfigAction, ConfigArgs};
use viewercount::cli::{Cli, Commands};
use viewercount::config::{Config, ConfigManager, ConfigOverrides};
use viewercount::error::ViewerResult;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> ViewerResult<()> {
    let cli = Cli::parse();

    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };

    // Path and init must work even when the existing file is broken
    let skip_load = matches!(
        cli.command,
        Commands::Config(ConfigArgs {
            action: Some(ConfigAction::Path | ConfigAction::Init { .. })
        })
    );

    let config = if skip_load {
        Config::default()
    } else {
        let overrides = ConfigOverrides::from(&cli.settings);
        config_manager.load_effective(&overrides).await?
    };
    init_logging(&cli, &config);

    match cli.command {
        Commands::Serve => viewercount::cli::commands::serve(config).await,
        Commands::Config(args) => {
            viewercount::cli::commands::config(args, &config_manager, &config).await
        }
    }
}

/// Initialize logging: RUST_LOG wins, otherwise 0 = info for serve and warn
/// for everything else, 1 = info, 2+ = debug
fn init_logging(cli: &Cli, config: &Config) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match cli.verbose {
        0 if matches!(cli.command, Commands::Serve) => EnvFilter::new("viewercount=info"),
        0 => EnvFilter::new("viewercount=warn"),
        1 => EnvFilter::new("viewercount=info,tower_http=info"),
        _ => EnvFilter::new("viewercount=debug,tower_http=debug"),
    });

    if config.general.log_format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    }
}
