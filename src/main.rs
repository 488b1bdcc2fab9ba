//! offline-shell - network-first offline cache for an app shell
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use offline_shell::cli::args::ConfigAction;
use offline_shell::cli::{commands, Cli, Commands};
use offline_shell::config::ConfigManager;
use offline_shell::error::{ShellError, ShellResult};
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

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

async fn run() -> ShellResult<()> {
    let cli = Cli::parse();

    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };

    // An explicit config path must exist, except for commands that create or locate it
    let creates_config = matches!(
        cli.command,
        Commands::Config(ref args)
            if matches!(args.action, Some(ConfigAction::Init { .. }) | Some(ConfigAction::Path))
    );
    if cli.config.is_some() && !creates_config && !config_manager.path().exists() {
        return Err(ShellError::ConfigNotFound(config_manager.path().to_path_buf()));
    }

    let config = config_manager.load().await?;

    // Initialize logging: 0 = warn, 1 = info, 2+ = debug
    let filter = match cli.verbose {
        0 => EnvFilter::new("offline_shell=warn"),
        1 => EnvFilter::new("offline_shell=info"),
        _ => EnvFilter::new("offline_shell=debug"),
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr);
    if config.general.log_format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
    debug!("Using config {}", config_manager.path().display());

    match cli.command {
        Commands::Install(args) => commands::install(args, &config).await,
        Commands::Activate => commands::activate(&config).await,
        Commands::Fetch(args) => commands::fetch(args, &config).await,
        Commands::Status(args) => commands::status(args, &config).await,
        Commands::Cache(args) => commands::cache(args, &config).await,
        Commands::Config(args) => commands::config(args, &config_manager, &config).await,
    }
}
