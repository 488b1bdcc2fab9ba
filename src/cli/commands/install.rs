//! Install command - precache a generation and register its worker

use crate::cli::args::InstallArgs;
use crate::cli::commands::{create_spinner, LoadedRegistration, CHECK};
use crate::config::Config;
use crate::error::ShellResult;
use crate::worker::InstallOutcome;
use console::style;

/// Execute the install command
pub async fn execute(args: InstallArgs, config: &Config) -> ShellResult<()> {
    let version = args.label.unwrap_or_else(|| config.cache.version.clone());
    let mut loaded = LoadedRegistration::open(config).await?;

    let pb = create_spinner(&format!(
        "Precaching {} resource(s) into {}...",
        config.cache.manifest.len(),
        version
    ));

    // The record is only saved on success; a failed install changes nothing
    let result = loaded.registration.register(&version).await;
    pb.finish_and_clear();
    let outcome = result?;
    loaded.save().await?;

    let worker = outcome.worker();
    match outcome {
        InstallOutcome::Activated(_) => println!(
            "{} Worker {} installed and active for {}",
            CHECK,
            short_id(&worker.id.to_string()),
            style(&worker.version).green().bold()
        ),
        InstallOutcome::Waiting(_) => {
            println!(
                "{} Worker {} installed for {} and waiting",
                CHECK,
                short_id(&worker.id.to_string()),
                style(&worker.version).yellow().bold()
            );
            println!(
                "  {}",
                style("Run: offline-shell activate to take control").dim()
            );
        }
        InstallOutcome::AlreadyActive(_) => println!(
            "{} Generation {} is already active",
            CHECK,
            style(&worker.version).green()
        ),
        InstallOutcome::AlreadyWaiting(_) => println!(
            "{} Generation {} is already installed and waiting",
            CHECK,
            style(&worker.version).yellow()
        ),
    }

    Ok(())
}

pub(crate) fn short_id(id: &str) -> &str {
    &id[..8.min(id.len())]
}
