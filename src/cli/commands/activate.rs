//! Activate command - signal the waiting worker to take control

use crate::cli::commands::install::short_id;
use crate::cli::commands::{create_spinner, LoadedRegistration, CHECK};
use crate::config::Config;
use crate::error::ShellResult;
use crate::worker::WorkerMessage;
use console::style;

/// Execute the activate command
pub async fn execute(config: &Config) -> ShellResult<()> {
    let mut loaded = LoadedRegistration::open(config).await?;
    let previous = loaded.registration.active().map(|w| w.version.clone());

    let pb = create_spinner("Activating waiting worker...");
    let result = loaded
        .registration
        .post_message(&WorkerMessage::SkipWaiting.to_json()?)
        .await;
    pb.finish_and_clear();
    let worker = result?;
    loaded.save().await?;

    match previous {
        Some(previous) => println!(
            "{} Worker {} active for {} (replaced {})",
            CHECK,
            short_id(&worker.id.to_string()),
            style(&worker.version).green().bold(),
            style(previous).dim()
        ),
        None => println!(
            "{} Worker {} active for {}",
            CHECK,
            short_id(&worker.id.to_string()),
            style(&worker.version).green().bold()
        ),
    }

    Ok(())
}
