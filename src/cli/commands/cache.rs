//! Cache command - inspect cache generations and their entries

use crate::cache::{CacheEntry, CacheStorage};
use crate::cli::args::{CacheAction, CacheArgs, OutputFormat};
use crate::cli::commands::LoadedRegistration;
use crate::config::Config;
use crate::error::{ShellError, ShellResult};
use console::style;
use serde::Serialize;

/// Execute the cache command
pub async fn execute(args: CacheArgs, config: &Config) -> ShellResult<()> {
    let loaded = LoadedRegistration::open(config).await?;
    let storage = loaded.registration.storage();

    match args.action {
        CacheAction::List { generation, format } => {
            let label = match generation {
                Some(label) => label,
                None => loaded
                    .registration
                    .active()
                    .map(|w| w.version.clone())
                    .ok_or(ShellError::NoActiveWorker)?,
            };
            list_entries(storage.as_ref(), &label, format).await
        }
        CacheAction::Generations => {
            for label in storage.generations().await? {
                println!("{}", label);
            }
            Ok(())
        }
    }
}

/// List entries of one generation
async fn list_entries(
    storage: &dyn CacheStorage,
    label: &str,
    format: OutputFormat,
) -> ShellResult<()> {
    if !storage.has(label).await? {
        return Err(ShellError::GenerationNotFound(label.to_string()));
    }
    let entries = storage.entries(label).await?;

    match format {
        OutputFormat::Table => print_table(label, &entries),
        OutputFormat::Json => print_json(&entries)?,
        OutputFormat::Plain => {
            for entry in &entries {
                println!("{}", entry.key.url);
            }
        }
    }

    Ok(())
}

fn print_table(label: &str, entries: &[CacheEntry]) {
    println!("{} {}", style("Generation").bold(), style(label).cyan());
    println!();

    if entries.is_empty() {
        println!("No cached entries.");
        return;
    }

    println!(
        "{:<8} {:<40} {:<8} {:<10} {:<20}",
        "METHOD", "URL", "STATUS", "BYTES", "STORED"
    );
    println!("{}", "-".repeat(90));

    for entry in entries {
        let status = if entry.response.is_ok() {
            style(entry.response.status).green().to_string()
        } else {
            style(entry.response.status).yellow().to_string()
        };
        println!(
            "{:<8} {:<40} {:<8} {:<10} {:<20}",
            entry.key.method,
            entry.key.url,
            status,
            entry.response.body.len(),
            entry.stored_at.format("%Y-%m-%d %H:%M")
        );
    }

    println!();
    println!("Total: {} entr{}", entries.len(), if entries.len() == 1 { "y" } else { "ies" });
}

fn print_json(entries: &[CacheEntry]) -> ShellResult<()> {
    #[derive(Serialize)]
    struct EntryJson<'a> {
        method: String,
        url: &'a str,
        status: u16,
        bytes: usize,
        stored_at: String,
    }

    let json: Vec<_> = entries
        .iter()
        .map(|e| EntryJson {
            method: e.key.method.to_string(),
            url: &e.key.url,
            status: e.response.status,
            bytes: e.response.body.len(),
            stored_at: e.stored_at.to_rfc3339(),
        })
        .collect();

    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
