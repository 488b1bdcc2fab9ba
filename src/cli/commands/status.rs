//! Status command - show workers and cache generations

use crate::cli::args::{OutputFormat, StatusArgs};
use crate::cli::commands::install::short_id;
use crate::cli::commands::LoadedRegistration;
use crate::config::Config;
use crate::error::ShellResult;
use crate::worker::WorkerRecord;
use console::style;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct GenerationStatus {
    label: String,
    entries: usize,
    current: bool,
}

#[derive(Debug, Serialize)]
struct StatusReport<'a> {
    origin: &'a str,
    backend: &'static str,
    active: Option<&'a WorkerRecord>,
    waiting: Option<&'a WorkerRecord>,
    generations: Vec<GenerationStatus>,
}

/// Execute the status command
pub async fn execute(args: StatusArgs, config: &Config) -> ShellResult<()> {
    let loaded = LoadedRegistration::open(config).await?;
    let registration = &loaded.registration;
    let storage = registration.storage();
    let current = registration.active().map(|w| w.version.as_str());

    let mut generations = Vec::new();
    for label in storage.generations().await? {
        let entries = storage.entries(&label).await?.len();
        generations.push(GenerationStatus {
            current: current == Some(label.as_str()),
            label,
            entries,
        });
    }

    let report = StatusReport {
        origin: &config.origin.base_url,
        backend: storage.backend_name(),
        active: registration.active(),
        waiting: registration.waiting(),
        generations,
    };

    match args.format {
        OutputFormat::Table => print_table(&report),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Plain => print_plain(&report),
    }

    Ok(())
}

fn print_table(report: &StatusReport<'_>) {
    println!("{}", style("offline-shell status").bold().cyan());
    println!();
    println!("{} {}", style("Origin:").bold(), report.origin);
    println!("{} {}", style("Storage:").bold(), report.backend);
    println!();

    println!("{}", style("Workers:").bold());
    print_worker("active", report.active);
    print_worker("waiting", report.waiting);
    println!();

    println!("{}", style("Generations:").bold());
    if report.generations.is_empty() {
        println!("  {}", style("none").dim());
        return;
    }
    println!("  {:<20} {:<10} {:<10}", "LABEL", "ENTRIES", "CURRENT");
    for generation in &report.generations {
        let current = if generation.current {
            style("yes").green().to_string()
        } else {
            style("no").dim().to_string()
        };
        println!(
            "  {:<20} {:<10} {:<10}",
            generation.label, generation.entries, current
        );
    }
}

fn print_worker(role: &str, worker: Option<&WorkerRecord>) {
    match worker {
        Some(w) => println!(
            "  {:<8} {} {} ({}, since {})",
            role,
            style(&w.version).green(),
            short_id(&w.id.to_string()),
            w.state,
            w.updated_at.format("%Y-%m-%d %H:%M")
        ),
        None => println!("  {:<8} {}", role, style("none").dim()),
    }
}

fn print_plain(report: &StatusReport<'_>) {
    let version = |w: Option<&WorkerRecord>| w.map(|w| w.version.clone()).unwrap_or_default();
    println!("active={}", version(report.active));
    println!("waiting={}", version(report.waiting));
    for generation in &report.generations {
        println!("generation={} entries={}", generation.label, generation.entries);
    }
}
