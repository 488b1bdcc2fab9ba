//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// offline-shell - network-first offline cache for an app shell
///
/// Precaches the application shell into a versioned cache generation, serves
/// requests network-first with a cache fallback and rotates generations
/// through an install/activate lifecycle.
#[derive(Parser, Debug)]
#[command(name = "offline-shell")]
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
    #[arg(short, long, global = true, env = "OFFLINE_SHELL_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Install a worker and precache its generation
    Install(InstallArgs),

    /// Activate the waiting worker (posts SKIP_WAITING)
    Activate,

    /// Fetch a resource through the active worker
    Fetch(FetchArgs),

    /// Show active and waiting workers and cache generations
    Status(StatusArgs),

    /// Inspect cached entries
    Cache(CacheArgs),

    /// Show or edit configuration
    Config(ConfigArgs),
}

/// Arguments for the install command
#[derive(Parser, Debug)]
pub struct InstallArgs {
    /// Generation label (defaults to cache.version from config)
    #[arg(short, long)]
    pub label: Option<String>,
}

/// Arguments for the fetch command
#[derive(Parser, Debug)]
pub struct FetchArgs {
    /// URL or origin-relative path
    pub url: String,

    /// Request method
    #[arg(short = 'X', long, default_value = "GET")]
    pub method: String,

    /// Request body
    #[arg(short, long)]
    pub data: Option<String>,

    /// Extra request headers (Name: value)
    #[arg(short = 'H', long = "header", value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    /// Print status line and headers before the body
    #[arg(short, long)]
    pub include: bool,

    /// Write the body to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for the status command
#[derive(Parser, Debug)]
pub struct StatusArgs {
    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

/// Output format for listings
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON output
    Json,
    /// Simple text (one per line)
    Plain,
}

/// Arguments for the cache command
#[derive(Parser, Debug)]
pub struct CacheArgs {
    /// Subcommand for cache
    #[command(subcommand)]
    pub action: CacheAction,
}

/// Cache subcommands
#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// List entries of a generation
    List {
        /// Generation label (defaults to the active generation)
        #[arg(short, long)]
        generation: Option<String>,

        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// List generation labels
    Generations,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., cache.version)
        key: String,
        /// Value to set
        value: String,
    },
}

/// Parse a header in `Name: value` format
fn parse_header(s: &str) -> Result<(String, String), String> {
    let pos = s
        .find(':')
        .ok_or_else(|| format!("invalid header format: no ':' found in '{s}'"))?;
    let name = s[..pos].trim();
    if name.is_empty() {
        return Err(format!("invalid header format: empty name in '{s}'"));
    }
    Ok((name.to_string(), s[pos + 1..].trim().to_string()))
}
