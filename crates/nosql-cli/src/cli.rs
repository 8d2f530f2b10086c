//! `nosqlb` - inspect NoSQL table schemas and page through table rows from
//! the terminal

mod commands;
mod logging;
mod render;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use nosql_core::ProfileKind;
use nosql_settings::Settings;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "nosqlb", version, about = "Browse NoSQL table schemas and rows")]
pub struct Cli {
    /// Settings file to use instead of the default location
    #[arg(long, global = true, env = "NOSQLB_SETTINGS")]
    pub settings: Option<PathBuf>,

    /// Log at debug level (overrides the configured filter, not RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the schema tree of a store fixture or a JSON description
    Describe {
        #[command(flatten)]
        source: ModelSource,
        /// Only this table
        #[arg(long)]
        table: Option<String>,
    },
    /// Print the DDL that recreates tables and their indexes
    Ddl {
        #[command(flatten)]
        source: ModelSource,
        #[arg(long)]
        table: Option<String>,
    },
    /// Page through the rows of a table in a store fixture
    Browse {
        /// Store fixture file
        #[arg(long)]
        fixture: PathBuf,
        #[arg(long)]
        table: String,
        /// Rows per page (defaults to the configured page size)
        #[arg(long)]
        page_size: Option<usize>,
        /// Number of pages to print
        #[arg(long, default_value_t = 1)]
        pages: usize,
        /// Print every page
        #[arg(long, conflicts_with = "pages")]
        all: bool,
        /// Show each row as its primary key plus the remaining columns
        #[arg(long)]
        collection: bool,
    },
    /// Manage connection profiles
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },
}

#[derive(Debug, Subcommand)]
pub enum ProfileAction {
    /// Validate a profile given as key=value properties
    Check {
        /// cloud, cloudsim or onprem
        #[arg(long, value_parser = parse_kind)]
        kind: ProfileKind,
        /// Profile properties, e.g. endpoint=localhost:5000
        #[arg(value_parser = parse_property)]
        properties: Vec<(String, String)>,
        /// Save the profile under this name when it is valid
        #[arg(long)]
        save: Option<String>,
        /// Replace a saved profile with the same name
        #[arg(long, requires = "save")]
        overwrite: bool,
    },
    /// List saved profiles
    List,
    /// Remove a saved profile
    Remove { name: String },
}

/// Where the schema comes from
#[derive(Debug, Clone, Args)]
#[group(required = true, multiple = false)]
pub struct ModelSource {
    /// Store fixture file, read as a live store
    #[arg(long)]
    pub fixture: Option<PathBuf>,
    /// JSON schema description file
    #[arg(long)]
    pub description: Option<PathBuf>,
}

fn parse_kind(s: &str) -> std::result::Result<ProfileKind, String> {
    ProfileKind::from_name(s).ok_or_else(|| format!("unknown profile kind '{s}'"))
}

fn parse_property(s: &str) -> std::result::Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| format!("expected key=value, got '{s}'"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings_path = match &cli.settings {
        Some(path) => path.clone(),
        None => Settings::settings_path()?,
    };
    let settings = Settings::load_from(&settings_path)
        .with_context(|| format!("Failed to load settings from {:?}", settings_path))?;

    logging::init(&settings.logging, cli.verbose)?;
    tracing::debug!(path = ?settings_path, "settings loaded");
    if cli.settings.is_none() {
        if let Err(e) = nosql_settings::ensure_directories() {
            tracing::warn!(error = %e, "could not create application directories");
        }
    }

    let output = commands::run(cli.command, settings, settings_path).await?;
    print!("{output}");
    Ok(())
}
