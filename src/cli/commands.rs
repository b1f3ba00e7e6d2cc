//! CLI commands and argument parsing

use crate::config::IngestConfig;
use crate::types::SchemaVariant;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Ingest an account's followers into a local DuckDB table
#[derive(Parser, Debug)]
#[command(name = "follower-ingest")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (YAML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value = "text")]
    pub log_format: LogFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// The subcommand to execute; `run` when none is given
    pub fn command(&self) -> Commands {
        self.command
            .clone()
            .unwrap_or_else(|| Commands::Run(RunArgs::default()))
    }
}

/// CLI subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Fetch every page and upsert it into the database
    Run(RunArgs),

    /// Create the follower table and exit
    InitDb(StoreArgs),

    /// Print the effective configuration as YAML
    ShowConfig(RunArgs),
}

/// Database overrides
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreArgs {
    /// DuckDB database file
    #[arg(long)]
    pub database: Option<PathBuf>,

    /// Table name
    #[arg(long)]
    pub table: Option<String>,

    /// Record shape
    #[arg(long)]
    pub schema: Option<SchemaVariant>,
}

impl StoreArgs {
    /// Apply the overrides to a loaded configuration
    pub fn apply(&self, config: &mut IngestConfig) {
        if let Some(path) = &self.database {
            config.store.path.clone_from(path);
        }
        if let Some(table) = &self.table {
            config.store.table.clone_from(table);
        }
        if let Some(schema) = self.schema {
            config.store.schema = schema;
        }
    }
}

/// Options for a run
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct RunArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Resume from this cursor instead of the beginning (or the checkpoint)
    #[arg(long)]
    pub cursor: Option<String>,

    /// Attempts per page before the run fails
    #[arg(long)]
    pub max_attempts: Option<u32>,

    /// Stop after this many committed pages
    #[arg(long)]
    pub max_pages: Option<u64>,

    /// Checkpoint file for automatic resume
    #[arg(long)]
    pub state: Option<PathBuf>,
}

impl RunArgs {
    /// Apply the overrides to a loaded configuration
    pub fn apply(&self, config: &mut IngestConfig) {
        self.store.apply(config);
        if let Some(max_attempts) = self.max_attempts {
            config.retry.max_attempts = max_attempts;
        }
        if let Some(max_pages) = self.max_pages {
            config.run.max_pages = Some(max_pages);
        }
        if let Some(state) = &self.state {
            config.run.state_file = Some(state.clone());
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per line
    Json,
}
