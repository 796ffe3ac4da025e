//! CLI definitions using clap.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for list/query commands.
#[derive(ValueEnum, Clone, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable table (default)
    #[default]
    Table,
    /// JSON (same as --json)
    Json,
    /// Comma-separated values
    Csv,
}

pub mod commands;

/// formstore - Relational storage for dynamic-form submissions
#[derive(Parser, Debug)]
#[command(name = "formstore", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Database path (default: ~/.formstore/data/formstore.db)
    #[arg(long, global = true, env = "FORMSTORE_DB")]
    pub db: Option<PathBuf>,

    /// Actor name for audit trail
    #[arg(long, global = true, env = "FORMSTORE_ACTOR")]
    pub actor: Option<String>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Output format (table, json, csv)
    #[arg(long, value_enum, global = true, default_value_t)]
    pub format: OutputFormat,

    /// Print nothing on success except requested data
    #[arg(long, global = true)]
    pub silent: bool,

    /// Preview changes without writing to the database
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (no output except errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the database
    Init {
        /// Overwrite existing database
        #[arg(long)]
        force: bool,
    },

    /// Print version information
    Version,

    /// Store a form result
    Submit(SubmitArgs),

    /// List the form results of a form, most recent first
    List {
        /// Form ID
        form_id: String,
    },

    /// List the forms that have stored results
    Forms,

    /// Export form results to a JSONL file
    Export(ExportArgs),

    /// Import form results from a JSONL file
    Import {
        /// JSONL file written by `formstore export`
        file: PathBuf,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completions.
#[derive(clap::ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

#[derive(Args, Debug)]
pub struct SubmitArgs {
    /// Form ID the result belongs to
    pub form_id: String,

    /// Free-text answer as KEY=VALUE (repeatable)
    #[arg(long = "text", value_name = "KEY=VALUE")]
    pub text: Vec<String>,

    /// Choice answer as KEY=OPT[,OPT...] (repeatable)
    #[arg(long = "choice", value_name = "KEY=OPTS")]
    pub choice: Vec<String>,

    /// Creation time as RFC 3339 (default: now)
    #[arg(long)]
    pub at: Option<String>,
}

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Form ID to export
    #[arg(required_unless_present = "all", conflicts_with = "all")]
    pub form_id: Option<String>,

    /// Export every form
    #[arg(long)]
    pub all: bool,

    /// Output file (default: <FORM_ID>.jsonl, or formstore.jsonl with --all)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}
