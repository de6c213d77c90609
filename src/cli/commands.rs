//! CLI commands and argument parsing

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Profile-driven tabular uploader
#[derive(Parser, Debug)]
#[command(name = "dbase-uploader")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (YAML or JSON)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Session file (overrides the configured state_path)
    #[arg(short, long, global = true)]
    pub state: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List built-in profiles
    Profiles,

    /// Verify warehouse and staging access for the active session
    Check,

    /// Read and coerce one file without loading it
    Preview {
        /// Input file (CSV or spreadsheet)
        file: PathBuf,

        /// Profile name or YAML path
        #[arg(short, long, default_value = "daily")]
        profile: String,

        /// Number of coerced rows to show
        #[arg(long, default_value = "3")]
        rows: usize,
    },

    /// Start a new session over a queue of files
    Enqueue {
        /// Profile name or YAML path
        #[arg(short, long)]
        profile: String,

        /// Files in processing order
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Latest admissible date (YYYY-MM-DD)
        #[arg(long)]
        cutoff: Option<NaiveDate>,

        /// Delete overlapping destination rows instead of skipping the file
        #[arg(long)]
        overwrite: bool,
    },

    /// Process the next queued file
    Step,

    /// Process queued files until the queue is done or a fatal error halts it
    Run {
        /// Stop after this many files
        #[arg(long)]
        max_files: Option<usize>,
    },

    /// Show session progress
    Status,

    /// Reset progress to an empty queue
    Reset,

    /// Start HTTP server mode
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one message per line)
    Json,
    /// Human-readable output
    Pretty,
}
