//! CLI command definitions.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Tessera - batch generation pipeline
#[derive(Parser, Debug)]
#[command(name = "tessera")]
#[command(about = "Run rows of data through configurable generation steps", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a pipeline over a file of rows
    Run {
        /// Path to the pipeline TOML file
        #[arg(short, long)]
        config: PathBuf,

        /// Rows as a JSON array or JSON Lines (.jsonl)
        #[arg(short, long)]
        input: PathBuf,

        /// Write results here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Override the configured row concurrency
        #[arg(long)]
        concurrency: Option<usize>,
    },

    /// Check a pipeline configuration without running it
    Validate {
        /// Path to the pipeline TOML file
        #[arg(short, long)]
        config: PathBuf,
    },
}
