//! CLI command definitions using clap.
//!
//! Defines the main CLI structure and subcommands:
//! - generate: run the repair loop for one business record
//! - batch: run the loop for a pool of records with bounded concurrency
//! - check: validate an existing content spec without generating

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Pagewright - content generation and repair engine for local business pages
#[derive(Parser, Debug)]
#[command(name = "pagewright")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a content spec for one business record
    Generate {
        /// Path to a JSON file with one business record
        record: PathBuf,

        /// Optional JSON file with a pool of records for internal linking
        #[arg(short, long)]
        pool: Option<PathBuf>,

        /// Directory for execution traces
        #[arg(short, long, default_value = "traces")]
        traces: PathBuf,

        /// Write the accepted spec to this file instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Generate content specs for a pool of business records
    Batch {
        /// Path to a JSON file with an array of business records
        records: PathBuf,

        /// Maximum loops in flight at once
        #[arg(short = 'n', long, default_value_t = 4)]
        concurrency: usize,

        /// Directory for execution traces
        #[arg(short, long, default_value = "traces")]
        traces: PathBuf,

        /// Directory for accepted specs, one JSON file per record
        #[arg(short, long, default_value = "specs")]
        out: PathBuf,
    },

    /// Validate an existing content spec file without generating
    Check {
        /// Path to a content spec JSON file
        spec: PathBuf,

        /// Slug of the subject page, for the self-link rule
        #[arg(short, long, default_value = "")]
        slug: String,
    },
}
