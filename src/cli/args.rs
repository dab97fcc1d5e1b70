//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueHint};

/// Administrative division index: look up regions by code or name, with their full hierarchy
#[derive(Parser, Debug)]
#[command(name = "regiontree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Debug output, repeat for more (-d info, -dd debug, -ddd trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub debug: u8,

    /// Region CSV file (overrides config)
    #[arg(short, long, global = true, value_hint = ValueHint::FilePath, env = "REGIONTREE_DATA_FILE")]
    pub file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Look up a region by its code
    Code {
        /// Region code, e.g. 110101000000
        code: String,
    },

    /// Find regions whose name contains a term
    Name {
        /// Search term (case-sensitive substring)
        term: String,
        /// Maximum number of results (overrides config)
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Show the hierarchy as tree
    Tree {
        /// Start at this region (default: whole country)
        code: Option<String>,
        /// Levels to show below the start
        #[arg(long, default_value_t = 1)]
        depth: usize,
        /// Show all levels
        #[arg(long, conflicts_with = "depth")]
        all: bool,
    },

    /// Show load and build statistics
    Stats,

    /// Interactive query menu
    Repl,

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show effective settings
    Show,
    /// Show config file locations
    Path,
}
