//! CLI argument definitions

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "medfinder")]
#[command(
    author,
    version,
    about = "Offline discovery and fuzzy search for a medical reference site"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "cli")]
    pub format: OutputFormat,

    /// Site root: base URL or local directory (overrides config)
    #[arg(long, global = true)]
    pub source: Option<String>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Probe every category and replace the module registry
    Scan,

    /// Rebuild the search index from the stored registry
    Index,

    /// Scan, merge and rebuild the index in one step
    Sync,

    /// Ranked keyword search over indexed content
    Search(SearchArgs),

    /// Search module titles, categories and keywords
    Find(FindArgs),

    /// List categories or the modules of one category
    Ls(LsArgs),

    /// Show registry, index and store status
    Status,

    /// Write a backup of all state to a file
    Export(FileArgs),

    /// Merge a backup file into local state
    Import(FileArgs),

    /// Sync periodically until interrupted
    Watch(WatchArgs),
}

#[derive(Args)]
pub struct SearchArgs {
    /// Search query
    #[arg(required = true)]
    pub query: Vec<String>,

    /// Number of results
    #[arg(short = 'n')]
    pub limit: Option<usize>,

    /// Restrict results to one category key
    #[arg(short, long)]
    pub category: Option<String>,

    /// Exact keyword matches only
    #[arg(long)]
    pub no_fuzzy: bool,

    /// Omit highlighted excerpts
    #[arg(long)]
    pub no_excerpts: bool,

    /// Minimum Jaro-Winkler similarity for fuzzy matches
    #[arg(long)]
    pub threshold: Option<f64>,
}

#[derive(Args)]
pub struct FindArgs {
    /// Search query
    #[arg(required = true)]
    pub query: Vec<String>,
}

#[derive(Args)]
pub struct LsArgs {
    /// Category key
    pub category: Option<String>,
}

#[derive(Args)]
pub struct FileArgs {
    /// Backup file path
    pub file: PathBuf,
}

#[derive(Args)]
pub struct WatchArgs {
    /// Seconds between syncs (defaults to the configured interval)
    #[arg(long)]
    pub interval: Option<u64>,

    /// Stop after this many syncs
    #[arg(long)]
    pub runs: Option<usize>,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Cli,
    Json,
}
