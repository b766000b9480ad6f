//! CLI argument parsing for the batch workflow.
//!
//! The CLI stays thin: argument shapes and help text only, so the same loop
//! the tests drive through the library is what the binary runs.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Root CLI entrypoint for the batch runner.
#[derive(Parser, Debug)]
#[command(
    name = "mbatch",
    version,
    about = "Resumable sequential batch runner for external media analysis",
    after_help = "Commands:\n  run     Process every primary media file, resuming any interrupted batch\n  status  Summarize the current batch ledger\n  config  Print a starter configuration file\n\nExamples:\n  mbatch run --engine \"python analyzer.py\" --video-dir videos --companion-dir subtitles\n  mbatch run --config batch.json --fresh\n  mbatch status --json\n  mbatch config > batch.json",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    Run(RunArgs),
    Status(StatusArgs),
    /// Print a starter configuration file as JSON
    Config,
}

/// Run command inputs.
#[derive(Parser, Debug)]
#[command(about = "Process primary media files through the analysis engine")]
pub struct RunArgs {
    /// Config file with batch settings (JSON)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory holding primary media files
    #[arg(long, value_name = "DIR")]
    pub video_dir: Option<PathBuf>,

    /// Directory holding companion resources
    #[arg(long, value_name = "DIR")]
    pub companion_dir: Option<PathBuf>,

    /// Staging directory the engine reads from
    #[arg(long, value_name = "DIR")]
    pub workspace: Option<PathBuf>,

    /// Directory the engine writes report artifacts into
    #[arg(long, value_name = "DIR")]
    pub report_dir: Option<PathBuf>,

    /// Directory batch ledgers are kept in
    #[arg(long, value_name = "DIR")]
    pub ledger_dir: Option<PathBuf>,

    /// Engine scratch directory cleared around every item
    #[arg(long, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Resume a specific ledger file instead of the most recent one
    #[arg(long, value_name = "FILE", conflicts_with = "fresh")]
    pub ledger: Option<PathBuf>,

    /// Ignore interrupted batches and start a new one
    #[arg(long)]
    pub fresh: bool,

    /// Analysis engine command line
    #[arg(long, value_name = "CMD")]
    pub engine: Option<String>,

    /// Kill the engine after this many seconds
    #[arg(long, value_name = "SECS")]
    pub timeout_secs: Option<u64>,

    /// Items per progress chunk
    #[arg(long, value_name = "N")]
    pub batch_size: Option<usize>,

    /// Emit debug-level logging
    #[arg(long, short = 'v', conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log errors
    #[arg(long)]
    pub quiet: bool,
}

/// Status command inputs.
#[derive(Parser, Debug)]
#[command(about = "Summarize the batch ledger")]
pub struct StatusArgs {
    /// Config file with batch settings (JSON)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Ledger file to summarize
    #[arg(long, value_name = "FILE")]
    pub ledger: Option<PathBuf>,

    /// Directory to search for the most recent ledger
    #[arg(long, value_name = "DIR", conflicts_with = "ledger")]
    pub ledger_dir: Option<PathBuf>,

    /// Emit machine-readable JSON output
    #[arg(long)]
    pub json: bool,
}
