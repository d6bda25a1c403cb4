//! CLI definitions for mediaflux.
//!
//! Uses clap for argument parsing with derive macros.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// mediaflux - article/post time-series access CLI
#[derive(Parser, Debug)]
#[command(name = "mediaflux")]
#[command(version)]
#[command(about = "Write and read article/post time-series records")]
#[command(long_about = r#"
mediaflux - a thin data-access CLI over the article/post time-series store.

Record batches are JSON arrays of objects, read from a file or stdin ("-").
Writes are idempotent for records that carry a stable timestamp: rerunning
the same batch does not create new points.

Quick start:
  1. Point it at your store: export INFLUX_URL, INFLUX_TOKEN, INFLUX_ORG, INFLUX_BUCKET
  2. Check connectivity: mediaflux ping
  3. Write a batch: mediaflux write-articles articles.json
  4. Read back: mediaflux articles --lookback 1h
"#)]
pub struct Cli {
    /// Output format
    #[arg(long, short = 'f', default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Be verbose (show debug info)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Be quiet (suppress non-error output)
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check whether the backing store is reachable
    Ping,

    /// Write a batch of article records
    WriteArticles(BatchArgs),

    /// Write a batch of matched-post records
    WritePosts(BatchArgs),

    /// Write stance-field updates onto existing post points
    WriteStance(BatchArgs),

    /// List articles within the lookback window
    Articles(ArticlesArgs),

    /// List posts that do not carry a stance label yet
    Unlabeled(WindowArgs),

    /// List the post ids already stored for a usid
    ExistingIds(ExistingIdsArgs),

    /// Print a stable-schema table for analytics consumers
    Table(TableArgs),

    /// Show the effective configuration
    Config,
}

#[derive(Args, Debug)]
pub struct BatchArgs {
    /// Path to a JSON array of records, or "-" for stdin
    pub input: PathBuf,
}

#[derive(Args, Debug)]
pub struct ArticlesArgs {
    /// Lookback window (duration literal like 1h, 30d)
    #[arg(long, short = 'l')]
    pub lookback: Option<String>,
}

#[derive(Args, Debug)]
pub struct WindowArgs {
    /// Lookback window (duration literal like 1h, 30d)
    #[arg(long, short = 'l')]
    pub lookback: Option<String>,

    /// Maximum number of rows to return
    #[arg(long, short = 'n')]
    pub limit: Option<i64>,
}

#[derive(Args, Debug)]
pub struct ExistingIdsArgs {
    /// Article identity to look up
    pub usid: String,

    /// Lookback window (duration literal like 1h, 365d)
    #[arg(long, short = 'l', default_value = "365d")]
    pub lookback: String,
}

#[derive(Args, Debug)]
pub struct TableArgs {
    /// Which table to load
    #[arg(value_enum)]
    pub kind: TableKind,

    /// Lookback window (duration literal like 1h, 30d)
    #[arg(long, short = 'l')]
    pub lookback: Option<String>,

    /// Maximum number of rows to return
    #[arg(long, short = 'n')]
    pub limit: Option<i64>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    /// Articles, deduplicated by usid
    Articles,
    /// All posts with a reddit_id
    Posts,
    /// Posts that already carry a stance label
    Labeled,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output
    Text,
    /// JSON output
    Json,
    /// CSV output (tables and row listings)
    Csv,
}
