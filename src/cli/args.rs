//! Command line argument parsing for the Tessera CLI using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::index::field::SortOrder;

/// Tessera - query an inverted index kept in an ordered key-value store
#[derive(Parser, Debug, Clone)]
#[command(name = "tessera")]
#[command(about = "Query an inverted index kept in an ordered key-value store")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct TesseraArgs {
    /// Verbosity level (0=quiet, 1=normal, 2=verbose, 3=debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human")]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl TesseraArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            match self.verbose {
                0 => 1,
                n => n,
            }
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Items recorded under exactly one term
    #[command(name = "match-terms")]
    MatchTerms(MatchTermsArgs),

    /// Items recorded under any term of a field
    #[command(name = "match-field")]
    MatchField(MatchFieldArgs),

    /// Items recorded under a range of terms
    Range(RangeArgs),

    /// List each term of a field with its items
    Scan(ScanArgs),
}

/// Where the index lives and which field to query.
#[derive(Args, Debug, Clone)]
pub struct FieldArgs {
    /// Fixture file with stored entries (JSON)
    #[arg(short, long, value_name = "FIXTURE")]
    pub store: PathBuf,

    /// Index configuration file (JSON)
    #[arg(short, long, value_name = "CONFIG")]
    pub config: Option<PathBuf>,

    /// Series id of the field
    #[arg(long)]
    pub series: u64,

    /// Index rule id of the field
    #[arg(long)]
    pub rule: u32,
}

/// Term bounds shared by range-style commands.
#[derive(Args, Debug, Clone, Default)]
pub struct BoundArgs {
    /// Lower term bound
    #[arg(long)]
    pub lower: Option<String>,

    /// Upper term bound
    #[arg(long)]
    pub upper: Option<String>,

    /// Exclude the lower bound itself
    #[arg(long)]
    pub exclude_lower: bool,

    /// Exclude the upper bound itself
    #[arg(long)]
    pub exclude_upper: bool,
}

/// Arguments for exact term matching
#[derive(Parser, Debug, Clone)]
pub struct MatchTermsArgs {
    #[command(flatten)]
    pub field: FieldArgs,

    /// Term to match
    #[arg(value_name = "TERM")]
    pub term: String,
}

/// Arguments for whole-field matching
#[derive(Parser, Debug, Clone)]
pub struct MatchFieldArgs {
    #[command(flatten)]
    pub field: FieldArgs,
}

/// Arguments for range matching
#[derive(Parser, Debug, Clone)]
pub struct RangeArgs {
    #[command(flatten)]
    pub field: FieldArgs,

    #[command(flatten)]
    pub bounds: BoundArgs,
}

/// Arguments for term scans
#[derive(Parser, Debug, Clone)]
pub struct ScanArgs {
    #[command(flatten)]
    pub field: FieldArgs,

    #[command(flatten)]
    pub bounds: BoundArgs,

    /// Traversal order
    #[arg(short, long, default_value = "asc")]
    pub order: OrderArg,

    /// Stop after this many terms
    #[arg(short, long)]
    pub limit: Option<usize>,
}

/// Traversal order accepted on the command line
#[derive(ValueEnum, Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderArg {
    Asc,
    Desc,
}

impl From<OrderArg> for SortOrder {
    fn from(order: OrderArg) -> Self {
        match order {
            OrderArg::Asc => SortOrder::Asc,
            OrderArg::Desc => SortOrder::Desc,
        }
    }
}

/// Output format options
#[derive(ValueEnum, Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}
