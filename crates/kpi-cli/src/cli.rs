//! Command-line argument parsing with clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// kpiwatch - daily report extraction and KPI checks.
#[derive(Parser, Debug, Clone)]
#[command(name = "kpiwatch")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Configuration file.
    #[arg(short, long, env = "KPIWATCH_CONFIG", default_value = "kpiwatch.toml")]
    pub config: PathBuf,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = Format::Table)]
    pub format: Format,

    /// Render alerts without sending them or writing ledgers.
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Log at debug level unless `RUST_LOG` says otherwise.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum Format {
    /// Human-readable table format.
    #[default]
    Table,
    /// JSON output for scripting.
    Json,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Extract every configured sheet and write the dataset.
    Extract,

    /// Report blocks whose numeric fields are still blank.
    CheckMissing,

    /// Report metrics below their monthly average on each sheet's latest date.
    CheckBelowAverage,

    /// Escalate below-average alerts whose comments are still blank.
    CheckFollowup,

    /// List the date labels found on one sheet.
    Dates {
        /// Sheet name.
        sheet: String,
    },
}
