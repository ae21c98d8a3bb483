//! # kpi-cli
//!
//! The `kpiwatch` command-line interface.
//!
//! Each subcommand is one independent batch stage:
//! - `extract`: fetched grids to the dataset document
//! - `check-missing`, `check-below-average`, `check-followup`: the checks
//! - `dates`: anchor listing for checking a sheet's layout
//!
//! ```text
//! grids/<sheet>.json ──extract──► data/dataset.json ──check-*──► alert sink
//!                                                        │
//!                                                        └──► state/*_ledger.json
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;

pub use cli::{Cli, Commands, Format};
pub use config::Config;
pub use error::CliError;
pub use output::OutputFormat;
