//! CLI error types.

use kpi_alerts::AlertError;
use kpi_grid::GridError;
use thiserror::Error;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Extraction or dataset failure.
    #[error(transparent)]
    Grid(#[from] GridError),

    /// Check or delivery failure.
    #[error(transparent)]
    Alert(#[from] AlertError),

    /// Output formatting error.
    #[error("format error: {0}")]
    Format(String),

    /// Invalid argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
