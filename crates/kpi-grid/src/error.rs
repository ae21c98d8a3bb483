//! Error types for the kpi-grid crate.

use thiserror::Error;

/// Errors that abort an extraction run or a dataset load.
#[derive(Debug, Error)]
pub enum GridError {
    /// The grid source could not deliver a sheet.
    #[error("grid fetch failed for '{sheet}': {reason}")]
    Fetch {
        /// The sheet that was being fetched.
        sheet: String,
        /// The reason the fetch failed.
        reason: String,
    },

    /// The dataset document is missing required structure.
    #[error("malformed dataset: {reason}")]
    MalformedDataset {
        /// What is wrong with the document.
        reason: String,
    },

    /// Filesystem error while reading or writing a document.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for GridError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// A single cell failed to parse as a date label.
///
/// Always recovered by the caller: the cell is skipped and the scan continues.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CellParseError {
    /// The text does not look like a `M月D日` label.
    #[error("not a date label: {text:?}")]
    NotALabel {
        /// The normalized cell text.
        text: String,
    },

    /// The label parsed but names a day that does not exist in the reference year.
    #[error("invalid calendar date: {month}月{day}日")]
    InvalidDate {
        /// Parsed month.
        month: u32,
        /// Parsed day.
        day: u32,
    },
}

/// Result type for grid operations.
pub type Result<T> = std::result::Result<T, GridError>;
