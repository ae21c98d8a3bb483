//! Report types for the checks.
//!
//! - [`CheckKind`]: which check produced an alert
//! - [`MetricRegression`], [`BlockAlert`], [`SheetAlert`]: below-average findings
//! - [`FollowupAlert`]: free-text fields still blank after a regression alert
//! - [`MissingAlert`]: blank numeric fields past the grace period
//! - [`CheckReport`]: what a run found, sent and recorded

use std::fmt;

use serde::{Deserialize, Serialize};

/// The three batch checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    /// Blank numeric fields on older blocks. Never deduplicated.
    Missing,
    /// Latest values below the monthly average.
    BelowAverage,
    /// Second-stage escalation of a below-average alert.
    Followup,
}

impl CheckKind {
    /// Returns the kind as a string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Missing => "missing",
            Self::BelowAverage => "below_average",
            Self::Followup => "followup",
        }
    }
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One metric whose latest value fell below its monthly average.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRegression {
    /// Metric name.
    pub metric: String,
    /// Latest normalized value.
    pub latest: f64,
    /// Monthly average.
    pub average: f64,
}

impl fmt::Display for MetricRegression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} (monthly avg {})",
            self.metric,
            format_value(self.latest),
            format_value(self.average)
        )
    }
}

/// Regressions found in one latest-date block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockAlert {
    /// Date label of the block.
    pub date: String,
    /// 1-based index among the sheet's blocks sharing this date.
    pub block_index: usize,
    /// A1 reference of the anchor.
    pub anchor_ref: String,
    /// Flagged metrics, in schema order.
    pub regressions: Vec<MetricRegression>,
}

/// All below-average findings for one sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetAlert {
    /// Sheet name.
    pub sheet: String,
    /// Latest date of the sheet.
    pub date: String,
    /// One entry per flagged block.
    pub blocks: Vec<BlockAlert>,
}

/// A follow-up escalation for one block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowupAlert {
    /// Sheet name.
    pub sheet: String,
    /// Date label.
    pub date: String,
    /// A1 reference of the anchor.
    pub anchor_ref: String,
    /// Free-text fields that are still blank.
    pub blank_fields: Vec<String>,
}

/// Blank required fields on one block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingAlert {
    /// Sheet name.
    pub sheet: String,
    /// Date label.
    pub date: String,
    /// A1 reference of the anchor.
    pub anchor_ref: String,
    /// Fields that are blank.
    pub blank_fields: Vec<String>,
}

/// Summary of one check run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckReport<T> {
    /// Sheets examined.
    pub sheets_checked: usize,
    /// Keys skipped because a ledger already held them.
    pub skipped: Vec<String>,
    /// What the run found.
    pub alerts: Vec<T>,
    /// Whether a notification was delivered.
    pub notified: bool,
    /// Keys written to the ledger.
    pub recorded: Vec<String>,
    /// The rendered message, when there was something to report.
    pub message: Option<String>,
}

impl<T> Default for CheckReport<T> {
    fn default() -> Self {
        Self {
            sheets_checked: 0,
            skipped: Vec::new(),
            alerts: Vec::new(),
            notified: false,
            recorded: Vec::new(),
            message: None,
        }
    }
}

impl<T> CheckReport<T> {
    /// Returns true if the run found nothing to report.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.alerts.is_empty()
    }
}

/// Formats a number without trailing zeros (`7.5`, `12`, `0.33`).
#[must_use]
pub fn format_value(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        return format!("{value:.0}");
    }
    let text = format!("{value:.2}");
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}
