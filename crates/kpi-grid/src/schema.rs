//! The fixed metric schema.
//!
//! Every block carries exactly these 23 metrics in this order: two
//! identifiers, eighteen numeric performance metrics, then three free-text
//! fields. The list is a closed contract shared by extraction and all checks.

use std::fmt;

use serde::{Deserialize, Serialize};

/// How a metric is treated by the checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    /// Identifies the row owner; never aggregated or checked for blanks.
    Identifier,
    /// A daily performance number.
    Numeric,
    /// Free-form commentary, checked only by the follow-up escalation.
    FreeText,
}

impl MetricKind {
    /// Returns the kind as a string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Identifier => "identifier",
            Self::Numeric => "numeric",
            Self::FreeText => "free_text",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One schema entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricSpec {
    /// Column label as it appears in the dataset document.
    pub name: &'static str,
    /// Treatment by the checks.
    pub kind: MetricKind,
}

const fn spec(name: &'static str, kind: MetricKind) -> MetricSpec {
    MetricSpec { name, kind }
}

/// Number of metrics per block.
pub const METRIC_COUNT: usize = 23;

/// The schema, in block order.
pub const METRICS: [MetricSpec; METRIC_COUNT] = [
    spec("担当者名", MetricKind::Identifier),
    spec("チーム名", MetricKind::Identifier),
    spec("稼働時間", MetricKind::Numeric),
    spec("架電数", MetricKind::Numeric),
    spec("通話数", MetricKind::Numeric),
    spec("通話時間", MetricKind::Numeric),
    spec("平均通話時間", MetricKind::Numeric),
    spec("接続数", MetricKind::Numeric),
    spec("接続率", MetricKind::Numeric),
    spec("アポ数", MetricKind::Numeric),
    spec("アポ率", MetricKind::Numeric),
    spec("商談数", MetricKind::Numeric),
    spec("受注数", MetricKind::Numeric),
    spec("受注率", MetricKind::Numeric),
    spec("売上", MetricKind::Numeric),
    spec("メール送信数", MetricKind::Numeric),
    spec("返信数", MetricKind::Numeric),
    spec("返信率", MetricKind::Numeric),
    spec("訪問数", MetricKind::Numeric),
    spec("対応件数", MetricKind::Numeric),
    spec("良かった点", MetricKind::FreeText),
    spec("改善点", MetricKind::FreeText),
    spec("明日の目標", MetricKind::FreeText),
];

/// Metric names in schema order.
pub fn metric_names() -> impl Iterator<Item = &'static str> {
    METRICS.iter().map(|m| m.name)
}

/// Looks up the kind of a metric by name.
#[must_use]
pub fn kind_of(name: &str) -> Option<MetricKind> {
    METRICS.iter().find(|m| m.name == name).map(|m| m.kind)
}

/// Names of metrics of the given kind, in schema order.
pub fn names_of(kind: MetricKind) -> impl Iterator<Item = &'static str> {
    METRICS
        .iter()
        .filter(move |m| m.kind == kind)
        .map(|m| m.name)
}
