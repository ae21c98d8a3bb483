//! Date anchor discovery.
//!
//! An anchor is a cell whose text is a date label; it marks the top of a
//! metric block. Two recognizer policies exist because their contracts
//! differ: [`EmbeddedLabel`] finds a label anywhere in the cell text (used
//! for extraction), [`StrictLabel`] accepts only an exact label (used for
//! listing).

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::cell::fold_width;
use crate::date::DateLabel;
use crate::error::CellParseError;
use crate::grid::{Grid, a1_ref};

static STRICT_LABEL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([0-9]+)月([0-9]+)日$").unwrap_or_else(|_| unreachable!()));

static EMBEDDED_LABEL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([0-9]+)月([0-9]+)日").unwrap_or_else(|_| unreachable!()));

/// A policy deciding whether cell text is a date label.
pub trait LabelRecognizer {
    /// Recognizes a label in `text`.
    ///
    /// # Errors
    ///
    /// Returns a [`CellParseError`] when the text is not a label or names an
    /// invalid calendar day.
    fn recognize(&self, text: &str) -> Result<DateLabel, CellParseError>;
}

/// Accepts text that is exactly `digits月digits日` after width folding and trimming.
#[derive(Debug, Clone, Copy, Default)]
pub struct StrictLabel;

/// Accepts text containing `digits月digits日` with any surrounding text.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedLabel;

fn recognize_with(regex: &Regex, text: &str) -> Result<DateLabel, CellParseError> {
    let folded = fold_width(text);
    let folded = folded.trim();
    let caps = regex
        .captures(folded)
        .ok_or_else(|| CellParseError::NotALabel {
            text: folded.to_string(),
        })?;
    // Digit runs too long for u32 cannot be a month or day anyway.
    let month = caps[1].parse::<u32>().unwrap_or(u32::MAX);
    let day = caps[2].parse::<u32>().unwrap_or(u32::MAX);
    DateLabel::new(month, day)
}

impl LabelRecognizer for StrictLabel {
    fn recognize(&self, text: &str) -> Result<DateLabel, CellParseError> {
        recognize_with(&STRICT_LABEL_REGEX, text)
    }
}

impl LabelRecognizer for EmbeddedLabel {
    fn recognize(&self, text: &str) -> Result<DateLabel, CellParseError> {
        recognize_with(&EMBEDDED_LABEL_REGEX, text)
    }
}

/// A recognized date label and its position, 0-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
    /// The recognized label.
    pub label: DateLabel,
    /// 0-based row.
    pub row: usize,
    /// 0-based column.
    pub col: usize,
}

impl Anchor {
    /// A1 reference of the anchor cell.
    #[must_use]
    pub fn a1(&self) -> String {
        a1_ref(self.row, self.col)
    }
}

/// Scans every populated text cell of `grid` for anchors.
///
/// Cells that fail recognition are skipped. The result is in scan order and
/// carries no ordering guarantee.
pub fn scan_anchors<R: LabelRecognizer + ?Sized>(grid: &Grid, recognizer: &R) -> Vec<Anchor> {
    let mut anchors = Vec::new();
    for (row, col, cell) in grid.populated() {
        let Some(text) = cell.as_text() else {
            continue;
        };
        match recognizer.recognize(text) {
            Ok(label) => anchors.push(Anchor { label, row, col }),
            Err(err @ CellParseError::InvalidDate { .. }) => {
                debug!(cell = %a1_ref(row, col), error = %err, "skipping invalid date label");
            }
            Err(CellParseError::NotALabel { .. }) => {}
        }
    }
    anchors
}
