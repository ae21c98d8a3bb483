//! Year-less date labels (`M月D日`).
//!
//! Source sheets carry month and day only. Labels are validated against a
//! fixed non-leap [`REFERENCE_YEAR`], so `2月29日` never validates.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CellParseError;
use crate::scanner::{LabelRecognizer, StrictLabel};

/// Fixed non-leap year used to check month/day combinations.
pub const REFERENCE_YEAR: i32 = 2001;

/// A calendar-valid month/day pair with no year.
///
/// Ordered by `(month, day)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateLabel {
    month: u32,
    day: u32,
}

impl DateLabel {
    /// Creates a label, checking the pair against [`REFERENCE_YEAR`].
    ///
    /// # Errors
    ///
    /// Returns [`CellParseError::InvalidDate`] for combinations such as
    /// `13月40日` or `2月29日`.
    pub fn new(month: u32, day: u32) -> Result<Self, CellParseError> {
        if NaiveDate::from_ymd_opt(REFERENCE_YEAR, month, day).is_none() {
            return Err(CellParseError::InvalidDate { month, day });
        }
        Ok(Self { month, day })
    }

    /// Month, 1-based.
    #[must_use]
    pub const fn month(&self) -> u32 {
        self.month
    }

    /// Day of month, 1-based.
    #[must_use]
    pub const fn day(&self) -> u32 {
        self.day
    }

    /// Canonical text form: half-width digits, no leading zeros.
    #[must_use]
    pub fn canonical(&self) -> String {
        format!("{}月{}日", self.month, self.day)
    }

    /// Places the label in `year`.
    ///
    /// Every label valid in the reference year exists in every year, so this
    /// only returns `None` for years outside chrono's range.
    #[must_use]
    pub fn in_year(&self, year: i32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(year, self.month, self.day)
    }

    /// Returns true if both labels fall in the same reference-year month.
    #[must_use]
    pub const fn same_month(&self, other: &Self) -> bool {
        self.month == other.month
    }

    /// Label for a concrete date.
    ///
    /// # Errors
    ///
    /// Fails only for February 29.
    pub fn from_date(date: NaiveDate) -> Result<Self, CellParseError> {
        Self::new(date.month(), date.day())
    }
}

impl PartialOrd for DateLabel {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DateLabel {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.month, self.day).cmp(&(other.month, other.day))
    }
}

impl fmt::Display for DateLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}月{}日", self.month, self.day)
    }
}

impl FromStr for DateLabel {
    type Err = CellParseError;

    /// Parses an exact label. Full-width digits are accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StrictLabel.recognize(s)
    }
}

impl Serialize for DateLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DateLabel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
