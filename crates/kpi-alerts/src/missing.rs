//! Blank required-field scan.
//!
//! A block is checked once its date is at least `grace_days` old. Any blank
//! numeric metric is reported. This check keeps no ledger, so a block is
//! reported on every run until it is filled in.

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate};
use kpi_grid::{Dataset, DateBlock, MetricKind};
use tracing::{debug, info};

use crate::channels::Notification;
use crate::error::Result;
use crate::manager::{Delivery, Dispatcher};
use crate::types::{CheckKind, CheckReport, MissingAlert};

/// Reports blocks with blank numeric fields once they are past a grace period.
#[derive(Debug, Clone, Copy)]
pub struct MissingFieldScanner {
    grace_days: i64,
}

impl Default for MissingFieldScanner {
    fn default() -> Self {
        Self::new(3)
    }
}

impl MissingFieldScanner {
    /// Creates a scanner. Blocks dated on or before `today - grace_days` are checked.
    #[must_use]
    pub const fn new(grace_days: i64) -> Self {
        Self { grace_days }
    }

    /// Returns the latest date still subject to the check.
    #[must_use]
    pub fn cutoff(&self, today: NaiveDate) -> Option<NaiveDate> {
        today.checked_sub_signed(Duration::days(self.grace_days))
    }

    fn check_block(block: &DateBlock, cutoff: NaiveDate) -> Option<MissingAlert> {
        let date = block.label.in_year(cutoff.year())?;
        if date > cutoff {
            return None;
        }
        let blank: Vec<String> = block
            .metrics
            .blank_of(&[MetricKind::Numeric])
            .map(str::to_string)
            .collect();
        if blank.is_empty() {
            return None;
        }
        Some(MissingAlert {
            sheet: block.sheet.clone(),
            date: block.label.canonical(),
            anchor_ref: block.anchor_ref.clone(),
            blank_fields: blank,
        })
    }

    /// Scans every sheet.
    #[must_use]
    pub fn evaluate(&self, dataset: &Dataset, today: NaiveDate) -> CheckReport<MissingAlert> {
        let mut report = CheckReport::default();
        let Some(cutoff) = self.cutoff(today) else {
            return report;
        };
        for sheet in dataset.sheet_names() {
            report.sheets_checked += 1;
            let before = report.alerts.len();
            report.alerts.extend(
                dataset
                    .blocks(sheet)
                    .iter()
                    .filter_map(|block| Self::check_block(block, cutoff)),
            );
            debug!(sheet = %sheet, found = report.alerts.len() - before, "sheet scanned");
        }
        report
    }

    /// Scans and notifies.
    pub fn run(
        &self,
        dataset: &Dataset,
        dispatcher: &Dispatcher<'_>,
        now: DateTime<FixedOffset>,
    ) -> Result<CheckReport<MissingAlert>> {
        let mut report = self.evaluate(dataset, now.date_naive());
        if report.is_clean() {
            info!(sheets = report.sheets_checked, "no missing fields");
            return Ok(report);
        }
        let notification = render(&report.alerts);
        report.notified = dispatcher.dispatch(&notification)? == Delivery::Sent;
        report.message = Some(notification.text());
        info!(blocks = report.alerts.len(), "missing-field check complete");
        Ok(report)
    }
}

/// Renders missing-field findings as one message.
#[must_use]
pub fn render(alerts: &[MissingAlert]) -> Notification {
    let mut notification =
        Notification::new(CheckKind::Missing, "[kpiwatch] Required fields not filled in");
    for alert in alerts {
        notification.push_line(format!(
            "■ {} / {} ({}): {}",
            alert.sheet,
            alert.date,
            alert.anchor_ref,
            alert.blank_fields.join(", ")
        ));
    }
    notification
}
