//! Below-average detection.
//!
//! For each sheet, the blocks carrying the sheet's latest date are compared
//! metric by metric against the monthly baseline. A metric is flagged when
//! `latest < average`; equal never flags. A sheet whose `sheet|date` key is
//! already in the below-average ledger is skipped before any computation,
//! so re-running on an unchanged dataset reports nothing new.

use chrono::{DateTime, FixedOffset};
use kpi_grid::{Dataset, DateBlock, normalize};
use tracing::{debug, info};

use crate::aggregate::MonthlyBaseline;
use crate::channels::Notification;
use crate::error::Result;
use crate::ledger::{NotificationLedger, ledger_key};
use crate::manager::{Delivery, Dispatcher};
use crate::types::{BlockAlert, CheckKind, CheckReport, MetricRegression, SheetAlert};

/// Compares each sheet's latest blocks against the monthly baseline.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnomalyDetector;

impl AnomalyDetector {
    /// Creates a detector.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Evaluates one sheet, ignoring any ledger.
    ///
    /// Returns `None` when the sheet has no blocks or nothing regressed.
    #[must_use]
    pub fn evaluate_sheet(&self, dataset: &Dataset, sheet: &str) -> Option<SheetAlert> {
        let latest = dataset.latest_label(sheet)?;
        let baseline = MonthlyBaseline::compute(dataset.blocks(sheet), latest);

        let blocks: Vec<BlockAlert> = dataset
            .find_blocks(sheet, latest)
            .enumerate()
            .filter_map(|(i, block)| evaluate_block(block, &baseline, i + 1))
            .collect();

        if blocks.is_empty() {
            return None;
        }
        Some(SheetAlert {
            sheet: sheet.to_string(),
            date: latest.canonical(),
            blocks,
        })
    }

    /// Evaluates every sheet not yet recorded in `ledger`.
    pub fn evaluate<L: NotificationLedger + ?Sized>(
        &self,
        dataset: &Dataset,
        ledger: &L,
    ) -> CheckReport<SheetAlert> {
        let mut report = CheckReport::default();
        for sheet in dataset.sheet_names() {
            report.sheets_checked += 1;
            let Some(latest) = dataset.latest_label(sheet) else {
                debug!(sheet = %sheet, "no blocks, skipping");
                continue;
            };
            let key = ledger_key(sheet, &latest.canonical());
            if ledger.contains(&key) {
                debug!(key = %key, "already notified, skipping");
                report.skipped.push(key);
                continue;
            }
            if let Some(alert) = self.evaluate_sheet(dataset, sheet) {
                report.alerts.push(alert);
            }
        }
        report
    }

    /// Evaluates, notifies, and records.
    ///
    /// Nothing is sent and the ledger is not written when no sheet regressed.
    pub fn run<L: NotificationLedger + ?Sized>(
        &self,
        dataset: &Dataset,
        ledger: &mut L,
        dispatcher: &Dispatcher<'_>,
        now: DateTime<FixedOffset>,
    ) -> Result<CheckReport<SheetAlert>> {
        let mut report = self.evaluate(dataset, &*ledger);
        if report.is_clean() {
            info!(sheets = report.sheets_checked, skipped = report.skipped.len(), "no below-average metrics");
            return Ok(report);
        }

        let notification = render(&report.alerts);
        let keys = report
            .alerts
            .iter()
            .map(|a| (a.sheet.clone(), a.date.clone()))
            .collect();
        let (delivery, recorded) =
            dispatcher.dispatch_and_record(&notification, ledger, keys, now)?;

        report.notified = delivery == Delivery::Sent;
        report.recorded = recorded;
        report.message = Some(notification.text());
        info!(
            sheets = report.alerts.len(),
            recorded = report.recorded.len(),
            "below-average check complete"
        );
        Ok(report)
    }
}

fn evaluate_block(
    block: &DateBlock,
    baseline: &MonthlyBaseline,
    block_index: usize,
) -> Option<BlockAlert> {
    let regressions: Vec<MetricRegression> = baseline
        .averages
        .iter()
        .filter_map(|avg| {
            let latest = normalize(block.metrics.get(avg.metric))?;
            (latest < avg.average).then(|| MetricRegression {
                metric: avg.metric.to_string(),
                latest,
                average: avg.average,
            })
        })
        .collect();

    if regressions.is_empty() {
        return None;
    }
    Some(BlockAlert {
        date: block.label.canonical(),
        block_index,
        anchor_ref: block.anchor_ref.clone(),
        regressions,
    })
}

/// Renders below-average findings as one message.
#[must_use]
pub fn render(alerts: &[SheetAlert]) -> Notification {
    let mut notification =
        Notification::new(CheckKind::BelowAverage, "[kpiwatch] Metrics below monthly average");
    for alert in alerts {
        for block in &alert.blocks {
            notification.push_line(String::new());
            notification.push_line(format!(
                "■ {} / {} (block {}, {})",
                alert.sheet, block.date, block.block_index, block.anchor_ref
            ));
            for regression in &block.regressions {
                notification.push_line(format!("  - {regression}"));
            }
        }
    }
    notification
}
