//! Follow-up escalation of below-average alerts.
//!
//! Every key in the below-average ledger moves through:
//!
//! ```text
//! BelowAvgNotified --(date + delay < today)--> due
//! due --(block not in dataset)-------> BlockMissing       (not recorded)
//! due --(a free-text field blank)----> FollowupNotified   (recorded, terminal)
//! due --(all free-text filled)-------> Resolved           (not recorded)
//! ```
//!
//! Keys already in the follow-up ledger are terminal and never rechecked.
//! `Resolved` is not persisted, so a resolved key is evaluated again on every
//! run and escalates if its fields are later cleared.

use std::fmt;

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate};
use kpi_grid::{Dataset, DateLabel, MetricKind};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::channels::Notification;
use crate::error::Result;
use crate::ledger::{LedgerEntry, NotificationLedger};
use crate::manager::{Delivery, Dispatcher};
use crate::types::{CheckKind, CheckReport, FollowupAlert};

/// Where a below-average key stands in the escalation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FollowupState {
    /// Notified as below average; not yet due for follow-up.
    BelowAvgNotified,
    /// Due, but the block is no longer in the dataset.
    BlockMissing,
    /// Due with blank free-text fields; escalation will be sent.
    FollowupNotified(Vec<FollowupAlert>),
    /// Due and every free-text field is filled.
    Resolved,
    /// Already escalated; never rechecked.
    Terminal,
}

impl fmt::Display for FollowupState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::BelowAvgNotified => "below_avg_notified",
            Self::BlockMissing => "block_missing",
            Self::FollowupNotified(_) => "followup_notified",
            Self::Resolved => "resolved",
            Self::Terminal => "terminal",
        };
        write!(f, "{s}")
    }
}

/// Re-examines below-average keys once their follow-up delay has passed.
#[derive(Debug, Clone, Copy)]
pub struct FollowupMonitor {
    delay_days: i64,
}

impl Default for FollowupMonitor {
    fn default() -> Self {
        Self::new(1)
    }
}

impl FollowupMonitor {
    /// Creates a monitor. A key is due once `date + delay_days < today`.
    #[must_use]
    pub const fn new(delay_days: i64) -> Self {
        Self { delay_days }
    }

    /// Returns true once `label`, placed in `today`'s year, is past the delay.
    #[must_use]
    pub fn is_due(&self, label: DateLabel, today: NaiveDate) -> bool {
        label
            .in_year(today.year())
            .and_then(|date| date.checked_add_signed(Duration::days(self.delay_days)))
            .is_some_and(|due| due < today)
    }

    /// Classifies one below-average ledger entry.
    pub fn assess<L: NotificationLedger + ?Sized>(
        &self,
        entry: &LedgerEntry,
        dataset: &Dataset,
        followups: &L,
        today: NaiveDate,
    ) -> FollowupState {
        if followups.contains(&entry.key()) {
            return FollowupState::Terminal;
        }
        let label: DateLabel = match entry.date.parse() {
            Ok(label) => label,
            Err(e) => {
                debug!(key = %entry.key(), error = %e, "unparseable ledger date, skipping");
                return FollowupState::BelowAvgNotified;
            }
        };
        if !self.is_due(label, today) {
            return FollowupState::BelowAvgNotified;
        }

        let mut found = false;
        let mut alerts = Vec::new();
        for block in dataset.find_blocks(&entry.sheet, label) {
            found = true;
            let blank: Vec<String> = block
                .metrics
                .blank_of(&[MetricKind::FreeText])
                .map(str::to_string)
                .collect();
            if !blank.is_empty() {
                alerts.push(FollowupAlert {
                    sheet: entry.sheet.clone(),
                    date: label.canonical(),
                    anchor_ref: block.anchor_ref.clone(),
                    blank_fields: blank,
                });
            }
        }

        if !found {
            debug!(key = %entry.key(), "block not in dataset");
            FollowupState::BlockMissing
        } else if alerts.is_empty() {
            FollowupState::Resolved
        } else {
            FollowupState::FollowupNotified(alerts)
        }
    }

    /// Evaluates every below-average key.
    pub fn evaluate<B, F>(
        &self,
        dataset: &Dataset,
        below_average: &B,
        followups: &F,
        today: NaiveDate,
    ) -> (CheckReport<FollowupAlert>, Vec<(String, String)>)
    where
        B: NotificationLedger + ?Sized,
        F: NotificationLedger + ?Sized,
    {
        let mut report = CheckReport {
            sheets_checked: dataset.sheet_names().count(),
            ..CheckReport::default()
        };
        let mut keys = Vec::new();
        for entry in below_average.entries() {
            match self.assess(&entry, dataset, followups, today) {
                FollowupState::Terminal => report.skipped.push(entry.key()),
                FollowupState::FollowupNotified(alerts) => {
                    if let Some(first) = alerts.first() {
                        keys.push((entry.sheet.clone(), first.date.clone()));
                    }
                    report.alerts.extend(alerts);
                }
                state => debug!(key = %entry.key(), state = %state, "no follow-up"),
            }
        }
        (report, keys)
    }

    /// Evaluates, notifies, and records into the follow-up ledger.
    pub fn run<B, F>(
        &self,
        dataset: &Dataset,
        below_average: &B,
        followups: &mut F,
        dispatcher: &Dispatcher<'_>,
        now: DateTime<FixedOffset>,
    ) -> Result<CheckReport<FollowupAlert>>
    where
        B: NotificationLedger + ?Sized,
        F: NotificationLedger + ?Sized,
    {
        let today = now.date_naive();
        let (mut report, keys) = self.evaluate(dataset, below_average, &*followups, today);
        if report.is_clean() {
            info!(skipped = report.skipped.len(), "no follow-ups due");
            return Ok(report);
        }

        let notification = render(&report.alerts);
        let (delivery, recorded) =
            dispatcher.dispatch_and_record(&notification, followups, keys, now)?;
        report.notified = delivery == Delivery::Sent;
        report.recorded = recorded;
        report.message = Some(notification.text());
        info!(alerts = report.alerts.len(), recorded = report.recorded.len(), "follow-up check complete");
        Ok(report)
    }
}

/// Renders follow-up escalations as one message.
#[must_use]
pub fn render(alerts: &[FollowupAlert]) -> Notification {
    let mut notification = Notification::new(
        CheckKind::Followup,
        "[kpiwatch] Follow-up: comments still missing after below-average alert",
    );
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::MemoryChannel;
    use crate::ledger::MemoryLedger;
    use kpi_grid::{Cell, DateBlock, Metrics};

    fn at(ts: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(ts).unwrap()
    }

    fn block(label: &str, comments: &[&str]) -> DateBlock {
        let mut metrics = Metrics::default();
        for (name, text) in ["良かった点", "改善点", "明日の目標"].iter().zip(comments) {
            metrics.set(name, Cell::from(*text));
        }
        DateBlock {
            sheet: String::new(),
            label: label.parse().unwrap(),
            anchor_ref: "B1".to_string(),
            row: 1,
            col: 2,
            metrics,
        }
    }

    fn dataset(blocks: Vec<DateBlock>) -> Dataset {
        let mut dataset = Dataset::new("id", "out.json", at("2024-02-21T09:00:00+09:00"));
        dataset.insert_sheet("A", blocks);
        dataset
    }

    fn below_average(date: &str) -> MemoryLedger {
        let mut ledger = MemoryLedger::new();
        ledger.merge(vec![LedgerEntry::new("A", date, at("2024-02-20T09:00:00+09:00"))]);
        ledger
    }

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn due_only_after_delay() {
        let monitor = FollowupMonitor::new(1);
        let label: DateLabel = "2月20日".parse().unwrap();
        assert!(!monitor.is_due(label, day("2024-02-20")));
        assert!(!monitor.is_due(label, day("2024-02-21")));
        assert!(monitor.is_due(label, day("2024-02-22")));
    }

    #[test]
    fn blank_comments_escalate() {
        let ds = dataset(vec![block("2月20日", &["よく話せた", ""])]);
        let state = FollowupMonitor::default().assess(
            &below_average("2月20日").entries()[0],
            &ds,
            &MemoryLedger::new(),
            day("2024-02-22"),
        );
        let FollowupState::FollowupNotified(alerts) = state else {
            panic!("expected escalation, got {state}");
        };
        assert_eq!(alerts[0].blank_fields, vec!["改善点", "明日の目標"]);
    }

    #[test]
    fn filled_comments_resolve_without_record() {
        let ds = dataset(vec![block("2月20日", &["a", "b", "c"])]);
        let below = below_average("2月20日");
        let sink = MemoryChannel::new();
        let mut followups = MemoryLedger::new();
        let report = FollowupMonitor::default()
            .run(&ds, &below, &mut followups, &Dispatcher::new(&sink), at("2024-02-22T09:00:00+09:00"))
            .unwrap();
        assert!(report.is_clean());
        assert!(followups.is_empty());
        assert_eq!(
            FollowupMonitor::default().assess(&below.entries()[0], &ds, &followups, day("2024-02-23")),
            FollowupState::Resolved
        );
    }

    #[test]
    fn not_due_yet_is_not_checked() {
        let ds = dataset(vec![block("2月20日", &[])]);
        let (report, keys) = FollowupMonitor::default().evaluate(
            &ds,
            &below_average("2月20日"),
            &MemoryLedger::new(),
            day("2024-02-21"),
        );
        assert!(report.is_clean());
        assert!(keys.is_empty());
    }

    #[test]
    fn escalates_once_then_terminal() {
        let ds = dataset(vec![block("2月20日", &[])]);
        let below = below_average("2月20日");
        let sink = MemoryChannel::new();
        let mut followups = MemoryLedger::new();
        let dispatcher = Dispatcher::new(&sink);
        let now = at("2024-02-22T09:00:00+09:00");

        let first = FollowupMonitor::default().run(&ds, &below, &mut followups, &dispatcher, now).unwrap();
        assert!(first.notified);
        assert_eq!(first.recorded, vec!["A|2月20日"]);

        let second = FollowupMonitor::default().run(&ds, &below, &mut followups, &dispatcher, now).unwrap();
        assert!(second.is_clean());
        assert_eq!(second.skipped, vec!["A|2月20日"]);
        assert_eq!(sink.sent().len(), 1);
    }

    #[test]
    fn only_below_average_keys_are_considered() {
        // A block with blank comments but no below-average record.
        let ds = dataset(vec![block("2月10日", &[])]);
        let (report, _) = FollowupMonitor::default().evaluate(
            &ds,
            &MemoryLedger::new(),
            &MemoryLedger::new(),
            day("2024-03-01"),
        );
        assert!(report.is_clean());
    }

    #[test]
    fn vanished_block_is_reported_missing() {
        let ds = dataset(vec![]);
        let state = FollowupMonitor::default().assess(
            &below_average("2月20日").entries()[0],
            &ds,
            &MemoryLedger::new(),
            day("2024-02-25"),
        );
        assert_eq!(state, FollowupState::BlockMissing);
        assert_eq!(state.to_string(), "block_missing");
    }

    #[test]
    fn failed_send_leaves_followup_ledger_empty() {
        let ds = dataset(vec![block("2月20日", &[])]);
        let sink = MemoryChannel::failing();
        let mut followups = MemoryLedger::new();
        let result = FollowupMonitor::default().run(
            &ds,
            &below_average("2月20日"),
            &mut followups,
            &Dispatcher::new(&sink),
            at("2024-02-22T09:00:00+09:00"),
        );
        assert!(result.is_err());
        assert!(followups.is_empty());
    }
}
