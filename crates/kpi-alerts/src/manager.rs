//! Notification dispatch shared by the checks.
//!
//! Every check follows the same sequence: evaluate, render one
//! [`Notification`], deliver it, then record the delivered keys in its
//! ledger. [`Dispatcher`] owns the delivery step and the dry-run switch; the
//! ledger write happens only after it reports a delivery.

use chrono::{DateTime, FixedOffset};
use tracing::{debug, info};

use crate::channels::{AlertSink, Notification, deliver};
use crate::error::Result;
use crate::ledger::{LedgerEntry, NotificationLedger};

/// Whether a notification went out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// The sink accepted the notification.
    Sent,
    /// Dry run: rendered but not sent.
    Skipped,
}

/// Delivers rendered notifications through one sink.
#[derive(Debug, Clone, Copy)]
pub struct Dispatcher<'a> {
    sink: &'a dyn AlertSink,
    dry_run: bool,
}

impl<'a> Dispatcher<'a> {
    /// Creates a dispatcher that sends through `sink`.
    #[must_use]
    pub const fn new(sink: &'a dyn AlertSink) -> Self {
        Self {
            sink,
            dry_run: false,
        }
    }

    /// Sets dry-run mode: nothing is sent and nothing is recorded.
    #[must_use]
    pub const fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Returns true in dry-run mode.
    #[must_use]
    pub const fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Delivers `notification`.
    ///
    /// # Errors
    ///
    /// Returns `AlertError::NotificationFailed` if the sink fails.
    pub fn dispatch(&self, notification: &Notification) -> Result<Delivery> {
        if self.dry_run {
            info!(kind = %notification.kind, sink = %self.sink.name(), "dry run, notification not sent");
            return Ok(Delivery::Skipped);
        }
        deliver(self.sink, notification)?;
        Ok(Delivery::Sent)
    }

    /// Delivers `notification` and, once delivered, merges `keys` into
    /// `ledger` stamped with `now` and saves it.
    ///
    /// Returns the recorded keys. On delivery failure the ledger is not touched.
    /// A ledger held by another writer fails the call before anything is sent.
    pub fn dispatch_and_record<L: NotificationLedger + ?Sized>(
        &self,
        notification: &Notification,
        ledger: &mut L,
        keys: Vec<(String, String)>,
        now: DateTime<FixedOffset>,
    ) -> Result<(Delivery, Vec<String>)> {
        if !self.dry_run {
            ledger.ensure_writable()?;
        }
        let delivery = self.dispatch(notification)?;
        if delivery == Delivery::Skipped {
            return Ok((delivery, Vec::new()));
        }
        let entries: Vec<LedgerEntry> = keys
            .into_iter()
            .map(|(sheet, date)| LedgerEntry::new(sheet, date, now))
            .collect();
        let recorded: Vec<String> = entries.iter().map(LedgerEntry::key).collect();
        ledger.merge(entries);
        ledger.save()?;
        debug!(count = recorded.len(), "ledger keys recorded");
        Ok((delivery, recorded))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::MemoryChannel;
    use crate::error::AlertError;
    use crate::ledger::{FileLedger, MemoryLedger};
    use crate::types::CheckKind;

    fn now() -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339("2024-02-21T09:00:00+09:00").unwrap()
    }

    fn notification() -> Notification {
        Notification::new(CheckKind::BelowAverage, "title")
    }

    #[test]
    fn records_after_delivery() {
        let sink = MemoryChannel::new();
        let mut ledger = MemoryLedger::new();
        let (delivery, recorded) = Dispatcher::new(&sink)
            .dispatch_and_record(
                &notification(),
                &mut ledger,
                vec![("A".to_string(), "2月20日".to_string())],
                now(),
            )
            .unwrap();
        assert_eq!(delivery, Delivery::Sent);
        assert_eq!(recorded, vec!["A|2月20日"]);
        assert!(ledger.contains("A|2月20日"));
        assert_eq!(ledger.save_count(), 1);
    }

    #[test]
    fn failed_delivery_leaves_ledger_untouched() {
        let sink = MemoryChannel::failing();
        let mut ledger = MemoryLedger::new();
        let result = Dispatcher::new(&sink).dispatch_and_record(
            &notification(),
            &mut ledger,
            vec![("A".to_string(), "2月20日".to_string())],
            now(),
        );
        assert!(result.is_err());
        assert!(ledger.is_empty());
        assert_eq!(ledger.save_count(), 0);
    }

    #[test]
    fn held_ledger_is_refused_before_sending() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        let mut held = fd_lock::RwLock::new(
            std::fs::OpenOptions::new()
                .create(true)
                .truncate(false)
                .write(true)
                .open(dir.path().join("ledger.json.lock"))
                .unwrap(),
        );
        let _guard = held.try_write().unwrap();

        let sink = MemoryChannel::new();
        let mut ledger = FileLedger::open(&path);
        let result = Dispatcher::new(&sink).dispatch_and_record(
            &notification(),
            &mut ledger,
            vec![("A".to_string(), "2月20日".to_string())],
            now(),
        );
        assert!(matches!(result, Err(AlertError::LedgerLocked { .. })));
        assert!(sink.sent().is_empty());
    }

    #[test]
    fn dry_run_sends_and_records_nothing() {
        let sink = MemoryChannel::new();
        let mut ledger = MemoryLedger::new();
        let dispatcher = Dispatcher::new(&sink).dry_run(true);
        assert!(dispatcher.is_dry_run());
        let (delivery, recorded) = dispatcher
            .dispatch_and_record(
                &notification(),
                &mut ledger,
                vec![("A".to_string(), "2月20日".to_string())],
                now(),
            )
            .unwrap();
        assert_eq!(delivery, Delivery::Skipped);
        assert!(recorded.is_empty());
        assert!(sink.sent().is_empty());
        assert!(ledger.is_empty());
    }
}
