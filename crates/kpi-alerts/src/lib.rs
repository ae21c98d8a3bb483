//! Batch checks over a kpiwatch dataset, with idempotent alerting.
//!
//! `kpi-alerts` reads a [`kpi_grid::Dataset`] snapshot and runs three checks:
//!
//! - **Missing fields**: blank numeric metrics on blocks older than a grace
//!   period. Reported on every run.
//! - **Below average**: metrics on each sheet's latest date that fall below
//!   the sheet's monthly average. Recorded in a ledger so a `sheet|date` key
//!   is notified once.
//! - **Follow-up**: below-average keys whose free-text comments are still
//!   blank after a delay. Recorded in a second ledger.
//!
//! Every check renders one [`Notification`] per run and hands it to an
//! [`AlertSink`]. Ledgers are written only after a delivery succeeds.
//!
//! # Example
//!
//! ```rust
//! use chrono::DateTime;
//! use kpi_alerts::{AnomalyDetector, Dispatcher, MemoryChannel, MemoryLedger, NotificationLedger};
//! use kpi_grid::{Cell, Dataset, DateBlock, Metrics};
//!
//! let now = DateTime::parse_from_rfc3339("2024-02-21T09:00:00+09:00").unwrap();
//! let block = |label: &str, calls: f64| {
//!     let mut metrics = Metrics::default();
//!     metrics.set("架電数", Cell::Number(calls));
//!     DateBlock {
//!         sheet: String::new(),
//!         label: label.parse().unwrap(),
//!         anchor_ref: "B1".to_string(),
//!         row: 1,
//!         col: 2,
//!         metrics,
//!     }
//! };
//!
//! let mut dataset = Dataset::new("sheet-id", "data/dataset.json", now);
//! dataset.insert_sheet("A", vec![block("2月10日", 10.0), block("2月20日", 5.0)]);
//!
//! let sink = MemoryChannel::new();
//! let mut ledger = MemoryLedger::new();
//! let report = AnomalyDetector::new()
//!     .run(&dataset, &mut ledger, &Dispatcher::new(&sink), now)
//!     .unwrap();
//!
//! assert!(report.notified);
//! assert!(ledger.contains("A|2月20日"));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod aggregate;
pub mod anomaly;
pub mod channels;
pub mod error;
pub mod followup;
pub mod ledger;
pub mod manager;
pub mod missing;
pub mod types;

// Re-export main types at crate root
pub use aggregate::{MetricAverage, MonthlyBaseline};
pub use anomaly::AnomalyDetector;
pub use channels::{
    AlertSink, LogChannel, MemoryChannel, Notification, NotificationResult, WebhookChannel,
    WebhookConfig, WebhookPayload,
};
pub use error::{AlertError, Result};
pub use followup::{FollowupMonitor, FollowupState};
pub use ledger::{FileLedger, LedgerEntry, MemoryLedger, NotificationLedger, ledger_key};
pub use manager::{Delivery, Dispatcher};
pub use missing::MissingFieldScanner;
pub use types::{
    BlockAlert, CheckKind, CheckReport, FollowupAlert, MetricRegression, MissingAlert, SheetAlert,
    format_value,
};
