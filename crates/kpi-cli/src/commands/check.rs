//! Check command implementations.
//!
//! Each check loads the dataset written by `kpiwatch extract`, evaluates it,
//! sends at most one notification, and records delivered keys in its
//! ledger under `state_dir`.

use std::io::Write;

use chrono::{DateTime, FixedOffset};
use kpi_alerts::{
    AlertSink, AnomalyDetector, Dispatcher, FileLedger, FollowupMonitor, LogChannel,
    MissingFieldScanner, WebhookChannel, WebhookConfig,
};
use kpi_grid::Dataset;
use tracing::debug;

use crate::config::Config;
use crate::error::CliError;
use crate::output::OutputFormat;

/// Builds the configured alert sink: the webhook when set, the log otherwise.
///
/// # Errors
///
/// Returns error if the webhook sink cannot be built.
pub fn build_sink(config: &Config) -> Result<Box<dyn AlertSink>, CliError> {
    match &config.alerts.webhook_url {
        Some(url) => {
            let webhook = WebhookConfig::new("webhook", url)?
                .with_timeout_secs(config.alerts.timeout_secs);
            Ok(Box::new(WebhookChannel::new(webhook)?))
        }
        None => Ok(Box::new(LogChannel::default())),
    }
}

/// Handler for the three check subcommands.
pub struct CheckCommand<'a> {
    config: &'a Config,
    sink: &'a dyn AlertSink,
    dry_run: bool,
}

impl<'a> CheckCommand<'a> {
    /// Creates a new check command handler delivering through `sink`.
    #[must_use]
    pub fn new(config: &'a Config, sink: &'a dyn AlertSink, dry_run: bool) -> Self {
        Self {
            config,
            sink,
            dry_run: dry_run || config.alerts.dry_run,
        }
    }

    fn dispatcher(&self) -> Dispatcher<'a> {
        Dispatcher::new(self.sink).dry_run(self.dry_run)
    }

    fn load_dataset(&self) -> Result<Dataset, CliError> {
        let dataset = Dataset::load(&self.config.output_file)?;
        debug!(sheets = dataset.sheets.len(), blocks = dataset.block_count(), "dataset loaded");
        Ok(dataset)
    }

    /// Runs the missing-field check.
    ///
    /// # Errors
    ///
    /// Returns error if the dataset cannot be loaded or delivery fails.
    pub fn missing<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        now: DateTime<FixedOffset>,
    ) -> Result<(), CliError> {
        let dataset = self.load_dataset()?;
        let report = MissingFieldScanner::new(self.config.missing_grace_days).run(
            &dataset,
            &self.dispatcher(),
            now,
        )?;
        format.write(out, &report)
    }

    /// Runs the below-average check.
    ///
    /// # Errors
    ///
    /// Returns error if the dataset cannot be loaded, delivery fails or the
    /// ledger cannot be written.
    pub fn below_average<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        now: DateTime<FixedOffset>,
    ) -> Result<(), CliError> {
        let dataset = self.load_dataset()?;
        let mut ledger = FileLedger::open(self.config.below_average_ledger());
        let report = AnomalyDetector::new().run(&dataset, &mut ledger, &self.dispatcher(), now)?;
        format.write(out, &report)
    }

    /// Runs the follow-up check.
    ///
    /// # Errors
    ///
    /// Returns error if the dataset cannot be loaded, delivery fails or the
    /// ledger cannot be written.
    pub fn followup<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        now: DateTime<FixedOffset>,
    ) -> Result<(), CliError> {
        let dataset = self.load_dataset()?;
        let below_average = FileLedger::open(self.config.below_average_ledger());
        let mut followups = FileLedger::open(self.config.followup_ledger());
        let report = FollowupMonitor::new(self.config.followup_delay_days).run(
            &dataset,
            &below_average,
            &mut followups,
            &self.dispatcher(),
            now,
        )?;
        format.write(out, &report)
    }
}
