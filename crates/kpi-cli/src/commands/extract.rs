//! Extraction command implementation.
//!
//! Fetches every configured sheet, extracts its blocks and writes the
//! dataset. A fetch failure aborts before anything is written.

use std::io::Write;

use chrono::{DateTime, FixedOffset};
use kpi_grid::{Dataset, DirGridSource, GridSource};
use tracing::info;

use crate::config::Config;
use crate::error::CliError;
use crate::output::{ExtractSummary, OutputFormat, SheetSummary};

/// Handler for `kpiwatch extract`.
pub struct ExtractCommand<'a> {
    config: &'a Config,
}

impl<'a> ExtractCommand<'a> {
    /// Creates a new extract command handler.
    #[must_use]
    pub const fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Extracts from the configured grid directory.
    ///
    /// # Errors
    ///
    /// Returns error if a grid cannot be fetched or the dataset cannot be written.
    pub fn execute<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        now: DateTime<FixedOffset>,
    ) -> Result<(), CliError> {
        let source = DirGridSource::new(&self.config.grid_dir);
        self.execute_with(&source, out, format, now)
    }

    /// Extracts from `source`.
    ///
    /// # Errors
    ///
    /// Returns error if a grid cannot be fetched or the dataset cannot be written.
    pub fn execute_with<S: GridSource + ?Sized, W: Write>(
        &self,
        source: &S,
        out: &mut W,
        format: &OutputFormat,
        now: DateTime<FixedOffset>,
    ) -> Result<(), CliError> {
        let output_file = self.config.output_file.display().to_string();
        let dataset = Dataset::extract(
            source,
            &self.config.ranges(),
            &self.config.spreadsheet_id,
            &output_file,
            now,
        )?;
        dataset.save(&self.config.output_file)?;
        info!(path = %output_file, blocks = dataset.block_count(), "extraction complete");

        let summary = ExtractSummary {
            output_file,
            updated_at: dataset.updated_at.to_rfc3339(),
            sheets: dataset
                .sheet_names()
                .map(|sheet| SheetSummary {
                    sheet: sheet.to_string(),
                    blocks: dataset.blocks(sheet).len(),
                    latest: dataset.latest_label(sheet).map(|l| l.canonical()),
                })
                .collect(),
        };
        format.write(out, &summary)
    }
}
