//! Date listing command implementation.
//!
//! Lists the anchors of one sheet using the strict label policy, so only
//! cells holding exactly a date label are shown.

use std::io::Write;

use kpi_grid::{DirGridSource, GridSource, SheetRange, StrictLabel, scan_anchors};

use crate::config::Config;
use crate::error::CliError;
use crate::output::{DateEntry, DateList, OutputFormat};

/// Handler for `kpiwatch dates`.
pub struct DatesCommand<'a> {
    config: &'a Config,
}

impl<'a> DatesCommand<'a> {
    /// Creates a new dates command handler.
    #[must_use]
    pub const fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Lists the dates on `sheet` from the configured grid directory.
    ///
    /// # Errors
    ///
    /// Returns error if the sheet is not configured or its grid cannot be fetched.
    pub fn execute<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        sheet: &str,
    ) -> Result<(), CliError> {
        let source = DirGridSource::new(&self.config.grid_dir);
        self.execute_with(&source, out, format, sheet)
    }

    /// Lists the dates on `sheet` from `source`.
    ///
    /// # Errors
    ///
    /// Returns error if the sheet is not configured or its grid cannot be fetched.
    pub fn execute_with<S: GridSource + ?Sized, W: Write>(
        &self,
        source: &S,
        out: &mut W,
        format: &OutputFormat,
        sheet: &str,
    ) -> Result<(), CliError> {
        let range = self
            .config
            .sheets
            .iter()
            .find(|s| s.name == sheet)
            .map(|s| SheetRange::new(&s.name, &s.range))
            .ok_or_else(|| CliError::InvalidArgument(format!("sheet '{sheet}' is not configured")))?;

        let grid = source.fetch(&range)?;
        let mut anchors = scan_anchors(&grid, &StrictLabel);
        anchors.sort_by_key(|a| (a.label, a.col, a.row));

        let list = DateList {
            sheet: sheet.to_string(),
            dates: anchors
                .iter()
                .map(|a| DateEntry {
                    date: a.label.canonical(),
                    a1: a.a1(),
                })
                .collect(),
        };
        format.write(out, &list)
    }
}
