//! Rendering of command results for the terminal.

use std::io::Write;

use kpi_alerts::{CheckReport, FollowupAlert, MissingAlert, SheetAlert};
use serde::Serialize;

use crate::cli::Format;
use crate::error::CliError;

/// Renders command results as a plain-text summary or pretty JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputFormat {
    format: Format,
}

impl OutputFormat {
    #[must_use]
    pub const fn new(format: Format) -> Self {
        Self { format }
    }

    /// True when `--format json` was given.
    #[must_use]
    pub const fn is_json(&self) -> bool {
        matches!(self.format, Format::Json)
    }

    /// Writes `value` followed by a newline.
    ///
    /// # Errors
    ///
    /// Fails when the value cannot be encoded or `writer` rejects the bytes.
    pub fn write<W, T>(&self, writer: &mut W, value: &T) -> Result<(), CliError>
    where
        W: Write,
        T: Serialize + TableDisplay,
    {
        if self.is_json() {
            serde_json::to_writer_pretty(&mut *writer, value)
                .map_err(|e| CliError::Format(format!("cannot encode output: {e}")))?;
            writeln!(writer)?;
            return Ok(());
        }
        value.write_table(writer)
    }

    /// Renders `value` into a string.
    ///
    /// # Errors
    ///
    /// Fails under the same conditions as [`OutputFormat::write`].
    pub fn to_string<T>(&self, value: &T) -> Result<String, CliError>
    where
        T: Serialize + TableDisplay,
    {
        let mut buf = Vec::new();
        self.write(&mut buf, value)?;
        String::from_utf8(buf).map_err(|e| CliError::Format(format!("output is not UTF-8: {e}")))
    }
}

/// Human-readable rendering of a command result.
pub trait TableDisplay {
    /// # Errors
    ///
    /// Fails when `writer` does.
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError>;
}

/// Per-sheet result of an extraction.
#[derive(Debug, Clone, Serialize)]
pub struct SheetSummary {
    /// Sheet name.
    pub sheet: String,
    /// Blocks extracted.
    pub blocks: usize,
    /// Latest date label, if any block was found.
    pub latest: Option<String>,
}

/// Result of an extraction run.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractSummary {
    /// Where the dataset was written.
    pub output_file: String,
    /// Snapshot timestamp.
    pub updated_at: String,
    /// One entry per sheet.
    pub sheets: Vec<SheetSummary>,
}

impl TableDisplay for ExtractSummary {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "Dataset: {} ({})", self.output_file, self.updated_at)?;
        writeln!(writer)?;
        writeln!(writer, "{:<20} {:>8}  LATEST", "SHEET", "BLOCKS")?;
        writeln!(writer, "{}", "─".repeat(40))?;
        for sheet in &self.sheets {
            writeln!(
                writer,
                "{:<20} {:>8}  {}",
                sheet.sheet,
                sheet.blocks,
                sheet.latest.as_deref().unwrap_or("-")
            )?;
        }
        Ok(())
    }
}

/// A date anchor on a sheet.
#[derive(Debug, Clone, Serialize)]
pub struct DateEntry {
    /// Canonical label.
    pub date: String,
    /// A1 reference of the anchor cell.
    pub a1: String,
}

/// Date anchors found on one sheet.
#[derive(Debug, Clone, Serialize)]
pub struct DateList {
    /// Sheet name.
    pub sheet: String,
    /// Anchors in date order.
    pub dates: Vec<DateEntry>,
}

impl TableDisplay for DateList {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.dates.is_empty() {
            writeln!(writer, "No dates found on sheet '{}'.", self.sheet)?;
            return Ok(());
        }
        writeln!(writer, "{:<10} CELL", "DATE")?;
        writeln!(writer, "{}", "─".repeat(20))?;
        for entry in &self.dates {
            writeln!(writer, "{:<10} {}", entry.date, entry.a1)?;
        }
        Ok(())
    }
}

fn write_summary<W: Write, T>(
    writer: &mut W,
    name: &str,
    report: &CheckReport<T>,
) -> Result<(), CliError> {
    writeln!(writer, "{name}")?;
    writeln!(writer, "══════════════════════════════════")?;
    writeln!(writer, "Sheets checked:   {}", report.sheets_checked)?;
    writeln!(writer, "Alerts:           {}", report.alerts.len())?;
    if !report.skipped.is_empty() {
        writeln!(writer, "Already notified: {}", report.skipped.join(", "))?;
    }
    writeln!(writer, "Notified:         {}", if report.notified { "yes" } else { "no" })?;
    if !report.recorded.is_empty() {
        writeln!(writer, "Recorded:         {}", report.recorded.join(", "))?;
    }
    if let Some(message) = &report.message {
        writeln!(writer)?;
        writeln!(writer, "{message}")?;
    }
    Ok(())
}

impl TableDisplay for CheckReport<MissingAlert> {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        write_summary(writer, "Missing fields", self)
    }
}

impl TableDisplay for CheckReport<SheetAlert> {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        write_summary(writer, "Below monthly average", self)
    }
}

impl TableDisplay for CheckReport<FollowupAlert> {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        write_summary(writer, "Follow-up", self)
    }
}
