//! The dataset document: every sheet's blocks from one extraction run.
//!
//! Produced wholesale by extraction and read as an immutable snapshot by the
//! checks.
//!
//! ```json
//! {
//!   "updated_at": "2024-02-21T09:00:00+09:00",
//!   "spreadsheet_id": "1AbC...",
//!   "output_file": "data/dataset.json",
//!   "sheets": { "A": [ { "date": "2月20日", "a1": "B3", "row": 3, "col": 2, "metrics": { ... } } ] }
//! }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::block::DateBlock;
use crate::date::DateLabel;
use crate::error::{GridError, Result};
use crate::extract::extract_sheet;
use crate::source::{GridSource, SheetRange};

/// One extraction snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    /// When the snapshot was produced.
    pub updated_at: DateTime<FixedOffset>,
    /// Identifier of the source spreadsheet.
    pub spreadsheet_id: String,
    /// Where the snapshot is written, relative to the working directory.
    pub output_file: String,
    /// Blocks per sheet, each sorted by date then anchor reference.
    pub sheets: BTreeMap<String, Vec<DateBlock>>,
}

impl Dataset {
    /// Creates an empty dataset.
    #[must_use]
    pub fn new(
        spreadsheet_id: impl Into<String>,
        output_file: impl Into<String>,
        updated_at: DateTime<FixedOffset>,
    ) -> Self {
        Self {
            updated_at,
            spreadsheet_id: spreadsheet_id.into(),
            output_file: output_file.into(),
            sheets: BTreeMap::new(),
        }
    }

    /// Fetches and extracts every sheet in `ranges`.
    ///
    /// Any fetch failure aborts the whole run; no partial dataset is returned.
    pub fn extract<S: GridSource + ?Sized>(
        source: &S,
        ranges: &[SheetRange],
        spreadsheet_id: impl Into<String>,
        output_file: impl Into<String>,
        updated_at: DateTime<FixedOffset>,
    ) -> Result<Self> {
        let mut dataset = Self::new(spreadsheet_id, output_file, updated_at);
        for range in ranges {
            let grid = source.fetch(range)?;
            let blocks = extract_sheet(&range.sheet, &grid);
            info!(sheet = %range.sheet, blocks = blocks.len(), "sheet extracted");
            dataset.insert_sheet(&range.sheet, blocks);
        }
        Ok(dataset)
    }

    /// Replaces a sheet's blocks, re-sorting them and stamping the sheet name.
    pub fn insert_sheet(&mut self, sheet: &str, mut blocks: Vec<DateBlock>) {
        for block in &mut blocks {
            block.sheet = sheet.to_string();
        }
        blocks.sort_by(DateBlock::dataset_order);
        self.sheets.insert(sheet.to_string(), blocks);
    }

    /// Sheet names in document order.
    pub fn sheet_names(&self) -> impl Iterator<Item = &str> {
        self.sheets.keys().map(String::as_str)
    }

    /// A sheet's blocks, empty for unknown sheets.
    #[must_use]
    pub fn blocks(&self, sheet: &str) -> &[DateBlock] {
        self.sheets.get(sheet).map_or(&[], Vec::as_slice)
    }

    /// The latest date label among a sheet's blocks.
    #[must_use]
    pub fn latest_label(&self, sheet: &str) -> Option<DateLabel> {
        self.blocks(sheet).iter().map(|b| b.label).max()
    }

    /// Every block of `sheet` labelled `label`, in dataset order.
    pub fn find_blocks<'a>(
        &'a self,
        sheet: &str,
        label: DateLabel,
    ) -> impl Iterator<Item = &'a DateBlock> + 'a {
        self.blocks(sheet).iter().filter(move |b| b.label == label)
    }

    /// Total number of blocks across all sheets.
    #[must_use]
    pub fn block_count(&self) -> usize {
        self.sheets.values().map(Vec::len).sum()
    }

    /// Parses a dataset document.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::MalformedDataset`] when the `sheets` mapping is
    /// missing or is not an object.
    pub fn from_json(json: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        match value.get("sheets") {
            Some(serde_json::Value::Object(_)) => {}
            Some(_) => {
                return Err(GridError::MalformedDataset {
                    reason: "'sheets' is not an object".to_string(),
                });
            }
            None => {
                return Err(GridError::MalformedDataset {
                    reason: "missing 'sheets' mapping".to_string(),
                });
            }
        }
        let mut dataset: Self = serde_json::from_value(value)?;
        for (sheet, blocks) in &mut dataset.sheets {
            for block in blocks.iter_mut() {
                block.sheet.clone_from(sheet);
            }
            blocks.sort_by(DateBlock::dataset_order);
        }
        Ok(dataset)
    }

    /// Loads a dataset document from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)?;
        let dataset = Self::from_json(&json)?;
        debug!(path = %path.display(), blocks = dataset.block_count(), "loaded dataset");
        Ok(dataset)
    }

    /// Writes the document, replacing any previous snapshot atomically.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let bytes = serde_json::to_vec_pretty(self)?;
        let tmp_path = path.with_extension("tmp");
        fs::write(&tmp_path, bytes)?;
        fs::rename(&tmp_path, path)?;
        info!(path = %path.display(), blocks = self.block_count(), "dataset written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::Metrics;
    use crate::cell::Cell;
    use crate::grid::Grid;
    use crate::source::MemoryGridSource;

    fn now() -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339("2024-02-21T09:00:00+09:00").unwrap()
    }

    fn block(label: &str, a1: &str) -> DateBlock {
        DateBlock {
            sheet: String::new(),
            label: label.parse().unwrap(),
            anchor_ref: a1.to_string(),
            row: 1,
            col: 1,
            metrics: Metrics::default(),
        }
    }

    #[test]
    fn latest_and_lookup() {
        let mut dataset = Dataset::new("id", "out.json", now());
        dataset.insert_sheet("A", vec![block("2月20日", "B1"), block("2月3日", "C1"), block("2月20日", "A1")]);
        assert_eq!(dataset.latest_label("A"), Some("2月20日".parse().unwrap()));
        assert_eq!(dataset.latest_label("missing"), None);
        let found: Vec<_> = dataset
            .find_blocks("A", "2月20日".parse().unwrap())
            .map(|b| b.anchor_ref.as_str())
            .collect();
        assert_eq!(found, vec!["A1", "B1"]);
        assert!(dataset.blocks("A").iter().all(|b| b.sheet == "A"));
    }

    #[test]
    fn missing_sheets_is_malformed() {
        let err = Dataset::from_json(r#"{"updated_at": "2024-02-21T09:00:00+09:00"}"#).unwrap_err();
        assert!(matches!(err, GridError::MalformedDataset { .. }));
        let err = Dataset::from_json(r#"{"sheets": []}"#).unwrap_err();
        assert!(matches!(err, GridError::MalformedDataset { .. }));
    }

    #[test]
    fn save_and_load_restores_sheet_names() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("data").join("dataset.json");

        let mut dataset = Dataset::new("sheet-id", "data/dataset.json", now());
        let mut b = block("1月5日", "B2");
        b.metrics.set("架電数", Cell::from("40件"));
        dataset.insert_sheet("営業1課", vec![b]);
        dataset.save(&path).expect("save");

        let loaded = Dataset::load(&path).expect("load");
        assert_eq!(loaded, dataset);
        assert_eq!(loaded.blocks("営業1課")[0].sheet, "営業1課");
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn extract_runs_every_sheet() {
        let mut source = MemoryGridSource::default();
        source.insert("A", Grid::from_text_rows(vec![vec![Some("2月10日")], vec![Some("山田")]]));
        source.insert("B", Grid::default());
        let ranges = vec![SheetRange::new("A", "A1:Z200"), SheetRange::new("B", "A1:Z200")];

        let dataset = Dataset::extract(&source, &ranges, "id", "out.json", now()).expect("extract");
        assert_eq!(dataset.blocks("A").len(), 1);
        assert!(dataset.blocks("B").is_empty());
        assert_eq!(dataset.sheet_names().count(), 2);
    }

    #[test]
    fn extract_aborts_on_fetch_failure() {
        let source = MemoryGridSource::default();
        let ranges = vec![SheetRange::new("missing", "A1:Z200")];
        let err = Dataset::extract(&source, &ranges, "id", "out.json", now()).unwrap_err();
        assert!(matches!(err, GridError::Fetch { .. }));
    }
}
