//! Grid sources.
//!
//! Fetching a sheet over a network API (and authenticating to it) happens
//! outside this crate. [`GridSource`] is the seam: the extraction run only
//! needs "give me the cells of this sheet range".

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{GridError, Result};
use crate::grid::Grid;

/// A sheet and the cell range to read from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetRange {
    /// Sheet (tab) name.
    pub sheet: String,
    /// A1 range, e.g. `A1:AZ400`.
    pub range: String,
}

impl SheetRange {
    /// Creates a sheet range.
    #[must_use]
    pub fn new(sheet: impl Into<String>, range: impl Into<String>) -> Self {
        Self {
            sheet: sheet.into(),
            range: range.into(),
        }
    }
}

impl fmt::Display for SheetRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}'!{}", self.sheet, self.range)
    }
}

/// Something that can deliver the cells of a sheet range.
pub trait GridSource: fmt::Debug {
    /// Fetches the grid for `range`.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::Fetch`] if the sheet cannot be delivered.
    fn fetch(&self, range: &SheetRange) -> Result<Grid>;
}

/// Reads grids exported as JSON (`[[cell, ...], ...]`), one file per sheet
/// named `<sheet>.json` under a directory.
#[derive(Debug, Clone)]
pub struct DirGridSource {
    dir: PathBuf,
}

impl DirGridSource {
    /// Creates a source reading from `dir`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the grid file for a sheet.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::Fetch`] for names that could resolve outside the
    /// directory: empty, `.`, or containing `..` or a path separator.
    pub fn path_for(&self, sheet: &str) -> Result<PathBuf> {
        if sheet.is_empty() || sheet == "." || sheet.contains("..") || sheet.contains(['/', '\\']) {
            return Err(GridError::Fetch {
                sheet: sheet.to_string(),
                reason: "sheet name cannot be used as a file name".to_string(),
            });
        }
        Ok(self.dir.join(format!("{sheet}.json")))
    }
}

impl GridSource for DirGridSource {
    fn fetch(&self, range: &SheetRange) -> Result<Grid> {
        let path = self.path_for(&range.sheet)?;
        let fetch_err = |reason: String| GridError::Fetch {
            sheet: range.sheet.clone(),
            reason,
        };
        let json = fs::read_to_string(&path)
            .map_err(|e| fetch_err(format!("{}: {e}", path.display())))?;
        let grid: Grid = serde_json::from_str(&json)
            .map_err(|e| fetch_err(format!("{}: {e}", path.display())))?;
        debug!(range = %range, rows = grid.row_count(), "grid loaded");
        Ok(grid)
    }
}

/// In-memory grids keyed by sheet name.
#[derive(Debug, Clone, Default)]
pub struct MemoryGridSource {
    grids: HashMap<String, Grid>,
}

impl MemoryGridSource {
    /// Stores the grid for a sheet.
    pub fn insert(&mut self, sheet: impl Into<String>, grid: Grid) {
        self.grids.insert(sheet.into(), grid);
    }
}

impl GridSource for MemoryGridSource {
    fn fetch(&self, range: &SheetRange) -> Result<Grid> {
        self.grids
            .get(&range.sheet)
            .cloned()
            .ok_or_else(|| GridError::Fetch {
                sheet: range.sheet.clone(),
                reason: "sheet not found".to_string(),
            })
    }
}
