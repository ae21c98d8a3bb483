//! Date-anchored metric block extraction from spreadsheet grids.
//!
//! Daily report sheets repeat the same block layout: a cell holding a date
//! label (`2月20日`) with the day's metrics listed below it in the same
//! column. `kpi-grid` finds those anchors, reads the blocks, and writes them
//! to a [`Dataset`] snapshot consumed by the checks in `kpi-alerts`.
//!
//! # Example
//!
//! ```rust
//! use kpi_grid::{Cell, Grid, extract_sheet, normalize};
//!
//! let mut grid = Grid::default();
//! grid.set(0, 1, Cell::from("２月２０日(火)"));
//! grid.set(4, 1, Cell::from("1,234"));
//!
//! let blocks = extract_sheet("A", &grid);
//! assert_eq!(blocks[0].label.canonical(), "2月20日");
//! assert_eq!(blocks[0].anchor_ref, "B1");
//! assert_eq!(normalize(blocks[0].metrics.get("架電数")), Some(1234.0));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod block;
pub mod cell;
pub mod dataset;
pub mod date;
pub mod error;
pub mod extract;
pub mod grid;
pub mod normalize;
pub mod scanner;
pub mod schema;
pub mod source;

pub use block::{DateBlock, Metrics};
pub use cell::Cell;
pub use dataset::Dataset;
pub use date::{DateLabel, REFERENCE_YEAR};
pub use error::{CellParseError, GridError, Result};
pub use extract::{extract_block, extract_sheet};
pub use grid::{Grid, a1_ref};
pub use normalize::{normalize, normalize_text};
pub use scanner::{Anchor, EmbeddedLabel, LabelRecognizer, StrictLabel, scan_anchors};
pub use schema::{METRICS, MetricKind, MetricSpec};
pub use source::{DirGridSource, GridSource, MemoryGridSource, SheetRange};
