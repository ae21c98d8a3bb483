//! Test helpers for E2E tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset};
use kpi_grid::extract::value_offsets;
use kpi_grid::schema::metric_names;
use kpi_grid::{Cell, Grid};

/// Row offset below the anchor where `metric` is read.
pub fn offset_of(metric: &str) -> usize {
    let index = metric_names().position(|name| name == metric).unwrap();
    value_offsets().nth(index).unwrap()
}

/// Parses an RFC 3339 timestamp.
pub fn at(ts: &str) -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339(ts).unwrap()
}

/// Installs a test subscriber once; `RUST_LOG` controls the level.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Builds a daily-report grid with one block per column, starting at column B.
///
/// Each block is `(anchor text, [(metric name, cell)])`.
pub fn report_grid(blocks: &[(&str, Vec<(&str, Cell)>)]) -> Grid {
    let mut grid = Grid::default();
    grid.set(0, 0, Cell::from("日付"));
    for (i, (anchor, values)) in blocks.iter().enumerate() {
        let col = i + 1;
        grid.set(0, col, Cell::from(*anchor));
        for (metric, cell) in values {
            grid.set(offset_of(metric), col, cell.clone());
        }
    }
    grid
}

/// Writes `grid` as `<dir>/<sheet>.json`.
pub fn write_grid(dir: &Path, sheet: &str, grid: &Grid) -> PathBuf {
    std::fs::create_dir_all(dir).unwrap();
    let path = dir.join(format!("{sheet}.json"));
    std::fs::write(&path, serde_json::to_vec(grid).unwrap()).unwrap();
    path
}
