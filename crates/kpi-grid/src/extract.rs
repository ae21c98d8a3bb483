//! Block extraction.
//!
//! Below every anchor, the same column holds the block's values at fixed
//! offsets: rows `+1..=+20`, then `+24..=+26`. Rows `+21..=+23` are a
//! structural gap in the source layout and are never read.

use std::ops::RangeInclusive;

use tracing::debug;

use crate::block::{DateBlock, Metrics};
use crate::grid::Grid;
use crate::scanner::{Anchor, EmbeddedLabel, scan_anchors};

/// Row offsets below the anchor, in schema order.
const VALUE_OFFSETS: [RangeInclusive<usize>; 2] = [1..=20, 24..=26];

/// Row offsets read for one block, in schema order.
pub fn value_offsets() -> impl Iterator<Item = usize> {
    VALUE_OFFSETS.into_iter().flatten()
}

/// Builds the block for a single anchor.
#[must_use]
pub fn extract_block(sheet: &str, grid: &Grid, anchor: &Anchor) -> DateBlock {
    let cells = value_offsets().map(|offset| {
        anchor
            .row
            .checked_add(offset)
            .map(|row| grid.get(row, anchor.col).clone())
            .unwrap_or_default()
    });
    DateBlock {
        sheet: sheet.to_string(),
        label: anchor.label,
        anchor_ref: anchor.a1(),
        row: anchor.row + 1,
        col: anchor.col + 1,
        metrics: Metrics::from_cells(cells),
    }
}

/// Scans a sheet for anchors (embedded-label policy) and extracts every
/// block, sorted by date then anchor reference.
#[must_use]
pub fn extract_sheet(sheet: &str, grid: &Grid) -> Vec<DateBlock> {
    let anchors = scan_anchors(grid, &EmbeddedLabel);
    let mut blocks: Vec<DateBlock> = anchors
        .iter()
        .map(|anchor| extract_block(sheet, grid, anchor))
        .collect();
    blocks.sort_by(DateBlock::dataset_order);
    debug!(sheet = %sheet, anchors = anchors.len(), "extracted blocks");
    blocks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::Cell;
    use crate::schema::METRICS;

    /// Lays out a block under `(row, col)` with the value for schema
    /// position `i` set to `value(i)`.
    fn place_block(grid: &mut Grid, row: usize, col: usize, label: &str, value: impl Fn(usize) -> Cell) {
        grid.set(row, col, Cell::from(label));
        for (i, offset) in value_offsets().enumerate() {
            grid.set(row + offset, col, value(i));
        }
    }

    #[test]
    fn offsets_skip_the_gap() {
        let offsets: Vec<_> = value_offsets().collect();
        assert_eq!(offsets.len(), 23);
        assert_eq!(offsets[19], 20);
        assert_eq!(offsets[20], 24);
        assert!(!offsets.contains(&21) && !offsets.contains(&22) && !offsets.contains(&23));
    }

    #[test]
    fn block_values_follow_schema() {
        let mut grid = Grid::default();
        place_block(&mut grid, 2, 1, "2月10日", |i| Cell::Number(i as f64));
        // Gap rows must be ignored even when populated.
        grid.set(2 + 21, 1, Cell::from("gap"));

        let blocks = extract_sheet("A", &grid);
        assert_eq!(blocks.len(), 1);
        let block = &blocks[0];
        assert_eq!(block.anchor_ref, "B3");
        assert_eq!((block.row, block.col), (3, 2));
        for (i, spec) in METRICS.iter().enumerate() {
            assert_eq!(block.metrics.get(spec.name), &Cell::Number(i as f64));
        }
    }

    #[test]
    fn out_of_bounds_reads_blank() {
        let mut grid = Grid::default();
        grid.set(0, 0, Cell::from("3月1日"));
        grid.set(1, 0, Cell::from("佐藤"));
        let blocks = extract_sheet("A", &grid);
        assert_eq!(blocks[0].metrics.get("担当者名"), &Cell::from("佐藤"));
        assert!(blocks[0].metrics.get("明日の目標").is_blank());
    }

    #[test]
    fn duplicate_labels_are_kept_and_sorted() {
        let mut grid = Grid::default();
        place_block(&mut grid, 0, 2, "2月20日", |_| Cell::Blank);
        place_block(&mut grid, 0, 1, "2月20日", |_| Cell::Blank);
        place_block(&mut grid, 30, 1, "2月3日(月)", |_| Cell::Blank);
        grid.set(60, 1, Cell::from("13月40日"));

        let blocks = extract_sheet("A", &grid);
        let refs: Vec<_> = blocks.iter().map(|b| (b.label.canonical(), b.anchor_ref.clone())).collect();
        assert_eq!(
            refs,
            vec![
                ("2月3日".to_string(), "B31".to_string()),
                ("2月20日".to_string(), "B1".to_string()),
                ("2月20日".to_string(), "C1".to_string()),
            ]
        );
    }
}
