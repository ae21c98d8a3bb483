//! Sparse 2D grids of raw cells.

use serde::{Deserialize, Serialize};

use crate::cell::Cell;

static BLANK: Cell = Cell::Blank;

/// A rectangular-or-ragged grid of cells, row-major, 0-based.
///
/// Rows may have different lengths; anything outside the stored cells reads
/// as [`Cell::Blank`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Grid {
    rows: Vec<Vec<Cell>>,
}

impl Grid {
    /// Creates a grid from rows of cells.
    #[must_use]
    pub const fn new(rows: Vec<Vec<Cell>>) -> Self {
        Self { rows }
    }

    /// Builds a grid from rows of optional text, the shape returned by
    /// spreadsheet value APIs.
    #[must_use]
    pub fn from_text_rows<R, C, S>(rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator<Item = Option<S>>,
        S: Into<String>,
    {
        let rows = rows
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|cell| cell.map_or(Cell::Blank, Cell::from_text))
                    .collect()
            })
            .collect();
        Self { rows }
    }

    /// Returns the cell at `(row, col)`, or blank when out of bounds.
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> &Cell {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&BLANK)
    }

    /// Sets a cell, growing the grid as needed.
    pub fn set(&mut self, row: usize, col: usize, cell: Cell) {
        if self.rows.len() <= row {
            self.rows.resize_with(row + 1, Vec::new);
        }
        let r = &mut self.rows[row];
        if r.len() <= col {
            r.resize(col + 1, Cell::Blank);
        }
        r[col] = cell;
    }

    /// Number of stored rows.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Iterates over every non-blank cell as `(row, col, cell)`.
    pub fn populated(&self) -> impl Iterator<Item = (usize, usize, &Cell)> {
        self.rows.iter().enumerate().flat_map(|(r, row)| {
            row.iter()
                .enumerate()
                .filter(|(_, cell)| !cell.is_blank())
                .map(move |(c, cell)| (r, c, cell))
        })
    }
}

/// Converts a 0-based column index to spreadsheet letters (`0 -> A`, `26 -> AA`).
#[must_use]
pub fn column_letters(col: usize) -> String {
    let mut col = col as u64 + 1;
    let mut letters = Vec::new();
    while col > 0 {
        let rem = ((col - 1) % 26) as u8;
        letters.push((b'A' + rem) as char);
        col = (col - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// Formats 0-based coordinates as an A1 reference (`(4, 2) -> C5`).
#[must_use]
pub fn a1_ref(row: usize, col: usize) -> String {
    format!("{}{}", column_letters(col), row + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(0, "A")]
    #[test_case(25, "Z")]
    #[test_case(26, "AA")]
    #[test_case(51, "AZ")]
    #[test_case(702, "AAA")]
    fn column_letters_match_a1(col: usize, expected: &str) {
        assert_eq!(column_letters(col), expected);
    }

    #[test]
    fn a1_is_one_based_row() {
        assert_eq!(a1_ref(4, 2), "C5");
        assert_eq!(a1_ref(0, 0), "A1");
    }

    #[test]
    fn out_of_bounds_reads_blank() {
        let grid = Grid::from_text_rows(vec![vec![Some("a")], vec![None, Some("b")]]);
        assert_eq!(grid.get(0, 0), &Cell::Text("a".to_string()));
        assert_eq!(grid.get(0, 1), &Cell::Blank);
        assert_eq!(grid.get(99, 99), &Cell::Blank);
    }

    #[test]
    fn populated_skips_blanks() {
        let grid = Grid::from_text_rows(vec![vec![Some(""), Some("x")], vec![None, Some(" ")]]);
        let cells: Vec<_> = grid.populated().map(|(r, c, _)| (r, c)).collect();
        assert_eq!(cells, vec![(0, 1)]);
    }

    #[test]
    fn set_grows_grid() {
        let mut grid = Grid::default();
        grid.set(2, 3, Cell::Number(1.0));
        assert_eq!(grid.row_count(), 3);
        assert_eq!(grid.get(2, 3), &Cell::Number(1.0));
    }

    #[test]
    fn deserializes_from_nested_arrays() {
        let grid: Grid = serde_json::from_str(r#"[["2月1日", null], [null, 12]]"#).unwrap();
        assert_eq!(grid.get(1, 1), &Cell::Number(12.0));
    }
}
