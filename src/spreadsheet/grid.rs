use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::cell::CellType;
use std::collections::HashMap;

/// Untyped 2-D view of one worksheet, indexed by absolute 0-based (row, column).
///
/// Only cells with a value are stored; every position outside them reads as blank.
/// Whitespace-only text is a value: it still counts as text and extends the used range.
#[derive(Clone, Debug, Default)]
pub(crate) struct Grid {
    /// Source file name
    pub(crate) file_name: String,
    /// Sheet name
    pub(crate) name: String,
    /// All stored cells, in insertion order
    cells: Vec<Cell>,
    /// Index mapping from (row, column) to cell vector position
    indexes: HashMap<(usize, usize), usize>,
    /// One past the last used row
    row_count: usize,
    /// One past the last used column
    col_count: usize,
}

impl Grid {
    pub(crate) fn new(file_name: &str, name: &str) -> Self {
        Grid {
            file_name: file_name.to_owned(),
            name: name.to_owned(),
            ..Default::default()
        }
    }

    /// Adds a cell; a later cell at the same position replaces the earlier one.
    pub(crate) fn push(&mut self, cell: Cell) {
        if cell.kind == CellType::Empty || cell.value.is_empty() {
            return;
        }
        self.row_count = self.row_count.max(cell.row + 1);
        self.col_count = self.col_count.max(cell.col + 1);
        let position = (cell.row, cell.col);
        if let Some(index) = self.indexes.get(&position) {
            self.cells[*index] = cell;
        } else {
            self.indexes.insert(position, self.cells.len());
            self.cells.push(cell);
        }
    }

    pub(crate) fn row_count(&self) -> usize {
        self.row_count
    }

    pub(crate) fn col_count(&self) -> usize {
        self.col_count
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Gets the cell at the position, `None` when blank or out of range.
    pub(crate) fn get(&self, row: usize, col: usize) -> Option<&Cell> {
        self.indexes
            .get(&(row, col))
            .and_then(|index| self.cells.get(*index))
    }

    /// Text of a text cell, `None` for any other kind.
    pub(crate) fn text(&self, row: usize, col: usize) -> Option<&str> {
        self.get(row, col)
            .filter(|cell| cell.is_text())
            .map(|cell| cell.value.as_str())
    }

    /// Display text of any cell, empty for blanks.
    pub(crate) fn display(&self, row: usize, col: usize) -> String {
        self.get(row, col).map(|cell| cell.to_string()).unwrap_or_default()
    }

    /// Returns true when every cell of the row is missing or blank.
    pub(crate) fn is_blank_row(&self, row: usize) -> bool {
        (0..self.col_count).all(|col| self.get(row, col).map(|cell| cell.is_blank()).unwrap_or(true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> Grid {
        let mut grid = Grid::new("survey.xlsx", "Banner");
        grid.push(Cell::new(1, 1, CellType::Text, "Table Title"));
        grid.push(Cell::new(3, 4, CellType::Number, "0.5"));
        grid.push(Cell::new(5, 0, CellType::Text, "   "));
        grid
    }

    #[test]
    fn bounds_follow_used_cells() {
        let grid = grid();
        assert_eq!(grid.row_count(), 6);
        assert_eq!(grid.col_count(), 5);
        assert!(!grid.is_empty());
        assert!(Grid::new("", "").is_empty());
    }

    #[test]
    fn out_of_range_reads_are_blank() {
        let grid = grid();
        assert!(grid.get(100, 100).is_none());
        assert_eq!(grid.display(100, 100), "");
        assert_eq!(grid.text(3, 4), None);
        assert_eq!(grid.text(1, 1), Some("Table Title"));
        assert_eq!(grid.display(3, 4), "0.5");
        assert!(grid.is_blank_row(0));
        assert!(!grid.is_blank_row(1));
        assert!(grid.is_blank_row(5));
    }

    #[test]
    fn whitespace_text_is_kept() {
        let mut grid = grid();
        grid.push(Cell::new(9, 2, CellType::Text, " "));
        grid.push(Cell::new(12, 2, CellType::Text, ""));
        grid.push(Cell::new(12, 3, CellType::Empty, ""));
        assert_eq!(grid.text(9, 2), Some(" "));
        assert_eq!(grid.row_count(), 10);
        assert!(grid.get(12, 2).is_none());
    }

    #[test]
    fn later_cells_replace_earlier_ones() {
        let mut grid = grid();
        grid.push(Cell::new(1, 1, CellType::Text, "Table Title 2"));
        assert_eq!(grid.text(1, 1), Some("Table Title 2"));
    }
}
