//! # Cross-Tab Module
//!
//! Loads a plain cross-tab sheet: one or more header rows on top, one data
//! record per row below. Stacked header rows are flattened into a single
//! column name per column.
use crate::spreadsheet::grid::Grid;
use std::collections::HashSet;

/// Prefix of the names pandas gives to blank header cells.
const UNNAMED_PREFIX: &str = "Unnamed";

/// A cross-tab sheet with flattened, unique column names.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct CrossTab {
    pub(crate) columns: Vec<String>,
    /// Display text of every data cell; empty for blanks
    pub(crate) rows: Vec<Vec<String>>,
}

impl CrossTab {
    /// Builds a cross-tab from the first `header_rows` rows as header and the rest as data.
    pub(crate) fn from_grid(grid: &Grid, header_rows: usize) -> CrossTab {
        // Header rows past the used range are blank and add nothing
        let header_rows = header_rows.min(grid.row_count());
        let columns = dedupe_names(&flatten_header(grid, header_rows));
        let last_row = (header_rows..grid.row_count())
            .rev()
            .find(|row| !grid.is_blank_row(*row))
            .map(|row| row + 1)
            .unwrap_or(header_rows);
        let rows = (header_rows..last_row)
            .map(|row| (0..columns.len()).map(|col| grid.display(row, col)).collect())
            .collect();
        log::debug!(
            "cross-tab '{}': {} columns, {} rows",
            grid.name,
            columns.len(),
            last_row.saturating_sub(header_rows)
        );
        CrossTab { columns, rows }
    }
}

/// Joins the header cells of each column with a single space.
///
/// Blank cells of the upper header rows take the value to their left, so a
/// banner heading spanning merged cells names every column below it. Blank
/// and "Unnamed" parts are skipped; a column left without a name is called
/// `column<index>`.
pub(crate) fn flatten_header(grid: &Grid, header_rows: usize) -> Vec<String> {
    let mut carried = vec![String::new(); header_rows];
    (0..grid.col_count())
        .map(|col| {
            let mut parts = Vec::with_capacity(header_rows);
            for row in 0..header_rows {
                let value = grid.display(row, col).trim().to_owned();
                let is_upper = row + 1 < header_rows;
                let part = if value.is_empty() && is_upper {
                    carried[row].to_owned()
                } else {
                    value
                };
                if is_upper {
                    carried[row] = part.to_owned();
                }
                if !part.is_empty() && !part.starts_with(UNNAMED_PREFIX) {
                    parts.push(part);
                }
            }
            let name = parts.join(" ");
            if name.is_empty() {
                format!("column{}", col)
            } else {
                name
            }
        })
        .collect()
}

/// Renames repeated column names to `<name>_<index>`, keeping the first occurrence.
pub(crate) fn dedupe_names(names: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    names
        .iter()
        .enumerate()
        .map(|(index, name)| {
            if seen.insert(name.as_str()) {
                name.to_owned()
            } else {
                format!("{}_{}", name, index)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spreadsheet::cell::Cell;
    use crate::spreadsheet::cell::CellType;

    fn grid(rows: &[&[&str]]) -> Grid {
        let mut grid = Grid::new("crosstab.xlsx", "Sheet1");
        for (row, values) in rows.iter().enumerate() {
            for (col, value) in values.iter().enumerate() {
                let kind = if value.parse::<f64>().is_ok() { CellType::Number } else { CellType::Text };
                grid.push(Cell::new(row, col, kind, *value));
            }
        }
        grid
    }

    fn names(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn single_header_row() {
        let grid = grid(&[&["Question", "Total", "Male"], &["Aware", "42", "20"]]);
        assert_eq!(flatten_header(&grid, 1), names(&["Question", "Total", "Male"]));
    }

    #[test]
    fn stacked_header_rows_are_joined() {
        let grid = grid(&[
            &["", "Gender", "", "Age"],
            &["", "Male", "Female", "18-34"],
            &["Question", "A", "B", "C"],
            &["Aware", "20", "22", "10"],
        ]);
        assert_eq!(
            flatten_header(&grid, 3),
            names(&["Question", "Gender Male A", "Gender Female B", "Age 18-34 C"])
        );
    }

    #[test]
    fn unnamed_and_blank_headers() {
        let grid = grid(&[&["Unnamed: 0", "Total", ""], &["Aware", "42", "1"]]);
        assert_eq!(flatten_header(&grid, 1), names(&["column0", "Total", "column2"]));
    }

    #[test]
    fn duplicates_get_their_position() {
        assert_eq!(
            dedupe_names(&names(&["Metric", "Total", "Total", "Sig", "Total"])),
            names(&["Metric", "Total", "Total_2", "Sig", "Total_4"])
        );
    }

    #[test]
    fn trailing_blank_rows_are_dropped() {
        let mut grid = grid(&[&["Question", "Total", "Total"], &["Aware", "42", ""], &["", "", ""]]);
        grid.push(Cell::new(3, 0, CellType::Text, "  "));
        let crosstab = CrossTab::from_grid(&grid, 1);
        assert_eq!(crosstab.columns, names(&["Question", "Total", "Total_2"]));
        assert_eq!(crosstab.rows, vec![names(&["Aware", "42", ""])]);
    }

    #[test]
    fn header_only_sheet_has_no_rows() {
        let crosstab = CrossTab::from_grid(&grid(&[&["Question", "Total"]]), 1);
        assert!(crosstab.rows.is_empty());
        assert!(CrossTab::from_grid(&Grid::new("empty.csv", "empty"), 1).columns.is_empty());
    }

    #[test]
    fn header_rows_beyond_the_sheet_are_ignored() {
        let grid = grid(&[&["Question", "Total"], &["Aware", "42"]]);
        let crosstab = CrossTab::from_grid(&grid, 1_048_576);
        assert_eq!(crosstab.columns, names(&["Question Aware", "Total 42"]));
        assert!(crosstab.rows.is_empty());
    }
}
