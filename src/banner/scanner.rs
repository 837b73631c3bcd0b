use crate::banner::format::default_segment_name;
use crate::banner::format::format_cell;
use crate::banner::format::join_sig;
use crate::banner::layout::ScanLayout;
use crate::banner::BlockEnd;
use crate::banner::ExtractedTable;
use crate::banner::MetricRow;
use crate::banner::ParseOutcome;
use crate::banner::Segment;
use crate::spreadsheet::grid::Grid;
use crate::spreadsheet::reference::index_to_reference;

/// Placeholder WinCross prints for a suppressed value.
const SUPPRESSED: &str = "-";

/// A frequency or percentage cell of a metric row.
enum Value {
    Missing,
    Number(f64),
}

impl Value {
    fn number(&self) -> Option<f64> {
        match self {
            Value::Missing => None,
            Value::Number(value) => Some(*value),
        }
    }
}

/// Finds every table block in the grid, top to bottom.
///
/// Returns an empty list when the grid holds no marker. Malformed metric rows
/// end their block early and are reported through [`ExtractedTable::end`].
pub(crate) fn scan(grid: &Grid, layout: &ScanLayout) -> Vec<ExtractedTable> {
    let mut tables = Vec::new();
    let mut row = 0;
    while row < grid.row_count() {
        if !is_marker_row(grid, layout, row) {
            row += 1;
            continue;
        }

        let title = grid.display(row + layout.title_offset, layout.title_column);
        let segments = read_segments(grid, layout, row);
        let mut rows = Vec::new();
        let mut sub_row = row + layout.metric_start_offset;
        let end = loop {
            match parse_metric_row(grid, layout, sub_row) {
                ParseOutcome::Parsed(metric) => {
                    rows.push(metric);
                    sub_row += layout.metric_stride;
                }
                ParseOutcome::EndOfBlock => break BlockEnd::EndOfBlock { row: sub_row },
                ParseOutcome::Malformed(reason) => {
                    log::warn!(
                        "table '{}' at {} stops at malformed row {}: {}",
                        title,
                        index_to_reference(row, layout.marker_column),
                        index_to_reference(sub_row, layout.label_column),
                        reason
                    );
                    break BlockEnd::Malformed { row: sub_row, reason };
                }
            }
        };
        log::debug!(
            "table '{}' at {}: {} segments, {} metric rows",
            title,
            index_to_reference(row, layout.marker_column),
            segments.len(),
            rows.len()
        );

        tables.push(ExtractedTable { title, start_row: row, segments, rows, end });
        row = sub_row;
    }
    tables
}

fn is_marker_row(grid: &Grid, layout: &ScanLayout, row: usize) -> bool {
    grid.get(row, layout.marker_column)
        .map(|cell| cell.to_string().contains(&layout.marker))
        .unwrap_or(false)
}

/// Reads name and base count of every segment column.
pub(crate) fn read_segments(grid: &Grid, layout: &ScanLayout, start: usize) -> Vec<Segment> {
    let base_row = start + layout.base_count_offset;
    layout.segment_columns
        .iter()
        .enumerate()
        .map(|(position, col)| {
            let name = layout.segment_name_offset
                .map(|offset| grid.display(start + offset, *col).trim().to_owned())
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| default_segment_name(position));
            let base = grid.get(base_row, *col)
                .and_then(|cell| cell.as_number())
                .map(|count| count.trunc() as i64);
            Segment { name, base }
        })
        .collect()
}

/// Reads the frequency, percentage and significance rows starting at `row`.
pub(crate) fn parse_metric_row(grid: &Grid, layout: &ScanLayout, row: usize) -> ParseOutcome {
    if row + 2 >= grid.row_count() {
        return ParseOutcome::EndOfBlock;
    }
    let label = match grid.text(row, layout.label_column) {
        Some(label) => label.to_owned(),
        None => return ParseOutcome::EndOfBlock,
    };

    let mut values = Vec::with_capacity(layout.segment_columns.len());
    let mut frequencies = Vec::with_capacity(layout.segment_columns.len());
    let mut percentages = Vec::with_capacity(layout.segment_columns.len());
    for col in &layout.segment_columns {
        let frequency = match read_value(grid, row, *col, "frequency") {
            Ok(value) => value,
            Err(reason) => return ParseOutcome::Malformed(reason),
        };
        let percentage = match read_value(grid, row + 1, *col, "percentage") {
            Ok(value) => value,
            Err(reason) => return ParseOutcome::Malformed(reason),
        };
        values.push(match (&percentage, &frequency) {
            (Value::Number(percentage), Value::Number(frequency)) => format_cell(*percentage, *frequency),
            _ => String::new(),
        });
        frequencies.push(frequency.number().map(|frequency| frequency.trunc() as i64));
        percentages.push(percentage.number().map(|share| share * 100.0));
    }

    let codes = layout.segment_columns
        .iter()
        .map(|col| grid.display(row + 2, *col))
        .collect::<Vec<_>>();
    let sig = join_sig(codes.iter().map(|code| code.as_str()));
    ParseOutcome::Parsed(MetricRow { label, values, frequencies, percentages, sig })
}

fn read_value(grid: &Grid, row: usize, col: usize, kind: &str) -> Result<Value, String> {
    let cell = match grid.get(row, col) {
        Some(cell) => cell,
        None => return Ok(Value::Missing),
    };
    if cell.is_blank() || (cell.is_text() && cell.value.trim() == SUPPRESSED) {
        return Ok(Value::Missing);
    }
    cell.as_number()
        .map(Value::Number)
        .ok_or_else(|| format!("{} '{}' in {} is not a number", kind, cell, cell.reference()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spreadsheet::cell::Cell;
    use crate::spreadsheet::cell::CellType;

    const COLUMNS: [usize; 4] = [3, 4, 5, 6];

    fn text(grid: &mut Grid, row: usize, col: usize, value: &str) {
        grid.push(Cell::new(row, col, CellType::Text, value));
    }

    fn number(grid: &mut Grid, row: usize, col: usize, value: f64) {
        grid.push(Cell::new(row, col, CellType::Number, value.to_string()));
    }

    /// Writes one block at `start`: names on row +4, bases on row +6, metrics from row +8.
    fn block(grid: &mut Grid, start: usize, title: &str, bases: [f64; 4], metrics: &[(&str, [f64; 4], [f64; 4], [&str; 4])]) {
        text(grid, start, 1, "Table Title");
        text(grid, start + 1, 1, title);
        for (position, col) in COLUMNS.iter().enumerate() {
            text(grid, start + 4, *col, &format!("Seg{}", position + 1));
            number(grid, start + 6, *col, bases[position]);
        }
        for (index, (label, frequencies, percentages, sigs)) in metrics.iter().enumerate() {
            let row = start + 8 + index * 3;
            text(grid, row, 2, label);
            for (position, col) in COLUMNS.iter().enumerate() {
                number(grid, row, *col, frequencies[position]);
                number(grid, row + 1, *col, percentages[position]);
                text(grid, row + 2, *col, sigs[position]);
            }
        }
    }

    fn named_layout() -> ScanLayout {
        ScanLayout { segment_name_offset: Some(4), ..ScanLayout::default() }
    }

    fn awareness_grid() -> Grid {
        let mut grid = Grid::new("survey.xlsx", "Banner");
        block(&mut grid, 2, "Brand awareness", [100.0, 150.0, 200.0, 50.0], &[
            ("Aware", [42.0, 60.0, 80.0, 10.0], [0.337, 0.4, 0.4, 0.2], ["B", "", "AB", ""]),
            ("Not aware", [58.0, 90.0, 120.0, 40.0], [0.663, 0.6, 0.6, 0.8], ["", "", "", "C"]),
        ]);
        text(&mut grid, 16, 0, "end");
        grid
    }

    #[test]
    fn reads_segment_headers() {
        let tables = scan(&awareness_grid(), &named_layout());
        assert_eq!(tables.len(), 1);
        assert_eq!(
            tables[0].header(),
            vec!["Metric", "Seg1 (n=100)", "Seg2 (n=150)", "Seg3 (n=200)", "Seg4 (n=50)", "Sig"]
        );
        assert_eq!(tables[0].title, "Brand awareness");
        assert_eq!(tables[0].start_row, 2);
    }

    #[test]
    fn unnamed_segments_are_numbered() {
        let tables = scan(&awareness_grid(), &ScanLayout::default());
        assert_eq!(tables[0].segments[0].label(), "Segment 1 (n=100)");
        assert_eq!(tables[0].segments[3].label(), "Segment 4 (n=50)");
    }

    #[test]
    fn formats_metric_rows() {
        let tables = scan(&awareness_grid(), &named_layout());
        let rows = &tables[0].rows;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].label, "Aware");
        assert_eq!(rows[0].values, vec!["33.7% (42)", "40.0% (60)", "40.0% (80)", "20.0% (10)"]);
        assert_eq!(rows[0].sig, "B, AB");
        assert_eq!(rows[0].frequencies, vec![Some(42), Some(60), Some(80), Some(10)]);
        assert!((rows[1].percentages[1].unwrap() - 60.0).abs() < 1e-9);
        assert_eq!(rows[1].sig, "C");
        assert_eq!(tables[0].end, BlockEnd::EndOfBlock { row: 16 });
    }

    #[test]
    fn missing_or_suppressed_values_are_empty() {
        let mut grid = awareness_grid();
        text(&mut grid, 10, 3, "-");
        grid.push(Cell::new(11, 4, CellType::Text, "-"));
        let mut grid_without = Grid::new("survey.xlsx", "Banner");
        block(&mut grid_without, 0, "Gaps", [10.0, 10.0, 10.0, 10.0], &[
            ("Row", [1.0, 2.0, 3.0, 4.0], [0.1, 0.2, 0.3, 0.4], ["", "", "", ""]),
        ]);
        text(&mut grid_without, 11, 0, "end");

        let rows = &scan(&grid, &named_layout())[0].rows;
        assert_eq!(rows[0].values[0], "");
        assert_eq!(rows[0].values[1], "");
        assert_eq!(rows[0].values[2], "40.0% (80)");
        assert_eq!(rows[0].frequencies[..2], [None, Some(60)]);
        assert!((rows[0].percentages[0].unwrap() - 33.7).abs() < 1e-9);
        assert_eq!(rows[0].percentages[1], None);

        let mut sparse = Grid::new("survey.xlsx", "Banner");
        text(&mut sparse, 0, 1, "Table Title");
        text(&mut sparse, 8, 2, "Only label");
        number(&mut sparse, 8, 3, 5.0);
        number(&mut sparse, 9, 4, 0.5);
        text(&mut sparse, 12, 0, "end");
        let rows = &scan(&sparse, &ScanLayout::default())[0].rows;
        assert_eq!(rows[0].values, vec!["", "", "", ""]);
        assert_eq!(scan(&grid_without, &named_layout())[0].rows[0].values[3], "40.0% (4)");
    }

    #[test]
    fn no_marker_yields_no_tables() {
        let mut grid = Grid::new("survey.xlsx", "Banner");
        text(&mut grid, 0, 1, "Frequencies");
        text(&mut grid, 5, 2, "Aware");
        assert!(scan(&grid, &ScanLayout::default()).is_empty());
        assert!(scan(&Grid::new("empty.csv", "empty"), &ScanLayout::default()).is_empty());
    }

    #[test]
    fn scanning_is_idempotent() {
        let grid = awareness_grid();
        assert_eq!(scan(&grid, &named_layout()), scan(&grid, &named_layout()));
    }

    #[test]
    fn non_text_label_ends_block() {
        let mut grid = awareness_grid();
        number(&mut grid, 13, 2, 7.0);
        let tables = scan(&grid, &named_layout());
        assert_eq!(tables[0].rows.len(), 1);
        assert_eq!(tables[0].end, BlockEnd::EndOfBlock { row: 13 });
    }

    #[test]
    fn whitespace_label_continues_block() {
        let mut grid = Grid::new("survey.xlsx", "Banner");
        block(&mut grid, 0, "Awareness", [10.0, 10.0, 10.0, 10.0], &[
            ("Aware", [1.0, 2.0, 3.0, 4.0], [0.1, 0.2, 0.3, 0.4], ["A", "", "", ""]),
            (" ", [2.0, 2.0, 2.0, 2.0], [0.2, 0.2, 0.2, 0.2], ["", "", "", ""]),
            ("Unaware", [7.0, 6.0, 5.0, 4.0], [0.7, 0.6, 0.5, 0.4], ["", "", "", "B"]),
        ]);
        text(&mut grid, 18, 0, "end");
        let tables = scan(&grid, &ScanLayout::default());
        let labels = tables[0].rows.iter().map(|row| row.label.as_str()).collect::<Vec<_>>();
        assert_eq!(labels, vec!["Aware", " ", "Unaware"]);
        assert_eq!(tables[0].rows[1].values[0], "20.0% (2)");
        assert_eq!(tables[0].end, BlockEnd::EndOfBlock { row: 17 });
    }

    #[test]
    fn whitespace_values_are_missing() {
        let mut grid = awareness_grid();
        text(&mut grid, 10, 3, "  ");
        let tables = scan(&grid, &named_layout());
        assert_eq!(tables[0].rows[0].values[0], "");
        assert_eq!(tables[0].rows.len(), 2);
    }

    #[test]
    fn malformed_value_ends_block() {
        let mut grid = awareness_grid();
        text(&mut grid, 14, 5, "n/a");
        let tables = scan(&grid, &named_layout());
        assert_eq!(tables[0].rows.len(), 1);
        assert_eq!(
            tables[0].end,
            BlockEnd::Malformed { row: 13, reason: "percentage 'n/a' in F15 is not a number".to_string() }
        );
        assert_eq!(
            tables[0].end.describe(2),
            "malformed row at C14: percentage 'n/a' in F15 is not a number"
        );
    }

    #[test]
    fn last_group_must_fit_in_the_grid() {
        let mut grid = Grid::new("survey.xlsx", "Banner");
        block(&mut grid, 0, "Tail", [1.0, 1.0, 1.0, 1.0], &[
            ("Only", [1.0, 1.0, 1.0, 1.0], [1.0, 1.0, 1.0, 1.0], ["", "", "", ""]),
        ]);
        // Blank significance row is not part of the used range
        let tables = scan(&grid, &ScanLayout::default());
        assert_eq!(grid.row_count(), 10);
        assert!(tables[0].rows.is_empty());
    }

    #[test]
    fn finds_consecutive_blocks() {
        let mut grid = awareness_grid();
        block(&mut grid, 20, "Purchase intent", [10.0, 20.0, 30.0, 40.0], &[
            ("Will buy", [5.0, 10.0, 15.0, 20.0], [0.5, 0.5, 0.5, 0.5], ["", "", "", "A"]),
        ]);
        text(&mut grid, 31, 0, "end");
        let tables = scan(&grid, &named_layout());
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[1].title, "Purchase intent");
        assert_eq!(tables[1].segments[3], Segment { name: "Seg4".to_string(), base: Some(40) });
        assert_eq!(tables[1].rows[0].values[3], "50.0% (20)");
    }

    #[test]
    fn blank_or_text_base_is_unknown() {
        let mut grid = awareness_grid();
        text(&mut grid, 8, 4, "n/a");
        let segments = read_segments(&grid, &named_layout(), 2);
        assert_eq!(segments[1].label(), "Seg2 (n=NA)");
        let segments = read_segments(&grid, &named_layout(), 40);
        assert_eq!(segments[0].label(), "Segment 1 (n=NA)");
    }
}
