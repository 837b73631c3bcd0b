//! # Banner Table Module
//!
//! A WinCross banner export stacks many cross-tab tables in one sheet. Each
//! block starts at a row containing a marker string, followed at fixed offsets
//! by the title, the base count of every banner segment, and metric rows that
//! come in groups of frequency, percentage and significance.
//!
//! [`scanner::scan`] turns a [`Grid`](crate::spreadsheet::grid::Grid) into a
//! list of [`ExtractedTable`]s using a [`layout::ScanLayout`].
pub(crate) mod format;
pub(crate) mod layout;
pub(crate) mod scanner;

use crate::banner::format::segment_label;
use crate::spreadsheet::reference::index_to_reference;

/// Name of the first output column of a wide table.
pub(crate) const METRIC_COLUMN: &str = "Metric";
/// Name of the last output column of a wide table.
pub(crate) const SIG_COLUMN: &str = "Sig";

/// One banner column.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Segment {
    pub(crate) name: String,
    /// Respondent base; `None` when the base cell is blank or not numeric
    pub(crate) base: Option<i64>,
}

impl Segment {
    /// Header text, e.g. "Male (n=150)" or "Segment 2 (n=NA)".
    pub(crate) fn label(&self) -> String {
        segment_label(&self.name, self.base)
    }
}

/// One answer row of a table, with one formatted value per segment.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct MetricRow {
    pub(crate) label: String,
    pub(crate) values: Vec<String>,
    /// Integer part of each segment's frequency; `None` when missing or "-"
    pub(crate) frequencies: Vec<Option<i64>>,
    /// Each segment's share in percent (0.337 is 33.7); `None` when missing or "-"
    pub(crate) percentages: Vec<Option<f64>>,
    /// Significance letters of all segments joined with ", "
    pub(crate) sig: String,
}

/// Result of reading one candidate metric row.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum ParseOutcome {
    Parsed(MetricRow),
    /// The label cell is not text or the group runs past the sheet
    EndOfBlock,
    /// A value cell holds something that is neither blank, "-" nor a number
    Malformed(String),
}

/// How the metric rows of a block ended.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum BlockEnd {
    EndOfBlock { row: usize },
    Malformed { row: usize, reason: String },
}

impl BlockEnd {
    pub(crate) fn is_malformed(&self) -> bool {
        matches!(self, BlockEnd::Malformed { .. })
    }

    /// Human-readable summary, with the row given as a cell reference in the label column.
    pub(crate) fn describe(&self, label_column: usize) -> String {
        match self {
            BlockEnd::EndOfBlock { .. } => "end of block".to_string(),
            BlockEnd::Malformed { row, reason } => {
                format!("malformed row at {}: {}", index_to_reference(*row, label_column), reason)
            }
        }
    }
}

/// One parsed banner table.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct ExtractedTable {
    pub(crate) title: String,
    /// 0-based row of the marker cell
    pub(crate) start_row: usize,
    pub(crate) segments: Vec<Segment>,
    pub(crate) rows: Vec<MetricRow>,
    pub(crate) end: BlockEnd,
}

impl ExtractedTable {
    /// Column names of the wide form: `Metric`, one label per segment, `Sig`.
    pub(crate) fn header(&self) -> Vec<String> {
        let mut header = Vec::with_capacity(self.segments.len() + 2);
        header.push(METRIC_COLUMN.to_string());
        header.extend(self.segments.iter().map(|segment| segment.label()));
        header.push(SIG_COLUMN.to_string());
        header
    }

    /// Rows of the wide form, aligned with [`ExtractedTable::header`].
    pub(crate) fn records(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| {
                let mut record = Vec::with_capacity(row.values.len() + 2);
                record.push(row.label.to_owned());
                record.extend(row.values.iter().cloned());
                record.push(row.sig.to_owned());
                record
            })
            .collect()
    }
}
