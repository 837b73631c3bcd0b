//! # Extension Core Module
//!
//! Parameter handling and shared plumbing of the SQL table functions:
//! positional and named parameter readers, the layered [`ScanLayout`] built
//! from a TOML file plus per-call overrides, and the batch emitter every
//! function streams its rows through.
use crate::banner::layout::ScanLayout;
use crate::banner::scanner::scan;
use crate::banner::ExtractedTable;
use crate::error::BannerSheetError;
use crate::extension::column::Column;
use crate::extension::writer::write_field;
use crate::extension::writer::Field;
use crate::spreadsheet::grid::Grid;
use crate::spreadsheet::load_grid;
use crate::spreadsheet::reference::col_to_index;
use crate::spreadsheet::reference::index_to_col;
use crate::spreadsheet::reference::MAX_COLUMN_INDEX;
use crate::spreadsheet::reference::MAX_ROWS;
use duckdb::core::DataChunkHandle;
use duckdb::core::LogicalTypeHandle;
use duckdb::core::LogicalTypeId;
use duckdb::vtab::BindInfo;
use glob::Pattern;
use regex::Regex;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::LazyLock;
use thiserror::Error;

pub(crate) mod banner_tables;
pub(crate) mod column;
pub(crate) mod read_banner;
pub(crate) mod read_banners;
pub(crate) mod read_crosstab;
pub(crate) mod writer;

/// Rows emitted per `func` call.
const BATCH_SIZE: usize = 2048;

/// Column list such as "D:G", "D,E,H" or "D:F,H".
static COLUMNS_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z]+(:[A-Za-z]+)?(,[A-Za-z]+(:[A-Za-z]+)?)*$").expect("Hardcode regex pattern")
});

#[derive(Error, Debug)]
pub(crate) enum ExtensionError {
    #[error("Invalid parameter '{name}': {message}")]
    InvalidParameterError { name: String, message: String },

    #[error("Table {0} not found, the sheet has {1} banner tables")]
    TableIndexError(i64, usize),
}

impl ExtensionError {
    fn invalid(name: &str, message: String) -> ExtensionError {
        ExtensionError::InvalidParameterError { name: name.to_owned(), message }
    }
}

/// Positional parameter of a table function.
pub(crate) trait Param<T> {
    fn kind() -> LogicalTypeHandle;

    fn read(bind: &BindInfo, index: u64) -> Result<T, BannerSheetError>;
}

/// Named parameter of a table function.
pub(crate) trait NamedParam<T> {
    /// Returns the parameter name as used in SQL
    fn name() -> &'static str;

    /// Returns the DuckDB logical type for this parameter
    fn kind() -> LogicalTypeHandle;

    /// Returns the complete parameter definition (name and type)
    fn definition() -> (String, LogicalTypeHandle) {
        (Self::name().to_string(), Self::kind())
    }

    /// Extracts the parameter value, `None` when it was not given
    fn read(bind: &BindInfo) -> Result<Option<T>, BannerSheetError>;
}

/// Spreadsheet path or URL
pub(crate) struct FileParam;

impl Param<String> for FileParam {
    fn kind() -> LogicalTypeHandle {
        LogicalTypeHandle::from(LogicalTypeId::Varchar)
    }

    fn read(bind: &BindInfo, index: u64) -> Result<String, BannerSheetError> {
        Ok(bind.get_parameter(index).to_string())
    }
}

/// Sheet name or glob pattern
pub(crate) struct SheetParam;

impl NamedParam<Pattern> for SheetParam {
    fn name() -> &'static str {
        "sheet"
    }

    fn kind() -> LogicalTypeHandle {
        LogicalTypeHandle::from(LogicalTypeId::Varchar)
    }

    fn read(bind: &BindInfo) -> Result<Option<Pattern>, BannerSheetError> {
        match read_varchar(bind, Self::name()) {
            Some(sheet) => Ok(Some(Pattern::new(&sheet)?)),
            None => Ok(None),
        }
    }
}

/// Path of a TOML layout file
pub(crate) struct LayoutParam;

impl NamedParam<String> for LayoutParam {
    fn name() -> &'static str {
        "layout"
    }

    fn kind() -> LogicalTypeHandle {
        LogicalTypeHandle::from(LogicalTypeId::Varchar)
    }

    fn read(bind: &BindInfo) -> Result<Option<String>, BannerSheetError> {
        Ok(read_varchar(bind, Self::name()))
    }
}

/// Block marker text
pub(crate) struct MarkerParam;

impl NamedParam<String> for MarkerParam {
    fn name() -> &'static str {
        "marker"
    }

    fn kind() -> LogicalTypeHandle {
        LogicalTypeHandle::from(LogicalTypeId::Varchar)
    }

    fn read(bind: &BindInfo) -> Result<Option<String>, BannerSheetError> {
        Ok(read_varchar(bind, Self::name()))
    }
}

/// Segment columns as letters, e.g. 'D:G'
pub(crate) struct SegmentColumnsParam;

impl NamedParam<Vec<usize>> for SegmentColumnsParam {
    fn name() -> &'static str {
        "segment_columns"
    }

    fn kind() -> LogicalTypeHandle {
        LogicalTypeHandle::from(LogicalTypeId::Varchar)
    }

    fn read(bind: &BindInfo) -> Result<Option<Vec<usize>>, BannerSheetError> {
        read_varchar(bind, Self::name())
            .map(|columns| parse_columns(Self::name(), &columns))
            .transpose()
    }
}

/// Metric label column as letters, e.g. 'C'
pub(crate) struct LabelColumnParam;

impl NamedParam<usize> for LabelColumnParam {
    fn name() -> &'static str {
        "label_column"
    }

    fn kind() -> LogicalTypeHandle {
        LogicalTypeHandle::from(LogicalTypeId::Varchar)
    }

    fn read(bind: &BindInfo) -> Result<Option<usize>, BannerSheetError> {
        read_varchar(bind, Self::name())
            .map(|column| parse_column(Self::name(), &column))
            .transpose()
    }
}

/// Rows between the marker and the base counts
pub(crate) struct BaseCountOffsetParam;

impl NamedParam<usize> for BaseCountOffsetParam {
    fn name() -> &'static str {
        "base_count_offset"
    }

    fn kind() -> LogicalTypeHandle {
        LogicalTypeHandle::from(LogicalTypeId::Bigint)
    }

    fn read(bind: &BindInfo) -> Result<Option<usize>, BannerSheetError> {
        read_offset(bind, Self::name())
    }
}

/// Rows between the marker and the first metric row
pub(crate) struct MetricStartOffsetParam;

impl NamedParam<usize> for MetricStartOffsetParam {
    fn name() -> &'static str {
        "metric_start_offset"
    }

    fn kind() -> LogicalTypeHandle {
        LogicalTypeHandle::from(LogicalTypeId::Bigint)
    }

    fn read(bind: &BindInfo) -> Result<Option<usize>, BannerSheetError> {
        read_offset(bind, Self::name())
    }
}

/// Rows between the marker and the segment names
pub(crate) struct SegmentNameOffsetParam;

impl NamedParam<usize> for SegmentNameOffsetParam {
    fn name() -> &'static str {
        "segment_name_offset"
    }

    fn kind() -> LogicalTypeHandle {
        LogicalTypeHandle::from(LogicalTypeId::Bigint)
    }

    fn read(bind: &BindInfo) -> Result<Option<usize>, BannerSheetError> {
        read_offset(bind, Self::name())
    }
}

/// 1-based table number for `read_banner`
pub(crate) struct TableParam;

impl NamedParam<i64> for TableParam {
    fn name() -> &'static str {
        "table"
    }

    fn kind() -> LogicalTypeHandle {
        LogicalTypeHandle::from(LogicalTypeId::Bigint)
    }

    fn read(bind: &BindInfo) -> Result<Option<i64>, BannerSheetError> {
        Ok(bind.get_named_parameter(Self::name()).map(|value| value.to_int64()))
    }
}

/// Number of stacked header rows for `read_crosstab`
pub(crate) struct HeaderRowsParam;

impl NamedParam<usize> for HeaderRowsParam {
    fn name() -> &'static str {
        "header_rows"
    }

    fn kind() -> LogicalTypeHandle {
        LogicalTypeHandle::from(LogicalTypeId::Bigint)
    }

    fn read(bind: &BindInfo) -> Result<Option<usize>, BannerSheetError> {
        read_offset(bind, Self::name())?
            .map(|rows| parse_header_rows(Self::name(), rows))
            .transpose()
    }
}

fn read_varchar(bind: &BindInfo, name: &str) -> Option<String> {
    bind.get_named_parameter(name).map(|value| value.to_string())
}

fn read_offset(bind: &BindInfo, name: &str) -> Result<Option<usize>, BannerSheetError> {
    bind.get_named_parameter(name)
        .map(|value| parse_offset(name, value.to_int64()))
        .transpose()
}

/// Checks that a row count or offset is not negative.
pub(crate) fn parse_offset(name: &str, value: i64) -> Result<usize, BannerSheetError> {
    usize::try_from(value)
        .map_err(|_| ExtensionError::invalid(name, format!("{value} is negative")).into())
}

/// Checks that a header row count fits in a worksheet.
pub(crate) fn parse_header_rows(name: &str, rows: usize) -> Result<usize, BannerSheetError> {
    if rows > MAX_ROWS {
        Err(ExtensionError::invalid(name, format!("{rows} exceeds the {MAX_ROWS} rows of a sheet")))?;
    }
    Ok(rows)
}

/// Parses a single column letter sequence to a 0-based index, at most XFD.
pub(crate) fn parse_column(name: &str, value: &str) -> Result<usize, BannerSheetError> {
    let column = col_to_index(value.trim())
        .ok_or_else(|| ExtensionError::invalid(name, format!("'{value}' is not a column")))?;
    if column > MAX_COLUMN_INDEX {
        Err(ExtensionError::invalid(name, format!("'{value}' is beyond the last column {}", index_to_col(MAX_COLUMN_INDEX))))?;
    }
    Ok(column)
}

/// Parses a column list such as "D:G" or "D,F:G" to 0-based indexes.
pub(crate) fn parse_columns(name: &str, value: &str) -> Result<Vec<usize>, BannerSheetError> {
    let compact = value.replace(' ', "");
    if !COLUMNS_PATTERN.is_match(&compact) {
        Err(ExtensionError::invalid(name, format!("'{value}' is not a column list")))?;
    }
    let mut columns = Vec::new();
    for part in compact.split(',') {
        let (first, last) = part.split_once(':').unwrap_or((part, part));
        let first = parse_column(name, first)?;
        let last = parse_column(name, last)?;
        if first > last {
            Err(ExtensionError::invalid(name, format!("'{part}' is a reversed range")))?;
        }
        columns.extend(first..=last);
    }
    Ok(columns)
}

/// Per-call layout overrides given as named parameters.
#[derive(Debug, Default)]
pub(crate) struct LayoutOverrides {
    pub(crate) file: Option<String>,
    pub(crate) marker: Option<String>,
    pub(crate) segment_columns: Option<Vec<usize>>,
    pub(crate) label_column: Option<usize>,
    pub(crate) base_count_offset: Option<usize>,
    pub(crate) metric_start_offset: Option<usize>,
    pub(crate) segment_name_offset: Option<usize>,
}

impl TryFrom<&BindInfo> for LayoutOverrides {
    type Error = BannerSheetError;

    fn try_from(bind: &BindInfo) -> Result<Self, Self::Error> {
        Ok(LayoutOverrides {
            file: LayoutParam::read(bind)?,
            marker: MarkerParam::read(bind)?,
            segment_columns: SegmentColumnsParam::read(bind)?,
            label_column: LabelColumnParam::read(bind)?,
            base_count_offset: BaseCountOffsetParam::read(bind)?,
            metric_start_offset: MetricStartOffsetParam::read(bind)?,
            segment_name_offset: SegmentNameOffsetParam::read(bind)?,
        })
    }
}

impl LayoutOverrides {
    /// Named parameter definitions shared by the banner functions.
    pub(crate) fn definitions() -> Vec<(String, LogicalTypeHandle)> {
        vec![
            SheetParam::definition(),
            LayoutParam::definition(),
            MarkerParam::definition(),
            SegmentColumnsParam::definition(),
            LabelColumnParam::definition(),
            BaseCountOffsetParam::definition(),
            MetricStartOffsetParam::definition(),
            SegmentNameOffsetParam::definition(),
        ]
    }

    /// Defaults, then the TOML file, then the explicit parameters.
    pub(crate) fn build(&self) -> Result<ScanLayout, BannerSheetError> {
        let mut layout = match &self.file {
            Some(file) => ScanLayout::load(file)?,
            None => ScanLayout::default(),
        };
        if let Some(marker) = &self.marker {
            layout.marker = marker.to_owned();
        }
        if let Some(segment_columns) = &self.segment_columns {
            layout.segment_columns = segment_columns.to_owned();
        }
        if let Some(label_column) = self.label_column {
            layout.label_column = label_column;
        }
        if let Some(base_count_offset) = self.base_count_offset {
            layout.base_count_offset = base_count_offset;
        }
        if let Some(metric_start_offset) = self.metric_start_offset {
            layout.metric_start_offset = metric_start_offset;
        }
        if let Some(segment_name_offset) = self.segment_name_offset {
            layout.segment_name_offset = Some(segment_name_offset);
        }
        layout.validate()?;
        Ok(layout)
    }
}

/// Parameters shared by the banner table functions.
pub(crate) struct BannerParameters {
    pub(crate) file_name: String,
    pub(crate) sheet: Option<Pattern>,
    pub(crate) layout: LayoutOverrides,
}

impl TryFrom<&BindInfo> for BannerParameters {
    type Error = BannerSheetError;

    fn try_from(bind: &BindInfo) -> Result<Self, Self::Error> {
        Ok(BannerParameters {
            file_name: FileParam::read(bind, 0)?,
            sheet: SheetParam::read(bind)?,
            layout: LayoutOverrides::try_from(bind)?,
        })
    }
}

impl BannerParameters {
    /// Loads the sheet and scans it for banner tables.
    pub(crate) fn extract(&self) -> Result<(ScanLayout, Vec<ExtractedTable>), BannerSheetError> {
        let layout = self.layout.build()?;
        let grid = load_grid(&self.file_name, self.sheet.as_ref())?;
        Ok(extract_tables(&grid, layout))
    }
}

pub(crate) fn extract_tables(grid: &Grid, layout: ScanLayout) -> (ScanLayout, Vec<ExtractedTable>) {
    let tables = scan(grid, &layout);
    log::debug!("found {} banner tables in sheet '{}' of '{}'", tables.len(), grid.name, grid.file_name);
    let malformed = tables.iter().filter(|table| table.end.is_malformed()).count();
    if malformed > 0 {
        log::warn!("{} of {} banner tables in '{}' end at a malformed row", malformed, tables.len(), grid.file_name);
    }
    (layout, tables)
}

/// Materialized result of a table function, produced during bind.
#[repr(C)]
pub(crate) struct RecordBindData {
    pub(crate) columns: Vec<Column>,
    pub(crate) records: Vec<Vec<Field>>,
}

impl RecordBindData {
    /// Registers the output columns with DuckDB.
    pub(crate) fn add_result_columns(&self, bind: &BindInfo) {
        for column in &self.columns {
            bind.add_result_column(column.name.as_str(), LogicalTypeHandle::from(column.kind.to_logical_type_id()));
        }
    }
}

#[repr(C)]
pub(crate) struct RecordInitData {
    /// Index of the first record of the next batch
    pub(crate) index: AtomicUsize,
}

impl Default for RecordInitData {
    fn default() -> Self {
        RecordInitData { index: AtomicUsize::new(0) }
    }
}

/// Writes the next batch of records, or an empty chunk when all were sent.
pub(crate) fn emit_batch(
    bind: &RecordBindData,
    init: &RecordInitData,
    output: &mut DataChunkHandle,
) -> Result<(), BannerSheetError> {
    let lower = init.index.fetch_add(BATCH_SIZE, Ordering::Relaxed);
    let upper = bind.records.len().min(lower + BATCH_SIZE);
    if lower < upper {
        for col in 0..bind.columns.len() {
            let mut vector = output.flat_vector(col);
            for (row, record) in bind.records[lower..upper].iter().enumerate() {
                write_field(&mut vector, row, record.get(col).unwrap_or(&Field::Null));
            }
        }
        output.set_len(upper - lower);
    } else {
        output.set_len(0);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_column_lists() {
        assert_eq!(parse_columns("segment_columns", "D:G").unwrap(), vec![3, 4, 5, 6]);
        assert_eq!(parse_columns("segment_columns", "d, f:g").unwrap(), vec![3, 5, 6]);
        assert_eq!(parse_columns("segment_columns", "AA").unwrap(), vec![26]);
        assert!(parse_columns("segment_columns", "G:D").is_err());
        assert!(parse_columns("segment_columns", "D1:G1").is_err());
        assert!(parse_columns("segment_columns", "").is_err());
    }

    #[test]
    fn columns_stop_at_the_last_sheet_column() {
        assert_eq!(parse_column("label_column", "XFD").unwrap(), 16_383);
        assert_eq!(parse_columns("segment_columns", "XFC:XFD").unwrap(), vec![16_382, 16_383]);
        let error = parse_column("label_column", "XFE").unwrap_err();
        assert_eq!(error.to_string(), "Invalid parameter 'label_column': 'XFE' is beyond the last column XFD");
        assert!(matches!(
            parse_columns("segment_columns", "A:ZZZZZZZZZZZZZ").unwrap_err(),
            BannerSheetError::ExtensionError(ExtensionError::InvalidParameterError { .. })
        ));
        assert!(parse_columns("segment_columns", "ZZZZZZZZZZZZZZZZZZZZ").is_err());
    }

    #[test]
    fn header_rows_fit_in_a_sheet() {
        assert_eq!(parse_header_rows("header_rows", 3).unwrap(), 3);
        assert_eq!(parse_header_rows("header_rows", 1_048_576).unwrap(), 1_048_576);
        let error = parse_header_rows("header_rows", 1_048_577).unwrap_err();
        assert_eq!(error.to_string(), "Invalid parameter 'header_rows': 1048577 exceeds the 1048576 rows of a sheet");
    }

    #[test]
    fn parses_single_columns_and_offsets() {
        assert_eq!(parse_column("label_column", "C").unwrap(), 2);
        assert!(parse_column("label_column", "3").is_err());
        assert_eq!(parse_offset("base_count_offset", 6).unwrap(), 6);
        let error = parse_offset("base_count_offset", -1).unwrap_err();
        assert_eq!(error.to_string(), "Invalid parameter 'base_count_offset': -1 is negative");
    }

    #[test]
    fn parameters_override_layout_file() {
        let path = std::env::temp_dir().join(format!("banner_sheet_layout_{}.toml", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "marker = \"Banner\"\nbase_count_offset = 5\nsegment_columns = [3, 4]").unwrap();

        let overrides = LayoutOverrides {
            file: Some(path.to_string_lossy().to_string()),
            base_count_offset: Some(7),
            segment_name_offset: Some(4),
            ..LayoutOverrides::default()
        };
        let layout = overrides.build().unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(layout.marker, "Banner");
        assert_eq!(layout.segment_columns, vec![3, 4]);
        assert_eq!(layout.base_count_offset, 7);
        assert_eq!(layout.segment_name_offset, Some(4));
        assert_eq!(layout.metric_start_offset, 8);
    }

    #[test]
    fn overrides_are_validated() {
        let overrides = LayoutOverrides { marker: Some(String::new()), ..LayoutOverrides::default() };
        assert!(matches!(overrides.build(), Err(BannerSheetError::LayoutError(_))));
        assert_eq!(LayoutOverrides::default().build().unwrap(), ScanLayout::default());
    }
}
