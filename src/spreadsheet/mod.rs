//! # Spreadsheet Loading Module
//!
//! Reads workbook files into [`Grid`]s: untyped 2-D arrays of cells that the
//! banner scanner and the cross-tab loader work on. Supported inputs are Excel
//! 2007+ workbooks (`.xlsx`, `.xlsm`), legacy Excel workbooks (`.xls`) and
//! delimited text (`.csv`, `.tsv`).
pub(crate) mod cell;
pub(crate) mod csv;
pub(crate) mod grid;
pub(crate) mod reference;
pub(crate) mod xls;
pub(crate) mod xlsx;

use crate::error::BannerSheetError;
use crate::spreadsheet::csv::CsvSpreadsheet;
use crate::spreadsheet::grid::Grid;
use crate::spreadsheet::xls::XlsSpreadsheet;
use crate::spreadsheet::xlsx::XlsxSpreadsheet;
use glob::Pattern;
use std::path::Path;
use thiserror::Error;

/// Sheet read when the caller does not name one, as WinCross exports call it.
pub(crate) const DEFAULT_SHEET_NAME: &str = "Banner";

#[derive(Error, Debug)]
pub(crate) enum SpreadsheetError {
    #[error("Missing part '{0}' in workbook")]
    FileError(String),

    #[error("Unsupported spreadsheet format: '{0}'")]
    UnsupportedFormatError(String),

    #[error("Spreadsheet '{0}' is password protected")]
    SpreadsheetPasswordProtectedError(String),

    #[error("Spreadsheet '{0}' has no sheets")]
    SpreadsheetEmptyError(String),

    #[error("Sheet '{0}' not found")]
    SheetNotFoundError(String),

    #[error("Sheet '{0}' was already read from a stream that cannot be rewound")]
    StreamConsumedError(String),
}

/// A workbook opened for reading.
pub(crate) trait Spreadsheet {
    /// Returns the file name of this spreadsheet
    fn name(&self) -> String;

    /// Returns sheet names in workbook order
    fn sheet_names(&self) -> Vec<String>;

    /// Reads every cell of the named sheet
    fn read_grid(&mut self, sheet_name: &str) -> Result<Grid, BannerSheetError>;
}

/// Opens a spreadsheet, choosing the reader by file extension.
pub(crate) fn open_spreadsheet(file_name: &str) -> Result<Box<dyn Spreadsheet>, BannerSheetError> {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|extension| extension.to_str())
        .map(|extension| extension.to_ascii_lowercase());
    let spreadsheet: Box<dyn Spreadsheet> = match extension.as_deref() {
        Some("xlsx") | Some("xlsm") | Some("xltx") | Some("xltm") => Box::new(XlsxSpreadsheet::open(file_name)?),
        Some("xls") | Some("xla") => Box::new(XlsSpreadsheet::open(file_name)?),
        Some("csv") | Some("tsv") | Some("txt") => Box::new(CsvSpreadsheet::open(file_name)?),
        _ => Err(SpreadsheetError::UnsupportedFormatError(file_name.to_owned()))?,
    };
    log::debug!("opened '{}' with sheets {:?}", spreadsheet.name(), spreadsheet.sheet_names());
    Ok(spreadsheet)
}

/// Chooses the sheet to read.
///
/// With a pattern, the first sheet whose name matches it. Without one, the
/// sheet named "Banner" (any case) if present, otherwise the first sheet.
pub(crate) fn select_sheet(sheet_names: &[String], pattern: Option<&Pattern>) -> Result<String, SpreadsheetError> {
    match pattern {
        Some(pattern) => sheet_names
            .iter()
            .find(|name| pattern.matches(name))
            .cloned()
            .ok_or_else(|| SpreadsheetError::SheetNotFoundError(pattern.to_string())),
        None => {
            if let Some(name) = sheet_names.iter().find(|name| name.eq_ignore_ascii_case(DEFAULT_SHEET_NAME)) {
                Ok(name.to_owned())
            } else {
                let first = sheet_names
                    .first()
                    .cloned()
                    .ok_or_else(|| SpreadsheetError::SheetNotFoundError(DEFAULT_SHEET_NAME.to_owned()))?;
                log::warn!("no '{}' sheet, reading '{}' instead", DEFAULT_SHEET_NAME, first);
                Ok(first)
            }
        }
    }
}

/// Opens the file and reads the selected sheet into a grid.
pub(crate) fn load_grid(file_name: &str, sheet: Option<&Pattern>) -> Result<Grid, BannerSheetError> {
    let mut spreadsheet = open_spreadsheet(file_name)?;
    let sheet_name = select_sheet(&spreadsheet.sheet_names(), sheet)?;
    let grid = spreadsheet.read_grid(&sheet_name)?;
    if grid.is_empty() {
        log::warn!("sheet '{}' of '{}' is empty", grid.name, grid.file_name);
    }
    log::debug!(
        "loaded sheet '{}' of '{}': {} rows x {} columns",
        grid.name,
        grid.file_name,
        grid.row_count(),
        grid.col_count()
    );
    Ok(grid)
}
