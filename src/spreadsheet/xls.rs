use crate::error::BannerSheetError;
use crate::helpers::reader::UnifiedReader;
use crate::spreadsheet::cell::format_number;
use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::cell::CellType;
use crate::spreadsheet::grid::Grid;
use crate::spreadsheet::Spreadsheet;
use crate::spreadsheet::SpreadsheetError;
use calamine::Data;
use calamine::Reader;
use calamine::Xls;
use calamine::XlsError;

/// Legacy Excel 97-2003 workbook, decoded by calamine's BIFF8 reader
pub(crate) struct XlsSpreadsheet {
    /// File name of the spreadsheet
    pub(crate) name: String,
    workbook: Xls<UnifiedReader>,
}

impl XlsSpreadsheet {
    pub(crate) fn open(file_name: &str) -> Result<XlsSpreadsheet, BannerSheetError> {
        let reader = UnifiedReader::new(file_name)?;
        Self::from_reader(file_name, reader)
    }

    pub(crate) fn from_reader(file_name: &str, reader: UnifiedReader) -> Result<XlsSpreadsheet, BannerSheetError> {
        let workbook = match Xls::new(reader) {
            Ok(workbook) => workbook,
            Err(XlsError::Password) => Err(SpreadsheetError::SpreadsheetPasswordProtectedError(file_name.to_owned()))?,
            Err(error) => Err(error)?,
        };
        if workbook.sheet_names().is_empty() {
            Err(SpreadsheetError::SpreadsheetEmptyError(file_name.to_owned()))?
        }
        Ok(XlsSpreadsheet { name: file_name.to_owned(), workbook })
    }
}

impl Spreadsheet for XlsSpreadsheet {
    fn name(&self) -> String {
        self.name.to_owned()
    }

    fn sheet_names(&self) -> Vec<String> {
        self.workbook.sheet_names()
    }

    fn read_grid(&mut self, sheet_name: &str) -> Result<Grid, BannerSheetError> {
        if !self.workbook.sheet_names().iter().any(|name| name == sheet_name) {
            Err(SpreadsheetError::SheetNotFoundError(sheet_name.to_owned()))?
        }
        let range = self.workbook.worksheet_range(sheet_name)?;
        let mut grid = Grid::new(&self.name, sheet_name);
        // used_cells positions are relative to the range start
        let (top, left) = range.start().unwrap_or((0, 0));
        for (row, col, data) in range.used_cells() {
            let row = row + top as usize;
            let col = col + left as usize;
            grid.push(to_cell(row, col, data));
        }
        Ok(grid)
    }
}

/// Converts a calamine value to a grid cell.
pub(crate) fn to_cell(row: usize, col: usize, data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::new(row, col, CellType::Empty, ""),
        Data::Int(value) => Cell::new(row, col, CellType::Number, value.to_string()),
        Data::Float(value) => Cell::new(row, col, CellType::Number, format_number(*value)),
        Data::String(value) => Cell::new(row, col, CellType::Text, value.as_str()),
        Data::Bool(value) => Cell::new(row, col, CellType::Boolean, if *value { "1" } else { "0" }),
        Data::DateTime(value) => Cell::new(row, col, CellType::Number, format_number(value.as_f64())),
        Data::DateTimeIso(value) | Data::DurationIso(value) => Cell::new(row, col, CellType::Text, value.as_str()),
        Data::Error(error) => Cell::new(row, col, CellType::Error, error.to_string()),
    }
}
