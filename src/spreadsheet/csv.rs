use crate::error::BannerSheetError;
use crate::helpers::reader::UnifiedReader;
use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::cell::CellType;
use crate::spreadsheet::grid::Grid;
use crate::spreadsheet::Spreadsheet;
use crate::spreadsheet::SpreadsheetError;
use csv::ReaderBuilder;
use std::io::Read;
use std::path::Path;

/// Delimited text export; the whole file is a single sheet named after the file stem
pub(crate) struct CsvSpreadsheet {
    pub(crate) name: String,
    sheet_name: String,
    delimiter: u8,
    reader: Option<UnifiedReader>,
}

impl CsvSpreadsheet {
    pub(crate) fn open(file_name: &str) -> Result<CsvSpreadsheet, BannerSheetError> {
        let reader = UnifiedReader::new(file_name)?;
        Ok(Self::from_reader(file_name, reader))
    }

    pub(crate) fn from_reader(file_name: &str, reader: UnifiedReader) -> CsvSpreadsheet {
        let path = Path::new(file_name);
        let sheet_name = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or(file_name)
            .to_owned();
        let is_tab_separated = path
            .extension()
            .and_then(|extension| extension.to_str())
            .map(|extension| extension.eq_ignore_ascii_case("tsv"))
            .unwrap_or(false);
        CsvSpreadsheet {
            name: file_name.to_owned(),
            sheet_name,
            delimiter: if is_tab_separated { b'\t' } else { b',' },
            reader: Some(reader),
        }
    }
}

impl Spreadsheet for CsvSpreadsheet {
    fn name(&self) -> String {
        self.name.to_owned()
    }

    fn sheet_names(&self) -> Vec<String> {
        vec![self.sheet_name.to_owned()]
    }

    /// The underlying stream is consumed, so the sheet can be read once.
    fn read_grid(&mut self, sheet_name: &str) -> Result<Grid, BannerSheetError> {
        if sheet_name != self.sheet_name {
            Err(SpreadsheetError::SheetNotFoundError(sheet_name.to_owned()))?
        }
        let reader = self.reader
            .take()
            .ok_or_else(|| SpreadsheetError::StreamConsumedError(self.sheet_name.to_owned()))?;
        let mut grid = Grid::new(&self.name, &self.sheet_name);
        read_records(reader, self.delimiter, &mut grid)?;
        Ok(grid)
    }
}

/// Reads every record into the grid, typing numeric fields as numbers.
pub(crate) fn read_records<R: Read>(reader: R, delimiter: u8, grid: &mut Grid) -> Result<(), BannerSheetError> {
    let mut records = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(reader);
    for (row, result) in records.records().enumerate() {
        let record = result?;
        for (col, field) in record.iter().enumerate() {
            let kind = if field.is_empty() {
                CellType::Empty
            } else if field.trim().parse::<f64>().map(|value| value.is_finite()).unwrap_or(false) {
                CellType::Number
            } else {
                CellType::Text
            };
            grid.push(Cell::new(row, col, kind, field));
        }
    }
    Ok(())
}
