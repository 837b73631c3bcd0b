use crate::crosstab::CrossTab;
use crate::error::BannerSheetError;
use crate::error::ResultMessage;
use crate::extension::column::varchar_columns;
use crate::extension::emit_batch;
use crate::extension::writer::Field;
use crate::extension::FileParam;
use crate::extension::HeaderRowsParam;
use crate::extension::NamedParam;
use crate::extension::Param;
use crate::extension::RecordBindData;
use crate::extension::RecordInitData;
use crate::extension::SheetParam;
use crate::spreadsheet::load_grid;
use duckdb::core::DataChunkHandle;
use duckdb::core::LogicalTypeHandle;
use duckdb::vtab::BindInfo;
use duckdb::vtab::InitInfo;
use duckdb::vtab::TableFunctionInfo;
use duckdb::vtab::VTab;
use glob::Pattern;
use std::error::Error;

/// Parameters for the read_crosstab table function
struct ReadCrossTabParameters {
    file_name: String,
    /// Sheet name or glob pattern (default: "Banner", else the first sheet)
    sheet: Option<Pattern>,
    /// Number of stacked header rows (default: 1)
    header_rows: Option<usize>,
}

impl TryFrom<&BindInfo> for ReadCrossTabParameters {
    type Error = BannerSheetError;

    fn try_from(bind: &BindInfo) -> Result<Self, Self::Error> {
        Ok(ReadCrossTabParameters {
            file_name: FileParam::read(bind, 0)?,
            sheet: SheetParam::read(bind)?,
            header_rows: HeaderRowsParam::read(bind)?,
        })
    }
}

impl TryFrom<&ReadCrossTabParameters> for RecordBindData {
    type Error = BannerSheetError;

    fn try_from(parameters: &ReadCrossTabParameters) -> Result<Self, Self::Error> {
        let grid = load_grid(&parameters.file_name, parameters.sheet.as_ref())?;
        let crosstab = CrossTab::from_grid(&grid, parameters.header_rows.unwrap_or(1));
        Ok(crosstab_records(&crosstab))
    }
}

/// All columns as VARCHAR, blank cells as NULL.
pub(crate) fn crosstab_records(crosstab: &CrossTab) -> RecordBindData {
    let columns = varchar_columns(&crosstab.columns);
    let records = crosstab.rows
        .iter()
        .map(|row| row.iter().map(|value| Field::text_or_null(value)).collect())
        .collect();
    RecordBindData { columns, records }
}

/// `read_crosstab(file, sheet := ..., header_rows := 1)`: a plain cross-tab sheet
pub(crate) struct ReadCrossTabTableFunction;

impl VTab for ReadCrossTabTableFunction {
    type InitData = RecordInitData;
    type BindData = RecordBindData;

    fn bind(bind: &BindInfo) -> Result<Self::BindData, Box<dyn Error>> {
        let parameters = ReadCrossTabParameters::try_from(bind)?;
        let data = RecordBindData::try_from(&parameters).with_prefix(parameters.file_name.as_str())?;
        data.add_result_columns(bind);
        Ok(data)
    }

    fn init(_: &InitInfo) -> Result<Self::InitData, Box<dyn Error>> {
        Ok(RecordInitData::default())
    }

    fn func(
        func: &TableFunctionInfo<Self>,
        output: &mut DataChunkHandle,
    ) -> Result<(), Box<dyn Error>> {
        emit_batch(func.get_bind_data(), func.get_init_data(), output)?;
        Ok(())
    }

    fn parameters() -> Option<Vec<LogicalTypeHandle>> {
        Some(vec![
            FileParam::kind(),
        ])
    }

    fn named_parameters() -> Option<Vec<(String, LogicalTypeHandle)>> {
        Some(vec![
            SheetParam::definition(),
            HeaderRowsParam::definition(),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_cells_are_null() {
        let crosstab = CrossTab {
            columns: vec!["Question".to_string(), "Total".to_string()],
            rows: vec![vec!["Aware".to_string(), String::new()]],
        };
        let data = crosstab_records(&crosstab);
        assert_eq!(data.columns.len(), 2);
        assert_eq!(data.records, vec![vec![Field::from("Aware"), Field::Null]]);
    }
}
