use crate::banner::ExtractedTable;
use crate::crosstab::dedupe_names;
use crate::error::BannerSheetError;
use crate::error::ResultMessage;
use crate::extension::column::varchar_columns;
use crate::extension::emit_batch;
use crate::extension::writer::Field;
use crate::extension::BannerParameters;
use crate::extension::ExtensionError;
use crate::extension::FileParam;
use crate::extension::LayoutOverrides;
use crate::extension::NamedParam;
use crate::extension::Param;
use crate::extension::RecordBindData;
use crate::extension::RecordInitData;
use crate::extension::TableParam;
use duckdb::core::DataChunkHandle;
use duckdb::core::LogicalTypeHandle;
use duckdb::vtab::BindInfo;
use duckdb::vtab::InitInfo;
use duckdb::vtab::TableFunctionInfo;
use duckdb::vtab::VTab;
use std::error::Error;

/// Parameters for the read_banner table function
struct ReadBannerParameters {
    banner: BannerParameters,
    /// 1-based table number (default: 1)
    table: Option<i64>,
}

impl TryFrom<&BindInfo> for ReadBannerParameters {
    type Error = BannerSheetError;

    fn try_from(bind: &BindInfo) -> Result<Self, Self::Error> {
        Ok(ReadBannerParameters {
            banner: BannerParameters::try_from(bind)?,
            table: TableParam::read(bind)?,
        })
    }
}

impl TryFrom<&ReadBannerParameters> for RecordBindData {
    type Error = BannerSheetError;

    fn try_from(parameters: &ReadBannerParameters) -> Result<Self, Self::Error> {
        let (_, tables) = parameters.banner.extract()?;
        let table = select_table(&tables, parameters.table.unwrap_or(1))?;
        Ok(wide_records(table))
    }
}

/// Picks a table by its 1-based number.
pub(crate) fn select_table(tables: &[ExtractedTable], number: i64) -> Result<&ExtractedTable, ExtensionError> {
    usize::try_from(number)
        .ok()
        .and_then(|number| number.checked_sub(1))
        .and_then(|index| tables.get(index))
        .ok_or(ExtensionError::TableIndexError(number, tables.len()))
}

/// The table as `Metric, <segment labels>, Sig` with unique column names.
pub(crate) fn wide_records(table: &ExtractedTable) -> RecordBindData {
    let columns = varchar_columns(&dedupe_names(&table.header()));
    let records = table
        .records()
        .into_iter()
        .map(|record| record.into_iter().map(Field::from).collect())
        .collect();
    RecordBindData { columns, records }
}

/// `read_banner(file, table := 1, ...)`: one banner table in wide form
pub(crate) struct ReadBannerTableFunction;

impl VTab for ReadBannerTableFunction {
    type InitData = RecordInitData;
    type BindData = RecordBindData;

    fn bind(bind: &BindInfo) -> Result<Self::BindData, Box<dyn Error>> {
        let parameters = ReadBannerParameters::try_from(bind)?;
        let data = RecordBindData::try_from(&parameters).with_prefix(parameters.banner.file_name.as_str())?;
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
        let mut definitions = LayoutOverrides::definitions();
        definitions.push(TableParam::definition());
        Some(definitions)
    }
}
