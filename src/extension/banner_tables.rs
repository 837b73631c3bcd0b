use crate::banner::layout::ScanLayout;
use crate::banner::ExtractedTable;
use crate::error::ResultMessage;
use crate::extension::column::Column;
use crate::extension::emit_batch;
use crate::extension::writer::Field;
use crate::extension::BannerParameters;
use crate::extension::FileParam;
use crate::extension::LayoutOverrides;
use crate::extension::Param;
use crate::extension::RecordBindData;
use crate::extension::RecordInitData;
use crate::spreadsheet::reference::index_to_reference;
use duckdb::core::DataChunkHandle;
use duckdb::core::LogicalTypeHandle;
use duckdb::vtab::BindInfo;
use duckdb::vtab::InitInfo;
use duckdb::vtab::TableFunctionInfo;
use duckdb::vtab::VTab;
use std::error::Error;

/// Separator between segment labels in the `segments` column
const SEGMENT_SEPARATOR: &str = "; ";

/// One row per table: index, title, marker cell, segment labels, metric row count and block end.
pub(crate) fn summarize(layout: &ScanLayout, tables: &[ExtractedTable]) -> RecordBindData {
    let columns = vec![
        Column::bigint("table_index"),
        Column::varchar("title"),
        Column::varchar("start_cell"),
        Column::varchar("segments"),
        Column::bigint("metric_rows"),
        Column::varchar("end_reason"),
    ];
    let records = tables
        .iter()
        .enumerate()
        .map(|(index, table)| {
            let segments = table.segments
                .iter()
                .map(|segment| segment.label())
                .collect::<Vec<_>>()
                .join(SEGMENT_SEPARATOR);
            vec![
                Field::from(index + 1),
                Field::from(table.title.as_str()),
                Field::from(index_to_reference(table.start_row, layout.marker_column)),
                Field::from(segments),
                Field::from(table.rows.len()),
                Field::from(table.end.describe(layout.label_column)),
            ]
        })
        .collect();
    RecordBindData { columns, records }
}

/// `banner_tables(file, ...)`: overview of the banner tables of a sheet
pub(crate) struct BannerTablesTableFunction;

impl VTab for BannerTablesTableFunction {
    type InitData = RecordInitData;
    type BindData = RecordBindData;

    fn bind(bind: &BindInfo) -> Result<Self::BindData, Box<dyn Error>> {
        let parameters = BannerParameters::try_from(bind)?;
        let data = parameters.extract()
            .map(|(layout, tables)| summarize(&layout, &tables))
            .with_prefix(parameters.file_name.as_str())?;
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
        Some(LayoutOverrides::definitions())
    }
}
