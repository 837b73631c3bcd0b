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
use duckdb::core::DataChunkHandle;
use duckdb::core::LogicalTypeHandle;
use duckdb::vtab::BindInfo;
use duckdb::vtab::InitInfo;
use duckdb::vtab::TableFunctionInfo;
use duckdb::vtab::VTab;
use std::error::Error;

/// Every table in long form: one record per metric row and segment.
///
/// Besides the formatted `value`, the frequency and percentage are emitted as
/// numbers so they can be aggregated in SQL. Suppressed values come out as NULL.
pub(crate) fn long_records(tables: &[ExtractedTable]) -> RecordBindData {
    let columns = vec![
        Column::bigint("table_index"),
        Column::varchar("title"),
        Column::varchar("metric"),
        Column::varchar("segment"),
        Column::varchar("value"),
        Column::bigint("frequency"),
        Column::double("percentage"),
        Column::varchar("sig"),
    ];
    let mut records = Vec::new();
    for (index, table) in tables.iter().enumerate() {
        let labels = table.segments.iter().map(|segment| segment.label()).collect::<Vec<_>>();
        for row in &table.rows {
            for (position, label) in labels.iter().enumerate() {
                let value = row.values.get(position).map(|value| value.as_str()).unwrap_or_default();
                records.push(vec![
                    Field::from(index + 1),
                    Field::from(table.title.as_str()),
                    Field::from(row.label.as_str()),
                    Field::from(label.as_str()),
                    Field::text_or_null(value),
                    Field::from(row.frequencies.get(position).copied().flatten()),
                    Field::from(row.percentages.get(position).copied().flatten()),
                    Field::text_or_null(&row.sig),
                ]);
            }
        }
    }
    RecordBindData { columns, records }
}

/// `read_banners(file, ...)`: all banner tables of a sheet in long form
pub(crate) struct ReadBannersTableFunction;

impl VTab for ReadBannersTableFunction {
    type InitData = RecordInitData;
    type BindData = RecordBindData;

    fn bind(bind: &BindInfo) -> Result<Self::BindData, Box<dyn Error>> {
        let parameters = BannerParameters::try_from(bind)?;
        let data = parameters.extract()
            .map(|(_, tables)| long_records(&tables))
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::banner::BlockEnd;
    use crate::banner::MetricRow;
    use crate::banner::Segment;

    #[test]
    fn one_record_per_metric_and_segment() {
        let table = ExtractedTable {
            title: "Awareness".to_string(),
            start_row: 0,
            segments: vec![
                Segment { name: "Male".to_string(), base: Some(150) },
                Segment { name: "Female".to_string(), base: Some(250) },
            ],
            rows: vec![
                MetricRow {
                    label: "Aware".to_string(),
                    values: vec!["33.7% (42)".to_string(), String::new()],
                    frequencies: vec![Some(42), Some(17)],
                    percentages: vec![Some(33.7), None],
                    sig: "B".to_string(),
                },
                MetricRow {
                    label: "Unaware".to_string(),
                    values: vec!["66.3% (108)".to_string(), "50.0% (125)".to_string()],
                    frequencies: vec![Some(108), Some(125)],
                    percentages: vec![Some(66.3), Some(50.0)],
                    sig: String::new(),
                },
            ],
            end: BlockEnd::EndOfBlock { row: 14 },
        };
        let data = long_records(&[table.clone(), table]);
        assert_eq!(data.records.len(), 8);
        assert_eq!(data.columns[5], Column::bigint("frequency"));
        assert_eq!(data.columns[6], Column::double("percentage"));
        assert_eq!(data.records[1], vec![
            Field::BigInt(1),
            Field::from("Awareness"),
            Field::from("Aware"),
            Field::from("Female (n=250)"),
            Field::Null,
            Field::BigInt(17),
            Field::Null,
            Field::from("B"),
        ]);
        assert_eq!(data.records[0][6], Field::Double(33.7));
        assert_eq!(data.records[3][5], Field::BigInt(125));
        assert_eq!(data.records[3][7], Field::Null);
        assert_eq!(data.records[4][0], Field::BigInt(2));
    }
}
