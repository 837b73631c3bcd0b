use duckdb::core::LogicalTypeId;

/// Output column types of the table functions.
#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) enum ColumnType {
    /// 64-bit signed integers
    BigInt,
    /// Double-precision floating point
    Double,
    /// Variable-length strings
    Varchar,
}

/// An output column with name and data type.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Column {
    pub(crate) name: String,
    pub(crate) kind: ColumnType,
}

impl ColumnType {
    /// Converts the column type to DuckDB's logical type identifier.
    pub(crate) fn to_logical_type_id(&self) -> LogicalTypeId {
        match self {
            ColumnType::BigInt => LogicalTypeId::Bigint,
            ColumnType::Double => LogicalTypeId::Double,
            ColumnType::Varchar => LogicalTypeId::Varchar,
        }
    }
}

impl Column {
    pub(crate) fn varchar(name: &str) -> Column {
        Column { name: name.to_owned(), kind: ColumnType::Varchar }
    }

    pub(crate) fn bigint(name: &str) -> Column {
        Column { name: name.to_owned(), kind: ColumnType::BigInt }
    }

    pub(crate) fn double(name: &str) -> Column {
        Column { name: name.to_owned(), kind: ColumnType::Double }
    }
}

/// Builds varchar columns from a list of names.
pub(crate) fn varchar_columns(names: &[String]) -> Vec<Column> {
    names.iter().map(|name| Column::varchar(name)).collect()
}
